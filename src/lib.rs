pub mod admission;
pub mod analytics;
pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod http;

pub use admission::{AdmissionController, RateLimit, WindowUnit};
pub use client::CrptClient;
pub use document::{Document, Product, Signature, SignedDocument};
pub use error::{AdmissionError, AppError, Result};
pub use http::{ApiResponse, CallExecutor, HttpExecutor};

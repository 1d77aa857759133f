//! Admission control for outgoing calls.
//!
//! A permit pool starts full at `capacity` and is refilled by one permit
//! every `window / capacity` by a task the controller owns. Callers wait
//! on the pool without spinning; the pool never goes below zero or above
//! `capacity`.

pub mod controller;
pub mod limit;
mod pool;
mod replenisher;

pub use controller::AdmissionController;
pub use limit::{RateLimit, WindowUnit};

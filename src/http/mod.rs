pub mod executor;
pub mod pool;

pub use executor::{ApiResponse, CallExecutor, HttpExecutor};
pub use pool::HttpSettings;

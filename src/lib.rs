// Library surface for the binary and for integration tests.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod session;
pub mod trainer;
pub mod training;

pub use error::{DrillError, Result};

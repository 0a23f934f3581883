//! Desktop client for the charge processing service: pick a charge file,
//! enter the practice credentials, submit once, and review the per-row
//! results and the processed file the server produced.

pub mod app;
pub mod config;
pub mod error;
pub mod progress;
pub mod upload;
pub mod utils;

pub use app::ChargeProcessor;
pub use config::AppConfig;
pub use error::{ConfigError, ProcessError};

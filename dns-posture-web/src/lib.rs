//! HTTP front end for DNS posture reports.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;

pub use config::AppConfig;
pub use error::ApiError;
pub use handlers::configure;

//! Type definition module

mod report;
mod response;

pub use report::{CheckReport, RateState};
pub use response::{ApiResponse, CheckRequest};

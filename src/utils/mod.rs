//! Logging and progress reporting

pub mod logger;
pub mod progress;

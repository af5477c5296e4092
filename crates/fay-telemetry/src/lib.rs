//! Fay Telemetry - Logging setup for Fay event dispatch.
//!
//! This crate provides:
//! - Configurable logging setup with multiple formats
//! - A test-friendly subscriber for test binaries
//!
//! # Example
//!
//! ```rust,no_run
//! use fay_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), fay_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("fay_events=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("Logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging, setup_test_logging,
};

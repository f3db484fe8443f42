//! OBS Telemetry - Logging and tracing for the OBS object storage service.
//!
//! This crate provides:
//! - Configurable logging setup with multiple formats and targets
//! - Request context spans carrying bucket and access key
//! - With the `config` feature, conversion from `obs_config::LoggingSection`
//!
//! # Example
//!
//! ```rust,no_run
//! use obs_telemetry::{LogConfig, LogFormat, RequestContext, setup_logging};
//!
//! # fn main() -> Result<(), obs_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("obs_credentials=trace");
//!
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("cli")
//!     .with_operation("create_bucket")
//!     .with_bucket("photos");
//!
//! let span = ctx.span();
//! let _guard = span.enter();
//! tracing::info!("creating bucket");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::RequestContext;
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{FileRotation, LogConfig, LogFormat, LogTarget, setup_logging};

//! Common utilities and shared types for recipebox.
//!
//! This crate provides foundational components used across all recipebox crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Error log**: Bounded ring buffer of recent failures via [`ErrorLog`],
//!   surfaced by the health endpoint
//!
//! # Example
//!
//! ```no_run
//! use recipebox_common::{AppResult, Config, ErrorLog};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let errors = ErrorLog::new(config.health.error_log_capacity);
//!     errors.record("startup", "example entry");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod error_log;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use error_log::{ErrorEntry, ErrorLog};

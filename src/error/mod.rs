//! Error handling for the export pipeline.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! [`ExportError`] wraps a few focused error kinds:
//! - [`ConfigError`] for invalid options, surfaced before any row is read
//! - [`SinkError`] for failures creating, writing or closing the output artifact
//! - row errors carrying the 1-based index of the row that failed
//!
//! # Example
//!
//! ```rust,no_run
//! use pgxport::error::{ConfigError, ExportError, Result};
//!
//! fn require_table(table: &str) -> Result<()> {
//!     if table.trim().is_empty() {
//!         return Err(ConfigError::MissingField("table".to_string()).into());
//!     }
//!     Ok(())
//! }
//!
//! match require_table("") {
//!     Err(ExportError::Config(e)) => eprintln!("{e}"),
//!     _ => {}
//! }
//! ```

pub mod kinds;

pub use kinds::{ConfigError, ExportError, Result, SinkError};

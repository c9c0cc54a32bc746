//! pgxport library
//!
//! Streaming export of query result sets into files. A [`cursor::Cursor`]
//! yields typed rows, a format [`export::Exporter`] encodes them, and an
//! [`output::OutputSink`] writes the bytes, optionally compressed.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `cursor`: Row sources (in-memory and NDJSON replay)
//! - `encoder`: Ordered row encoding for JSON and YAML
//! - `error`: Error types and handling
//! - `export`: Exporter trait, registry and per-format writers
//! - `formatter`: Type-driven value formatting
//! - `output`: Compressed output sinks
//!
//! # Example
//!
//! ```no_run
//! use pgxport::cursor::ReplayCursor;
//! use pgxport::export::{ExportOptions, Registry};
//!
//! fn main() -> pgxport::Result<()> {
//!     let registry = Registry::with_builtins()?;
//!     let options = ExportOptions::new("json", "users.json");
//!     let mut cursor = ReplayCursor::open("users.ndjson")?;
//!
//!     let rows = registry.get(&options.format)?.export(&mut cursor, &options)?;
//!     println!("{rows} rows written");
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod cursor;
pub mod encoder;
pub mod error;
pub mod export;
pub mod formatter;
pub mod output;

// Re-export commonly used types
pub use config::Config;
pub use cursor::{Cursor, FieldDescriptor, Value, WireType};
pub use error::{ExportError, Result};
pub use export::{ExportOptions, Exporter, Registry};
pub use output::Compression;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}

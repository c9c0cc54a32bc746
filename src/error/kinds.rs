use std::{fmt, io, path::PathBuf};

/// Crate-wide `Result` type using [`ExportError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Top-level error type for export operations.
#[derive(Debug)]
pub enum ExportError {
    /// Invalid or unsupported options.
    Config(ConfigError),

    /// Output artifact errors.
    Sink(SinkError),

    /// A single row failed to fetch or encode.
    Row {
        /// 1-based position of the failing row.
        index: u64,
        source: Box<ExportError>,
    },

    /// Terminal error reported by the source cursor.
    Cursor(String),

    /// A value could not be decoded into the shape its column declares.
    Value(String),

    /// The result set had no rows and empty exports were refused.
    EmptyResult,

    /// Template parsing or rendering errors.
    Template(minijinja::Error),

    /// Spreadsheet generation errors.
    Xlsx(rust_xlsxwriter::XlsxError),

    /// XML writer errors.
    Xml(quick_xml::Error),

    /// CSV writer errors.
    Csv(csv::Error),

    /// JSON serialization errors.
    Json(serde_json::Error),

    /// YAML serialization errors.
    Yaml(serde_yaml::Error),

    /// I/O errors.
    Io(io::Error),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// No exporter is registered under the requested name.
    UnsupportedFormat { format: String, available: Vec<String> },

    /// Unknown compression mode.
    UnsupportedCompression(String),

    /// An exporter with the same name is already registered.
    DuplicateFormat(String),

    /// Missing required field.
    MissingField(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Config file could not be parsed.
    InvalidFormat(String),
}

/// Output sink errors.
#[derive(Debug)]
pub enum SinkError {
    /// The output file could not be created.
    Create { path: PathBuf, source: io::Error },

    /// The single archive entry could not be started.
    ZipEntry { name: String, source: io::Error },

    /// Writing to the sink failed.
    Write(io::Error),

    /// Finishing a compressor, flushing or releasing the file failed.
    Close(io::Error),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Config(e) => write!(f, "Configuration error: {e}"),
            ExportError::Sink(e) => write!(f, "Output error: {e}"),
            ExportError::Row { index, source } => write!(f, "Error at row {index}: {source}"),
            ExportError::Cursor(msg) => write!(f, "Error iterating rows: {msg}"),
            ExportError::Value(msg) => write!(f, "Invalid value: {msg}"),
            ExportError::EmptyResult => write!(f, "export failed: query returned 0 rows"),
            ExportError::Template(e) => write!(f, "Template error: {e}"),
            ExportError::Xlsx(e) => write!(f, "XLSX error: {e}"),
            ExportError::Xml(e) => write!(f, "XML error: {e}"),
            ExportError::Csv(e) => write!(f, "CSV error: {e}"),
            ExportError::Json(e) => write!(f, "JSON error: {e}"),
            ExportError::Yaml(e) => write!(f, "YAML error: {e}"),
            ExportError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedFormat { format, available } => write!(
                f,
                "unsupported format '{format}' (available: {})",
                available.join(", ")
            ),
            ConfigError::UnsupportedCompression(name) => write!(
                f,
                "unsupported compression '{name}' (use: none, gzip, zip, zstd, lz4)"
            ),
            ConfigError::DuplicateFormat(name) => {
                write!(f, "exporter for format '{name}' already registered")
            }
            ConfigError::MissingField(field) => write!(f, "missing required field: {field}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "invalid value '{value}' for field '{field}'")
            }
            ConfigError::InvalidFormat(msg) => write!(f, "invalid config format: {msg}"),
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Create { path, source } => {
                write!(f, "failed to create output file {}: {source}", path.display())
            }
            SinkError::ZipEntry { name, source } => {
                write!(f, "failed to create zip entry '{name}': {source}")
            }
            SinkError::Write(e) => write!(f, "write failed: {e}"),
            SinkError::Close(e) => write!(f, "close failed: {e}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Config(e) => Some(e),
            ExportError::Sink(e) => Some(e),
            ExportError::Row { source, .. } => Some(source.as_ref()),
            ExportError::Template(e) => Some(e),
            ExportError::Xlsx(e) => Some(e),
            ExportError::Xml(e) => Some(e),
            ExportError::Csv(e) => Some(e),
            ExportError::Json(e) => Some(e),
            ExportError::Yaml(e) => Some(e),
            ExportError::Io(e) => Some(e),
            ExportError::Cursor(_) | ExportError::Value(_) | ExportError::EmptyResult => None,
        }
    }
}

impl std::error::Error for ConfigError {}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SinkError::Create { source, .. } | SinkError::ZipEntry { source, .. } => Some(source),
            SinkError::Write(e) | SinkError::Close(e) => Some(e),
        }
    }
}

impl ExportError {
    /// Wrap an error with the 1-based index of the row that produced it.
    pub fn at_row(index: u64, source: ExportError) -> Self {
        ExportError::Row {
            index,
            source: Box::new(source),
        }
    }

    /// Whether this error was raised while validating options.
    pub fn is_config(&self) -> bool {
        matches!(self, ExportError::Config(_))
    }

    /// Whether this error came from the output sink.
    pub fn is_sink(&self) -> bool {
        matches!(self, ExportError::Sink(_))
    }
}

/* ========================= Conversions to ExportError ========================= */

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<ConfigError> for ExportError {
    fn from(err: ConfigError) -> Self {
        ExportError::Config(err)
    }
}

impl From<SinkError> for ExportError {
    fn from(err: SinkError) -> Self {
        ExportError::Sink(err)
    }
}

impl From<minijinja::Error> for ExportError {
    fn from(err: minijinja::Error) -> Self {
        ExportError::Template(err)
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Xlsx(err)
    }
}

impl From<quick_xml::Error> for ExportError {
    fn from(err: quick_xml::Error) -> Self {
        ExportError::Xml(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Json(err)
    }
}

impl From<serde_yaml::Error> for ExportError {
    fn from(err: serde_yaml::Error) -> Self {
        ExportError::Yaml(err)
    }
}

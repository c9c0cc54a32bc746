//! Output sinks
//!
//! [`create_sink`] builds the write destination for one export: a file
//! behind a 256 KiB write buffer, optionally wrapped in a streaming
//! compressor or a single-entry zip archive.
//!
//! ```text
//! exporter -> [gzip | zstd | lz4 | zip entry] -> BufWriter (256 KiB) -> File
//! ```
//!
//! [`OutputSink::close`] finishes the layers innermost first and keeps the
//! first error while still attempting every remaining layer.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{ConfigError, Result, SinkError};

mod naming;

pub use naming::{ensure_suffix, fix_extension, zip_entry_name};

/// Size of the file write buffer.
pub const BUFFER_SIZE: usize = 256 * 1024;

/// Compression applied to the output artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Zip,
    Zstd,
    Lz4,
}

impl Compression {
    pub const ALL: [Compression; 5] = [
        Compression::None,
        Compression::Gzip,
        Compression::Zip,
        Compression::Zstd,
        Compression::Lz4,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Zip => "zip",
            Compression::Zstd => "zstd",
            Compression::Lz4 => "lz4",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = ConfigError;

    /// Case-insensitive; the empty string means no compression.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Compression::None),
            "gzip" => Ok(Compression::Gzip),
            "zip" => Ok(Compression::Zip),
            "zstd" => Ok(Compression::Zstd),
            "lz4" => Ok(Compression::Lz4),
            _ => Err(ConfigError::UnsupportedCompression(s.to_string())),
        }
    }
}

/// Where and how to write one export.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub path: PathBuf,
    pub compression: Compression,
    /// Logical format name, used to name the zip entry.
    pub format: String,
}

impl SinkConfig {
    pub fn new(path: impl Into<PathBuf>, compression: Compression, format: &str) -> Self {
        Self {
            path: path.into(),
            compression,
            format: format.to_string(),
        }
    }
}

/// Path the artifact is actually written to.
///
/// gzip, zstd and lz4 append `.gz`, `.zst` and `.lz4` unless already
/// present; zip replaces the final extension with `.zip`.
pub fn resolve_output_path(path: &Path, compression: Compression) -> PathBuf {
    match compression {
        Compression::None => path.to_path_buf(),
        Compression::Gzip => ensure_suffix(path, ".gz"),
        Compression::Zstd => ensure_suffix(path, ".zst"),
        Compression::Lz4 => ensure_suffix(path, ".lz4"),
        Compression::Zip => fix_extension(path, "zip"),
    }
}

enum Layer {
    Plain(BufWriter<File>),
    Gzip(flate2::write::GzEncoder<BufWriter<File>>),
    Zstd(zstd::stream::write::Encoder<'static, BufWriter<File>>),
    Lz4(lz4::Encoder<BufWriter<File>>),
    Zip(zip::ZipWriter<BufWriter<File>>),
}

/// Exclusive write destination for one export.
pub struct OutputSink {
    layer: Layer,
    path: PathBuf,
    compression: Compression,
}

/// Create the sink described by `config`.
pub fn create_sink(config: &SinkConfig) -> Result<OutputSink> {
    let path = resolve_output_path(&config.path, config.compression);
    debug!(
        "Creating output file {} (compression={})",
        path.display(),
        config.compression
    );

    let file = File::create(&path).map_err(|source| SinkError::Create {
        path: path.clone(),
        source,
    })?;
    let buffered = BufWriter::with_capacity(BUFFER_SIZE, file);

    let layer = match config.compression {
        Compression::None => Layer::Plain(buffered),
        Compression::Gzip => Layer::Gzip(flate2::write::GzEncoder::new(
            buffered,
            flate2::Compression::default(),
        )),
        Compression::Zstd => Layer::Zstd(
            zstd::stream::write::Encoder::new(buffered, 0).map_err(SinkError::Write)?,
        ),
        Compression::Lz4 => Layer::Lz4(
            lz4::EncoderBuilder::new()
                .build(buffered)
                .map_err(SinkError::Write)?,
        ),
        Compression::Zip => {
            let name = zip_entry_name(&config.path, &config.format);
            debug!("Creating zip entry: {name}");
            let mut archive = zip::ZipWriter::new(buffered);
            let options = zip::write::FileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated)
                .large_file(true);
            archive
                .start_file(name.clone(), options)
                .map_err(|e| SinkError::ZipEntry {
                    name,
                    source: io::Error::other(e),
                })?;
            Layer::Zip(archive)
        }
    };

    Ok(OutputSink {
        layer,
        path,
        compression: config.compression,
    })
}

impl OutputSink {
    /// Path of the artifact on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Write raw bytes, reporting failures as sink errors.
    pub fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes).map_err(|e| SinkError::Write(e).into())
    }

    /// Finish the compressor, flush the buffer and release the file.
    ///
    /// Every layer is attempted even if an earlier one fails; the first
    /// error is returned.
    pub fn close(self) -> Result<()> {
        let mut first: Option<io::Error> = None;
        let mut keep = |result: io::Result<()>| {
            if let Err(e) = result {
                first.get_or_insert(e);
            }
        };

        match self.layer {
            Layer::Plain(mut w) => keep(w.flush()),
            Layer::Gzip(mut enc) => {
                keep(enc.try_finish());
                keep(enc.get_mut().flush());
            }
            Layer::Zstd(mut enc) => {
                keep(enc.do_finish());
                keep(enc.get_mut().flush());
            }
            Layer::Lz4(enc) => {
                let (mut w, result) = enc.finish();
                keep(result);
                keep(w.flush());
            }
            Layer::Zip(mut archive) => match archive.finish() {
                Ok(mut w) => keep(w.flush()),
                Err(e) => keep(Err(io::Error::other(e))),
            },
        }

        match first {
            Some(e) => {
                warn!("Failed to close {}: {e}", self.path.display());
                Err(SinkError::Close(e).into())
            }
            None => {
                debug!("Closed output file {}", self.path.display());
                Ok(())
            }
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.layer {
            Layer::Plain(w) => w.write(buf),
            Layer::Gzip(w) => w.write(buf),
            Layer::Zstd(w) => w.write(buf),
            Layer::Lz4(w) => w.write(buf),
            Layer::Zip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.layer {
            Layer::Plain(w) => w.flush(),
            Layer::Gzip(w) => w.flush(),
            Layer::Zstd(w) => w.flush(),
            Layer::Lz4(w) => w.flush(),
            Layer::Zip(w) => w.flush(),
        }
    }
}

/// Combine the outcome of writing with the outcome of closing the sink.
///
/// A write error takes precedence; a close error is still logged.
pub fn settle<T>(result: Result<T>, closed: Result<()>) -> Result<T> {
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!("Output also failed to close after an error: {close_err}");
            Err(e)
        }
    }
}

/// Open a sink, run `body` against it and close it exactly once.
pub fn with_sink<T, F>(config: &SinkConfig, body: F) -> Result<T>
where
    F: FnOnce(&mut OutputSink) -> Result<T>,
{
    let mut sink = create_sink(config)?;
    let result = body(&mut sink);
    settle(result, sink.close())
}

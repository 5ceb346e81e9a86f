//! Byte-level C-DNS output.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ciborium::Value;
use tracing::{debug, warn};

use cdns_core::CdnsError;

use super::compress::{CompressWriter, Compression};
use crate::encoding::{self, CBOR_BREAK};

type Sink = CompressWriter<BufWriter<Box<dyn Write + Send>>>;

/// Where C-DNS output goes.
pub enum OutputDestination {
    /// File, created or truncated on open
    Path(PathBuf),
    /// Caller-supplied sink
    Writer(Box<dyn Write + Send>),
}

impl OutputDestination {
    /// Wrap any writer
    pub fn writer(writer: impl Write + Send + 'static) -> Self {
        Self::Writer(Box::new(writer))
    }
}

impl fmt::Display for OutputDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Writer(_) => write!(f, "<writer>"),
        }
    }
}

impl fmt::Debug for OutputDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

impl From<PathBuf> for OutputDestination {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for OutputDestination {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for OutputDestination {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

/// Writes raw bytes and CBOR values to one destination at a time.
///
/// Byte counts are uncompressed.
pub struct CdnsEncoder {
    compression: Compression,
    sink: Option<Sink>,
    destination: Option<String>,
    bytes_written: u64,
}

impl CdnsEncoder {
    /// Create a closed encoder
    pub const fn new(compression: Compression) -> Self {
        Self {
            compression,
            sink: None,
            destination: None,
            bytes_written: 0,
        }
    }

    /// Compression applied to every output
    pub const fn compression(&self) -> Compression {
        self.compression
    }

    /// Returns true while a destination is open
    pub const fn is_open(&self) -> bool {
        self.sink.is_some()
    }

    /// Uncompressed bytes written to the current destination
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Open a destination
    pub fn open(&mut self, destination: OutputDestination) -> crate::Result<()> {
        if let Some(current) = &self.destination {
            return Err(CdnsError::Output(format!("{current} is still open")));
        }

        let name = destination.to_string();
        let inner: Box<dyn Write + Send> = match destination {
            OutputDestination::Path(path) => {
                let file = File::create(&path).map_err(|e| {
                    CdnsError::Output(format!("failed to open {}: {e}", path.display()))
                })?;
                Box::new(file)
            }
            OutputDestination::Writer(writer) => writer,
        };

        self.sink = Some(CompressWriter::new(BufWriter::new(inner), self.compression));
        self.bytes_written = 0;
        debug!(destination = %name, compression = %self.compression, "opened C-DNS output");
        self.destination = Some(name);
        Ok(())
    }

    /// Write raw bytes
    pub fn write(&mut self, bytes: &[u8]) -> crate::Result<usize> {
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| CdnsError::Output("no output opened".into()))?;
        sink.write_all(bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(bytes.len())
    }

    /// Serialize and write one CBOR value
    pub fn write_value(&mut self, value: &Value) -> crate::Result<usize> {
        let bytes = encoding::to_vec(value)?;
        self.write(&bytes)
    }

    /// Write the break byte closing an indefinite-length item
    pub fn write_break(&mut self) -> crate::Result<usize> {
        self.write(&[CBOR_BREAK])
    }

    /// Finish compression, flush and release the destination.
    ///
    /// The destination is released even on error. Closing a closed encoder
    /// does nothing.
    pub fn close(&mut self) -> crate::Result<()> {
        let Some(sink) = self.sink.take() else {
            return Ok(());
        };
        let name = self.destination.take().unwrap_or_default();

        sink.finish()
            .map_err(|e| CdnsError::Output(format!("failed to finish {name}: {e}")))?;

        debug!(destination = %name, bytes = self.bytes_written, "closed C-DNS output");
        Ok(())
    }

    /// Close the current destination and open `destination`
    pub fn rotate(&mut self, destination: OutputDestination) -> crate::Result<()> {
        self.close()?;
        self.open(destination)
    }
}

impl fmt::Debug for CdnsEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdnsEncoder")
            .field("compression", &self.compression)
            .field("destination", &self.destination)
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}

impl Drop for CdnsEncoder {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close C-DNS output");
        }
    }
}

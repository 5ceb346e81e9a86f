//! Output compression.
//!
//! [`CompressWriter`] wraps any `Write` in the selected compressor using
//! enum dispatch. The compression stream must be completed with
//! [`CompressWriter::finish`]; dropping the writer loses the trailer.

use std::io::{self, Write};

use flate2::write::GzEncoder;

/// xz preset used for output; 6 is the xz command line default
#[cfg(feature = "xz")]
const XZ_PRESET: u32 = 6;

/// Compression applied to C-DNS output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// Plain C-DNS
    #[default]
    None,
    /// Gzip (.gz)
    Gzip,
    /// XZ/LZMA (.xz)
    #[cfg(feature = "xz")]
    Xz,
}

impl Compression {
    /// Typical file extension for this format
    pub const fn extension(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Gzip => Some("gz"),
            #[cfg(feature = "xz")]
            Self::Xz => Some("xz"),
        }
    }

    /// Returns true unless output is written as is
    pub const fn is_compressed(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Gzip => write!(f, "gzip"),
            #[cfg(feature = "xz")]
            Self::Xz => write!(f, "xz"),
        }
    }
}

/// Writer compressing everything written to it.
pub enum CompressWriter<W: Write> {
    /// Pass-through
    None(W),

    /// Gzip compression
    Gzip(GzEncoder<W>),

    /// XZ compression
    #[cfg(feature = "xz")]
    Xz(xz2::write::XzEncoder<W>),
}

impl<W: Write> CompressWriter<W> {
    /// Wrap `inner` in the given compression
    pub fn new(inner: W, compression: Compression) -> Self {
        match compression {
            Compression::None => Self::None(inner),
            Compression::Gzip => Self::Gzip(GzEncoder::new(inner, flate2::Compression::default())),
            #[cfg(feature = "xz")]
            Compression::Xz => Self::Xz(xz2::write::XzEncoder::new(inner, XZ_PRESET)),
        }
    }

    /// Compression in use
    pub const fn compression(&self) -> Compression {
        match self {
            Self::None(_) => Compression::None,
            Self::Gzip(_) => Compression::Gzip,
            #[cfg(feature = "xz")]
            Self::Xz(_) => Compression::Xz,
        }
    }

    /// Complete the compression stream and return the inner writer, flushed.
    pub fn finish(self) -> io::Result<W> {
        let mut inner = match self {
            Self::None(w) => w,
            Self::Gzip(encoder) => encoder.finish()?,
            #[cfg(feature = "xz")]
            Self::Xz(encoder) => encoder.finish()?,
        };
        inner.flush()?;
        Ok(inner)
    }
}

impl<W: Write> Write for CompressWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::None(w) => w.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
            #[cfg(feature = "xz")]
            Self::Xz(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::None(w) => w.flush(),
            Self::Gzip(encoder) => encoder.flush(),
            #[cfg(feature = "xz")]
            Self::Xz(encoder) => encoder.flush(),
        }
    }
}

impl<W: Write> std::fmt::Debug for CompressWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CompressWriter").field(&self.compression()).finish()
    }
}

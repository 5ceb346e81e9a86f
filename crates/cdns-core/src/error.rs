use thiserror::Error;

/// Result type alias for C-DNS operations
pub type Result<T> = std::result::Result<T, CdnsError>;

/// Errors that can occur while building or exporting C-DNS data
#[derive(Error, Debug)]
pub enum CdnsError {
    /// A generic record could not be turned into a block entry
    #[error("invalid record: {field}: {reason}")]
    InvalidRecord {
        /// Name of the offending record field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Block or preamble encoding failed
    #[error("encoding error: {0}")]
    Encoding(String),

    /// CBOR serialization failed
    #[error("cbor error: {0}")]
    Cbor(String),

    /// Configuration is invalid or could not be loaded
    #[error("config error: {0}")]
    Config(String),

    /// Output destination could not be opened, written or rotated
    #[error("output error: {0}")]
    Output(String),

    /// I/O error from the underlying writer
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CdnsError {
    /// Shorthand for an [`CdnsError::InvalidRecord`] error
    pub fn invalid_record(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            field,
            reason: reason.into(),
        }
    }

    /// Returns true if the error was caused by the caller's input record.
    ///
    /// The block is left untouched in that case, so the caller may skip the
    /// record and keep buffering.
    #[must_use]
    pub const fn is_record_error(&self) -> bool {
        matches!(self, Self::InvalidRecord { .. })
    }

    /// Returns true if the error came from the output destination
    #[must_use]
    pub const fn is_output_error(&self) -> bool {
        matches!(self, Self::Output(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CdnsError::invalid_record("client_address", "expected 4 or 16 bytes, got 3");
        assert_eq!(
            err.to_string(),
            "invalid record: client_address: expected 4 or 16 bytes, got 3"
        );

        let err = CdnsError::Output("no output opened".into());
        assert_eq!(err.to_string(), "output error: no output opened");
    }

    #[test]
    fn test_error_classification() {
        assert!(CdnsError::invalid_record("ts", "bad").is_record_error());
        assert!(!CdnsError::Config("x".into()).is_record_error());

        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: CdnsError = io_err.into();
        assert!(err.is_output_error());
        assert!(CdnsError::Output("x".into()).is_output_error());
        assert!(!CdnsError::Cbor("x".into()).is_output_error());
    }
}

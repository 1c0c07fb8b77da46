//! Error types for the USD library.

use thiserror::Error;

/// Main error type for USD decode operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File header does not look like a Crate or USDA document
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// TOC references a section name outside the known set
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    /// Section data ends before its declared extent
    #[error("Truncated section `{section}` at offset {offset}")]
    TruncatedSection { section: &'static str, offset: u64 },

    /// Read past the end of the input buffer
    #[error("Unexpected end of data at offset {0}")]
    UnexpectedEof(u64),

    /// A count or length exceeds the configured cap
    #[error("Limit exceeded: {what} is {value} (max {max})")]
    LimitExceeded {
        what: &'static str,
        value: u64,
        max: u64,
    },

    /// Cumulative uncompressed payload exceeds the memory budget
    #[error("Memory budget exceeded: {used} bytes used, budget is {budget}")]
    MemoryBudgetExceeded { used: u64, budget: u64 },

    /// Value rep carries a type id outside the registered table
    #[error("Unknown value type id: {0}")]
    UnknownTypeId(i32),

    /// Authored type does not match the schema slot
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Time samples assigned to a `uniform` attribute (or vice versa)
    #[error("Variability mismatch: {0}")]
    VariabilityMismatch(String),

    /// `.connect` authored on an attribute that cannot carry one
    #[error("Connection not allowed: {0}")]
    ConnectionNotAllowed(String),

    /// Connection present but its target is missing or malformed
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// Enum token outside the closed value set
    #[error("Unknown token `{got}` for `{attr}` (allowed: {allowed})")]
    UnknownEnum {
        attr: String,
        got: String,
        allowed: String,
    },

    /// Index does not resolve into its pool
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Invariant violation inside the decoder itself
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Invalid data structure in the input
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// I/O error (callers that read files before decoding)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid-data error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}

/// Result type alias for USD operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::MalformedHeader("bad magic".to_string());
        assert!(e.to_string().contains("bad magic"));

        let e = Error::LimitExceeded {
            what: "tokens",
            value: 9,
            max: 3,
        };
        assert!(e.to_string().contains("9"));
        assert!(e.to_string().contains("3"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}

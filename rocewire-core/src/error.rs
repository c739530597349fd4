//! Error types for rocewire

use thiserror::Error;

/// Result type alias for rocewire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rocewire
#[derive(Error, Debug)]
pub enum Error {
    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A field value does not fit in its declared bit width
    #[error("Value {value:#x} does not fit in a {width}-bit field")]
    Encoding { value: u64, width: u32 },

    /// Malformed input while parsing a header
    #[error("Packet decoding error: {0}")]
    Decoding(String),

    /// Input buffer shorter than the fixed layout requires
    #[error("Truncated packet: need {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    /// A required layer is missing from the packet stack
    #[error("Incomplete packet stack: missing {0} layer")]
    IncompleteStack(&'static str),

    /// Layers are inconsistent or out of wire order
    #[error("Invalid packet stack: {0}")]
    InvalidStack(&'static str),

    /// The stack was encoded before being finalized
    #[error("Packet stack not finalized")]
    NotFinalized,

    /// A layer was appended after the stack was finalized
    #[error("Packet stack already finalized")]
    AlreadyFinalized,

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// The interface handle is invalid, down, or cannot be opened
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// The OS reported fewer bytes written than supplied
    #[error("Transport wrote {written} of {expected} bytes")]
    TransportTruncated { written: usize, expected: usize },
}

impl Error {
    /// Create a decoding error with a custom message
    pub fn decoding<S: Into<String>>(msg: S) -> Self {
        Error::Decoding(msg.into())
    }

    /// Create a transport-unavailable error with a custom message
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        Error::TransportUnavailable(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_error_display() {
        let err = Error::Encoding {
            value: 0x1ff,
            width: 8,
        };
        assert_eq!(
            err.to_string(),
            "Value 0x1ff does not fit in a 8-bit field"
        );
    }

    #[test]
    fn test_truncated_error_display() {
        let err = Error::Truncated { needed: 58, got: 40 };
        assert_eq!(err.to_string(), "Truncated packet: need 58 bytes, got 40");
    }

    #[test]
    fn test_helpers() {
        assert!(matches!(Error::decoding("bad"), Error::Decoding(_)));
        assert!(matches!(
            Error::unavailable("down"),
            Error::TransportUnavailable(_)
        ));
    }
}

//! Core error types for Thinner

#[derive(thiserror::Error, Debug)]
pub enum ThinnerError {
    /// Structurally invalid input: bad magic, out-of-range pointer,
    /// unknown property class, inflate failure.
    #[error("Format error at offset {offset:#x}: {message}")]
    Format { offset: usize, message: String },

    /// A model value that the binary form cannot represent.
    #[error("Encoding error at offset {offset:#x}: {message}")]
    Encoding { offset: usize, message: String },

    /// Seek or read past the end of a buffer.
    #[error("Out of bounds at offset {offset:#x}: requested {requested} bytes, {available} available")]
    OutOfBounds {
        offset: usize,
        requested: usize,
        available: usize,
    },

    #[error("XML error: {0}")]
    Xml(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ThinnerError {
    pub fn format(offset: usize, message: impl Into<String>) -> Self {
        Self::Format {
            offset,
            message: message.into(),
        }
    }

    pub fn encoding(offset: usize, message: impl Into<String>) -> Self {
        Self::Encoding {
            offset,
            message: message.into(),
        }
    }

    /// Relabel a cursor overrun as a truncated `what`.
    ///
    /// Decoders call this so that short input surfaces as a format error
    /// naming the structure being read, keeping the original offset.
    pub fn while_reading(self, what: &str) -> Self {
        match self {
            Self::OutOfBounds {
                offset,
                requested,
                available,
            } => Self::Format {
                offset,
                message: format!(
                    "truncated {} (needed {} bytes, {} available)",
                    what, requested, available
                ),
            },
            other => other,
        }
    }

    /// Byte offset carried by the binary error kinds.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Format { offset, .. }
            | Self::Encoding { offset, .. }
            | Self::OutOfBounds { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ThinnerError {
    fn from(err: serde_json::Error) -> Self {
        ThinnerError::Json(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ThinnerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_while_reading_relabels_overrun() {
        let err = ThinnerError::OutOfBounds {
            offset: 0x20,
            requested: 4,
            available: 1,
        }
        .while_reading("file record");

        match err {
            ThinnerError::Format { offset, message } => {
                assert_eq!(offset, 0x20);
                assert!(message.contains("file record"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_while_reading_keeps_other_kinds() {
        let err = ThinnerError::encoding(8, "too long").while_reading("header");
        assert!(matches!(err, ThinnerError::Encoding { offset: 8, .. }));
        assert_eq!(err.offset(), Some(8));
    }
}

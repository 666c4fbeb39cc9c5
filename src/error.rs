use thiserror::Error;

/// Errors surfaced by tag store operations
///
/// Byte access never fails visibly: bus and file faults are absorbed by the
/// backends. The variants below are the conditions a caller can act on.
#[derive(Error, Debug)]
pub enum TagStoreError {
    /// Entry is too short, has a bad identifier, lacks the separator,
    /// or carries a PIN outside the storable range.
    #[error("{0}")]
    MalformedInput(&'static str),

    #[error("tag list full")]
    StoreFull,

    #[error("Corrupt record at offset {offset}")]
    Corrupt { offset: usize },

    #[error("Tag not found")]
    NotFound,

    /// A record did not read back as written; the log was left unchanged
    #[error("tag write failed at offset {offset}")]
    WriteFailed { offset: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`TagStoreError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    StoreFull,
    Corrupt,
    NotFound,
    WriteFailed,
    Config,
    Io,
}

impl TagStoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TagStoreError::MalformedInput(_) => ErrorKind::MalformedInput,
            TagStoreError::StoreFull => ErrorKind::StoreFull,
            TagStoreError::Corrupt { .. } => ErrorKind::Corrupt,
            TagStoreError::NotFound => ErrorKind::NotFound,
            TagStoreError::WriteFailed { .. } => ErrorKind::WriteFailed,
            TagStoreError::InvalidConfig(_) | TagStoreError::ConfigParse(_) => ErrorKind::Config,
            TagStoreError::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, TagStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_is_bare() {
        let err = TagStoreError::MalformedInput("Bad tag");
        assert_eq!(err.to_string(), "Bad tag");
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_store_full_message() {
        assert_eq!(TagStoreError::StoreFull.to_string(), "tag list full");
        assert_eq!(TagStoreError::StoreFull.kind(), ErrorKind::StoreFull);
    }

    #[test]
    fn test_write_failed_message() {
        let err = TagStoreError::WriteFailed { offset: 127 };
        assert_eq!(err.to_string(), "tag write failed at offset 127");
        assert_eq!(err.kind(), ErrorKind::WriteFailed);
    }

    #[test]
    fn test_io_converts() {
        let err: TagStoreError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}

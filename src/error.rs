//! Structured error types for versioned config operations.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error kinds for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    // Structural validation errors
    NotARecord,
    MissingVersionField,
    WrongVersionFieldType,

    // Storage errors
    NotFound,
    DecodeError,
    EncodeError,
    IoError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotARecord => "NOT_A_RECORD",
            ErrorKind::MissingVersionField => "MISSING_VERSION_FIELD",
            ErrorKind::WrongVersionFieldType => "WRONG_VERSION_FIELD_TYPE",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::DecodeError => "DECODE_ERROR",
            ErrorKind::EncodeError => "ENCODE_ERROR",
            ErrorKind::IoError => "IO_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record failed the structural `Version` check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The value is not a structured record (map of named fields).
    #[error("value is not a record: found {found}")]
    NotARecord { found: &'static str },

    /// The record has no `Version` field.
    #[error("record has no `Version` field")]
    MissingVersionField,

    /// The `Version` field exists but is not textual.
    #[error("`Version` field must be a string, found {found}")]
    WrongVersionFieldType { found: &'static str },

    /// The value could not be serialized, so its shape is unknown.
    #[error("value cannot be serialized: {message}")]
    Unserializable { message: String },
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::NotARecord { .. } => ErrorKind::NotARecord,
            ValidationError::MissingVersionField => ErrorKind::MissingVersionField,
            ValidationError::WrongVersionFieldType { .. } => ErrorKind::WrongVersionFieldType,
            ValidationError::Unserializable { .. } => ErrorKind::EncodeError,
        }
    }
}

/// Serializer/deserializer failure from one of the supported text formats.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Error returned by save, load and peek operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("failed to encode record: {source}")]
    Encode {
        #[source]
        source: FormatError,
    },

    #[error("I/O error accessing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(err) => err.kind(),
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Decode { .. } => ErrorKind::DecodeError,
            Error::Encode { .. } => ErrorKind::EncodeError,
            Error::Io { .. } => ErrorKind::IoError,
        }
    }

    /// True when the storage location does not exist yet.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// The path involved in the failure, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::NotFound { path } | Error::Decode { path, .. } | Error::Io { path, .. } => {
                Some(path)
            }
            Error::Validation(_) | Error::Encode { .. } => None,
        }
    }

    // Convenience constructors

    pub(crate) fn decode(path: &Path, source: impl Into<FormatError>) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub(crate) fn encode(source: impl Into<FormatError>) -> Self {
        Self::Encode {
            source: source.into(),
        }
    }

    /// Classify an I/O error, splitting out a missing file as `NotFound`.
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Result type for versioned config operations.
pub type Result<T> = std::result::Result<T, Error>;

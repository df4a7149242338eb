/*!
 * Error Types
 * Structured, type-safe error handling for file and path operations
 */

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// File operation result
///
/// # Must Use
/// File operations can fail and must be handled to prevent data loss
#[must_use = "file operations can fail and must be handled"]
pub type FsResult<T> = Result<T, FsError>;

/// File and path errors with structured, type-safe error handling
///
/// All error variants carrying context strings require them to be non-empty.
/// Serialization uses tagged enum pattern for type safety.
///
/// Partial byte transfer is not represented here: `read`/`write` report the
/// transferred count through `Ok(n)` and callers loop as needed.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum FsError {
    #[error("Not found: {0}")]
    NotFound(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Access denied: {0}")]
    AccessDenied(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Already exists: {0}")]
    AlreadyExists(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Handle is not open")]
    InvalidHandle,

    #[error("Not a directory: {0}")]
    NotADirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Not supported: {0}")]
    Unsupported(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Partial failure: {0}")]
    Partial(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("I/O error: {0}")]
    Io(#[serde(deserialize_with = "deserialize_nonempty_string")] String),
}

impl FsError {
    /// Convert std::io::Error to FsError, preserving the failed operation as context
    pub(crate) fn from_io(e: std::io::Error, context: impl Into<String>) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::NotFound => FsError::NotFound(context.into()),
            ErrorKind::PermissionDenied => FsError::AccessDenied(context.into()),
            ErrorKind::AlreadyExists => FsError::AlreadyExists(context.into()),
            ErrorKind::Unsupported => FsError::Unsupported(context.into()),
            ErrorKind::InvalidInput => FsError::InvalidArgument(context.into()),
            _ => FsError::Io(format!("{}: {}", context.into(), e)),
        }
    }
}

impl From<FsError> for std::io::Error {
    fn from(e: FsError) -> Self {
        use std::io::ErrorKind;
        let kind = match &e {
            FsError::NotFound(_) => ErrorKind::NotFound,
            FsError::AccessDenied(_) => ErrorKind::PermissionDenied,
            FsError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            FsError::Unsupported(_) => ErrorKind::Unsupported,
            FsError::InvalidArgument(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::Other,
        };
        std::io::Error::new(kind, e.to_string())
    }
}

/// Deserialize and validate non-empty string for error messages
pub(super) fn deserialize_nonempty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Err(serde::de::Error::custom("error message must not be empty"));
    }
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_validation() {
        // Valid error with non-empty message
        let error = FsError::NotFound("file.txt".to_string());
        let json = serde_json::to_string(&error).unwrap();
        let deserialized: FsError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, deserialized);

        // Invalid error with empty message should fail deserialization
        let invalid_json = r#"{"error":"not_found","details":""}"#;
        let result: Result<FsError, _> = serde_json::from_str(invalid_json);
        assert!(result.is_err());
    }

    #[test]
    fn test_io_error_mapping() {
        use std::io::{Error, ErrorKind};

        let e = FsError::from_io(Error::new(ErrorKind::NotFound, "x"), "open a.txt");
        assert_eq!(e, FsError::NotFound("open a.txt".to_string()));

        let e = FsError::from_io(Error::new(ErrorKind::PermissionDenied, "x"), "open b.txt");
        assert_eq!(e, FsError::AccessDenied("open b.txt".to_string()));

        // Round-trip back into io::Error preserves the kind
        let io: Error = FsError::NotFound("c.txt".to_string()).into();
        assert_eq!(io.kind(), ErrorKind::NotFound);
    }
}

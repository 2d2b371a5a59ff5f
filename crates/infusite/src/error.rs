//! Error types for infusite.
//!
//! Every fallible operation in the library returns [`Result`]. Storage read
//! failures are deliberately absent from most call sites: the record store
//! swallows them and hands back an empty history instead.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for infusite operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Domain Errors ===
    /// A location id that is not part of the catalog.
    #[error("unknown location '{id}'")]
    UnknownLocation {
        /// The id that failed to resolve.
        id: String,
    },

    /// A record could not be built from the given input.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the problem.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for infusite operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an unknown location error.
    #[must_use]
    pub fn unknown_location(id: impl Into<String>) -> Self {
        Self::UnknownLocation { id: id.into() }
    }

    /// Create an invalid record error.
    #[must_use]
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unknown_location("elbow_left");
        assert_eq!(err.to_string(), "unknown location 'elbow_left'");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_invalid_record_display() {
        let err = Error::invalid_record("duration must not be negative");
        assert_eq!(
            err.to_string(),
            "invalid record: duration must not be negative"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "max_records must be at least 1".to_string(),
        };
        assert!(err.to_string().contains("max_records"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_database_open_error_display() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err = Error::DatabaseOpen {
                path: PathBuf::from("/nonexistent/path/db.sqlite"),
                source: sqlite_err,
            };
            assert!(err.to_string().contains("/nonexistent/path/db.sqlite"));
        }
    }
}

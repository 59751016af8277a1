//! Domain error types for test-run record synchronization.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

/// Record-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The testcase reference in a payload is missing or unparsable
    #[error("Malformed reference: {0}")]
    MalformedReference(String),

    /// The service returned no record for this identity
    #[error("No record for test case '{testcase}' in test run '{test_run}'")]
    RecordNotFound { test_run: String, testcase: String },

    /// Fetching record state from the service failed
    #[error("Remote read failed: {0}")]
    RemoteReadFailure(String),

    /// The service rejected a write or could not be reached
    #[error("Remote write failed: {0}")]
    RemoteWriteFailure(String),

    /// No attachment with the given file name
    #[error("Could not find attachment with name {0}")]
    AttachmentNotFound(String),

    /// The attachment transfer did not succeed
    #[error("Could not download attachment {file_name}: {reason}")]
    AttachmentDownloadFailed { file_name: String, reason: String },

    /// Upload source could not be read
    #[error("Local file not found: {0}")]
    LocalFileNotFound(String),

    /// Download destination could not be written
    #[error("Could not write local file: {0}")]
    LocalFileWrite(String),

    /// The HTTP client for attachment downloads could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// A well-known field could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Errors reported by a test-management service implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The service could not be reached
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a fault
    #[error("rejected by service: {0}")]
    Rejected(String),
}

/// Convenience type alias for service call results.
pub type ServiceResult<T> = Result<T, ServiceError>;

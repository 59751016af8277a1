//! Domain models for test-run records.

pub mod execution_result;
pub mod record_fields;

// Re-export commonly used types
pub use execution_result::ExecutionResult;
pub use record_fields::{
    EnumOptionId, TestRunAttachment, TestRunAttachments, TestStepResult, TestStepResults,
    TextContent,
};

/// Open mapping of record attributes.
pub type FieldBag = serde_json::Map<String, serde_json::Value>;

/// The test run owning a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRunRef {
    /// Service URI of the test run
    pub uri: String,
    /// Human-readable test run id
    pub id: String,
}

impl TestRunRef {
    pub fn new(uri: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            id: id.into(),
        }
    }
}

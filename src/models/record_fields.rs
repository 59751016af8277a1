//! Typed shapes of the well-known record fields.
//!
//! Records travel as an open field bag; these types only describe the values
//! behind the keys this crate interprets. Unknown keys inside them are kept
//! through `extra` so a read-modify-write never drops data.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Content type used for every comment written by this crate.
pub const RICH_TEXT_TYPE: &str = "text/html";

/// Field names in the record payload.
pub mod field {
    pub const RESULT: &str = "result";
    pub const COMMENT: &str = "comment";
    pub const TEST_STEP_RESULTS: &str = "testStepResults";
    pub const ATTACHMENTS: &str = "attachments";
    pub const EXECUTED_BY_URI: &str = "executedByURI";
    pub const EXECUTED: &str = "executed";
    pub const TEST_CASE_URI: &str = "testCaseURI";
    pub const DEFECT_URI: &str = "defectURI";
}

/// Treat an explicit `null` list as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Rich-text value (comments).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    #[serde(rename = "contentLossy")]
    pub content_lossy: Option<bool>,
}

impl TextContent {
    /// Wrap text (which may contain markup) as lossless HTML content.
    pub fn html(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            content_type: Some(RICH_TEXT_TYPE.to_string()),
            content_lossy: Some(false),
        }
    }
}

/// Reference to an enum option by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumOptionId {
    pub id: Option<String>,
}

/// Result of a single test step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestStepResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<EnumOptionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<TextContent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Ordered per-step results of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestStepResults {
    #[serde(rename = "TestStepResult", default, deserialize_with = "null_as_empty")]
    pub steps: Vec<TestStepResult>,
}

impl TestStepResults {
    /// `count` empty step slots.
    pub fn empty(count: usize) -> Self {
        Self {
            steps: vec![TestStepResult::default(); count],
        }
    }
}

/// Metadata of one binary attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunAttachment {
    #[serde(rename = "fileName", default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Attachment collection of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestRunAttachments {
    #[serde(rename = "TestRunAttachment", default, deserialize_with = "null_as_empty")]
    pub attachments: Vec<TestRunAttachment>,
}

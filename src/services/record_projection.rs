//! Local projection of one test-run record.
//!
//! The projection wraps the service payload of a single record as an open
//! field bag. Every operation that changes visible state pushes the full set of
//! public fields back to the service and then reloads, so after a successful
//! mutation the local state is exactly what the server accepted.
//!
//! Field partition:
//! - public: every key not starting with [`PRIVATE_FIELD_PREFIX`], resent on save
//! - private: identity, derived caches and `_`-prefixed keys, never sent
//!
//! The projection is single-threaded. Calls must not overlap, including the
//! first call to [`RecordProjection::set_test_step_result`], which lazily
//! initializes the step collection.

use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::record_fields::field;
use crate::models::{
    ExecutionResult, FieldBag, TestRunAttachment, TestRunAttachments, TestRunRef,
    TestStepResults, TextContent,
};
use crate::services::ServiceContext;

/// Keys starting with this prefix stay local and are never saved.
pub const PRIVATE_FIELD_PREFIX: char = '_';

/// Separator between the namespace and the case name in a testcase URI.
const NAMESPACE_DELIMITER: char = '}';

/// Whether a field name belongs to the private partition.
pub fn is_private_field(name: &str) -> bool {
    name.starts_with(PRIVATE_FIELD_PREFIX)
}

/// Flatten a record payload into a field bag.
///
/// Every sub-mapping of the payload contributes its keys as top-level fields.
/// Non-mapping entries are copied as they are. On key collisions the entry
/// visited last wins; visiting order is the payload's key order.
pub fn flatten_payload(payload: &Value) -> AppResult<FieldBag> {
    let groups = payload.as_object().ok_or_else(|| {
        AppError::RemoteReadFailure("record payload is not a mapping".to_string())
    })?;

    let mut fields = FieldBag::new();
    for (group, value) in groups {
        match value {
            Value::Object(inner) => {
                for (key, inner_value) in inner {
                    fields.insert(key.clone(), inner_value.clone());
                }
            }
            other => {
                fields.insert(group.clone(), other.clone());
            }
        }
    }
    Ok(fields)
}

/// Case name of a testcase URI: the component after the namespace, e.g.
/// `"{ns}Proj/TC-123"` gives `"Proj/TC-123"`.
pub fn parse_case_name(testcase_uri: &str) -> AppResult<String> {
    match testcase_uri.split(NAMESPACE_DELIMITER).nth(1) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(AppError::MalformedReference(format!(
            "testcase URI '{}' has no case name after the namespace",
            testcase_uri
        ))),
    }
}

/// State derived from one payload.
struct Snapshot {
    fields: FieldBag,
    testcase_uri: String,
    testcase_name: String,
    defect_uri: Option<String>,
}

impl Snapshot {
    fn build(payload: &Value) -> AppResult<Self> {
        let fields = flatten_payload(payload)?;

        let testcase_uri = fields
            .get(field::TEST_CASE_URI)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::MalformedReference(format!(
                    "record payload has no '{}' field",
                    field::TEST_CASE_URI
                ))
            })?
            .to_string();
        let testcase_name = parse_case_name(&testcase_uri)?;
        let defect_uri = fields
            .get(field::DEFECT_URI)
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Snapshot {
            fields,
            testcase_uri,
            testcase_name,
            defect_uri,
        })
    }
}

/// One test case's execution record inside a test run.
pub struct RecordProjection {
    ctx: ServiceContext,
    test_run: TestRunRef,
    index: usize,
    fields: FieldBag,
    testcase_uri: String,
    testcase_name: String,
    defect_uri: Option<String>,
}

impl RecordProjection {
    /// Build a projection from a raw service payload.
    pub fn from_payload(
        ctx: ServiceContext,
        test_run: TestRunRef,
        payload: &Value,
        index: usize,
    ) -> AppResult<Self> {
        let snapshot = Snapshot::build(payload)?;
        debug!(
            "Loaded record {} of test run '{}' ({} fields)",
            index,
            test_run.id,
            snapshot.fields.len()
        );

        Ok(Self {
            ctx,
            test_run,
            index,
            fields: snapshot.fields,
            testcase_uri: snapshot.testcase_uri,
            testcase_name: snapshot.testcase_name,
            defect_uri: snapshot.defect_uri,
        })
    }

    fn apply(&mut self, snapshot: Snapshot) {
        self.fields = snapshot.fields;
        self.testcase_uri = snapshot.testcase_uri;
        self.testcase_name = snapshot.testcase_name;
        self.defect_uri = snapshot.defect_uri;
    }

    /// Re-fetch this record from the service and rebuild local state.
    pub fn reload(&mut self) -> AppResult<()> {
        let records = self
            .ctx
            .service
            .get_test_case_records(&self.test_run.uri, &self.testcase_uri)
            .map_err(|e| AppError::RemoteReadFailure(e.to_string()))?;

        let payload = records
            .into_iter()
            .next()
            .ok_or_else(|| AppError::RecordNotFound {
                test_run: self.test_run.uri.clone(),
                testcase: self.testcase_uri.clone(),
            })?;

        let snapshot = Snapshot::build(&payload)?;
        self.apply(snapshot);
        debug!("Reloaded record '{}'", self.testcase_name);
        Ok(())
    }

    /// Public fields, as submitted by [`save`](Self::save).
    pub fn public_fields(&self) -> FieldBag {
        self.fields
            .iter()
            .filter(|(key, _)| !is_private_field(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Send every public field to the service as a full-replace update, then reload.
    ///
    /// On failure the local fields keep their unsynced edits.
    pub fn save(&mut self) -> AppResult<()> {
        let record = self.public_fields();
        info!(
            "Saving record '{}' in test run '{}' ({} fields)",
            self.testcase_name,
            self.test_run.id,
            record.len()
        );

        self.ctx
            .service
            .execute_test(&self.test_run.uri, &record)
            .map_err(|e| AppError::RemoteWriteFailure(e.to_string()))?;

        self.reload()
    }

    /// Test run owning this record.
    pub fn test_run(&self) -> &TestRunRef {
        &self.test_run
    }

    /// Position of this record within its test run.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Service URI of the test case.
    pub fn testcase_uri(&self) -> &str {
        &self.testcase_uri
    }

    /// Test case name including its project prefix.
    pub fn test_case_name(&self) -> &str {
        &self.testcase_name
    }

    /// Linked defect, if any.
    pub fn defect_uri(&self) -> Option<&str> {
        self.defect_uri.as_deref()
    }

    /// The whole field bag, private keys included.
    pub fn fields(&self) -> &FieldBag {
        &self.fields
    }

    /// One field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Set a field locally. Not sent until the next save.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Reference to the user who executed the record.
    pub fn executed_by_uri(&self) -> Option<&str> {
        self.present(field::EXECUTED_BY_URI).and_then(Value::as_str)
    }

    /// Execution timestamp, if set and RFC 3339 formatted.
    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.present(field::EXECUTED)
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|at| at.with_timezone(&Utc))
    }

    fn present(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|value| !value.is_null())
    }

    /// Record result; `None` when unset.
    pub fn result(&self) -> ExecutionResult {
        let id = self
            .present(field::RESULT)
            .and_then(|result| result.get("id"))
            .and_then(Value::as_str);
        ExecutionResult::from_id(id)
    }

    /// Set the record result (and optionally its comment), then save.
    pub fn set_result(&mut self, result: ExecutionResult, comment: Option<&str>) -> AppResult<()> {
        if let Some(comment) = comment {
            self.set_comment(comment)?;
        }

        let id = result.as_id().map_or(Value::Null, Value::from);
        match self.fields.get_mut(field::RESULT) {
            Some(Value::Object(holder)) => {
                holder.insert("id".to_string(), id);
            }
            _ => {
                self.fields
                    .insert(field::RESULT.to_string(), json!({ "id": id }));
            }
        }

        self.save()
    }

    /// Mark the record failed and save. A pass has to be set explicitly.
    pub fn set_result_default(&mut self) -> AppResult<()> {
        self.set_result(ExecutionResult::Failed, None)
    }

    /// Comment content. May contain HTML if edited on the server.
    pub fn comment(&self) -> Option<&str> {
        self.present(field::COMMENT)
            .and_then(|comment| comment.get("content"))
            .and_then(Value::as_str)
    }

    /// Set the comment locally. Not sent until the next save.
    pub fn set_comment(&mut self, comment: &str) -> AppResult<()> {
        let value = serde_json::to_value(TextContent::html(comment))?;
        self.fields.insert(field::COMMENT.to_string(), value);
        Ok(())
    }

    /// Per-step results, if the collection exists.
    pub fn test_step_results(&self) -> AppResult<Option<TestStepResults>> {
        match self.present(field::TEST_STEP_RESULTS) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Set the result of one test step, then save.
    ///
    /// The step collection is created on first use with one empty slot per
    /// step of the test case. A `step_number` past the last slot changes
    /// nothing locally, but the record is still saved.
    pub fn set_test_step_result(
        &mut self,
        step_number: usize,
        result: ExecutionResult,
        comment: Option<&str>,
    ) -> AppResult<()> {
        if self.present(field::TEST_STEP_RESULTS).is_none() {
            let step_count = self
                .ctx
                .service
                .get_test_step_count(&self.testcase_uri)
                .map_err(|e| AppError::RemoteReadFailure(e.to_string()))?;
            info!(
                "Initializing {} step results for '{}'",
                step_count, self.testcase_name
            );
            let steps = serde_json::to_value(TestStepResults::empty(step_count))?;
            self.fields
                .insert(field::TEST_STEP_RESULTS.to_string(), steps);
        }

        let result_value = json!({ "id": result.as_id() });
        let comment_value = comment
            .map(|text| serde_json::to_value(TextContent::html(text)))
            .transpose()?;

        let slot = self
            .fields
            .get_mut(field::TEST_STEP_RESULTS)
            .and_then(|steps| steps.get_mut("TestStepResult"))
            .and_then(Value::as_array_mut)
            .and_then(|slots| slots.get_mut(step_number));

        match slot {
            Some(slot) => {
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Some(step) = slot.as_object_mut() {
                    step.insert("result".to_string(), result_value);
                    if let Some(comment_value) = comment_value {
                        step.insert("comment".to_string(), comment_value);
                    }
                }
            }
            None => warn!(
                "Step {} is out of range for '{}', result not recorded",
                step_number, self.testcase_name
            ),
        }

        self.save()
    }

    /// Whether the record carries an attachment collection (possibly empty).
    pub fn has_attachment(&self) -> bool {
        self.present(field::ATTACHMENTS).is_some()
    }

    /// Attachment metadata; empty when the record has none.
    pub fn attachments(&self) -> AppResult<Vec<TestRunAttachment>> {
        match self.present(field::ATTACHMENTS) {
            Some(value) => {
                let collection: TestRunAttachments = serde_json::from_value(value.clone())?;
                Ok(collection.attachments)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Download the content of the attachment named `file_name`.
    ///
    /// If several attachments share the name, the last one wins.
    pub fn attachment(&self, file_name: &str) -> AppResult<Vec<u8>> {
        let url = self
            .attachments()?
            .into_iter()
            .rev()
            .find(|attachment| attachment.file_name.as_deref() == Some(file_name))
            .and_then(|attachment| attachment.url)
            .ok_or_else(|| AppError::AttachmentNotFound(file_name.to_string()))?;

        self.ctx.attachments.fetch(file_name, &url)
    }

    /// Download an attachment into `path`, creating or truncating the file.
    pub fn save_attachment_as_file(&self, file_name: &str, path: impl AsRef<Path>) -> AppResult<()> {
        let path = path.as_ref();
        let data = self.attachment(file_name)?;

        let write_failed =
            |e: std::io::Error| AppError::LocalFileWrite(format!("{}: {}", path.display(), e));
        let mut file = File::create(path).map_err(write_failed)?;
        file.write_all(&data).map_err(write_failed)?;
        file.flush().map_err(write_failed)?;

        debug!(
            "Saved attachment '{}' to {} ({} bytes)",
            file_name,
            path.display(),
            data.len()
        );
        Ok(())
    }

    /// Upload a local file as a new attachment, then reload.
    pub fn add_attachment(&mut self, file_path: impl AsRef<Path>, title: &str) -> AppResult<()> {
        let file_path = file_path.as_ref();
        let data = fs::read(file_path).map_err(|e| {
            AppError::LocalFileNotFound(format!("{}: {}", file_path.display(), e))
        })?;
        let file_name = file_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                AppError::LocalFileNotFound(format!(
                    "{}: path has no file name",
                    file_path.display()
                ))
            })?;

        info!(
            "Uploading attachment '{}' ({} bytes) to '{}'",
            file_name,
            data.len(),
            self.testcase_name
        );
        self.ctx
            .service
            .add_attachment_to_test_record(&self.test_run.uri, self.index, file_name, title, &data)
            .map_err(|e| AppError::RemoteWriteFailure(e.to_string()))?;

        self.reload()
    }

    /// Remove the named attachment on the service, then reload.
    pub fn delete_attachment(&mut self, file_name: &str) -> AppResult<()> {
        info!(
            "Deleting attachment '{}' from '{}'",
            file_name, self.testcase_name
        );
        self.ctx
            .service
            .delete_attachment_from_test_record(&self.test_run.uri, self.index, file_name)
            .map_err(|e| AppError::RemoteWriteFailure(e.to_string()))?;

        self.reload()
    }
}

impl fmt::Display for RecordProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let executed = self
            .present(field::EXECUTED)
            .map(|value| match value {
                Value::String(raw) => raw.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "never".to_string());
        write!(
            f,
            "{} in {} ({} on {})",
            self.testcase_name,
            self.test_run.id,
            self.result(),
            executed
        )
    }
}

impl fmt::Debug for RecordProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordProjection")
            .field("test_run", &self.test_run)
            .field("index", &self.index)
            .field("testcase_uri", &self.testcase_uri)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

//! In-memory test-management service for tests.
//!
//! Stores one record payload and answers every service call against it,
//! recording each call so tests can assert on round-trips.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use testrun_record::error::{AppError, AppResult, ServiceError, ServiceResult};
use testrun_record::models::FieldBag;
use testrun_record::services::{AttachmentSource, TestManagementService};

/// Timestamp the mock fills in when a saved record has no `executed` value.
pub const SERVER_EXECUTED: &str = "2026-10-16T10:00:00Z";

/// Shared state of the mock service.
#[derive(Default)]
pub struct MockState {
    /// Stored record payload (field groups)
    pub payload: Value,
    /// Steps defined on the test case
    pub step_count: usize,
    /// Field bags received by `execute_test`
    pub executed: Vec<FieldBag>,
    pub fetch_calls: usize,
    pub step_count_calls: usize,
    pub deleted: Vec<String>,
    /// Attachment content by URL
    pub blobs: HashMap<String, Vec<u8>>,
    /// Reject the next writes
    pub fail_writes: bool,
    /// Answer fetches with no records
    pub record_missing: bool,
}

#[derive(Clone, Default)]
pub struct MockService {
    pub state: Arc<Mutex<MockState>>,
}

impl MockService {
    pub fn new(payload: Value, step_count: usize) -> Self {
        let service = Self::default();
        {
            let mut state = service.state.lock().unwrap();
            state.payload = payload;
            state.step_count = step_count;
        }
        service
    }

    pub fn execute_count(&self) -> usize {
        self.state.lock().unwrap().executed.len()
    }

    pub fn last_executed(&self) -> FieldBag {
        self.state
            .lock()
            .unwrap()
            .executed
            .last()
            .cloned()
            .expect("execute_test was never called")
    }

    pub fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetch_calls
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    /// Stored payload with the given attachment appended.
    pub fn put_attachment(&self, file_name: &str, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        let url = format!("mock://attachments/{}", file_name);
        state.blobs.insert(url.clone(), data.to_vec());
        let entry = json!({"fileName": file_name, "title": file_name, "url": url});
        push_attachment(&mut state.payload, entry);
    }
}

fn record_group(payload: &mut Value) -> &mut serde_json::Map<String, Value> {
    payload
        .as_object_mut()
        .and_then(|groups| groups.get_mut("record"))
        .and_then(Value::as_object_mut)
        .expect("mock payload must have a 'record' group")
}

fn push_attachment(payload: &mut Value, entry: Value) {
    let record = record_group(payload);
    let collection = record
        .entry("attachments")
        .or_insert(Value::Null);
    if collection.is_null() {
        *collection = json!({"TestRunAttachment": []});
    }
    collection["TestRunAttachment"]
        .as_array_mut()
        .expect("attachment list")
        .push(entry);
}

impl TestManagementService for MockService {
    fn get_test_case_records(
        &self,
        _test_run_uri: &str,
        _testcase_uri: &str,
    ) -> ServiceResult<Vec<Value>> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        if state.record_missing {
            return Ok(Vec::new());
        }
        Ok(vec![state.payload.clone()])
    }

    fn execute_test(&self, _test_run_uri: &str, record: &FieldBag) -> ServiceResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(ServiceError::Rejected("record is locked".to_string()));
        }
        state.executed.push(record.clone());

        let mut stored = record.clone();
        let executed_missing = stored.get("executed").is_none_or(Value::is_null);
        if executed_missing {
            stored.insert("executed".to_string(), json!(SERVER_EXECUTED));
        }
        state.payload = json!({ "record": stored });
        Ok(())
    }

    fn get_test_step_count(&self, _testcase_uri: &str) -> ServiceResult<usize> {
        let mut state = self.state.lock().unwrap();
        state.step_count_calls += 1;
        Ok(state.step_count)
    }

    fn add_attachment_to_test_record(
        &self,
        _test_run_uri: &str,
        _index: usize,
        file_name: &str,
        title: &str,
        data: &[u8],
    ) -> ServiceResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(ServiceError::Transport("connection reset".to_string()));
        }
        let url = format!("mock://attachments/{}", file_name);
        state.blobs.insert(url.clone(), data.to_vec());
        let entry = json!({"fileName": file_name, "title": title, "url": url});
        push_attachment(&mut state.payload, entry);
        Ok(())
    }

    fn delete_attachment_from_test_record(
        &self,
        _test_run_uri: &str,
        _index: usize,
        file_name: &str,
    ) -> ServiceResult<()> {
        let mut state = self.state.lock().unwrap();
        state.deleted.push(file_name.to_string());
        let record = record_group(&mut state.payload);
        if let Some(list) = record
            .get_mut("attachments")
            .and_then(|collection| collection.get_mut("TestRunAttachment"))
            .and_then(Value::as_array_mut)
        {
            list.retain(|entry| entry["fileName"] != json!(file_name));
        }
        Ok(())
    }
}

impl AttachmentSource for MockService {
    fn fetch(&self, file_name: &str, url: &str) -> AppResult<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .blobs
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::AttachmentDownloadFailed {
                file_name: file_name.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            })
    }
}

//! Record synchronization services and the collaborator seams they call.

pub mod attachment_client;
pub mod record_projection;

use std::sync::Arc;

use serde_json::Value;

use crate::error::{AppResult, ServiceResult};
use crate::models::FieldBag;

pub use attachment_client::HttpAttachmentClient;
pub use record_projection::RecordProjection;

/// Remote test-management service calls used by a record.
///
/// Implementations own transport concerns (timeouts, retries, pooling).
pub trait TestManagementService {
    /// Records of `testcase_uri` within `test_run_uri`, as raw payloads.
    fn get_test_case_records(
        &self,
        test_run_uri: &str,
        testcase_uri: &str,
    ) -> ServiceResult<Vec<Value>>;

    /// Full-replace write of a record's public fields.
    fn execute_test(&self, test_run_uri: &str, record: &FieldBag) -> ServiceResult<()>;

    /// Number of steps defined on a test case.
    fn get_test_step_count(&self, testcase_uri: &str) -> ServiceResult<usize>;

    fn add_attachment_to_test_record(
        &self,
        test_run_uri: &str,
        index: usize,
        file_name: &str,
        title: &str,
        data: &[u8],
    ) -> ServiceResult<()>;

    fn delete_attachment_from_test_record(
        &self,
        test_run_uri: &str,
        index: usize,
        file_name: &str,
    ) -> ServiceResult<()>;
}

/// Binary download of attachment content.
pub trait AttachmentSource {
    /// Fetch the bytes behind `url`. `file_name` is only used for error reporting.
    fn fetch(&self, file_name: &str, url: &str) -> AppResult<Vec<u8>>;
}

/// Collaborators shared by every record of a session.
#[derive(Clone)]
pub struct ServiceContext {
    pub service: Arc<dyn TestManagementService>,
    pub attachments: Arc<dyn AttachmentSource>,
}

impl ServiceContext {
    pub fn new(
        service: Arc<dyn TestManagementService>,
        attachments: Arc<dyn AttachmentSource>,
    ) -> Self {
        Self {
            service,
            attachments,
        }
    }
}

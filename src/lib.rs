//! Test-run record synchronization library.
//!
//! This library keeps a local projection of one test-run record in sync with a
//! remote test-management service through explicit read-modify-write cycles,
//! including per-step results and binary attachments.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use error::{AppError, AppResult, ServiceError, ServiceResult};
pub use models::{ExecutionResult, FieldBag, TestRunRef};
pub use services::{
    AttachmentSource, HttpAttachmentClient, RecordProjection, ServiceContext,
    TestManagementService,
};

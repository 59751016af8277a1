//! Per-step results.
//!
//! A step number past the last step is a silent no-op that still saves; these
//! tests pin that behavior.

use serde_json::json;
use testrun_record::models::{ExecutionResult, TextContent};

use crate::test_helpers::setup;

#[test]
fn test_first_step_result_initializes_slots() {
    let (mock, mut record) = setup(3);

    record
        .set_test_step_result(1, ExecutionResult::Passed, None)
        .unwrap();

    let steps = record.test_step_results().unwrap().expect("steps created");
    assert_eq!(steps.steps.len(), 3);
    assert_eq!(steps.steps[0].result, None);
    assert_eq!(steps.steps[1].result.as_ref().unwrap().id.as_deref(), Some("passed"));
    assert_eq!(steps.steps[2].result, None);
    assert_eq!(mock.state.lock().unwrap().step_count_calls, 1);
    assert_eq!(mock.execute_count(), 1);
}

#[test]
fn test_step_collection_initialized_once() {
    let (mock, mut record) = setup(2);

    record
        .set_test_step_result(0, ExecutionResult::Passed, None)
        .unwrap();
    record
        .set_test_step_result(1, ExecutionResult::Blocked, Some("env down"))
        .unwrap();

    assert_eq!(mock.state.lock().unwrap().step_count_calls, 1);
    let steps = record.test_step_results().unwrap().unwrap();
    assert_eq!(steps.steps[0].result.as_ref().unwrap().id.as_deref(), Some("passed"));
    assert_eq!(steps.steps[1].comment, Some(TextContent::html("env down")));
}

#[test]
fn test_step_comment_overwrites_previous() {
    let (mock, mut record) = setup(1);

    record
        .set_test_step_result(0, ExecutionResult::Failed, Some("first"))
        .unwrap();
    record
        .set_test_step_result(0, ExecutionResult::Failed, Some("second"))
        .unwrap();

    let sent = mock.last_executed();
    assert_eq!(
        sent["testStepResults"]["TestStepResult"][0]["comment"],
        json!({"content": "second", "type": "text/html", "contentLossy": false})
    );
}

#[test]
fn test_out_of_range_step_still_saves() {
    let (mock, mut record) = setup(2);

    record
        .set_test_step_result(2, ExecutionResult::Passed, Some("ignored"))
        .unwrap();

    assert_eq!(mock.execute_count(), 1);
    let steps = record.test_step_results().unwrap().unwrap();
    assert_eq!(steps.steps.len(), 2);
    assert!(steps.steps.iter().all(|step| step.result.is_none() && step.comment.is_none()));
}

#[test]
fn test_test_case_without_steps() {
    let (mock, mut record) = setup(0);

    record
        .set_test_step_result(0, ExecutionResult::Passed, None)
        .unwrap();

    assert_eq!(mock.execute_count(), 1);
    assert_eq!(
        mock.last_executed()["testStepResults"],
        json!({"TestStepResult": []})
    );
}

use crate::ErrorResponse;

use googletest::assert_that;
use googletest::prelude::eq;

#[test]
fn given_message_and_error_when_summarized_then_message_preferred() {
    let response = ErrorResponse::parse(r#"{"error":"bad_request","message":"Wrong password","code":"401"}"#)
        .unwrap();

    assert_that!(response.safe_message(), eq("Wrong password"));
}

#[test]
fn given_blank_message_when_summarized_then_error_used() {
    let response = ErrorResponse::parse(r#"{"error":"locked","message":"  "}"#).unwrap();

    assert_that!(response.safe_message(), eq("locked"));
}

#[test]
fn given_long_message_when_summarized_then_truncated_to_limit() {
    let long = "å".repeat(150);
    let response = ErrorResponse {
        message: Some(long),
        ..ErrorResponse::default()
    };

    let summary = response.safe_message();

    assert_that!(summary.chars().count(), eq(103));
    assert!(summary.ends_with("..."));
}

#[test]
fn given_empty_document_when_summarized_then_unknown_error() {
    assert_that!(ErrorResponse::default().safe_message(), eq("Unknown error"));
}

#[test]
fn given_non_json_body_when_summarized_then_body_not_echoed() {
    assert_that!(
        ErrorResponse::summarize("<html>password=hunter2</html>"),
        eq("Unknown error")
    );
}

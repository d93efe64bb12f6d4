use crate::CliError;
use crate::handlers::{flatten_roles_file, normalize_id, normalize_name};

use idsync_core::FixedClock;

use chrono::NaiveDate;
use googletest::prelude::*;
use serde_json::json;

#[test]
fn given_name_with_diacritics_when_normalized_then_ascii_token() {
    assert_eq!(normalize_name("Anna", "Öberg"), json!({"firstlast": "anna.oberg"}));
    assert_eq!(normalize_name("", "Doe"), json!({"firstlast": ".doe"}));
}

#[test]
fn given_short_national_id_when_normalized_then_century_prefixed() {
    // Given
    let clock = FixedClock(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());

    // When
    let output = normalize_id("900101-1234", &clock);

    // Then
    assert_eq!(
        output,
        json!({"identifier": "900101-1234", "normalized": "199001011234"})
    );
}

#[test]
fn given_roles_file_when_flattened_then_sorted_permissions() {
    // Given
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roles.json");
    std::fs::write(&path, r#"{"organisation": {"692": {"68": "board_member"}}}"#).unwrap();

    // When
    let output = flatten_roles_file(&path).unwrap();

    // Then
    assert_eq!(
        output,
        json!([
            "*:*:board_member",
            "organisation:*:*",
            "organisation:*:board_member",
            "organisation:692:*",
            "organisation:692:board_member"
        ])
    );
}

#[test]
fn given_missing_roles_file_when_flattened_then_io_error() {
    // Given
    let dir = tempfile::tempdir().unwrap();

    // When
    let result = flatten_roles_file(&dir.path().join("missing.json"));

    // Then
    assert!(matches!(result, Err(CliError::Io { .. })));
}

#[test]
fn given_non_json_roles_file_when_flattened_then_payload_error() {
    // Given
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roles.json");
    std::fs::write(&path, "not json").unwrap();

    // When
    let result = flatten_roles_file(&path);

    // Then
    assert_that!(result.is_err(), eq(true));
    assert!(matches!(result, Err(CliError::Payload { .. })));
}

use crate::{SyncError, retry_on_conflict};

use idsync_store::StoreError;

use std::sync::atomic::{AtomicU32, Ordering};

use googletest::prelude::*;

#[tokio::test]
async fn given_conflict_then_success_when_retried_then_returns_value() {
    // Given
    let counter = AtomicU32::new(0);
    let calls = &counter;

    // When
    let result = retry_on_conflict(3, "test", move || async move {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(SyncError::from(StoreError::conflict("group", "1001")))
        } else {
            Ok(42)
        }
    })
    .await;

    // Then
    assert_that!(result.unwrap(), eq(42));
    assert_that!(calls.load(Ordering::SeqCst), eq(2));
}

#[tokio::test]
async fn given_persistent_conflict_when_retried_then_gives_up_after_max_attempts() {
    // Given
    let counter = AtomicU32::new(0);
    let calls = &counter;

    // When
    let result: std::result::Result<(), StoreError> = retry_on_conflict(3, "test", move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::conflict("group", "1001"))
    })
    .await;

    // Then
    assert!(result.unwrap_err().is_conflict());
    assert_that!(calls.load(Ordering::SeqCst), eq(3));
}

#[tokio::test]
async fn given_non_conflict_error_when_retried_then_fails_immediately() {
    // Given
    let counter = AtomicU32::new(0);
    let calls = &counter;

    // When
    let result: std::result::Result<(), StoreError> = retry_on_conflict(3, "test", move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::not_found("user", "x"))
    })
    .await;

    // Then
    assert!(result.is_err());
    assert_that!(calls.load(Ordering::SeqCst), eq(1));
}

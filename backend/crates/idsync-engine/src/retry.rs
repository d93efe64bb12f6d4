use crate::SyncError;

use idsync_store::StoreError;

/// Run `operation` until it succeeds, fails for a reason other than a conflict,
/// or `max_attempts` is reached.
///
/// There is no delay between attempts: a conflict means another writer got there
/// first, and the next attempt re-reads the state it produced.
pub async fn retry_on_conflict<F, Fut, T, E>(
    max_attempts: u32,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display + IsRetryable,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    log::debug!("{} succeeded after {} attempts", operation_name, attempts);
                }
                return Ok(result);
            }
            Err(e) => {
                if !e.is_retryable() || attempts >= max_attempts {
                    if e.is_retryable() {
                        log::warn!(
                            "{} still conflicting after {} attempts: {}",
                            operation_name,
                            attempts,
                            e
                        );
                    }
                    return Err(e);
                }

                log::debug!(
                    "{} attempt {} conflicted: {}. Re-checking",
                    operation_name,
                    attempts,
                    e
                );
            }
        }
    }
}

/// Trait for errors that can indicate retryability
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for SyncError {
    fn is_retryable(&self) -> bool {
        self.is_conflict()
    }
}

impl IsRetryable for StoreError {
    fn is_retryable(&self) -> bool {
        self.is_conflict()
    }
}

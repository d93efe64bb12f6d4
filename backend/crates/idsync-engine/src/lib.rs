//! Identity synchronization engine.
//!
//! On every successful login the registry profile is fingerprinted; only when the
//! fingerprint changed are groups reconciled, aliases allocated and attributes
//! written, with the new fingerprint stored last.

pub mod attribute_names;
pub mod email_allocator;
pub mod error;
pub mod group_reconciler;
pub mod login_service;
pub mod retry;
pub mod sync_orchestrator;
pub mod sync_settings;

pub use email_allocator::{EmailAllocator, is_valid_domain};
pub use error::{LoginError, Result, SyncError};
pub use group_reconciler::{GroupReconciler, ReconcileReport, SyncTarget, sync_targets};
pub use login_service::{LoginOutcome, LoginService, SyncStatus};
pub use retry::{IsRetryable, retry_on_conflict};
pub use sync_orchestrator::{SyncInput, SyncOrchestrator, SyncOutcome};
pub use sync_settings::SyncSettings;

#[cfg(test)]
mod tests;

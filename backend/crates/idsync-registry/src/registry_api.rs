use crate::{AuthFailure, Result};

use idsync_core::AuthResponse;

use async_trait::async_trait;

/// Operations the sync engine needs from the member registry.
///
/// Profile and roles are returned as raw text: the fingerprint is computed over
/// the exact bytes the registry sent.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> std::result::Result<AuthResponse, AuthFailure>;

    async fn fetch_profile(&self, token: &str) -> Result<String>;

    /// `None` when the registry has no roles document for the member.
    async fn fetch_roles(&self, token: &str) -> Result<Option<String>>;

    /// `None` when the member has no image.
    async fn fetch_image(&self, token: &str) -> Result<Option<Vec<u8>>>;
}

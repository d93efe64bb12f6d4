use crate::{
    LoginError, ReconcileReport, SyncInput, SyncOrchestrator, SyncOutcome, SyncSettings,
    retry_on_conflict,
};

use idsync_core::{Clock, Profile, Roles, normalize_login_identifier};
use idsync_registry::RegistryApi;
use idsync_store::{IdentityStore, StoreError, StoredUser};

use std::sync::Arc;

use log::{error, info, warn};
use serde::Serialize;
use uuid::Uuid;

const CORRELATION_ID_LENGTH: usize = 8;

/// What happened to the local user during a login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncStatus {
    Unchanged,
    Updated { report: ReconcileReport },
    /// The login still succeeded; attributes may be stale.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub correlation_id: String,
    pub username: String,
    pub member_no: i64,
    pub sync: SyncStatus,
}

#[derive(Debug, Default)]
struct FetchedRoles {
    roles: Option<Roles>,
    payload: Option<String>,
    /// Fetch or parse failed, so existing role groups must be kept.
    missing: bool,
}

impl FetchedRoles {
    fn missing() -> Self {
        Self {
            missing: true,
            ..Self::default()
        }
    }
}

/// Authenticates against the registry and syncs the local user on success.
pub struct LoginService {
    registry: Arc<dyn RegistryApi>,
    store: Arc<dyn IdentityStore>,
    orchestrator: SyncOrchestrator,
    clock: Arc<dyn Clock>,
    settings: SyncSettings,
}

impl LoginService {
    pub fn new(
        registry: Arc<dyn RegistryApi>,
        store: Arc<dyn IdentityStore>,
        clock: Arc<dyn Clock>,
        settings: SyncSettings,
    ) -> Self {
        let orchestrator = SyncOrchestrator::new(Arc::clone(&store), settings.clone());
        Self {
            registry,
            store,
            orchestrator,
            clock,
            settings,
        }
    }

    pub async fn login(&self, identifier: &str, secret: &str) -> Result<LoginOutcome, LoginError> {
        if identifier.trim().is_empty() || secret.is_empty() {
            return Err(LoginError::missing_credentials());
        }

        let correlation_id = new_correlation_id();
        let identifier = normalize_login_identifier(identifier, self.clock.today());

        let auth = self
            .registry
            .authenticate(&identifier, secret)
            .await
            .map_err(|failure| {
                warn!("[{correlation_id}] Authentication refused: {failure}");
                LoginError::from(failure)
            })?;
        let Some(token) = auth.usable_token() else {
            error!("[{correlation_id}] Registry accepted credentials but returned no token");
            return Err(LoginError::service_unavailable("no token in authentication reply"));
        };

        let profile_payload = self.registry.fetch_profile(token).await.map_err(|e| {
            error!("[{correlation_id}] Profile fetch failed: {e}");
            LoginError::from(e)
        })?;
        let profile = Profile::parse(&profile_payload)?;

        let fetched = self.fetch_roles(token, &correlation_id).await;
        let image = self.fetch_image(token, &correlation_id).await;

        let user = self.find_or_create_user(profile.member_no).await?;
        info!(
            "[{correlation_id}] Authenticated member {} as {}",
            profile.member_no, user.username
        );

        let input = SyncInput {
            profile: &profile,
            profile_payload: &profile_payload,
            roles: fetched.roles.as_ref(),
            roles_payload: fetched.payload.as_deref(),
            roles_missing: fetched.missing,
            image: image.as_deref(),
        };

        let sync = match self.orchestrator.sync(&user, &input, &correlation_id).await {
            Ok(SyncOutcome::Unchanged { .. }) => SyncStatus::Unchanged,
            Ok(SyncOutcome::Updated { report, .. }) => SyncStatus::Updated { report },
            Err(e) => {
                error!("[{correlation_id}] Sync failed for {}: {e}", user.username);
                SyncStatus::Failed {
                    message: e.to_string(),
                }
            }
        };

        Ok(LoginOutcome {
            correlation_id,
            username: user.username,
            member_no: profile.member_no,
            sync,
        })
    }

    /// Roles and their raw payload, both absent when disabled, unavailable or unreadable.
    async fn fetch_roles(&self, token: &str, correlation_id: &str) -> FetchedRoles {
        if !self.settings.fetch_roles {
            return FetchedRoles::default();
        }

        let payload = match self.registry.fetch_roles(token).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return FetchedRoles::default(),
            Err(e) => {
                warn!("[{correlation_id}] Roles fetch failed, continuing without roles: {e}");
                return FetchedRoles::missing();
            }
        };

        match Roles::parse(&payload) {
            Ok(roles) => FetchedRoles {
                roles: Some(roles),
                payload: Some(payload),
                missing: false,
            },
            Err(e) => {
                warn!("[{correlation_id}] Ignoring unreadable roles: {e}");
                FetchedRoles::missing()
            }
        }
    }

    async fn fetch_image(&self, token: &str, correlation_id: &str) -> Option<Vec<u8>> {
        if !self.settings.fetch_image {
            return None;
        }

        match self.registry.fetch_image(token).await {
            Ok(Some(image)) if image.len() > self.settings.max_image_bytes => {
                warn!(
                    "[{correlation_id}] Dropping profile image of {} bytes (limit {})",
                    image.len(),
                    self.settings.max_image_bytes
                );
                None
            }
            Ok(image) => image,
            Err(e) => {
                warn!("[{correlation_id}] Image fetch failed, continuing without image: {e}");
                None
            }
        }
    }

    async fn find_or_create_user(&self, member_no: i64) -> Result<StoredUser, LoginError> {
        let store = self.store.as_ref();
        let username = self.settings.username_for(member_no);
        let username = username.as_str();

        let user = retry_on_conflict(self.settings.conflict_retries, "create user", move || async move {
            if let Some(user) = store.find_user_by_username(username).await? {
                return Ok::<_, StoreError>(user);
            }
            info!("Creating local user {username}");
            store.create_user(username).await
        })
        .await?;

        Ok(user)
    }
}

fn new_correlation_id() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(CORRELATION_ID_LENGTH)
        .collect()
}

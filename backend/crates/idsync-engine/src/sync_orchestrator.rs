use crate::attribute_names::{
    DATE_OF_BIRTH, FIRST_LAST, LOCAL_EMAIL, MEMBER_NO, PICTURE, PRIMARY_GROUP_NAME,
    PRIMARY_GROUP_NO, PROFILE_HASH, REGISTRY_EMAIL, ROLES,
};
use crate::{EmailAllocator, GroupReconciler, ReconcileReport, Result, SyncSettings, sync_targets};

use idsync_core::{FingerprintInput, Profile, Roles, TrackedAttribute, fingerprint, flatten_roles};
use idsync_store::{IdentityStore, StoredUser, UserBasics};

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info, warn};
use uuid::Uuid;

const PICTURE_PREFIX: &str = "data:image/jpeg;base64,";

/// Everything fetched from the registry for one login.
#[derive(Debug, Clone, Copy)]
pub struct SyncInput<'a> {
    pub profile: &'a Profile,
    pub profile_payload: &'a str,
    pub roles: Option<&'a Roles>,
    pub roles_payload: Option<&'a str>,
    /// Roles were requested but the registry gave nothing usable.
    pub roles_missing: bool,
    pub image: Option<&'a [u8]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Stored fingerprint matched; nothing was written.
    Unchanged { fingerprint: String },
    Updated {
        fingerprint: String,
        report: ReconcileReport,
    },
}

/// Fingerprint-gated sync of one local user from registry data.
pub struct SyncOrchestrator {
    store: Arc<dyn IdentityStore>,
    reconciler: GroupReconciler,
    allocator: EmailAllocator,
    settings: SyncSettings,
}

impl SyncOrchestrator {
    pub fn new(store: Arc<dyn IdentityStore>, settings: SyncSettings) -> Self {
        let reconciler = GroupReconciler::new(
            Arc::clone(&store),
            settings.parent_group.clone(),
            settings.tracked_group_attributes.clone(),
            settings.conflict_retries,
        );
        let allocator = EmailAllocator::new(Arc::clone(&store), settings.max_alias_attempts);

        Self {
            store,
            reconciler,
            allocator,
            settings,
        }
    }

    /// Run one pass. The fingerprint is stored only after every other write succeeded.
    pub async fn sync(
        &self,
        user: &StoredUser,
        input: &SyncInput<'_>,
        correlation_id: &str,
    ) -> Result<SyncOutcome> {
        let stored = self.store.get_user_attribute(user.id, PROFILE_HASH).await?;
        let current = self.compute_fingerprint(user.id, input).await?;

        if stored.first() == Some(&current) {
            info!(
                "[{correlation_id}] Profile unchanged for {}, skipping sync",
                user.username
            );
            return Ok(SyncOutcome::Unchanged {
                fingerprint: current,
            });
        }

        info!("[{correlation_id}] Profile changed for {}, syncing", user.username);

        let report = match sync_targets(input.profile, input.roles) {
            Some(targets) if input.roles_missing => {
                warn!("[{correlation_id}] Roles missing, keeping existing group memberships");
                self.reconciler
                    .reconcile_keeping_existing(user.id, &targets, correlation_id)
                    .await?
            }
            Some(targets) => {
                self.reconciler
                    .reconcile(user.id, &targets, correlation_id)
                    .await?
            }
            None => {
                warn!("[{correlation_id}] No roles or memberships available, skipping group sync");
                ReconcileReport::default()
            }
        };

        self.write_attributes(user.id, input).await?;

        let token = input.profile.first_last();
        self.allocator
            .sync_group_emails(user.id, token.as_deref(), correlation_id)
            .await?;

        // Recomputed over the group state this pass produced, so the next
        // unchanged login matches.
        let fingerprint = self.compute_fingerprint(user.id, input).await?;
        self.store
            .set_user_attribute(user.id, PROFILE_HASH, std::slice::from_ref(&fingerprint))
            .await?;

        debug!("[{correlation_id}] Sync report: {report:?}");
        Ok(SyncOutcome::Updated {
            fingerprint,
            report,
        })
    }

    pub async fn compute_fingerprint(&self, user_id: Uuid, input: &SyncInput<'_>) -> Result<String> {
        let tracked = self.tracked_attributes(user_id).await?;

        Ok(fingerprint(&FingerprintInput {
            format_version: &self.settings.format_version,
            profile_payload: input.profile_payload,
            roles_payload: input.roles_payload,
            image: input.image,
            tracked_attributes: &tracked,
        }))
    }

    /// Tracked attribute values of every group the user belongs to.
    async fn tracked_attributes(&self, user_id: Uuid) -> Result<Vec<TrackedAttribute>> {
        let mut tracked = Vec::new();

        for group in self.store.list_user_groups(user_id).await? {
            for attribute in &self.settings.tracked_group_attributes {
                let value = self
                    .store
                    .get_group_attribute(group.id, attribute)
                    .await?
                    .into_iter()
                    .next()
                    .unwrap_or_default();
                tracked.push(TrackedAttribute::new(&group.name, attribute, value));
            }
        }

        Ok(tracked)
    }

    async fn write_attributes(&self, user_id: Uuid, input: &SyncInput<'_>) -> Result<()> {
        let profile = input.profile;

        self.store
            .update_user_basics(
                user_id,
                &UserBasics {
                    first_name: profile.first_name.clone(),
                    last_name: profile.last_name.clone(),
                    email: profile.email.clone(),
                },
            )
            .await?;

        self.set_single(user_id, MEMBER_NO, profile.member_no.to_string())
            .await?;
        if let Some(dob) = profile.dob.as_deref() {
            self.set_single(user_id, DATE_OF_BIRTH, dob).await?;
        }
        self.set_single(
            user_id,
            LOCAL_EMAIL,
            profile.local_email(&self.settings.local_email_domain),
        )
        .await?;

        if let Some(first_last) = profile.first_last() {
            self.set_single(user_id, FIRST_LAST, first_last).await?;
        }

        if let Some(email) = profile
            .contact_value(&self.settings.contact_email_key)
            .map(str::trim)
            .filter(|email| !email.is_empty())
        {
            self.set_single(user_id, REGISTRY_EMAIL, email).await?;
        }

        if let Some(image) = input.image {
            let picture = format!("{PICTURE_PREFIX}{}", STANDARD.encode(image));
            self.set_single(user_id, PICTURE, picture).await?;
        }

        if let Some(roles) = input.roles {
            self.store
                .set_user_attribute(user_id, ROLES, &flatten_roles(roles))
                .await?;
        }

        if let Some((membership_key, membership)) = profile.primary_membership()
            && let Some(group) = membership.group.as_ref()
        {
            if let Some(name) = group.name.as_deref() {
                self.set_single(user_id, PRIMARY_GROUP_NAME, name).await?;
            }
            self.set_single(user_id, PRIMARY_GROUP_NO, membership_key.as_str())
                .await?;
        }

        Ok(())
    }

    async fn set_single(&self, user_id: Uuid, name: &str, value: impl Into<String>) -> Result<()> {
        self.store
            .set_user_attribute(user_id, name, &[value.into()])
            .await?;
        Ok(())
    }
}

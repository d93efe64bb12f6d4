use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

// Sync constraints
pub const MIN_MAX_ALIAS_ATTEMPTS: u32 = 1;
pub const MAX_MAX_ALIAS_ATTEMPTS: u32 = 10_000;
pub const DEFAULT_MAX_ALIAS_ATTEMPTS: u32 = 1_000;

pub const MIN_CONFLICT_RETRIES: u32 = 1;
pub const MAX_CONFLICT_RETRIES: u32 = 10;
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

pub const DEFAULT_PARENT_GROUP: &str = "registry";
pub const DEFAULT_USERNAME_PREFIX: &str = "registry";
pub const DEFAULT_LOCAL_EMAIL_DOMAIN: &str = "registry.local";
pub const DEFAULT_CONTACT_EMAIL_KEY: &str = "registry-email";
pub const DEFAULT_TRACKED_GROUP_ATTRIBUTE: &str = "domain";

/// Reconciliation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root group every synced subgroup lives under
    pub parent_group: String,
    /// Local usernames are `<prefix>|<member_no>`
    pub username_prefix: String,
    pub local_email_domain: String,
    /// Contact-info key holding the registry-issued address
    pub contact_email_key: String,
    /// Group attributes folded into the profile fingerprint
    pub tracked_group_attributes: Vec<String>,
    /// Overrides the built-in fingerprint format version
    pub format_version: Option<String>,
    pub max_alias_attempts: u32,
    pub conflict_retries: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            parent_group: String::from(DEFAULT_PARENT_GROUP),
            username_prefix: String::from(DEFAULT_USERNAME_PREFIX),
            local_email_domain: String::from(DEFAULT_LOCAL_EMAIL_DOMAIN),
            contact_email_key: String::from(DEFAULT_CONTACT_EMAIL_KEY),
            tracked_group_attributes: vec![String::from(DEFAULT_TRACKED_GROUP_ATTRIBUTE)],
            format_version: None,
            max_alias_attempts: DEFAULT_MAX_ALIAS_ATTEMPTS,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        Self::require_non_blank("sync.parent_group", &self.parent_group)?;
        Self::require_non_blank("sync.username_prefix", &self.username_prefix)?;
        Self::require_non_blank("sync.local_email_domain", &self.local_email_domain)?;
        Self::require_non_blank("sync.contact_email_key", &self.contact_email_key)?;

        if self.username_prefix.contains('|') {
            return Err(ConfigError::sync("sync.username_prefix cannot contain '|'"));
        }

        if self
            .tracked_group_attributes
            .iter()
            .any(|name| name.trim().is_empty())
        {
            return Err(ConfigError::sync(
                "sync.tracked_group_attributes cannot contain blank names",
            ));
        }

        if let Some(version) = &self.format_version {
            Self::require_non_blank("sync.format_version", version)?;
        }

        if self.max_alias_attempts < MIN_MAX_ALIAS_ATTEMPTS
            || self.max_alias_attempts > MAX_MAX_ALIAS_ATTEMPTS
        {
            return Err(ConfigError::sync(format!(
                "sync.max_alias_attempts must be {}-{}, got {}",
                MIN_MAX_ALIAS_ATTEMPTS, MAX_MAX_ALIAS_ATTEMPTS, self.max_alias_attempts
            )));
        }

        if self.conflict_retries < MIN_CONFLICT_RETRIES
            || self.conflict_retries > MAX_CONFLICT_RETRIES
        {
            return Err(ConfigError::sync(format!(
                "sync.conflict_retries must be {}-{}, got {}",
                MIN_CONFLICT_RETRIES, MAX_CONFLICT_RETRIES, self.conflict_retries
            )));
        }

        Ok(())
    }

    #[track_caller]
    fn require_non_blank(field: &str, value: &str) -> ConfigErrorResult<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::sync(format!("{field} cannot be empty")));
        }
        Ok(())
    }
}

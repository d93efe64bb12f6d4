use idsync_config::Config;

/// Fingerprint format version used when the config does not override it.
pub const DEFAULT_FORMAT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine settings resolved from [`Config`].
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub parent_group: String,
    pub username_prefix: String,
    pub local_email_domain: String,
    pub contact_email_key: String,
    pub tracked_group_attributes: Vec<String>,
    pub format_version: String,
    pub max_alias_attempts: u32,
    pub conflict_retries: u32,
    pub fetch_roles: bool,
    pub fetch_image: bool,
    pub max_image_bytes: usize,
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        let sync = &config.sync;
        Self {
            parent_group: sync.parent_group.trim().to_string(),
            username_prefix: sync.username_prefix.trim().to_string(),
            local_email_domain: sync.local_email_domain.trim().to_string(),
            contact_email_key: sync.contact_email_key.clone(),
            tracked_group_attributes: sync.tracked_group_attributes.clone(),
            format_version: sync
                .format_version
                .clone()
                .unwrap_or_else(|| DEFAULT_FORMAT_VERSION.to_string()),
            max_alias_attempts: sync.max_alias_attempts,
            conflict_retries: sync.conflict_retries,
            fetch_roles: config.registry.fetch_roles,
            fetch_image: config.registry.fetch_image,
            max_image_bytes: config.registry.max_image_bytes,
        }
    }

    /// Local username for a registry member.
    pub fn username_for(&self, member_no: i64) -> String {
        format!("{}|{}", self.username_prefix, member_no)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

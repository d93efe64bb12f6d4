use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

// Registry constraints
pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const MIN_MAX_IMAGE_BYTES: usize = 1024;
pub const MAX_MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 256 * 1024;

pub const DEFAULT_BASE_URL: &str = "https://registry.example.org";
pub const DEFAULT_FETCH_ROLES: bool = true;
pub const DEFAULT_FETCH_IMAGE: bool = false;

/// Connection settings for the upstream member registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub base_url: String,
    /// Per-request timeout covering connect and read
    pub timeout_secs: u64,
    pub fetch_roles: bool,
    pub fetch_image: bool,
    /// Larger images are dropped instead of stored
    pub max_image_bytes: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            fetch_roles: DEFAULT_FETCH_ROLES,
            fetch_image: DEFAULT_FETCH_IMAGE,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::registry(format!(
                "registry.base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }

        if self.timeout_secs < MIN_TIMEOUT_SECS || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::registry(format!(
                "registry.timeout_secs must be {}-{}, got {}",
                MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS, self.timeout_secs
            )));
        }

        if self.max_image_bytes < MIN_MAX_IMAGE_BYTES || self.max_image_bytes > MAX_MAX_IMAGE_BYTES
        {
            return Err(ConfigError::registry(format!(
                "registry.max_image_bytes must be {}-{}, got {}",
                MIN_MAX_IMAGE_BYTES, MAX_MAX_IMAGE_BYTES, self.max_image_bytes
            )));
        }

        Ok(())
    }
}

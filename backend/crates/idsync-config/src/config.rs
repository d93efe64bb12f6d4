use crate::{
    CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult, DEFAULT_CONFIG_DIRECTORY,
    DatabaseConfig, LoggingConfig, RegistryConfig, SyncConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub sync: SyncConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    /// Directory the config was loaded from
    #[serde(skip)]
    pub config_dir: PathBuf,
}

impl Config {
    /// Load config from the default config directory.
    ///
    /// Loading order:
    /// 1. Check for IDSYNC_CONFIG_DIR env var, else use ./.idsync/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply IDSYNC_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;
        Self::load_from(&config_dir)
    }

    /// Same as `load()` with an explicit config directory.
    pub fn load_from(config_dir: &Path) -> ConfigErrorResult<Self> {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.to_path_buf(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.config_dir = config_dir.to_path_buf();
        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: IDSYNC_CONFIG_DIR env var > ./.idsync/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIRECTORY))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.registry.validate()?;
        self.sync.validate()?;
        self.database.validate()?;

        if let Some(file) = &self.logging.file
            && file.trim().is_empty()
        {
            return Err(ConfigError::logging("logging.file cannot be empty when set"));
        }

        Ok(())
    }

    /// Get absolute path to database file.
    pub fn database_path(&self) -> PathBuf {
        self.config_dir.join(&self.database.path)
    }

    /// Log file inside the log directory, `None` for console logging.
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.logging
            .file
            .as_ref()
            .map(|file| self.config_dir.join(&self.logging.dir).join(file))
    }

    /// Log configuration summary.
    pub fn log_summary(&self) {
        info!("Configuration loaded from {}:", self.config_dir.display());
        info!(
            "  registry: {} (timeout {}s, roles: {}, image: {} <= {} bytes)",
            self.registry.base_url,
            self.registry.timeout_secs,
            self.registry.fetch_roles,
            self.registry.fetch_image,
            self.registry.max_image_bytes
        );
        info!(
            "  sync: parent='{}', prefix='{}', local_domain='{}'",
            self.sync.parent_group, self.sync.username_prefix, self.sync.local_email_domain
        );
        info!(
            "  sync: tracked={:?}, alias_attempts={}, conflict_retries={}",
            self.sync.tracked_group_attributes,
            self.sync.max_alias_attempts,
            self.sync.conflict_retries
        );
        if let Some(version) = &self.sync.format_version {
            info!("  sync: format_version override '{version}'");
        }
        info!("  database: {}", self.database.path);
        info!(
            "  logging: {} (colored: {}, file: {})",
            *self.logging.level,
            self.logging.colored,
            self.logging.file.as_deref().unwrap_or("none")
        );
    }

    fn apply_env_overrides(&mut self) {
        // Registry
        Self::apply_env_string("IDSYNC_REGISTRY_BASE_URL", &mut self.registry.base_url);
        Self::apply_env_parse(
            "IDSYNC_REGISTRY_TIMEOUT_SECS",
            &mut self.registry.timeout_secs,
        );
        Self::apply_env_bool("IDSYNC_REGISTRY_FETCH_ROLES", &mut self.registry.fetch_roles);
        Self::apply_env_bool("IDSYNC_REGISTRY_FETCH_IMAGE", &mut self.registry.fetch_image);
        Self::apply_env_parse(
            "IDSYNC_REGISTRY_MAX_IMAGE_BYTES",
            &mut self.registry.max_image_bytes,
        );

        // Sync
        Self::apply_env_string("IDSYNC_SYNC_PARENT_GROUP", &mut self.sync.parent_group);
        Self::apply_env_string("IDSYNC_SYNC_USERNAME_PREFIX", &mut self.sync.username_prefix);
        Self::apply_env_string(
            "IDSYNC_SYNC_LOCAL_EMAIL_DOMAIN",
            &mut self.sync.local_email_domain,
        );
        Self::apply_env_string(
            "IDSYNC_SYNC_CONTACT_EMAIL_KEY",
            &mut self.sync.contact_email_key,
        );
        Self::apply_env_list(
            "IDSYNC_SYNC_TRACKED_GROUP_ATTRIBUTES",
            &mut self.sync.tracked_group_attributes,
        );
        Self::apply_env_option_string(
            "IDSYNC_SYNC_FORMAT_VERSION",
            &mut self.sync.format_version,
        );
        Self::apply_env_parse(
            "IDSYNC_SYNC_MAX_ALIAS_ATTEMPTS",
            &mut self.sync.max_alias_attempts,
        );
        Self::apply_env_parse(
            "IDSYNC_SYNC_CONFLICT_RETRIES",
            &mut self.sync.conflict_retries,
        );

        // Database
        Self::apply_env_string("IDSYNC_DATABASE_PATH", &mut self.database.path);

        // Logging
        Self::apply_env_parse("IDSYNC_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("IDSYNC_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("IDSYNC_LOG_FILE", &mut self.logging.file);
        Self::apply_env_string("IDSYNC_LOG_DIR", &mut self.logging.dir);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }

    /// Helper: Comma-separated list, blank entries dropped
    fn apply_env_list(var_name: &str, target: &mut Vec<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect();
        }
    }
}

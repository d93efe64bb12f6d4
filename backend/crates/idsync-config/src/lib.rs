mod config;
mod database_config;
mod error;
mod log_level;
mod logging_config;
mod registry_config;
mod sync_config;

pub use config::Config;
pub use database_config::DatabaseConfig;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use registry_config::RegistryConfig;
pub use sync_config::SyncConfig;

pub const CONFIG_DIR_ENV: &str = "IDSYNC_CONFIG_DIR";
const DEFAULT_CONFIG_DIRECTORY: &str = ".idsync";
const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_DATABASE_FILENAME: &str = "identity.db";
const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "log";
const DEFAULT_LOG_COLORED: bool = true;

#[cfg(test)]
mod tests;

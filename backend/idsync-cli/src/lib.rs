//! idsync - member registry identity synchronization CLI
//!
//! # Examples
//!
//! ```bash
//! # Log in and sync the local user
//! IDSYNC_PASSWORD=secret idsync login --identifier 199001011234 --pretty
//!
//! # Inspect derived values
//! idsync normalize-name "Anna" "Öberg"
//! idsync flatten-roles roles.json
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod logger;

#[cfg(test)]
mod tests;

pub use cli::Cli;
pub use commands::Commands;
pub use error::{CliError, Result};

use idsync_config::Config;
use idsync_core::SystemClock;

use serde_json::Value;

/// Execute one command and return its JSON output.
pub async fn run(cli: Cli) -> Result<Value> {
    match cli.command {
        Commands::Login {
            identifier,
            password,
        } => {
            let config = match cli.config_dir {
                Some(ref dir) => Config::load_from(dir)?,
                None => Config::load()?,
            };
            config.validate()?;

            logger::initialize(config.logging.level, config.log_file_path(), config.logging.colored)?;
            log::info!("Starting idsync v{}", env!("CARGO_PKG_VERSION"));
            config.log_summary();

            handlers::login(&config, &identifier, &password).await
        }
        Commands::NormalizeName { first, last } => Ok(handlers::normalize_name(&first, &last)),
        Commands::NormalizeId { identifier } => Ok(handlers::normalize_id(&identifier, &SystemClock)),
        Commands::FlattenRoles { file } => handlers::flatten_roles_file(&file),
    }
}

use crate::{CliError, Result};

use idsync_config::Config;
use idsync_core::{
    Clock, Roles, SystemClock, first_last, flatten_roles, normalize_login_identifier,
};
use idsync_engine::{LoginService, SyncSettings};
use idsync_registry::RegistryClient;
use idsync_store::SqliteStore;

use std::path::Path;
use std::sync::Arc;

use log::info;
use serde_json::{Value, json};

pub fn normalize_name(first: &str, last: &str) -> Value {
    json!({ "firstlast": first_last(Some(first), Some(last)) })
}

pub fn normalize_id(identifier: &str, clock: &dyn Clock) -> Value {
    json!({
        "identifier": identifier,
        "normalized": normalize_login_identifier(identifier, clock.today()),
    })
}

pub fn flatten_roles_file(path: &Path) -> Result<Value> {
    let payload = std::fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
    let roles = Roles::parse(&payload).map_err(|e| CliError::payload(path, e))?;
    Ok(json!(flatten_roles(&roles)))
}

/// Full login against the configured registry and SQLite store.
pub async fn login(config: &Config, identifier: &str, password: &str) -> Result<Value> {
    let database_path = config.database_path();
    info!("Opening identity store: {}", database_path.display());
    let store = SqliteStore::connect(&database_path).await?;

    let registry = RegistryClient::from_config(&config.registry)?;
    info!("Registry: {}", registry.base_url);

    let service = LoginService::new(
        Arc::new(registry),
        Arc::new(store),
        Arc::new(SystemClock),
        SyncSettings::from_config(config),
    );

    let outcome = service.login(identifier, password).await?;
    Ok(serde_json::to_value(outcome)?)
}

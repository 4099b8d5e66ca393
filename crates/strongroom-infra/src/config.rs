//! Store configuration loader for Strongroom.
//!
//! Reads `strongroom.toml` from the data directory (`~/.strongroom/` in
//! production) and deserializes it into [`StoreConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use strongroom_types::config::{SchemaAction, StoreConfig};
use strongroom_types::database::DatabaseKind;

pub const CONFIG_FILE: &str = "strongroom.toml";
/// SQLite file used when no connection string is configured.
pub const DEFAULT_DATABASE_FILE: &str = "strongroom.db";

pub const DATA_DIR_ENV: &str = "STRONGROOM_DATA_DIR";
pub const DATABASE_URL_ENV: &str = "STRONGROOM_DATABASE_URL";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `STRONGROOM_DATA_DIR` environment variable
/// 2. `~/.strongroom`
/// 3. `.strongroom` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".strongroom");
    }

    PathBuf::from(".strongroom")
}

/// Load store configuration from `{data_dir}/strongroom.toml`.
///
/// - If the file does not exist, returns [`StoreConfig::default()`].
/// - If the file exists but cannot be read or parsed, logs a warning and
///   returns the default.
pub async fn load_store_config(data_dir: &Path) -> StoreConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No {CONFIG_FILE} found at {}, using defaults", config_path.display());
            return StoreConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return StoreConfig::default();
        }
    };

    match toml::from_str::<StoreConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            StoreConfig::default()
        }
    }
}

/// Apply environment overrides; `lookup` is `std::env::var` in production.
pub fn apply_env_overrides(
    mut config: StoreConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> StoreConfig {
    if let Some(url) = lookup(DATABASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
        config.connection_string = Some(url);
    }
    config
}

/// Connection settings a provider is created from.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedStore {
    pub connection_string: String,
    pub database_kind: DatabaseKind,
    pub schema_action: SchemaAction,
}

// Connection strings may carry credentials.
impl std::fmt::Debug for ResolvedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedStore")
            .field("database_kind", &self.database_kind)
            .field("schema_action", &self.schema_action)
            .finish_non_exhaustive()
    }
}

/// Resolve the store to connect to.
///
/// Without a configured connection string this is the SQLite file
/// `strongroom.db` in `data_dir`, whose tables are created on first use.
pub fn resolve_store(config: &StoreConfig, data_dir: &Path) -> ResolvedStore {
    match config
        .connection_string
        .as_deref()
        .filter(|url| !url.trim().is_empty())
    {
        Some(url) => ResolvedStore {
            connection_string: url.to_string(),
            database_kind: config.database_kind,
            schema_action: config.schema_action,
        },
        None => ResolvedStore {
            connection_string: format!(
                "sqlite://{}?mode=rwc",
                data_dir.join(DEFAULT_DATABASE_FILE).display()
            ),
            database_kind: DatabaseKind::Sqlite,
            schema_action: SchemaAction::Create,
        },
    }
}

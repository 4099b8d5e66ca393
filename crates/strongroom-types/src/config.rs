//! Store configuration types for Strongroom.
//!
//! `StoreConfig` represents the `strongroom.toml` file that selects the
//! database, the schema action and the key derivation cost.

use serde::{Deserialize, Serialize};

use crate::database::DatabaseKind;

/// What a session factory does with mapped tables before the first session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaAction {
    /// Tables are managed outside Strongroom.
    #[default]
    None,
    /// Create missing tables (never alters existing ones).
    Create,
}

/// Argon2id parameters used to derive encryption keys from passphrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfConfig {
    /// Memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

// OWASP recommended Argon2id parameters.
fn default_memory_kib() -> u32 {
    19_456
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

/// Top-level configuration for a Strongroom store.
///
/// Loaded from `~/.strongroom/strongroom.toml`. All fields have defaults; a
/// missing connection string means the SQLite file in the data directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub connection_string: Option<String>,

    #[serde(default)]
    pub database_kind: DatabaseKind,

    #[serde(default)]
    pub schema_action: SchemaAction,

    #[serde(default)]
    pub kdf: KdfConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_default_values() {
        let config = StoreConfig::default();
        assert!(config.connection_string.is_none());
        assert_eq!(config.database_kind, DatabaseKind::Postgres);
        assert_eq!(config.schema_action, SchemaAction::None);
        assert_eq!(config.kdf.memory_kib, 19_456);
        assert_eq!(config.kdf.iterations, 2);
        assert_eq!(config.kdf.parallelism, 1);
    }

    #[test]
    fn test_store_config_from_toml() {
        let config: StoreConfig = toml::from_str(
            r#"
connection_string = "mysql://vault@localhost/vault"
database_kind = "mysql"
schema_action = "create"

[kdf]
memory_kib = 65536
"#,
        )
        .unwrap();

        assert_eq!(
            config.connection_string.as_deref(),
            Some("mysql://vault@localhost/vault")
        );
        assert_eq!(config.database_kind, DatabaseKind::MySql);
        assert_eq!(config.schema_action, SchemaAction::Create);
        assert_eq!(config.kdf.memory_kib, 65_536);
        assert_eq!(config.kdf.iterations, 2);
    }

    #[test]
    fn test_store_config_empty_toml_uses_defaults() {
        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
    }
}

//! Application state wiring the store, the provider and the repositories.
//!
//! `Settings` is everything that can be resolved without the passphrase;
//! `AppState` adds the provider and the encrypted credential repository.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use dialoguer::Password;
use secrecy::{ExposeSecret, SecretString};

use strongroom_infra::config::{
    CONFIG_FILE, ResolvedStore, apply_env_overrides, load_store_config, resolve_data_dir,
    resolve_store,
};
use strongroom_infra::session::SessionFactoryProvider;
use strongroom_infra::sql::credential::{CredentialRepository, credential_repository};
use strongroom_types::config::StoreConfig;

/// Resolved configuration of this invocation.
pub struct Settings {
    pub data_dir: PathBuf,
    pub config: StoreConfig,
    pub store: ResolvedStore,
}

impl Settings {
    /// Resolve the data directory, read `strongroom.toml` and apply
    /// environment overrides.
    pub async fn load() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = apply_env_overrides(load_store_config(&data_dir).await, |key| {
            std::env::var(key).ok()
        });
        let store = resolve_store(&config, &data_dir);

        Ok(Self {
            data_dir,
            config,
            store,
        })
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }
}

/// Shared application state for credential commands.
pub struct AppState {
    pub provider: Arc<SessionFactoryProvider>,
    pub credentials: CredentialRepository,
}

impl AppState {
    /// Create the provider and the credential repository. Prompts for the
    /// passphrase when none was given.
    pub async fn init(settings: &Settings, passphrase: Option<String>) -> anyhow::Result<Self> {
        let passphrase = match passphrase {
            Some(passphrase) => SecretString::from(passphrase),
            None => SecretString::from(
                Password::new()
                    .with_prompt("Vault passphrase")
                    .interact()?,
            ),
        };

        let provider = Arc::new(
            SessionFactoryProvider::new(
                settings.store.connection_string.clone(),
                settings.store.database_kind,
            )?
            .with_schema_action(settings.store.schema_action),
        );

        let credentials = credential_repository(
            Arc::clone(&provider),
            passphrase.expose_secret(),
            settings.config.kdf,
        )?;

        tracing::debug!(
            kind = %settings.store.database_kind,
            schema_action = ?settings.store.schema_action,
            "store opened"
        );

        Ok(Self {
            provider,
            credentials,
        })
    }

    /// Close pooled connections before exit.
    pub async fn shutdown(self) {
        self.provider.close().await;
    }
}

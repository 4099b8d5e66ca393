//! Session factory provider.
//!
//! The provider owns the store connection descriptor and the set of model
//! sources registered by repositories. It moves through
//! `Uninitialized -> Configured -> Built`, rebuilding its configuration and
//! factory whenever a new source arrives, and ends in `Disposed`.
//!
//! One provider is shared by every repository of a store. Repositories take a
//! lease when constructed and return it when disposed; returning the last
//! lease disposes the provider.
//!
//! Register every model source before concurrent CRUD traffic starts. A
//! registration swaps the factory, and sessions already open keep the old one.
//! Sessions do not coordinate with each other; concurrent writes to the same
//! row are settled by the store's isolation level.
//! Building a factory needs a Tokio runtime; outside one, registration fails
//! with a store error and the provider stays `Configured`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use strongroom_types::config::SchemaAction;
use strongroom_types::database::DatabaseKind;
use strongroom_types::error::PersistenceError;
use strongroom_types::source::ModelSource;

use super::configuration::Configuration;
use super::factory::SessionFactory;
use crate::sql::Dialect;

/// Observable lifecycle state of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    /// No model source registered yet.
    Uninitialized,
    /// Sources registered, no factory for the current configuration.
    Configured,
    /// A factory exists for the current configuration.
    Built,
    /// Terminal.
    Disposed,
}

enum ProviderState {
    Uninitialized,
    Configured(Configuration),
    Built {
        configuration: Configuration,
        factory: Arc<SessionFactory>,
    },
    Disposed,
}

pub struct SessionFactoryProvider {
    connection_string: String,
    database_kind: DatabaseKind,
    dialect: Dialect,
    schema_action: SchemaAction,
    state: RwLock<ProviderState>,
    leases: AtomicUsize,
}

impl SessionFactoryProvider {
    /// Create a provider for one store. Does not contact the store.
    pub fn new(
        connection_string: impl Into<String>,
        database_kind: DatabaseKind,
    ) -> Result<Self, PersistenceError> {
        let connection_string: String = connection_string.into();
        if connection_string.trim().is_empty() {
            return Err(PersistenceError::invalid_argument("connection string"));
        }

        Ok(Self {
            connection_string,
            database_kind,
            dialect: Dialect::for_kind(database_kind),
            schema_action: SchemaAction::None,
            state: RwLock::new(ProviderState::Uninitialized),
            leases: AtomicUsize::new(0),
        })
    }

    /// Choose what factories do with mapped tables before the first session.
    pub fn with_schema_action(mut self, schema_action: SchemaAction) -> Self {
        self.schema_action = schema_action;
        self
    }

    pub fn database_kind(&self) -> DatabaseKind {
        self.database_kind
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn schema_action(&self) -> SchemaAction {
        self.schema_action
    }

    /// Register the mapping metadata of `source`.
    ///
    /// Registering a source equal to one already known changes nothing.
    /// Otherwise the configuration is rebuilt with the new source and a new
    /// factory is built from it. Sessions already opened from the previous
    /// factory are unaffected.
    pub fn register_source(&self, source: ModelSource) -> Result<(), PersistenceError> {
        if !source.has_identity() {
            return Err(PersistenceError::invalid_argument("model source name"));
        }

        let mut state = self.write_state();
        let mut sources = match &*state {
            ProviderState::Disposed => return Err(PersistenceError::Disposed),
            ProviderState::Uninitialized => Vec::new(),
            ProviderState::Configured(configuration)
            | ProviderState::Built { configuration, .. } => configuration.sources().to_vec(),
        };

        if sources.contains(&source) {
            tracing::debug!(source = %source, "model source already registered");
            return Ok(());
        }

        tracing::debug!(source = %source, "registering model source");
        sources.push(source);
        let configuration = Configuration::new(
            self.connection_string.clone(),
            self.dialect,
            self.schema_action,
            sources,
        );

        match SessionFactory::build(&configuration) {
            Ok(factory) => {
                tracing::info!(
                    dialect = %self.dialect,
                    sources = configuration.sources().len(),
                    "session factory built"
                );
                *state = ProviderState::Built {
                    configuration,
                    factory: Arc::new(factory),
                };
                Ok(())
            }
            Err(err) => {
                *state = ProviderState::Configured(configuration);
                Err(err)
            }
        }
    }

    /// The factory for the current configuration, built on first request.
    pub fn session_factory(&self) -> Result<Arc<SessionFactory>, PersistenceError> {
        {
            let state = self.read_state();
            match &*state {
                ProviderState::Built { factory, .. } => return Ok(Arc::clone(factory)),
                ProviderState::Disposed => return Err(PersistenceError::Disposed),
                ProviderState::Uninitialized => return Err(not_configured()),
                ProviderState::Configured(_) => {}
            }
        }

        // Another caller may have built the factory between the two locks.
        let mut state = self.write_state();
        match &*state {
            ProviderState::Built { factory, .. } => Ok(Arc::clone(factory)),
            ProviderState::Disposed => Err(PersistenceError::Disposed),
            ProviderState::Uninitialized => Err(not_configured()),
            ProviderState::Configured(configuration) => {
                let configuration = configuration.clone();
                let factory = Arc::new(SessionFactory::build(&configuration)?);
                tracing::info!(
                    dialect = %self.dialect,
                    sources = configuration.sources().len(),
                    "session factory built"
                );
                *state = ProviderState::Built {
                    configuration,
                    factory: Arc::clone(&factory),
                };
                Ok(factory)
            }
        }
    }

    /// Sources registered so far, in registration order.
    pub fn registered_sources(&self) -> Vec<ModelSource> {
        match &*self.read_state() {
            ProviderState::Configured(configuration)
            | ProviderState::Built { configuration, .. } => configuration.sources().to_vec(),
            ProviderState::Uninitialized | ProviderState::Disposed => Vec::new(),
        }
    }

    pub fn state(&self) -> ProviderStatus {
        match &*self.read_state() {
            ProviderState::Uninitialized => ProviderStatus::Uninitialized,
            ProviderState::Configured(_) => ProviderStatus::Configured,
            ProviderState::Built { .. } => ProviderStatus::Built,
            ProviderState::Disposed => ProviderStatus::Disposed,
        }
    }

    /// Drop the current factory and refuse further use. Never fails.
    pub fn dispose(&self) {
        let previous = std::mem::replace(&mut *self.write_state(), ProviderState::Disposed);
        if !matches!(previous, ProviderState::Disposed) {
            tracing::info!("session factory provider disposed");
        }
    }

    /// Dispose, then wait for the current factory's connections to close.
    pub async fn close(&self) {
        let previous = std::mem::replace(&mut *self.write_state(), ProviderState::Disposed);
        match previous {
            ProviderState::Built { factory, .. } => {
                factory.close().await;
                tracing::info!("session factory provider closed");
            }
            ProviderState::Disposed => {}
            ProviderState::Uninitialized | ProviderState::Configured(_) => {
                tracing::info!("session factory provider disposed");
            }
        }
    }

    pub fn lease_count(&self) -> usize {
        self.leases.load(Ordering::Acquire)
    }

    pub(crate) fn acquire_lease(&self) {
        self.leases.fetch_add(1, Ordering::AcqRel);
    }

    /// Return a lease; the last one disposes the provider.
    pub(crate) fn release_lease(&self) {
        let released = self
            .leases
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if released == Ok(1) {
            tracing::debug!("last repository lease returned");
            self.dispose();
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ProviderState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ProviderState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionFactoryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFactoryProvider")
            .field("database_kind", &self.database_kind)
            .field("schema_action", &self.schema_action)
            .field("state", &self.state())
            .field("leases", &self.lease_count())
            .finish_non_exhaustive()
    }
}

fn not_configured() -> PersistenceError {
    PersistenceError::NotConfigured("no model sources have been registered".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongroom_types::source::{ColumnDef, TableDef};

    fn sqlite_provider(dir: &tempfile::TempDir) -> SessionFactoryProvider {
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("provider.db").display());
        SessionFactoryProvider::new(url, DatabaseKind::Sqlite)
            .unwrap()
            .with_schema_action(SchemaAction::Create)
    }

    fn source(name: &str) -> ModelSource {
        ModelSource::new(name).with_table(TableDef::new(name).with_column(ColumnDef::text("body")))
    }

    #[test]
    fn test_empty_connection_string_rejected() {
        for conn in ["", "   "] {
            let result = SessionFactoryProvider::new(conn, DatabaseKind::Postgres);
            assert!(matches!(result, Err(PersistenceError::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_dialect_follows_kind() {
        let provider = SessionFactoryProvider::new("mysql://localhost/vault", DatabaseKind::MySql)
            .unwrap();
        assert_eq!(provider.dialect(), Dialect::MySql);
        assert_eq!(provider.schema_action(), SchemaAction::None);
        assert_eq!(provider.state(), ProviderStatus::Uninitialized);
    }

    #[test]
    fn test_factory_without_sources_not_configured() {
        let dir = tempfile::tempdir().unwrap();
        let provider = sqlite_provider(&dir);

        let err = provider.session_factory().err().unwrap();
        assert!(matches!(err, PersistenceError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_registration_builds_factory() {
        let dir = tempfile::tempdir().unwrap();
        let provider = sqlite_provider(&dir);

        provider.register_source(source("notes")).unwrap();
        assert_eq!(provider.state(), ProviderStatus::Built);
        assert!(provider.session_factory().is_ok());
        assert_eq!(provider.registered_sources(), vec![source("notes")]);
    }

    #[test]
    fn test_blank_source_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let provider = sqlite_provider(&dir);

        let err = provider.register_source(ModelSource::new(" ")).unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidArgument(_)));
        assert_eq!(provider.state(), ProviderStatus::Uninitialized);
    }

    #[tokio::test]
    async fn test_duplicate_registration_keeps_factory() {
        let dir = tempfile::tempdir().unwrap();
        let provider = sqlite_provider(&dir);

        provider.register_source(source("notes")).unwrap();
        let first = provider.session_factory().unwrap();
        provider.register_source(source("notes")).unwrap();
        let second = provider.session_factory().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.registered_sources().len(), 1);
    }

    #[tokio::test]
    async fn test_new_source_replaces_factory() {
        let dir = tempfile::tempdir().unwrap();
        let provider = sqlite_provider(&dir);

        provider.register_source(source("notes")).unwrap();
        let first = provider.session_factory().unwrap();
        provider.register_source(source("tags")).unwrap();
        let second = provider.session_factory().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(provider.registered_sources(), vec![source("notes"), source("tags")]);
        // The old factory keeps working for whoever still holds it.
        assert!(!first.is_closed());
    }

    #[tokio::test]
    async fn test_failed_build_stays_configured() {
        let provider = SessionFactoryProvider::new("not a url", DatabaseKind::Postgres).unwrap();

        let err = provider.register_source(source("notes")).unwrap_err();
        assert!(matches!(err, PersistenceError::StoreOperationFailed(_)));
        assert_eq!(provider.state(), ProviderStatus::Configured);
        assert!(provider.session_factory().is_err());
    }

    #[test]
    fn test_registration_outside_runtime_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = sqlite_provider(&dir);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            provider.register_source(source("notes"))
        }));
        let err = result.expect("registration must not panic").unwrap_err();
        assert!(matches!(err, PersistenceError::StoreOperationFailed(_)));
        assert_eq!(provider.state(), ProviderStatus::Configured);
        assert_eq!(provider.registered_sources(), vec![source("notes")]);
    }

    #[tokio::test]
    async fn test_dispose_is_terminal_and_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let provider = sqlite_provider(&dir);
        provider.register_source(source("notes")).unwrap();

        provider.dispose();
        provider.dispose();

        assert_eq!(provider.state(), ProviderStatus::Disposed);
        assert!(matches!(provider.session_factory(), Err(PersistenceError::Disposed)));
        assert!(matches!(
            provider.register_source(source("tags")),
            Err(PersistenceError::Disposed)
        ));
        assert!(provider.registered_sources().is_empty());
    }

    #[tokio::test]
    async fn test_close_closes_pool() {
        let dir = tempfile::tempdir().unwrap();
        let provider = sqlite_provider(&dir);
        provider.register_source(source("notes")).unwrap();
        let factory = provider.session_factory().unwrap();

        provider.close().await;

        assert!(factory.is_closed());
        assert_eq!(provider.state(), ProviderStatus::Disposed);
    }

    #[tokio::test]
    async fn test_last_lease_disposes() {
        let dir = tempfile::tempdir().unwrap();
        let provider = sqlite_provider(&dir);
        provider.register_source(source("notes")).unwrap();

        provider.acquire_lease();
        provider.acquire_lease();
        provider.release_lease();
        assert_eq!(provider.lease_count(), 1);
        assert_eq!(provider.state(), ProviderStatus::Built);

        provider.release_lease();
        assert_eq!(provider.lease_count(), 0);
        assert_eq!(provider.state(), ProviderStatus::Disposed);

        // Unbalanced release is ignored.
        provider.release_lease();
        assert_eq!(provider.lease_count(), 0);
    }

    #[test]
    fn test_debug_hides_connection_string() {
        let provider =
            SessionFactoryProvider::new("postgres://vault:hunter2@db/vault", DatabaseKind::Postgres)
                .unwrap();
        assert!(!format!("{provider:?}").contains("hunter2"));
    }
}

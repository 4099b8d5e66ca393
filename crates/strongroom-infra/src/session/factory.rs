//! Session factory: a lazily connected sqlx pool plus scoped units of work.
//!
//! Sessions are pooled connections. `with_session` and `with_transaction` hand
//! a connection to a unit of work and give it back to the pool on every exit
//! path, including errors and panics, because the pooled connection is
//! released when dropped.

use futures_util::future::BoxFuture;
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyConnection, AnyPool, Connection};
use sqlx::pool::PoolConnection;
use strongroom_types::config::SchemaAction;
use strongroom_types::error::PersistenceError;
use strongroom_types::source::TableDef;
use tokio::sync::OnceCell;

use super::configuration::Configuration;
use crate::sql::Dialect;

/// Opens sessions against one store for one configuration.
///
/// Building a factory never touches the store; the first session opens the
/// first connection.
pub struct SessionFactory {
    pool: AnyPool,
    dialect: Dialect,
    schema_action: SchemaAction,
    tables: Vec<TableDef>,
    schema_ready: OnceCell<()>,
}

impl SessionFactory {
    /// Build a factory for `configuration`.
    ///
    /// Fails when called outside a Tokio runtime, since the pool spawns its
    /// maintenance task there, or when the connection string cannot be parsed
    /// for any installed driver.
    pub fn build(configuration: &Configuration) -> Result<Self, PersistenceError> {
        tokio::runtime::Handle::try_current().map_err(PersistenceError::store)?;
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .connect_lazy(configuration.connection_string())
            .map_err(PersistenceError::store)?;

        Ok(Self {
            pool,
            dialect: configuration.dialect(),
            schema_action: configuration.schema_action(),
            tables: configuration.tables(),
            schema_ready: OnceCell::new(),
        })
    }

    /// The underlying pool, for queries outside the repository layer.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Run `work` on a pooled connection without a transaction.
    pub async fn with_session<R, F>(&self, work: F) -> Result<R, PersistenceError>
    where
        R: Send,
        F: for<'c> FnOnce(&'c mut AnyConnection) -> BoxFuture<'c, Result<R, PersistenceError>>
            + Send,
    {
        let mut session = self.open_session().await?;
        work(&mut *session).await
    }

    /// Run `work` inside a transaction.
    ///
    /// Commits when `work` returns `Ok`, rolls back when it returns `Err`.
    /// A transaction abandoned mid-flight rolls back when dropped.
    pub async fn with_transaction<R, F>(&self, work: F) -> Result<R, PersistenceError>
    where
        R: Send,
        F: for<'c> FnOnce(&'c mut AnyConnection) -> BoxFuture<'c, Result<R, PersistenceError>>
            + Send,
    {
        let mut session = self.open_session().await?;
        let mut tx = Connection::begin(&mut *session)
            .await
            .map_err(PersistenceError::store)?;

        match work(&mut *tx).await {
            Ok(value) => {
                tx.commit().await.map_err(PersistenceError::store)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "transaction rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Close every pooled connection and wait for them to finish.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    async fn open_session(&self) -> Result<PoolConnection<sqlx::any::Any>, PersistenceError> {
        let mut session = self.pool.acquire().await.map_err(PersistenceError::store)?;
        self.ensure_schema(&mut session).await?;
        Ok(session)
    }

    async fn ensure_schema(&self, session: &mut AnyConnection) -> Result<(), PersistenceError> {
        if self.schema_action != SchemaAction::Create {
            return Ok(());
        }

        self.schema_ready
            .get_or_try_init(|| async move {
                for table in &self.tables {
                    let sql = self.dialect.create_table_sql(table);
                    sqlx::query(&sql)
                        .execute(&mut *session)
                        .await
                        .map_err(PersistenceError::store)?;
                    tracing::debug!(table = %table.name, "ensured table exists");
                }
                Ok::<(), PersistenceError>(())
            })
            .await?;
        Ok(())
    }
}

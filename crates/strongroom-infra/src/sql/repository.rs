//! Generic SQL repository over the session factory provider.
//!
//! Reads run in a plain session, writes in their own transaction. Engine
//! errors are passed through unmodified inside
//! `PersistenceError::StoreOperationFailed`; nothing is retried.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::Row;
use sqlx::any::{Any, AnyArguments};
use sqlx::query::Query;
use strongroom_core::repository::Repository;
use strongroom_types::error::PersistenceError;
use strongroom_types::model::{DataModel, ModelId};

use super::dialect::IdRetrieval;
use super::mapping::{EntityMapping, FieldValue};
use super::statements::Statements;
use crate::session::{SessionFactory, SessionFactoryProvider};

/// `Repository<T>` backed by the store of a `SessionFactoryProvider`.
pub struct SqlRepository<T> {
    provider: Arc<SessionFactoryProvider>,
    mapping: EntityMapping<T>,
    statements: Statements,
    disposed: AtomicBool,
}

impl<T: DataModel> SqlRepository<T> {
    /// Register the mapping's model source with `provider` and take a lease
    /// on it.
    pub fn new(
        provider: Arc<SessionFactoryProvider>,
        mapping: EntityMapping<T>,
    ) -> Result<Self, PersistenceError> {
        provider.register_source(mapping.source().clone())?;
        provider.acquire_lease();

        let statements = Statements::prepare(provider.dialect(), mapping.table());
        Ok(Self {
            provider,
            mapping,
            statements,
            disposed: AtomicBool::new(false),
        })
    }

    pub fn provider(&self) -> &Arc<SessionFactoryProvider> {
        &self.provider
    }

    pub fn mapping(&self) -> &EntityMapping<T> {
        &self.mapping
    }

    fn factory(&self) -> Result<Arc<SessionFactory>, PersistenceError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(PersistenceError::Disposed);
        }
        self.provider.session_factory()
    }

    fn stale(&self, id: ModelId) -> PersistenceError {
        PersistenceError::StaleEntity {
            entity: self.mapping.table().name.clone(),
            id,
        }
    }
}

impl<T> SqlRepository<T> {
    fn release(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            tracing::debug!(table = %self.mapping.table().name, "repository disposed");
            self.provider.release_lease();
        }
    }
}

impl<T> Drop for SqlRepository<T> {
    fn drop(&mut self) {
        self.release();
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Any, AnyArguments<'q>>,
    values: Vec<FieldValue>,
) -> Query<'q, Any, AnyArguments<'q>> {
    for value in values {
        query = value.bind(query);
    }
    query
}

impl<T: DataModel> Repository<T> for SqlRepository<T> {
    async fn create(&self, mut model: T) -> Result<T, PersistenceError> {
        let factory = self.factory()?;
        let sql = self.statements.insert.clone();
        let values = self.mapping.values(&model);

        let id = match self.statements.id_retrieval {
            IdRetrieval::Returning => {
                factory
                    .with_transaction(move |conn| {
                        Box::pin(async move {
                            let row = bind_all(sqlx::query(&sql), values)
                                .fetch_one(&mut *conn)
                                .await
                                .map_err(PersistenceError::store)?;
                            row.try_get::<i64, _>(0).map_err(PersistenceError::store)
                        })
                    })
                    .await?
            }
            IdRetrieval::LastInsertId => {
                factory
                    .with_transaction(move |conn| {
                        Box::pin(async move {
                            let result = bind_all(sqlx::query(&sql), values)
                                .execute(&mut *conn)
                                .await
                                .map_err(PersistenceError::store)?;
                            result.last_insert_id().ok_or_else(|| {
                                PersistenceError::store(sqlx::Error::Protocol(
                                    "store did not report a generated id".to_string(),
                                ))
                            })
                        })
                    })
                    .await?
            }
        };

        model.set_id(id);
        tracing::debug!(table = %self.mapping.table().name, id, "created");
        Ok(model)
    }

    async fn read(&self, id: ModelId) -> Result<Option<T>, PersistenceError> {
        let factory = self.factory()?;
        let sql = self.statements.select.clone();
        let hydrate = self.mapping.hydrate();

        let model = factory
            .with_session(move |conn| {
                Box::pin(async move {
                    let row = sqlx::query(&sql)
                        .bind(id)
                        .fetch_optional(&mut *conn)
                        .await
                        .map_err(PersistenceError::store)?;
                    row.as_ref()
                        .map(hydrate)
                        .transpose()
                        .map_err(PersistenceError::store)
                })
            })
            .await?;

        tracing::debug!(table = %self.mapping.table().name, id, found = model.is_some(), "read");
        Ok(model.map(|mut model| {
            model.set_id(id);
            model
        }))
    }

    async fn update(&self, model: &T) -> Result<(), PersistenceError> {
        let factory = self.factory()?;
        let id = model.id();
        let sql = self.statements.update.clone();
        let exists_sql = self.statements.select.clone();
        let mut values = self.mapping.values(model);
        values.push(FieldValue::Integer(Some(id)));

        // Some engines count changed rather than matched rows, so an update
        // that rewrites identical values can report zero.
        let found = factory
            .with_transaction(move |conn| {
                Box::pin(async move {
                    let result = bind_all(sqlx::query(&sql), values)
                        .execute(&mut *conn)
                        .await
                        .map_err(PersistenceError::store)?;
                    if result.rows_affected() > 0 {
                        return Ok(true);
                    }
                    let row = sqlx::query(&exists_sql)
                        .bind(id)
                        .fetch_optional(&mut *conn)
                        .await
                        .map_err(PersistenceError::store)?;
                    Ok::<bool, PersistenceError>(row.is_some())
                })
            })
            .await?;

        if !found {
            return Err(self.stale(id));
        }
        tracing::debug!(table = %self.mapping.table().name, id, "updated");
        Ok(())
    }

    async fn delete(&self, model: &T) -> Result<(), PersistenceError> {
        let factory = self.factory()?;
        let id = model.id();
        let sql = self.statements.delete.clone();

        let affected = factory
            .with_transaction(move |conn| {
                Box::pin(async move {
                    let result = sqlx::query(&sql)
                        .bind(id)
                        .execute(&mut *conn)
                        .await
                        .map_err(PersistenceError::store)?;
                    Ok::<u64, PersistenceError>(result.rows_affected())
                })
            })
            .await?;

        if affected == 0 {
            return Err(self.stale(id));
        }
        tracing::debug!(table = %self.mapping.table().name, id, "deleted");
        Ok(())
    }

    fn dispose(&self) {
        self.release();
    }
}

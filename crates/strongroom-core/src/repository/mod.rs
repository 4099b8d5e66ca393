//! Repository trait definitions (ports).
//!
//! `strongroom-infra` implements `Repository` on top of a relational store;
//! `EncryptedRepository` decorates any implementation with field encryption.

pub mod encrypted;

pub use encrypted::EncryptedRepository;

use strongroom_types::error::PersistenceError;
use strongroom_types::model::{DataModel, ModelId};

/// CRUD persistence for one model type.
///
/// Every call is its own unit of work: writes either commit completely or
/// leave the store untouched. Store failures are returned unmodified and never
/// retried. Uses native async fn in traits (Rust 2024 edition, no async_trait
/// macro).
///
/// Concurrent calls are not coordinated here. Races between two writes, or
/// between a write and a read, of the same row are settled by the store's
/// isolation level alone. Construct every repository of a store, which
/// registers its model source, before issuing concurrent calls.
pub trait Repository<T: DataModel>: Send + Sync {
    /// Persist a new model. Returns it with the store-generated id.
    fn create(
        &self,
        model: T,
    ) -> impl std::future::Future<Output = Result<T, PersistenceError>> + Send;

    /// Fetch a model by id. Returns `None` if it does not exist.
    fn read(
        &self,
        id: ModelId,
    ) -> impl std::future::Future<Output = Result<Option<T>, PersistenceError>> + Send;

    /// Overwrite the stored state of an existing model.
    fn update(
        &self,
        model: &T,
    ) -> impl std::future::Future<Output = Result<(), PersistenceError>> + Send;

    /// Remove the stored model with the same id.
    fn delete(
        &self,
        model: &T,
    ) -> impl std::future::Future<Output = Result<(), PersistenceError>> + Send;

    /// Release the resources held by this repository. Idempotent; later
    /// operations fail with `PersistenceError::Disposed`.
    fn dispose(&self);
}

//! The data model contract.

/// Store-assigned numeric identifier of a persisted entity.
pub type ModelId = i64;

/// Identifier value of an entity that has not been persisted yet.
pub const UNSET_ID: ModelId = 0;

/// Any entity type a repository can persist.
///
/// The only thing the persistence core knows about an entity is its numeric
/// identifier: unset (`0`) before creation, assigned by the store on create.
/// Instantiation from stored rows is left to the entity mapping, so no default
/// constructor is required.
pub trait DataModel: Clone + Send + Sync + 'static {
    /// Current identifier, `UNSET_ID` if never persisted.
    fn id(&self) -> ModelId;

    /// Overwrite the identifier (used by repositories after a create).
    fn set_id(&mut self, id: ModelId);

    /// Whether the entity has never been persisted.
    fn is_transient(&self) -> bool {
        self.id() == UNSET_ID
    }
}

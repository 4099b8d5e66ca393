use std::error::Error as StdError;

use thiserror::Error;

use crate::model::ModelId;

/// Errors from text encryption and decryption.
///
/// IMPORTANT: These errors never include plaintext, key material, or ciphertext
/// in their Display/Debug output to prevent accidental logging of secrets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("invalid ciphertext: too short")]
    CiphertextTooShort,

    #[error("invalid ciphertext: not valid base64")]
    InvalidEncoding,

    #[error("decrypted text is not valid UTF-8")]
    InvalidUtf8,

    #[error("unsupported ciphertext version {0}")]
    UnsupportedVersion(u8),

    #[error("key derivation failed")]
    KeyDerivationFailed,
}

/// Errors from the persistence layer (providers, repositories, decorators).
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// A constructor or registration argument was missing or empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A session factory was requested before any model source was registered.
    #[error("persistence not configured: {0}")]
    NotConfigured(String),

    /// The underlying store failed; the engine error is carried unmodified.
    #[error(transparent)]
    StoreOperationFailed(Box<dyn StdError + Send + Sync + 'static>),

    /// An update or delete matched no stored row.
    #[error("{entity} {id} does not exist in the store")]
    StaleEntity { entity: String, id: ModelId },

    /// The provider or repository has been disposed.
    #[error("persistence provider has been disposed")]
    Disposed,

    #[error(transparent)]
    Cipher(#[from] CipherError),
}

impl PersistenceError {
    /// Wrap an engine error without adding context.
    pub fn store<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        PersistenceError::StoreOperationFailed(Box::new(err))
    }

    pub fn invalid_argument(name: &str) -> Self {
        PersistenceError::InvalidArgument(format!("{name} must not be empty"))
    }

    /// The wrapped engine error, if this is a store failure of type `E`.
    pub fn store_error<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            PersistenceError::StoreOperationFailed(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

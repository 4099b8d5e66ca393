//! Storage mapping and repository assembly for `Credential`.

use std::sync::Arc;

use sqlx::Row;
use sqlx::any::AnyRow;
use strongroom_core::policy::credential_policy;
use strongroom_core::repository::EncryptedRepository;
use strongroom_types::config::KdfConfig;
use strongroom_types::credential::Credential;
use strongroom_types::error::PersistenceError;

use super::mapping::EntityMapping;
use super::repository::SqlRepository;
use crate::crypto::cipher::AesGcmTextCipher;
use crate::session::SessionFactoryProvider;

/// Model source registered by credential repositories.
pub const CREDENTIAL_SOURCE: &str = "strongroom.credentials";
pub const CREDENTIAL_TABLE: &str = "credentials";

/// Credentials with every text field encrypted at rest.
pub type CredentialRepository =
    EncryptedRepository<Credential, SqlRepository<Credential>, AesGcmTextCipher>;

pub fn hydrate_credential(row: &AnyRow) -> Result<Credential, sqlx::Error> {
    Ok(Credential {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        username: row.try_get("username")?,
        password: row.try_get("password")?,
        associated_resource: row.try_get("associated_resource")?,
        description: row.try_get("description")?,
        notes: row.try_get("notes")?,
    })
}

pub fn credential_mapping() -> EntityMapping<Credential> {
    EntityMapping::<Credential>::builder(CREDENTIAL_SOURCE, CREDENTIAL_TABLE)
        .text("title", |c| c.title.as_str())
        .text("username", |c| c.username.as_str())
        .text("password", |c| c.password.as_str())
        .text("associated_resource", |c| c.associated_resource.as_str())
        .text("description", |c| c.description.as_str())
        .text("notes", |c| c.notes.as_str())
        .build(hydrate_credential)
}

/// Build an encrypted credential repository on `provider`.
///
/// The passphrase is checked before the provider is touched.
pub fn credential_repository(
    provider: Arc<SessionFactoryProvider>,
    passphrase: impl Into<String>,
    kdf: KdfConfig,
) -> Result<CredentialRepository, PersistenceError> {
    let passphrase: String = passphrase.into();
    if passphrase.is_empty() {
        return Err(PersistenceError::invalid_argument("encryption passphrase"));
    }

    let inner = SqlRepository::new(provider, credential_mapping())?;
    EncryptedRepository::new(
        passphrase,
        inner,
        AesGcmTextCipher::new(kdf),
        credential_policy(),
    )
}

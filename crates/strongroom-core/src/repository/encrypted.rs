//! Field-encrypting repository decorator.
//!
//! `EncryptedRepository` wraps another `Repository` and a `TextCipher`. Fields
//! selected by its `FieldPolicy` are encrypted on the way into the store and
//! decrypted on the way out, so the store only ever receives ciphertext and
//! callers only ever observe plaintext. Transactions stay entirely inside the
//! wrapped repository.

use secrecy::{ExposeSecret, SecretString};
use strongroom_types::error::{CipherError, PersistenceError};
use strongroom_types::model::{DataModel, ModelId};

use super::Repository;
use crate::cipher::TextCipher;
use crate::policy::FieldPolicy;

pub struct EncryptedRepository<T, R, C> {
    inner: R,
    cipher: C,
    passphrase: SecretString,
    policy: FieldPolicy<T>,
}

impl<T, R, C> EncryptedRepository<T, R, C>
where
    T: DataModel,
    R: Repository<T>,
    C: TextCipher,
{
    /// Wrap `inner`, encrypting the fields selected by `policy` under
    /// `passphrase`.
    ///
    /// Fails with `InvalidArgument` for an empty passphrase.
    pub fn new(
        passphrase: impl Into<String>,
        inner: R,
        cipher: C,
        policy: FieldPolicy<T>,
    ) -> Result<Self, PersistenceError> {
        let passphrase: String = passphrase.into();
        if passphrase.is_empty() {
            return Err(PersistenceError::invalid_argument("encryption passphrase"));
        }

        Ok(Self {
            inner,
            cipher,
            passphrase: SecretString::from(passphrase),
            policy,
        })
    }

    /// The wrapped repository, which sees ciphertext.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn encrypt_text(&self, text: &str) -> Result<String, CipherError> {
        self.cipher
            .encrypt_text(text, self.passphrase.expose_secret())
    }

    pub fn decrypt_text(&self, text: &str) -> Result<String, CipherError> {
        self.cipher
            .decrypt_text(text, self.passphrase.expose_secret())
    }

    /// Encrypt every field selected by the policy.
    pub fn encrypt_fields(&self, mut model: T) -> Result<T, PersistenceError> {
        self.policy
            .apply(&mut model, |value| self.encrypt_text(value))?;
        Ok(model)
    }

    /// Decrypt every field selected by the policy.
    pub fn decrypt_fields(&self, mut model: T) -> Result<T, PersistenceError> {
        self.policy
            .apply(&mut model, |value| self.decrypt_text(value))?;
        Ok(model)
    }
}

impl<T, R, C> Repository<T> for EncryptedRepository<T, R, C>
where
    T: DataModel,
    R: Repository<T>,
    C: TextCipher,
{
    async fn create(&self, model: T) -> Result<T, PersistenceError> {
        let encrypted = self.encrypt_fields(model)?;
        let created = self.inner.create(encrypted).await?;
        self.decrypt_fields(created)
    }

    async fn read(&self, id: ModelId) -> Result<Option<T>, PersistenceError> {
        match self.inner.read(id).await? {
            Some(model) => self
                .decrypt_fields(model)
                .inspect_err(|err| tracing::warn!(id, error = %err, "stored fields could not be decrypted"))
                .map(Some),
            None => Ok(None),
        }
    }

    // The caller's value is left in plaintext; only a copy is encrypted.
    async fn update(&self, model: &T) -> Result<(), PersistenceError> {
        let encrypted = self.encrypt_fields(model.clone())?;
        self.inner.update(&encrypted).await
    }

    async fn delete(&self, model: &T) -> Result<(), PersistenceError> {
        let encrypted = self.encrypt_fields(model.clone())?;
        self.inner.delete(&encrypted).await
    }

    fn dispose(&self) {
        self.inner.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::credential_policy;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use std::sync::{Arc, Mutex};
    use strongroom_types::credential::Credential;

    // --- Mock repository and cipher ---

    /// In-memory repository keeping exactly what it was given.
    #[derive(Clone, Default)]
    struct MemoryRepository {
        rows: Arc<Mutex<HashMap<ModelId, Credential>>>,
        next_id: Arc<AtomicI64>,
        disposed: Arc<AtomicBool>,
    }

    impl MemoryRepository {
        fn raw(&self, id: ModelId) -> Option<Credential> {
            self.rows.lock().unwrap().get(&id).cloned()
        }
    }

    impl Repository<Credential> for MemoryRepository {
        async fn create(&self, mut model: Credential) -> Result<Credential, PersistenceError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            model.set_id(id);
            self.rows.lock().unwrap().insert(id, model.clone());
            Ok(model)
        }

        async fn read(&self, id: ModelId) -> Result<Option<Credential>, PersistenceError> {
            Ok(self.raw(id))
        }

        async fn update(&self, model: &Credential) -> Result<(), PersistenceError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&model.id) {
                Some(row) => {
                    *row = model.clone();
                    Ok(())
                }
                None => Err(PersistenceError::StaleEntity {
                    entity: "credentials".to_string(),
                    id: model.id,
                }),
            }
        }

        async fn delete(&self, model: &Credential) -> Result<(), PersistenceError> {
            self.rows.lock().unwrap().remove(&model.id);
            Ok(())
        }

        fn dispose(&self) {
            self.disposed.store(true, Ordering::SeqCst);
        }
    }

    /// Reversible stand-in cipher: tags the text with the passphrase and
    /// reverses it.
    struct ReversingCipher;

    impl TextCipher for ReversingCipher {
        fn encrypt_text(&self, plaintext: &str, passphrase: &str) -> Result<String, CipherError> {
            Ok(format!("{passphrase}:{}", plaintext.chars().rev().collect::<String>()))
        }

        fn decrypt_text(&self, ciphertext: &str, passphrase: &str) -> Result<String, CipherError> {
            let body = ciphertext
                .strip_prefix(passphrase)
                .and_then(|rest| rest.strip_prefix(':'))
                .ok_or(CipherError::DecryptionFailed)?;
            Ok(body.chars().rev().collect())
        }
    }

    type TestRepository = EncryptedRepository<Credential, MemoryRepository, ReversingCipher>;

    fn repository() -> (TestRepository, MemoryRepository) {
        let store = MemoryRepository::default();
        let repo = EncryptedRepository::new(
            "s3cret",
            store.clone(),
            ReversingCipher,
            credential_policy(),
        )
        .unwrap();
        (repo, store)
    }

    fn sample() -> Credential {
        Credential::new("Mail", "ada", "hunter2")
            .with_resource("imap.example.com")
            .with_description("personal mailbox")
            .with_notes("rotate yearly")
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let result = TestRepository::new(
            "",
            MemoryRepository::default(),
            ReversingCipher,
            credential_policy(),
        );
        assert!(matches!(result, Err(PersistenceError::InvalidArgument(_))));
    }

    #[test]
    fn test_text_roundtrip() {
        let (repo, _) = repository();
        for text in ["", "plain ascii", "пароль", "密码 🔐 with emoji"] {
            let encrypted = repo.encrypt_text(text).unwrap();
            assert_eq!(repo.decrypt_text(&encrypted).unwrap(), text);
        }
    }

    #[tokio::test]
    async fn test_create_stores_ciphertext_and_returns_plaintext() {
        let (repo, store) = repository();

        let created = repo.create(sample()).await.unwrap();
        assert_ne!(created.id, 0);
        assert_eq!(created.password, "hunter2");
        assert_eq!(created.title, "Mail");

        let raw = store.raw(created.id).unwrap();
        assert_eq!(raw.password, "s3cret:2retnuh");
        assert_ne!(raw.title, "Mail");
        assert_ne!(raw.notes, "rotate yearly");
    }

    #[tokio::test]
    async fn test_read_decrypts() {
        let (repo, _) = repository();
        let created = repo.create(sample()).await.unwrap();

        let read = repo.read(created.id).await.unwrap().unwrap();
        assert_eq!(read, created);
    }

    #[tokio::test]
    async fn test_read_missing_passes_through() {
        let (repo, _) = repository();
        assert!(repo.read(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_leaves_caller_value_plaintext() {
        let (repo, store) = repository();
        let mut credential = repo.create(sample()).await.unwrap();

        credential.password = "correct horse".to_string();
        repo.update(&credential).await.unwrap();

        assert_eq!(credential.password, "correct horse");
        assert_eq!(store.raw(credential.id).unwrap().password, "s3cret:esroh tcerroc");

        let read = repo.read(credential.id).await.unwrap().unwrap();
        assert_eq!(read.password, "correct horse");
        assert_eq!(read.id, credential.id);
    }

    #[tokio::test]
    async fn test_update_missing_propagates_inner_error() {
        let (repo, _) = repository();
        let mut credential = sample();
        credential.id = 5;

        let err = repo.update(&credential).await.unwrap_err();
        assert!(matches!(err, PersistenceError::StaleEntity { id: 5, .. }));
    }

    #[tokio::test]
    async fn test_delete_removes() {
        let (repo, _) = repository();
        let created = repo.create(sample()).await.unwrap();

        repo.delete(&created).await.unwrap();
        assert!(repo.read(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unselected_fields_pass_through() {
        let store = MemoryRepository::default();
        let policy = FieldPolicy::<Credential>::new().field("password", |c| &mut c.password);
        let repo =
            EncryptedRepository::new("s3cret", store.clone(), ReversingCipher, policy).unwrap();

        let created = repo.create(sample()).await.unwrap();
        let raw = store.raw(created.id).unwrap();
        assert_eq!(raw.title, "Mail");
        assert_eq!(raw.username, "ada");
        assert_ne!(raw.password, "hunter2");
    }

    #[tokio::test]
    async fn test_wrong_passphrase_fails_to_read() {
        let store = MemoryRepository::default();
        let writer = TestRepository::new("one", store.clone(), ReversingCipher, credential_policy())
            .unwrap();
        let reader = TestRepository::new("two", store, ReversingCipher, credential_policy())
            .unwrap();

        let created = writer.create(sample()).await.unwrap();
        let err = reader.read(created.id).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Cipher(CipherError::DecryptionFailed)));
    }

    #[test]
    fn test_dispose_delegates() {
        let (repo, store) = repository();
        repo.dispose();
        assert!(store.disposed.load(Ordering::SeqCst));
    }
}

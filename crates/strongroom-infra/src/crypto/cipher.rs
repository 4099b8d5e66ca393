//! AES-256-GCM text encryption for model fields at rest.
//!
//! `AesGcmTextCipher` encrypts UTF-8 text under a passphrase. The key is
//! derived with Argon2id from the passphrase and a per-instance random salt;
//! the salt travels inside the ciphertext so any instance can decrypt text
//! written by any other.
//!
//! Encrypted format: `base64(version (1 byte) || salt (16) || nonce (12) || ciphertext + tag)`
//!
//! SECURITY: Error types never contain plaintext or key material.

use std::fmt;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use strongroom_core::cipher::TextCipher;
use strongroom_types::config::KdfConfig;
use strongroom_types::error::CipherError;

/// Format version written as the first byte of every ciphertext.
const FORMAT_VERSION: u8 = 1;
const SALT_SIZE: usize = 16;
/// Nonce size for AES-256-GCM (96 bits / 12 bytes).
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const KEY_SIZE: usize = 32;
const HEADER_SIZE: usize = 1 + SALT_SIZE + NONCE_SIZE;
/// Cached keys beyond which keys for other instances' salts are evicted.
const MAX_CACHED_KEYS: usize = 64;

/// Passphrase-keyed AES-256-GCM `TextCipher`.
///
/// Each encryption uses a fresh random nonce, so encrypting the same text
/// twice produces different output. Derived keys are cached per
/// (salt, passphrase) digest; the passphrase itself is never retained.
/// Keys for this instance's own salt stay cached. Keys for salts read from
/// other instances' ciphertext are dropped once the cache holds
/// `MAX_CACHED_KEYS` entries.
pub struct AesGcmTextCipher {
    kdf: KdfConfig,
    salt: [u8; SALT_SIZE],
    keys: DashMap<[u8; 32], CachedKey>,
}

#[derive(Clone, Copy)]
struct CachedKey {
    key: [u8; KEY_SIZE],
    own_salt: bool,
}

impl AesGcmTextCipher {
    pub fn new(kdf: KdfConfig) -> Self {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        Self {
            kdf,
            salt,
            keys: DashMap::new(),
        }
    }

    fn key(&self, salt: &[u8], passphrase: &str) -> Result<[u8; KEY_SIZE], CipherError> {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(passphrase.as_bytes());
        let cache_key: [u8; 32] = hasher.finalize().into();

        if let Some(cached) = self.keys.get(&cache_key) {
            return Ok(cached.key);
        }

        let key = derive_key(&self.kdf, salt, passphrase)?;
        let own_salt = salt == self.salt.as_slice();
        if !own_salt && self.keys.len() >= MAX_CACHED_KEYS {
            self.keys.retain(|_, cached| cached.own_salt);
            tracing::debug!("evicted cached keys for foreign salts");
        }
        self.keys.insert(cache_key, CachedKey { key, own_salt });
        Ok(key)
    }
}

impl Default for AesGcmTextCipher {
    fn default() -> Self {
        Self::new(KdfConfig::default())
    }
}

impl TextCipher for AesGcmTextCipher {
    fn encrypt_text(&self, plaintext: &str, passphrase: &str) -> Result<String, CipherError> {
        let key = self.key(&self.salt, passphrase)?;
        let cipher = Aes256Gcm::new((&key).into());
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut data = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
        data.push(FORMAT_VERSION);
        data.extend_from_slice(&self.salt);
        data.extend_from_slice(&nonce);
        data.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(data))
    }

    fn decrypt_text(&self, ciphertext: &str, passphrase: &str) -> Result<String, CipherError> {
        let data = STANDARD
            .decode(ciphertext)
            .map_err(|_| CipherError::InvalidEncoding)?;

        match data.first() {
            None => return Err(CipherError::CiphertextTooShort),
            Some(&FORMAT_VERSION) => {}
            Some(&other) => return Err(CipherError::UnsupportedVersion(other)),
        }
        if data.len() < HEADER_SIZE + TAG_SIZE {
            return Err(CipherError::CiphertextTooShort);
        }

        let salt = &data[1..1 + SALT_SIZE];
        let nonce = Nonce::from_slice(&data[1 + SALT_SIZE..HEADER_SIZE]);
        let key = self.key(salt, passphrase)?;

        let plaintext = Aes256Gcm::new((&key).into())
            .decrypt(nonce, &data[HEADER_SIZE..])
            .map_err(|_| CipherError::DecryptionFailed)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }
}

impl fmt::Debug for AesGcmTextCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmTextCipher")
            .field("kdf", &self.kdf)
            .field("cached_keys", &self.keys.len())
            .finish_non_exhaustive()
    }
}

/// Derive a 32-byte key from a passphrase and salt using Argon2id.
fn derive_key(
    kdf: &KdfConfig,
    salt: &[u8],
    passphrase: &str,
) -> Result<[u8; KEY_SIZE], CipherError> {
    let params = Params::new(kdf.memory_kib, kdf.iterations, kdf.parallelism, Some(KEY_SIZE))
        .map_err(|_| CipherError::KeyDerivationFailed)?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|_| CipherError::KeyDerivationFailed)?;
    Ok(key)
}

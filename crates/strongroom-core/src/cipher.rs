//! Text cipher trait definition.

use strongroom_types::error::CipherError;

/// Symmetric, passphrase-keyed encryption of text.
///
/// Implementations must be total over the empty string and arbitrary unicode
/// text, and `decrypt_text(encrypt_text(x, p)?, p)` must return `x` for every
/// `x` and non-empty passphrase `p`. Ciphertext is itself text so it can be
/// stored in ordinary string columns.
pub trait TextCipher: Send + Sync {
    /// Encrypt `plaintext` under `passphrase`.
    fn encrypt_text(&self, plaintext: &str, passphrase: &str) -> Result<String, CipherError>;

    /// Decrypt text produced by `encrypt_text` under the same passphrase.
    fn decrypt_text(&self, ciphertext: &str, passphrase: &str) -> Result<String, CipherError>;
}

//! Password-based AES-256 envelope.
//!
//! The processor decrypts request payloads with the OpenSSL `enc` format
//! (also known as "AES Everywhere"), so the layout here is fixed:
//!
//! ```text
//! Base64( "Salted__" || salt[8] || AES-256-CBC(PKCS#7, plaintext) )
//! ```
//!
//! Key and IV come from OpenSSL's `EVP_BytesToKey` with MD5 and a single
//! iteration: `D_1 = MD5(password || salt)`, `D_i = MD5(D_{i-1} || password || salt)`,
//! concatenated until 48 bytes are available (32 byte key, 16 byte IV).
//!
//! Envelopes produced here decrypt with
//! `openssl enc -d -aes-256-cbc -md md5 -base64 -A -pass pass:<password>`
//! and vice versa.
//!
//! There is no authentication tag. A wrong password is only detected when
//! the padding fails to verify, and that failure is reported exactly like a
//! corrupted ciphertext.

use aes::cipher::{block_padding::Pkcs7, generic_array::GenericArray};
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::Zeroizing;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Magic prefix of every envelope.
pub const SALT_MARKER: &[u8; 8] = b"Salted__";

/// Salt length in bytes.
pub const SALT_LEN: usize = 8;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

/// Envelope decryption errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// Not an envelope: bad Base64, missing marker or truncated ciphertext.
    #[error("malformed envelope: {0}")]
    BadEnvelope(String),
    /// Padding did not verify (corrupted data or wrong password).
    #[error("envelope padding is invalid")]
    BadPadding,
}

/// Result type for envelope operations.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// Encrypt `plaintext` under `password` with a fresh random salt.
pub fn encrypt(plaintext: &[u8], password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut salt);
    encrypt_with_salt(plaintext, password, &salt)
}

/// Encrypt with a caller-chosen salt.
///
/// Deterministic; only meant for fixtures and cross-checking other
/// implementations. Reusing a salt with the same password reuses the IV.
pub fn encrypt_with_salt(plaintext: &[u8], password: &str, salt: &[u8; SALT_LEN]) -> String {
    let material = derive_key_iv(password.as_bytes(), salt);
    let (key, iv) = material.split_at(KEY_LEN);

    let ciphertext = Aes256CbcEnc::new(GenericArray::from_slice(key), GenericArray::from_slice(iv))
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut out = Vec::with_capacity(SALT_MARKER.len() + SALT_LEN + ciphertext.len());
    out.extend_from_slice(SALT_MARKER);
    out.extend_from_slice(salt);
    out.extend_from_slice(&ciphertext);

    STANDARD.encode(out)
}

/// Decrypt an envelope produced by [`encrypt`] or by OpenSSL.
pub fn decrypt(envelope: &str, password: &str) -> EnvelopeResult<Vec<u8>> {
    let raw = STANDARD
        .decode(envelope.trim())
        .map_err(|e| EnvelopeError::BadEnvelope(format!("invalid base64: {}", e)))?;

    let header_len = SALT_MARKER.len() + SALT_LEN;
    if raw.len() < header_len || &raw[..SALT_MARKER.len()] != SALT_MARKER {
        return Err(EnvelopeError::BadEnvelope(
            "missing Salted__ marker".to_string(),
        ));
    }

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&raw[SALT_MARKER.len()..header_len]);
    let ciphertext = &raw[header_len..];

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(EnvelopeError::BadEnvelope(format!(
            "ciphertext length {} is not a positive multiple of {}",
            ciphertext.len(),
            BLOCK_LEN
        )));
    }

    let material = derive_key_iv(password.as_bytes(), &salt);
    let (key, iv) = material.split_at(KEY_LEN);

    Aes256CbcDec::new(GenericArray::from_slice(key), GenericArray::from_slice(iv))
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| EnvelopeError::BadPadding)
}

/// Decrypt and interpret the plaintext as UTF-8.
pub fn decrypt_to_string(envelope: &str, password: &str) -> EnvelopeResult<String> {
    let bytes = decrypt(envelope, password)?;
    String::from_utf8(bytes)
        .map_err(|_| EnvelopeError::BadEnvelope("plaintext is not valid UTF-8".to_string()))
}

/// OpenSSL `EVP_BytesToKey` (MD5, one iteration) producing key || IV.
fn derive_key_iv(password: &[u8], salt: &[u8; SALT_LEN]) -> Zeroizing<[u8; KEY_LEN + IV_LEN]> {
    let mut material = Zeroizing::new([0u8; KEY_LEN + IV_LEN]);
    let mut previous: Option<md5::Digest> = None;
    let mut filled = 0;

    while filled < material.len() {
        let mut ctx = md5::Context::new();
        if let Some(digest) = previous {
            ctx.consume(digest.0);
        }
        ctx.consume(password);
        ctx.consume(salt);
        let digest = ctx.compute();

        let take = (material.len() - filled).min(digest.0.len());
        material[filled..filled + take].copy_from_slice(&digest.0[..take]);
        filled += take;
        previous = Some(digest);
    }

    material
}

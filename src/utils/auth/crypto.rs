//! Cryptographic primitives for the shield
//!
//! Authenticated encryption (AES-256-GCM), SHA-256 digests, HMAC-SHA256
//! signatures, secure random tokens, PBKDF2 password hashing and masking
//! helpers. Everything here is stateless and safe to call concurrently.

use crate::utils::error::{Result, ShieldError};
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac, digest::KeyInit as HmacKeyInit};
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// AES-256-GCM nonce size (96 bits / 12 bytes as recommended by NIST)
const AES_GCM_NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size
const AES_GCM_TAG_SIZE: usize = 16;

/// PBKDF2 rounds for password hashing
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// PBKDF2 output length in bytes (256 bits)
const PBKDF2_OUTPUT_LEN: usize = 32;

/// Salt length in bytes when none is supplied
const DEFAULT_SALT_BYTES: usize = 16;

/// Characters kept visible on each side by [`mask_sensitive_data`]
pub const DEFAULT_VISIBLE_CHARS: usize = 4;

const MASK: &str = "****";

/// Field name fragments whose values are masked by [`mask_sensitive_fields`]
const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "apikey",
    "creditcard",
];

/// Derive a 256-bit key from arbitrary-length input using SHA-256
fn derive_key(key: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(key);
    hasher.finalize().into()
}

fn cipher_for(key: &[u8]) -> Aes256Gcm {
    let derived_key = derive_key(key);
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived_key))
}

/// Encrypt a string using AES-256-GCM.
///
/// The output format is `base64(nonce || ciphertext || tag)` with a fresh
/// random nonce per call, so encrypting the same input twice yields
/// different ciphertexts.
pub fn encrypt(plaintext: &str, key: &[u8]) -> Result<String> {
    let cipher = cipher_for(key);

    let mut nonce_bytes = [0u8; AES_GCM_NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| ShieldError::Encryption(format!("Encryption failed: {}", e)))?;

    let mut output = Vec::with_capacity(AES_GCM_NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);

    Ok(general_purpose::STANDARD.encode(&output))
}

/// Serialize a value to JSON and encrypt it
pub fn encrypt_value<T: Serialize + ?Sized>(value: &T, key: &[u8]) -> Result<String> {
    let json = serde_json::to_string(value)
        .map_err(|e| ShieldError::Encryption(format!("Failed to serialize value: {}", e)))?;
    encrypt(&json, key)
}

/// Decrypt data produced by [`encrypt`].
///
/// Fails with [`ShieldError::Decryption`] when the input is not valid
/// base64, is too short, was tampered with, or was encrypted under a
/// different key. An empty plaintext decrypts to `""`.
pub fn decrypt(ciphertext: &str, key: &[u8]) -> Result<String> {
    let encrypted_bytes = general_purpose::STANDARD
        .decode(ciphertext)
        .map_err(|e| ShieldError::Decryption(format!("Failed to decode ciphertext: {}", e)))?;

    if encrypted_bytes.len() < AES_GCM_NONCE_SIZE + AES_GCM_TAG_SIZE {
        return Err(ShieldError::Decryption(
            "Ciphertext too short - possible corruption or tampering".to_string(),
        ));
    }

    let cipher = cipher_for(key);
    let (nonce_bytes, sealed) = encrypted_bytes.split_at(AES_GCM_NONCE_SIZE);

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), sealed)
        .map_err(|_| {
            ShieldError::Decryption(
                "Authentication failed - data tampered with or wrong key".to_string(),
            )
        })?;

    String::from_utf8(plaintext)
        .map_err(|e| ShieldError::Decryption(format!("Plaintext is not valid UTF-8: {}", e)))
}

/// Decrypt and interpret the plaintext as JSON, falling back to a raw string
pub fn decrypt_value(ciphertext: &str, key: &[u8]) -> Result<serde_json::Value> {
    let plaintext = decrypt(ciphertext, key)?;
    Ok(parse_structured(plaintext))
}

/// Interpret text as JSON when possible, otherwise keep it as a string
pub(crate) fn parse_structured(text: String) -> serde_json::Value {
    serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
}

/// One-way SHA-256 digest, hex encoded
pub fn hash(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

/// HMAC-SHA256 signature, hex encoded
pub fn sign(data: &str, key: &[u8]) -> Result<String> {
    let mut mac = <HmacSha256 as HmacKeyInit>::new_from_slice(key)
        .map_err(|e| ShieldError::Crypto(format!("Invalid HMAC key: {}", e)))?;

    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify an HMAC-SHA256 signature produced by [`sign`]
pub fn verify_signature(data: &str, mac: &str, key: &[u8]) -> bool {
    match sign(data, key) {
        Ok(expected) => constant_time_eq(expected.as_bytes(), mac.as_bytes()),
        Err(_) => false,
    }
}

/// Constant-time byte comparison.
///
/// Only the length check exits early; length is not secret for fixed-size
/// digests.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a.iter().zip(b.iter()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}

/// Hex string of `length_bytes` cryptographically secure random bytes
pub fn generate_secure_token(length_bytes: usize) -> String {
    let mut bytes = vec![0u8; length_bytes];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Salted password digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct PasswordHash {
    /// Hex-encoded PBKDF2-HMAC-SHA256 output
    pub hash: String,
    /// Salt used for the derivation
    pub salt: String,
}

/// Hash a password with PBKDF2-HMAC-SHA256.
///
/// A random salt is generated when `salt` is `None`. The same password and
/// salt always produce the same hash.
pub fn hash_password(password: &str, salt: Option<&str>) -> Result<PasswordHash> {
    let salt = match salt {
        Some(salt) if !salt.is_empty() => salt.to_string(),
        Some(_) => {
            return Err(ShieldError::Crypto("Password salt must not be empty".to_string()));
        }
        None => generate_secure_token(DEFAULT_SALT_BYTES),
    };

    let mut derived = [0u8; PBKDF2_OUTPUT_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut derived,
    );

    Ok(PasswordHash {
        hash: hex::encode(derived),
        salt,
    })
}

/// Verify a password against a stored hash and salt
pub fn verify_password(password: &str, hash: &str, salt: &str) -> bool {
    match hash_password(password, Some(salt)) {
        Ok(computed) => constant_time_eq(computed.hash.as_bytes(), hash.as_bytes()),
        Err(_) => false,
    }
}

/// Mask a sensitive value, keeping `visible_chars` on each side.
///
/// Values not longer than `2 * visible_chars` are fully masked.
///
/// ```
/// use client_shield::utils::auth::crypto::mask_sensitive_data;
///
/// assert_eq!(mask_sensitive_data("sk-1234567890abcdef", 4), "sk-1****cdef");
/// assert_eq!(mask_sensitive_data("short", 4), "****");
/// ```
pub fn mask_sensitive_data(value: &str, visible_chars: usize) -> String {
    let char_count = value.chars().count();
    if char_count <= visible_chars * 2 {
        return MASK.to_string();
    }

    let head: String = value.chars().take(visible_chars).collect();
    let tail: String = value.chars().skip(char_count - visible_chars).collect();
    format!("{}{}{}", head, MASK, tail)
}

fn is_sensitive_field(name: &str) -> bool {
    let normalized: String = name
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();
    SENSITIVE_FIELDS.iter().any(|field| normalized.contains(field))
}

/// Recursively mask values of sensitive-looking object fields.
///
/// String values are partially masked, anything else under a sensitive key
/// is replaced wholesale.
pub fn mask_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    let masked = if is_sensitive_field(key) {
                        match inner {
                            Value::String(s) => {
                                Value::String(mask_sensitive_data(s, DEFAULT_VISIBLE_CHARS))
                            }
                            _ => Value::String("***MASKED***".to_string()),
                        }
                    } else {
                        mask_sensitive_fields(inner)
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(mask_sensitive_fields).collect()),
        other => other.clone(),
    }
}

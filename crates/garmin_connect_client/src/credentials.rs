//! Loading of the account credentials kept next to the binary.
//!
//! The username lives in a small JSON file (`{"user": "..."}`). The password
//! is stored as raw RSA ciphertext and decrypted with a local PEM private key,
//! so the plaintext never touches disk.

use crate::GarminError;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const LOGIN_FILE: &str = "garmin_login.json";
pub const PRIVATE_KEY_FILE: &str = "rsa_key";
pub const PASSWORD_FILE: &str = "pass.txt";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialPaths {
    pub login: PathBuf,
    pub private_key: PathBuf,
    pub password: PathBuf,
}

impl CredentialPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            login: dir.join(LOGIN_FILE),
            private_key: dir.join(PRIVATE_KEY_FILE),
            password: dir.join(PASSWORD_FILE),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    /// Read both the username and the decrypted password. Files are re-read
    /// on every call.
    pub fn load(paths: &CredentialPaths) -> Result<Self, GarminError> {
        let username = load_username(&paths.login)?;
        let password = load_password(&paths.private_key, &paths.password)?;
        tracing::debug!(user = %username, "credentials loaded");
        Ok(Self { username, password })
    }
}

#[derive(Deserialize)]
struct LoginFile {
    user: Option<String>,
}

pub fn load_username(path: &Path) -> Result<String, GarminError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| GarminError::Config(format!("reading {}: {e}", path.display())))?;
    let parsed: LoginFile = serde_json::from_str(&raw)
        .map_err(|e| GarminError::Config(format!("parsing {}: {e}", path.display())))?;
    match parsed.user.map(|u| u.trim().to_string()) {
        Some(user) if !user.is_empty() => {
            tracing::debug!("username received");
            Ok(user)
        }
        _ => Err(GarminError::Config(format!(
            "{}: missing \"user\" field",
            path.display()
        ))),
    }
}

pub fn load_password(key_path: &Path, cipher_path: &Path) -> Result<SecretString, GarminError> {
    let ciphertext = std::fs::read(cipher_path)
        .map_err(|e| GarminError::Config(format!("reading {}: {e}", cipher_path.display())))?;
    let pem = std::fs::read_to_string(key_path)
        .map_err(|e| GarminError::Config(format!("reading {}: {e}", key_path.display())))?;
    let key = parse_private_key(&pem)?;
    let password = decrypt_password(&key, &ciphertext)?;
    tracing::debug!("password received");
    Ok(password)
}

/// Accepts PKCS#1 (`BEGIN RSA PRIVATE KEY`) and PKCS#8 (`BEGIN PRIVATE KEY`).
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, GarminError> {
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|e| GarminError::Credential(format!("invalid private key: {e}")))
}

pub fn decrypt_password(
    key: &RsaPrivateKey,
    ciphertext: &[u8],
) -> Result<SecretString, GarminError> {
    let plain = key
        .decrypt(Pkcs1v15Encrypt, ciphertext)
        .map_err(|e| GarminError::Credential(format!("decryption failed: {e}")))?;
    let text = String::from_utf8(plain)
        .map_err(|_| GarminError::Credential("decrypted password is not UTF-8".into()))?;
    Ok(SecretString::new(text.into()))
}

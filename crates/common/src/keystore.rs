//! External signer collaborator: resolves the worker's key material by
//! `(network, account)`.
//!
//! The relay never embeds key bytes in its configuration; it asks a
//! [`Keystore`] for the signing key when an attestation needs one. The
//! file-backed implementation reads per-account credential files laid out as
//! `<root>/<network>/<account>.json`.

use std::collections::HashMap;
use std::path::PathBuf;

use ed25519_dalek::SigningKey;
use parking_lot::RwLock;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::crypto::{self, CryptoError};

#[derive(Debug, Error)]
pub enum KeystoreError {
    /// No key material exists for the requested identity.
    #[error("no key found for account {account} on network {network}")]
    KeyUnavailable { network: String, account: String },

    #[error("failed to read credentials file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed credentials file {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// Key material resolver for a worker identity.
pub trait Keystore: Send + Sync {
    /// Return the signing key for `(network, account)`, or
    /// [`KeystoreError::KeyUnavailable`] if none is held.
    fn key_for(&self, network: &str, account: &str) -> Result<SigningKey, KeystoreError>;
}

/// On-disk credentials file: account id plus the hex-encoded combined
/// 64-byte keypair (see [`crate::crypto`]).
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[allow(dead_code)]
    account_id: String,
    keypair: String,
}

/// Keystore reading `<root>/<network>/<account>.json` credential files.
pub struct FileKeystore {
    root: PathBuf,
}

impl FileKeystore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn credentials_path(&self, network: &str, account: &str) -> PathBuf {
        self.root.join(network).join(format!("{}.json", account))
    }
}

impl Keystore for FileKeystore {
    fn key_for(&self, network: &str, account: &str) -> Result<SigningKey, KeystoreError> {
        let path = self.credentials_path(network, account);
        if !path.exists() {
            return Err(KeystoreError::KeyUnavailable {
                network: network.to_string(),
                account: account.to_string(),
            });
        }

        let path_display = path.display().to_string();
        let raw = std::fs::read_to_string(&path).map_err(|source| KeystoreError::Io {
            path: path_display.clone(),
            source,
        })?;

        let creds: CredentialsFile =
            serde_json::from_str(&raw).map_err(|e| {
                warn!("malformed credentials file {}: {}", path_display, e);
                KeystoreError::Malformed {
                    path: path_display.clone(),
                    reason: e.to_string(),
                }
            })?;

        let kp_bytes = hex::decode(creds.keypair.trim()).map_err(|e| {
            warn!("malformed credentials file {}: keypair is not valid hex", path_display);
            KeystoreError::Malformed {
                path: path_display.clone(),
                reason: format!("keypair is not valid hex: {}", e),
            }
        })?;

        crypto::signing_key_from_bytes(&kp_bytes).map_err(|e: CryptoError| {
            warn!("malformed credentials file {}: {}", path_display, e);
            KeystoreError::Malformed {
                path: path_display,
                reason: e.to_string(),
            }
        })
    }
}

/// In-memory keystore for tests and local demos.
#[derive(Default)]
pub struct MemoryKeystore {
    keys: RwLock<HashMap<(String, String), SigningKey>>,
}

impl MemoryKeystore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, network: &str, account: &str, key: SigningKey) {
        self.keys
            .write()
            .insert((network.to_string(), account.to_string()), key);
    }
}

impl Keystore for MemoryKeystore {
    fn key_for(&self, network: &str, account: &str) -> Result<SigningKey, KeystoreError> {
        self.keys
            .read()
            .get(&(network.to_string(), account.to_string()))
            .cloned()
            .ok_or_else(|| KeystoreError::KeyUnavailable {
                network: network.to_string(),
                account: account.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generate_keypair_bytes;

    #[test]
    fn file_keystore_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let network_dir = dir.path().join("testnet");
        std::fs::create_dir_all(&network_dir).expect("mkdir");

        let kp = generate_keypair_bytes();
        let file = serde_json::json!({
            "account_id": "worker.testnet",
            "keypair": hex::encode(&kp),
        });
        std::fs::write(
            network_dir.join("worker.testnet.json"),
            serde_json::to_string(&file).expect("serialize"),
        )
        .expect("write");

        let store = FileKeystore::new(dir.path());
        let key = store.key_for("testnet", "worker.testnet").expect("key");
        assert_eq!(key.to_bytes().as_slice(), &kp[0..32]);
    }

    #[test]
    fn file_keystore_missing_key_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileKeystore::new(dir.path());
        let err = store.key_for("testnet", "ghost.testnet").unwrap_err();
        assert!(matches!(err, KeystoreError::KeyUnavailable { .. }));
    }

    #[test]
    fn file_keystore_rejects_garbage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let network_dir = dir.path().join("testnet");
        std::fs::create_dir_all(&network_dir).expect("mkdir");
        std::fs::write(network_dir.join("worker.testnet.json"), "not json").expect("write");

        let store = FileKeystore::new(dir.path());
        let err = store.key_for("testnet", "worker.testnet").unwrap_err();
        assert!(matches!(err, KeystoreError::Malformed { .. }));
    }

    #[test]
    fn file_keystore_rejects_non_hex_keypair() {
        let dir = tempfile::tempdir().expect("tempdir");
        let network_dir = dir.path().join("testnet");
        std::fs::create_dir_all(&network_dir).expect("mkdir");

        let file = serde_json::json!({
            "account_id": "worker.testnet",
            "keypair": "zz-not-hex",
        });
        std::fs::write(
            network_dir.join("worker.testnet.json"),
            serde_json::to_string(&file).expect("serialize"),
        )
        .expect("write");

        let store = FileKeystore::new(dir.path());
        let err = store.key_for("testnet", "worker.testnet").unwrap_err();
        assert!(matches!(err, KeystoreError::Malformed { .. }));
    }

    #[test]
    fn memory_keystore_lookup() {
        let store = MemoryKeystore::new();
        let kp = generate_keypair_bytes();
        let key = crypto::signing_key_from_bytes(&kp).expect("key");
        store.insert("testnet", "worker.testnet", key);

        assert!(store.key_for("testnet", "worker.testnet").is_ok());
        assert!(matches!(
            store.key_for("testnet", "other.testnet"),
            Err(KeystoreError::KeyUnavailable { .. })
        ));
    }
}

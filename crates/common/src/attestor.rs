//! # Proof Attestor (Pluggable Result Attestation)
//!
//! An attestation binds the worker's identity to a specific settlement
//! payload `job_id|result_commitment|public_output`. Two modes exist:
//!
//! - `Signature`: Ed25519 signature with the worker's on-chain identity key,
//!   fetched from a [`Keystore`]; base64 of the raw 64-byte signature.
//! - `Mac`: HMAC-SHA256 with a pre-shared secret; hex digest. Deterministic
//!   for a fixed `(payload, secret)`.
//!
//! The mode set is closed. An unrecognized mode string fails at parse time
//! rather than silently defaulting.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::Signer as _;
use hmac::{Hmac, Mac as _};
use sha2::Sha256;
use thiserror::Error;

use crate::keystore::{Keystore, KeystoreError};

type HmacSha256 = Hmac<Sha256>;

// ════════════════════════════════════════════════════════════════════════════
// MODE
// ════════════════════════════════════════════════════════════════════════════

/// Closed set of supported attestation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofMode {
    /// Ed25519 signature bound to the worker's identity key.
    Signature,
    /// HMAC-SHA256 bound to a pre-shared secret.
    Mac,
}

impl std::fmt::Display for ProofMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signature => f.write_str("signature"),
            Self::Mac => f.write_str("mac"),
        }
    }
}

impl FromStr for ProofMode {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signature" => Ok(Self::Signature),
            "mac" => Ok(Self::Mac),
            other => Err(AttestError::UnknownMode(other.to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ERROR
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum AttestError {
    /// The keystore holds no key for the configured worker identity.
    #[error("worker key unavailable: {0}")]
    KeyUnavailable(String),

    /// The attestor cannot be built from the supplied configuration.
    #[error("attestor configuration error: {0}")]
    Configuration(String),

    /// The proof mode string is not part of the closed mode set.
    #[error("unknown proof mode {0:?} (expected \"signature\" or \"mac\")")]
    UnknownMode(String),

    #[error(transparent)]
    Keystore(KeystoreError),
}

impl From<KeystoreError> for AttestError {
    fn from(err: KeystoreError) -> Self {
        match err {
            KeystoreError::KeyUnavailable { .. } => Self::KeyUnavailable(err.to_string()),
            other => Self::Keystore(other),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TRAIT
// ════════════════════════════════════════════════════════════════════════════

/// Capability interface for producing an attestation over a settlement
/// payload. One operation; adding a mode means a new implementation, not a
/// string branch.
#[async_trait]
pub trait Attestor: Send + Sync {
    /// Attest over the exact byte payload, returning a transport-safe
    /// proof string.
    async fn attest(&self, payload: &[u8]) -> Result<String, AttestError>;
}

// ════════════════════════════════════════════════════════════════════════════
// SIGNATURE MODE
// ════════════════════════════════════════════════════════════════════════════

/// Signs payloads with the worker's identity key resolved through a
/// [`Keystore`] at attestation time, so key rotation in the store takes
/// effect without restarting the relay.
pub struct KeyAttestor {
    keystore: Arc<dyn Keystore>,
    network: String,
    account: String,
}

impl KeyAttestor {
    pub fn new(keystore: Arc<dyn Keystore>, network: &str, account: &str) -> Self {
        Self {
            keystore,
            network: network.to_string(),
            account: account.to_string(),
        }
    }
}

#[async_trait]
impl Attestor for KeyAttestor {
    async fn attest(&self, payload: &[u8]) -> Result<String, AttestError> {
        let key = self.keystore.key_for(&self.network, &self.account)?;
        let signature = key.sign(payload);
        Ok(BASE64.encode(signature.to_bytes()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MAC MODE
// ════════════════════════════════════════════════════════════════════════════

/// Keyed-hash attestor over a pre-shared secret.
pub struct MacAttestor {
    secret: Vec<u8>,
}

impl MacAttestor {
    /// Build from the configured secret. Fails when no secret is configured;
    /// mac mode without a secret is a configuration error, not a runtime
    /// fallback.
    pub fn new(secret: Option<&str>) -> Result<Self, AttestError> {
        match secret {
            Some(s) if !s.is_empty() => Ok(Self {
                secret: s.as_bytes().to_vec(),
            }),
            _ => Err(AttestError::Configuration(
                "MAC_SECRET is required for mac mode".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Attestor for MacAttestor {
    async fn attest(&self, payload: &[u8]) -> Result<String, AttestError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AttestError::Configuration(e.to_string()))?;
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FACTORY
// ════════════════════════════════════════════════════════════════════════════

/// Build the attestor for a mode. Dispatches on the closed enum; callers
/// parse mode strings through [`ProofMode::from_str`] first.
pub fn attestor_for_mode(
    mode: ProofMode,
    keystore: Arc<dyn Keystore>,
    network: &str,
    account: &str,
    mac_secret: Option<&str>,
) -> Result<Arc<dyn Attestor>, AttestError> {
    match mode {
        ProofMode::Signature => Ok(Arc::new(KeyAttestor::new(keystore, network, account))),
        ProofMode::Mac => Ok(Arc::new(MacAttestor::new(mac_secret)?)),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{generate_keypair_bytes, signing_key_from_bytes, verify_signature};
    use crate::keystore::MemoryKeystore;

    fn keystore_with_key() -> (Arc<MemoryKeystore>, Vec<u8>) {
        let store = Arc::new(MemoryKeystore::new());
        let kp = generate_keypair_bytes();
        let key = signing_key_from_bytes(&kp).expect("key");
        store.insert("testnet", "worker.testnet", key);
        (store, kp)
    }

    #[test]
    fn mode_parsing_is_closed() {
        assert_eq!("signature".parse::<ProofMode>().unwrap(), ProofMode::Signature);
        assert_eq!("mac".parse::<ProofMode>().unwrap(), ProofMode::Mac);
        assert!(matches!(
            "tee_quote".parse::<ProofMode>(),
            Err(AttestError::UnknownMode(_))
        ));
        // Case-sensitive on purpose: "MAC" is not a configured mode.
        assert!("MAC".parse::<ProofMode>().is_err());
    }

    #[tokio::test]
    async fn signature_attestation_verifies_against_worker_key() {
        let (store, kp) = keystore_with_key();
        let attestor = KeyAttestor::new(store, "testnet", "worker.testnet");

        let payload = b"job-1|0xabc|{\"ok\":true}";
        let proof = attestor.attest(payload).await.expect("attest");

        let sig = BASE64.decode(proof).expect("base64");
        assert!(verify_signature(&kp[32..], payload, &sig).expect("verify"));
    }

    #[tokio::test]
    async fn signature_attestation_without_key_fails() {
        let store = Arc::new(MemoryKeystore::new());
        let attestor = KeyAttestor::new(store, "testnet", "ghost.testnet");
        let err = attestor.attest(b"payload").await.unwrap_err();
        assert!(matches!(err, AttestError::KeyUnavailable(_)));
    }

    #[tokio::test]
    async fn mac_attestation_is_deterministic() {
        let attestor = MacAttestor::new(Some("shared-secret")).expect("attestor");
        let p1 = attestor.attest(b"job-1|0xabc|{}").await.expect("attest");
        let p2 = attestor.attest(b"job-1|0xabc|{}").await.expect("attest");
        assert_eq!(p1, p2);

        let other = attestor.attest(b"job-2|0xabc|{}").await.expect("attest");
        assert_ne!(p1, other);
    }

    #[tokio::test]
    async fn mac_attestation_depends_on_secret() {
        let a = MacAttestor::new(Some("secret-a")).expect("attestor");
        let b = MacAttestor::new(Some("secret-b")).expect("attestor");
        assert_ne!(
            a.attest(b"payload").await.expect("attest"),
            b.attest(b"payload").await.expect("attest")
        );
    }

    #[test]
    fn mac_without_secret_is_configuration_error() {
        assert!(matches!(
            MacAttestor::new(None),
            Err(AttestError::Configuration(_))
        ));
        assert!(matches!(
            MacAttestor::new(Some("")),
            Err(AttestError::Configuration(_))
        ));
    }

    #[test]
    fn factory_dispatches_on_mode() {
        let (store, _) = keystore_with_key();
        assert!(attestor_for_mode(
            ProofMode::Signature,
            store.clone(),
            "testnet",
            "worker.testnet",
            None
        )
        .is_ok());
        assert!(attestor_for_mode(
            ProofMode::Mac,
            store,
            "testnet",
            "worker.testnet",
            None
        )
        .is_err());
    }
}

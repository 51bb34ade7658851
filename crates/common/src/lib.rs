//! # Shade Common Crate
//!
//! Shared leaves of the Shade private-computation relay.
//!
//! ## Modules
//! - `types`: wire types shared with the gateway contract
//! - `commitment`: salted commitment codec over canonical JSON
//! - `crypto`: Ed25519 helpers over the 64-byte combined keypair format
//! - `keystore`: external signer collaborator holding worker key material
//! - `attestor`: pluggable proof attestation (signature / MAC)
//! - `gateway`: gateway contract abstraction + HTTP client + mock
//! - `reveal`: commit-reveal records and the reveal verifier
//! - `config`: immutable worker configuration built once at startup
//!
//! ## Gateway Architecture
//! ```text
//! ┌─────────────────┐
//! │     Gateway     │  <- Abstract trait
//! └────────┬────────┘
//!          │
//!    ┌─────┴──────┐
//!    │            │
//! ┌──▼────────┐ ┌─▼──────────┐
//! │HttpGateway│ │MockGateway │
//! └───────────┘ └────────────┘
//! ```

pub mod attestor;
pub mod commitment;
pub mod config;
pub mod crypto;
pub mod gateway;
pub mod keystore;
pub mod mock;
pub mod reveal;
pub mod rpc;
pub mod types;

pub use attestor::{attestor_for_mode, AttestError, Attestor, KeyAttestor, MacAttestor, ProofMode};
pub use config::{ConfigError, WorkerConfig};
pub use gateway::{Gateway, GatewayError};
pub use keystore::{FileKeystore, Keystore, KeystoreError, MemoryKeystore};
pub use mock::MockGateway;
pub use reveal::{verify_reveal, MemoryRevealStore, RevealRecord, RevealStore};
pub use rpc::HttpGateway;
pub use types::{CallOutcome, ExecutionResult, Job, Receipt, RequestJobArgs, ResultSubmission};

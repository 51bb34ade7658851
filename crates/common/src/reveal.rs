//! Commit-reveal records.
//!
//! The relay commits to each job's private result under a fresh per-job
//! salt. The `(private_result, salt)` pair is kept out-of-band in a
//! [`RevealStore`] so a later reveal protocol can hand it to the requester,
//! who verifies it against the on-chain commitment with [`verify_reveal`].

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::commitment;

/// The out-of-band reveal for one settled job.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevealRecord {
    pub job_id: String,
    pub private_result: Value,
    pub salt: String,
}

/// Persistence seam for reveals. The relay writes one record per settled
/// job; the reveal protocol reads them back by job id.
pub trait RevealStore: Send + Sync {
    fn record(&self, reveal: RevealRecord);
    fn reveal(&self, job_id: &str) -> Option<RevealRecord>;
}

/// Process-local store, sufficient for a single worker.
#[derive(Default)]
pub struct MemoryRevealStore {
    records: Mutex<HashMap<String, RevealRecord>>,
}

impl MemoryRevealStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevealStore for MemoryRevealStore {
    fn record(&self, reveal: RevealRecord) {
        self.records.lock().insert(reveal.job_id.clone(), reveal);
    }

    fn reveal(&self, job_id: &str) -> Option<RevealRecord> {
        self.records.lock().get(job_id).cloned()
    }
}

/// Run the commitment codec against a reveal: true iff the revealed
/// `(private_result, salt)` reproduces `expected_commitment`.
pub fn verify_reveal(reveal: &RevealRecord, expected_commitment: &str) -> bool {
    commitment::verify(&reveal.private_result, &reveal.salt, expected_commitment)
}

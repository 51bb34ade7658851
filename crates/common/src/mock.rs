//! In-memory gateway for tests and local demos.
//!
//! `MockGateway` reproduces the contract's observable behavior: hashed job
//! ids, a FIFO pending queue that hides settled jobs, and first-writer-wins
//! settlement: a duplicate `submit_result` for an already-settled job is
//! rejected, not overwritten. Failure injection hooks exist so relay tests
//! can exercise per-job error isolation without a network.

use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::gateway::{Gateway, GatewayError};
use crate::types::{CallOutcome, Job, Receipt, RequestJobArgs, ResultSubmission};

#[derive(Default)]
struct GatewayState {
    jobs: HashMap<String, Job>,
    pending: Vec<String>,
    receipts: HashMap<String, Receipt>,
    fail_submit_for: HashSet<String>,
    nonce: u64,
}

pub struct MockGateway {
    /// Account credited as executor on receipts.
    executor: String,
    /// Account recorded as requester when jobs are created.
    requester: String,
    state: Mutex<GatewayState>,
}

impl MockGateway {
    pub fn new(executor: &str, requester: &str) -> Self {
        Self {
            executor: executor.to_string(),
            requester: requester.to_string(),
            state: Mutex::new(GatewayState::default()),
        }
    }

    /// Make `submit_result` fail once per call for the given job, simulating
    /// a transient contract failure.
    pub fn fail_submit_for(&self, job_id: &str) {
        self.state.lock().fail_submit_for.insert(job_id.to_string());
    }

    /// Number of receipts recorded so far.
    pub fn settled_count(&self) -> usize {
        self.state.lock().receipts.len()
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn request_job(&self, args: &RequestJobArgs) -> Result<CallOutcome, GatewayError> {
        let mut state = self.state.lock();

        // Job id scheme matches the contract: hash(requester|timestamp|nonce).
        let seed = format!("{}|{}|{}", self.requester, Self::now_ms(), state.nonce);
        state.nonce += 1;
        let job_id = hex::encode(Sha256::digest(seed.as_bytes()));

        let job = Job {
            job_id: job_id.clone(),
            program_id: args.program_id.clone(),
            policy_id: args.policy_id.clone(),
            input_commitment: args.input_commitment.clone(),
            public_inputs: args.public_inputs.clone(),
        };
        state.jobs.insert(job_id.clone(), job);
        state.pending.push(job_id.clone());

        // The chain returns the method's string return value JSON-encoded
        // and base64-wrapped in the success envelope.
        Ok(CallOutcome {
            success_value: Some(BASE64.encode(format!("\"{}\"", job_id))),
            logs: vec![format!("JOB_CREATED {}", job_id)],
        })
    }

    async fn get_pending_jobs(&self, limit: u32) -> Result<Vec<Job>, GatewayError> {
        let state = self.state.lock();
        let mut out = Vec::new();
        for id in &state.pending {
            if out.len() as u32 >= limit {
                break;
            }
            if state.receipts.contains_key(id) {
                continue;
            }
            if let Some(job) = state.jobs.get(id) {
                out.push(job.clone());
            }
        }
        Ok(out)
    }

    async fn submit_result(&self, submission: &ResultSubmission) -> Result<(), GatewayError> {
        let mut state = self.state.lock();

        if state.fail_submit_for.remove(&submission.job_id) {
            return Err(GatewayError::Call {
                status: 500,
                message: "injected submit failure".to_string(),
            });
        }

        // Replay protection: first writer wins, duplicates rejected.
        if state.receipts.contains_key(&submission.job_id) {
            return Err(GatewayError::Rejected("already settled".to_string()));
        }
        if !state.jobs.contains_key(&submission.job_id) {
            return Err(GatewayError::Rejected(format!(
                "unknown job_id {}",
                submission.job_id
            )));
        }
        if submission.proof.is_empty() {
            return Err(GatewayError::Rejected("missing proof".to_string()));
        }

        let receipt = Receipt {
            job_id: submission.job_id.clone(),
            executor: self.executor.clone(),
            result_commitment: submission.result_commitment.clone(),
            public_output: submission.public_output.clone(),
            settled_at_ms: Self::now_ms(),
        };
        state.receipts.insert(submission.job_id.clone(), receipt);
        Ok(())
    }

    async fn get_receipt(&self, job_id: &str) -> Result<Option<Receipt>, GatewayError> {
        Ok(self.state.lock().receipts.get(job_id).cloned())
    }
}

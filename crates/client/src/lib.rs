//! Client facade for the Shade gateway.
//!
//! Wraps a [`Gateway`] with the two calls a requesting application needs:
//! submit a job and wait for its settlement receipt. Commitment helpers are
//! re-exported so callers commit their private inputs with the same codec
//! the relay settles with.

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::Value;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::debug;

use shade_common::commitment;
use shade_common::gateway::{Gateway, GatewayError};
use shade_common::types::{CallOutcome, Receipt, RequestJobArgs};

pub use shade_common::reveal::verify_reveal;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The submission call succeeded but its return envelope did not carry
    /// a decodable job id.
    #[error("could not extract job id from submission outcome: {0}")]
    SubmissionParse(String),

    #[error("no receipt for job {job_id} after {waited_ms}ms")]
    Timeout { job_id: String, waited_ms: u64 },
}

/// A job request as the application sees it. `public_inputs` is a JSON
/// value here; the facade serializes it for the wire.
#[derive(Clone, Debug)]
pub struct SubmitJobArgs {
    pub program_id: String,
    pub policy_id: String,
    pub public_inputs: Value,
    pub input_commitment: String,
    pub callback_contract: String,
    pub callback_method: String,
    pub deposit: u128,
}

pub struct ShadeClient {
    gateway: Arc<dyn Gateway>,
}

impl ShadeClient {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Submit a job request and return the assigned job id, extracted from
    /// the call's return envelope.
    pub async fn submit_job(&self, args: &SubmitJobArgs) -> Result<String, ClientError> {
        let outcome = self
            .gateway
            .request_job(&RequestJobArgs {
                program_id: args.program_id.clone(),
                policy_id: args.policy_id.clone(),
                public_inputs: args.public_inputs.to_string(),
                input_commitment: args.input_commitment.clone(),
                callback_contract: args.callback_contract.clone(),
                callback_method: args.callback_method.clone(),
                deposit: args.deposit,
            })
            .await?;

        let job_id = extract_job_id(&outcome)?;
        debug!("submitted job {}", job_id);
        Ok(job_id)
    }

    /// Poll for the job's receipt until it appears or `timeout` elapses.
    /// The timeout bounds total wall-clock wait, not the number of polls.
    pub async fn await_receipt(
        &self,
        job_id: &str,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<Receipt, ClientError> {
        let start = Instant::now();
        loop {
            if start.elapsed() > timeout {
                return Err(ClientError::Timeout {
                    job_id: job_id.to_string(),
                    waited_ms: start.elapsed().as_millis() as u64,
                });
            }
            if let Some(receipt) = self.gateway.get_receipt(job_id).await? {
                return Ok(receipt);
            }
            sleep(poll_interval).await;
        }
    }
}

/// Commit a private input value under a salt, producing the commitment the
/// requester passes to `submit_job`.
pub fn make_input_commitment(value: &Value, salt: &str) -> String {
    commitment::commit(value, salt)
}

/// Check a value and salt against a previously published commitment.
pub fn verify_commitment(value: &Value, salt: &str, expected: &str) -> bool {
    commitment::verify(value, salt, expected)
}

/// The chain base64-encodes the method's return value, and the gateway
/// returns the job id as a JSON string, so the decoded bytes carry quotes.
fn extract_job_id(outcome: &CallOutcome) -> Result<String, ClientError> {
    let raw = outcome
        .success_value
        .as_deref()
        .ok_or_else(|| ClientError::SubmissionParse("empty success value".to_string()))?;
    let bytes = BASE64
        .decode(raw)
        .map_err(|e| ClientError::SubmissionParse(format!("invalid base64: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| ClientError::SubmissionParse(format!("invalid utf-8: {}", e)))?;
    let job_id = text.trim().trim_matches('"').to_string();
    if job_id.is_empty() {
        return Err(ClientError::SubmissionParse(
            "blank job id in success value".to_string(),
        ));
    }
    Ok(job_id)
}

//! Gateway contract abstraction.
//!
//! The gateway brokers job submission, pickup, and settlement. It is an
//! external collaborator; this trait captures exactly the four operations
//! the relay and the client facade depend on. Implementations must not
//! retry internally; retry and error isolation belong to the callers.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{CallOutcome, Job, Receipt, RequestJobArgs, ResultSubmission};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network-level failure reaching the gateway.
    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway endpoint answered with a non-success status.
    #[error("gateway call failed with status {status}: {message}")]
    Call { status: u16, message: String },

    /// The contract itself rejected the call (e.g. replay of a settled job).
    #[error("gateway rejected call: {0}")]
    Rejected(String),
}

/// The gateway contract's interface.
///
/// `request_job` and `submit_result` are state-changing calls performed by
/// the caller's identity; `get_pending_jobs` and `get_receipt` are read-only
/// views with no on-chain side effects.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Create a new job (value-bearing call). The raw call outcome is
    /// returned so the caller can parse the job id out of the envelope.
    async fn request_job(&self, args: &RequestJobArgs) -> Result<CallOutcome, GatewayError>;

    /// Fetch up to `limit` pending jobs. Gateways may over-return; callers
    /// enforce their own cap.
    async fn get_pending_jobs(&self, limit: u32) -> Result<Vec<Job>, GatewayError>;

    /// Settle a job with commitment, public output, and proof.
    async fn submit_result(&self, submission: &ResultSubmission) -> Result<(), GatewayError>;

    /// Fetch the receipt for a settled job, if any.
    async fn get_receipt(&self, job_id: &str) -> Result<Option<Receipt>, GatewayError>;
}

//! Wire types shared between the relay, the client facade, and the gateway
//! contract. Field names match the contract's storage layout; `public_inputs`
//! and `public_output` travel as serialized JSON strings, as the gateway
//! stores them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A pending private-computation job as returned by `get_pending_jobs`.
///
/// Read-only to the relay. `input_commitment` is computed client-side before
/// submission and never recomputed here; the relay trusts the gateway's copy.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Job {
    pub job_id: String,
    pub program_id: String,
    pub policy_id: String,
    pub input_commitment: String,
    /// Serialized JSON map of the job's public inputs.
    pub public_inputs: String,
}

/// The gateway's durable record of a settled job.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    pub job_id: String,
    pub executor: String,
    pub result_commitment: String,
    /// Serialized JSON map disclosed on-chain.
    pub public_output: String,
    pub settled_at_ms: u64,
}

/// Output of one execution of a job's program.
///
/// `public_output` is the only part ever disclosed; `private_result` is
/// hashed into the result commitment and otherwise kept off-chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    pub private_result: Value,
    pub public_output: Value,
}

/// Arguments for the gateway's value-bearing `request_job` call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestJobArgs {
    pub program_id: String,
    pub policy_id: String,
    /// Serialized JSON map of public inputs.
    pub public_inputs: String,
    pub input_commitment: String,
    pub callback_contract: String,
    pub callback_method: String,
    /// Attached value transfer in the chain's base units.
    pub deposit: u128,
}

/// The settlement payload the relay submits for a processed job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultSubmission {
    pub job_id: String,
    pub result_commitment: String,
    pub public_output: String,
    pub proof: String,
}

/// Envelope of a state-changing gateway call.
///
/// The chain returns the method's return value base64-encoded in
/// `success_value`; callers decode it themselves (see the client facade's
/// job-id extraction).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CallOutcome {
    pub success_value: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
}

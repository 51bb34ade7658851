//! Job relay loop.
//!
//! One tick: fetch pending jobs from the gateway, then for each job in
//! order: filter by program registry, execute, commit the private result
//! under a fresh per-job salt, attest over the settlement payload, submit.
//! Commitment strictly precedes attestation because the proof payload
//! includes the commitment.
//!
//! Failure semantics: a failing job is logged and skipped, never retried
//! here; if it is still pending upstream it reappears on a later fetch. A
//! failing tick is logged by the loop and the worker keeps polling.

use std::sync::Arc;

use anyhow::Result;
use rand::Rng;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use shade_common::attestor::Attestor;
use shade_common::commitment;
use shade_common::gateway::Gateway;
use shade_common::reveal::{RevealRecord, RevealStore};
use shade_common::types::{Job, ResultSubmission};

use crate::executor::ExecutorRegistry;

/// Separator joining `job_id`, `result_commitment`, and `public_output`
/// into the attestation payload.
const PROOF_PAYLOAD_SEPARATOR: &str = "|";

pub struct Relay {
    gateway: Arc<dyn Gateway>,
    attestor: Arc<dyn Attestor>,
    programs: ExecutorRegistry,
    reveals: Arc<dyn RevealStore>,
    poll_interval: Duration,
    max_jobs_per_tick: u32,
    shutdown: Arc<Notify>,
}

impl Relay {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<dyn Gateway>,
        attestor: Arc<dyn Attestor>,
        programs: ExecutorRegistry,
        reveals: Arc<dyn RevealStore>,
        poll_interval: Duration,
        max_jobs_per_tick: u32,
        shutdown: Arc<Notify>,
    ) -> Self {
        Self {
            gateway,
            attestor,
            programs,
            reveals,
            poll_interval,
            max_jobs_per_tick,
            shutdown,
        }
    }

    /// Run the relay until shutdown is signalled. Tick errors are logged
    /// and the loop continues after the poll interval; only process
    /// termination stops it.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "relay started: polling every {}ms, up to {} jobs per tick",
                self.poll_interval.as_millis(),
                self.max_jobs_per_tick
            );
            loop {
                tokio::select! {
                    _ = self.shutdown.notified() => {
                        info!("relay shutting down");
                        break;
                    }
                    _ = sleep(self.poll_interval) => {
                        if let Err(e) = self.run_once().await {
                            warn!("relay tick failed: {:#}", e);
                        }
                    }
                }
            }
        })
    }

    /// One fetch-and-process tick.
    pub async fn run_once(&self) -> Result<()> {
        let mut jobs = self.gateway.get_pending_jobs(self.max_jobs_per_tick).await?;
        // The cap holds even if the gateway over-returns.
        jobs.truncate(self.max_jobs_per_tick as usize);

        if jobs.is_empty() {
            return Ok(());
        }
        info!("fetched {} pending job(s)", jobs.len());

        for job in &jobs {
            if !self.programs.contains(&job.program_id) {
                // Stays pending for another tick or another worker.
                info!(
                    "skip job {}: unsupported program {}",
                    job.job_id, job.program_id
                );
                continue;
            }
            // One bad job must not block the rest of the batch.
            if let Err(e) = self.process_job(job).await {
                warn!("job {} failed: {:#}", job.job_id, e);
            }
        }

        Ok(())
    }

    async fn process_job(&self, job: &Job) -> Result<()> {
        info!("processing job {}", job.job_id);

        let executor = self
            .programs
            .get(&job.program_id)
            .ok_or_else(|| anyhow::anyhow!("no executor for program {}", job.program_id))?;

        // Malformed public inputs degrade to an empty object; executors are
        // total over well-formed values.
        let public_inputs: serde_json::Value =
            serde_json::from_str(&job.public_inputs).unwrap_or_else(|_| serde_json::json!({}));

        let result = executor.run(&public_inputs);

        let salt = fresh_salt();
        let result_commitment = commitment::commit(&result.private_result, &salt);
        let public_output = commitment::canonical_json(&result.public_output);

        let payload = [
            job.job_id.as_str(),
            result_commitment.as_str(),
            public_output.as_str(),
        ]
        .join(PROOF_PAYLOAD_SEPARATOR);
        let proof = self.attestor.attest(payload.as_bytes()).await?;

        self.gateway
            .submit_result(&ResultSubmission {
                job_id: job.job_id.clone(),
                result_commitment: result_commitment.clone(),
                public_output,
                proof,
            })
            .await?;

        // Keep the reveal only after settlement went through.
        self.reveals.record(RevealRecord {
            job_id: job.job_id.clone(),
            private_result: result.private_result,
            salt,
        });

        info!("settled job {} -> {}", job.job_id, result_commitment);
        Ok(())
    }
}

/// Fresh random salt per job. The salt lives only in the reveal store; a
/// static process-wide salt would let commitments be correlated across jobs.
fn fresh_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde_json::{json, Value};

    use shade_common::attestor::MacAttestor;
    use shade_common::mock::MockGateway;
    use shade_common::reveal::{verify_reveal, MemoryRevealStore, RevealStore as _};
    use shade_common::types::{ExecutionResult, RequestJobArgs};

    use crate::executor::{DemoExecutor, Executor};

    /// Executor that counts invocations, for filtering assertions.
    struct CountingExecutor {
        calls: AtomicUsize,
    }

    impl CountingExecutor {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Executor for CountingExecutor {
        fn run(&self, _public_inputs: &Value) -> ExecutionResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ExecutionResult {
                private_result: json!({"n": 1}),
                public_output: json!({"ok": true}),
            }
        }
    }

    /// Executor that captures the inputs it was handed.
    struct RecordingExecutor {
        seen: std::sync::Mutex<Option<Value>>,
    }

    impl RecordingExecutor {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: std::sync::Mutex::new(None),
            })
        }
    }

    impl Executor for RecordingExecutor {
        fn run(&self, public_inputs: &Value) -> ExecutionResult {
            *self.seen.lock().unwrap() = Some(public_inputs.clone());
            ExecutionResult {
                private_result: json!({"n": 1}),
                public_output: json!({"ok": true}),
            }
        }
    }

    fn attestor() -> Arc<dyn shade_common::attestor::Attestor> {
        Arc::new(MacAttestor::new(Some("test-secret")).expect("attestor"))
    }

    fn relay_with(
        gateway: Arc<MockGateway>,
        programs: ExecutorRegistry,
        reveals: Arc<MemoryRevealStore>,
        max_jobs: u32,
    ) -> Relay {
        Relay::new(
            gateway,
            attestor(),
            programs,
            reveals,
            Duration::from_millis(10),
            max_jobs,
            Arc::new(Notify::new()),
        )
    }

    async fn create_job(gateway: &MockGateway, program: &str, inputs: Value) -> String {
        create_job_raw(gateway, program, &inputs.to_string()).await
    }

    async fn create_job_raw(gateway: &MockGateway, program: &str, inputs: &str) -> String {
        let outcome = gateway
            .request_job(&RequestJobArgs {
                program_id: program.to_string(),
                policy_id: "policy_v1".to_string(),
                public_inputs: inputs.to_string(),
                input_commitment: "0x00".to_string(),
                callback_contract: "dapp.testnet".to_string(),
                callback_method: "on_private_result".to_string(),
                deposit: 0,
            })
            .await
            .expect("request_job");
        let raw = BASE64
            .decode(outcome.success_value.expect("envelope"))
            .expect("base64");
        String::from_utf8(raw)
            .expect("utf8")
            .trim_matches('"')
            .to_string()
    }

    #[tokio::test]
    async fn unregistered_program_is_never_executed_or_submitted() {
        let gateway = Arc::new(MockGateway::new("worker.testnet", "alice.testnet"));
        create_job(&gateway, "unknown_program", json!({})).await;

        let counting = CountingExecutor::new();
        let mut programs = ExecutorRegistry::new();
        programs.register("demo_v1", counting.clone());

        let reveals = Arc::new(MemoryRevealStore::new());
        let relay = relay_with(gateway.clone(), programs, reveals, 3);
        relay.run_once().await.expect("tick");

        assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
        assert_eq!(gateway.settled_count(), 0);
        // Still pending for a future tick.
        assert_eq!(gateway.get_pending_jobs(10).await.expect("pending").len(), 1);
    }

    #[tokio::test]
    async fn failure_on_one_job_does_not_block_the_batch() {
        let gateway = Arc::new(MockGateway::new("worker.testnet", "alice.testnet"));
        let job_a = create_job(&gateway, "demo_v1", json!({"note": "a"})).await;
        let job_b = create_job(&gateway, "demo_v1", json!({"note": "b"})).await;
        gateway.fail_submit_for(&job_a);

        let mut programs = ExecutorRegistry::new();
        programs.register("demo_v1", Arc::new(DemoExecutor::new("secret:42")));

        let reveals = Arc::new(MemoryRevealStore::new());
        let relay = relay_with(gateway.clone(), programs, reveals, 10);
        relay.run_once().await.expect("tick");

        assert!(gateway.get_receipt(&job_a).await.expect("view").is_none());
        assert!(gateway.get_receipt(&job_b).await.expect("view").is_some());

        // Job A is eligible again on the next tick and settles now.
        relay.run_once().await.expect("tick");
        assert!(gateway.get_receipt(&job_a).await.expect("view").is_some());
    }

    #[tokio::test]
    async fn malformed_public_inputs_degrade_to_empty_object() {
        let gateway = Arc::new(MockGateway::new("worker.testnet", "alice.testnet"));
        let job_id = create_job_raw(&gateway, "demo_v1", "not json").await;

        let recording = RecordingExecutor::new();
        let mut programs = ExecutorRegistry::new();
        programs.register("demo_v1", recording.clone());

        let reveals = Arc::new(MemoryRevealStore::new());
        let relay = relay_with(gateway.clone(), programs, reveals, 3);
        relay.run_once().await.expect("tick");

        // The job still settles; the executor saw `{}`.
        assert!(gateway.get_receipt(&job_id).await.expect("view").is_some());
        assert_eq!(*recording.seen.lock().unwrap(), Some(json!({})));
    }

    #[tokio::test]
    async fn per_tick_cap_is_enforced() {
        let gateway = Arc::new(MockGateway::new("worker.testnet", "alice.testnet"));
        for _ in 0..5 {
            create_job(&gateway, "demo_v1", json!({})).await;
        }

        let mut programs = ExecutorRegistry::new();
        programs.register("demo_v1", Arc::new(DemoExecutor::new("s")));

        let reveals = Arc::new(MemoryRevealStore::new());
        let relay = relay_with(gateway.clone(), programs, reveals, 3);

        relay.run_once().await.expect("tick");
        assert_eq!(gateway.settled_count(), 3);

        relay.run_once().await.expect("tick");
        assert_eq!(gateway.settled_count(), 5);
    }

    #[tokio::test]
    async fn settled_commitment_verifies_against_recorded_reveal() {
        let gateway = Arc::new(MockGateway::new("worker.testnet", "alice.testnet"));
        let job_id = create_job(&gateway, "demo_v1", json!({"note": "hi"})).await;

        let mut programs = ExecutorRegistry::new();
        programs.register("demo_v1", Arc::new(DemoExecutor::new("secret:42")));

        let reveals = Arc::new(MemoryRevealStore::new());
        let relay = relay_with(gateway.clone(), programs, reveals.clone(), 3);
        relay.run_once().await.expect("tick");

        let receipt = gateway
            .get_receipt(&job_id)
            .await
            .expect("view")
            .expect("receipt");
        let reveal = reveals.reveal(&job_id).expect("reveal recorded");
        assert!(verify_reveal(&reveal, &receipt.result_commitment));
        assert_eq!(receipt.public_output, r#"{"ok":true,"score":9}"#);
    }

    #[tokio::test]
    async fn salts_are_fresh_per_job() {
        let gateway = Arc::new(MockGateway::new("worker.testnet", "alice.testnet"));
        let job_a = create_job(&gateway, "demo_v1", json!({})).await;
        let job_b = create_job(&gateway, "demo_v1", json!({})).await;

        let mut programs = ExecutorRegistry::new();
        programs.register("demo_v1", Arc::new(DemoExecutor::new("s")));

        let reveals = Arc::new(MemoryRevealStore::new());
        let relay = relay_with(gateway.clone(), programs, reveals.clone(), 10);
        relay.run_once().await.expect("tick");

        let salt_a = reveals.reveal(&job_a).expect("reveal a").salt;
        let salt_b = reveals.reveal(&job_b).expect("reveal b").salt;
        assert_ne!(salt_a, salt_b);

        // Identical private results, distinct salts: commitments differ.
        let ra = gateway.get_receipt(&job_a).await.expect("view").expect("receipt");
        let rb = gateway.get_receipt(&job_b).await.expect("view").expect("receipt");
        assert_ne!(ra.result_commitment, rb.result_commitment);
    }

    #[tokio::test]
    async fn empty_fetch_is_a_quiet_tick() {
        let gateway = Arc::new(MockGateway::new("worker.testnet", "alice.testnet"));
        let relay = relay_with(
            gateway,
            ExecutorRegistry::new(),
            Arc::new(MemoryRevealStore::new()),
            3,
        );
        relay.run_once().await.expect("tick");
    }
}

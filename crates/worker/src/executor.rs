//! Execution engine: a registry of program executors.
//!
//! The relay is program-agnostic; it looks a job's `program_id` up in the
//! registry and skips jobs it has no executor for. Executors are pure and
//! total: they must not fail for any well-formed `public_inputs` value, and
//! the relay feeds them an empty object when a job's inputs do not parse.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use shade_common::types::ExecutionResult;

/// One private program. `run` maps the job's public inputs to a private
/// result and a public output deterministically.
pub trait Executor: Send + Sync {
    fn run(&self, public_inputs: &Value) -> ExecutionResult;
}

/// Maps `program_id` to its executor.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    programs: HashMap<String, Arc<dyn Executor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, program_id: &str, executor: Arc<dyn Executor>) {
        self.programs.insert(program_id.to_string(), executor);
    }

    pub fn get(&self, program_id: &str) -> Option<Arc<dyn Executor>> {
        self.programs.get(program_id).cloned()
    }

    pub fn contains(&self, program_id: &str) -> bool {
        self.programs.contains_key(program_id)
    }
}

/// The demo program: the private result is the length of a configured
/// secret plus a note echoed from the public inputs; only `{ok, score}` is
/// disclosed.
pub struct DemoExecutor {
    secret: String,
}

impl DemoExecutor {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
        }
    }
}

impl Executor for DemoExecutor {
    fn run(&self, public_inputs: &Value) -> ExecutionResult {
        let note = public_inputs
            .get("note")
            .and_then(Value::as_str)
            .unwrap_or("");
        let score = self.secret.len();

        ExecutionResult {
            private_result: json!({ "score": score, "note": note }),
            public_output: json!({ "ok": true, "score": score }),
        }
    }
}

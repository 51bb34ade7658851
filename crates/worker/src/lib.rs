//! Shade relay worker.
//!
//! - `executor`: program registry and the demo program
//! - `relay`: the polling fetch-execute-commit-attest-submit loop

pub mod executor;
pub mod relay;

pub use executor::{DemoExecutor, Executor, ExecutorRegistry};
pub use relay::Relay;

//! Worker configuration.
//!
//! Built once at startup from environment variables and passed by reference
//! into the relay and client constructors; nothing reads the process
//! environment after startup. Missing identity, credential, or contract
//! configuration is fatal: the binary logs the error and exits non-zero.
//!
//! Required:
//! - `WORKER_ACCOUNT_ID`     - worker's on-chain identity
//! - `WORKER_CREDENTIALS_DIR`- keystore root directory
//! - `GATEWAY_CONTRACT_ID`   - gateway contract account
//!
//! Optional (with defaults):
//! - `SHADE_RPC_URL`         - RPC endpoint (default http://127.0.0.1:3030)
//! - `SHADE_NETWORK_ID`      - network identifier (default testnet)
//! - `POLL_INTERVAL_MS`      - relay poll interval (default 2000)
//! - `MAX_JOBS_PER_TICK`     - per-tick job cap (default 3)
//! - `PROOF_MODE`            - "signature" or "mac" (default signature)
//! - `MAC_SECRET`            - pre-shared secret, required iff mode is mac
//! - `DEMO_PROGRAM_ID`       - program id served by the demo executor
//! - `DEMO_PRIVATE_SECRET`   - demo program's private input
//! - `LOG_LEVEL`             - tracing level (default info)
//! - `USE_MOCK_GATEWAY`      - run against the in-memory gateway

use std::str::FromStr;

use thiserror::Error;

use crate::attestor::ProofMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub rpc_url: String,
    pub network_id: String,
    pub worker_account_id: String,
    pub credentials_dir: String,
    pub gateway_contract_id: String,
    pub poll_interval_ms: u64,
    pub max_jobs_per_tick: u32,
    pub proof_mode: ProofMode,
    pub mac_secret: Option<String>,
    pub demo_program_id: String,
    pub demo_private_secret: String,
    pub log_level: String,
    pub use_mock_gateway: bool,
}

impl WorkerConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup. `from_env` delegates here;
    /// tests feed a map instead of mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| -> Result<String, ConfigError> {
            match lookup(var) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(ConfigError::MissingVar(var)),
            }
        };
        let or_default = |var: &str, default: &str| -> String {
            lookup(var).filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
        };

        let poll_interval_ms = or_default("POLL_INTERVAL_MS", "2000")
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidVar {
                var: "POLL_INTERVAL_MS",
                reason: e.to_string(),
            })?;
        let max_jobs_per_tick = or_default("MAX_JOBS_PER_TICK", "3")
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidVar {
                var: "MAX_JOBS_PER_TICK",
                reason: e.to_string(),
            })?;
        let proof_mode = ProofMode::from_str(&or_default("PROOF_MODE", "signature"))
            .map_err(|e| ConfigError::InvalidVar {
                var: "PROOF_MODE",
                reason: e.to_string(),
            })?;
        let use_mock_gateway = lookup("USE_MOCK_GATEWAY")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            rpc_url: or_default("SHADE_RPC_URL", "http://127.0.0.1:3030"),
            network_id: or_default("SHADE_NETWORK_ID", "testnet"),
            worker_account_id: required("WORKER_ACCOUNT_ID")?,
            credentials_dir: required("WORKER_CREDENTIALS_DIR")?,
            gateway_contract_id: required("GATEWAY_CONTRACT_ID")?,
            poll_interval_ms,
            max_jobs_per_tick,
            proof_mode,
            mac_secret: lookup("MAC_SECRET").filter(|s| !s.is_empty()),
            demo_program_id: or_default("DEMO_PROGRAM_ID", "demo_v1"),
            demo_private_secret: or_default("DEMO_PRIVATE_SECRET", "secret:42"),
            log_level: or_default("LOG_LEVEL", "info"),
            use_mock_gateway,
        })
    }

    /// Cross-field validation. Any violation is a fatal startup error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidVar {
                var: "POLL_INTERVAL_MS",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_jobs_per_tick == 0 {
            return Err(ConfigError::InvalidVar {
                var: "MAX_JOBS_PER_TICK",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.proof_mode == ProofMode::Mac && self.mac_secret.is_none() {
            return Err(ConfigError::MissingVar("MAC_SECRET"));
        }
        Ok(())
    }
}

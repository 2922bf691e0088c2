//! Engine configuration (code > env).

use crate::error::{Result, WeirError};

/// Tunables for turn execution and persistence.
#[derive(Debug, Clone)]
pub struct WeirConfig {
    /// Fail the upstream model stream if no delta arrives within this window.
    /// Zero disables the idle timeout.
    pub stream_idle_timeout_ms: u64,
    /// Minimum spacing between mid-stream checkpoint upserts of the growing
    /// assistant message. Zero disables checkpoints.
    pub checkpoint_interval_ms: u64,
    /// Cap on model round-trips within one turn (each tool-calling step
    /// feeds results back for a follow-up completion).
    pub max_tool_iterations: usize,
    /// How many prior messages to load from the store when building the
    /// model prompt. `None` loads the full thread.
    pub history_limit: Option<usize>,
}

impl Default for WeirConfig {
    fn default() -> Self {
        Self {
            stream_idle_timeout_ms: 120_000,
            checkpoint_interval_ms: 500,
            max_tool_iterations: 10,
            history_limit: Some(100),
        }
    }
}

impl WeirConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// Recognized: `WEIR_STREAM_IDLE_TIMEOUT_MS`, `WEIR_CHECKPOINT_INTERVAL_MS`,
    /// `WEIR_MAX_TOOL_ITERATIONS`, `WEIR_HISTORY_LIMIT`.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();

        if let Some(v) = env_u64("WEIR_STREAM_IDLE_TIMEOUT_MS")? {
            config.stream_idle_timeout_ms = v;
        }
        if let Some(v) = env_u64("WEIR_CHECKPOINT_INTERVAL_MS")? {
            config.checkpoint_interval_ms = v;
        }
        if let Some(v) = env_u64("WEIR_MAX_TOOL_ITERATIONS")? {
            config.max_tool_iterations = v as usize;
        }
        if let Some(v) = env_u64("WEIR_HISTORY_LIMIT")? {
            config.history_limit = (v > 0).then_some(v as usize);
        }

        Ok(config)
    }
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| WeirError::Configuration(format!("{name} must be an integer, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}

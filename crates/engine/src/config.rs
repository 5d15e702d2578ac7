use std::time::Duration;

/// Engine configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development; override
/// via environment variables in production.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum seconds between successful stat recomputes of the same
    /// version (default: `120`).
    pub stats_throttle_secs: u64,
    /// How often the pending-version sweep runs, in seconds
    /// (default: `300`).
    pub pending_sweep_interval_secs: u64,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default |
    /// |-------------------------------|---------|
    /// | `STATS_THROTTLE_SECS`         | `120`   |
    /// | `PENDING_SWEEP_INTERVAL_SECS` | `300`   |
    pub fn from_env() -> Self {
        let stats_throttle_secs: u64 = std::env::var("STATS_THROTTLE_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("STATS_THROTTLE_SECS must be a valid u64");

        let pending_sweep_interval_secs: u64 = std::env::var("PENDING_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("PENDING_SWEEP_INTERVAL_SECS must be a valid u64");

        Self {
            stats_throttle_secs,
            pending_sweep_interval_secs,
        }
    }

    /// The stat-recompute throttle window.
    pub fn stats_throttle(&self) -> Duration {
        Duration::from_secs(self.stats_throttle_secs)
    }

    /// The pending-sweep poll interval.
    pub fn pending_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.pending_sweep_interval_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stats_throttle_secs: 120,
            pending_sweep_interval_secs: 300,
        }
    }
}

//! Public share configuration.

use serde::{Deserialize, Serialize};

/// Settings for time-bounded public shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// How long a share stays public.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
    /// Extra delay added to the one-shot expiry timer.
    #[serde(default = "default_timer_buffer")]
    pub timer_buffer_ms: u64,
    /// Cron expression for the background sweep of expired shares.
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            timer_buffer_ms: default_timer_buffer(),
            sweep_cron: default_sweep_cron(),
        }
    }
}

impl ShareConfig {
    /// Share lifetime as a chrono duration.
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours)
    }
}

fn default_ttl_hours() -> i64 {
    24
}

fn default_timer_buffer() -> u64 {
    2_000
}

fn default_sweep_cron() -> String {
    // every 10 minutes
    "0 */10 * * * *".to_string()
}

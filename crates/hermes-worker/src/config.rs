//! Worker configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Upper bound on a single synthesis attempt
    pub task_timeout: Duration,
    /// Synthesis attempts per task
    pub max_retries: u32,
    /// Linear backoff unit between attempts
    pub retry_base_delay: Duration,
    /// Root that task file and output paths are relative to
    pub uploads_root: PathBuf,
    /// Grace period for in-flight deliveries on shutdown
    pub shutdown_timeout: Duration,
    /// Prometheus exporter listen address
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            uploads_root: PathBuf::from("/uploads"),
            shutdown_timeout: Duration::from_secs(60),
            metrics_addr: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            task_timeout: std::env::var("TASK_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.task_timeout),
            max_retries: std::env::var("MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_retries),
            retry_base_delay: std::env::var("RETRY_BASE_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            uploads_root: std::env::var("UPLOADS_VOLUME")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_root),
            shutdown_timeout: std::env::var("SHUTDOWN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
            metrics_addr: std::env::var("METRICS_ADDR")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }
}

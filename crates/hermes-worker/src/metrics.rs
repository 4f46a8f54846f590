//! Prometheus metrics for task processing.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

/// Install the Prometheus recorder with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const TASKS_COMPLETED_TOTAL: &str = "hermes_tasks_completed_total";
    pub const TASKS_FAILED_TOTAL: &str = "hermes_tasks_failed_total";
    pub const TASK_ATTEMPTS_TOTAL: &str = "hermes_task_attempts_total";
    pub const TASK_DURATION_SECONDS: &str = "hermes_task_duration_seconds";
    pub const MESSAGES_REQUEUED_TOTAL: &str = "hermes_messages_requeued_total";
}

/// Record one synthesis attempt.
pub fn record_attempt(task_type: &str) {
    counter!(names::TASK_ATTEMPTS_TOTAL, "task_type" => task_type.to_string()).increment(1);
}

/// Record a task that reached `completed`.
pub fn record_task_completed(task_type: &str, duration_secs: f64) {
    counter!(names::TASKS_COMPLETED_TOTAL, "task_type" => task_type.to_string()).increment(1);
    histogram!(names::TASK_DURATION_SECONDS, "task_type" => task_type.to_string())
        .record(duration_secs);
}

/// Record a task that reached `failed`.
pub fn record_task_failed(task_type: &str, duration_secs: f64) {
    counter!(names::TASKS_FAILED_TOTAL, "task_type" => task_type.to_string()).increment(1);
    histogram!(names::TASK_DURATION_SECONDS, "task_type" => task_type.to_string())
        .record(duration_secs);
}

/// Record a delivery rejected for redelivery.
pub fn record_requeue() {
    counter!(names::MESSAGES_REQUEUED_TOTAL).increment(1);
}

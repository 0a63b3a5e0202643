//! Metrics definitions for relay routing monitoring.

/// Label for node ID in metrics.
pub const NODE_ID_LABEL: &str = "node_id";

/// Label for resource key in metrics.
pub const RESOURCE_LABEL: &str = "resource";

/// Gauge for the duration of the last ready-queue refresh in milliseconds.
pub const RELAY_READY_QUEUE_REFRESH_DURATION_MS: &str = "relay_ready_queue_refresh_duration_ms";

/// Counter for total ready-queue refresh failures.
pub const RELAY_READY_QUEUE_REFRESH_FAILURES_TOTAL: &str =
    "relay_ready_queue_refresh_failures_total";

/// Counter for admissions rejected after the retry budget was exhausted.
pub const RELAY_ADMISSION_REJECTIONS_TOTAL: &str = "relay_admission_rejections_total";

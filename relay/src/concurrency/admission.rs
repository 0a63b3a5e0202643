use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::counter;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::AdmissionConfig;
use crate::error::RelayResult;
use crate::metrics::{RELAY_ADMISSION_REJECTIONS_TOTAL, RESOURCE_LABEL};

/// Outcome of an [`AdmissionGate::admit`] call.
///
/// Rejection is an explicit capacity signal, not an error: callers map it to a "busy,
/// retry later" response so clients back off instead of treating it as fatal.
#[derive(Debug, PartialEq, Eq)]
pub enum Admission<T> {
    /// The work was admitted and ran to completion.
    Admitted(T),
    /// The resource stayed at capacity through the retry budget; the work never ran.
    Rejected,
}

impl<T> Admission<T> {
    /// Returns `true` when the work was admitted and ran.
    pub fn did_run(&self) -> bool {
        matches!(self, Admission::Admitted(_))
    }
}

/// Bounded-concurrency admission control per logical resource key.
///
/// [`AdmissionGate`] counts in-flight operations per resource and admits new work only
/// while the count is under the configured limit. Callers that find the resource at
/// capacity sleep a configured backoff and re-check, a bounded number of times, before
/// being rejected. The blocking backoff is intentional backpressure: excess demand is
/// converted into bounded added latency before outright rejection.
///
/// Counters for distinct keys are independent; instances are cheap to clone and share
/// one ledger.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    in_flight: Arc<Mutex<HashMap<String, usize>>>,
    config: AdmissionConfig,
}

impl AdmissionGate {
    /// Creates a gate with no in-flight work.
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Returns the current in-flight count for a resource key.
    pub fn in_flight(&self, resource: &str) -> usize {
        let in_flight = self.in_flight.lock().unwrap();
        in_flight.get(resource).copied().unwrap_or(0)
    }

    /// Runs `work` if the resource is under its concurrency limit.
    ///
    /// The in-flight counter is incremented before the work starts and released on every
    /// exit path, including a failure propagated out of `work`. When the resource stays
    /// at capacity through the whole retry budget, the call returns
    /// [`Admission::Rejected`] without running the work.
    pub async fn admit<F, Fut, T>(&self, resource: &str, work: F) -> RelayResult<Admission<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RelayResult<T>>,
    {
        let Some(_slot) = self.acquire_slot(resource).await else {
            counter!(
                RELAY_ADMISSION_REJECTIONS_TOTAL,
                RESOURCE_LABEL => resource.to_string()
            )
            .increment(1);
            warn!(
                resource = %resource,
                max_concurrent = self.config.max_concurrent,
                "resource stayed at capacity through the retry budget, rejecting admission"
            );

            return Ok(Admission::Rejected);
        };

        // The slot releases the counter when it drops, also when `work` fails.
        let value = work().await?;

        Ok(Admission::Admitted(value))
    }

    /// Attempts to reserve an in-flight slot, re-checking with backoff while the
    /// resource is at capacity.
    async fn acquire_slot(&self, resource: &str) -> Option<InFlightSlot> {
        let backoff = Duration::from_millis(self.config.retry_backoff_ms);

        for attempt in 0..=self.config.max_retries {
            {
                let mut in_flight = self.in_flight.lock().unwrap();
                let count = in_flight.entry(resource.to_string()).or_insert(0);

                if *count < self.config.max_concurrent {
                    *count += 1;

                    return Some(InFlightSlot {
                        in_flight: self.in_flight.clone(),
                        resource: resource.to_string(),
                    });
                }
            }

            if attempt < self.config.max_retries {
                debug!(
                    resource = %resource,
                    attempt,
                    "resource at capacity, backing off before re-checking"
                );
                sleep(backoff).await;
            }
        }

        None
    }
}

/// RAII reservation of one in-flight slot; releases the counter on drop.
#[derive(Debug)]
struct InFlightSlot {
    in_flight: Arc<Mutex<HashMap<String, usize>>>,
    resource: String,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap();

        if let Some(count) = in_flight.get_mut(&self.resource) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                in_flight.remove(&self.resource);
            }
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::bail;
use crate::error::{ErrorKind, RelayResult};
use crate::routing::readiness::NodeReadiness;
use crate::store::base::{BatchStore, ChannelStore};
use crate::types::{ChangeEvent, ChannelConfig, ChannelId, NodeId};

/// Internal storage for the in-memory store.
#[derive(Debug, Default)]
struct Inner {
    channels: HashMap<ChannelId, ChannelConfig>,
    readiness: HashMap<NodeId, NodeReadiness>,
    pending: HashMap<(NodeId, ChannelId), Vec<ChangeEvent>>,
    channel_reads: usize,
    readiness_reads: usize,
    fail_next_readiness: bool,
}

/// In-memory channel and batch store for testing and development purposes.
///
/// [`MemoryStore`] holds channel configuration, per-node readiness records, and pending
/// change events in memory, and counts backend reads so tests can verify caching
/// behavior. All data is lost when the process terminates.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates a new empty memory store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Inserts or replaces a channel configuration.
    pub async fn insert_channel(&self, channel: ChannelConfig) {
        let mut inner = self.inner.lock().await;
        inner.channels.insert(channel.id.clone(), channel);
    }

    /// Removes a channel configuration.
    pub async fn remove_channel(&self, channel_id: &str) {
        let mut inner = self.inner.lock().await;
        inner.channels.remove(channel_id);
    }

    /// Sets the readiness record reported for a node.
    pub async fn set_node_readiness(&self, readiness: NodeReadiness) {
        let mut inner = self.inner.lock().await;
        inner
            .readiness
            .insert(readiness.node_id().to_string(), readiness);
    }

    /// Appends a pending change event for a node, keyed by the event's channel.
    pub async fn push_pending_event(&self, node_id: &str, event: ChangeEvent) {
        let mut inner = self.inner.lock().await;
        inner
            .pending
            .entry((node_id.to_string(), event.channel_id.clone()))
            .or_default()
            .push(event);
    }

    /// Returns how many times the channel configuration was read.
    pub async fn channel_reads(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.channel_reads
    }

    /// Returns how many times the readiness records were read.
    pub async fn readiness_reads(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.readiness_reads
    }

    /// Makes the next readiness query fail, for failure-path tests.
    ///
    /// The switch resets after one failed query.
    pub async fn fail_next_readiness_query(&self) {
        let mut inner = self.inner.lock().await;
        inner.fail_next_readiness = true;
    }
}

impl ChannelStore for MemoryStore {
    async fn get_channels(
        &self,
        _force_reload: bool,
    ) -> RelayResult<HashMap<ChannelId, ChannelConfig>> {
        let mut inner = self.inner.lock().await;
        inner.channel_reads += 1;

        Ok(inner.channels.clone())
    }
}

impl BatchStore for MemoryStore {
    async fn get_ready_channels(&self) -> RelayResult<HashMap<NodeId, NodeReadiness>> {
        let mut inner = self.inner.lock().await;
        inner.readiness_reads += 1;

        if inner.fail_next_readiness {
            inner.fail_next_readiness = false;
            bail!(
                ErrorKind::ReadinessQueryFailed,
                "Injected readiness query failure"
            );
        }

        Ok(inner.readiness.clone())
    }

    async fn take_pending_events(
        &self,
        node_id: &str,
        channel_id: &str,
        limit: usize,
    ) -> RelayResult<Vec<ChangeEvent>> {
        let mut inner = self.inner.lock().await;

        let Some(pending) = inner
            .pending
            .get_mut(&(node_id.to_string(), channel_id.to_string()))
        else {
            return Ok(Vec::new());
        };

        let taken = pending.drain(..limit.min(pending.len())).collect();
        Ok(taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::change_event;

    #[tokio::test]
    async fn takes_pending_events_in_capture_order_up_to_the_limit() {
        let store = MemoryStore::new();
        for id in 1..=3 {
            store
                .push_pending_event("n1", change_event(id, "sales", "t1"))
                .await;
        }

        let first = store.take_pending_events("n1", "sales", 2).await.unwrap();
        assert_eq!(
            first.iter().map(|e| e.event_id).collect::<Vec<_>>(),
            [1, 2]
        );

        let rest = store.take_pending_events("n1", "sales", 10).await.unwrap();
        assert_eq!(rest.iter().map(|e| e.event_id).collect::<Vec<_>>(), [3]);

        let empty = store.take_pending_events("n1", "sales", 10).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn injected_readiness_failure_resets_after_one_query() {
        let store = MemoryStore::new();
        store.fail_next_readiness_query().await;

        let err = store.get_ready_channels().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReadinessQueryFailed);

        assert!(store.get_ready_channels().await.is_ok());
        assert_eq!(store.readiness_reads().await, 2);
    }
}

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, gauge};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error, warn};

use crate::config::CacheConfig;
use crate::error::RelayResult;
use crate::metrics::{
    RELAY_READY_QUEUE_REFRESH_DURATION_MS, RELAY_READY_QUEUE_REFRESH_FAILURES_TOTAL,
};
use crate::routing::queue_name::QueueName;
use crate::store::base::{BatchStore, ChannelStore};
use crate::types::NodeId;

/// A point-in-time view of which queues have undelivered work, keyed by node.
///
/// Snapshots are immutable and shared: every reader of the same refresh cycle holds the
/// same allocation.
pub type ReadyQueueSnapshot = Arc<HashMap<NodeId, HashSet<String>>>;

/// Internal storage for the ready-queue cache.
#[derive(Debug)]
struct Inner {
    snapshot: ReadyQueueSnapshot,
    last_refreshed_at: Option<Instant>,
}

/// Time-bounded cache of ready queues per node.
///
/// [`ReadyQueueCache`] answers "which queues currently have work" without hitting the
/// batch store on every call. A snapshot older than the configured TTL is rebuilt from
/// the channel configuration and the batch store's readiness records; at most one
/// rebuild runs at a time, and callers that lose the permit race keep reading the
/// existing snapshot instead of waiting. Routing tolerates a few seconds of staleness,
/// but must never stall under load.
///
/// Queue names are derived per the channel's queue class: a reload-class channel with
/// ready worker partitions emits one synthetic `base#partition` name per partition,
/// every other channel emits its bare name. Channels absent from (or disabled in) the
/// configuration snapshot are never emitted, even if the batch store still reports them
/// ready.
#[derive(Debug, Clone)]
pub struct ReadyQueueCache<C, B> {
    inner: Arc<Mutex<Inner>>,
    refresh_permit: Arc<Semaphore>,
    channel_store: C,
    batch_store: B,
    config: CacheConfig,
}

impl<C, B> ReadyQueueCache<C, B>
where
    C: ChannelStore,
    B: BatchStore,
{
    /// Creates a cache with an empty snapshot that refreshes on first read.
    pub fn new(channel_store: C, batch_store: B, config: CacheConfig) -> Self {
        let inner = Inner {
            snapshot: Arc::new(HashMap::new()),
            last_refreshed_at: None,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
            refresh_permit: Arc::new(Semaphore::new(1)),
            channel_store,
            batch_store,
            config,
        }
    }

    /// Returns the current ready-queue snapshot, refreshing it when stale.
    ///
    /// A refresh is attempted when `force_refresh` is set, when the cache has never been
    /// populated, or when the last refresh is older than the configured TTL. At most one
    /// refresh runs system-wide: a caller that finds another refresh in flight returns
    /// immediately with the existing, possibly stale, snapshot.
    pub async fn ready_queues(&self, force_refresh: bool) -> ReadyQueueSnapshot {
        let needs_refresh = force_refresh || {
            let inner = self.inner.lock().await;
            match inner.last_refreshed_at {
                None => true,
                Some(at) => at.elapsed() >= self.ttl(),
            }
        };

        if needs_refresh {
            match self.refresh_permit.clone().try_acquire_owned() {
                Ok(_permit) => self.refresh().await,
                Err(_) => {
                    debug!("ready-queue refresh already in progress, serving existing snapshot");
                }
            }
        }

        let inner = self.inner.lock().await;
        inner.snapshot.clone()
    }

    fn ttl(&self) -> Duration {
        Duration::from_millis(self.config.ttl_ms)
    }

    /// Runs one refresh cycle and swaps the rebuilt snapshot in.
    ///
    /// A failed rebuild keeps the previous snapshot. Whether it still advances the
    /// freshness timestamp is controlled by [`CacheConfig::advance_ttl_on_failure`]:
    /// advancing it bounds retry pressure to once per TTL window when the readiness
    /// source is down.
    async fn refresh(&self) {
        let started_at = Instant::now();

        match self.build_snapshot().await {
            Ok(snapshot) => {
                let elapsed = started_at.elapsed();
                gauge!(RELAY_READY_QUEUE_REFRESH_DURATION_MS).set(elapsed.as_millis() as f64);

                if elapsed >= self.ttl() {
                    warn!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        ttl_ms = self.config.ttl_ms,
                        "ready-queue refresh took longer than its TTL, the readiness query is \
                         competing with its own cache interval"
                    );
                }

                let mut inner = self.inner.lock().await;
                inner.snapshot = Arc::new(snapshot);
                inner.last_refreshed_at = Some(Instant::now());
            }
            Err(err) => {
                counter!(RELAY_READY_QUEUE_REFRESH_FAILURES_TOTAL).increment(1);
                error!(
                    error = %err,
                    "ready-queue refresh failed, keeping the previous snapshot"
                );

                if self.config.advance_ttl_on_failure {
                    let mut inner = self.inner.lock().await;
                    inner.last_refreshed_at = Some(Instant::now());
                }
            }
        }
    }

    /// Rebuilds the node → ready-queue mapping from the stores.
    async fn build_snapshot(&self) -> RelayResult<HashMap<NodeId, HashSet<String>>> {
        let channels = self.channel_store.get_channels(false).await?;
        let readiness = self.batch_store.get_ready_channels().await?;

        let mut snapshot = HashMap::new();
        for (node_id, node) in readiness {
            let mut queues = HashSet::new();

            for channel_id in node.channels() {
                let Some(channel) = channels.get(channel_id) else {
                    debug!(
                        node = %node_id,
                        channel = %channel_id,
                        "ready channel is not configured, skipping"
                    );
                    continue;
                };

                if !channel.enabled {
                    debug!(node = %node_id, channel = %channel_id, "ready channel is disabled, skipping");
                    continue;
                }

                if channel.is_reload_class() && !node.partitions().is_empty() {
                    for partition in node.partitions() {
                        queues.insert(QueueName::partitioned(channel_id.clone(), *partition).to_string());
                    }
                } else {
                    queues.insert(channel_id.clone());
                }
            }

            if !queues.is_empty() {
                snapshot.insert(node_id, queues);
            }
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tokio::sync::Notify;

    use super::*;
    use crate::routing::readiness::NodeReadiness;
    use crate::store::memory::MemoryStore;
    use crate::test_utils::channel;

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_channel(channel("sales", "default", 100))
            .await;
        store
            .insert_channel(channel("reload", "reload", 100))
            .await;
        store
    }

    fn cache_with(store: &MemoryStore, config: CacheConfig) -> ReadyQueueCache<MemoryStore, MemoryStore> {
        ReadyQueueCache::new(store.clone(), store.clone(), config)
    }

    #[tokio::test]
    async fn reload_class_channel_emits_one_queue_per_ready_partition() {
        let store = seeded_store().await;
        let mut readiness = NodeReadiness::new("n1");
        readiness.add_partitioned_channel("reload", 1);
        readiness.add_partitioned_channel("reload", 2);
        store.set_node_readiness(readiness).await;

        let cache = cache_with(&store, CacheConfig::default());
        let snapshot = cache.ready_queues(false).await;

        let queues = snapshot.get("n1").unwrap();
        assert_eq!(queues.len(), 2);
        assert!(queues.contains("reload#1"));
        assert!(queues.contains("reload#2"));
        assert!(!queues.contains("reload"));
    }

    #[tokio::test]
    async fn non_reload_channel_emits_its_bare_name() {
        let store = seeded_store().await;
        let mut readiness = NodeReadiness::new("n1");
        readiness.add_channel("sales");
        store.set_node_readiness(readiness).await;

        let cache = cache_with(&store, CacheConfig::default());
        let snapshot = cache.ready_queues(false).await;

        assert_eq!(
            snapshot.get("n1").unwrap().iter().collect::<Vec<_>>(),
            ["sales"]
        );
    }

    #[tokio::test]
    async fn unconfigured_and_disabled_channels_are_never_emitted() {
        let store = seeded_store().await;
        let mut disabled = channel("archive", "default", 100);
        disabled.enabled = false;
        store.insert_channel(disabled).await;

        let mut readiness = NodeReadiness::new("n1");
        readiness.add_channel("sales");
        readiness.add_channel("dropped");
        readiness.add_channel("archive");
        store.set_node_readiness(readiness).await;

        let cache = cache_with(&store, CacheConfig::default());
        let snapshot = cache.ready_queues(false).await;

        assert_eq!(
            snapshot.get("n1").unwrap().iter().collect::<Vec<_>>(),
            ["sales"]
        );
    }

    #[tokio::test]
    async fn reads_within_the_ttl_share_one_snapshot_without_a_second_query() {
        let store = seeded_store().await;
        let mut readiness = NodeReadiness::new("n1");
        readiness.add_channel("sales");
        store.set_node_readiness(readiness).await;

        let cache = cache_with(&store, CacheConfig::default());
        let first = cache.ready_queues(false).await;
        let second = cache.ready_queues(false).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.readiness_reads().await, 1);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_the_ttl() {
        let store = seeded_store().await;
        let cache = cache_with(&store, CacheConfig::default());

        cache.ready_queues(false).await;
        cache.ready_queues(true).await;

        assert_eq!(store.readiness_reads().await, 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot_and_advances_the_timestamp() {
        let store = seeded_store().await;
        let mut readiness = NodeReadiness::new("n1");
        readiness.add_channel("sales");
        store.set_node_readiness(readiness).await;

        let cache = cache_with(&store, CacheConfig::default());
        let populated = cache.ready_queues(false).await;
        assert!(populated.contains_key("n1"));

        store.fail_next_readiness_query().await;
        let after_failure = cache.ready_queues(true).await;
        assert!(Arc::ptr_eq(&populated, &after_failure));

        // The failed refresh advanced the timestamp, so a read within the TTL does not
        // hit the store again.
        cache.ready_queues(false).await;
        assert_eq!(store.readiness_reads().await, 2);
    }

    #[tokio::test]
    async fn fail_closed_configuration_retries_on_the_next_read() {
        let store = seeded_store().await;
        let config = CacheConfig {
            advance_ttl_on_failure: false,
            ..CacheConfig::default()
        };
        let cache = cache_with(&store, config);

        store.fail_next_readiness_query().await;
        cache.ready_queues(false).await;

        // The timestamp was not advanced, so the next read refreshes again.
        cache.ready_queues(false).await;
        assert_eq!(store.readiness_reads().await, 2);
    }

    /// Batch store whose readiness query blocks until released, to hold a refresh open.
    #[derive(Clone)]
    struct GatedBatchStore {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl BatchStore for GatedBatchStore {
        async fn get_ready_channels(&self) -> RelayResult<HashMap<NodeId, NodeReadiness>> {
            self.entered.notify_one();
            self.release.notified().await;

            let mut readiness = NodeReadiness::new("n1");
            readiness.add_channel("sales");
            Ok(HashMap::from([("n1".to_string(), readiness)]))
        }

        async fn take_pending_events(
            &self,
            _node_id: &str,
            _channel_id: &str,
            _limit: usize,
        ) -> RelayResult<Vec<crate::types::ChangeEvent>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn concurrent_reads_do_not_wait_for_an_in_flight_refresh() {
        let store = seeded_store().await;
        let gated = GatedBatchStore {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };

        let cache = ReadyQueueCache::new(store.clone(), gated.clone(), CacheConfig::default());

        let refreshing = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.ready_queues(false).await })
        };

        // Wait until the first caller is inside the readiness query, holding the permit.
        gated.entered.notified().await;

        // A concurrent read returns immediately with the prior (empty) snapshot.
        let stale = cache.ready_queues(false).await;
        assert!(stale.is_empty());

        gated.release.notify_one();
        let fresh = refreshing.await.unwrap();
        assert!(fresh.contains_key("n1"));
    }
}

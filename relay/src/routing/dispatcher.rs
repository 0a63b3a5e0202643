use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::config::CacheConfig;
use crate::error::RelayResult;
use crate::routing::batch::{BatchAssembler, BatchCompletionPolicy};
use crate::routing::cache::ReadyQueueCache;
use crate::routing::queue_name::QueueName;
use crate::store::base::{BatchStore, ChannelStore};
use crate::types::SealedBatch;

/// How many batches' worth of pending events one dispatch run reads ahead per channel.
const PEEK_AHEAD_FACTOR: usize = 10;

/// A sealed batch assigned to the queue a worker thread will pull it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedBatch {
    /// The queue the batch was routed to, carrying the partition suffix for
    /// reload-class channels.
    pub queue: String,
    /// The sealed batch itself.
    pub batch: SealedBatch,
}

/// Routes pending change events for a node into sealed, queue-assigned batches.
///
/// One dispatch run asks the ready-queue cache which queues currently have work, groups
/// the queue names back to their base channels, drains each channel's pending events,
/// and cuts them into batches with the configured completion policy. Batches of a
/// partitioned channel are spread across its ready partition queues so a pool of worker
/// threads can process them in parallel.
#[derive(Debug, Clone)]
pub struct RouteDispatcher<C, B, P> {
    cache: ReadyQueueCache<C, B>,
    channel_store: C,
    batch_store: B,
    policy: P,
}

impl<C, B, P> RouteDispatcher<C, B, P>
where
    C: ChannelStore + Clone,
    B: BatchStore + Clone,
    P: BatchCompletionPolicy,
{
    /// Creates a dispatcher with its own ready-queue cache over the given stores.
    pub fn new(channel_store: C, batch_store: B, policy: P, cache_config: CacheConfig) -> Self {
        let cache = ReadyQueueCache::new(channel_store.clone(), batch_store.clone(), cache_config);

        Self {
            cache,
            channel_store,
            batch_store,
            policy,
        }
    }

    /// Returns the ready-queue cache backing this dispatcher.
    pub fn cache(&self) -> &ReadyQueueCache<C, B> {
        &self.cache
    }

    /// Runs one dispatch cycle for a node.
    ///
    /// Returns the sealed batches of every ready queue of the node, in deterministic
    /// channel/partition order. A node with no ready queues yields an empty result.
    pub async fn dispatch_node(
        &self,
        node_id: &str,
        force_refresh: bool,
    ) -> RelayResult<Vec<RoutedBatch>> {
        let snapshot = self.cache.ready_queues(force_refresh).await;
        let Some(ready_queues) = snapshot.get(node_id) else {
            debug!(node = %node_id, "no ready queues for node");
            return Ok(Vec::new());
        };

        // Group the ready queue names back to their base channels, partitions alongside.
        let mut queues_by_channel: BTreeMap<&str, Vec<QueueName>> = BTreeMap::new();
        for raw in ready_queues {
            queues_by_channel
                .entry(QueueName::base_name(raw))
                .or_default()
                .push(QueueName::parse(raw));
        }

        let channels = self.channel_store.get_channels(false).await?;

        let mut routed = Vec::new();
        for (base, mut queue_names) in queues_by_channel {
            let Some(channel) = channels.get(base) else {
                // The snapshot can lag behind a configuration change within one TTL.
                debug!(node = %node_id, channel = %base, "ready channel no longer configured, skipping");
                continue;
            };

            let limit = channel.max_batch_size.saturating_mul(PEEK_AHEAD_FACTOR);
            let events = self
                .batch_store
                .take_pending_events(node_id, base, limit)
                .await?;
            if events.is_empty() {
                continue;
            }

            let mut assembler = BatchAssembler::new(&self.policy, channel.max_batch_size);
            let mut batches = Vec::new();
            for event in events {
                if let Some(batch) = assembler.push(event) {
                    batches.push(batch);
                }
            }
            if let Some(batch) = assembler.finish() {
                batches.push(batch);
            }

            info!(
                node = %node_id,
                channel = %base,
                batches = batches.len(),
                "routed pending events into batches"
            );

            // Spread batches across the channel's ready queues, partition order first.
            queue_names.sort();
            for (index, batch) in batches.into_iter().enumerate() {
                let queue = queue_names[index % queue_names.len()].to_string();
                routed.push(RoutedBatch { queue, batch });
            }
        }

        Ok(routed)
    }
}

//! Core domain types shared across the relay crate.

use serde::{Deserialize, Serialize};

/// Identifier of a replication channel.
pub type ChannelId = String;

/// Identifier of a downstream node.
pub type NodeId = String;

/// Configuration of a replication channel.
///
/// Channels categorize captured changes and carry the batching and queueing settings
/// routing needs. Configuration is the authority on channel existence: a channel the
/// configuration store does not return is invisible to routing, whatever the batch
/// store still reports about it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChannelConfig {
    /// The unique identifier of the channel.
    pub id: ChannelId,
    /// Queue class the channel is routed through.
    pub queue: String,
    /// Maximum number of change events in one outgoing batch.
    pub max_batch_size: usize,
    /// Disabled channels are ignored by routing, same as absent ones.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ChannelConfig {
    /// Queue class whose channels are partitioned across worker threads.
    pub const RELOAD_QUEUE: &'static str = "reload";

    /// Creates an enabled channel configuration.
    pub fn new(id: impl Into<String>, queue: impl Into<String>, max_batch_size: usize) -> Self {
        Self {
            id: id.into(),
            queue: queue.into(),
            max_batch_size,
            enabled: true,
        }
    }

    /// Returns `true` when the channel's work is partitioned across worker threads
    /// identified by integer partition ids.
    pub fn is_reload_class(&self) -> bool {
        self.queue == Self::RELOAD_QUEUE
    }
}

fn default_enabled() -> bool {
    true
}

/// A single captured row change pending routing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Monotonic identifier assigned at capture time.
    pub event_id: u64,
    /// Channel the change was captured on.
    pub channel_id: ChannelId,
    /// Source transaction the change belongs to.
    ///
    /// Consecutive events with the same transaction id must land in the same outgoing
    /// batch so replay on the target stays atomic.
    pub transaction_id: String,
}

impl ChangeEvent {
    /// Creates a new change event.
    pub fn new(
        event_id: u64,
        channel_id: impl Into<String>,
        transaction_id: impl Into<String>,
    ) -> Self {
        Self {
            event_id,
            channel_id: channel_id.into(),
            transaction_id: transaction_id.into(),
        }
    }
}

/// A bounded, sealed group of change events ready for extraction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SealedBatch {
    /// The events of this batch, in capture order.
    pub events: Vec<ChangeEvent>,
}

impl SealedBatch {
    /// Returns the number of events in the batch.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` when the batch holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

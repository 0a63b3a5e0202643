use std::collections::HashMap;
use std::future::Future;

use crate::error::RelayResult;
use crate::routing::readiness::NodeReadiness;
use crate::types::{ChangeEvent, ChannelConfig, ChannelId, NodeId};

/// Trait for sources of channel configuration.
///
/// Configuration is the authority on channel existence: routing never emits work for a
/// channel this store does not return, whatever the batch store still reports.
///
/// Implementations should ensure thread-safety and handle concurrent access to the data.
pub trait ChannelStore {
    /// Returns the current channel configuration snapshot keyed by channel id.
    ///
    /// `force_reload` asks the implementation to bypass any internal caching and read
    /// through to the backing store.
    fn get_channels(
        &self,
        force_reload: bool,
    ) -> impl Future<Output = RelayResult<HashMap<ChannelId, ChannelConfig>>> + Send;
}

/// Trait for stores of captured change data and batch readiness.
///
/// [`BatchStore`] implementations answer two questions for the routing core: which
/// channels currently hold undelivered change events per node, and what those events
/// are. Readiness records are rebuilt from scratch on every call; the ready-queue cache
/// owns their lifetime after that.
pub trait BatchStore {
    /// Returns, per node, which channels currently have undelivered change events and,
    /// for reload-class channels, which worker partitions are ready.
    fn get_ready_channels(
        &self,
    ) -> impl Future<Output = RelayResult<HashMap<NodeId, NodeReadiness>>> + Send;

    /// Removes and returns up to `limit` pending change events for a node and channel,
    /// in capture order.
    fn take_pending_events(
        &self,
        node_id: &str,
        channel_id: &str,
        limit: usize,
    ) -> impl Future<Output = RelayResult<Vec<ChangeEvent>>> + Send;
}

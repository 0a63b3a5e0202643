//! Shared fixtures for relay tests.

use crate::types::{ChangeEvent, ChannelConfig};

/// Builds a change event with the given id, channel, and transaction.
pub fn change_event(event_id: u64, channel_id: &str, transaction_id: &str) -> ChangeEvent {
    ChangeEvent::new(event_id, channel_id, transaction_id)
}

/// Builds an enabled channel configuration.
pub fn channel(id: &str, queue: &str, max_batch_size: usize) -> ChannelConfig {
    ChannelConfig::new(id, queue, max_batch_size)
}

use crate::types::{ChannelId, NodeId};

/// Per-node readiness discovered by one refresh cycle.
///
/// Channels are recorded in discovery order and may repeat. A partition is recorded only
/// for channels that report one, so the partition list never grows past the channel
/// list. Instances are built fresh by the batch store for every refresh, folded into the
/// ready-queue cache, and then discarded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeReadiness {
    node_id: NodeId,
    channels: Vec<ChannelId>,
    partitions: Vec<u32>,
}

impl NodeReadiness {
    /// Creates an empty readiness record for a node.
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            channels: Vec::new(),
            partitions: Vec::new(),
        }
    }

    /// Records a ready channel without partition information.
    pub fn add_channel(&mut self, channel_id: impl Into<String>) {
        self.channels.push(channel_id.into());
    }

    /// Records a ready channel together with the worker partition that has work.
    pub fn add_partitioned_channel(&mut self, channel_id: impl Into<String>, partition: u32) {
        self.channels.push(channel_id.into());
        self.partitions.push(partition);
    }

    /// Returns the node this readiness belongs to.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Returns the ready channels in discovery order.
    pub fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    /// Returns the ready worker partitions in discovery order.
    pub fn partitions(&self) -> &[u32] {
        &self.partitions
    }

    /// Returns `true` when no channel was discovered ready.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_discovery_order_and_duplicates() {
        let mut readiness = NodeReadiness::new("n1");
        readiness.add_channel("sales");
        readiness.add_channel("inventory");
        readiness.add_channel("sales");

        assert_eq!(readiness.channels(), ["sales", "inventory", "sales"]);
        assert!(readiness.partitions().is_empty());
    }

    #[test]
    fn partitions_never_outnumber_channel_additions() {
        let mut readiness = NodeReadiness::new("n1");
        readiness.add_partitioned_channel("reload", 1);
        readiness.add_channel("sales");
        readiness.add_partitioned_channel("reload", 2);

        assert_eq!(readiness.channels().len(), 3);
        assert_eq!(readiness.partitions(), [1, 2]);
        assert!(readiness.partitions().len() <= readiness.channels().len());
    }
}

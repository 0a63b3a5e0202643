use tracing::debug;

use crate::types::{ChangeEvent, SealedBatch};

/// Pluggable predicate deciding when an in-progress outgoing batch is complete and ready
/// to seal.
///
/// Implementations are stateless and re-evaluated per candidate row. Any state needed to
/// defer completion, such as "already past the size threshold, waiting for a safe
/// boundary", is tracked by the caller, not the policy.
pub trait BatchCompletionPolicy: Send + Sync {
    /// Returns `true` when a batch holding `accumulated_events` events should be sealed,
    /// given the channel's `max_batch_size` and whether the row stream currently sits at
    /// a transaction boundary.
    fn is_batch_complete(
        &self,
        accumulated_events: usize,
        max_batch_size: usize,
        at_transaction_boundary: bool,
    ) -> bool;
}

impl<T> BatchCompletionPolicy for &T
where
    T: BatchCompletionPolicy + ?Sized,
{
    fn is_batch_complete(
        &self,
        accumulated_events: usize,
        max_batch_size: usize,
        at_transaction_boundary: bool,
    ) -> bool {
        (**self).is_batch_complete(accumulated_events, max_batch_size, at_transaction_boundary)
    }
}

/// Default policy: a batch completes once it has reached the channel's size limit AND
/// the stream sits at a transaction boundary.
///
/// Size alone is insufficient because a source transaction must never be split across
/// two outgoing batches, or replay on the target loses atomicity. Completion is deferred
/// past the threshold until the next safe boundary.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransactionBoundaryPolicy;

impl BatchCompletionPolicy for TransactionBoundaryPolicy {
    fn is_batch_complete(
        &self,
        accumulated_events: usize,
        max_batch_size: usize,
        at_transaction_boundary: bool,
    ) -> bool {
        accumulated_events >= max_batch_size && at_transaction_boundary
    }
}

/// Alternate policy that seals on size alone, ignoring transaction boundaries.
///
/// Only safe for channels whose rows are independent of one another.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedCountPolicy;

impl BatchCompletionPolicy for FixedCountPolicy {
    fn is_batch_complete(
        &self,
        accumulated_events: usize,
        max_batch_size: usize,
        _at_transaction_boundary: bool,
    ) -> bool {
        accumulated_events >= max_batch_size
    }
}

/// Accumulates change events for one channel and seals batches per the configured
/// policy.
///
/// The assembler owns the boundary bookkeeping the policies deliberately do not: it
/// derives transaction boundaries from consecutive transaction ids and keeps filling the
/// current batch while the policy defers completion.
#[derive(Debug)]
pub struct BatchAssembler<P> {
    policy: P,
    max_batch_size: usize,
    pending: Vec<ChangeEvent>,
}

impl<P> BatchAssembler<P>
where
    P: BatchCompletionPolicy,
{
    /// Creates an assembler for a channel with the given batch size limit.
    pub fn new(policy: P, max_batch_size: usize) -> Self {
        Self {
            policy,
            max_batch_size,
            pending: Vec::new(),
        }
    }

    /// Offers the next captured event to the current batch, returning a sealed batch
    /// when the policy decides one is complete.
    ///
    /// The stream sits at a transaction boundary exactly when the incoming event belongs
    /// to a different source transaction than the previous one. The policy is evaluated
    /// at that point, before the event is admitted, so a sealed batch never splits a
    /// transaction.
    pub fn push(&mut self, event: ChangeEvent) -> Option<SealedBatch> {
        let at_boundary = self
            .pending
            .last()
            .is_some_and(|last| last.transaction_id != event.transaction_id);

        let sealed = self
            .policy
            .is_batch_complete(self.pending.len(), self.max_batch_size, at_boundary)
            .then(|| {
                debug!(
                    events = self.pending.len(),
                    max_batch_size = self.max_batch_size,
                    "sealing outgoing batch"
                );

                SealedBatch {
                    events: std::mem::take(&mut self.pending),
                }
            });

        self.pending.push(event);
        sealed
    }

    /// Seals whatever is still pending.
    ///
    /// The end of the captured stream is a safe boundary, so the trailing batch is
    /// emitted even below the size threshold.
    pub fn finish(mut self) -> Option<SealedBatch> {
        if self.pending.is_empty() {
            return None;
        }

        Some(SealedBatch {
            events: std::mem::take(&mut self.pending),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::change_event;

    #[test]
    fn completes_only_at_a_transaction_boundary() {
        let policy = TransactionBoundaryPolicy;

        assert!(!policy.is_batch_complete(10, 10, false));
        assert!(policy.is_batch_complete(10, 10, true));
        assert!(!policy.is_batch_complete(5, 10, true));
    }

    #[test]
    fn fixed_count_policy_ignores_boundaries() {
        let policy = FixedCountPolicy;

        assert!(policy.is_batch_complete(10, 10, false));
        assert!(!policy.is_batch_complete(9, 10, false));
    }

    #[test]
    fn assembler_defers_sealing_past_the_threshold_until_a_boundary() {
        let mut assembler = BatchAssembler::new(TransactionBoundaryPolicy, 2);

        // Three events of one transaction blow past the threshold without sealing.
        assert!(assembler.push(change_event(1, "sales", "t1")).is_none());
        assert!(assembler.push(change_event(2, "sales", "t1")).is_none());
        assert!(assembler.push(change_event(3, "sales", "t1")).is_none());

        // The first event of the next transaction is the safe boundary.
        let sealed = assembler.push(change_event(4, "sales", "t2")).unwrap();
        assert_eq!(
            sealed.events.iter().map(|e| e.event_id).collect::<Vec<_>>(),
            [1, 2, 3]
        );

        let trailing = assembler.finish().unwrap();
        assert_eq!(
            trailing.events.iter().map(|e| e.event_id).collect::<Vec<_>>(),
            [4]
        );
    }

    #[test]
    fn assembler_does_not_seal_below_the_threshold_at_a_boundary() {
        let mut assembler = BatchAssembler::new(TransactionBoundaryPolicy, 10);

        assert!(assembler.push(change_event(1, "sales", "t1")).is_none());
        assert!(assembler.push(change_event(2, "sales", "t2")).is_none());
        assert!(assembler.push(change_event(3, "sales", "t3")).is_none());

        let trailing = assembler.finish().unwrap();
        assert_eq!(trailing.len(), 3);
    }

    #[test]
    fn assembler_with_fixed_count_policy_seals_mid_transaction() {
        let mut assembler = BatchAssembler::new(FixedCountPolicy, 2);

        assert!(assembler.push(change_event(1, "sales", "t1")).is_none());
        assert!(assembler.push(change_event(2, "sales", "t1")).is_none());

        let sealed = assembler.push(change_event(3, "sales", "t1")).unwrap();
        assert_eq!(sealed.len(), 2);
    }

    #[test]
    fn finish_on_an_empty_assembler_yields_nothing() {
        let assembler = BatchAssembler::new(TransactionBoundaryPolicy, 2);
        assert!(assembler.finish().is_none());
    }
}

//! Update batching.
//!
//! Nodes never flush themselves on a data change. They hand back a
//! [`PendingUpdate`] and the caller queues it here; the queue is drained once
//! per batch so several writes collapse into one splice per node.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Stable identity of an include node, used to address deferred flushes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct PartialId(pub Ulid);

impl PartialId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for PartialId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PartialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Request to flush one node before the current batch completes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[must_use = "a pending update must be enqueued or the swap never reaches the live tree"]
pub struct PendingUpdate {
    pub node: PartialId,
}

/// Deduplicating FIFO of pending node flushes.
#[derive(Debug, Default)]
pub struct Runloop {
    queue: Vec<PartialId>,
    queued: FxHashSet<PartialId>,
    depth: u32,
}

impl Runloop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a flush. A node already queued is not added again.
    pub fn enqueue(&mut self, update: PendingUpdate) {
        if self.queued.insert(update.node) {
            self.queue.push(update.node);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn contains(&self, node: PartialId) -> bool {
        self.queued.contains(&node)
    }

    /// Drain all pending flushes in enqueue order.
    pub fn take(&mut self) -> Vec<PartialId> {
        self.queued.clear();
        std::mem::take(&mut self.queue)
    }

    /// Open a batch. Batches nest; only the outermost end drains.
    pub fn start(&mut self) {
        self.depth += 1;
    }

    /// Close a batch. Returns `true` when the outermost batch closed and
    /// the queue should be drained now.
    pub fn end(&mut self) -> bool {
        self.depth = self.depth.saturating_sub(1);
        self.depth == 0
    }

    pub fn in_batch(&self) -> bool {
        self.depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_deduplicates() {
        let mut runloop = Runloop::new();
        let a = PartialId::new();
        let b = PartialId::new();
        runloop.enqueue(PendingUpdate { node: a });
        runloop.enqueue(PendingUpdate { node: b });
        runloop.enqueue(PendingUpdate { node: a });

        assert_eq!(runloop.len(), 2);
        assert_eq!(runloop.take(), vec![a, b]);
        assert!(runloop.is_empty());
        assert!(!runloop.contains(a));
    }

    #[test]
    fn nested_batches_drain_at_outermost_end() {
        let mut runloop = Runloop::new();
        runloop.start();
        runloop.start();
        assert!(!runloop.end());
        assert!(runloop.in_batch());
        assert!(runloop.end());
        assert!(!runloop.in_batch());
    }
}

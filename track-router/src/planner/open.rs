//! Priority frontier of the search.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::domain::Cost;

use super::node::NodeId;

/// One queued node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    estimate: Cost,
    signals_passed: u16,
    seq: u64,
    node: NodeId,
}

impl Ord for OpenEntry {
    /// Reversed so the max-heap pops the lowest estimate first. Ties go to
    /// fewer signals passed, then to the earlier insertion.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.signals_passed.cmp(&self.signals_passed))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-first queue of node handles.
///
/// The list does not know which entries are stale. When a cheaper node for
/// the same key is pushed, the old entry stays in the heap and the caller
/// skips it on pop (see [`NodePool::is_open`](super::pool::NodePool::is_open)).
#[derive(Debug, Default)]
pub struct OpenList {
    heap: BinaryHeap<OpenEntry>,
    next_seq: u64,
}

impl OpenList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: NodeId, estimate: Cost, signals_passed: u16) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(OpenEntry {
            estimate,
            signals_passed,
            seq,
            node,
        });
    }

    /// Remove and return the best entry.
    pub fn pop(&mut self) -> Option<NodeId> {
        self.heap.pop().map(|entry| entry.node)
    }
}

//! Node arena with open and closed indexes.
//!
//! Every node created during one search lives here until the search ends.
//! Parents are referred to by [`NodeId`], so reconstructing a path is an
//! index chase over the arena.

use std::collections::HashMap;

use super::node::{Node, NodeId, NodeKey};

/// Result of offering a node to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First node for its key.
    New(NodeId),
    /// Cheaper than the queued or closed node with the same key.
    Improved(NodeId),
    /// An equal or cheaper node with the same key already exists.
    Rejected,
}

/// All nodes of one search.
#[derive(Debug)]
pub struct NodePool<K> {
    nodes: Vec<Node<K>>,

    /// Best queued node per key.
    open: HashMap<K, NodeId>,

    /// Expanded node per key.
    closed: HashMap<K, NodeId>,
}

impl<K: NodeKey> NodePool<K> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            open: HashMap::new(),
            closed: HashMap::new(),
        }
    }

    pub fn get(&self, id: NodeId) -> &Node<K> {
        &self.nodes[id.index()]
    }

    /// Offer a completed node.
    ///
    /// The node is stored and queued unless an open or closed node with the
    /// same key is at most as expensive. A cheaper node for a closed key
    /// reopens it.
    pub fn admit(&mut self, node: Node<K>) -> Admission {
        let key = node.key;

        if let Some(existing) = self.find_closed(&key) {
            if self.get(existing).cost <= node.cost {
                return Admission::Rejected;
            }
            self.closed.remove(&key);
            let id = self.push(node);
            self.open.insert(key, id);
            return Admission::Improved(id);
        }

        match self.find_open(&key) {
            Some(existing) if self.get(existing).cost <= node.cost => Admission::Rejected,
            Some(_) => {
                let id = self.push(node);
                self.open.insert(key, id);
                Admission::Improved(id)
            }
            None => {
                let id = self.push(node);
                self.open.insert(key, id);
                Admission::New(id)
            }
        }
    }

    /// Whether `id` is still the queued node for its key.
    ///
    /// Superseded nodes stay in the arena (descendants may point at them)
    /// but their open-list entries are stale.
    pub fn is_open(&self, id: NodeId) -> bool {
        self.open.get(&self.get(id).key) == Some(&id)
    }

    /// Move a queued node to the closed set.
    pub fn close(&mut self, id: NodeId) {
        let key = self.get(id).key;
        debug_assert_eq!(self.open.get(&key), Some(&id));
        self.open.remove(&key);
        self.closed.insert(key, id);
    }

    fn find_open(&self, key: &K) -> Option<NodeId> {
        self.open.get(key).copied()
    }

    fn find_closed(&self, key: &K) -> Option<NodeId> {
        self.closed.get(key).copied()
    }

    /// Total nodes created, including superseded ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Keys still waiting for expansion.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Node ids from the origin down to `id`.
    pub fn chain(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = id;

        while let Some(parent) = self.get(current).parent {
            debug_assert!(
                self.get(parent).cost <= self.get(current).cost,
                "cost decreases from {:?} to {:?}",
                self.get(parent).key,
                self.get(current).key
            );
            debug_assert!(chain.len() <= self.nodes.len(), "cycle in parent chain");
            chain.push(parent);
            current = parent;
        }

        chain.reverse();
        chain
    }

    fn push(&mut self, node: Node<K>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }
}

impl<K: NodeKey> Default for NodePool<K> {
    fn default() -> Self {
        Self::new()
    }
}

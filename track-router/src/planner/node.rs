//! Search nodes and the keys that identify them.

use std::fmt;
use std::hash::Hash;

use crate::domain::{Cost, DiagDirection, PathPos, SignalType, TileIndex};

use super::segment::{EndSegmentReasons, Segment};

/// Identity of a search node.
///
/// Two nodes with equal keys are the same search state: only the cheaper
/// one is kept.
pub trait NodeKey: Copy + Eq + Hash + fmt::Debug {
    fn from_pos(pos: PathPos) -> Self;
}

/// Key distinguishing every trackdir on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackdirKey(pub PathPos);

impl NodeKey for TrackdirKey {
    fn from_pos(pos: PathPos) -> Self {
        TrackdirKey(pos)
    }
}

/// Key merging trackdirs that leave a tile through the same side.
///
/// Gives a smaller search space on dense junction areas, at the price of
/// treating those trackdirs as interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitDirKey {
    pub tile: TileIndex,
    pub exit: DiagDirection,
}

impl NodeKey for ExitDirKey {
    fn from_pos(pos: PathPos) -> Self {
        ExitDirKey {
            tile: pos.tile,
            exit: pos.trackdir.exit_dir(),
        }
    }
}

/// Handle of a node inside its [`NodePool`](super::pool::NodePool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Flags a node inherits from its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// The destination was reached at the end of this node's segment.
    pub target_seen: bool,

    /// A branch point lies between the origin and this node.
    pub choice_seen: bool,

    /// The most recently passed signal showed stop.
    pub last_signal_was_red: bool,
}

/// A node of the search tree.
#[derive(Debug, Clone)]
pub struct Node<K> {
    pub key: K,

    /// First position of this node's segment.
    pub pos: PathPos,

    pub parent: Option<NodeId>,

    /// Cost from the origin to the end of this node's segment.
    pub cost: Cost,

    /// `cost` plus the heuristic estimate to the destination.
    pub estimate: Cost,

    segment: Option<Segment>,

    /// Signals passed since the origin.
    pub signals_passed: u16,

    pub flags: NodeFlags,

    pub last_signal_type: SignalType,

    pub last_red_signal_type: SignalType,

    /// Every reason the segment ended for this search, cached or not.
    pub end_reason: EndSegmentReasons,
}

impl<K: NodeKey> Node<K> {
    /// Create an origin node.
    ///
    /// `start_signal` is the signalling discipline the vehicle is in before
    /// passing any signal. A vehicle waiting in a path-signal section should
    /// start with [`SignalType::Pbs`] so reservations ahead are accounted
    /// for.
    pub fn origin(pos: PathPos, cost: Cost, start_signal: SignalType) -> Self {
        Self {
            key: K::from_pos(pos),
            pos,
            parent: None,
            cost,
            estimate: cost,
            segment: None,
            signals_passed: 0,
            flags: NodeFlags::default(),
            last_signal_type: start_signal,
            last_red_signal_type: SignalType::Block,
            end_reason: EndSegmentReasons::empty(),
        }
    }

    /// Create a child of `parent` starting at `pos`.
    ///
    /// `is_choice` is true when `parent`'s last position has more than one
    /// successor.
    pub fn child(parent_id: NodeId, parent: &Node<K>, pos: PathPos, is_choice: bool) -> Self {
        let mut flags = parent.flags;
        flags.target_seen = false;
        flags.choice_seen |= is_choice;

        Self {
            key: K::from_pos(pos),
            pos,
            parent: Some(parent_id),
            cost: parent.cost,
            estimate: parent.cost,
            segment: None,
            signals_passed: parent.signals_passed,
            flags,
            last_signal_type: parent.last_signal_type,
            last_red_signal_type: parent.last_red_signal_type,
            end_reason: EndSegmentReasons::empty(),
        }
    }

    /// Attach the resolved segment. A node's segment never changes afterwards.
    pub fn set_segment(&mut self, segment: Segment) {
        debug_assert!(self.segment.is_none(), "segment already set for {:?}", self.key);
        self.segment = Some(segment);
    }

    pub fn segment(&self) -> Option<&Segment> {
        self.segment.as_ref()
    }

    /// Last position of this node's segment.
    ///
    /// Only valid once the segment is resolved; falls back to the first
    /// position otherwise.
    pub fn last_pos(&self) -> PathPos {
        debug_assert!(self.segment.is_some(), "segment not resolved for {:?}", self.key);
        self.segment.map_or(self.pos, |s| s.last)
    }

    pub fn is_target(&self) -> bool {
        self.flags.target_seen
    }
}

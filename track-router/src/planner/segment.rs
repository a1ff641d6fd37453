//! Segments: the stretch of track between two decision points.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::domain::{Cost, PathPos, TileArea};

bitflags! {
    /// Why a segment stopped where it did.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct EndSegmentReasons: u16 {
        /// No way forward.
        const DEAD_END         = 1 << 0;
        /// The walk came back to a position already in this segment.
        const INFINITE_LOOP    = 1 << 1;
        /// The segment grew past the configured segment cost ceiling.
        const SEGMENT_TOO_LONG = 1 << 2;
        /// The next position is reachable in more than one way.
        const CHOICE_FOLLOWS   = 1 << 3;
        const DEPOT            = 1 << 4;
        const WAYPOINT         = 1 << 5;
        const STATION          = 1 << 6;
        /// A place where a train may wait without blocking others.
        const SAFE_TILE        = 1 << 7;
        /// A signal faces the direction of travel at the last position.
        const SIGNAL           = 1 << 8;
        /// The path cost ceiling was exceeded.
        const PATH_TOO_LONG    = 1 << 9;
        /// A block signal shows stop.
        const RED_SIGNAL       = 1 << 10;
        /// A position of the segment satisfies the destination.
        const TARGET_REACHED   = 1 << 11;

        /// Reasons that only depend on topology and may be cached.
        const CACHED_MASK = Self::DEAD_END.bits()
            | Self::INFINITE_LOOP.bits()
            | Self::SEGMENT_TOO_LONG.bits()
            | Self::CHOICE_FOLLOWS.bits()
            | Self::DEPOT.bits()
            | Self::WAYPOINT.bits()
            | Self::STATION.bits()
            | Self::SAFE_TILE.bits()
            | Self::SIGNAL.bits();

        /// Reasons that stop the search from continuing past this segment.
        const ABORT_MASK = Self::DEAD_END.bits()
            | Self::INFINITE_LOOP.bits()
            | Self::PATH_TOO_LONG.bits()
            | Self::RED_SIGNAL.bits();
    }
}

impl EndSegmentReasons {
    /// The subset of reasons that may be stored in the segment cache.
    pub fn cacheable(self) -> Self {
        self & Self::CACHED_MASK
    }

    pub fn is_abort(self) -> bool {
        self.intersects(Self::ABORT_MASK)
    }
}

/// Cached cost of one segment, keyed by its first position.
///
/// Only the static part of the cost is kept: track, curve, slope and branch
/// penalties. Signal aspects and reservations are re-evaluated every time a
/// segment is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Last position before the next decision point.
    pub last: PathPos,

    /// Static cost from the first to the last position.
    pub cost: Cost,

    /// Position of the last signal passed, if any.
    pub last_signal: Option<PathPos>,

    /// Cacheable reasons the segment ended.
    pub end_reason: EndSegmentReasons,

    /// Tiles covered from the first to the last position.
    pub area: TileArea,
}

impl Segment {
    pub fn new(
        last: PathPos,
        cost: Cost,
        last_signal: Option<PathPos>,
        end_reason: EndSegmentReasons,
        area: TileArea,
    ) -> Self {
        Self {
            last,
            cost,
            last_signal,
            end_reason: end_reason.cacheable(),
            area,
        }
    }
}

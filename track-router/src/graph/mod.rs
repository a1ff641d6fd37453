//! Query contracts the planner needs from the outside world.
//!
//! The planner never owns track or signal data. It asks a [`TrackGraph`]
//! where a position leads, a [`SignalState`] what the signals show, a
//! [`Destination`] whether a position ends the search, and a [`Heuristic`]
//! for a lower bound on the remaining cost.

mod layout;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{Cost, PathPos, Signal, TileArea, TileIndex};

pub use layout::{EdgeSpec, LayoutError, LayoutFile, OriginSpec, TrackLayout};

/// What occupies a tile, as far as segment boundaries are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Plain,
    Station,
    Waypoint,
    Depot,
}

/// Shape of the move between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EdgeKind {
    #[default]
    Straight,
    Curve,
    Slope,
    /// Diverging leg of a junction.
    Branch,
}

/// A reachable next position and the base cost of moving there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackEdge {
    pub to: PathPos,
    pub cost: Cost,
    pub kind: EdgeKind,
}

impl TrackEdge {
    pub fn new(to: PathPos, cost: Cost, kind: EdgeKind) -> Self {
        Self { to, cost, kind }
    }
}

/// Track topology.
pub trait TrackGraph {
    /// Whether `pos` is a position of this graph.
    fn contains(&self, pos: PathPos) -> bool;

    /// Kind of the tile under `pos`.
    fn tile_kind(&self, pos: PathPos) -> TileKind;

    /// Append every position reachable in one move from `pos` to `out`.
    ///
    /// `out` is cleared by the caller. An empty result is a dead end; more
    /// than one edge makes `pos` a branch point.
    fn follow(&self, pos: PathPos, out: &mut Vec<TrackEdge>);
}

/// Live signal and reservation state.
pub trait SignalState {
    /// Signal facing the direction of travel at `pos`, if any.
    fn signal_at(&self, pos: PathPos) -> Option<Signal>;

    /// Whether another agent holds a reservation over `pos`.
    fn is_reserved(&self, pos: PathPos) -> bool;

    /// Whether any position inside `area` may be reserved.
    ///
    /// False lets the planner price a cached segment without following it.
    /// The default cannot tell and answers true.
    fn may_be_reserved_within(&self, _area: &TileArea) -> bool {
        true
    }
}

/// Signal state for unsignalled networks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSignals;

impl SignalState for NoSignals {
    fn signal_at(&self, _pos: PathPos) -> Option<Signal> {
        None
    }

    fn is_reserved(&self, _pos: PathPos) -> bool {
        false
    }

    fn may_be_reserved_within(&self, _area: &TileArea) -> bool {
        false
    }
}

/// Goal predicate for one search.
///
/// Every position the search walks over is tested.
pub trait Destination {
    fn is_destination(&self, pos: PathPos) -> bool;

    /// Whether a destination may lie inside `area`.
    ///
    /// Cached segments covering a possible destination are walked again so
    /// the goal is not skipped. The default cannot tell and answers true,
    /// which turns off cache reads for that destination.
    fn may_be_within(&self, _area: &TileArea) -> bool {
        true
    }
}

impl<F> Destination for F
where
    F: Fn(PathPos) -> bool,
{
    fn is_destination(&self, pos: PathPos) -> bool {
        self(pos)
    }
}

/// Destination accepting any trackdir on a set of tiles, e.g. every
/// platform of a station.
#[derive(Debug, Clone, Default)]
pub struct DestinationTiles {
    tiles: HashSet<TileIndex>,
}

impl DestinationTiles {
    pub fn new(tiles: impl IntoIterator<Item = TileIndex>) -> Self {
        Self {
            tiles: tiles.into_iter().collect(),
        }
    }

    pub fn tiles(&self) -> impl Iterator<Item = &TileIndex> {
        self.tiles.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl Destination for DestinationTiles {
    fn is_destination(&self, pos: PathPos) -> bool {
        self.tiles.contains(&pos.tile)
    }

    fn may_be_within(&self, area: &TileArea) -> bool {
        self.tiles.iter().any(|tile| area.contains(*tile))
    }
}

/// Lower bound on the cost still needed to reach the destination.
///
/// Must never overestimate, and must not drop by more than the cost of any
/// single move, or the returned path may not be the cheapest.
pub trait Heuristic {
    fn estimate(&self, pos: PathPos) -> Cost;
}

/// Estimates zero everywhere, turning the search into Dijkstra.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroHeuristic;

impl Heuristic for ZeroHeuristic {
    fn estimate(&self, _pos: PathPos) -> Cost {
        0
    }
}

/// Manhattan distance to the nearest target tile, times a per-tile cost.
///
/// Admissible as long as every move between neighbouring tiles costs at
/// least `cost_per_tile`.
#[derive(Debug, Clone)]
pub struct ManhattanHeuristic {
    targets: Vec<TileIndex>,
    cost_per_tile: Cost,
}

impl ManhattanHeuristic {
    pub fn new(targets: impl IntoIterator<Item = TileIndex>, cost_per_tile: Cost) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            cost_per_tile,
        }
    }

    /// Heuristic aimed at every tile of `destination`.
    pub fn towards(destination: &DestinationTiles, cost_per_tile: Cost) -> Self {
        Self::new(destination.tiles().copied(), cost_per_tile)
    }
}

impl Heuristic for ManhattanHeuristic {
    fn estimate(&self, pos: PathPos) -> Cost {
        self.targets
            .iter()
            .map(|t| pos.tile.distance_manhattan(*t))
            .min()
            .map_or(0, |d| d.saturating_mul(self.cost_per_tile))
    }
}

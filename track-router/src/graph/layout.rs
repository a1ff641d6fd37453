//! In-memory track layout.
//!
//! Implements both [`TrackGraph`] and [`SignalState`] over hash maps. Layouts
//! are built in code or loaded from a JSON file, which makes them useful for
//! the command line front-end and for tests without a real map.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Cost, PathPos, Signal, SignalAspect, TileArea, TileIndex};

use super::{EdgeKind, SignalState, TileKind, TrackEdge, TrackGraph};

/// Errors loading a layout file.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid layout
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A directed track graph with signals and reservations.
#[derive(Debug, Clone, Default)]
pub struct TrackLayout {
    /// Outgoing edges per position.
    edges: HashMap<PathPos, Vec<TrackEdge>>,

    /// Every known position, including ones without outgoing edges.
    positions: HashSet<PathPos>,

    /// Non-plain tiles.
    tile_kinds: HashMap<TileIndex, TileKind>,

    /// Signals, keyed by the position they face.
    signals: HashMap<PathPos, Signal>,

    /// Positions reserved by other vehicles.
    reserved: HashSet<PathPos>,
}

impl TrackLayout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a position without adding any edge (e.g. an isolated buffer).
    pub fn add_position(&mut self, pos: PathPos) -> &mut Self {
        self.positions.insert(pos);
        self
    }

    /// Add a one-way move from `from` to `to`.
    pub fn add_edge(&mut self, from: PathPos, to: PathPos, cost: Cost, kind: EdgeKind) -> &mut Self {
        self.positions.insert(from);
        self.positions.insert(to);
        self.edges
            .entry(from)
            .or_default()
            .push(TrackEdge::new(to, cost, kind));
        self
    }

    /// Add a move usable in both directions.
    ///
    /// The return move runs from `to` reversed to `from` reversed.
    pub fn add_two_way(&mut self, from: PathPos, to: PathPos, cost: Cost, kind: EdgeKind) -> &mut Self {
        self.add_edge(from, to, cost, kind);
        self.add_edge(to.reverse(), from.reverse(), cost, kind)
    }

    pub fn set_tile_kind(&mut self, tile: TileIndex, kind: TileKind) -> &mut Self {
        if kind == TileKind::Plain {
            self.tile_kinds.remove(&tile);
        } else {
            self.tile_kinds.insert(tile, kind);
        }
        self
    }

    /// Install or replace the signal facing `pos`.
    pub fn set_signal(&mut self, pos: PathPos, signal: Signal) -> &mut Self {
        self.signals.insert(pos, signal);
        self
    }

    /// Change the aspect of an existing signal.
    ///
    /// Returns false if there is no signal at `pos`.
    pub fn set_aspect(&mut self, pos: PathPos, aspect: SignalAspect) -> bool {
        match self.signals.get_mut(&pos) {
            Some(signal) => {
                signal.aspect = aspect;
                true
            }
            None => false,
        }
    }

    pub fn reserve(&mut self, pos: PathPos) -> &mut Self {
        self.reserved.insert(pos);
        self
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Number of known positions.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }
}

impl TrackGraph for TrackLayout {
    fn contains(&self, pos: PathPos) -> bool {
        self.positions.contains(&pos)
    }

    fn tile_kind(&self, pos: PathPos) -> TileKind {
        self.tile_kinds.get(&pos.tile).copied().unwrap_or_default()
    }

    fn follow(&self, pos: PathPos, out: &mut Vec<TrackEdge>) {
        if let Some(edges) = self.edges.get(&pos) {
            out.extend_from_slice(edges);
        }
    }
}

impl SignalState for TrackLayout {
    fn signal_at(&self, pos: PathPos) -> Option<Signal> {
        self.signals.get(&pos).copied()
    }

    fn is_reserved(&self, pos: PathPos) -> bool {
        self.reserved.contains(&pos)
    }

    fn may_be_reserved_within(&self, area: &TileArea) -> bool {
        self.reserved.iter().any(|pos| area.contains(pos.tile))
    }
}

/// One edge in a layout file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: PathPos,
    pub to: PathPos,
    pub cost: Cost,
    #[serde(default)]
    pub kind: EdgeKind,
    /// Also add the reverse move.
    #[serde(default)]
    pub two_way: bool,
}

/// A start position in a layout file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OriginSpec {
    pub pos: PathPos,
    /// Cost already incurred before leaving this position (e.g. reversing).
    #[serde(default)]
    pub cost: Cost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TileSpec {
    tile: TileIndex,
    kind: TileKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SignalSpec {
    pos: PathPos,
    #[serde(flatten)]
    signal: Signal,
}

/// On-disk layout description, including the routing task to run on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutFile {
    pub edges: Vec<EdgeSpec>,
    #[serde(default)]
    tiles: Vec<TileSpec>,
    #[serde(default)]
    signals: Vec<SignalSpec>,
    #[serde(default)]
    pub reserved: Vec<PathPos>,
    #[serde(default)]
    pub origins: Vec<OriginSpec>,
    #[serde(default)]
    pub destinations: Vec<TileIndex>,
}

impl LayoutFile {
    /// Load a layout from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&json).map_err(|source| LayoutError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a layout from a JSON string.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Build the in-memory layout.
    pub fn build(&self) -> TrackLayout {
        let mut layout = TrackLayout::new();

        for edge in &self.edges {
            if edge.two_way {
                layout.add_two_way(edge.from, edge.to, edge.cost, edge.kind);
            } else {
                layout.add_edge(edge.from, edge.to, edge.cost, edge.kind);
            }
        }
        for spec in &self.tiles {
            layout.set_tile_kind(spec.tile, spec.kind);
        }
        for spec in &self.signals {
            layout.set_signal(spec.pos, spec.signal);
        }
        for pos in &self.reserved {
            layout.reserve(*pos);
        }
        // Origins may sit on positions that only have outgoing edges in the
        // other direction.
        for origin in &self.origins {
            layout.add_position(origin.pos);
        }

        debug!(
            edges = layout.edge_count(),
            positions = layout.position_count(),
            signals = self.signals.len(),
            "Layout built"
        );
        layout
    }
}

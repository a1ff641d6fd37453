//! Domain types for the track router.
//!
//! Positions and signals are plain values. Every type is valid by
//! construction, so the planner can trust them without re-checking.

mod position;
mod signal;

pub use position::{DiagDirection, InvalidTile, PathPos, TileArea, TileIndex, Trackdir};
pub use signal::{Signal, SignalAspect, SignalType};

/// Path cost unit. All costs are non-negative.
pub type Cost = u32;

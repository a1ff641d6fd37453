//! Track position types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid tile coordinate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tile: {reason}")]
pub struct InvalidTile {
    reason: &'static str,
}

/// A tile on the map grid, packed as `(y << 16) | x`.
///
/// # Examples
///
/// ```
/// use track_router::domain::TileIndex;
///
/// let tile: TileIndex = "12x7".parse().unwrap();
/// assert_eq!((tile.x(), tile.y()), (12, 7));
/// assert_eq!(tile.to_string(), "12x7");
///
/// assert!("12,7".parse::<TileIndex>().is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[u16; 2]", into = "[u16; 2]")]
pub struct TileIndex(u32);

impl TileIndex {
    /// Create a tile from grid coordinates.
    pub const fn new(x: u16, y: u16) -> Self {
        TileIndex(((y as u32) << 16) | x as u32)
    }

    pub const fn x(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    pub const fn y(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Manhattan distance to another tile, in tiles.
    pub fn distance_manhattan(&self, other: TileIndex) -> u32 {
        u32::from(self.x().abs_diff(other.x())) + u32::from(self.y().abs_diff(other.y()))
    }
}

impl From<[u16; 2]> for TileIndex {
    fn from([x, y]: [u16; 2]) -> Self {
        TileIndex::new(x, y)
    }
}

impl From<TileIndex> for [u16; 2] {
    fn from(tile: TileIndex) -> Self {
        [tile.x(), tile.y()]
    }
}

impl FromStr for TileIndex {
    type Err = InvalidTile;

    /// Parse `"<x>x<y>"`, e.g. `"12x7"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s.split_once('x').ok_or(InvalidTile {
            reason: "expected <x>x<y>",
        })?;
        let x = x.parse().map_err(|_| InvalidTile {
            reason: "x is not a 16-bit number",
        })?;
        let y = y.parse().map_err(|_| InvalidTile {
            reason: "y is not a 16-bit number",
        })?;
        Ok(TileIndex::new(x, y))
    }
}

impl fmt::Debug for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tile({}x{})", self.x(), self.y())
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x(), self.y())
    }
}

/// One of the four tile edges a track can leave through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagDirection {
    NE,
    SE,
    SW,
    NW,
}

/// A directed piece of track on a tile.
///
/// `X` and `Y` run straight across the tile; the remaining pieces cut a
/// corner. Each piece exists in both travel directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trackdir {
    XNe,
    YSe,
    UpperE,
    LowerE,
    LeftS,
    RightS,
    XSw,
    YNw,
    UpperW,
    LowerW,
    LeftN,
    RightN,
}

impl Trackdir {
    /// All trackdirs, in declaration order.
    pub const ALL: [Trackdir; 12] = [
        Trackdir::XNe,
        Trackdir::YSe,
        Trackdir::UpperE,
        Trackdir::LowerE,
        Trackdir::LeftS,
        Trackdir::RightS,
        Trackdir::XSw,
        Trackdir::YNw,
        Trackdir::UpperW,
        Trackdir::LowerW,
        Trackdir::LeftN,
        Trackdir::RightN,
    ];

    /// The same track piece travelled the other way.
    pub fn reverse(self) -> Trackdir {
        match self {
            Trackdir::XNe => Trackdir::XSw,
            Trackdir::YSe => Trackdir::YNw,
            Trackdir::UpperE => Trackdir::UpperW,
            Trackdir::LowerE => Trackdir::LowerW,
            Trackdir::LeftS => Trackdir::LeftN,
            Trackdir::RightS => Trackdir::RightN,
            Trackdir::XSw => Trackdir::XNe,
            Trackdir::YNw => Trackdir::YSe,
            Trackdir::UpperW => Trackdir::UpperE,
            Trackdir::LowerW => Trackdir::LowerE,
            Trackdir::LeftN => Trackdir::LeftS,
            Trackdir::RightN => Trackdir::RightS,
        }
    }

    /// The tile edge this trackdir leaves through.
    pub fn exit_dir(self) -> DiagDirection {
        match self {
            Trackdir::XNe | Trackdir::UpperE | Trackdir::RightN => DiagDirection::NE,
            Trackdir::YSe | Trackdir::LowerE | Trackdir::RightS => DiagDirection::SE,
            Trackdir::XSw | Trackdir::LeftS | Trackdir::LowerW => DiagDirection::SW,
            Trackdir::YNw | Trackdir::UpperW | Trackdir::LeftN => DiagDirection::NW,
        }
    }

    /// True for the straight pieces crossing the whole tile.
    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Trackdir::XNe | Trackdir::XSw | Trackdir::YSe | Trackdir::YNw
        )
    }
}

/// A position in the track graph: a tile plus the trackdir being travelled.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathPos {
    pub tile: TileIndex,
    pub trackdir: Trackdir,
}

impl PathPos {
    pub const fn new(tile: TileIndex, trackdir: Trackdir) -> Self {
        Self { tile, trackdir }
    }

    /// The same tile travelled in the opposite direction.
    pub fn reverse(&self) -> PathPos {
        PathPos::new(self.tile, self.trackdir.reverse())
    }
}

impl fmt::Debug for PathPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.tile, self.trackdir)
    }
}

impl fmt::Display for PathPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.tile, self.trackdir)
    }
}

/// The smallest rectangle of tiles covering a stretch of track.
///
/// Lets a cached segment be ruled out for a destination or reservation
/// without following it position by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileArea {
    min: TileIndex,
    max: TileIndex,
}

impl TileArea {
    /// An area of a single tile.
    pub const fn point(tile: TileIndex) -> Self {
        Self {
            min: tile,
            max: tile,
        }
    }

    /// Grow the area to cover `tile`.
    pub fn extend(&mut self, tile: TileIndex) {
        self.min = TileIndex::new(self.min.x().min(tile.x()), self.min.y().min(tile.y()));
        self.max = TileIndex::new(self.max.x().max(tile.x()), self.max.y().max(tile.y()));
    }

    pub fn contains(&self, tile: TileIndex) -> bool {
        (self.min.x()..=self.max.x()).contains(&tile.x())
            && (self.min.y()..=self.max.y()).contains(&tile.y())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Display then parse returns the original tile
        #[test]
        fn tile_text_roundtrip(x in any::<u16>(), y in any::<u16>()) {
            let tile = TileIndex::new(x, y);
            prop_assert_eq!(tile.to_string().parse::<TileIndex>().unwrap(), tile);
        }
    }
}

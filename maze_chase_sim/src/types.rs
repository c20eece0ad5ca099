// Core types shared across the simulation.
//
// Defines grid coordinates (`GridCoord`), the four edge directions, compact
// graph identifiers, tile categories, collectible items, and the top-level
// game state enum. Everything here is plain `Copy` data.
//
// Grid convention: `i` is the column (grows to the right), `j` is the row
// (grows downward). Rasters are indexed `[i][j]`, i.e. column-major.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A cell position in the tile grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub i: i32,
    pub j: i32,
}

impl GridCoord {
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    /// Euclidean distance between two cells, in tiles.
    pub fn euclidean_distance(self, other: Self) -> f64 {
        let di = f64::from(self.i - other.i);
        let dj = f64::from(self.j - other.j);
        (di * di + dj * dj).sqrt()
    }

    /// The cell `steps` tiles away in `direction`.
    pub fn step(self, direction: Direction, steps: i32) -> Self {
        let (di, dj) = direction.delta();
        Self::new(self.i + di * steps, self.j + dj * steps)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

/// Direction of a directed maze edge.
///
/// For tunnel edges the direction points from the source toward the grid's
/// nearest boundary, so the edge from a left-column tile to the matching
/// right-column tile points `Left`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// All directions in the fixed order used wherever iteration order matters.
    pub const ALL: [Direction; 4] = [Self::Left, Self::Right, Self::Up, Self::Down];

    pub const fn reverse(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Unit grid offset `(di, dj)`.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::Up => (0, -1),
            Self::Down => (0, 1),
        }
    }

    /// `Right` and `Down` are the positive orientation of an undirected edge.
    pub const fn is_positive(self) -> bool {
        matches!(self, Self::Right | Self::Down)
    }

    /// Slot index for per-direction arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::Up => 2,
            Self::Down => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Graph IDs: dense indices into the graph's vertex/edge vectors.
// ---------------------------------------------------------------------------

/// Compact identifier for a maze vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

/// Compact identifier for a directed maze edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl VertexId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// ---------------------------------------------------------------------------
// Raster and game enums
// ---------------------------------------------------------------------------

/// Category of a raster cell. Only `Path` cells become vertices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileType {
    Path,
    Wall,
    /// Interior of the pursuers' holding pen.
    Pen,
}

impl TileType {
    /// Parse a template character: `p` path, `w` wall, `g` pen.
    pub const fn from_char(ch: char) -> Option<Self> {
        match ch {
            'p' => Some(Self::Path),
            'w' => Some(Self::Wall),
            'g' => Some(Self::Pen),
            _ => None,
        }
    }
}

/// A collectible sitting on a vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Item {
    Dot,
    /// Power item: collecting it sends every active pursuer into flee.
    Pellet,
}

/// Discrete game state. A session moves `Ready -> Playing`, back to `Ready`
/// after each lost life, and finally to `Victory` or `Defeat`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Ready,
    Playing,
    Victory,
    Defeat,
}

impl GameState {
    pub const fn is_over(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }
}

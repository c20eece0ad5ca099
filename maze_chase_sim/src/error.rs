// Error type for the simulation library.
//
// Only conditions a caller can reasonably hit with valid code live here:
// empty-queue queries, unreachable path destinations, and malformed input at
// the loading boundary (map templates, JSON). Violated internal invariants
// (an ill-formed path-search query, a next edge that does not start at the
// actor's vertex) are programmer errors and panic instead.

use crate::types::{GridCoord, VertexId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("priority queue is empty")]
    EmptyQueue,

    #[error("no non-backtracking path from vertex {from:?} to vertex {to:?}")]
    Unreachable { from: VertexId, to: VertexId },

    #[error("map raster is empty")]
    EmptyRaster,

    #[error("map row {row} has {found} tiles, expected {expected}")]
    RaggedRaster {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error(
        "elevation raster is {elevation_width}x{elevation_height}, tile raster is {width}x{height}"
    )]
    ShapeMismatch {
        width: usize,
        height: usize,
        elevation_width: usize,
        elevation_height: usize,
    },

    #[error("invalid tile character {ch:?} at row {row}, column {col}")]
    InvalidTile { ch: char, row: usize, col: usize },

    #[error("bootstrap cell {0} must be a path tile")]
    BootstrapNotPath(GridCoord),

    #[error("{role} start {loc} is missing or lacks {needs}")]
    MissingStart {
        role: &'static str,
        loc: GridCoord,
        needs: &'static str,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

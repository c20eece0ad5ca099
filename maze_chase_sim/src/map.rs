// Tile + elevation raster consumed by maze construction.
//
// A `GameMap` is the validated input boundary of the simulation: a
// rectangular grid of `TileType`s and a co-indexed grid of elevations. It is
// produced by an external maze generator; this crate only loads it, either
// from a compact text template (`w`/`p`/`g` per cell, one line per row) or
// from a JSON map file. Storage is column-major (`index = i * height + j`),
// matching the `[column][row]` convention used by the maze graph.
//
// Validation here covers shape (non-empty, rectangular, elevation grid the
// same size as the tile grid) and the bootstrap cell (2, 2) being a path
// tile. Single connectivity of the path tiles is a caller precondition and
// is not checked.
//
// See also: `maze.rs`, which builds the graph from a `GameMap`.

use crate::error::{Result, SimError};
use crate::types::{GridCoord, TileType};
use serde::{Deserialize, Serialize};

/// The cell every valid map must have as a path tile. Graph connectivity is
/// defined relative to it.
pub const BOOTSTRAP_CELL: GridCoord = GridCoord::new(2, 2);

/// A validated tile raster with matching elevations.
#[derive(Clone, Debug)]
pub struct GameMap {
    width: usize,
    height: usize,
    /// Column-major tile types.
    tiles: Vec<TileType>,
    /// Column-major elevations, same layout as `tiles`.
    elevations: Vec<f64>,
}

/// On-disk map format: tile rows as template strings, elevations row-major.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapFile {
    pub tiles: Vec<String>,
    pub elevations: Vec<Vec<f64>>,
}

impl GameMap {
    /// Build a map from row-major tile and elevation grids.
    pub fn from_rows(tile_rows: Vec<Vec<TileType>>, elevation_rows: Vec<Vec<f64>>) -> Result<Self> {
        let height = tile_rows.len();
        let width = tile_rows.first().map_or(0, Vec::len);
        if width == 0 {
            return Err(SimError::EmptyRaster);
        }
        if let Some((row, r)) = tile_rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(SimError::RaggedRaster {
                row,
                expected: width,
                found: r.len(),
            });
        }
        let elevation_width = elevation_rows.first().map_or(0, Vec::len);
        if elevation_rows.len() != height
            || elevation_rows.iter().any(|r| r.len() != width)
        {
            return Err(SimError::ShapeMismatch {
                width,
                height,
                elevation_width,
                elevation_height: elevation_rows.len(),
            });
        }

        let mut tiles = Vec::with_capacity(width * height);
        let mut elevations = Vec::with_capacity(width * height);
        for i in 0..width {
            for j in 0..height {
                tiles.push(tile_rows[j][i]);
                elevations.push(elevation_rows[j][i]);
            }
        }

        let map = Self {
            width,
            height,
            tiles,
            elevations,
        };
        if map.tile(BOOTSTRAP_CELL) != Some(TileType::Path) {
            return Err(SimError::BootstrapNotPath(BOOTSTRAP_CELL));
        }
        Ok(map)
    }

    /// Parse a text template (`w` wall, `p` path, `g` pen; one line per row,
    /// surrounding whitespace ignored) and compute each cell's elevation with
    /// `elevation`.
    pub fn from_template(template: &str, elevation: impl Fn(GridCoord) -> f64) -> Result<Self> {
        let mut tile_rows = Vec::new();
        let mut elevation_rows = Vec::new();
        for (row, line) in template
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .enumerate()
        {
            let tiles = parse_row(line, row)?;
            elevation_rows.push(
                (0..tiles.len())
                    .map(|col| elevation(GridCoord::new(col as i32, row as i32)))
                    .collect(),
            );
            tile_rows.push(tiles);
        }
        Self::from_rows(tile_rows, elevation_rows)
    }

    /// Parse a JSON map file (see `MapFile`).
    pub fn from_json(json: &str) -> Result<Self> {
        let file: MapFile = serde_json::from_str(json)?;
        let tile_rows = file
            .tiles
            .iter()
            .enumerate()
            .map(|(row, line)| parse_row(line.trim(), row))
            .collect::<Result<Vec<_>>>()?;
        Self::from_rows(tile_rows, file.elevations)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, loc: GridCoord) -> bool {
        loc.i >= 0 && loc.j >= 0 && (loc.i as usize) < self.width && (loc.j as usize) < self.height
    }

    fn index(&self, loc: GridCoord) -> Option<usize> {
        self.in_bounds(loc)
            .then(|| loc.i as usize * self.height + loc.j as usize)
    }

    /// Tile type at `loc`, or `None` outside the raster.
    pub fn tile(&self, loc: GridCoord) -> Option<TileType> {
        self.index(loc).map(|idx| self.tiles[idx])
    }

    /// Elevation at `loc`, or `None` outside the raster.
    pub fn elevation(&self, loc: GridCoord) -> Option<f64> {
        self.index(loc).map(|idx| self.elevations[idx])
    }

    pub fn is_path(&self, loc: GridCoord) -> bool {
        self.tile(loc) == Some(TileType::Path)
    }

    pub fn path_cell_count(&self) -> usize {
        self.tiles.iter().filter(|&&t| t == TileType::Path).count()
    }
}

fn parse_row(line: &str, row: usize) -> Result<Vec<TileType>> {
    line.chars()
        .enumerate()
        .map(|(col, ch)| TileType::from_char(ch).ok_or(SimError::InvalidTile { ch, row, col }))
        .collect()
}

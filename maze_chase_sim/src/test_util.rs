// Shared fixtures for unit tests.
//
// The lattice maps mimic what the maze generator guarantees: every tile with
// a coordinate congruent to 2 (mod 3) inside the border is a path, giving a
// grid of corridors with 2x2 wall blocks between them and a two-tile wall
// border (so no tunnels).

use crate::map::GameMap;
use crate::types::GridCoord;

/// Row-major template text for a lattice with `cols` x `rows` wall blocks.
/// The raster is `(3 * cols + 2)` wide and `(3 * rows + 2)` tall.
pub fn lattice_template(cols: i32, rows: i32) -> String {
    let (w, h) = (3 * cols + 2, 3 * rows + 2);
    let inside = |x: i32, max: i32| (2..=max - 3).contains(&x);
    (0..h)
        .map(|j| {
            (0..w)
                .map(|i| {
                    let on_corridor = i % 3 == 2 || j % 3 == 2;
                    if inside(i, w) && inside(j, h) && on_corridor {
                        'p'
                    } else {
                        'w'
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A gentle slope so that edge weights differ by direction.
pub fn gradient(loc: GridCoord) -> f64 {
    0.02 * f64::from(loc.i) + 0.01 * f64::from(loc.j)
}

/// Flat lattice: every edge has weight 1.
pub fn lattice_map(cols: i32, rows: i32) -> GameMap {
    GameMap::from_template(&lattice_template(cols, rows), |_| 0.0).unwrap()
}

/// Lattice on `gradient` elevations.
pub fn hilly_lattice_map(cols: i32, rows: i32) -> GameMap {
    GameMap::from_template(&lattice_template(cols, rows), gradient).unwrap()
}

/// The 32x32 sample board shipped in `demos/`, with a wraparound tunnel on
/// row 14 and uneven elevations.
pub fn demo_map() -> GameMap {
    GameMap::from_json(include_str!("../../demos/lattice.json")).unwrap()
}

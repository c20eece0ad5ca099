// Maze graph built from a tile raster.
//
// One `MazeVertex` per path tile, connected by directed `MazeEdge`s to its
// orthogonal path neighbours. Rows (columns) whose two boundary tiles are
// both paths also get a wraparound "tunnel" edge pair. Every edge's weight
// comes from the elevation change along it (`edge_weight`), so uphill and
// downhill traversals of the same corridor cost different amounts.
//
// All storage uses `Vec`s indexed by `VertexId`/`EdgeId`, plus a dense
// column-major grid mapping tile locations to vertices. Vertices are created
// in column-major order and edges in a fixed scan order, so ids are a pure
// function of the map.
//
// An edge's reverse is found structurally, as the edge leaving its
// destination in the opposite direction, so no back-references are stored.
//
// See also: `map.rs` for the raster, `pathfinding.rs` for search over this
// graph, `sim.rs` which owns the graph for the lifetime of a session.
//
// **Critical constraint: determinism.** Construction is a pure function of
// the `GameMap`; the graph is immutable afterwards.

use crate::error::{Result, SimError};
use crate::map::{BOOTSTRAP_CELL, GameMap};
use crate::types::{Direction, EdgeId, GridCoord, VertexId};

/// A vertex of the maze: the location of one path tile.
#[derive(Clone, Debug)]
pub struct MazeVertex {
    pub id: VertexId,
    pub loc: GridCoord,
    /// Outgoing edges, slotted by `Direction::index()`.
    edges: [Option<EdgeId>; 4],
}

impl MazeVertex {
    /// The outgoing edge pointing in `direction`, if any.
    pub fn edge_in_direction(&self, direction: Direction) -> Option<EdgeId> {
        self.edges[direction.index()]
    }

    /// Outgoing edges in `Direction::ALL` order.
    pub fn outgoing(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().flatten().copied()
    }
}

/// A directed edge from `src` to `dst`, pointing in `direction`.
#[derive(Clone, Debug, PartialEq)]
pub struct MazeEdge {
    pub id: EdgeId,
    pub src: VertexId,
    pub dst: VertexId,
    pub direction: Direction,
    pub weight: f64,
}

/// The maze graph container. Immutable once built.
#[derive(Clone, Debug)]
pub struct MazeGraph {
    vertices: Vec<MazeVertex>,
    edges: Vec<MazeEdge>,
    /// Column-major `[i][j]` lookup from tile location to vertex.
    grid: Vec<Option<VertexId>>,
    width: i32,
    height: i32,
}

/// Weight of an edge from a tile at `src_elev` to a tile at `dst_elev`.
///
/// Uphill costs more: the elevation change is clamped to [-0.25, 0.25] and
/// scaled, giving weights in [0.25, 1.75].
pub fn edge_weight(src_elev: f64, dst_elev: f64) -> f64 {
    let delta = (dst_elev - src_elev).clamp(-0.25, 0.25);
    1.0 + 3.0 * delta
}

impl MazeGraph {
    /// Build the graph for `map`.
    ///
    /// Requires the bootstrap cell (2, 2) to be a path tile (guaranteed by
    /// `GameMap` validation) and all path tiles to form one orthogonally
    /// connected component. A disconnected raster yields unreachable
    /// vertices; that is a caller error and is not detected here.
    pub fn build(map: &GameMap) -> Self {
        assert!(
            map.is_path(BOOTSTRAP_CELL),
            "maze raster must have a path tile at {BOOTSTRAP_CELL}"
        );
        let width = map.width() as i32;
        let height = map.height() as i32;
        let mut graph = Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            grid: vec![None; map.width() * map.height()],
            width,
            height,
        };

        // --- 1. Vertices, one per path tile ---
        for i in 0..width {
            for j in 0..height {
                let loc = GridCoord::new(i, j);
                if map.is_path(loc) {
                    let id = VertexId(graph.vertices.len() as u32);
                    graph.vertices.push(MazeVertex {
                        id,
                        loc,
                        edges: [None; 4],
                    });
                    let slot = graph.grid_index(loc);
                    graph.grid[slot] = Some(id);
                }
            }
        }

        // --- 2. Orthogonal neighbours (down and right from each tile) ---
        for idx in 0..graph.vertices.len() {
            let loc = graph.vertices[idx].loc;
            for dir in [Direction::Down, Direction::Right] {
                let next = loc.step(dir, 1);
                if let Some(other) = graph.vertex_at(next) {
                    graph.connect(map, graph.vertices[idx].id, other, dir);
                }
            }
        }

        // --- 3. Horizontal tunnels: left column to right column points Left ---
        if width > 1 {
            for j in 0..height {
                let left = graph.vertex_at(GridCoord::new(0, j));
                let right = graph.vertex_at(GridCoord::new(width - 1, j));
                if let (Some(left), Some(right)) = (left, right) {
                    graph.connect(map, left, right, Direction::Left);
                }
            }
        }

        // --- 4. Vertical tunnels: top row to bottom row points Up ---
        if height > 1 {
            for i in 0..width {
                let top = graph.vertex_at(GridCoord::new(i, 0));
                let bottom = graph.vertex_at(GridCoord::new(i, height - 1));
                if let (Some(top), Some(bottom)) = (top, bottom) {
                    graph.connect(map, top, bottom, Direction::Up);
                }
            }
        }

        graph
    }

    /// Add the edge pair `a -> b` (pointing `dir`) and `b -> a` (pointing
    /// `dir.reverse()`), weighted by the elevations of their endpoints.
    fn connect(&mut self, map: &GameMap, a: VertexId, b: VertexId, dir: Direction) {
        let a_elev = map.elevation(self.vertex(a).loc).unwrap_or_default();
        let b_elev = map.elevation(self.vertex(b).loc).unwrap_or_default();
        self.add_edge(a, b, dir, edge_weight(a_elev, b_elev));
        self.add_edge(b, a, dir.reverse(), edge_weight(b_elev, a_elev));
    }

    fn add_edge(&mut self, src: VertexId, dst: VertexId, direction: Direction, weight: f64) {
        let id = EdgeId(self.edges.len() as u32);
        let slot = &mut self.vertices[src.index()].edges[direction.index()];
        assert!(
            slot.is_none(),
            "vertex {src:?} already has an outgoing {direction:?} edge"
        );
        *slot = Some(id);
        self.edges.push(MazeEdge {
            id,
            src,
            dst,
            direction,
            weight,
        });
    }

    #[cfg(test)]
    pub(crate) fn set_weight(&mut self, edge: EdgeId, weight: f64) {
        self.edges[edge.index()].weight = weight;
    }

    fn grid_index(&self, loc: GridCoord) -> usize {
        loc.i as usize * self.height as usize + loc.j as usize
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex(&self, id: VertexId) -> &MazeVertex {
        &self.vertices[id.index()]
    }

    pub fn edge(&self, id: EdgeId) -> &MazeEdge {
        &self.edges[id.index()]
    }

    pub fn vertices(&self) -> &[MazeVertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[MazeEdge] {
        &self.edges
    }

    /// The vertex on the tile at `loc`, or `None` for non-path or
    /// out-of-range tiles.
    pub fn vertex_at(&self, loc: GridCoord) -> Option<VertexId> {
        if loc.i < 0 || loc.j < 0 || loc.i >= self.width || loc.j >= self.height {
            return None;
        }
        self.grid[self.grid_index(loc)]
    }

    pub fn edge_in_direction(&self, v: VertexId, direction: Direction) -> Option<EdgeId> {
        self.vertex(v).edge_in_direction(direction)
    }

    /// Outgoing edges of `v` in `Direction::ALL` order.
    pub fn outgoing(&self, v: VertexId) -> impl Iterator<Item = &MazeEdge> + '_ {
        self.vertex(v).outgoing().map(|e| self.edge(e))
    }

    /// The edge running opposite to `edge`. Every edge is built as half of a
    /// pair, so the reverse always exists.
    pub fn reverse(&self, edge: EdgeId) -> EdgeId {
        let e = self.edge(edge);
        self.edge_in_direction(e.dst, e.direction.reverse())
            .unwrap_or_else(|| panic!("edge {edge:?} has no reverse"))
    }

    /// Canonical id shared by an edge and its reverse: the smaller of the two.
    pub fn undirected_key(&self, edge: EdgeId) -> EdgeId {
        edge.min(self.reverse(edge))
    }

    /// A reachable vertex close to tile `(i, j)`, for turning arbitrary grid
    /// targets into legal destinations.
    ///
    /// Relies on the maze generator's guarantee that every tile at
    /// `(3x + 2, 3y + 2)` is a path, except inside the pursuer pen, where
    /// `(3x + 2, 3y + 5)` is a path instead. Usually returns a closest
    /// vertex when tunnels are ignored.
    pub fn nearest_vertex_to(&self, i: i32, j: i32) -> VertexId {
        let i = i.clamp(0, (self.width - 2).max(0));
        let j = j.clamp(0, (self.height - 2).max(0));

        // Integer division truncates toward zero, so (0 - 1) / 3 == 0 and the
        // snapped coordinate never drops below 2.
        let ip = ((i - 1) / 3) * 3 + 2;
        let jp = ((j - 1) / 3) * 3 + 2;

        [
            GridCoord::new(i, j),
            GridCoord::new(i, jp),
            GridCoord::new(ip, j),
            GridCoord::new(ip, jp),
        ]
        .into_iter()
        .find_map(|loc| self.vertex_at(loc))
        .or_else(|| self.vertex_at(GridCoord::new(ip, jp + 3)))
        .unwrap_or_else(|| panic!("no path tile near ({i}, {j}); raster breaks the stride-3 guarantee"))
    }

    /// The edge the player is "arriving along" when a round starts. The
    /// player begins at its destination with progress 1.
    ///
    /// Panics if the raster has no player start; see `try_player_starting_edge`.
    pub fn player_starting_edge(&self) -> EdgeId {
        self.try_player_starting_edge()
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// The first edge a pursuer traverses when it leaves its holding state.
    pub fn pursuer_starting_edge(&self) -> EdgeId {
        self.try_pursuer_starting_edge()
            .unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_player_starting_edge(&self) -> Result<EdgeId> {
        let loc = GridCoord::new(
            (self.width - 1) / 2,
            3 * ((3 * (self.height / 3) - 1) / 4) + 2,
        );
        self.vertex_at(loc)
            .and_then(|start| {
                self.edge_in_direction(start, Direction::Left)
                    .or_else(|| self.edge_in_direction(start, Direction::Up))
            })
            .map(|e| self.reverse(e))
            .ok_or(SimError::MissingStart {
                role: "player",
                loc,
                needs: "a left or up neighbour",
            })
    }

    pub fn try_pursuer_starting_edge(&self) -> Result<EdgeId> {
        let loc = GridCoord::new((self.width - 1) / 2, 3 * ((self.height - 3) / 6) - 1);
        self.vertex_at(loc)
            .and_then(|v| self.edge_in_direction(v, Direction::Right))
            .ok_or(SimError::MissingStart {
                role: "pursuer",
                loc,
                needs: "a right neighbour",
            })
    }

    /// Anchor tiles of the four board corners: top-left, top-right,
    /// bottom-left, bottom-right.
    pub fn corner_anchors(&self) -> [GridCoord; 4] {
        let (w, h) = (self.width, self.height);
        [
            GridCoord::new(2, 2),
            GridCoord::new(w - 3, 2),
            GridCoord::new(2, h - 3),
            GridCoord::new(w - 3, h - 3),
        ]
    }
}

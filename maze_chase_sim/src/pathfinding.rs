// Non-backtracking shortest-path search over the maze graph.
//
// A Dijkstra variant driven by the decrease-key `MinPQueue`. The one twist is
// that a path may never traverse an edge immediately followed by its
// reverse: when relaxing the edges out of `v`, the reverse of the edge `v`
// was reached by is skipped. At the source, the caller may supply the
// "incoming" edge (the edge an actor just arrived along) so that the first
// step cannot double back either.
//
// The search state is one `PathEnd` per vertex (distance so far plus the
// edge it was reached by), written on discovery and on every strict
// improvement, and stored in a `Vec` indexed by `VertexId`. Reconstructing
// the literal edge sequence walks those backpointers from the destination.
//
// See also: `maze.rs` for the graph, `pqueue.rs` for the queue, `policy.rs`
// and `sim.rs`, which route pursuers with the first edge of these paths.
//
// **Critical constraint: determinism.** The search is a pure function of
// the graph, source, and incoming edge. Outgoing edges are relaxed in
// `Direction::ALL` order and every container is index-addressed.

use crate::error::{Result, SimError};
use crate::maze::MazeGraph;
use crate::pqueue::MinPQueue;
use crate::types::{EdgeId, VertexId};

/// Search result for one reached vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathEnd {
    /// Total weight of the best non-backtracking path found.
    pub distance: f64,
    /// The edge that path arrives by. For the source this is the incoming
    /// edge supplied to the search (if any).
    pub last_edge: Option<EdgeId>,
}

/// Per-vertex search results from one source.
#[derive(Clone, Debug)]
pub struct PathInfo {
    src: VertexId,
    ends: Vec<Option<PathEnd>>,
    reached: usize,
}

impl PathInfo {
    pub fn src(&self) -> VertexId {
        self.src
    }

    pub fn get(&self, v: VertexId) -> Option<&PathEnd> {
        self.ends.get(v.index()).and_then(Option::as_ref)
    }

    pub fn contains(&self, v: VertexId) -> bool {
        self.get(v).is_some()
    }

    pub fn distance_to(&self, v: VertexId) -> Option<f64> {
        self.get(v).map(|end| end.distance)
    }

    /// Reached vertices in id order.
    pub fn reachable(&self) -> impl Iterator<Item = (VertexId, &PathEnd)> + '_ {
        self.ends
            .iter()
            .enumerate()
            .filter_map(|(idx, end)| end.as_ref().map(|e| (VertexId(idx as u32), e)))
    }

    /// Number of reached vertices, the source included.
    pub fn len(&self) -> usize {
        self.reached
    }

    pub fn is_empty(&self) -> bool {
        self.reached == 0
    }
}

/// Run the search from `src`.
///
/// `incoming`, when given, is the edge most recently used to reach `src`;
/// its reverse is never the first step. Panics if `incoming` does not end at
/// `src`.
pub fn path_info(graph: &MazeGraph, src: VertexId, incoming: Option<EdgeId>) -> PathInfo {
    if let Some(edge) = incoming {
        assert_eq!(
            graph.edge(edge).dst,
            src,
            "incoming edge {edge:?} does not end at search source {src:?}"
        );
    }

    let n = graph.vertex_count();
    let mut ends: Vec<Option<PathEnd>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut reached = 1;
    let mut open = MinPQueue::new();

    ends[src.index()] = Some(PathEnd {
        distance: 0.0,
        last_edge: incoming,
    });
    open.add_or_update(src, 0.0);

    while let Ok(v) = open.remove() {
        settled[v.index()] = true;
        let Some(here) = ends[v.index()] else {
            continue;
        };
        let forbidden = here.last_edge.map(|e| graph.reverse(e));

        for edge in graph.outgoing(v) {
            if Some(edge.id) == forbidden || settled[edge.dst.index()] {
                continue;
            }
            let distance = here.distance + edge.weight;
            let slot = &mut ends[edge.dst.index()];
            let improved = match slot {
                None => {
                    reached += 1;
                    true
                }
                Some(existing) => distance < existing.distance,
            };
            if improved {
                *slot = Some(PathEnd {
                    distance,
                    last_edge: Some(edge.id),
                });
                open.add_or_update(edge.dst, distance);
            }
        }
    }

    PathInfo { src, ends, reached }
}

/// The edge sequence from the search source to `dst`, recovered from the
/// backpointers in `info`. Empty when `dst` is the source.
pub fn path_to(info: &PathInfo, graph: &MazeGraph, dst: VertexId) -> Result<Vec<EdgeId>> {
    if !info.contains(dst) {
        return Err(SimError::Unreachable {
            from: info.src,
            to: dst,
        });
    }
    let mut path = Vec::new();
    let mut v = dst;
    while v != info.src {
        let edge = info
            .get(v)
            .and_then(|end| end.last_edge)
            .unwrap_or_else(|| panic!("reached vertex {v:?} has no backpointer"));
        path.push(edge);
        v = graph.edge(edge).src;
    }
    path.reverse();
    Ok(path)
}

/// Shortest non-backtracking path from `src` to `dst`, optionally forbidding
/// an immediate reversal of `incoming`.
pub fn shortest_non_backtracking_path(
    graph: &MazeGraph,
    src: VertexId,
    dst: VertexId,
    incoming: Option<EdgeId>,
) -> Result<Vec<EdgeId>> {
    let info = path_info(graph, src, incoming);
    path_to(&info, graph, dst)
}

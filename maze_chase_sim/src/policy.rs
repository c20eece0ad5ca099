// Pursuer target selection.
//
// Each pursuer routes toward a target vertex chosen by its `TargetPolicy`.
// Policies are plain data (serde-friendly, configured per pursuer in
// `GameConfig`) and each variant is a pure function of the board:
//
// - `DirectChase`: the player's nearest vertex.
// - `Ambush`: a few tiles ahead of the player along its travel direction.
// - `Pincer`: the player's position reflected through a partner pursuer.
// - `Threshold`: the player when far away, a random vertex when close.
//
// While fleeing, every pursuer instead heads for the board corner fixed by
// its policy; holding pursuers (`Wait`/`Respawn`) have no target at all.
// All randomness comes from the `GameRng` the caller passes in.
//
// See also: `sim.rs`, which asks for a target each time a pursuer reaches a
// vertex and routes to it with `pathfinding.rs`.

use crate::actor::{Actor, PursuerState};
use crate::maze::MazeGraph;
use crate::types::{GridCoord, VertexId};
use maze_chase_prng::GameRng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TargetPolicy {
    DirectChase,
    /// Aim `lookahead` tiles ahead of the player.
    Ambush { lookahead: i32 },
    /// Aim at `2 * player - partner`, where `partner` is a pursuer index.
    Pincer { partner: usize },
    /// Chase the player only while at least `radius` tiles away.
    Threshold { radius: f64 },
}

impl TargetPolicy {
    /// Which of `MazeGraph::corner_anchors` this policy flees to.
    pub fn corner_index(&self) -> usize {
        match self {
            Self::DirectChase => 0,
            Self::Ambush { .. } => 1,
            Self::Pincer { .. } => 2,
            Self::Threshold { .. } => 3,
        }
    }

    /// The vertex a fleeing pursuer with this policy heads for.
    pub fn flee_target(&self, graph: &MazeGraph) -> VertexId {
        let corner = graph.corner_anchors()[self.corner_index()];
        graph.nearest_vertex_to(corner.i, corner.j)
    }

    /// The vertex a chasing pursuer at actor index `me` heads for.
    ///
    /// `actors[0]` is the player; pursuer `n` is `actors[n + 1]`.
    pub fn chase_target(
        &self,
        graph: &MazeGraph,
        actors: &[Actor],
        me: usize,
        rng: &mut GameRng,
    ) -> VertexId {
        let player = &actors[0].location;
        let player_vertex = player.nearest_vertex(graph);
        let player_loc = graph.vertex(player_vertex).loc;

        match *self {
            Self::DirectChase => player_vertex,
            Self::Ambush { lookahead } => {
                let ahead = player_loc.step(player.direction(graph), lookahead);
                graph.nearest_vertex_to(ahead.i, ahead.j)
            }
            Self::Pincer { partner } => {
                // A missing partner degenerates to chasing the player.
                let partner_loc = actors
                    .get(partner + 1)
                    .map(|a| graph.vertex(a.location.nearest_vertex(graph)).loc)
                    .unwrap_or(player_loc);
                graph.nearest_vertex_to(
                    2 * player_loc.i - partner_loc.i,
                    2 * player_loc.j - partner_loc.j,
                )
            }
            Self::Threshold { radius } => {
                let own = graph.vertex(actors[me].location.nearest_vertex(graph)).loc;
                if own.euclidean_distance(player_loc) >= radius {
                    player_vertex
                } else {
                    let cell = GridCoord::new(
                        rng.range_i32(0, graph.width()),
                        rng.range_i32(0, graph.height()),
                    );
                    graph.nearest_vertex_to(cell.i, cell.j)
                }
            }
        }
    }
}

/// The target of the pursuer at actor index `me`, or `None` while it is
/// holding (or if `me` is the player).
pub fn select_target(
    graph: &MazeGraph,
    actors: &[Actor],
    me: usize,
    rng: &mut GameRng,
) -> Option<VertexId> {
    let pursuer = actors[me].as_pursuer().filter(|p| !p.state.is_holding())?;
    Some(match pursuer.state {
        PursuerState::Flee => pursuer.policy.flee_target(graph),
        _ => pursuer.policy.chase_target(graph, actors, me, rng),
    })
}

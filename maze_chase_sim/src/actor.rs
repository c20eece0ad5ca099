// Actors: the player and the pursuers.
//
// Every movable entity is an `Actor`: a `Location` (directed edge plus
// progress in [0, 1]) and a role. Pursuers additionally carry their target
// policy and a small state machine:
//
//   Wait --(delay expires)--> Chase <--(flee expires)-- Flee
//                               |                        ^
//                               +--(pellet collected)----+
//   Flee --(caught by player)--> Respawn --(delay expires)--> Chase
//
// `Wait` and `Respawn` are stationary holding states at progress 0 of the
// pursuer spawn edge. Every state except `Chase` runs a countdown timer; the
// timer is part of the sim's sub-step bound so transitions land exactly.
//
// `Trajectory` expresses an actor's motion along an undirected edge in a
// canonical orientation so that two actors sharing the edge can be solved
// for their meeting time. See `sim.rs` for the update loop that drives all of
// this, `policy.rs` for target selection.

use crate::maze::MazeGraph;
use crate::policy::TargetPolicy;
use crate::types::{Direction, EdgeId, VertexId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Where an actor is: on `edge`, `progress` of the way from its source (0)
/// to its destination (1).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub edge: EdgeId,
    pub progress: f64,
}

impl Location {
    pub fn new(edge: EdgeId, progress: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&progress));
        Self { edge, progress }
    }

    /// Interpolated grid position `(x, y)`.
    pub fn position(&self, graph: &MazeGraph) -> (f64, f64) {
        let e = graph.edge(self.edge);
        let a = graph.vertex(e.src).loc;
        let b = graph.vertex(e.dst).loc;
        let t = self.progress;
        (
            f64::from(a.i) + t * f64::from(b.i - a.i),
            f64::from(a.j) + t * f64::from(b.j - a.j),
        )
    }

    /// The edge's source before the midpoint, its destination from the
    /// midpoint on.
    pub fn nearest_vertex(&self, graph: &MazeGraph) -> VertexId {
        let e = graph.edge(self.edge);
        if self.progress < 0.5 { e.src } else { e.dst }
    }

    /// The destination vertex, if the actor has reached it.
    pub fn arrived_at(&self, graph: &MazeGraph) -> Option<VertexId> {
        (self.progress >= 1.0).then(|| graph.edge(self.edge).dst)
    }

    pub fn direction(&self, graph: &MazeGraph) -> Direction {
        graph.edge(self.edge).direction
    }
}

// ---------------------------------------------------------------------------
// Pursuer state
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PursuerState {
    /// Holding at the spawn edge until the round-start delay passes.
    Wait,
    Chase,
    Flee,
    /// Holding at the spawn edge after being caught.
    Respawn,
}

impl PursuerState {
    /// True for the states in which the pursuer stays put.
    pub const fn is_holding(self) -> bool {
        matches!(self, Self::Wait | Self::Respawn)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pursuer {
    pub name: String,
    pub policy: TargetPolicy,
    pub state: PursuerState,
    /// Time left in the current state, for every state except `Chase`.
    pub timer_ms: Option<f64>,
    /// Round-start delay before leaving `Wait`.
    pub wait_delay_ms: f64,
}

impl Pursuer {
    pub fn new(name: impl Into<String>, policy: TargetPolicy, wait_delay_ms: f64) -> Self {
        Self {
            name: name.into(),
            policy,
            state: PursuerState::Wait,
            timer_ms: Some(wait_delay_ms),
            wait_delay_ms,
        }
    }

    /// Enter `state` with an optional countdown.
    pub fn enter(&mut self, state: PursuerState, timer_ms: Option<f64>) {
        self.state = state;
        self.timer_ms = timer_ms;
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ActorRole {
    Player,
    Pursuer(Pursuer),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Actor {
    pub location: Location,
    pub role: ActorRole,
}

impl Actor {
    pub fn player(location: Location) -> Self {
        Self {
            location,
            role: ActorRole::Player,
        }
    }

    pub fn pursuer(location: Location, pursuer: Pursuer) -> Self {
        Self {
            location,
            role: ActorRole::Pursuer(pursuer),
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.role, ActorRole::Player)
    }

    pub fn as_pursuer(&self) -> Option<&Pursuer> {
        match &self.role {
            ActorRole::Pursuer(p) => Some(p),
            ActorRole::Player => None,
        }
    }

    pub fn as_pursuer_mut(&mut self) -> Option<&mut Pursuer> {
        match &mut self.role {
            ActorRole::Pursuer(p) => Some(p),
            ActorRole::Player => None,
        }
    }

    /// Pursuer state, or `None` for the player.
    pub fn pursuer_state(&self) -> Option<PursuerState> {
        self.as_pursuer().map(|p| p.state)
    }
}

// ---------------------------------------------------------------------------
// Trajectories and collision prediction
// ---------------------------------------------------------------------------

/// Linear motion `p(t) = p0 + velocity * t` along an undirected edge, in the
/// orientation of its `Right`/`Down` member. `t` is in ms, `p` in edge
/// fractions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trajectory {
    /// Canonical id of the undirected edge (`MazeGraph::undirected_key`).
    pub key: EdgeId,
    pub p0: f64,
    pub velocity: f64,
}

impl Trajectory {
    /// Trajectory of an actor at `location` advancing at `rate` (progress
    /// per ms).
    pub fn of(graph: &MazeGraph, location: &Location, rate: f64) -> Self {
        let key = graph.undirected_key(location.edge);
        if graph.edge(location.edge).direction.is_positive() {
            Self {
                key,
                p0: location.progress,
                velocity: rate,
            }
        } else {
            Self {
                key,
                p0: 1.0 - location.progress,
                velocity: -rate,
            }
        }
    }

    /// Time until this trajectory meets `other`, when that happens strictly
    /// in the future. Trajectories on different edges never meet mid-edge.
    pub fn collision_time(&self, other: &Self) -> Option<f64> {
        if self.key != other.key {
            return None;
        }
        let closing = self.velocity - other.velocity;
        let t = (other.p0 - self.p0) / closing;
        (t.is_finite() && t > 0.0).then_some(t)
    }
}

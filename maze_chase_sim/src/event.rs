// Simulation events: observable changes emitted by `SimState::update`.
//
// The sim never calls out to the host. Every update returns the events it
// produced, in emission order, inside a `StepResult`; the host (or a
// `Session`, see `session.rs`) decides how to deliver them. Events cover the
// counters a UI shows (score, lives, game state), the round outcome, one
// `BoardStateChanged` per update, and narrative events for item pickups,
// captures, and flee phases.
//
// See also: `sim.rs` for where each kind is emitted.

use crate::types::{GameState, Item, VertexId};
use serde::{Deserialize, Serialize};

/// An event emitted by the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    /// Simulated time (ms since session start) at which the event occurred.
    pub time_ms: f64,
    pub kind: SimEventKind,
}

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Victory,
    Defeat,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventKind {
    ScoreChanged { old: u64, new: u64 },
    LivesChanged { old: u32, new: u32 },
    GameStateChanged { old: GameState, new: GameState },
    /// The game is over.
    RoundResult { outcome: RoundOutcome },
    /// Fired exactly once at the end of every update.
    BoardStateChanged,
    /// The player picked up `item` at `vertex`.
    ItemCollected { vertex: VertexId, item: Item },
    /// The player caught fleeing pursuer number `pursuer`.
    PursuerCaught { pursuer: usize, points: u64 },
    /// A pellet sent the active pursuers fleeing.
    FleeStarted,
}

/// Output of one `SimState::update` call.
#[derive(Clone, Debug, Default)]
pub struct StepResult {
    pub events: Vec<SimEvent>,
}

impl StepResult {
    /// Whether any event of the given kind was emitted, ignoring payloads.
    pub fn has(&self, pred: impl Fn(&SimEventKind) -> bool) -> bool {
        self.events.iter().any(|e| pred(&e.kind))
    }
}

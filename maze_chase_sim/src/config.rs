// Data-driven game configuration.
//
// All tunable simulation parameters live in `GameConfig`, loaded from JSON
// by the host. The sim reads speeds, timers, scoring, item layout, and the
// pursuer roster from here instead of hard-coding them. Every field has a
// default (`#[serde(default)]`), so a config file only needs to name the
// values it changes; the defaults reproduce the classic four-pursuer game.
//
// Units: durations in milliseconds, speeds in tiles per millisecond. An
// actor's progress rate on an edge is its speed divided by the edge weight.
//
// See also: `sim.rs` which owns the `GameConfig` as part of `SimState`,
// `policy.rs` for the `TargetPolicy` each pursuer is configured with.
//
// **Critical constraint: determinism.** Config values feed directly into
// simulation logic. Replays must use the config they were recorded with.

use crate::error::Result;
use crate::policy::TargetPolicy;
use serde::{Deserialize, Serialize};

/// One entry of the pursuer roster. Pursuer `n` in the roster is actor
/// `n + 1` in the sim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PursuerConfig {
    pub name: String,
    pub policy: TargetPolicy,
    /// Time after each round start before the pursuer leaves its pen.
    pub wait_delay_ms: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Lives at session start.
    pub lives: u32,
    pub dot_points: u64,
    pub pellet_points: u64,
    /// A fleeing pursuer caught as the `n`th since the last pellet scores
    /// `ghost_base_points * 2^n`.
    pub ghost_base_points: u64,

    pub player_speed: f64,
    pub chase_speed: f64,
    pub flee_speed: f64,
    pub flee_duration_ms: f64,
    /// How long a caught pursuer holds at the spawn edge before chasing.
    pub respawn_delay_ms: f64,

    /// Pellet grid: first offset from each border, spacing between pellets,
    /// and the margin kept clear around the board's center lines.
    pub pellet_inset: i32,
    pub pellet_spacing: i32,
    pub pellet_margin: i32,

    /// Lower bound on every sub-step, so ties cannot stall the update loop.
    pub min_substep_ms: f64,
    /// Two on-edge positions closer than this (in edge fractions) coincide.
    /// Also the distance from an endpoint within which an actor counts as
    /// standing on the vertex.
    pub collision_tolerance: f64,

    pub pursuers: Vec<PursuerConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let pursuer = |name: &str, policy, wait_delay_ms| PursuerConfig {
            name: name.to_string(),
            policy,
            wait_delay_ms,
        };
        Self {
            lives: 3,
            dot_points: 10,
            pellet_points: 50,
            ghost_base_points: 100,
            player_speed: 0.004,
            chase_speed: 0.0038,
            flee_speed: 0.0025,
            flee_duration_ms: 7000.0,
            respawn_delay_ms: 3000.0,
            pellet_inset: 5,
            pellet_spacing: 15,
            pellet_margin: 7,
            min_substep_ms: 1e-7,
            collision_tolerance: 1e-6,
            pursuers: vec![
                pursuer("blinky", TargetPolicy::DirectChase, 2000.0),
                pursuer("pinky", TargetPolicy::Ambush { lookahead: 3 }, 4000.0),
                pursuer("inky", TargetPolicy::Pincer { partner: 0 }, 6000.0),
                pursuer("clyde", TargetPolicy::Threshold { radius: 10.0 }, 8000.0),
            ],
        }
    }
}

impl GameConfig {
    /// Parse a (possibly partial) JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

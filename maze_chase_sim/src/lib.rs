// maze_chase_sim, the pure Rust simulation core for a grid pursuit game.
//
// A player and a roster of pursuers move continuously along the edges of a
// maze graph built from a tile raster. The player collects items; pursuers
// chase, flee after a pellet, and respawn when caught. This crate holds all
// of that logic and nothing else: no rendering, no input devices, no wall
// clock. It can be tested, benchmarked, and run headless.
//
// Module overview:
// - `sim.rs`:         Top-level SimState, the continuous-time update loop, collisions.
// - `session.rs`:     Session: a SimState plus the event listeners attached to it.
// - `map.rs`:         GameMap: tile + elevation raster, loaded from rows, templates, or JSON.
// - `maze.rs`:        MazeGraph: vertices, directed edges, tunnels, elevation weights.
// - `pathfinding.rs`: Non-backtracking Dijkstra over the maze graph.
// - `pqueue.rs`:      MinPQueue: min priority queue with decrease-key.
// - `actor.rs`:       Locations, actors, pursuer FSM state, collision trajectories.
// - `policy.rs`:      TargetPolicy: how each pursuer picks the vertex it routes to.
// - `event.rs`:       SimEvent / StepResult: observable changes from each update.
// - `config.rs`:      GameConfig: all tunable parameters, including the pursuer roster.
// - `error.rs`:       SimError for fallible construction and queries.
// - `prng`:           Re-exported from `maze_chase_prng`: xoshiro256++ PRNG with SplitMix64 seeding.
// - `types.rs`:       GridCoord, Direction, vertex/edge IDs, tiles, items, game state.
//
// **Critical constraint: determinism.** Given the same map, config, seed,
// and sequence of `(command, dt)` inputs, the sim produces the same events
// and final state. All randomness comes from the seeded PRNG. No `HashMap`
// iteration feeds simulation order, no system time, no OS entropy. Use
// `BTreeMap` for ordered collections.

pub mod actor;
pub mod config;
pub mod error;
pub mod event;
pub mod map;
pub mod maze;
pub mod pathfinding;
pub mod policy;
pub mod pqueue;
pub use maze_chase_prng as prng;
pub mod session;
pub mod sim;
pub mod types;

#[cfg(test)]
mod test_util;

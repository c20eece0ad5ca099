// Core simulation state and the continuous-time update loop.
//
// `SimState` is the single source of truth for a game session. It owns the
// maze graph, the actors, the remaining items, score, lives, the discrete
// game state, the PRNG, and the config. The host drives it by calling
// `update(dt)` once per frame and `set_player_command(dir)` whenever the
// player asks for a new direction; every observable change comes back as a
// `SimEvent` in the returned `StepResult`.
//
// ## The update loop
//
// Time is continuous. One `update(total_dt)` call repeatedly takes the
// largest sub-step that cannot skip over anything interesting, in a fixed
// phase order:
//
//   1. Navigate: each actor standing on a vertex (progress exactly 1) picks
//      its next edge. The player follows the latest command, else keeps
//      going straight, else parks. Pursuers ask their policy for a target
//      and take the first edge of the non-backtracking shortest path.
//   2. Step size: the minimum of every moving actor's time to the end of its
//      edge, every pursuer's pending state timer, the earliest predicted
//      mid-edge collision, and the remaining budget; floored at
//      `min_substep_ms`.
//   3. Advance: progress moves (snapping to exactly 1 on arrival), pursuer
//      timers count down and fire their transitions.
//   4. Collisions: actor pairs (i < j, player first) that now share a spot.
//      Fleeing pursuers are caught and respawn; a chasing pursuer ends the
//      round; every other pairing is ignored.
//   5. Arrivals: the player collects the item on the vertex it reached.
//   6. Termination: stop early once no items remain or the round ended.
//
// Exactly one `BoardStateChanged` event closes every update.
//
// ## Mid-edge collisions
//
// Two actors can only meet between vertices if they share an undirected
// edge. Each actor's motion along that edge is a `Trajectory` in the edge's
// canonical orientation, and the meeting time is a linear solve (see
// `actor.rs`). Meetings at vertices need no prediction: arrivals already
// bound the step.
//
// ## Rounds and lives
//
// Losing a round costs a life. With lives left, every actor goes back to its
// start (pursuers into `Wait`) and the state returns to `Ready`; otherwise
// the game ends in `Defeat`. Collecting the last item ends it in `Victory`.
// A finished game ignores further updates.
//
// See also: `actor.rs` for `Actor`/`Location`/`Trajectory`, `policy.rs` for
// pursuer targets, `pathfinding.rs` for routing, `event.rs` for the events,
// `session.rs` for listener delivery, `config.rs` for every tunable.
//
// **Critical constraint: determinism.** Given the same map, config, seed,
// command sequence, and frame durations, the sim produces identical events.
// Items live in a `BTreeMap`, actors in a `Vec` in fixed order, and all
// randomness comes from the seeded `GameRng`.

use crate::actor::{Actor, Location, Pursuer, PursuerState, Trajectory};
use crate::config::GameConfig;
use crate::error::Result;
use crate::event::{RoundOutcome, SimEvent, SimEventKind, StepResult};
use crate::map::GameMap;
use crate::maze::MazeGraph;
use crate::pathfinding;
use crate::policy;
use crate::types::{Direction, EdgeId, GameState, GridCoord, Item, VertexId};
use log::{debug, info, trace};
use maze_chase_prng::GameRng;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Actor index of the player. Pursuer `n` is actor `n + 1`.
pub const PLAYER: usize = 0;

/// Top-level simulation state for one session.
#[derive(Clone, Debug)]
pub struct SimState {
    config: GameConfig,
    graph: MazeGraph,
    /// The player first, then pursuers in roster order.
    actors: Vec<Actor>,
    /// Uncollected items by vertex. BTreeMap for deterministic iteration.
    items: BTreeMap<VertexId, Item>,
    score: u64,
    lives: u32,
    state: GameState,
    /// Simulated ms since session start.
    time_ms: f64,
    /// Most recent direction requested by the host.
    player_command: Option<Direction>,
    /// Fleeing pursuers caught since the last pellet.
    pursuers_caught: u32,
    rng: GameRng,
}

/// Where an actor is, for coincidence tests.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Spot {
    Vertex(VertexId),
    /// Strictly inside an undirected edge, at canonical position `p`.
    Edge { key: EdgeId, p: f64 },
}

impl SimState {
    /// Create a session on `map` with the default config.
    pub fn new(map: &GameMap, seed: u64) -> Self {
        Self::with_config(map, seed, GameConfig::default())
    }

    /// Create a session on `map` with the given seed and config.
    ///
    /// Panics if the map lacks a starting edge; hosts loading untrusted maps
    /// should use `try_with_config`.
    pub fn with_config(map: &GameMap, seed: u64, config: GameConfig) -> Self {
        Self::try_with_config(map, seed, config).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Like `with_config`, but reports a map without player or pursuer start
    /// as `SimError::MissingStart`.
    pub fn try_with_config(map: &GameMap, seed: u64, config: GameConfig) -> Result<Self> {
        let graph = MazeGraph::build(map);
        let start = graph.try_player_starting_edge()?;
        let spawn = graph.try_pursuer_starting_edge()?;
        let items = place_items(&graph, &config);

        let mut actors = vec![Actor::player(Location::new(start, 1.0))];
        for p in &config.pursuers {
            actors.push(Actor::pursuer(
                Location::new(spawn, 0.0),
                Pursuer::new(p.name.clone(), p.policy.clone(), p.wait_delay_ms),
            ));
        }

        debug!(
            "new session: {}x{} maze, {} vertices, {} items, {} pursuers",
            graph.width(),
            graph.height(),
            graph.vertex_count(),
            items.len(),
            config.pursuers.len()
        );

        Ok(Self {
            lives: config.lives,
            config,
            graph,
            actors,
            items,
            score: 0,
            state: GameState::Ready,
            time_ms: 0.0,
            player_command: None,
            pursuers_caught: 0,
            rng: GameRng::for_stream(seed, "pursuer-targets"),
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn graph(&self) -> &MazeGraph {
        &self.graph
    }

    pub fn item_at(&self, v: VertexId) -> Option<Item> {
        self.items.get(&v).copied()
    }

    pub fn items(&self) -> &BTreeMap<VertexId, Item> {
        &self.items
    }

    pub fn items_remaining(&self) -> usize {
        self.items.len()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn player(&self) -> &Actor {
        &self.actors[PLAYER]
    }

    /// Pursuer `n` in roster order.
    pub fn pursuer(&self, n: usize) -> Option<&Actor> {
        self.actors.get(n + 1)
    }

    pub fn player_command(&self) -> Option<Direction> {
        self.player_command
    }

    /// Record the direction the player wants to take at the next vertex.
    pub fn set_player_command(&mut self, direction: Direction) {
        self.player_command = Some(direction);
    }

    // -----------------------------------------------------------------------
    // Update loop
    // -----------------------------------------------------------------------

    /// Advance the simulation by up to `total_dt` ms.
    pub fn update(&mut self, total_dt: f64) -> StepResult {
        let mut events = Vec::new();
        if self.state.is_over() {
            return StepResult { events };
        }
        if self.state == GameState::Ready {
            self.set_state(GameState::Playing, &mut events);
        }

        let mut elapsed = 0.0;
        let mut round_lost = false;
        while elapsed < total_dt {
            self.navigate();
            let dt = self.next_dt(total_dt - elapsed);
            trace!("t={:.3}ms: sub-step {dt:.6}ms", self.time_ms);

            elapsed += dt;
            self.time_ms += dt;
            self.advance(dt);

            if self.resolve_collisions(&mut events) {
                round_lost = true;
                break;
            }
            self.visit_vertices(&mut events);
            if self.items.is_empty() {
                self.finish(RoundOutcome::Victory, &mut events);
                break;
            }
        }

        if round_lost {
            self.lose_life(&mut events);
        }
        self.emit(SimEventKind::BoardStateChanged, &mut events);
        StepResult { events }
    }

    /// Phase 1: give every actor standing on a vertex its next edge.
    fn navigate(&mut self) {
        for idx in 0..self.actors.len() {
            let location = self.actors[idx].location;
            let Some(here) = location.arrived_at(&self.graph) else {
                continue;
            };
            let next = if idx == PLAYER {
                self.player_next_edge(here, location.edge)
            } else {
                self.pursuer_next_edge(idx, here, location.edge)
            };
            if let Some(edge) = next {
                self.take_edge(idx, here, edge);
            }
        }
    }

    /// Put actor `idx`, standing on `here`, at the start of `edge`.
    fn take_edge(&mut self, idx: usize, here: VertexId, edge: EdgeId) {
        assert_eq!(
            self.graph.edge(edge).src,
            here,
            "illegal next edge {edge:?} for actor {idx} at vertex {here:?}"
        );
        self.actors[idx].location = Location::new(edge, 0.0);
    }

    /// The commanded direction if open, else straight on, else park.
    fn player_next_edge(&self, here: VertexId, arrived_by: EdgeId) -> Option<EdgeId> {
        self.player_command
            .and_then(|dir| self.graph.edge_in_direction(here, dir))
            .or_else(|| {
                let straight = self.graph.edge(arrived_by).direction;
                self.graph.edge_in_direction(here, straight)
            })
    }

    /// First edge toward the pursuer's target, or a non-reversing default
    /// when it has no target or no usable path.
    fn pursuer_next_edge(&mut self, idx: usize, here: VertexId, arrived_by: EdgeId) -> Option<EdgeId> {
        let target = policy::select_target(&self.graph, &self.actors, idx, &mut self.rng);
        let routed = target.and_then(|t| {
            pathfinding::shortest_non_backtracking_path(&self.graph, here, t, Some(arrived_by))
                .ok()
                .and_then(|path| path.first().copied())
        });
        routed.or_else(|| self.default_edge(here, arrived_by))
    }

    /// Keep going straight; otherwise turn, trying directions in
    /// `Direction::ALL` order; only reverse when nothing else is open.
    fn default_edge(&self, here: VertexId, arrived_by: EdgeId) -> Option<EdgeId> {
        let back = self.graph.reverse(arrived_by);
        let straight = self.graph.edge(arrived_by).direction;
        self.graph
            .edge_in_direction(here, straight)
            .or_else(|| {
                Direction::ALL
                    .into_iter()
                    .filter_map(|dir| self.graph.edge_in_direction(here, dir))
                    .find(|&e| e != back)
            })
            .or(Some(back))
    }

    /// Speed in tiles per ms for the actor's current role and state.
    fn speed(&self, actor: &Actor) -> f64 {
        match actor.pursuer_state() {
            None => self.config.player_speed,
            Some(state) if state.is_holding() => 0.0,
            Some(PursuerState::Flee) => self.config.flee_speed,
            Some(_) => self.config.chase_speed,
        }
    }

    /// Progress per ms. Zero for holding pursuers and for actors parked at
    /// the end of their edge.
    fn progress_rate(&self, actor: &Actor) -> f64 {
        if actor.location.progress >= 1.0 {
            return 0.0;
        }
        self.speed(actor) / self.graph.edge(actor.location.edge).weight
    }

    fn time_to_edge_end(&self, actor: &Actor) -> f64 {
        let rate = self.progress_rate(actor);
        if rate > 0.0 {
            (1.0 - actor.location.progress) / rate
        } else {
            f64::INFINITY
        }
    }

    /// Phase 2: the largest safe sub-step, at most `budget`.
    fn next_dt(&self, budget: f64) -> f64 {
        let mut dt = budget.min(self.next_collision_time());
        for actor in &self.actors {
            dt = dt.min(self.time_to_edge_end(actor));
            if let Some(timer) = actor.as_pursuer().and_then(|p| p.timer_ms) {
                dt = dt.min(timer);
            }
        }
        dt.max(self.config.min_substep_ms)
    }

    /// Earliest strictly-future meeting of two actors on a shared edge.
    fn next_collision_time(&self) -> f64 {
        let mut by_edge: BTreeMap<EdgeId, SmallVec<[Trajectory; 4]>> = BTreeMap::new();
        let mut earliest = f64::INFINITY;
        for actor in &self.actors {
            let mine = Trajectory::of(&self.graph, &actor.location, self.progress_rate(actor));
            let mates = by_edge.entry(mine.key).or_default();
            for other in mates.iter() {
                if let Some(t) = mine.collision_time(other) {
                    earliest = earliest.min(t);
                }
            }
            mates.push(mine);
        }
        earliest
    }

    /// Phase 3: move everyone forward by `dt` and run pursuer timers.
    fn advance(&mut self, dt: f64) {
        for idx in 0..self.actors.len() {
            let rate = self.progress_rate(&self.actors[idx]);
            let to_end = self.time_to_edge_end(&self.actors[idx]);
            let location = &mut self.actors[idx].location;
            if rate > 0.0 {
                location.progress = if dt >= to_end {
                    1.0
                } else {
                    (location.progress + rate * dt).min(1.0)
                };
            }

            let Some(pursuer) = self.actors[idx].as_pursuer_mut() else {
                continue;
            };
            if let Some(timer) = pursuer.timer_ms.as_mut() {
                *timer -= dt;
                if *timer <= 0.0 {
                    debug!(
                        "t={:.1}ms: {} {:?} -> Chase",
                        self.time_ms, pursuer.name, pursuer.state
                    );
                    pursuer.enter(PursuerState::Chase, None);
                }
            }
        }
    }

    fn spot(&self, location: &Location) -> Spot {
        let tol = self.config.collision_tolerance;
        let edge = self.graph.edge(location.edge);
        if location.progress <= tol {
            Spot::Vertex(edge.src)
        } else if location.progress >= 1.0 - tol {
            Spot::Vertex(edge.dst)
        } else {
            let t = Trajectory::of(&self.graph, location, 0.0);
            Spot::Edge { key: t.key, p: t.p0 }
        }
    }

    fn coincide(&self, a: usize, b: usize) -> bool {
        match (self.spot(&self.actors[a].location), self.spot(&self.actors[b].location)) {
            (Spot::Vertex(x), Spot::Vertex(y)) => x == y,
            (Spot::Edge { key: ka, p: pa }, Spot::Edge { key: kb, p: pb }) => {
                ka == kb && (pa - pb).abs() <= self.config.collision_tolerance
            }
            _ => false,
        }
    }

    /// Phase 4. Returns true when a chasing pursuer caught the player.
    fn resolve_collisions(&mut self, events: &mut Vec<SimEvent>) -> bool {
        let n = self.actors.len();
        for a in 0..n {
            for b in (a + 1)..n {
                // Pursuer-pursuer meetings are ignored.
                if !self.actors[a].is_player() || !self.coincide(a, b) {
                    continue;
                }
                match self.actors[b].pursuer_state() {
                    Some(PursuerState::Flee) => self.catch_pursuer(b, events),
                    Some(PursuerState::Chase) => {
                        debug!("t={:.1}ms: player caught by pursuer {}", self.time_ms, b - 1);
                        return true;
                    }
                    _ => {}
                }
            }
        }
        false
    }

    fn catch_pursuer(&mut self, idx: usize, events: &mut Vec<SimEvent>) {
        self.pursuers_caught += 1;
        let points = self
            .config
            .ghost_base_points
            .saturating_mul(2u64.saturating_pow(self.pursuers_caught));
        debug!(
            "t={:.1}ms: caught pursuer {} (#{} since pellet) for {points}",
            self.time_ms,
            idx - 1,
            self.pursuers_caught
        );
        self.emit(
            SimEventKind::PursuerCaught {
                pursuer: idx - 1,
                points,
            },
            events,
        );
        self.add_score(points, events);

        let spawn = self.graph.pursuer_starting_edge();
        let delay = self.config.respawn_delay_ms;
        let actor = &mut self.actors[idx];
        actor.location = Location::new(spawn, 0.0);
        if let Some(p) = actor.as_pursuer_mut() {
            p.enter(PursuerState::Respawn, Some(delay));
        }
    }

    /// Phase 5: the player collects whatever is on the vertex it reached.
    fn visit_vertices(&mut self, events: &mut Vec<SimEvent>) {
        let Some(v) = self.actors[PLAYER].location.arrived_at(&self.graph) else {
            return;
        };
        let Some(item) = self.items.remove(&v) else {
            return;
        };
        self.emit(SimEventKind::ItemCollected { vertex: v, item }, events);
        match item {
            Item::Dot => self.add_score(self.config.dot_points, events),
            Item::Pellet => {
                self.add_score(self.config.pellet_points, events);
                self.start_flee(events);
            }
        }
    }

    /// Send every active pursuer fleeing, restarting the flee timer.
    fn start_flee(&mut self, events: &mut Vec<SimEvent>) {
        debug!("t={:.1}ms: pellet collected, pursuers flee", self.time_ms);
        self.pursuers_caught = 0;
        let duration = self.config.flee_duration_ms;
        for p in self.actors.iter_mut().filter_map(Actor::as_pursuer_mut) {
            if matches!(p.state, PursuerState::Chase | PursuerState::Flee) {
                p.enter(PursuerState::Flee, Some(duration));
            }
        }
        self.emit(SimEventKind::FleeStarted, events);
    }

    // -----------------------------------------------------------------------
    // Score, lives, and game state
    // -----------------------------------------------------------------------

    fn emit(&self, kind: SimEventKind, events: &mut Vec<SimEvent>) {
        events.push(SimEvent {
            time_ms: self.time_ms,
            kind,
        });
    }

    fn add_score(&mut self, points: u64, events: &mut Vec<SimEvent>) {
        let old = self.score;
        self.score += points;
        self.emit(
            SimEventKind::ScoreChanged {
                old,
                new: self.score,
            },
            events,
        );
    }

    fn set_state(&mut self, new: GameState, events: &mut Vec<SimEvent>) {
        let old = self.state;
        self.state = new;
        self.emit(SimEventKind::GameStateChanged { old, new }, events);
    }

    fn lose_life(&mut self, events: &mut Vec<SimEvent>) {
        let old = self.lives;
        self.lives = old.saturating_sub(1);
        self.emit(
            SimEventKind::LivesChanged {
                old,
                new: self.lives,
            },
            events,
        );
        if self.lives > 0 {
            self.reset_actors();
            self.set_state(GameState::Ready, events);
        } else {
            self.finish(RoundOutcome::Defeat, events);
        }
    }

    fn finish(&mut self, outcome: RoundOutcome, events: &mut Vec<SimEvent>) {
        let state = match outcome {
            RoundOutcome::Victory => GameState::Victory,
            RoundOutcome::Defeat => GameState::Defeat,
        };
        info!(
            "t={:.1}ms: game over ({outcome:?}), score {}",
            self.time_ms, self.score
        );
        self.set_state(state, events);
        self.emit(SimEventKind::RoundResult { outcome }, events);
    }

    /// Player back to its start, pursuers back to `Wait` at the spawn edge.
    fn reset_actors(&mut self) {
        let start = self.graph.player_starting_edge();
        let spawn = self.graph.pursuer_starting_edge();
        for actor in &mut self.actors {
            match actor.as_pursuer_mut() {
                None => actor.location = Location::new(start, 1.0),
                Some(p) => {
                    let delay = p.wait_delay_ms;
                    p.enter(PursuerState::Wait, Some(delay));
                    actor.location = Location::new(spawn, 0.0);
                }
            }
        }
    }
}

/// Pellets at the mirrored grid offsets from `config`, dots on every other
/// interior vertex.
fn place_items(graph: &MazeGraph, config: &GameConfig) -> BTreeMap<VertexId, Item> {
    let (w, h) = (graph.width(), graph.height());
    let step = config.pellet_spacing.max(1) as usize;
    let mut items = BTreeMap::new();

    for i in (config.pellet_inset..w / 2 - config.pellet_margin).step_by(step) {
        for j in (config.pellet_inset..h / 2 - config.pellet_margin).step_by(step) {
            for (x, y) in [(i, j), (w - 1 - i, j), (i, h - 1 - j), (w - 1 - i, h - 1 - j)] {
                if let Some(v) = graph.vertex_at(GridCoord::new(x, y)) {
                    items.insert(v, Item::Pellet);
                }
            }
        }
    }

    for v in graph.vertices() {
        let (i, j) = (v.loc.i, v.loc.j);
        if (2..w - 2).contains(&i) && (2..h - 2).contains(&j) {
            items.entry(v.id).or_insert(Item::Dot);
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PursuerConfig;
    use crate::policy::TargetPolicy;
    use crate::test_util::{demo_map, lattice_map};
    use approx::assert_relative_eq;

    /// Power-of-two speeds keep edge times exact on flat maps: the player
    /// crosses a tile in 256 ms, a chasing pursuer in 512 ms, a fleeing one
    /// in 1024 ms.
    fn test_config(pursuers: Vec<PursuerConfig>) -> GameConfig {
        GameConfig {
            player_speed: 1.0 / 256.0,
            chase_speed: 1.0 / 512.0,
            flee_speed: 1.0 / 1024.0,
            flee_duration_ms: 4096.0,
            respawn_delay_ms: 1024.0,
            pursuers,
            ..GameConfig::default()
        }
    }

    /// `n` direct chasers that stay in the pen for the whole test.
    fn roster(n: usize) -> Vec<PursuerConfig> {
        (0..n)
            .map(|k| PursuerConfig {
                name: format!("p{k}"),
                policy: TargetPolicy::DirectChase,
                wait_delay_ms: 100_000.0,
            })
            .collect()
    }

    fn sim_with(pursuers: usize) -> SimState {
        SimState::with_config(&lattice_map(5, 5), 42, test_config(roster(pursuers)))
    }

    fn vertex(sim: &SimState, i: i32, j: i32) -> VertexId {
        sim.graph().vertex_at(GridCoord::new(i, j)).unwrap()
    }

    fn edge(sim: &SimState, i: i32, j: i32, dir: Direction) -> EdgeId {
        sim.graph().edge_in_direction(vertex(sim, i, j), dir).unwrap()
    }

    fn set_pursuer(
        sim: &mut SimState,
        n: usize,
        location: Location,
        state: PursuerState,
        timer_ms: Option<f64>,
    ) {
        let actor = &mut sim.actors[n + 1];
        actor.location = location;
        actor.as_pursuer_mut().unwrap().enter(state, timer_ms);
    }

    fn kinds(result: &StepResult) -> Vec<SimEventKind> {
        result.events.iter().map(|e| e.kind.clone()).collect()
    }

    fn board_events(result: &StepResult) -> usize {
        result
            .events
            .iter()
            .filter(|e| e.kind == SimEventKind::BoardStateChanged)
            .count()
    }

    /// Player at (5, 8) heading right, pursuer 0 at (6, 8) heading left.
    fn head_on(sim: &mut SimState, state: PursuerState, timer_ms: Option<f64>) {
        sim.actors[PLAYER].location = Location::new(edge(sim, 5, 8, Direction::Right), 0.0);
        let toward = Location::new(edge(sim, 6, 8, Direction::Left), 0.0);
        set_pursuer(sim, 0, toward, state, timer_ms);
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn new_session_layout() {
        let sim = SimState::new(&lattice_map(5, 5), 1);
        assert_eq!(sim.state(), GameState::Ready);
        assert_eq!((sim.lives(), sim.score()), (3, 0));
        // Every lattice vertex is interior; the board is too small for pellets.
        assert_eq!(sim.items_remaining(), sim.graph().vertex_count());
        assert!(sim.items().values().all(|&item| item == Item::Dot));

        let player = sim.player().location;
        assert_eq!(player.progress, 1.0);
        assert_eq!(player.arrived_at(sim.graph()), Some(vertex(&sim, 8, 11)));

        assert_eq!(sim.actors().len(), 5);
        for n in 0..4 {
            let actor = sim.pursuer(n).unwrap();
            assert_eq!(actor.location, Location::new(sim.graph().pursuer_starting_edge(), 0.0));
            assert_eq!(actor.pursuer_state(), Some(PursuerState::Wait));
        }
        assert_eq!(sim.pursuer(0).unwrap().as_pursuer().unwrap().timer_ms, Some(2000.0));
        assert!(sim.pursuer(4).is_none());
    }

    #[test]
    fn pellets_mirror_across_large_board() {
        let sim = SimState::new(&lattice_map(10, 10), 1);
        let pellets: Vec<GridCoord> = sim
            .items()
            .iter()
            .filter(|&(_, &item)| item == Item::Pellet)
            .map(|(&v, _)| sim.graph().vertex(v).loc)
            .collect();
        let mut expected = vec![
            GridCoord::new(5, 5),
            GridCoord::new(26, 5),
            GridCoord::new(5, 26),
            GridCoord::new(26, 26),
        ];
        let mut found = pellets.clone();
        found.sort();
        expected.sort();
        assert_eq!(found, expected);
        assert_eq!(sim.items_remaining(), sim.graph().vertex_count());
    }

    // -----------------------------------------------------------------------
    // Player movement
    // -----------------------------------------------------------------------

    #[test]
    fn first_update_starts_play_and_board_event_closes_each_update() {
        let mut sim = sim_with(0);
        let first = sim.update(16.0);
        assert_eq!(
            first.events[0].kind,
            SimEventKind::GameStateChanged {
                old: GameState::Ready,
                new: GameState::Playing
            }
        );
        assert_eq!(first.events.last().unwrap().kind, SimEventKind::BoardStateChanged);
        assert_eq!(board_events(&first), 1);

        for _ in 0..40 {
            let r = sim.update(16.0);
            assert_eq!(board_events(&r), 1);
            assert!(!r.has(|k| matches!(k, SimEventKind::GameStateChanged { .. })));
        }
        assert_relative_eq!(sim.time_ms(), 41.0 * 16.0, epsilon = 1e-9);
    }

    #[test]
    fn player_keeps_straight_without_command() {
        let mut sim = sim_with(0);
        let result = sim.update(256.0);
        let player = sim.player().location;
        assert_eq!(player.arrived_at(sim.graph()), Some(vertex(&sim, 9, 11)));
        assert_eq!(sim.score(), 10);
        assert!(kinds(&result).contains(&SimEventKind::ItemCollected {
            vertex: vertex(&sim, 9, 11),
            item: Item::Dot
        }));
    }

    #[test]
    fn command_turns_at_next_vertex() {
        let mut sim = sim_with(0);
        sim.set_player_command(Direction::Down);
        sim.update(256.0);
        assert_eq!(sim.player().location.arrived_at(sim.graph()), Some(vertex(&sim, 8, 12)));
    }

    #[test]
    fn blocked_command_keeps_going_straight() {
        let mut sim = sim_with(0);
        sim.update(256.0);
        // (9, 10) is a wall block.
        sim.set_player_command(Direction::Up);
        sim.update(256.0);
        assert_eq!(sim.player().location.arrived_at(sim.graph()), Some(vertex(&sim, 10, 11)));
        assert_eq!(sim.player_command(), Some(Direction::Up));
    }

    #[test]
    fn parked_player_does_not_stall_the_loop() {
        let mut sim = sim_with(0);
        // Arrive at the top-left corner moving left: no way on, no command.
        let into_corner = Location::new(edge(&sim, 3, 2, Direction::Left), 1.0);
        sim.actors[PLAYER].location = into_corner;
        sim.update(1000.0);
        assert_eq!(sim.player().location, into_corner);
        assert_relative_eq!(sim.time_ms(), 1000.0);
        assert_eq!(sim.item_at(vertex(&sim, 2, 2)), None, "corner dot collected");
    }

    // -----------------------------------------------------------------------
    // Pursuer state machine
    // -----------------------------------------------------------------------

    #[test]
    fn waiting_pursuer_leaves_after_its_delay() {
        let config = test_config(vec![PursuerConfig {
            name: "early".into(),
            policy: TargetPolicy::DirectChase,
            wait_delay_ms: 500.0,
        }]);
        let mut sim = SimState::with_config(&lattice_map(5, 5), 3, config);

        sim.update(400.0);
        let p = sim.pursuer(0).unwrap();
        assert_eq!(p.pursuer_state(), Some(PursuerState::Wait));
        assert_eq!(p.location.progress, 0.0);

        sim.update(200.0);
        let p = sim.pursuer(0).unwrap();
        assert_eq!(p.pursuer_state(), Some(PursuerState::Chase));
        assert_eq!(p.as_pursuer().unwrap().timer_ms, None);
        // Moving for the last 100 ms at 512 ms per tile.
        assert_relative_eq!(p.location.progress, 100.0 / 512.0, epsilon = 1e-12);
    }

    #[test]
    fn pellet_sends_active_pursuers_fleeing() {
        let mut sim = sim_with(2);
        let spawn = sim.graph().pursuer_starting_edge();
        set_pursuer(&mut sim, 0, Location::new(spawn, 0.0), PursuerState::Chase, None);
        let pellet_at = vertex(&sim, 9, 11);
        sim.items.insert(pellet_at, Item::Pellet);

        let result = sim.update(256.0);
        assert_eq!(sim.score(), 50);
        assert_eq!(sim.pursuer(0).unwrap().pursuer_state(), Some(PursuerState::Flee));
        assert_eq!(sim.pursuer(0).unwrap().as_pursuer().unwrap().timer_ms, Some(4096.0));
        assert_eq!(sim.pursuer(1).unwrap().pursuer_state(), Some(PursuerState::Wait));

        let events = kinds(&result);
        let collected = events
            .iter()
            .position(|k| {
                *k == SimEventKind::ItemCollected {
                    vertex: pellet_at,
                    item: Item::Pellet,
                }
            })
            .unwrap();
        assert_eq!(events[collected + 1], SimEventKind::ScoreChanged { old: 0, new: 50 });
        assert_eq!(events[collected + 2], SimEventKind::FleeStarted);
    }

    #[test]
    fn second_pellet_restarts_flee_timer() {
        let mut sim = sim_with(1);
        let spawn = sim.graph().pursuer_starting_edge();
        set_pursuer(&mut sim, 0, Location::new(spawn, 0.0), PursuerState::Flee, Some(1000.0));
        sim.items.insert(vertex(&sim, 9, 11), Item::Pellet);
        sim.update(256.0);
        let p = sim.pursuer(0).unwrap().as_pursuer().unwrap();
        assert_eq!(p.state, PursuerState::Flee);
        assert_eq!(p.timer_ms, Some(4096.0));
    }

    #[test]
    fn flee_expires_back_to_chase() {
        let mut sim = sim_with(1);
        let spawn = sim.graph().pursuer_starting_edge();
        set_pursuer(&mut sim, 0, Location::new(spawn, 0.0), PursuerState::Flee, Some(100.0));
        sim.update(150.0);
        let p = sim.pursuer(0).unwrap();
        assert_eq!(p.pursuer_state(), Some(PursuerState::Chase));
        assert_eq!(p.as_pursuer().unwrap().timer_ms, None);
        assert_relative_eq!(
            p.location.progress,
            100.0 / 1024.0 + 50.0 / 512.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn respawning_pursuer_holds_then_chases() {
        let mut sim = sim_with(1);
        let spawn = sim.graph().pursuer_starting_edge();
        set_pursuer(&mut sim, 0, Location::new(spawn, 0.0), PursuerState::Respawn, Some(300.0));
        sim.items.insert(vertex(&sim, 9, 11), Item::Pellet);

        sim.update(200.0);
        let p = sim.pursuer(0).unwrap();
        assert_eq!(p.pursuer_state(), Some(PursuerState::Respawn));
        assert_eq!(p.location.progress, 0.0);

        // The pellet at 256 ms does not touch a respawning pursuer.
        sim.update(200.0);
        let p = sim.pursuer(0).unwrap();
        assert_eq!(p.pursuer_state(), Some(PursuerState::Chase));
        assert_relative_eq!(p.location.progress, 100.0 / 512.0, epsilon = 1e-12);
    }

    #[test]
    fn stuck_pursuer_defaults_to_non_reversing_turn() {
        let mut sim = sim_with(1);
        // A fleeing direct chaser standing on its own corner, arrived moving
        // left: its path is empty, straight on is a wall, and right would
        // reverse, so it turns down.
        let arrived_by = edge(&sim, 3, 2, Direction::Left);
        set_pursuer(&mut sim, 0, Location::new(arrived_by, 1.0), PursuerState::Flee, Some(4096.0));
        let corner = vertex(&sim, 2, 2);
        let next = sim.pursuer_next_edge(1, corner, arrived_by).unwrap();
        assert_eq!(sim.graph().edge(next).direction, Direction::Down);
    }

    #[test]
    #[should_panic(expected = "illegal next edge")]
    fn next_edge_must_start_at_current_vertex() {
        let mut sim = sim_with(0);
        let here = vertex(&sim, 2, 2);
        let elsewhere = edge(&sim, 8, 8, Direction::Right);
        sim.take_edge(PLAYER, here, elsewhere);
    }

    // -----------------------------------------------------------------------
    // Collisions, lives, and game end
    // -----------------------------------------------------------------------

    #[test]
    fn chasing_pursuer_head_on_costs_a_life() {
        let mut sim = sim_with(1);
        sim.update(0.0);
        head_on(&mut sim, PursuerState::Chase, None);

        let result = sim.update(200.0);
        // Gap of one tile closing at 1/256 + 1/512 tiles per ms.
        assert_relative_eq!(sim.time_ms(), 512.0 / 3.0, epsilon = 1e-9);
        assert_eq!(sim.lives(), 2);
        assert_eq!(sim.state(), GameState::Ready);

        let events = kinds(&result);
        assert!(events.contains(&SimEventKind::LivesChanged { old: 3, new: 2 }));
        assert!(events.contains(&SimEventKind::GameStateChanged {
            old: GameState::Playing,
            new: GameState::Ready
        }));
        assert_eq!(*events.last().unwrap(), SimEventKind::BoardStateChanged);

        let start = Location::new(sim.graph().player_starting_edge(), 1.0);
        assert_eq!(sim.player().location, start);
        let p = sim.pursuer(0).unwrap();
        assert_eq!(p.location, Location::new(sim.graph().pursuer_starting_edge(), 0.0));
        assert_eq!(p.pursuer_state(), Some(PursuerState::Wait));
        assert_eq!(p.as_pursuer().unwrap().timer_ms, Some(100_000.0));
    }

    #[test]
    fn fleeing_pursuers_score_doubling_points() {
        let mut sim = sim_with(2);
        sim.update(0.0);
        head_on(&mut sim, PursuerState::Flee, Some(4096.0));
        let halfway = Location::new(edge(&sim, 6, 8, Direction::Left), 0.5);
        set_pursuer(&mut sim, 1, halfway, PursuerState::Flee, Some(4096.0));

        let result = sim.update(250.0);
        let caught: Vec<(usize, u64)> = result
            .events
            .iter()
            .filter_map(|e| match e.kind {
                SimEventKind::PursuerCaught { pursuer, points } => Some((pursuer, points)),
                _ => None,
            })
            .collect();
        assert_eq!(caught, vec![(1, 200), (0, 400)]);
        assert_eq!(sim.score(), 600);
        assert_eq!(sim.lives(), 3);

        let spawn = Location::new(sim.graph().pursuer_starting_edge(), 0.0);
        for n in 0..2 {
            let p = sim.pursuer(n).unwrap();
            assert_eq!(p.location, spawn);
            assert_eq!(p.pursuer_state(), Some(PursuerState::Respawn));
        }
    }

    #[test]
    fn waiting_pursuers_are_harmless() {
        let mut sim = sim_with(1);
        sim.update(0.0);
        head_on(&mut sim, PursuerState::Wait, Some(100_000.0));
        sim.update(300.0);
        assert_eq!(sim.lives(), 3);
        assert_eq!(sim.state(), GameState::Playing);
    }

    #[test]
    fn losing_last_life_is_defeat_and_freezes_the_game() {
        let mut sim = sim_with(1);
        sim.lives = 1;
        sim.update(0.0);
        head_on(&mut sim, PursuerState::Chase, None);

        let result = sim.update(200.0);
        assert_eq!(sim.state(), GameState::Defeat);
        assert_eq!(sim.lives(), 0);
        let events = kinds(&result);
        assert!(events.contains(&SimEventKind::LivesChanged { old: 1, new: 0 }));
        assert!(events.contains(&SimEventKind::RoundResult {
            outcome: RoundOutcome::Defeat
        }));

        let frozen_at = sim.time_ms();
        let after = sim.update(100.0);
        assert!(after.events.is_empty());
        assert_eq!(sim.time_ms(), frozen_at);
    }

    #[test]
    fn collecting_last_item_wins_early() {
        let mut sim = sim_with(0);
        sim.items.clear();
        sim.items.insert(vertex(&sim, 9, 11), Item::Dot);

        let result = sim.update(300.0);
        assert_eq!(sim.state(), GameState::Victory);
        assert_eq!(sim.time_ms(), 256.0, "the loop stops at the winning arrival");
        let events = kinds(&result);
        assert!(events.contains(&SimEventKind::RoundResult {
            outcome: RoundOutcome::Victory
        }));
        assert_eq!(*events.last().unwrap(), SimEventKind::BoardStateChanged);
        assert!(sim.update(16.0).events.is_empty());
    }

    // -----------------------------------------------------------------------
    // Whole-session properties
    // -----------------------------------------------------------------------

    fn scripted_run(seed: u64) -> (Vec<SimEvent>, SimState) {
        let mut sim = SimState::new(&lattice_map(5, 5), seed);
        let mut log = Vec::new();
        for frame in 0..600 {
            if frame % 45 == 0 {
                sim.set_player_command(Direction::ALL[(frame / 45) % 4]);
            }
            let result = sim.update(16.0);
            assert!(board_events(&result) <= 1);
            for actor in sim.actors() {
                assert!((0.0..=1.0).contains(&actor.location.progress));
            }
            log.extend(result.events);
        }
        (log, sim)
    }

    #[test]
    fn same_seed_and_inputs_replay_identically() {
        let (events_a, sim_a) = scripted_run(7);
        let (events_b, sim_b) = scripted_run(7);
        assert_eq!(events_a, events_b);
        assert_eq!(sim_a.score(), sim_b.score());
        assert_eq!(sim_a.time_ms(), sim_b.time_ms());
        let locations = |s: &SimState| s.actors().iter().map(|a| a.location).collect::<Vec<_>>();
        assert_eq!(locations(&sim_a), locations(&sim_b));
    }

    #[test]
    fn scripted_run_scores_and_moves() {
        let (events, sim) = scripted_run(11);
        assert!(sim.score() > 0);
        assert!(events.iter().any(|e| matches!(e.kind, SimEventKind::ItemCollected { .. })));
    }

    #[test]
    fn pursuers_meeting_each_other_is_ignored() {
        let mut sim = sim_with(2);
        sim.update(0.0);
        let corner = vertex(&sim, 2, 2);
        sim.items.remove(&corner);
        sim.actors[PLAYER].location = Location::new(edge(&sim, 3, 2, Direction::Left), 1.0);
        let right = edge(&sim, 5, 8, Direction::Right);
        let left = edge(&sim, 6, 8, Direction::Left);
        set_pursuer(&mut sim, 0, Location::new(right, 0.0), PursuerState::Chase, None);
        set_pursuer(&mut sim, 1, Location::new(left, 0.0), PursuerState::Chase, None);

        // They meet mid-edge at 256 ms and pass through each other.
        let result = sim.update(300.0);
        assert_eq!((sim.lives(), sim.score()), (3, 0));
        assert_eq!(sim.state(), GameState::Playing);
        assert!(!result.has(|k| matches!(
            k,
            SimEventKind::LivesChanged { .. } | SimEventKind::PursuerCaught { .. }
        )));
        for (n, e) in [(0, right), (1, left)] {
            let p = sim.pursuer(n).unwrap();
            assert_eq!(p.pursuer_state(), Some(PursuerState::Chase));
            assert_eq!(p.location.edge, e);
            assert_relative_eq!(p.location.progress, 300.0 / 512.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn head_on_capture_through_tunnel() {
        let mut sim = SimState::with_config(&demo_map(), 42, test_config(roster(1)));
        sim.update(0.0);
        let west = edge(&sim, 0, 14, Direction::Left);
        let east = edge(&sim, 31, 14, Direction::Right);
        let graph = sim.graph();
        assert_eq!(graph.vertex(graph.edge(west).dst).loc, GridCoord::new(31, 14));
        assert_eq!(graph.reverse(west), east);
        assert_eq!(graph.undirected_key(west), graph.undirected_key(east));

        let player_rate = (1.0 / 256.0) / graph.edge(west).weight;
        let pursuer_rate = (1.0 / 512.0) / graph.edge(east).weight;
        let meet = 1.0 / (player_rate + pursuer_rate);

        sim.actors[PLAYER].location = Location::new(west, 0.0);
        set_pursuer(&mut sim, 0, Location::new(east, 0.0), PursuerState::Chase, None);
        let result = sim.update(400.0);

        assert_relative_eq!(sim.time_ms(), meet, epsilon = 1e-9);
        assert_eq!(sim.lives(), 2);
        assert_eq!(sim.state(), GameState::Ready);
        assert!(kinds(&result).contains(&SimEventKind::LivesChanged { old: 3, new: 2 }));
    }

    #[test]
    fn map_without_pursuer_start_is_rejected() {
        let map = GameMap::from_template("wwwwwww\nwwwwwww\nwpppppw\nwwwwwww", |_| 0.0).unwrap();
        let result = SimState::try_with_config(&map, 1, GameConfig::default());
        assert!(matches!(
            result,
            Err(crate::error::SimError::MissingStart { role: "pursuer", .. })
        ));
    }
}

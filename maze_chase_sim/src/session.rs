// A game session: one `SimState` plus the listeners observing it.
//
// Hosts that prefer callbacks over polling `StepResult`s register listeners
// here. The listener list belongs to the session: it is created empty when
// the session starts and dropped with it, so nothing outlives a game.
// Delivery is synchronous, in emission order, to every listener in
// registration order, before `update` returns.
//
// See also: `sim.rs` for the state being driven, `event.rs` for the events.

use crate::config::GameConfig;
use crate::error::Result;
use crate::event::{SimEvent, StepResult};
use crate::map::GameMap;
use crate::sim::SimState;
use crate::types::Direction;

type Listener = Box<dyn FnMut(&SimEvent)>;

pub struct Session {
    sim: SimState,
    listeners: Vec<Listener>,
}

impl Session {
    pub fn new(map: &GameMap, seed: u64, config: GameConfig) -> Self {
        Self::from_sim(SimState::with_config(map, seed, config))
    }

    /// Fallible `new` for maps from outside the program.
    pub fn try_new(map: &GameMap, seed: u64, config: GameConfig) -> Result<Self> {
        SimState::try_with_config(map, seed, config).map(Self::from_sim)
    }

    pub fn from_sim(sim: SimState) -> Self {
        Self {
            sim,
            listeners: Vec::new(),
        }
    }

    /// Register `listener` for every event from now on.
    pub fn subscribe(&mut self, listener: impl FnMut(&SimEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn sim(&self) -> &SimState {
        &self.sim
    }

    pub fn set_player_command(&mut self, direction: Direction) {
        self.sim.set_player_command(direction);
    }

    /// Advance the sim and deliver its events. The events are also returned.
    pub fn update(&mut self, dt_ms: f64) -> StepResult {
        let result = self.sim.update(dt_ms);
        for event in &result.events {
            for listener in &mut self.listeners {
                listener(event);
            }
        }
        result
    }

    /// End the session, dropping its listeners.
    pub fn into_sim(self) -> SimState {
        self.sim
    }
}

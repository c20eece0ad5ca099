// Scripted player input for headless runs.
//
// A script is a JSON array of timed commands, e.g.
// `[{"at_ms": 0, "direction": "Left"}, {"at_ms": 1500, "direction": "Up"}]`.
// Commands are applied in time order; each one is handed to the sim at the
// first frame boundary at or after its timestamp.

use maze_chase_sim::types::Direction;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct TimedCommand {
    pub at_ms: f64,
    pub direction: Direction,
}

/// Time-ordered commands with a cursor over the ones already issued.
#[derive(Debug, Default)]
pub struct InputScript {
    commands: Vec<TimedCommand>,
    next: usize,
}

impl InputScript {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut commands: Vec<TimedCommand> = serde_json::from_str(json)?;
        // Stable, so equal timestamps keep file order.
        commands.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
        Ok(Self { commands, next: 0 })
    }

    /// Commands due by `now_ms` that have not been issued yet.
    pub fn due(&mut self, now_ms: f64) -> &[TimedCommand] {
        let start = self.next;
        while self
            .commands
            .get(self.next)
            .is_some_and(|c| c.at_ms <= now_ms)
        {
            self.next += 1;
        }
        &self.commands[start..self.next]
    }

    pub fn remaining(&self) -> usize {
        self.commands.len() - self.next
    }
}

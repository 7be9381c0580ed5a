//! Replay system for recording and playing back games.
//!
//! A replay stores the serialized starting simulation and the ordered
//! stream of player actions and tick durations fed to it. Because the
//! simulation is deterministic, re-applying the stream reproduces the
//! game exactly.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed};
use crate::simulation::{PlayerAction, Simulation};

/// One recorded input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayEntry {
    /// A player action, accepted or not.
    Action(PlayerAction),
    /// A simulation tick of the given length.
    Tick(#[serde(with = "fixed_serde")] Fixed),
}

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Scenario identifier or name.
    pub scenario_id: String,
    /// Serialized initial simulation state.
    pub initial_state: Vec<u8>,
    /// Inputs in the order they were applied.
    pub entries: Vec<ReplayEntry>,
    /// Tick count when recording stopped.
    pub final_tick: u64,
    /// State hash when recording stopped.
    pub final_hash: u64,
}

impl Replay {
    /// Start a replay from a simulation's current state.
    ///
    /// # Errors
    /// Returns an error if the simulation cannot be serialized.
    pub fn new(scenario_id: impl Into<String>, initial_state: &Simulation) -> Result<Self> {
        Ok(Self {
            version: REPLAY_VERSION,
            scenario_id: scenario_id.into(),
            initial_state: initial_state.serialize()?,
            entries: Vec::new(),
            final_tick: initial_state.tick_count(),
            final_hash: initial_state.state_hash(),
        })
    }

    /// Record a player action.
    pub fn record_action(&mut self, action: PlayerAction) {
        self.entries.push(ReplayEntry::Action(action));
    }

    /// Record a tick.
    pub fn record_tick(&mut self, dt: Fixed) {
        self.entries.push(ReplayEntry::Tick(dt));
    }

    /// Stamp the replay with the simulation's end state.
    pub fn finalize(&mut self, simulation: &Simulation) {
        self.final_tick = simulation.tick_count();
        self.final_hash = simulation.state_hash();
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if reading or decoding fails, or the version differs.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::InvalidState(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }

        Ok(replay)
    }

    /// Rebuild the starting simulation.
    ///
    /// # Errors
    /// Returns an error if state deserialization fails.
    pub fn restore_initial_state(&self) -> Result<Simulation> {
        Simulation::deserialize(&self.initial_state)
    }

    /// Number of recorded ticks.
    #[must_use]
    pub fn tick_entries(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, ReplayEntry::Tick(_)))
            .count()
    }

    /// Number of recorded actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.entries.len() - self.tick_entries()
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    simulation: Simulation,
    cursor: usize,
    /// Whether playback is paused.
    pub paused: bool,
}

impl ReplayPlayer {
    /// Create a player positioned at the start of the replay.
    ///
    /// # Errors
    /// Returns an error if the initial state cannot be restored.
    pub fn new(replay: Replay) -> Result<Self> {
        let simulation = replay.restore_initial_state()?;
        Ok(Self {
            replay,
            simulation,
            cursor: 0,
            paused: false,
        })
    }

    /// Apply entries up to and including the next tick.
    ///
    /// Returns true if there are more entries to play.
    pub fn advance(&mut self) -> bool {
        if self.paused {
            return !self.is_finished();
        }
        while let Some(entry) = self.replay.entries.get(self.cursor).copied() {
            self.cursor += 1;
            match entry {
                ReplayEntry::Action(action) => {
                    // Rejections were recorded too and replay as rejections.
                    let _ = self.simulation.apply(action);
                }
                ReplayEntry::Tick(dt) => {
                    self.simulation.tick(dt);
                    break;
                }
            }
        }
        !self.is_finished()
    }

    /// Restart from the initial state and play until `target_tick`.
    ///
    /// # Errors
    /// Returns an error if state restoration fails.
    pub fn seek(&mut self, target_tick: u64) -> Result<()> {
        self.simulation = self.replay.restore_initial_state()?;
        self.cursor = 0;
        let paused = std::mem::replace(&mut self.paused, false);
        while self.simulation.tick_count() < target_tick && !self.is_finished() {
            self.advance();
        }
        self.paused = paused;
        Ok(())
    }

    /// Tick of the simulation being played.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.simulation.tick_count()
    }

    /// Simulation being played.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// The replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Whether every entry has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.replay.entries.len()
    }

    /// Play the whole replay and compare the final hash.
    ///
    /// # Errors
    /// Returns an error if state restoration fails.
    pub fn verify(&mut self) -> Result<bool> {
        self.seek(u64::MAX)?;
        Ok(self.simulation.state_hash() == self.replay.final_hash
            && self.simulation.tick_count() == self.replay.final_tick)
    }

    /// Like [`ReplayPlayer::verify`] but reports a mismatch as an error.
    ///
    /// # Errors
    /// [`GameError::ReplayMismatch`] when the final hash differs.
    pub fn verify_strict(&mut self) -> Result<()> {
        if self.verify()? {
            return Ok(());
        }
        Err(GameError::ReplayMismatch {
            tick: self.simulation.tick_count(),
            expected: self.replay.final_hash,
            actual: self.simulation.state_hash(),
        })
    }

    /// Toggle pause state.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Progress through the recorded ticks, 0 to 100.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.replay.final_tick == 0 {
            return 100.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.current_tick() as f64 / self.replay.final_tick as f64;
        (ratio * 100.0).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::GridCoord;
    use crate::config::RulesConfig;
    use crate::unit::UnitType;

    fn record_game() -> Replay {
        let mut sim = Simulation::new(RulesConfig::default()).unwrap();
        let mut replay = Replay::new("test_scenario", &sim).unwrap();
        let dt = Fixed::from_num(0.1);
        let actions = [
            PlayerAction::Purchase(UnitType::RangedArcher),
            PlayerAction::SelectBench(0),
            PlayerAction::Place(GridCoord::new(5, 7)),
            PlayerAction::Place(GridCoord::new(5, 2)),
            PlayerAction::StartCombat,
        ];
        for action in actions {
            let _ = sim.apply(action);
            replay.record_action(action);
        }
        for _ in 0..100 {
            sim.tick(dt);
            replay.record_tick(dt);
        }
        replay.finalize(&sim);
        replay
    }

    #[test]
    fn test_replay_create() {
        let sim = Simulation::new(RulesConfig::default()).unwrap();
        let replay = Replay::new("test_scenario", &sim).unwrap();
        assert_eq!(replay.version, REPLAY_VERSION);
        assert_eq!(replay.scenario_id, "test_scenario");
        assert!(replay.entries.is_empty());
        assert_eq!(replay.final_hash, sim.state_hash());
    }

    #[test]
    fn test_replay_counts() {
        let replay = record_game();
        assert_eq!(replay.action_count(), 5);
        assert_eq!(replay.tick_entries(), 100);
        assert_eq!(replay.final_tick, 100);
    }

    #[test]
    fn test_replay_save_load() {
        let replay = record_game();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.replay");
        replay.save(&path).unwrap();

        let loaded = Replay::load(&path).unwrap();
        assert_eq!(loaded.scenario_id, "test_scenario");
        assert_eq!(loaded.entries, replay.entries);
        assert_eq!(loaded.final_hash, replay.final_hash);
    }

    #[test]
    fn test_replay_load_rejects_other_version() {
        let mut replay = record_game();
        replay.version = REPLAY_VERSION + 1;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.replay");
        replay.save(&path).unwrap();
        assert!(matches!(
            Replay::load(&path),
            Err(GameError::InvalidState(_))
        ));
    }

    #[test]
    fn test_replay_verifies() {
        let mut player = ReplayPlayer::new(record_game()).unwrap();
        assert!(player.verify().unwrap());
        assert!(player.is_finished());
        assert_eq!(player.current_tick(), 100);
    }

    #[test]
    fn test_tampered_replay_fails_strict() {
        let mut replay = record_game();
        replay.entries.pop();
        let mut player = ReplayPlayer::new(replay).unwrap();
        assert!(matches!(
            player.verify_strict(),
            Err(GameError::ReplayMismatch { tick: 99, .. })
        ));
    }

    #[test]
    fn test_replay_player_seek_and_advance() {
        let mut player = ReplayPlayer::new(record_game()).unwrap();
        assert_eq!(player.current_tick(), 0);

        player.seek(50).unwrap();
        assert_eq!(player.current_tick(), 50);
        assert!((player.progress_percent() - 50.0).abs() < 0.01);

        player.seek(10).unwrap();
        assert_eq!(player.current_tick(), 10);

        assert!(player.advance());
        assert_eq!(player.current_tick(), 11);
    }

    #[test]
    fn test_replay_player_pause() {
        let mut player = ReplayPlayer::new(record_game()).unwrap();
        player.paused = true;
        player.advance();
        assert_eq!(player.current_tick(), 0);

        player.toggle_pause();
        player.advance();
        assert_eq!(player.current_tick(), 1);
    }
}

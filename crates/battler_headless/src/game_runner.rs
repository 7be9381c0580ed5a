//! Scripted game execution.
//!
//! Plays a [`Scenario`] round by round against a real [`Simulation`],
//! optionally recording a [`Replay`], and summarises the result.
//!
//! All loops are bounded: a combat phase never runs longer than the
//! scenario's `max_ticks_per_combat`.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use battler_core::error::ActionError;
use battler_core::math::Fixed;
use battler_core::replay::Replay;
use battler_core::round::RoundReport;
use battler_core::simulation::{ActionOutcome, PlayerAction, Simulation, TickEvents};

use crate::scenario::{RoundScript, Scenario, ScenarioError};

/// An action the simulation refused during a scripted round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedAction {
    /// Round number within the scenario, from 1.
    pub round: usize,
    /// The refused action.
    pub action: PlayerAction,
    /// Why.
    pub reason: String,
}

/// Summary of a scripted game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReport {
    /// Scenario name.
    pub scenario: String,
    /// Resolved rounds in order.
    pub rounds: Vec<RoundReport>,
    /// Actions that were refused.
    pub rejected: Vec<RejectedAction>,
    /// Ticks run.
    pub final_tick: u64,
    /// State hash at the end.
    pub final_hash: u64,
    /// Wave reached.
    pub wave: i32,
    /// Player HP at the end.
    pub player_hp: i32,
    /// Gold at the end.
    pub gold: i32,
    /// Whether the game ended in defeat.
    pub game_over: bool,
}

/// A simulation that records everything fed to it.
#[derive(Debug)]
pub struct RecordingGame {
    sim: Simulation,
    replay: Option<Replay>,
}

impl RecordingGame {
    /// Wrap a simulation, starting a replay if `record` is set.
    ///
    /// # Errors
    ///
    /// The initial state could not be serialized.
    pub fn new(sim: Simulation, scenario_id: &str, record: bool) -> Result<Self, ScenarioError> {
        let replay = if record {
            Some(Replay::new(scenario_id, &sim)?)
        } else {
            None
        };
        Ok(Self { sim, replay })
    }

    /// Apply and record an action.
    pub fn act(&mut self, action: PlayerAction) -> Result<ActionOutcome, ActionError> {
        if let Some(replay) = &mut self.replay {
            replay.record_action(action);
        }
        self.sim.apply(action)
    }

    /// Tick and record.
    pub fn tick(&mut self, dt: Fixed) -> TickEvents {
        if let Some(replay) = &mut self.replay {
            replay.record_tick(dt);
        }
        self.sim.tick(dt)
    }

    /// Replace the simulation with a fresh game, restarting the recording.
    ///
    /// # Errors
    ///
    /// The rules no longer validate or the state could not be serialized.
    pub fn restart(&mut self) -> Result<(), ScenarioError> {
        self.sim.restart()?;
        if let Some(replay) = &mut self.replay {
            *replay = Replay::new(replay.scenario_id.clone(), &self.sim)?;
        }
        Ok(())
    }

    /// The simulation.
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Finish recording and hand back the replay.
    pub fn into_replay(self) -> Option<Replay> {
        let Self { sim, replay } = self;
        replay.map(|mut replay| {
            replay.finalize(&sim);
            replay
        })
    }
}

fn run_prepare(game: &mut RecordingGame, round: usize, script: &RoundScript, rejected: &mut Vec<RejectedAction>) {
    let actions = script
        .purchases
        .iter()
        .map(|&unit_type| vec![PlayerAction::Purchase(unit_type)])
        .chain(script.placements.iter().map(|p| {
            vec![
                PlayerAction::SelectBench(p.bench_index),
                PlayerAction::Place(p.cell),
            ]
        }))
        .flatten();
    for action in actions {
        if let Err(reason) = game.act(action) {
            warn!(round, ?action, %reason, "Scripted action rejected");
            rejected.push(RejectedAction {
                round,
                action,
                reason: reason.to_string(),
            });
        }
    }
}

/// Play a scenario to the end.
///
/// Rounds run in order until the script runs out or the player is
/// defeated. With `record`, the returned replay reproduces the game.
///
/// # Errors
///
/// Invalid rules or tick rate, or a combat phase that exceeds
/// `max_ticks_per_combat`.
pub fn play_scenario(scenario: &Scenario, record: bool) -> Result<(GameReport, Option<Replay>), ScenarioError> {
    let dt = scenario.tick_dt()?;
    let mut game = RecordingGame::new(scenario.build_simulation()?, &scenario.name, record)?;
    let mut rounds = Vec::with_capacity(scenario.rounds.len());
    let mut rejected = Vec::new();

    info!(scenario = %scenario.name, rounds = scenario.rounds.len(), "Playing scenario");

    for (index, script) in scenario.rounds.iter().enumerate() {
        let round = index + 1;
        run_prepare(&mut game, round, script, &mut rejected);
        game.act(PlayerAction::StartCombat)
            .map_err(|e| ScenarioError::Invalid(format!("round {round}: {e}")))?;

        let mut report = None;
        for _ in 0..scenario.max_ticks_per_combat {
            if let Some(resolved) = game.tick(dt).round {
                report = Some(resolved);
                break;
            }
        }
        let report = report.ok_or_else(|| {
            ScenarioError::Invalid(format!(
                "round {round} did not finish within {} ticks",
                scenario.max_ticks_per_combat
            ))
        })?;
        rounds.push(report);

        if game.simulation().state().is_defeated() {
            game.tick(dt);
            break;
        }
    }

    let sim = game.simulation();
    let report = GameReport {
        scenario: scenario.name.clone(),
        rounds,
        rejected,
        final_tick: sim.tick_count(),
        final_hash: sim.state_hash(),
        wave: sim.state().wave,
        player_hp: sim.state().player_hp,
        gold: sim.state().gold,
        game_over: sim.is_game_over(),
    };
    info!(
        scenario = %report.scenario,
        rounds = report.rounds.len(),
        wave = report.wave,
        player_hp = report.player_hp,
        game_over = report.game_over,
        "Scenario finished"
    );
    Ok((report, game.into_replay()))
}

/// Outcome of playing one scenario several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterminismCheck {
    /// Final hash of each run.
    pub hashes: Vec<u64>,
    /// Whether every run agreed.
    pub deterministic: bool,
}

/// Play a scenario `runs` times and compare final hashes.
///
/// # Errors
///
/// Any error from [`play_scenario`].
pub fn verify_scenario(scenario: &Scenario, runs: u32) -> Result<DeterminismCheck, ScenarioError> {
    let hashes = (0..runs.max(1))
        .map(|_| play_scenario(scenario, false).map(|(report, _)| report.final_hash))
        .collect::<Result<Vec<_>, _>>()?;
    let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    Ok(DeterminismCheck {
        hashes,
        deterministic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use battler_core::board::GridCoord;
    use battler_core::replay::ReplayPlayer;
    use battler_core::unit::UnitType;

    use crate::scenario::Placement;

    fn archer_scenario() -> Scenario {
        Scenario {
            name: "archers".into(),
            rounds: vec![
                RoundScript {
                    purchases: vec![UnitType::RangedArcher, UnitType::RangedArcher],
                    placements: vec![
                        Placement {
                            bench_index: 0,
                            cell: GridCoord::new(2, 2),
                        },
                        Placement {
                            bench_index: 0,
                            cell: GridCoord::new(5, 6),
                        },
                    ],
                },
                RoundScript::default(),
            ],
            ..Scenario::default()
        }
    }

    #[test]
    fn test_play_scenario_reports_rounds() {
        let (report, replay) = play_scenario(&archer_scenario(), false).unwrap();
        assert!(replay.is_none());
        assert_eq!(report.rounds.len(), 2);
        assert_eq!(report.rounds[0].wave, 1);
        assert_eq!(report.rounds[1].wave, 2);
        assert_eq!(report.wave, 3);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(
            report.rejected[0].action,
            PlayerAction::Place(GridCoord::new(5, 6))
        );
    }

    #[test]
    fn test_recorded_replay_verifies() {
        let (report, replay) = play_scenario(&archer_scenario(), true).unwrap();
        let replay = replay.expect("recording requested");
        assert_eq!(replay.final_hash, report.final_hash);
        assert_eq!(replay.final_tick, report.final_tick);

        let mut player = ReplayPlayer::new(replay).unwrap();
        assert!(player.verify().unwrap());
    }

    #[test]
    fn test_defeat_stops_scenario() {
        let mut rules = battler_core::config::RulesConfig::default();
        rules.starting_roster.clear();
        rules.economy.starting_hp = 5;
        let scenario = Scenario {
            rules: Some(rules),
            rounds: vec![RoundScript::default(); 3],
            ..Scenario::default()
        };
        let (report, _) = play_scenario(&scenario, false).unwrap();
        assert_eq!(report.rounds.len(), 1);
        assert!(report.game_over);
        assert!(report.player_hp <= 0);
    }

    #[test]
    fn test_verify_scenario_is_deterministic() {
        let check = verify_scenario(&archer_scenario(), 3).unwrap();
        assert_eq!(check.hashes.len(), 3);
        assert!(check.deterministic);
    }
}

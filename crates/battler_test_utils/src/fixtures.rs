//! Test fixtures and helpers.
//!
//! Pre-built rules and simulations for consistent testing.

use battler_core::board::GridCoord;
use battler_core::config::{RulesConfig, SpawnRule};
use battler_core::math::Fixed;
use battler_core::round::RoundReport;
use battler_core::simulation::{PlayerAction, Simulation};
use battler_core::unit::UnitType;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// Tick length used by most tests: 20 ticks per second.
#[must_use]
pub fn tick_dt() -> Fixed {
    fixed_f(0.05)
}

/// Default rules with nothing on the board at start.
#[must_use]
pub fn empty_rules() -> RulesConfig {
    RulesConfig {
        starting_roster: Vec::new(),
        ..RulesConfig::default()
    }
}

/// Rules with explicit player and AI spawns.
#[must_use]
pub fn rules_with(player: &[SpawnRule], ai: &[SpawnRule]) -> RulesConfig {
    RulesConfig {
        starting_roster: player.to_vec(),
        ai_wave: ai.to_vec(),
        ..RulesConfig::default()
    }
}

/// A fresh simulation with default rules.
///
/// # Panics
///
/// Panics if the default rules fail validation.
#[must_use]
pub fn default_simulation() -> Simulation {
    Simulation::new(RulesConfig::default()).expect("default rules are valid")
}

/// A simulation built from the given rules.
///
/// # Panics
///
/// Panics if the rules fail validation.
#[must_use]
pub fn simulation_with(rules: RulesConfig) -> Simulation {
    Simulation::new(rules).expect("fixture rules are valid")
}

/// One player unit against one AI unit, already in combat.
///
/// # Panics
///
/// Panics if the cells are invalid for their sides.
#[must_use]
pub fn duel(player: (UnitType, GridCoord), ai: (UnitType, GridCoord)) -> Simulation {
    let rules = rules_with(
        &[SpawnRule::new(player.0, player.1.x, player.1.y)],
        &[SpawnRule::new(ai.0, ai.1.x, ai.1.y)],
    );
    let mut sim = simulation_with(rules);
    sim.start_combat().expect("fresh game starts in prepare");
    sim
}

/// Default game with an extra archer bought, placed and combat started.
///
/// # Panics
///
/// Panics if any of the scripted actions is rejected.
#[must_use]
pub fn scripted_combat() -> Simulation {
    let mut sim = default_simulation();
    for action in [
        PlayerAction::Purchase(UnitType::RangedArcher),
        PlayerAction::SelectBench(0),
        PlayerAction::Place(GridCoord::new(5, 2)),
        PlayerAction::StartCombat,
    ] {
        sim.apply(action).expect("scripted action is valid");
    }
    sim
}

/// Tick until a round resolves, giving up after `max_ticks`.
pub fn run_until_round_end(sim: &mut Simulation, dt: Fixed, max_ticks: u64) -> Option<RoundReport> {
    for _ in 0..max_ticks {
        if let Some(report) = sim.tick(dt).round {
            return Some(report);
        }
    }
    None
}

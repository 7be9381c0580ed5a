//! Scenario loading and configuration.
//!
//! A scenario is a scripted game: optional rules, a tick rate, and a list
//! of rounds. Each round buys units, places bench units, then fights.
//!
//! ```ron
//! Scenario(
//!     name: "archer_rush",
//!     tick_rate: 20,
//!     rounds: [
//!         (
//!             purchases: [ranged_archer],
//!             placements: [(bench_index: 0, cell: (x: 5, y: 2))],
//!         ),
//!     ],
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use battler_core::board::GridCoord;
use battler_core::config::RulesConfig;
use battler_core::error::GameError;
use battler_core::math::Fixed;
use battler_core::simulation::Simulation;
use battler_core::unit::UnitType;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A scenario value is out of range.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
    /// The rules or the simulation refused to start.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Move one bench unit onto the board.
///
/// `bench_index` is the bench ordinal at the moment of placement; earlier
/// placements in the same round shift later ordinals down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Bench ordinal.
    pub bench_index: usize,
    /// Target cell.
    pub cell: GridCoord,
}

/// Player actions for one prepare phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundScript {
    /// Units to buy, in order.
    pub purchases: Vec<UnitType>,
    /// Placements, in order, after all purchases.
    pub placements: Vec<Placement>,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Rules; the defaults when absent.
    pub rules: Option<RulesConfig>,
    /// Ticks per simulated second.
    pub tick_rate: u32,
    /// Safety cap on ticks spent in one combat phase.
    pub max_ticks_per_combat: u64,
    /// Rounds to play, in order.
    pub rounds: Vec<RoundScript>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            description: String::new(),
            rules: None,
            tick_rate: 20,
            max_ticks_per_combat: 1000,
            rounds: vec![RoundScript::default()],
        }
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    ///
    /// # Errors
    ///
    /// Missing file, unreadable file, or invalid RON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    ///
    /// # Errors
    ///
    /// Invalid RON.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        Ok(ron::from_str(ron)?)
    }

    /// Rules the scenario plays under.
    #[must_use]
    pub fn rules(&self) -> RulesConfig {
        self.rules.clone().unwrap_or_default()
    }

    /// Seconds per tick.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::Invalid`] for a zero tick rate.
    pub fn tick_dt(&self) -> Result<Fixed, ScenarioError> {
        if self.tick_rate == 0 {
            return Err(ScenarioError::Invalid("tick_rate must be positive".into()));
        }
        Ok(Fixed::ONE / Fixed::from_num(self.tick_rate))
    }

    /// Build the starting simulation.
    ///
    /// # Errors
    ///
    /// Any rules validation error.
    pub fn build_simulation(&self) -> Result<Simulation, ScenarioError> {
        Ok(Simulation::new(self.rules())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        Scenario(
            name: "archers",
            tick_rate: 10,
            rounds: [
                (
                    purchases: [ranged_archer, melee_tank],
                    placements: [(bench_index: 0, cell: (x: 5, y: 2))],
                ),
                (purchases: []),
            ],
        )
    "#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_ron_str(SAMPLE).unwrap();
        assert_eq!(scenario.name, "archers");
        assert_eq!(scenario.rounds.len(), 2);
        assert_eq!(
            scenario.rounds[0].purchases,
            vec![UnitType::RangedArcher, UnitType::MeleeTank]
        );
        assert_eq!(
            scenario.rounds[0].placements[0],
            Placement {
                bench_index: 0,
                cell: GridCoord::new(5, 2)
            }
        );
        assert!(scenario.rounds[1].purchases.is_empty());
        assert_eq!(scenario.max_ticks_per_combat, 1000);
        assert_eq!(scenario.tick_dt().unwrap(), Fixed::ONE / Fixed::from_num(10));
    }

    #[test]
    fn test_embedded_rules() {
        let scenario = Scenario::from_ron_str(
            "Scenario(rules: Some((economy: (starting_gold: 40))))",
        )
        .unwrap();
        assert_eq!(scenario.rules().economy.starting_gold, 40);
        assert_eq!(scenario.rules().economy.starting_hp, 100);
        assert!(scenario.build_simulation().is_ok());
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let scenario = Scenario {
            tick_rate: 0,
            ..Scenario::default()
        };
        assert!(matches!(scenario.tick_dt(), Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Scenario::load("/nonexistent/scenario.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archers.ron");
        std::fs::write(&path, SAMPLE).unwrap();
        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.tick_rate, 10);
    }

    #[test]
    fn test_shipped_scenarios_parse() {
        for text in [
            include_str!("../../../scenarios/archer_line.ron"),
            include_str!("../../../scenarios/tank_wall.ron"),
        ] {
            let scenario = Scenario::from_ron_str(text).unwrap();
            assert!(!scenario.rounds.is_empty());
            assert!(scenario.build_simulation().is_ok());
        }
    }

    #[test]
    fn test_invalid_ron() {
        assert!(matches!(
            Scenario::from_ron_str("Scenario(tick_rate: \"fast\")"),
            Err(ScenarioError::ParseError(_))
        ));
    }
}

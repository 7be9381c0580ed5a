//! Game rules loaded from RON.
//!
//! Every constant the simulation uses lives in [`RulesConfig`]. Values
//! are written as plain decimals and converted to fixed-point once, when
//! a [`Simulation`](crate::simulation::Simulation) is built. Any field
//! left out of a RON file keeps its default.
//!
//! ```ron
//! (
//!     capacity: (bench_size: 4),
//!     timing: (combat_duration: 20.0),
//! )
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::{Board, GridCoord, DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH};
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed};
use crate::roster::{DEFAULT_BENCH_SIZE, DEFAULT_MAX_UNITS};
use crate::unit::{UnitRegistry, UnitType};

/// Largest magnitude accepted for any decimal setting.
const MAX_DECIMAL: f64 = 1_000_000.0;

/// Largest board edge in cells.
pub const MAX_BOARD_CELLS: i32 = 1024;

/// Largest span in world units for the board edge or a unit's reach.
///
/// Squared distances up to `2 * MAX_WORLD_EXTENT²` must fit in [`Fixed`].
pub const MAX_WORLD_EXTENT: f64 = 16_384.0;

/// Smallest tile size, attack speed or movement speed. Anything smaller
/// rounds to zero or overflows its reciprocal in fixed-point.
pub const MIN_SCALE: f64 = 1.0 / 1024.0;

/// Board dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardRules {
    /// Columns.
    pub width: i32,
    /// Rows. The lower half belongs to the player.
    pub height: i32,
    /// Tile edge in world units.
    pub tile_size: f64,
}

impl Default for BoardRules {
    fn default() -> Self {
        Self {
            width: DEFAULT_BOARD_WIDTH,
            height: DEFAULT_BOARD_HEIGHT,
            tile_size: 1.0,
        }
    }
}

/// Roster limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityRules {
    /// Total units in play, both sides.
    pub max_units: usize,
    /// Units waiting on the bench.
    pub bench_size: usize,
}

impl Default for CapacityRules {
    fn default() -> Self {
        Self {
            max_units: DEFAULT_MAX_UNITS,
            bench_size: DEFAULT_BENCH_SIZE,
        }
    }
}

/// Player HP, gold and round rewards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    /// Player HP at game start.
    pub starting_hp: i32,
    /// Gold at game start.
    pub starting_gold: i32,
    /// First wave number.
    pub starting_wave: i32,
    /// Extra gold for winning a round outright.
    pub round_win_bonus: i32,
    /// Gold paid after every round.
    pub base_income: i32,
    /// Player damage per AI unit alive when the AI takes the round.
    pub damage_per_surviving_ai: i32,
    /// Gold charged to refresh the shop.
    pub refresh_cost: i32,
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            starting_hp: 100,
            starting_gold: 10,
            starting_wave: 1,
            round_win_bonus: 3,
            base_income: 5,
            damage_per_surviving_ai: 5,
            refresh_cost: 1,
        }
    }
}

/// Durations in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingRules {
    /// Longest a combat phase may run.
    pub combat_duration: f64,
    /// Largest step a single tick may take.
    pub max_tick_dt: f64,
    /// Move cooldown after every step was blocked.
    pub blocked_move_retry: f64,
    /// How long the attack flash stays on.
    pub attack_visual_duration: f64,
}

impl Default for TimingRules {
    fn default() -> Self {
        Self {
            combat_duration: 15.0,
            max_tick_dt: 0.1,
            blocked_move_retry: 0.25,
            attack_visual_duration: 0.15,
        }
    }
}

impl TimingRules {
    /// Fixed-point copy used by the tick loop.
    #[must_use]
    pub fn to_fixed(&self) -> TickTiming {
        TickTiming {
            combat_duration: Fixed::from_num(self.combat_duration),
            max_tick_dt: Fixed::from_num(self.max_tick_dt),
            blocked_move_retry: Fixed::from_num(self.blocked_move_retry),
            attack_visual_duration: Fixed::from_num(self.attack_visual_duration),
        }
    }
}

/// [`TimingRules`] converted to fixed-point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickTiming {
    /// Longest a combat phase may run.
    #[serde(with = "fixed_serde")]
    pub combat_duration: Fixed,
    /// Largest step a single tick may take.
    #[serde(with = "fixed_serde")]
    pub max_tick_dt: Fixed,
    /// Move cooldown after every step was blocked.
    #[serde(with = "fixed_serde")]
    pub blocked_move_retry: Fixed,
    /// How long the attack flash stays on.
    #[serde(with = "fixed_serde")]
    pub attack_visual_duration: Fixed,
}

/// A unit placed directly on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpawnRule {
    /// Unit to create.
    pub unit_type: UnitType,
    /// Cell to put it on.
    pub cell: GridCoord,
}

impl SpawnRule {
    /// Create a spawn rule.
    #[must_use]
    pub const fn new(unit_type: UnitType, x: i32, y: i32) -> Self {
        Self {
            unit_type,
            cell: GridCoord::new(x, y),
        }
    }
}

/// Configured data for one unit type. Ranges are in tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDescriptor {
    /// Type this descriptor belongs to.
    pub unit_type: UnitType,
    /// Shop name.
    pub name: String,
    /// Gold cost.
    pub cost: i32,
    /// Maximum hit points.
    pub max_hp: f64,
    /// Damage per attack.
    pub attack_damage: f64,
    /// Attacks per second.
    pub attack_speed: f64,
    /// Attack range in tiles.
    pub attack_range: f64,
    /// Aggro range in tiles.
    pub aggro_range: f64,
    /// Tiles per second.
    pub movement_speed: f64,
    /// Model asset for the renderer.
    pub model: String,
    /// Texture asset for the renderer.
    pub texture: String,
}

impl UnitDescriptor {
    fn default_tank() -> Self {
        Self {
            unit_type: UnitType::MeleeTank,
            name: "Tank".to_string(),
            cost: 3,
            max_hp: 100.0,
            attack_damage: 10.0,
            attack_speed: 0.8,
            attack_range: 1.1,
            aggro_range: 2.75,
            movement_speed: 0.75,
            model: "assets/models/up.obj".to_string(),
            texture: "assets/textures/cube.png".to_string(),
        }
    }

    fn default_archer() -> Self {
        Self {
            unit_type: UnitType::RangedArcher,
            name: "Archer".to_string(),
            cost: 3,
            max_hp: 60.0,
            attack_damage: 15.0,
            attack_speed: 1.1,
            attack_range: 3.5,
            aggro_range: 4.2,
            movement_speed: 0.75,
            model: "assets/models/cube.obj".to_string(),
            texture: "assets/textures/cube.png".to_string(),
        }
    }

    fn validate(&self, tile_size: f64) -> Result<()> {
        let label = self.unit_type.display_name();
        if self.cost < 0 {
            return Err(GameError::InvalidConfig(format!("{label}: cost must not be negative")));
        }
        check_positive(&format!("{label}.max_hp"), self.max_hp)?;
        check_non_negative(&format!("{label}.attack_damage"), self.attack_damage)?;
        check_at_least(&format!("{label}.attack_speed"), self.attack_speed, MIN_SCALE)?;
        check_positive(&format!("{label}.attack_range"), self.attack_range)?;
        check_positive(&format!("{label}.aggro_range"), self.aggro_range)?;
        check_span(&format!("{label}.attack_range"), self.attack_range * tile_size)?;
        check_span(&format!("{label}.aggro_range"), self.aggro_range * tile_size)?;
        check_at_least(&format!("{label}.movement_speed"), self.movement_speed, MIN_SCALE)
    }
}

/// Complete rule set for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Board dimensions.
    pub board: BoardRules,
    /// Roster limits.
    pub capacity: CapacityRules,
    /// HP, gold and rewards.
    pub economy: EconomyRules,
    /// Durations.
    pub timing: TimingRules,
    /// AI units spawned when combat starts.
    pub ai_wave: Vec<SpawnRule>,
    /// Player units on the board at game start.
    pub starting_roster: Vec<SpawnRule>,
    /// One descriptor per unit type.
    pub units: Vec<UnitDescriptor>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        let back_row = DEFAULT_BOARD_HEIGHT - 2;
        Self {
            board: BoardRules::default(),
            capacity: CapacityRules::default(),
            economy: EconomyRules::default(),
            timing: TimingRules::default(),
            ai_wave: vec![
                SpawnRule::new(UnitType::MeleeTank, 3, back_row),
                SpawnRule::new(UnitType::RangedArcher, 4, back_row),
            ],
            starting_roster: vec![
                SpawnRule::new(UnitType::MeleeTank, 3, 1),
                SpawnRule::new(UnitType::RangedArcher, 4, 1),
            ],
            units: vec![UnitDescriptor::default_tank(), UnitDescriptor::default_archer()],
        }
    }
}

impl RulesConfig {
    /// Parse rules from RON text. `source` names the text in errors.
    ///
    /// # Errors
    ///
    /// [`GameError::ConfigParse`] if the text is not valid RON for this type.
    pub fn from_ron_str(text: &str, source: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::ConfigParse {
            path: source.to_string(),
            message: e.to_string(),
        })
    }

    /// Read and parse a RON rules file. Does not validate.
    ///
    /// # Errors
    ///
    /// [`GameError::ConfigParse`] if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| GameError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&text, &path.display().to_string())
    }

    /// Serialize to pretty RON.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize rules: {e}")))
    }

    /// Board geometry described by these rules.
    #[must_use]
    pub fn board(&self) -> Board {
        Board::new(
            self.board.width,
            self.board.height,
            Fixed::from_num(self.board.tile_size),
        )
    }

    /// Check every value, failing on the first problem.
    ///
    /// # Errors
    ///
    /// [`GameError::MissingUnitDescriptor`] when a unit type has no
    /// descriptor, [`GameError::InvalidConfig`] for anything else.
    pub fn validate(&self) -> Result<()> {
        if self.board.width < 1 || self.board.height < 2 {
            return Err(GameError::InvalidConfig(format!(
                "board must be at least 1x2, got {}x{}",
                self.board.width, self.board.height
            )));
        }
        if self.board.width > MAX_BOARD_CELLS || self.board.height > MAX_BOARD_CELLS {
            return Err(GameError::InvalidConfig(format!(
                "board edges are limited to {MAX_BOARD_CELLS} cells, got {}x{}",
                self.board.width, self.board.height
            )));
        }
        check_at_least("board.tile_size", self.board.tile_size, MIN_SCALE)?;
        check_span(
            "board",
            f64::from(self.board.width.max(self.board.height)) * self.board.tile_size,
        )?;

        if self.capacity.max_units == 0 || self.capacity.bench_size == 0 {
            return Err(GameError::InvalidConfig(
                "max_units and bench_size must be at least 1".to_string(),
            ));
        }
        if self.capacity.bench_size > self.capacity.max_units {
            return Err(GameError::InvalidConfig(format!(
                "bench_size {} exceeds max_units {}",
                self.capacity.bench_size, self.capacity.max_units
            )));
        }

        let economy = &self.economy;
        if economy.starting_hp <= 0 {
            return Err(GameError::InvalidConfig("starting_hp must be positive".to_string()));
        }
        if [
            economy.starting_gold,
            economy.round_win_bonus,
            economy.base_income,
            economy.damage_per_surviving_ai,
            economy.refresh_cost,
        ]
        .iter()
        .any(|&v| v < 0)
        {
            return Err(GameError::InvalidConfig(
                "gold, rewards and damage must not be negative".to_string(),
            ));
        }

        check_positive("timing.combat_duration", self.timing.combat_duration)?;
        check_positive("timing.max_tick_dt", self.timing.max_tick_dt)?;
        check_positive("timing.blocked_move_retry", self.timing.blocked_move_retry)?;
        check_non_negative("timing.attack_visual_duration", self.timing.attack_visual_duration)?;

        for descriptor in &self.units {
            descriptor.validate(self.board.tile_size)?;
        }
        UnitRegistry::from_descriptors(&self.units, Fixed::from_num(self.board.tile_size))?;

        let board = self.board();
        self.validate_spawns("ai_wave", &self.ai_wave, &board, false)?;
        self.validate_spawns("starting_roster", &self.starting_roster, &board, true)
    }

    fn validate_spawns(
        &self,
        list: &str,
        spawns: &[SpawnRule],
        board: &Board,
        player_side: bool,
    ) -> Result<()> {
        if spawns.len() > self.capacity.max_units {
            return Err(GameError::InvalidConfig(format!(
                "{list} has more units than max_units"
            )));
        }
        let mut seen = HashSet::new();
        for spawn in spawns {
            if !board.in_bounds(spawn.cell) {
                return Err(GameError::InvalidConfig(format!(
                    "{list}: cell {} is outside the board",
                    spawn.cell
                )));
            }
            if board.is_on_player_side(spawn.cell.y) != player_side {
                return Err(GameError::InvalidConfig(format!(
                    "{list}: cell {} is on the wrong half",
                    spawn.cell
                )));
            }
            if !seen.insert(spawn.cell) {
                return Err(GameError::InvalidConfig(format!(
                    "{list}: cell {} used twice",
                    spawn.cell
                )));
            }
        }
        Ok(())
    }
}

fn check_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value.abs() < MAX_DECIMAL {
        Ok(())
    } else {
        Err(GameError::InvalidConfig(format!("{name} is out of range: {value}")))
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    check_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(GameError::InvalidConfig(format!("{name} must be positive, got {value}")))
    }
}

fn check_at_least(name: &str, value: f64, min: f64) -> Result<()> {
    check_finite(name, value)?;
    if value >= min {
        Ok(())
    } else {
        Err(GameError::InvalidConfig(format!("{name} must be at least {min}, got {value}")))
    }
}

fn check_span(name: &str, world_units: f64) -> Result<()> {
    if world_units <= MAX_WORLD_EXTENT {
        Ok(())
    } else {
        Err(GameError::InvalidConfig(format!(
            "{name} spans {world_units} world units, limit is {MAX_WORLD_EXTENT}"
        )))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    check_finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(GameError::InvalidConfig(format!("{name} must not be negative, got {value}")))
    }
}

//! Unit entities, ownership, lifecycle flags and per-type blueprints.
//!
//! Units live in one flat [`Roster`](crate::roster::Roster) and are told
//! apart by their [`UnitLocation`] tag rather than by separate bench and
//! board containers.

use serde::{Deserialize, Serialize};

use crate::board::{Board, GridCoord};
use crate::config::UnitDescriptor;
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed, Vec3Fixed};

/// Unique unit identifier. Never reused within one simulation.
pub type UnitId = u64;

/// Kind of unit. Selects the stat block and assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// Durable close-range fighter.
    MeleeTank,
    /// Fragile long-range fighter that drops targets leaving its aggro range.
    RangedArcher,
}

impl UnitType {
    /// Every unit type, in catalog order.
    pub const ALL: [Self; 2] = [Self::MeleeTank, Self::RangedArcher];

    /// Number of unit types.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index used by per-type tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::MeleeTank => 0,
            Self::RangedArcher => 1,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::MeleeTank => "Melee Tank",
            Self::RangedArcher => "Ranged Archer",
        }
    }

    /// Whether a held target is dropped once it leaves aggro range.
    #[must_use]
    pub const fn disengages_beyond_aggro(self) -> bool {
        matches!(self, Self::RangedArcher)
    }
}

/// Which side owns a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Bought and placed by the player.
    Player,
    /// Spawned by the wave at combat start.
    Ai,
}

impl Side {
    /// Facing a unit of this side returns to when disengaged.
    #[must_use]
    pub const fn default_facing(self) -> Vec3Fixed {
        match self {
            Self::Player => Vec3Fixed::FORWARD,
            Self::Ai => Vec3Fixed::BACKWARD,
        }
    }

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Ai,
            Self::Ai => Self::Player,
        }
    }
}

/// Where a unit currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitLocation {
    /// Removed from play; dropped at the next roster compaction.
    #[default]
    None,
    /// Waiting on the bench.
    Bench,
    /// Standing on a board cell.
    Board(GridCoord),
}

impl UnitLocation {
    /// Board cell, if on the board.
    #[must_use]
    pub const fn cell(self) -> Option<GridCoord> {
        match self {
            Self::Board(cell) => Some(cell),
            Self::None | Self::Bench => None,
        }
    }
}

/// Combat state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatState {
    /// Nothing to do.
    #[default]
    Idle,
    /// Stepping toward a target or the nearest enemy.
    Moving,
    /// Target in attack range.
    Attacking,
    /// Killed this tick; forced back to idle by the next disengage.
    Dead,
}

impl CombatState {
    /// Short lowercase label for logs and views.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Moving => "moving",
            Self::Attacking => "attacking",
            Self::Dead => "dead",
        }
    }
}

/// Non-owning reference to another unit in the roster.
///
/// The slot is a fast path; the id is the liveness check. A handle whose
/// slot no longer holds the same id resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitHandle {
    /// Index into the roster at the time the handle was taken.
    pub slot: usize,
    /// Id of the referenced unit.
    pub id: UnitId,
}

impl UnitHandle {
    /// Create a handle.
    #[must_use]
    pub const fn new(slot: usize, id: UnitId) -> Self {
        Self { slot, id }
    }
}

/// Fixed-point stat block. Ranges are in world units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum hit points.
    #[serde(with = "fixed_serde")]
    pub max_hp: Fixed,
    /// Damage per attack.
    #[serde(with = "fixed_serde")]
    pub attack_damage: Fixed,
    /// Attacks per second.
    #[serde(with = "fixed_serde")]
    pub attack_speed: Fixed,
    /// Distance at which the unit can hit its target.
    #[serde(with = "fixed_serde")]
    pub attack_range: Fixed,
    /// Distance at which the unit acquires or keeps a target.
    #[serde(with = "fixed_serde")]
    pub aggro_range: Fixed,
    /// Tiles per second.
    #[serde(with = "fixed_serde")]
    pub movement_speed: Fixed,
}

impl UnitStats {
    /// Convert a configured descriptor, scaling tile ranges by the tile size.
    #[must_use]
    pub fn from_descriptor(descriptor: &UnitDescriptor, tile_size: Fixed) -> Self {
        Self {
            max_hp: Fixed::from_num(descriptor.max_hp),
            attack_damage: Fixed::from_num(descriptor.attack_damage),
            attack_speed: Fixed::from_num(descriptor.attack_speed),
            attack_range: Fixed::from_num(descriptor.attack_range) * tile_size,
            aggro_range: Fixed::from_num(descriptor.aggro_range) * tile_size,
            movement_speed: Fixed::from_num(descriptor.movement_speed),
        }
    }

    /// Squared attack range, saturating at [`Fixed::MAX`].
    #[must_use]
    pub fn attack_range_sq(&self) -> Fixed {
        self.attack_range.saturating_mul(self.attack_range)
    }

    /// Squared aggro range, saturating at [`Fixed::MAX`].
    #[must_use]
    pub fn aggro_range_sq(&self) -> Fixed {
        self.aggro_range.saturating_mul(self.aggro_range)
    }
}

/// Resolved per-type data: price, stats and render assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitBlueprint {
    /// Unit type this blueprint describes.
    pub unit_type: UnitType,
    /// Shop name.
    pub name: String,
    /// Gold cost.
    pub cost: i32,
    /// Combat stats.
    pub stats: UnitStats,
    /// Model asset path handed to the renderer.
    pub model: String,
    /// Texture asset path handed to the renderer.
    pub texture: String,
}

/// One blueprint per [`UnitType`], built once from the rules.
///
/// Construction fails if any type lacks a descriptor, so lookups never
/// fall back to a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRegistry {
    blueprints: Vec<UnitBlueprint>,
}

impl UnitRegistry {
    /// Build the registry from descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MissingUnitDescriptor`] if a type has no
    /// descriptor, or [`GameError::InvalidConfig`] if one has two.
    pub fn from_descriptors(descriptors: &[UnitDescriptor], tile_size: Fixed) -> Result<Self> {
        let mut blueprints = Vec::with_capacity(UnitType::COUNT);
        for unit_type in UnitType::ALL {
            let mut matching = descriptors.iter().filter(|d| d.unit_type == unit_type);
            let descriptor = matching
                .next()
                .ok_or(GameError::MissingUnitDescriptor(unit_type))?;
            if matching.next().is_some() {
                return Err(GameError::InvalidConfig(format!(
                    "duplicate descriptor for {unit_type:?}"
                )));
            }
            blueprints.push(UnitBlueprint {
                unit_type,
                name: descriptor.name.clone(),
                cost: descriptor.cost,
                stats: UnitStats::from_descriptor(descriptor, tile_size),
                model: descriptor.model.clone(),
                texture: descriptor.texture.clone(),
            });
        }
        Ok(Self { blueprints })
    }

    /// Blueprint for a unit type.
    #[must_use]
    pub fn get(&self, unit_type: UnitType) -> &UnitBlueprint {
        &self.blueprints[unit_type.index()]
    }

    /// Iterate blueprints in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitBlueprint> {
        self.blueprints.iter()
    }
}

/// A unit on the bench or the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Unique id.
    pub id: UnitId,
    /// Unit type.
    pub unit_type: UnitType,
    /// Owner.
    pub side: Side,
    /// Bench, board cell, or removed.
    pub location: UnitLocation,
    /// Cached world position of the board cell.
    pub world_pos: Vec3Fixed,
    /// Stat block copied from the blueprint at creation.
    pub stats: UnitStats,
    /// Current hit points, `0..=max_hp`.
    #[serde(with = "fixed_serde")]
    pub current_hp: Fixed,
    /// Combat state.
    pub state: CombatState,
    /// Current target, if engaged.
    pub target: Option<UnitHandle>,
    /// Seconds until the next attack is allowed. May go negative.
    #[serde(with = "fixed_serde")]
    pub attack_cooldown: Fixed,
    /// Seconds until the next grid step is allowed. May go negative.
    #[serde(with = "fixed_serde")]
    pub move_cooldown: Fixed,
    /// Seconds left on the attack flash.
    #[serde(with = "fixed_serde")]
    pub attack_visual_timer: Fixed,
    /// Whether the attack flash is showing.
    pub attacking_visual: bool,
    /// Alive flag; false exactly when hp reached zero.
    pub alive: bool,
    /// Facing direction.
    pub facing: Vec3Fixed,
    /// Whether the current move is closing on the engaged target.
    pub needs_to_move_for_attack: bool,
}

impl Unit {
    /// Create a unit at full health in the idle state.
    #[must_use]
    pub fn new(id: UnitId, unit_type: UnitType, side: Side, stats: UnitStats) -> Self {
        Self {
            id,
            unit_type,
            side,
            location: UnitLocation::None,
            world_pos: Vec3Fixed::ZERO,
            stats,
            current_hp: stats.max_hp,
            state: CombatState::Idle,
            target: None,
            attack_cooldown: Fixed::ZERO,
            move_cooldown: Fixed::ZERO,
            attack_visual_timer: Fixed::ZERO,
            attacking_visual: false,
            alive: true,
            facing: side.default_facing(),
            needs_to_move_for_attack: false,
        }
    }

    /// Board cell, if on the board.
    #[must_use]
    pub const fn cell(&self) -> Option<GridCoord> {
        self.location.cell()
    }

    /// Whether the unit stands on the board.
    #[must_use]
    pub const fn is_on_board(&self) -> bool {
        matches!(self.location, UnitLocation::Board(_))
    }

    /// Whether the unit waits on the bench.
    #[must_use]
    pub const fn is_on_bench(&self) -> bool {
        matches!(self.location, UnitLocation::Bench)
    }

    /// Alive and on the board: the units combat can see.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.alive && self.is_on_board()
    }

    /// Whether `other` belongs to the opposing side.
    #[must_use]
    pub fn is_enemy_of(&self, other: &Self) -> bool {
        self.side != other.side
    }

    /// Move onto a board cell, recomputing the world position.
    pub fn set_cell(&mut self, cell: GridCoord, board: &Board) {
        self.location = UnitLocation::Board(cell);
        self.world_pos = board.grid_to_world(cell);
    }

    /// Turn toward a point. A zero-length direction keeps the old facing.
    pub fn face_towards(&mut self, point: Vec3Fixed) {
        let direction = (point - self.world_pos).normalize();
        if direction != Vec3Fixed::ZERO {
            self.facing = direction;
        }
    }

    /// Count down the attack flash and both cooldowns.
    pub fn advance_timers(&mut self, dt: Fixed) {
        if self.attacking_visual {
            self.attack_visual_timer -= dt;
            if self.attack_visual_timer <= Fixed::ZERO {
                self.attack_visual_timer = Fixed::ZERO;
                self.attacking_visual = false;
            }
        }
        self.attack_cooldown -= dt;
        self.move_cooldown -= dt;
    }

    /// Apply damage. Returns true if this blow killed the unit.
    pub fn take_damage(&mut self, amount: Fixed) -> bool {
        if !self.alive {
            return false;
        }
        self.current_hp -= amount;
        if self.current_hp <= Fixed::ZERO {
            self.current_hp = Fixed::ZERO;
            self.alive = false;
            self.state = CombatState::Dead;
            self.target = None;
            return true;
        }
        false
    }

    /// Drop all engagement state: target, timers, state and facing.
    ///
    /// Idempotent.
    pub fn clear_engagement(&mut self) {
        self.target = None;
        self.attack_cooldown = Fixed::ZERO;
        self.move_cooldown = Fixed::ZERO;
        self.attack_visual_timer = Fixed::ZERO;
        self.attacking_visual = false;
        self.state = CombatState::Idle;
        self.facing = self.side.default_facing();
        self.needs_to_move_for_attack = false;
    }

    /// Restore a retained unit for the next round.
    pub fn reset_for_round(&mut self) {
        self.current_hp = self.stats.max_hp;
        self.alive = true;
        self.clear_engagement();
    }
}

/// Hands out unit ids. Owned by the simulation; ids are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitFactory {
    next_id: UnitId,
}

impl UnitFactory {
    /// First id handed out.
    pub const FIRST_ID: UnitId = 1;

    /// Create a factory starting at [`Self::FIRST_ID`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: Self::FIRST_ID,
        }
    }

    /// Id the next created unit will get.
    #[must_use]
    pub const fn peek_next_id(&self) -> UnitId {
        self.next_id
    }

    /// Create a unit from a blueprint.
    pub fn create(&mut self, blueprint: &UnitBlueprint, side: Side) -> Unit {
        let id = self.next_id;
        self.next_id += 1;
        Unit::new(id, blueprint.unit_type, side, blueprint.stats)
    }
}

impl Default for UnitFactory {
    fn default() -> Self {
        Self::new()
    }
}

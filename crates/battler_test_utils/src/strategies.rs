//! Proptest strategies for simulation testing.
//!
//! These strategies generate random but reproducible player inputs and
//! board layouts for property-based tests.

use proptest::prelude::*;

use battler_core::board::{GridCoord, DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH};
use battler_core::config::{RulesConfig, SpawnRule, MAX_WORLD_EXTENT, MIN_SCALE};
use battler_core::math::Fixed;
use battler_core::simulation::PlayerAction;
use battler_core::unit::UnitType;

/// Any unit type.
pub fn arb_unit_type() -> impl Strategy<Value = UnitType> {
    prop_oneof![Just(UnitType::MeleeTank), Just(UnitType::RangedArcher)]
}

/// A cell on the default board, or one step outside it.
pub fn arb_cell() -> impl Strategy<Value = GridCoord> {
    (-1..=DEFAULT_BOARD_WIDTH, -1..=DEFAULT_BOARD_HEIGHT).prop_map(|(x, y)| GridCoord::new(x, y))
}

/// A cell in the player's half of the default board.
pub fn arb_player_cell() -> impl Strategy<Value = GridCoord> {
    (0..DEFAULT_BOARD_WIDTH, 0..DEFAULT_BOARD_HEIGHT / 2).prop_map(|(x, y)| GridCoord::new(x, y))
}

/// A cell in the AI's half of the default board.
pub fn arb_ai_cell() -> impl Strategy<Value = GridCoord> {
    (0..DEFAULT_BOARD_WIDTH, DEFAULT_BOARD_HEIGHT / 2..DEFAULT_BOARD_HEIGHT)
        .prop_map(|(x, y)| GridCoord::new(x, y))
}

/// Tick lengths from zero up to past the clamp, in milliseconds.
pub fn arb_dt() -> impl Strategy<Value = Fixed> {
    (0i32..=150).prop_map(|ms| Fixed::from_num(ms) / Fixed::from_num(1000))
}

/// Any player action, weighted towards prepare-phase actions.
pub fn arb_player_action() -> impl Strategy<Value = PlayerAction> {
    prop_oneof![
        3 => arb_unit_type().prop_map(PlayerAction::Purchase),
        3 => (0usize..10).prop_map(PlayerAction::SelectBench),
        3 => arb_cell().prop_map(PlayerAction::Place),
        1 => Just(PlayerAction::CancelPlacement),
        1 => Just(PlayerAction::StartCombat),
        1 => Just(PlayerAction::RefreshShop),
    ]
}

/// A step of a scripted game: an action or a burst of ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Apply an action.
    Act(PlayerAction),
    /// Tick `count` times with the given length.
    Ticks(u8, Fixed),
}

/// A mix of actions and tick bursts.
pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<Step>> {
    let step = prop_oneof![
        arb_player_action().prop_map(Step::Act),
        (1u8..40, arb_dt()).prop_map(|(n, dt)| Step::Ticks(n, dt)),
    ];
    proptest::collection::vec(step, 0..max_len)
}

fn unique_spawns(
    cells: impl Strategy<Value = GridCoord>,
    max: usize,
) -> impl Strategy<Value = Vec<SpawnRule>> {
    proptest::collection::btree_map(cells, arb_unit_type(), 1..=max).prop_map(|spawns| {
        spawns
            .into_iter()
            .map(|(cell, unit_type)| SpawnRule::new(unit_type, cell.x, cell.y))
            .collect()
    })
}

/// Player units on distinct cells of the player half.
pub fn arb_player_spawns(max: usize) -> impl Strategy<Value = Vec<SpawnRule>> {
    unique_spawns(arb_player_cell(), max)
}

/// AI units on distinct cells of the AI half.
pub fn arb_ai_spawns(max: usize) -> impl Strategy<Value = Vec<SpawnRule>> {
    unique_spawns(arb_ai_cell(), max)
}

/// Power-of-two tile sizes from the smallest accepted up to the largest an
/// 8x8 board allows.
pub fn arb_tile_size() -> impl Strategy<Value = f64> {
    (-10i32..=11).prop_map(|exp| 2f64.powi(exp))
}

fn arb_rate() -> impl Strategy<Value = f64> {
    prop_oneof![Just(MIN_SCALE), Just(100.0), MIN_SCALE..100.0]
}

fn arb_reach_fraction() -> impl Strategy<Value = f64> {
    prop_oneof![Just(1.0), Just(0.0), 0.0..1.0]
}

/// Per-descriptor draws: attack and aggro reach as fractions of the
/// longest allowed, attack speed, movement speed, max hp, damage.
type DescriptorDraw = (f64, f64, f64, f64, f64, f64);

fn arb_descriptor_draw() -> impl Strategy<Value = DescriptorDraw> {
    (
        arb_reach_fraction(),
        arb_reach_fraction(),
        arb_rate(),
        arb_rate(),
        prop_oneof![Just(1.0), Just(999_999.0), 1.0..1000.0],
        0.0..1000.0,
    )
}

/// Default layout with tile size and unit stats pushed anywhere inside the
/// limits `RulesConfig::validate` accepts, edges included.
pub fn arb_edge_rules() -> impl Strategy<Value = RulesConfig> {
    (arb_tile_size(), arb_descriptor_draw(), arb_descriptor_draw()).prop_map(
        |(tile_size, tank, archer)| {
            let mut rules = RulesConfig::default();
            rules.board.tile_size = tile_size;
            let longest_reach = (MAX_WORLD_EXTENT / tile_size).min(100_000.0);
            for (descriptor, draw) in rules.units.iter_mut().zip([tank, archer]) {
                let (attack, aggro, attack_speed, movement_speed, max_hp, damage) = draw;
                descriptor.attack_range = (attack * longest_reach).max(0.01);
                descriptor.aggro_range = (aggro * longest_reach).max(0.01);
                descriptor.attack_speed = attack_speed;
                descriptor.movement_speed = movement_speed;
                descriptor.max_hp = max_hp;
                descriptor.attack_damage = damage;
            }
            rules
        },
    )
}

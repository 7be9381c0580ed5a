//! Read-only snapshots for renderers, HUDs and bench displays.
//!
//! Views copy what they need out of the simulation and convert
//! fixed-point values to `f64`. Nothing here feeds back into the
//! simulation.

use serde::{Deserialize, Serialize};

use crate::board::{Board, GridCoord};
use crate::config::TickTiming;
use crate::roster::Roster;
use crate::round::{GameState, Phase};
use crate::shop::PlacementSelection;
use crate::unit::{CombatState, Side, Unit, UnitId, UnitLocation, UnitRegistry, UnitType};

/// What a renderer needs to draw one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    /// Unit id.
    pub id: UnitId,
    /// Unit type.
    pub unit_type: UnitType,
    /// Owner.
    pub side: Side,
    /// Bench, board or removed.
    pub location: UnitLocation,
    /// Board cell, if on the board.
    pub cell: Option<GridCoord>,
    /// World position.
    pub position: [f64; 3],
    /// Facing direction.
    pub facing: [f64; 3],
    /// Current hit points.
    pub hp: f64,
    /// Maximum hit points.
    pub max_hp: f64,
    /// Alive flag.
    pub alive: bool,
    /// Whether the attack flash is showing.
    pub attacking: bool,
    /// Combat state.
    pub state: CombatState,
    /// Current target id.
    pub target: Option<UnitId>,
}

impl From<&Unit> for UnitView {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            unit_type: unit.unit_type,
            side: unit.side,
            location: unit.location,
            cell: unit.cell(),
            position: unit.world_pos.to_f64(),
            facing: unit.facing.to_f64(),
            hp: unit.current_hp.to_num(),
            max_hp: unit.stats.max_hp.to_num(),
            alive: unit.alive,
            attacking: unit.attacking_visual,
            state: unit.state,
            target: unit.target.map(|t| t.id),
        }
    }
}

/// Heads-up display values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudView {
    /// Current phase.
    pub phase: Phase,
    /// Phase label, e.g. "Combat Phase".
    pub phase_name: String,
    /// Player HP.
    pub player_hp: i32,
    /// Player gold.
    pub gold: i32,
    /// Wave number.
    pub wave: i32,
    /// Seconds into the combat phase.
    pub combat_timer: f64,
    /// Combat phase length.
    pub combat_duration: f64,
}

impl HudView {
    /// Build from the game state.
    #[must_use]
    pub fn new(state: &GameState, timing: &TickTiming) -> Self {
        Self {
            phase: state.phase,
            phase_name: state.phase.display_name().to_string(),
            player_hp: state.player_hp,
            gold: state.gold,
            wave: state.wave,
            combat_timer: state.combat_timer.to_num(),
            combat_duration: timing.combat_duration.to_num(),
        }
    }
}

/// Board dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    /// Columns.
    pub width: i32,
    /// Rows.
    pub height: i32,
    /// Tile edge in world units.
    pub tile_size: f64,
}

impl From<&Board> for BoardView {
    fn from(board: &Board) -> Self {
        Self {
            width: board.width(),
            height: board.height(),
            tile_size: board.tile_size().to_num(),
        }
    }
}

/// One bench slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchSlotView {
    /// Bench ordinal, as used by the select action.
    pub index: usize,
    /// Unit id.
    pub unit: UnitId,
    /// Unit type.
    pub unit_type: UnitType,
    /// Shop name.
    pub name: String,
    /// Maximum hit points.
    pub max_hp: f64,
    /// Damage per attack.
    pub attack_damage: f64,
    /// Purchase price.
    pub cost: i32,
}

/// Bench contents and the highlighted slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchView {
    /// Bench capacity.
    pub capacity: usize,
    /// Occupied slots in order.
    pub slots: Vec<BenchSlotView>,
    /// Ordinal of the selected unit.
    pub selected: Option<usize>,
}

impl BenchView {
    /// Enumerate the bench.
    #[must_use]
    pub fn new(roster: &Roster, registry: &UnitRegistry, selection: &PlacementSelection) -> Self {
        let slots = roster
            .bench()
            .enumerate()
            .map(|(index, unit)| {
                let blueprint = registry.get(unit.unit_type);
                BenchSlotView {
                    index,
                    unit: unit.id,
                    unit_type: unit.unit_type,
                    name: blueprint.name.clone(),
                    max_hp: unit.stats.max_hp.to_num(),
                    attack_damage: unit.stats.attack_damage.to_num(),
                    cost: blueprint.cost,
                }
            })
            .collect();
        Self {
            capacity: roster.bench_capacity(),
            slots,
            selected: selection.bench_index(roster),
        }
    }
}

/// Render-only preview of placing the selected unit on a cell.
///
/// `valid` drives the ghost's colour. It ignores AI occupants, so a
/// valid-looking ghost can still be refused by the real placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostPreview {
    /// Hovered cell.
    pub cell: GridCoord,
    /// Where the ghost is drawn.
    pub position: [f64; 3],
    /// Unit being placed.
    pub unit: UnitId,
    /// Cell lies in the player's half.
    pub on_player_side: bool,
    /// No player unit stands on the cell.
    pub empty_for_player: bool,
    /// Both of the above.
    pub valid: bool,
}

/// Build a ghost for the selected unit over a cell.
///
/// `None` when nothing is selected or the cell is off the board.
#[must_use]
pub fn ghost_preview(
    roster: &Roster,
    board: &Board,
    selection: &PlacementSelection,
    cell: GridCoord,
) -> Option<GhostPreview> {
    let unit = selection.get()?;
    if !board.in_bounds(cell) {
        return None;
    }
    let on_player_side = board.is_on_player_side(cell.y);
    let empty_for_player = roster.is_tile_empty_for_player(cell);
    Some(GhostPreview {
        cell,
        position: board.grid_to_world(cell).to_f64(),
        unit,
        on_player_side,
        empty_for_player,
        valid: on_player_side && empty_for_player,
    })
}

/// Everything a front end needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    /// Simulation tick.
    pub tick: u64,
    /// HUD values.
    pub hud: HudView,
    /// Board dimensions.
    pub board: BoardView,
    /// Every unit in roster order.
    pub units: Vec<UnitView>,
    /// Bench contents.
    pub bench: BenchView,
}

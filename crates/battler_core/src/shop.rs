//! Shop, bench and placement.
//!
//! Every operation here either succeeds completely or returns an
//! [`ActionError`] and leaves state untouched. The one exception is
//! placing a unit that has already left the bench: the stale selection
//! is cleared before the error is returned.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Board, GridCoord};
use crate::error::ActionError;
use crate::round::{GameState, Phase};
use crate::roster::Roster;
use crate::unit::{Side, UnitFactory, UnitHandle, UnitId, UnitLocation, UnitRegistry, UnitType};

/// Price of a unit type.
#[must_use]
pub fn get_unit_cost(registry: &UnitRegistry, unit_type: UnitType) -> i32 {
    registry.get(unit_type).cost
}

/// Create a player unit on the bench.
///
/// # Errors
///
/// [`ActionError::BenchFull`] or [`ActionError::UnitCapReached`]; nothing
/// is created in either case.
pub fn add_unit_to_bench(
    roster: &mut Roster,
    factory: &mut UnitFactory,
    registry: &UnitRegistry,
    unit_type: UnitType,
) -> Result<UnitHandle, ActionError> {
    if roster.is_bench_full() {
        return Err(ActionError::BenchFull {
            capacity: roster.bench_capacity(),
        });
    }
    if roster.is_full() {
        return Err(ActionError::UnitCapReached {
            capacity: roster.capacity(),
        });
    }
    let mut unit = factory.create(registry.get(unit_type), Side::Player);
    unit.location = UnitLocation::Bench;
    roster.push(unit)
}

fn require_phase(state: &GameState, expected: Phase) -> Result<(), ActionError> {
    if state.phase == expected {
        Ok(())
    } else {
        Err(ActionError::WrongPhase {
            expected,
            actual: state.phase,
        })
    }
}

/// Result of a successful purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// New bench unit.
    pub unit: UnitId,
    /// Gold paid.
    pub cost: i32,
}

/// Buy a unit onto the bench. Gold is only taken if the unit was created.
///
/// # Errors
///
/// [`ActionError::WrongPhase`] outside prepare,
/// [`ActionError::InsufficientGold`], or a bench/cap error.
pub fn purchase(
    state: &mut GameState,
    roster: &mut Roster,
    factory: &mut UnitFactory,
    registry: &UnitRegistry,
    unit_type: UnitType,
) -> Result<Purchase, ActionError> {
    require_phase(state, Phase::Prepare)?;
    let cost = get_unit_cost(registry, unit_type);
    if state.gold < cost {
        return Err(ActionError::InsufficientGold {
            required: cost,
            available: state.gold,
        });
    }
    let handle = add_unit_to_bench(roster, factory, registry, unit_type)?;
    state.gold -= cost;
    debug!(unit = handle.id, ?unit_type, cost, gold = state.gold, "Purchased unit");
    Ok(Purchase {
        unit: handle.id,
        cost,
    })
}

/// Pay to refresh the shop. The catalog is fixed, so only gold changes.
///
/// # Errors
///
/// [`ActionError::WrongPhase`] outside prepare or
/// [`ActionError::InsufficientGold`].
pub fn refresh_shop(state: &mut GameState, cost: i32) -> Result<(), ActionError> {
    require_phase(state, Phase::Prepare)?;
    if state.gold < cost {
        return Err(ActionError::InsufficientGold {
            required: cost,
            available: state.gold,
        });
    }
    state.gold -= cost;
    debug!(cost, gold = state.gold, "Refreshed shop");
    Ok(())
}

/// The bench unit picked for placement, stored by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlacementSelection {
    selected: Option<UnitId>,
}

impl PlacementSelection {
    /// Selected unit id.
    #[must_use]
    pub const fn get(&self) -> Option<UnitId> {
        self.selected
    }

    /// Whether a unit is selected.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.selected.is_some()
    }

    /// Drop the selection, returning what was selected.
    pub fn clear(&mut self) -> Option<UnitId> {
        self.selected.take()
    }

    /// Bench ordinal of the selection, for highlighting.
    #[must_use]
    pub fn bench_index(&self, roster: &Roster) -> Option<usize> {
        self.selected.and_then(|id| roster.bench_index_of(id))
    }
}

/// Select the bench unit at an ordinal. A failed select keeps the old selection.
///
/// # Errors
///
/// [`ActionError::WrongPhase`] or [`ActionError::InvalidBenchIndex`].
pub fn select_bench(
    state: &GameState,
    roster: &Roster,
    selection: &mut PlacementSelection,
    index: usize,
) -> Result<UnitId, ActionError> {
    require_phase(state, Phase::Prepare)?;
    let unit = roster
        .bench_unit(index)
        .ok_or_else(|| ActionError::InvalidBenchIndex {
            index,
            len: roster.bench_count(),
        })?;
    selection.selected = Some(unit.id);
    debug!(unit = unit.id, index, "Selected bench unit");
    Ok(unit.id)
}

/// Move the selected bench unit onto a cell.
///
/// The cell must be on the board, on the player's half and fully empty.
/// On success the selection is cleared; on a cell error it is kept so the
/// player can retry.
///
/// # Errors
///
/// [`ActionError::WrongPhase`], [`ActionError::NoSelection`],
/// [`ActionError::SelectionLost`], [`ActionError::OutOfBounds`],
/// [`ActionError::NotPlayerSide`] or [`ActionError::TileOccupied`].
pub fn place_selected(
    state: &GameState,
    roster: &mut Roster,
    board: &Board,
    selection: &mut PlacementSelection,
    cell: GridCoord,
) -> Result<UnitId, ActionError> {
    require_phase(state, Phase::Prepare)?;
    let id = selection.get().ok_or(ActionError::NoSelection)?;
    if !roster.by_id(id).is_some_and(|u| u.is_on_bench()) {
        selection.clear();
        return Err(ActionError::SelectionLost);
    }
    if !board.in_bounds(cell) {
        return Err(ActionError::OutOfBounds(cell));
    }
    if !board.is_on_player_side(cell.y) {
        return Err(ActionError::NotPlayerSide(cell));
    }
    if roster.find_occupant(cell).is_some() {
        return Err(ActionError::TileOccupied(cell));
    }

    let unit = roster.by_id_mut(id).ok_or(ActionError::SelectionLost)?;
    unit.set_cell(cell, board);
    selection.clear();
    debug!(unit = id, %cell, "Placed unit");
    Ok(id)
}

/// Drop the current selection.
///
/// # Errors
///
/// [`ActionError::NoSelection`] when nothing is selected.
pub fn cancel_placement(selection: &mut PlacementSelection) -> Result<UnitId, ActionError> {
    selection.clear().ok_or(ActionError::NoSelection)
}

//! The unit roster and the occupancy queries that scan it.
//!
//! Bench and board are not separate containers: both are views over one
//! flat, capacity-bounded `Vec<Unit>` filtered by location tag. The free
//! functions here take a plain slice so the combat pass can call them
//! while it mutates units in place.

use serde::{Deserialize, Serialize};

use crate::board::{Board, GridCoord};
use crate::error::ActionError;
use crate::math::Fixed;
use crate::unit::{Side, Unit, UnitHandle, UnitId, UnitLocation};

/// Default total unit cap.
pub const DEFAULT_MAX_UNITS: usize = 50;

/// Default bench capacity.
pub const DEFAULT_BENCH_SIZE: usize = 8;

/// Index of the alive unit on `cell`, if any. First match in slice order wins.
#[must_use]
pub fn find_occupant(units: &[Unit], cell: GridCoord) -> Option<usize> {
    units
        .iter()
        .position(|u| u.alive && u.location == UnitLocation::Board(cell))
}

/// True unless a player unit stands on `cell`.
///
/// AI occupants are ignored. This is the preview check, not the placement
/// check; placement requires the cell to be fully empty.
#[must_use]
pub fn is_tile_empty_for_player(units: &[Unit], cell: GridCoord) -> bool {
    find_occupant(units, cell).map_or(true, |slot| units[slot].side != Side::Player)
}

/// Whether `mover` may step onto `cell`.
#[must_use]
pub fn is_tile_walkable(units: &[Unit], board: &Board, cell: GridCoord, mover: UnitId) -> bool {
    if !board.in_bounds(cell) {
        return false;
    }
    !units
        .iter()
        .any(|u| u.id != mover && u.alive && u.location == UnitLocation::Board(cell))
}

/// Resolve a handle against a slice, checking the id still matches.
#[must_use]
pub fn resolve(units: &[Unit], handle: UnitHandle) -> Option<&Unit> {
    units.get(handle.slot).filter(|u| u.id == handle.id)
}

/// Flat, bounded collection of every unit in play.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roster {
    units: Vec<Unit>,
    capacity: usize,
    bench_capacity: usize,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new(capacity: usize, bench_capacity: usize) -> Self {
        Self {
            units: Vec::with_capacity(capacity),
            capacity,
            bench_capacity,
        }
    }

    /// Total unit cap.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bench cap.
    #[must_use]
    pub const fn bench_capacity(&self) -> usize {
        self.bench_capacity
    }

    /// Number of units held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Whether the total cap is reached.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.units.len() >= self.capacity
    }

    /// All units in update order.
    #[must_use]
    pub fn as_slice(&self) -> &[Unit] {
        &self.units
    }

    /// Mutable access for the combat pass. Length cannot change through it.
    pub fn as_mut_slice(&mut self) -> &mut [Unit] {
        &mut self.units
    }

    /// Unit in a slot.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&Unit> {
        self.units.get(slot)
    }

    /// Slot of the unit with `id`.
    #[must_use]
    pub fn slot_of(&self, id: UnitId) -> Option<usize> {
        self.units.iter().position(|u| u.id == id)
    }

    /// Unit with `id`.
    #[must_use]
    pub fn by_id(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Mutable unit with `id`.
    pub fn by_id_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Resolve a non-owning handle.
    #[must_use]
    pub fn resolve(&self, handle: UnitHandle) -> Option<&Unit> {
        resolve(&self.units, handle)
    }

    /// Lazily yield the units matching a predicate, in roster order.
    pub fn units_where<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Unit> + 'a
    where
        P: Fn(&Unit) -> bool + 'a,
    {
        self.units.iter().filter(move |u| predicate(u))
    }

    /// Bench units in roster order. Ordinals into this sequence are bench indices.
    pub fn bench(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units_where(Unit::is_on_bench)
    }

    /// Number of units on the bench.
    #[must_use]
    pub fn bench_count(&self) -> usize {
        self.bench().count()
    }

    /// Whether the bench holds its maximum.
    #[must_use]
    pub fn is_bench_full(&self) -> bool {
        self.bench_count() >= self.bench_capacity
    }

    /// The bench unit at an ordinal.
    #[must_use]
    pub fn bench_unit(&self, index: usize) -> Option<&Unit> {
        self.bench().nth(index)
    }

    /// Bench ordinal of the unit with `id`.
    #[must_use]
    pub fn bench_index_of(&self, id: UnitId) -> Option<usize> {
        self.bench().position(|u| u.id == id)
    }

    /// Alive board units of a side.
    #[must_use]
    pub fn count_active(&self, side: Side) -> usize {
        self.units_where(move |u| u.side == side && u.is_active())
            .count()
    }

    /// Index of the alive unit on `cell`.
    #[must_use]
    pub fn find_occupant(&self, cell: GridCoord) -> Option<usize> {
        find_occupant(&self.units, cell)
    }

    /// See [`is_tile_empty_for_player`].
    #[must_use]
    pub fn is_tile_empty_for_player(&self, cell: GridCoord) -> bool {
        is_tile_empty_for_player(&self.units, cell)
    }

    /// See [`is_tile_walkable`].
    #[must_use]
    pub fn is_tile_walkable(&self, board: &Board, cell: GridCoord, mover: UnitId) -> bool {
        is_tile_walkable(&self.units, board, cell, mover)
    }

    /// Append a unit, respecting the total cap.
    ///
    /// # Errors
    ///
    /// [`ActionError::UnitCapReached`] when the roster is full.
    pub fn push(&mut self, unit: Unit) -> Result<UnitHandle, ActionError> {
        if self.is_full() {
            return Err(ActionError::UnitCapReached {
                capacity: self.capacity,
            });
        }
        let handle = UnitHandle::new(self.units.len(), unit.id);
        self.units.push(unit);
        Ok(handle)
    }

    /// Keep only units matching the predicate, preserving relative order.
    ///
    /// Returns the ids of the removed units in their former order.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<UnitId>
    where
        F: FnMut(&Unit) -> bool,
    {
        let mut removed = Vec::new();
        self.units.retain(|u| {
            let kept = keep(u);
            if !kept {
                removed.push(u.id);
            }
            kept
        });
        removed
    }

    /// Apply a mutation to every unit.
    pub fn for_each_mut<F>(&mut self, f: F)
    where
        F: FnMut(&mut Unit),
    {
        self.units.iter_mut().for_each(f);
    }

    /// Check roster invariants, returning the first violation.
    ///
    /// Covers: one alive unit per cell, hp within bounds, alive flag
    /// matching hp, and targets that resolve to alive board units.
    #[must_use]
    pub fn find_violation(&self) -> Option<String> {
        for (slot, unit) in self.units.iter().enumerate() {
            if unit.current_hp > unit.stats.max_hp || unit.current_hp < Fixed::ZERO {
                return Some(format!("unit {} hp {} out of range", unit.id, unit.current_hp));
            }
            if unit.alive != (unit.current_hp > Fixed::ZERO) {
                return Some(format!("unit {} alive flag disagrees with hp", unit.id));
            }
            if let Some(cell) = unit.cell() {
                if unit.alive && find_occupant(&self.units, cell) != Some(slot) {
                    return Some(format!("cell {cell} holds more than one unit"));
                }
            }
            if let Some(handle) = unit.target {
                if !self.resolve(handle).is_some_and(Unit::is_active) {
                    return Some(format!(
                        "unit {} targets {} which is gone",
                        unit.id, handle.id
                    ));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{UnitStats, UnitType};

    fn stats() -> UnitStats {
        UnitStats {
            max_hp: Fixed::from_num(100),
            attack_damage: Fixed::from_num(10),
            attack_speed: Fixed::ONE,
            attack_range: Fixed::ONE,
            aggro_range: Fixed::from_num(3),
            movement_speed: Fixed::ONE,
        }
    }

    fn unit(id: UnitId, side: Side, location: UnitLocation) -> Unit {
        let mut unit = Unit::new(id, UnitType::MeleeTank, side, stats());
        unit.location = location;
        unit
    }

    fn on(x: i32, y: i32) -> UnitLocation {
        UnitLocation::Board(GridCoord::new(x, y))
    }

    #[test]
    fn test_find_occupant_ignores_dead_and_bench() {
        let mut dead = unit(1, Side::Player, on(2, 2));
        dead.alive = false;
        let units = vec![dead, unit(2, Side::Player, UnitLocation::Bench), unit(3, Side::Ai, on(2, 2))];
        assert_eq!(find_occupant(&units, GridCoord::new(2, 2)), Some(2));
        assert_eq!(find_occupant(&units, GridCoord::new(0, 0)), None);
    }

    #[test]
    fn test_empty_for_player_ignores_ai() {
        let units = vec![unit(1, Side::Ai, on(1, 1)), unit(2, Side::Player, on(2, 1))];
        assert!(is_tile_empty_for_player(&units, GridCoord::new(1, 1)));
        assert!(!is_tile_empty_for_player(&units, GridCoord::new(2, 1)));
        assert!(is_tile_empty_for_player(&units, GridCoord::new(5, 5)));
    }

    #[test]
    fn test_walkable_excludes_self_and_bounds() {
        let board = Board::default();
        let units = vec![unit(1, Side::Player, on(1, 1)), unit(2, Side::Ai, on(2, 2))];
        assert!(is_tile_walkable(&units, &board, GridCoord::new(1, 1), 1));
        assert!(!is_tile_walkable(&units, &board, GridCoord::new(2, 2), 1));
        assert!(!is_tile_walkable(&units, &board, GridCoord::new(-1, 0), 1));
        assert!(!is_tile_walkable(&units, &board, GridCoord::new(0, 8), 1));
    }

    #[test]
    fn test_push_respects_cap() {
        let mut roster = Roster::new(2, 2);
        assert!(roster.push(unit(1, Side::Player, UnitLocation::Bench)).is_ok());
        let handle = roster.push(unit(2, Side::Player, UnitLocation::Bench)).unwrap();
        assert_eq!(handle, UnitHandle::new(1, 2));
        assert_eq!(
            roster.push(unit(3, Side::Player, UnitLocation::Bench)),
            Err(ActionError::UnitCapReached { capacity: 2 })
        );
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_bench_enumeration_by_location() {
        let mut roster = Roster::new(10, 4);
        for (id, location) in [
            (1, UnitLocation::Bench),
            (2, on(0, 0)),
            (3, UnitLocation::Bench),
            (4, UnitLocation::None),
        ] {
            roster.push(unit(id, Side::Player, location)).unwrap();
        }
        let bench: Vec<UnitId> = roster.bench().map(|u| u.id).collect();
        assert_eq!(bench, vec![1, 3]);
        assert_eq!(roster.bench_count(), 2);
        assert_eq!(roster.bench_unit(1).map(|u| u.id), Some(3));
        assert_eq!(roster.bench_index_of(3), Some(1));
        assert_eq!(roster.bench_index_of(2), None);
    }

    #[test]
    fn test_retain_is_stable() {
        let mut roster = Roster::new(10, 4);
        for id in 1..=5 {
            let side = if id % 2 == 0 { Side::Ai } else { Side::Player };
            roster.push(unit(id, side, UnitLocation::Bench)).unwrap();
        }
        let removed = roster.retain(|u| u.side == Side::Player);
        assert_eq!(removed, vec![2, 4]);
        let kept: Vec<UnitId> = roster.as_slice().iter().map(|u| u.id).collect();
        assert_eq!(kept, vec![1, 3, 5]);
    }

    #[test]
    fn test_handle_resolution_after_compaction() {
        let mut roster = Roster::new(10, 4);
        roster.push(unit(1, Side::Ai, on(0, 7))).unwrap();
        let handle = roster.push(unit(2, Side::Player, on(0, 0))).unwrap();
        assert!(roster.resolve(handle).is_some());
        roster.retain(|u| u.side == Side::Player);
        // Slot 1 no longer exists; slot 0 now holds unit 2 but the handle points at slot 1.
        assert!(roster.resolve(handle).is_none());
    }

    #[test]
    fn test_find_violation_detects_shared_cell() {
        let mut roster = Roster::new(10, 4);
        roster.push(unit(1, Side::Player, on(3, 3))).unwrap();
        assert_eq!(roster.find_violation(), None);
        roster.push(unit(2, Side::Ai, on(3, 3))).unwrap();
        assert!(roster.find_violation().is_some());
    }

    #[test]
    fn test_find_violation_detects_dangling_target() {
        let mut roster = Roster::new(10, 4);
        let mut attacker = unit(1, Side::Player, on(0, 0));
        attacker.target = Some(UnitHandle::new(1, 2));
        roster.push(attacker).unwrap();
        let mut victim = unit(2, Side::Ai, on(1, 1));
        victim.alive = false;
        victim.current_hp = Fixed::ZERO;
        roster.push(victim).unwrap();
        assert!(roster.find_violation().is_some());
    }

    #[test]
    fn test_count_active() {
        let mut roster = Roster::new(10, 4);
        roster.push(unit(1, Side::Player, on(0, 0))).unwrap();
        roster.push(unit(2, Side::Player, UnitLocation::Bench)).unwrap();
        roster.push(unit(3, Side::Ai, on(0, 7))).unwrap();
        assert_eq!(roster.count_active(Side::Player), 1);
        assert_eq!(roster.count_active(Side::Ai), 1);
    }
}

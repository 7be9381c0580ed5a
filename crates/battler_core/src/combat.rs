//! Per-unit combat state machine.
//!
//! Each tick every unit is updated once, in roster order, by
//! [`update_unit`]. Later units see the targets earlier units picked in
//! the same tick; the reactive retarget of AI units depends on that.
//!
//! One update runs these steps:
//!
//! 1. Advance the attack flash and both cooldowns.
//! 2. Drop a target that died, left the board, or (for units that
//!    disengage) moved beyond aggro range.
//! 3. Scan enemies for the closest overall and the closest within aggro.
//! 4. AI units look for the nearest enemy that is attacking them.
//! 5. Switch to that attacker, or acquire the closest in-aggro enemy.
//! 6. Derive `Attacking`, `Moving` or `Idle` from the target.
//! 7. Take one grid step when the move cooldown is ready.
//! 8. Hit the target when the attack cooldown is ready.
//!
//! Outside combat, or for units that are dead or off the board, the
//! update only clears engagement state.
//!
//! All range tests compare squared distances.

use tracing::{debug, trace};

use crate::board::{Board, GridCoord};
use crate::math::{per_second, Fixed, Vec3Fixed};
use crate::roster::{is_tile_walkable, resolve};
use crate::round::Phase;
use crate::unit::{CombatState, Side, Unit, UnitHandle, UnitId};

/// Something that happened during a combat update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatEvent {
    /// A unit with no target picked one.
    TargetAcquired {
        /// Acting unit.
        unit: UnitId,
        /// New target.
        target: UnitId,
    },
    /// An AI unit turned on an enemy attacking it.
    TargetSwitched {
        /// Acting unit.
        unit: UnitId,
        /// Previous target.
        from: UnitId,
        /// New target.
        to: UnitId,
    },
    /// A held target became invalid and was dropped.
    TargetLost {
        /// Unit that held the target.
        unit: UnitId,
        /// Dropped target.
        target: UnitId,
    },
    /// A unit stepped to a neighbouring cell.
    Moved {
        /// Moving unit.
        unit: UnitId,
        /// Cell left.
        from: GridCoord,
        /// Cell entered.
        to: GridCoord,
    },
    /// Every candidate step was blocked.
    MoveBlocked {
        /// Blocked unit.
        unit: UnitId,
        /// Cell it stays on.
        at: GridCoord,
    },
    /// A hit landed.
    Attacked {
        /// Attacking unit.
        attacker: UnitId,
        /// Unit hit.
        target: UnitId,
        /// Damage dealt.
        damage: Fixed,
        /// Target hp after the hit.
        remaining_hp: Fixed,
    },
    /// A unit's hp reached zero.
    Died {
        /// Unit that died.
        unit: UnitId,
        /// Unit that landed the killing blow.
        killer: UnitId,
    },
}

/// Inputs shared by every unit update in one tick.
#[derive(Debug, Clone, Copy)]
pub struct CombatContext<'a> {
    /// Board geometry.
    pub board: &'a Board,
    /// Phase at the time of the update.
    pub phase: Phase,
    /// Clamped tick duration in seconds.
    pub dt: Fixed,
    /// Move cooldown after a fully blocked step.
    pub blocked_move_retry: Fixed,
    /// How long the attack flash stays on.
    pub attack_visual_duration: Fixed,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    slot: usize,
    id: UnitId,
    cell: GridCoord,
    distance_sq: Fixed,
}

impl Candidate {
    const fn handle(self) -> UnitHandle {
        UnitHandle::new(self.slot, self.id)
    }

    fn closer_than(self, best: Option<Self>) -> bool {
        best.map_or(true, |best| self.distance_sq < best.distance_sq)
    }
}

#[derive(Debug, Default)]
struct EnemyScan {
    closest: Option<Candidate>,
    closest_in_aggro: Option<Candidate>,
}

/// Update every unit once, in slice order.
pub fn run_combat_pass(units: &mut [Unit], ctx: &CombatContext<'_>, events: &mut Vec<CombatEvent>) {
    for index in 0..units.len() {
        update_unit(units, index, ctx, events);
    }
}

/// Update one unit.
pub fn update_unit(
    units: &mut [Unit],
    index: usize,
    ctx: &CombatContext<'_>,
    events: &mut Vec<CombatEvent>,
) {
    let Some(unit) = units.get(index) else {
        return;
    };
    if ctx.phase != Phase::Combat || !unit.is_active() {
        units[index].clear_engagement();
        return;
    }

    units[index].advance_timers(ctx.dt);
    validate_target(units, index, events);

    let scan = scan_enemies(units, index);
    let attacker = if units[index].side == Side::Ai {
        find_reactive_attacker(units, index)
    } else {
        None
    };
    assign_target(units, index, attacker, scan.closest_in_aggro, events);

    let destination = derive_state(units, index, scan.closest);

    if units[index].state == CombatState::Moving && units[index].move_cooldown <= Fixed::ZERO {
        if let Some(destination) = destination {
            execute_move(units, index, destination, ctx, events);
        }
    }

    if units[index].state == CombatState::Attacking && units[index].attack_cooldown <= Fixed::ZERO {
        execute_attack(units, index, ctx, events);
    }
}

fn validate_target(units: &mut [Unit], index: usize, events: &mut Vec<CombatEvent>) {
    let unit = &units[index];
    let Some(handle) = unit.target else {
        return;
    };
    let still_valid = resolve(units, handle).is_some_and(|target| {
        target.is_active()
            && !(unit.unit_type.disengages_beyond_aggro()
                && unit.world_pos.distance_squared(target.world_pos)
                    > unit.stats.aggro_range_sq())
    });
    if !still_valid {
        let unit = &mut units[index];
        unit.target = None;
        unit.needs_to_move_for_attack = false;
        debug!(unit = unit.id, target = handle.id, "Target lost");
        events.push(CombatEvent::TargetLost {
            unit: unit.id,
            target: handle.id,
        });
    }
}

fn enemies_of(units: &[Unit], index: usize) -> impl Iterator<Item = Candidate> + '_ {
    let me = &units[index];
    units
        .iter()
        .enumerate()
        .filter(move |(slot, other)| *slot != index && other.is_active() && me.is_enemy_of(other))
        .filter_map(move |(slot, other)| {
            Some(Candidate {
                slot,
                id: other.id,
                cell: other.cell()?,
                distance_sq: me.world_pos.distance_squared(other.world_pos),
            })
        })
}

fn scan_enemies(units: &[Unit], index: usize) -> EnemyScan {
    let aggro_sq = units[index].stats.aggro_range_sq();
    let mut scan = EnemyScan::default();
    for candidate in enemies_of(units, index) {
        if candidate.closer_than(scan.closest) {
            scan.closest = Some(candidate);
        }
        if candidate.distance_sq <= aggro_sq && candidate.closer_than(scan.closest_in_aggro) {
            scan.closest_in_aggro = Some(candidate);
        }
    }
    scan
}

/// Nearest in-aggro enemy whose current target is this unit.
fn find_reactive_attacker(units: &[Unit], index: usize) -> Option<Candidate> {
    let me = &units[index];
    let aggro_sq = me.stats.aggro_range_sq();
    enemies_of(units, index)
        .filter(|c| c.distance_sq <= aggro_sq)
        .filter(|c| units[c.slot].target.is_some_and(|t| t.id == me.id))
        .fold(None, |best, c| if c.closer_than(best) { Some(c) } else { best })
}

fn assign_target(
    units: &mut [Unit],
    index: usize,
    attacker: Option<Candidate>,
    closest_in_aggro: Option<Candidate>,
    events: &mut Vec<CombatEvent>,
) {
    let unit = &mut units[index];
    let current = unit.target;

    if let Some(attacker) = attacker {
        if current.map(|h| h.id) != Some(attacker.id) {
            unit.target = Some(attacker.handle());
            match current {
                Some(previous) => {
                    debug!(unit = unit.id, from = previous.id, to = attacker.id, "Target switched to attacker");
                    events.push(CombatEvent::TargetSwitched {
                        unit: unit.id,
                        from: previous.id,
                        to: attacker.id,
                    });
                }
                None => {
                    debug!(unit = unit.id, target = attacker.id, "Target acquired (attacker)");
                    events.push(CombatEvent::TargetAcquired {
                        unit: unit.id,
                        target: attacker.id,
                    });
                }
            }
            return;
        }
    }

    if current.is_none() {
        if let Some(candidate) = closest_in_aggro {
            unit.target = Some(candidate.handle());
            debug!(unit = unit.id, target = candidate.id, "Target acquired");
            events.push(CombatEvent::TargetAcquired {
                unit: unit.id,
                target: candidate.id,
            });
        }
    }
}

/// Set the combat state from the held target and return where to walk.
fn derive_state(units: &mut [Unit], index: usize, closest: Option<Candidate>) -> Option<GridCoord> {
    let engaged: Option<(Vec3Fixed, Option<GridCoord>)> = units[index]
        .target
        .and_then(|handle| resolve(units, handle))
        .map(|target| (target.world_pos, target.cell()));

    let unit = &mut units[index];
    if let Some((target_pos, target_cell)) = engaged {
        unit.face_towards(target_pos);
        if unit.world_pos.distance_squared(target_pos) <= unit.stats.attack_range_sq() {
            unit.state = CombatState::Attacking;
            unit.needs_to_move_for_attack = false;
            None
        } else {
            unit.state = CombatState::Moving;
            unit.needs_to_move_for_attack = true;
            target_cell
        }
    } else if let Some(closest) = closest {
        unit.state = CombatState::Moving;
        unit.needs_to_move_for_attack = false;
        Some(closest.cell)
    } else {
        unit.state = CombatState::Idle;
        unit.needs_to_move_for_attack = false;
        None
    }
}

/// First walkable step toward `destination`: diagonal, then X only, then Y only.
fn choose_step(
    units: &[Unit],
    board: &Board,
    mover: UnitId,
    from: GridCoord,
    destination: GridCoord,
) -> Option<GridCoord> {
    let dx = (destination.x - from.x).signum();
    let dy = (destination.y - from.y).signum();
    let candidates = [
        (dx != 0 && dy != 0).then(|| from.offset(dx, dy)),
        (dx != 0).then(|| from.offset(dx, 0)),
        (dy != 0).then(|| from.offset(0, dy)),
    ];
    candidates
        .into_iter()
        .flatten()
        .find(|&cell| is_tile_walkable(units, board, cell, mover))
}

fn execute_move(
    units: &mut [Unit],
    index: usize,
    destination: GridCoord,
    ctx: &CombatContext<'_>,
    events: &mut Vec<CombatEvent>,
) {
    let Some(from) = units[index].cell() else {
        return;
    };
    let id = units[index].id;
    let step = choose_step(units, ctx.board, id, from, destination);
    let target_pos = units[index]
        .target
        .and_then(|handle| resolve(units, handle))
        .map(|target| target.world_pos);

    let unit = &mut units[index];
    match step {
        Some(to) => {
            unit.set_cell(to, ctx.board);
            unit.move_cooldown = per_second(unit.stats.movement_speed);
            trace!(unit = id, %from, %to, "Moved");
            events.push(CombatEvent::Moved { unit: id, from, to });

            if unit.needs_to_move_for_attack {
                if let Some(target_pos) = target_pos {
                    unit.face_towards(target_pos);
                    if unit.world_pos.distance_squared(target_pos) <= unit.stats.attack_range_sq() {
                        unit.state = CombatState::Attacking;
                        unit.needs_to_move_for_attack = false;
                    }
                }
            }
        }
        None => {
            unit.move_cooldown = ctx.blocked_move_retry;
            trace!(unit = id, at = %from, "Move blocked");
            events.push(CombatEvent::MoveBlocked { unit: id, at: from });
        }
    }
}

fn execute_attack(
    units: &mut [Unit],
    index: usize,
    ctx: &CombatContext<'_>,
    events: &mut Vec<CombatEvent>,
) {
    let attacker_id = units[index].id;
    let handle = units[index]
        .target
        .filter(|&handle| resolve(units, handle).is_some_and(Unit::is_active));
    let Some(handle) = handle else {
        let unit = &mut units[index];
        unit.target = None;
        unit.state = CombatState::Idle;
        return;
    };

    let damage = units[index].stats.attack_damage;
    let killed = units[handle.slot].take_damage(damage);
    let remaining_hp = units[handle.slot].current_hp;

    let unit = &mut units[index];
    unit.attacking_visual = true;
    unit.attack_visual_timer = ctx.attack_visual_duration;
    unit.attack_cooldown = per_second(unit.stats.attack_speed);
    debug!(attacker = attacker_id, target = handle.id, damage = %damage, remaining = %remaining_hp, "Attack");
    events.push(CombatEvent::Attacked {
        attacker: attacker_id,
        target: handle.id,
        damage,
        remaining_hp,
    });

    if killed {
        unit.target = None;
        unit.state = CombatState::Idle;
        debug!(unit = handle.id, killer = attacker_id, "Unit died");
        events.push(CombatEvent::Died {
            unit: handle.id,
            killer: attacker_id,
        });
        release_references(units, handle.id, attacker_id, events);
    }
}

/// Drop every remaining reference to a dead unit so none outlives the tick.
fn release_references(
    units: &mut [Unit],
    dead: UnitId,
    killer: UnitId,
    events: &mut Vec<CombatEvent>,
) {
    for unit in units.iter_mut().filter(|u| u.id != killer) {
        if unit.target.is_some_and(|t| t.id == dead) {
            unit.target = None;
            if unit.state == CombatState::Attacking || unit.needs_to_move_for_attack {
                unit.state = CombatState::Idle;
                unit.needs_to_move_for_attack = false;
            }
            events.push(CombatEvent::TargetLost {
                unit: unit.id,
                target: dead,
            });
        }
    }
}

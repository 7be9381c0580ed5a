//! Round lifecycle: phases, player economy and round resolution.
//!
//! ```text
//! Prepare --start combat--> Combat --end condition--> PostCombat --resolve--> Prepare
//!    \__________________________ hp <= 0 ____________________________/--> GameOver
//! ```
//!
//! `PostCombat` never survives a tick: it is resolved in the same tick it
//! is entered. `GameOver` is absorbing.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::board::{Board, GridCoord};
use crate::config::{EconomyRules, SpawnRule};
use crate::math::{fixed_serde, Fixed};
use crate::roster::Roster;
use crate::unit::{Side, Unit, UnitFactory, UnitId, UnitLocation, UnitRegistry};

/// Game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Buying and placing units.
    #[default]
    Prepare,
    /// Units fight on their own.
    Combat,
    /// Combat ended; resolved within the same tick.
    PostCombat,
    /// Player HP ran out.
    GameOver,
}

impl Phase {
    /// HUD label.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Prepare => "Prepare Phase",
            Self::Combat => "Combat Phase",
            Self::PostCombat => "Round End Phase",
            Self::GameOver => "Game Over",
        }
    }
}

/// A phase transition that happened during a tick or action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChange {
    /// Phase left.
    pub from: Phase,
    /// Phase entered.
    pub to: Phase,
}

/// Player-facing game state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    /// Current phase.
    pub phase: Phase,
    /// Player HP. Not clamped; may go negative before the game-over check.
    pub player_hp: i32,
    /// Player gold.
    pub gold: i32,
    /// Current wave number.
    pub wave: i32,
    /// Seconds spent in the current combat phase.
    #[serde(with = "fixed_serde")]
    pub combat_timer: Fixed,
}

impl GameState {
    /// Fresh state at the start of a game.
    #[must_use]
    pub fn new(economy: &EconomyRules) -> Self {
        Self {
            phase: Phase::Prepare,
            player_hp: economy.starting_hp,
            gold: economy.starting_gold,
            wave: economy.starting_wave,
            combat_timer: Fixed::ZERO,
        }
    }

    /// Whether player HP has run out.
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.player_hp <= 0
    }

    /// Change phase, returning the transition if the phase actually changed.
    pub fn enter(&mut self, phase: Phase) -> Option<PhaseChange> {
        if self.phase == phase {
            return None;
        }
        let change = PhaseChange {
            from: self.phase,
            to: phase,
        };
        info!(from = ?change.from, to = ?change.to, wave = self.wave, "Phase change");
        self.phase = phase;
        Some(change)
    }
}

/// How a round ended, judged by alive units left on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// Only player units survived.
    PlayerWin,
    /// Only AI units survived.
    AiWin,
    /// Nobody survived.
    Draw,
    /// Both sides survived the timer. Scored as an AI win for damage.
    Contested,
}

impl RoundOutcome {
    /// Classify from survivor counts.
    #[must_use]
    pub const fn from_survivors(player: usize, ai: usize) -> Self {
        match (player > 0, ai > 0) {
            (true, false) => Self::PlayerWin,
            (false, true) => Self::AiWin,
            (false, false) => Self::Draw,
            (true, true) => Self::Contested,
        }
    }

    /// Whether the player takes damage.
    #[must_use]
    pub const fn damages_player(self) -> bool {
        matches!(self, Self::AiWin | Self::Contested)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::PlayerWin => "Victory",
            Self::AiWin => "Defeat",
            Self::Draw => "Draw",
            Self::Contested => "Time Up",
        }
    }
}

/// Summary of one resolved round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    /// Wave that was fought.
    pub wave: i32,
    /// Outcome.
    pub outcome: RoundOutcome,
    /// Player units alive on the board at the end.
    pub player_survivors: usize,
    /// AI units alive on the board at the end.
    pub ai_survivors: usize,
    /// HP the player lost.
    pub damage_taken: i32,
    /// Gold paid out, income plus any win bonus.
    pub gold_earned: i32,
    /// Player HP after damage.
    pub player_hp: i32,
    /// Player gold after payout.
    pub gold: i32,
    /// Wave number of the next round.
    pub next_wave: i32,
    /// Units dropped from the roster, in former roster order.
    pub removed_units: Vec<UnitId>,
}

/// Whether the combat phase should end now.
#[must_use]
pub fn combat_should_end(roster: &Roster, combat_timer: Fixed, combat_duration: Fixed) -> bool {
    combat_timer >= combat_duration
        || roster.count_active(Side::Player) == 0
        || roster.count_active(Side::Ai) == 0
}

fn to_i32(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Score the round, pay out, and compact the roster for the next one.
///
/// AI units are dropped. Player units that died on the board are marked
/// [`UnitLocation::None`] and dropped. Everything else is reset and kept
/// in its original order.
pub fn resolve_round(state: &mut GameState, roster: &mut Roster, economy: &EconomyRules) -> RoundReport {
    let player_survivors = roster.count_active(Side::Player);
    let ai_survivors = roster.count_active(Side::Ai);
    let outcome = RoundOutcome::from_survivors(player_survivors, ai_survivors);

    let damage_taken = if outcome.damages_player() {
        to_i32(ai_survivors)
            .saturating_mul(economy.damage_per_surviving_ai)
            .saturating_add(state.wave)
    } else {
        0
    };
    let gold_earned = if outcome == RoundOutcome::PlayerWin {
        economy.base_income.saturating_add(economy.round_win_bonus)
    } else {
        economy.base_income
    };

    let wave = state.wave;
    state.player_hp = state.player_hp.saturating_sub(damage_taken);
    state.gold = state.gold.saturating_add(gold_earned);
    state.wave = state.wave.saturating_add(1);

    roster.for_each_mut(|unit| {
        if unit.side == Side::Player && unit.is_on_board() && !unit.alive {
            unit.location = UnitLocation::None;
        }
    });
    let removed_units =
        roster.retain(|unit| unit.side == Side::Player && (unit.is_on_bench() || unit.is_active()));
    roster.for_each_mut(Unit::reset_for_round);

    info!(
        wave,
        outcome = outcome.display_name(),
        player_survivors,
        ai_survivors,
        damage_taken,
        gold_earned,
        player_hp = state.player_hp,
        "Round resolved"
    );

    RoundReport {
        wave,
        outcome,
        player_survivors,
        ai_survivors,
        damage_taken,
        gold_earned,
        player_hp: state.player_hp,
        gold: state.gold,
        next_wave: state.wave,
        removed_units,
    }
}

/// Nearest free cell to `wanted` on the given side's half, `wanted` first.
fn free_cell_near(roster: &Roster, board: &Board, wanted: GridCoord, side: Side) -> Option<GridCoord> {
    let on_side = |cell: GridCoord| board.is_on_player_side(cell.y) == (side == Side::Player);
    if board.in_bounds(wanted) && on_side(wanted) && roster.find_occupant(wanted).is_none() {
        return Some(wanted);
    }
    board
        .cells()
        .filter(|&cell| on_side(cell) && roster.find_occupant(cell).is_none())
        .min_by_key(|cell| {
            let (dx, dy) = (cell.x - wanted.x, cell.y - wanted.y);
            (dx * dx + dy * dy, cell.y, cell.x)
        })
}

/// Put units straight onto the board for one side.
///
/// A spawn whose cell is taken goes to the nearest free cell on the same
/// half. Spawning stops at the roster cap. Returns the new unit ids.
pub fn spawn_on_board(
    roster: &mut Roster,
    factory: &mut UnitFactory,
    registry: &UnitRegistry,
    board: &Board,
    spawns: &[SpawnRule],
    side: Side,
) -> Vec<UnitId> {
    let mut spawned = Vec::with_capacity(spawns.len());
    for spawn in spawns {
        if roster.is_full() {
            warn!(capacity = roster.capacity(), "Unit cap reached, skipping remaining spawns");
            break;
        }
        let Some(cell) = free_cell_near(roster, board, spawn.cell, side) else {
            warn!(cell = %spawn.cell, ?side, "No free cell for spawn");
            continue;
        };
        if cell != spawn.cell {
            warn!(wanted = %spawn.cell, %cell, "Spawn cell occupied, using nearest free cell");
        }
        let mut unit = factory.create(registry.get(spawn.unit_type), side);
        unit.set_cell(cell, board);
        let id = unit.id;
        match roster.push(unit) {
            Ok(_) => spawned.push(id),
            Err(err) => warn!(%err, "Spawn rejected"),
        }
    }
    spawned
}

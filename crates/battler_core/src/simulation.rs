//! The simulation facade.
//!
//! [`Simulation`] owns everything: rules, board, roster, id factory, game
//! state and the placement selection. Front ends drive it with two calls:
//! [`Simulation::apply`] for player actions and [`Simulation::tick`] to
//! advance time.
//!
//! # Determinism
//!
//! - All simulation math is fixed-point.
//! - Units update in roster order, which only changes at phase boundaries.
//! - No randomness.
//!
//! Two simulations built from the same rules and fed the same actions and
//! tick durations have equal [`Simulation::state_hash`] values.
//!
//! # Example
//!
//! ```
//! use battler_core::config::RulesConfig;
//! use battler_core::math::Fixed;
//! use battler_core::simulation::{PlayerAction, Simulation};
//! use battler_core::round::Phase;
//! use battler_core::unit::UnitType;
//!
//! let mut sim = Simulation::new(RulesConfig::default()).unwrap();
//! sim.apply(PlayerAction::Purchase(UnitType::RangedArcher)).unwrap();
//! sim.apply(PlayerAction::StartCombat).unwrap();
//! assert_eq!(sim.state().phase, Phase::Combat);
//!
//! let events = sim.tick(Fixed::from_num(0.05));
//! assert_eq!(sim.tick_count(), 1);
//! assert!(events.round.is_none());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::board::{Board, GridCoord};
use crate::combat::{run_combat_pass, CombatContext, CombatEvent};
use crate::config::{RulesConfig, TickTiming};
use crate::error::{ActionError, GameError, Result};
use crate::math::Fixed;
use crate::roster::Roster;
use crate::round::{
    combat_should_end, resolve_round, spawn_on_board, GameState, Phase, PhaseChange, RoundReport,
};
use crate::shop::{self, PlacementSelection};
use crate::unit::{Side, Unit, UnitFactory, UnitId, UnitRegistry, UnitType};
use crate::view::{
    ghost_preview, BenchView, BoardView, GhostPreview, HudView, SimulationSnapshot, UnitView,
};

/// A discrete player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerAction {
    /// Buy a unit onto the bench.
    Purchase(UnitType),
    /// Select the bench unit at an ordinal.
    SelectBench(usize),
    /// Place the selected unit on a cell.
    Place(GridCoord),
    /// Drop the selection.
    CancelPlacement,
    /// Spawn the wave and start fighting.
    StartCombat,
    /// Pay to refresh the shop.
    RefreshShop,
}

/// What a successful action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// A unit was bought.
    Purchased {
        /// New bench unit.
        unit: UnitId,
        /// Gold paid.
        cost: i32,
        /// Gold left.
        gold: i32,
    },
    /// A bench unit was selected.
    Selected {
        /// Selected unit.
        unit: UnitId,
        /// Its bench ordinal.
        index: usize,
    },
    /// The selected unit went onto the board.
    Placed {
        /// Placed unit.
        unit: UnitId,
        /// Its cell.
        cell: GridCoord,
    },
    /// The selection was dropped.
    Cancelled {
        /// Previously selected unit.
        unit: UnitId,
    },
    /// The shop was refreshed.
    ShopRefreshed {
        /// Gold paid.
        cost: i32,
        /// Gold left.
        gold: i32,
    },
    /// Combat began.
    CombatStarted {
        /// Wave being fought.
        wave: i32,
        /// AI units spawned.
        spawned: Vec<UnitId>,
    },
}

/// Events generated during a simulation tick.
///
/// These can drive effects, logs and UI feedback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Tick number after this tick.
    pub tick: u64,
    /// Combat events in update order.
    pub combat: Vec<CombatEvent>,
    /// Phase transitions in order.
    pub phase_changes: Vec<PhaseChange>,
    /// Round summary, on the tick a round is resolved.
    pub round: Option<RoundReport>,
}

impl TickEvents {
    /// Whether the game ended this tick.
    #[must_use]
    pub fn entered_game_over(&self) -> bool {
        self.phase_changes.iter().any(|c| c.to == Phase::GameOver)
    }
}

/// The auto-battler simulation.
///
/// # Tick Order
///
/// 1. Clamp `dt` to `[0, max_tick_dt]`.
/// 2. Enter game over if player HP is at or below zero.
/// 3. Advance the combat timer while in combat.
/// 4. Update every unit once, in roster order.
/// 5. End combat on timeout or when either side has no units left.
/// 6. Resolve a finished round and return to prepare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    tick: u64,
    rules: RulesConfig,
    board: Board,
    registry: UnitRegistry,
    timing: TickTiming,
    roster: Roster,
    factory: UnitFactory,
    state: GameState,
    selection: PlacementSelection,
}

impl Simulation {
    /// Build a game from validated rules and spawn the starting roster.
    ///
    /// # Errors
    ///
    /// Any error from [`RulesConfig::validate`].
    pub fn new(rules: RulesConfig) -> Result<Self> {
        rules.validate()?;
        let board = rules.board();
        let registry = UnitRegistry::from_descriptors(&rules.units, board.tile_size())?;
        let mut sim = Self {
            tick: 0,
            board,
            registry,
            timing: rules.timing.to_fixed(),
            roster: Roster::new(rules.capacity.max_units, rules.capacity.bench_size),
            factory: UnitFactory::new(),
            state: GameState::new(&rules.economy),
            selection: PlacementSelection::default(),
            rules,
        };
        let starting = sim.rules.starting_roster.clone();
        spawn_on_board(
            &mut sim.roster,
            &mut sim.factory,
            &sim.registry,
            &sim.board,
            &starting,
            Side::Player,
        );
        info!(
            board = %format!("{}x{}", sim.board.width(), sim.board.height()),
            units = sim.roster.len(),
            "Simulation created"
        );
        Ok(sim)
    }

    /// Throw the game away and start over with the same rules.
    ///
    /// # Errors
    ///
    /// Same as [`Simulation::new`].
    pub fn restart(&mut self) -> Result<()> {
        *self = Self::new(self.rules.clone())?;
        Ok(())
    }

    /// Number of ticks run.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Game state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Every unit in update order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        self.roster.as_slice()
    }

    /// The roster.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Board geometry.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Rules this game was built from.
    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Per-type blueprints.
    #[must_use]
    pub const fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    /// Fixed-point timing constants.
    #[must_use]
    pub const fn timing(&self) -> &TickTiming {
        &self.timing
    }

    /// Current placement selection.
    #[must_use]
    pub const fn selection(&self) -> &PlacementSelection {
        &self.selection
    }

    /// Whether the game has ended.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.state.phase == Phase::GameOver
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: Fixed) -> TickEvents {
        let dt = dt.clamp(Fixed::ZERO, self.timing.max_tick_dt);
        let mut events = TickEvents::default();

        if self.state.is_defeated() {
            if let Some(change) = self.state.enter(Phase::GameOver) {
                self.selection.clear();
                events.phase_changes.push(change);
            }
        }

        if self.state.phase == Phase::Combat {
            self.state.combat_timer += dt;
        }

        let ctx = CombatContext {
            board: &self.board,
            phase: self.state.phase,
            dt,
            blocked_move_retry: self.timing.blocked_move_retry,
            attack_visual_duration: self.timing.attack_visual_duration,
        };
        run_combat_pass(self.roster.as_mut_slice(), &ctx, &mut events.combat);

        if self.state.phase == Phase::Combat
            && combat_should_end(&self.roster, self.state.combat_timer, self.timing.combat_duration)
        {
            events.phase_changes.extend(self.state.enter(Phase::PostCombat));
            self.state.combat_timer = Fixed::ZERO;
        }

        if self.state.phase == Phase::PostCombat {
            let report = resolve_round(&mut self.state, &mut self.roster, &self.rules.economy);
            events.round = Some(report);
            events.phase_changes.extend(self.state.enter(Phase::Prepare));
        }

        self.tick += 1;
        events.tick = self.tick;

        #[cfg(feature = "debug-validation")]
        {
            let violation = self.roster.find_violation();
            debug_assert!(violation.is_none(), "roster invariant broken: {violation:?}");
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    /// Apply a player action.
    ///
    /// # Errors
    ///
    /// The action's [`ActionError`]; the simulation is unchanged except
    /// for the stale-selection reset described on
    /// [`shop::place_selected`].
    pub fn apply(&mut self, action: PlayerAction) -> std::result::Result<ActionOutcome, ActionError> {
        match action {
            PlayerAction::Purchase(unit_type) => self.purchase(unit_type),
            PlayerAction::SelectBench(index) => self.select_bench(index),
            PlayerAction::Place(cell) => self.place(cell),
            PlayerAction::CancelPlacement => self.cancel_placement(),
            PlayerAction::StartCombat => self.start_combat(),
            PlayerAction::RefreshShop => self.refresh_shop(),
        }
    }

    /// Pay the configured refresh cost.
    ///
    /// # Errors
    ///
    /// See [`shop::refresh_shop`].
    pub fn refresh_shop(&mut self) -> std::result::Result<ActionOutcome, ActionError> {
        let cost = self.rules.economy.refresh_cost;
        shop::refresh_shop(&mut self.state, cost)?;
        Ok(ActionOutcome::ShopRefreshed {
            cost,
            gold: self.state.gold,
        })
    }

    /// Buy a unit onto the bench.
    ///
    /// # Errors
    ///
    /// See [`shop::purchase`].
    pub fn purchase(&mut self, unit_type: UnitType) -> std::result::Result<ActionOutcome, ActionError> {
        let bought = shop::purchase(
            &mut self.state,
            &mut self.roster,
            &mut self.factory,
            &self.registry,
            unit_type,
        )?;
        Ok(ActionOutcome::Purchased {
            unit: bought.unit,
            cost: bought.cost,
            gold: self.state.gold,
        })
    }

    /// Select the bench unit at an ordinal.
    ///
    /// # Errors
    ///
    /// See [`shop::select_bench`].
    pub fn select_bench(&mut self, index: usize) -> std::result::Result<ActionOutcome, ActionError> {
        let unit = shop::select_bench(&self.state, &self.roster, &mut self.selection, index)?;
        Ok(ActionOutcome::Selected { unit, index })
    }

    /// Place the selected unit.
    ///
    /// # Errors
    ///
    /// See [`shop::place_selected`].
    pub fn place(&mut self, cell: GridCoord) -> std::result::Result<ActionOutcome, ActionError> {
        let unit = shop::place_selected(
            &self.state,
            &mut self.roster,
            &self.board,
            &mut self.selection,
            cell,
        )?;
        Ok(ActionOutcome::Placed { unit, cell })
    }

    /// Drop the selection.
    ///
    /// # Errors
    ///
    /// [`ActionError::NoSelection`] when nothing is selected.
    pub fn cancel_placement(&mut self) -> std::result::Result<ActionOutcome, ActionError> {
        let unit = shop::cancel_placement(&mut self.selection)?;
        Ok(ActionOutcome::Cancelled { unit })
    }

    /// Spawn the configured wave and enter combat.
    ///
    /// # Errors
    ///
    /// [`ActionError::WrongPhase`] outside prepare.
    pub fn start_combat(&mut self) -> std::result::Result<ActionOutcome, ActionError> {
        if self.state.phase != Phase::Prepare {
            return Err(ActionError::WrongPhase {
                expected: Phase::Prepare,
                actual: self.state.phase,
            });
        }
        let spawned = spawn_on_board(
            &mut self.roster,
            &mut self.factory,
            &self.registry,
            &self.board,
            &self.rules.ai_wave,
            Side::Ai,
        );
        self.state.enter(Phase::Combat);
        self.state.combat_timer = Fixed::ZERO;
        self.selection.clear();
        Ok(ActionOutcome::CombatStarted {
            wave: self.state.wave,
            spawned,
        })
    }

    /// HUD values.
    #[must_use]
    pub fn hud(&self) -> HudView {
        HudView::new(&self.state, &self.timing)
    }

    /// Bench contents and selection.
    #[must_use]
    pub fn bench_view(&self) -> BenchView {
        BenchView::new(&self.roster, &self.registry, &self.selection)
    }

    /// Placement ghost for the selected unit over a cell.
    #[must_use]
    pub fn ghost_preview(&self, cell: GridCoord) -> Option<GhostPreview> {
        ghost_preview(&self.roster, &self.board, &self.selection, cell)
    }

    /// Full read-only snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            tick: self.tick,
            hud: self.hud(),
            board: BoardView::from(&self.board),
            units: self.roster.as_slice().iter().map(UnitView::from).collect(),
            bench: self.bench_view(),
        }
    }

    /// Hash of everything that evolves during play.
    ///
    /// Used for replay verification and determinism checks. Two
    /// simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.state.hash(&mut hasher);
        self.roster.hash(&mut hasher);
        self.factory.hash(&mut hasher);
        self.selection.hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the simulation for replays.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize simulation: {e}")))
    }

    /// Restore a simulation from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| {
            GameError::InvalidState(format!("Failed to deserialize simulation: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::RoundOutcome;
    use crate::unit::UnitLocation;

    fn dt() -> Fixed {
        Fixed::from_num(0.1)
    }

    fn empty_rules() -> RulesConfig {
        RulesConfig {
            starting_roster: Vec::new(),
            ..RulesConfig::default()
        }
    }

    #[test]
    fn test_new_spawns_starting_roster() {
        let sim = Simulation::new(RulesConfig::default()).unwrap();
        assert_eq!(sim.tick_count(), 0);
        assert_eq!(sim.state().phase, Phase::Prepare);
        let cells: Vec<_> = sim.units().iter().map(Unit::cell).collect();
        assert_eq!(
            cells,
            vec![Some(GridCoord::new(3, 1)), Some(GridCoord::new(4, 1))]
        );
        assert!(sim.units().iter().all(|u| u.side == Side::Player));
    }

    #[test]
    fn test_new_rejects_invalid_rules() {
        let mut rules = RulesConfig::default();
        rules.units.clear();
        assert!(matches!(
            Simulation::new(rules),
            Err(GameError::MissingUnitDescriptor(_))
        ));
    }

    #[test]
    fn test_prepare_tick_changes_nothing_but_tick() {
        let mut sim = Simulation::new(RulesConfig::default()).unwrap();
        let before = sim.units().to_vec();
        let events = sim.tick(dt());
        assert_eq!(sim.tick_count(), 1);
        assert_eq!(events.tick, 1);
        assert!(events.combat.is_empty());
        assert_eq!(sim.units(), before.as_slice());
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut sim = Simulation::new(RulesConfig::default()).unwrap();
        sim.start_combat().unwrap();
        sim.tick(Fixed::from_num(5));
        assert_eq!(sim.state().combat_timer, Fixed::from_num(0.1));
        sim.tick(Fixed::from_num(-1));
        assert_eq!(sim.state().combat_timer, Fixed::from_num(0.1));
    }

    #[test]
    fn test_start_combat_spawns_wave_and_clears_selection() {
        let mut sim = Simulation::new(RulesConfig::default()).unwrap();
        sim.purchase(UnitType::MeleeTank).unwrap();
        sim.select_bench(0).unwrap();

        let outcome = sim.start_combat().unwrap();

        let ActionOutcome::CombatStarted { wave, spawned } = outcome else {
            panic!("unexpected outcome");
        };
        assert_eq!(wave, 1);
        assert_eq!(spawned.len(), 2);
        assert_eq!(sim.state().phase, Phase::Combat);
        assert_eq!(sim.state().combat_timer, Fixed::ZERO);
        assert!(!sim.selection().is_active());
        let ai_cells: Vec<_> = sim
            .units()
            .iter()
            .filter(|u| u.side == Side::Ai)
            .map(Unit::cell)
            .collect();
        assert_eq!(
            ai_cells,
            vec![Some(GridCoord::new(3, 6)), Some(GridCoord::new(4, 6))]
        );
        assert!(matches!(
            sim.start_combat(),
            Err(ActionError::WrongPhase { .. })
        ));
    }

    #[test]
    fn test_actions_rejected_during_combat() {
        let mut sim = Simulation::new(RulesConfig::default()).unwrap();
        sim.start_combat().unwrap();
        let hash = sim.state_hash();
        assert!(sim.apply(PlayerAction::Purchase(UnitType::MeleeTank)).is_err());
        assert!(sim.apply(PlayerAction::SelectBench(0)).is_err());
        assert!(sim.apply(PlayerAction::Place(GridCoord::new(0, 0))).is_err());
        assert_eq!(sim.state_hash(), hash);
    }

    #[test]
    fn test_empty_board_loses_round_immediately() {
        let mut sim = Simulation::new(empty_rules()).unwrap();
        sim.start_combat().unwrap();

        let events = sim.tick(dt());

        let report = events.round.expect("round resolved on first tick");
        assert_eq!(report.outcome, RoundOutcome::AiWin);
        assert_eq!(report.damage_taken, 2 * 5 + 1);
        assert_eq!(sim.state().phase, Phase::Prepare);
        assert_eq!(sim.state().player_hp, 100 - 11);
        assert_eq!(sim.state().gold, 15);
        assert_eq!(sim.state().wave, 2);
        assert!(sim.units().is_empty());
        assert_eq!(
            events.phase_changes,
            vec![
                PhaseChange {
                    from: Phase::Combat,
                    to: Phase::PostCombat
                },
                PhaseChange {
                    from: Phase::PostCombat,
                    to: Phase::Prepare
                },
            ]
        );
    }

    #[test]
    fn test_full_round_resolves() {
        let mut sim = Simulation::new(RulesConfig::default()).unwrap();
        sim.start_combat().unwrap();
        let mut report = None;
        for _ in 0..200 {
            let events = sim.tick(dt());
            if let Some(r) = events.round {
                report = Some(r);
                break;
            }
        }
        let report = report.expect("round ends within combat duration");
        assert_eq!(sim.state().phase, Phase::Prepare);
        assert_eq!(sim.state().wave, 2);
        assert!(sim.units().iter().all(|u| u.side == Side::Player));
        assert!(sim
            .units()
            .iter()
            .all(|u| u.alive && u.current_hp == u.stats.max_hp));
        assert_eq!(report.wave, 1);
    }

    #[test]
    fn test_game_over_on_next_tick() {
        let mut sim = Simulation::new(empty_rules()).unwrap();
        sim.state.player_hp = 11;
        sim.start_combat().unwrap();

        let events = sim.tick(dt());
        assert_eq!(events.round.map(|r| r.player_hp), Some(0));
        assert_eq!(sim.state().phase, Phase::Prepare);

        let events = sim.tick(dt());
        assert!(events.entered_game_over());
        assert!(sim.is_game_over());
        assert!(matches!(
            sim.start_combat(),
            Err(ActionError::WrongPhase { .. })
        ));

        sim.tick(dt());
        assert!(sim.is_game_over());
    }

    #[test]
    fn test_restart_resets_game() {
        let mut sim = Simulation::new(RulesConfig::default()).unwrap();
        sim.purchase(UnitType::MeleeTank).unwrap();
        sim.tick(dt());
        sim.restart().unwrap();
        assert_eq!(sim.tick_count(), 0);
        assert_eq!(sim.state().gold, 10);
        assert_eq!(sim.units().len(), 2);
    }

    #[test]
    fn test_place_flow_through_apply() {
        let mut sim = Simulation::new(RulesConfig::default()).unwrap();
        let Ok(ActionOutcome::Purchased { unit, gold, .. }) =
            sim.apply(PlayerAction::Purchase(UnitType::RangedArcher))
        else {
            panic!("purchase failed");
        };
        assert_eq!(gold, 7);
        assert_eq!(
            sim.apply(PlayerAction::SelectBench(0)),
            Ok(ActionOutcome::Selected { unit, index: 0 })
        );
        assert_eq!(
            sim.apply(PlayerAction::Place(GridCoord::new(3, 1))),
            Err(ActionError::TileOccupied(GridCoord::new(3, 1)))
        );
        assert_eq!(
            sim.apply(PlayerAction::Place(GridCoord::new(0, 3))),
            Ok(ActionOutcome::Placed {
                unit,
                cell: GridCoord::new(0, 3)
            })
        );
        assert_eq!(
            sim.roster().by_id(unit).map(|u| u.location),
            Some(UnitLocation::Board(GridCoord::new(0, 3)))
        );
        assert_eq!(
            sim.apply(PlayerAction::CancelPlacement),
            Err(ActionError::NoSelection)
        );
    }

    #[test]
    fn test_state_hash_tracks_changes() {
        let mut a = Simulation::new(RulesConfig::default()).unwrap();
        let b = Simulation::new(RulesConfig::default()).unwrap();
        assert_eq!(a.state_hash(), b.state_hash());
        a.purchase(UnitType::MeleeTank).unwrap();
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut sim = Simulation::new(RulesConfig::default()).unwrap();
        sim.purchase(UnitType::RangedArcher).unwrap();
        sim.start_combat().unwrap();
        for _ in 0..20 {
            sim.tick(dt());
        }
        let bytes = sim.serialize().unwrap();
        let restored = Simulation::deserialize(&bytes).unwrap();
        assert_eq!(restored, sim);
        assert_eq!(restored.state_hash(), sim.state_hash());
    }

    #[test]
    fn test_snapshot_contents() {
        let mut sim = Simulation::new(RulesConfig::default()).unwrap();
        sim.purchase(UnitType::MeleeTank).unwrap();
        sim.select_bench(0).unwrap();
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.units.len(), 3);
        assert_eq!(snapshot.hud.phase_name, "Prepare Phase");
        assert_eq!(snapshot.board.width, 8);
        assert_eq!(snapshot.bench.slots.len(), 1);
        assert_eq!(snapshot.bench.selected, Some(0));
        assert!(sim.ghost_preview(GridCoord::new(0, 0)).is_some_and(|g| g.valid));
    }

    #[test]
    fn test_refresh_shop_spends_configured_gold() {
        let mut rules = RulesConfig::default();
        rules.economy.starting_gold = 3;
        rules.economy.refresh_cost = 2;
        let mut sim = Simulation::new(rules).unwrap();

        assert_eq!(
            sim.apply(PlayerAction::RefreshShop),
            Ok(ActionOutcome::ShopRefreshed { cost: 2, gold: 1 })
        );
        let hash = sim.state_hash();
        assert!(matches!(
            sim.apply(PlayerAction::RefreshShop),
            Err(ActionError::InsufficientGold { required: 2, available: 1 })
        ));
        assert_eq!(sim.state_hash(), hash);
        assert_eq!(sim.roster().bench_count(), 0);
    }
}

//! End-to-end gameplay scenarios.
//!
//! Each test drives a full [`Simulation`] (or the combat pass directly)
//! through one documented situation.

use battler_core::board::GridCoord;
use battler_core::combat::{run_combat_pass, CombatContext, CombatEvent};
use battler_core::config::{BoardRules, RulesConfig, SpawnRule};
use battler_core::error::ActionError;
use battler_core::math::{Fixed, Vec3Fixed};
use battler_core::roster::Roster;
use battler_core::round::{Phase, RoundOutcome};
use battler_core::simulation::{PlayerAction, Simulation};
use battler_core::unit::{CombatState, Side, UnitFactory, UnitHandle, UnitLocation, UnitRegistry, UnitType};
use battler_test_utils::fixtures::{
    duel, empty_rules, fixed, fixed_f, rules_with, run_until_round_end, simulation_with, tick_dt,
};

#[test]
fn grid_and_world_coordinates_convert_both_ways() {
    let sim = simulation_with(RulesConfig::default());
    let board = sim.board();
    assert_eq!(board.width(), 8);
    assert_eq!(board.height(), 8);
    assert_eq!(board.tile_size(), Fixed::ONE);

    let world = board.grid_to_world(GridCoord::new(3, 2));
    assert_eq!(world, Vec3Fixed::new(fixed_f(3.5), Fixed::ZERO, fixed_f(2.5)));
    assert_eq!(board.world_to_grid(world), Some(GridCoord::new(3, 2)));
}

#[test]
fn tank_in_reach_attacks_without_moving() {
    let rules = RulesConfig {
        board: BoardRules {
            tile_size: 0.5,
            ..BoardRules::default()
        },
        ..rules_with(
            &[SpawnRule::new(UnitType::MeleeTank, 3, 3)],
            &[SpawnRule::new(UnitType::MeleeTank, 3, 4)],
        )
    };
    let mut sim = simulation_with(rules);
    sim.start_combat().unwrap();
    let player = sim.units()[0].clone();
    let enemy = sim.units()[1].clone();
    assert_eq!(
        player.world_pos.distance_squared(enemy.world_pos),
        fixed_f(0.25)
    );

    let events = sim.tick(tick_dt());

    let tank = &sim.units()[0];
    assert_eq!(tank.state, CombatState::Attacking);
    assert_eq!(tank.world_pos, player.world_pos);
    assert!(!events
        .combat
        .iter()
        .any(|e| matches!(e, CombatEvent::Moved { .. })));
    assert!(events.combat.contains(&CombatEvent::Attacked {
        attacker: player.id,
        target: enemy.id,
        damage: fixed(10),
        remaining_hp: fixed(90),
    }));
}

#[test]
fn lost_round_costs_hp_and_clears_the_dead() {
    let mut sim = duel(
        (UnitType::MeleeTank, GridCoord::new(3, 3)),
        (UnitType::RangedArcher, GridCoord::new(3, 4)),
    );
    let ids: Vec<_> = sim.units().iter().map(|u| u.id).collect();

    let report = run_until_round_end(&mut sim, tick_dt(), 400).expect("round ends");

    assert_eq!(report.outcome, RoundOutcome::AiWin);
    assert_eq!(report.ai_survivors, 1);
    assert_eq!(report.damage_taken, 5 + 1);
    assert_eq!(report.gold_earned, 5);
    assert_eq!(report.removed_units, ids);
    assert_eq!(sim.state().player_hp, 94);
    assert_eq!(sim.state().gold, 15);
    assert_eq!(sim.state().wave, 2);
    assert_eq!(sim.state().phase, Phase::Prepare);
    assert!(sim.units().is_empty());
}

#[test]
fn won_round_pays_bonus_and_restores_survivors() {
    let mut sim = duel(
        (UnitType::RangedArcher, GridCoord::new(3, 3)),
        (UnitType::MeleeTank, GridCoord::new(3, 4)),
    );
    let archer = sim.units()[0].id;

    let report = run_until_round_end(&mut sim, tick_dt(), 400).expect("round ends");

    assert_eq!(report.outcome, RoundOutcome::PlayerWin);
    assert_eq!(report.damage_taken, 0);
    assert_eq!(sim.state().gold, 10 + 5 + 3);
    assert_eq!(sim.state().player_hp, 100);
    let survivor = &sim.units()[0];
    assert_eq!(survivor.id, archer);
    assert_eq!(survivor.current_hp, survivor.stats.max_hp);
    assert_eq!(survivor.state, CombatState::Idle);
    assert_eq!(survivor.location, UnitLocation::Board(GridCoord::new(3, 3)));
}

#[test]
fn full_bench_refuses_purchase_without_charging() {
    let mut rules = empty_rules();
    rules.economy.starting_gold = 100;
    let mut sim = simulation_with(rules);
    for _ in 0..8 {
        sim.apply(PlayerAction::Purchase(UnitType::MeleeTank)).unwrap();
    }
    let gold = sim.state().gold;
    let count = sim.units().len();

    assert_eq!(
        sim.apply(PlayerAction::Purchase(UnitType::RangedArcher)),
        Err(ActionError::BenchFull { capacity: 8 })
    );
    assert_eq!(sim.state().gold, gold);
    assert_eq!(sim.units().len(), count);
}

#[test]
fn archer_drops_target_that_leaves_aggro_range() {
    let rules = RulesConfig::default();
    let board = rules.board();
    let registry = UnitRegistry::from_descriptors(&rules.units, board.tile_size()).unwrap();
    let mut factory = UnitFactory::new();
    let mut roster = Roster::new(10, 4);
    for (unit_type, side, cell) in [
        (UnitType::RangedArcher, Side::Player, GridCoord::new(0, 0)),
        (UnitType::MeleeTank, Side::Ai, GridCoord::new(0, 7)),
        (UnitType::MeleeTank, Side::Ai, GridCoord::new(2, 2)),
    ] {
        let mut unit = factory.create(registry.get(unit_type), side);
        unit.set_cell(cell, &board);
        roster.push(unit).unwrap();
    }
    let (archer, fled, near) = {
        let units = roster.as_slice();
        (units[0].id, units[1].id, units[2].id)
    };
    roster.as_mut_slice()[0].target = Some(UnitHandle::new(1, fled));

    let ctx = CombatContext {
        board: &board,
        phase: Phase::Combat,
        dt: tick_dt(),
        blocked_move_retry: fixed_f(0.25),
        attack_visual_duration: fixed_f(0.15),
    };
    let mut events = Vec::new();
    run_combat_pass(roster.as_mut_slice(), &ctx, &mut events);

    assert_eq!(
        events[0],
        CombatEvent::TargetLost {
            unit: archer,
            target: fled
        }
    );
    assert_eq!(
        events[1],
        CombatEvent::TargetAcquired {
            unit: archer,
            target: near
        }
    );
    assert_eq!(roster.by_id(archer).and_then(|u| u.target).map(|t| t.id), Some(near));
}

#[test]
fn hp_reaching_zero_ends_game_next_tick() {
    let mut rules = empty_rules();
    rules.economy.starting_hp = 11;
    let mut sim = simulation_with(rules);
    sim.start_combat().unwrap();

    let events = sim.tick(tick_dt());
    assert_eq!(events.round.map(|r| r.player_hp), Some(0));
    assert_eq!(sim.state().phase, Phase::Prepare);

    let events = sim.tick(tick_dt());
    assert!(events.entered_game_over());
    assert!(sim.is_game_over());
    assert_eq!(sim.hud().phase_name, "Game Over");

    assert!(sim.apply(PlayerAction::StartCombat).is_err());
    assert!(sim.apply(PlayerAction::Purchase(UnitType::MeleeTank)).is_err());
    sim.tick(tick_dt());
    assert!(sim.is_game_over());

    sim.restart().unwrap();
    assert_eq!(sim.state().phase, Phase::Prepare);
    assert_eq!(sim.state().player_hp, 11);
}

#[test]
fn timeout_with_both_sides_alive_is_contested() {
    let mut rules = rules_with(
        &[SpawnRule::new(UnitType::MeleeTank, 0, 0)],
        &[SpawnRule::new(UnitType::MeleeTank, 7, 7)],
    );
    rules.timing.combat_duration = 1.0;
    let mut sim = simulation_with(rules);
    sim.start_combat().unwrap();

    let report = run_until_round_end(&mut sim, fixed_f(0.1), 20).expect("timer expires");

    assert_eq!(report.outcome, RoundOutcome::Contested);
    assert_eq!(report.damage_taken, 5 + 1);
    assert_eq!(sim.units().len(), 1);
}

#[test]
fn placed_units_fight_next_round() {
    let mut sim = simulation_with(empty_rules());
    sim.apply(PlayerAction::Purchase(UnitType::RangedArcher)).unwrap();
    sim.apply(PlayerAction::SelectBench(0)).unwrap();
    assert_eq!(
        sim.apply(PlayerAction::Place(GridCoord::new(3, 5))),
        Err(ActionError::NotPlayerSide(GridCoord::new(3, 5)))
    );
    assert!(sim.selection().is_active());
    sim.apply(PlayerAction::Place(GridCoord::new(3, 3))).unwrap();
    sim.apply(PlayerAction::StartCombat).unwrap();

    let events = sim.tick(tick_dt());
    assert!(events
        .combat
        .iter()
        .any(|e| matches!(e, CombatEvent::TargetAcquired { .. })));
}

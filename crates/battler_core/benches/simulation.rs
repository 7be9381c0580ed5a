//! Simulation benchmarks for battler_core.
//!
//! Run with: `cargo bench -p battler_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use battler_core::config::{RulesConfig, SpawnRule};
use battler_core::math::Fixed;
use battler_core::simulation::Simulation;
use battler_core::unit::UnitType;

fn crowded_rules() -> RulesConfig {
    let mut rules = RulesConfig::default();
    rules.starting_roster = (0..8)
        .flat_map(|x| {
            [
                SpawnRule::new(UnitType::MeleeTank, x, 2),
                SpawnRule::new(UnitType::RangedArcher, x, 1),
            ]
        })
        .collect();
    rules.ai_wave = (0..8)
        .flat_map(|x| {
            [
                SpawnRule::new(UnitType::MeleeTank, x, 5),
                SpawnRule::new(UnitType::RangedArcher, x, 6),
            ]
        })
        .collect();
    rules
}

fn play_round(mut sim: Simulation, dt: Fixed) -> u64 {
    sim.start_combat().ok();
    for _ in 0..1000 {
        if sim.tick(dt).round.is_some() {
            break;
        }
    }
    sim.state_hash()
}

/// Full combat rounds from the start of combat to resolution.
pub fn simulation_benchmark(c: &mut Criterion) {
    let dt = Fixed::from_num(0.05);

    let default_sim = Simulation::new(RulesConfig::default()).expect("default rules");
    c.bench_function("round_default_wave", |b| {
        b.iter_batched(
            || default_sim.clone(),
            |sim| black_box(play_round(sim, dt)),
            BatchSize::SmallInput,
        );
    });

    let crowded_sim = Simulation::new(crowded_rules()).expect("crowded rules");
    c.bench_function("round_32_units", |b| {
        b.iter_batched(
            || crowded_sim.clone(),
            |sim| black_box(play_round(sim, dt)),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("state_hash_32_units", |b| {
        let mut sim = crowded_sim.clone();
        sim.start_combat().ok();
        b.iter(|| black_box(sim.state_hash()));
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);

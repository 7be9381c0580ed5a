//! Harnesses that play the same game several times and compare hashes.
//!
//! Replays only reproduce a game if identical inputs give identical
//! state. The things that would break that:
//!
//! - **Floats**: combat math runs on [`battler_core::math::Fixed`].
//! - **Hash map order**: units live in a `Vec` and update in roster order.
//! - **Update order**: the reactive retarget scan sees targets chosen
//!   earlier in the same tick, so order must never vary.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use battler_core::math::Fixed;
use battler_core::simulation::Simulation;

/// Hashes collected by a determinism run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Every run ended on the same hash.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Ticks per run.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Distinct hashes seen, sorted. One entry when deterministic.
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Fail the test with every hash listed unless all runs agreed.
    ///
    /// # Panics
    ///
    /// When two runs ended on different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "runs diverged: {} runs of {} ticks gave {} distinct hashes {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Build `runs` fresh states with `setup`, step each `ticks` times and
/// compare their `hash`es.
///
/// # Example
///
/// ```
/// use battler_core::config::RulesConfig;
/// use battler_core::math::Fixed;
/// use battler_core::simulation::Simulation;
/// use battler_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     3,
///     100,
///     || {
///         let mut sim = Simulation::new(RulesConfig::default()).unwrap();
///         sim.start_combat().unwrap();
///         sim
///     },
///     |sim| {
///         sim.tick(Fixed::from_num(0.05));
///     },
///     Simulation::state_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a [`Simulation`] twice with a constant tick length and compare
/// final hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, dt: Fixed, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick(dt);
        },
        Simulation::state_hash,
    )
    .is_deterministic
}

/// Run N simulations on separate threads and collect final hashes.
///
/// Catches state that depends on thread identity or memory layout.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, dt: Fixed, num_sims: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick(dt);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Step two copies of the same game in lockstep and report the first tick
/// whose hashes differ, or `None` if they never do. Tick 0 is the state
/// straight out of `setup_fn`.
pub fn find_first_divergence<F>(setup_fn: F, dt: Fixed, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let (mut left, mut right) = (setup_fn(), setup_fn());
    (0..=num_ticks).find(|&tick| {
        if tick > 0 {
            left.tick(dt);
            right.tick(dt);
        }
        left.state_hash() != right.state_hash()
    })
}

/// Verify that a serialization round-trip preserves state and future
/// behaviour: the restored copy must stay in lockstep with the original.
pub fn verify_serialization_determinism<F>(setup_fn: F, dt: Fixed, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();

    for _ in 0..num_ticks {
        sim.tick(dt);
    }

    let Ok(bytes) = sim.serialize() else {
        return false;
    };
    let Ok(mut restored) = Simulation::deserialize(&bytes) else {
        return false;
    };

    for _ in 0..num_ticks {
        if sim.state_hash() != restored.state_hash() {
            return false;
        }
        sim.tick(dt);
        restored.tick(dt);
    }

    sim.state_hash() == restored.state_hash()
}

/// `DefaultHasher` digest of any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

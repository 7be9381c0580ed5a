//! # Battler Core
//!
//! Deterministic simulation core for a grid auto-battler.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No stdin/stdout
//! - No randomness
//! - No floating-point math in the simulation (uses fixed-point)
//!
//! Front ends read [`view`] snapshots and feed player actions back in
//! through [`simulation::Simulation::apply`].
//!
//! ## Crate Structure
//!
//! - [`board`] - Grid geometry and coordinate conversion
//! - [`unit`] - Unit types, stats and per-unit state
//! - [`roster`] - Unit storage and occupancy queries
//! - [`combat`] - Per-unit combat state machine
//! - [`round`] - Phases, round resolution and spawning
//! - [`shop`] - Purchasing and bench placement
//! - [`config`] - Rules loaded from RON
//! - [`simulation`] - The tick loop and action entry point
//! - [`view`] - Read-only snapshots
//! - [`replay`] - Recording and verifying games
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod board;
pub mod combat;
pub mod config;
pub mod error;
pub mod math;
pub mod replay;
pub mod roster;
pub mod round;
pub mod shop;
pub mod simulation;
pub mod unit;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::board::{Board, GridCoord};
    pub use crate::combat::CombatEvent;
    pub use crate::config::{RulesConfig, SpawnRule, UnitDescriptor};
    pub use crate::error::{ActionError, GameError, Result};
    pub use crate::math::{Fixed, Vec3Fixed};
    pub use crate::replay::{Replay, ReplayEntry, ReplayPlayer};
    pub use crate::roster::Roster;
    pub use crate::round::{GameState, Phase, PhaseChange, RoundOutcome, RoundReport};
    pub use crate::simulation::{ActionOutcome, PlayerAction, Simulation, TickEvents};
    pub use crate::unit::{CombatState, Side, Unit, UnitId, UnitLocation, UnitType};
    pub use crate::view::{BenchView, GhostPreview, HudView, SimulationSnapshot, UnitView};
}

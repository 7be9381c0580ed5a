//! Error types for the battler simulation.
//!
//! Two families live here. [`GameError`] covers setup and persistence
//! failures (bad rules, unreadable replays). [`ActionError`] is the
//! ordinary rejection of a player action; the simulation is left
//! untouched whenever one is returned.

use thiserror::Error;

use crate::board::GridCoord;
use crate::round::Phase;
use crate::unit::UnitType;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for simulation setup and persistence.
#[derive(Debug, Error)]
pub enum GameError {
    /// A rules value is out of its legal range.
    #[error("Invalid rules configuration: {0}")]
    InvalidConfig(String),

    /// The unit catalog has no descriptor for a unit type.
    #[error("No unit descriptor registered for {0:?}")]
    MissingUnitDescriptor(UnitType),

    /// Rules text could not be parsed.
    #[error("Failed to parse rules '{path}': {message}")]
    ConfigParse {
        /// Source of the rules text (file path or `<inline>`).
        path: String,
        /// Parser message.
        message: String,
    },

    /// Invalid simulation state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// A replay did not reproduce its recorded result.
    #[error("Replay diverged at tick {tick}: expected hash {expected}, got {actual}")]
    ReplayMismatch {
        /// Tick at which the comparison was made.
        tick: u64,
        /// Hash stored in the replay.
        expected: u64,
        /// Hash produced by playback.
        actual: u64,
    },
}

/// Why a player action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The action is not allowed in the current phase.
    #[error("Action requires {expected:?} phase, current phase is {actual:?}")]
    WrongPhase {
        /// Phase the action needs.
        expected: Phase,
        /// Phase the game is in.
        actual: Phase,
    },

    /// Bench already holds its maximum number of units.
    #[error("Bench is full ({capacity} units)")]
    BenchFull {
        /// Bench capacity.
        capacity: usize,
    },

    /// The roster reached its total unit cap.
    #[error("Unit cap reached ({capacity} units)")]
    UnitCapReached {
        /// Roster capacity.
        capacity: usize,
    },

    /// Not enough gold for a purchase.
    #[error("Insufficient gold: need {required}, have {available}")]
    InsufficientGold {
        /// Price of the unit.
        required: i32,
        /// Gold the player holds.
        available: i32,
    },

    /// No bench unit at the given ordinal.
    #[error("No bench unit at index {index} (bench holds {len})")]
    InvalidBenchIndex {
        /// Requested ordinal.
        index: usize,
        /// Current bench size.
        len: usize,
    },

    /// Placement attempted without a selected bench unit.
    #[error("No bench unit selected")]
    NoSelection,

    /// The selected unit is no longer on the bench; the selection was reset.
    #[error("Selected unit is no longer on the bench")]
    SelectionLost,

    /// Cell lies outside the board.
    #[error("Cell {0} is outside the board")]
    OutOfBounds(GridCoord),

    /// Cell lies on the enemy half of the board.
    #[error("Cell {0} is not on the player side")]
    NotPlayerSide(GridCoord),

    /// Cell already holds a unit.
    #[error("Cell {0} is occupied")]
    TileOccupied(GridCoord),
}

//! JSON protocol for headless game communication.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Game state updates and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller sends commands as JSON lines
//! 3. Player actions are answered with `ack` or `rejected`
//! 4. Ticks report resolved rounds and the start of game over
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"buy","unit_type":"ranged_archer"}
//! <- {"type":"ack","cmd":"buy","outcome":{"purchased":{"unit":3,"cost":3,"gold":7}}}
//! -> {"cmd":"select","index":0}
//! <- {"type":"ack","cmd":"select","outcome":{"selected":{"unit":3,"index":0}}}
//! -> {"cmd":"place","x":2,"y":5}
//! <- {"type":"rejected","cmd":"place","reason":"Cell (2, 5) is not on the player side"}
//! -> {"cmd":"start_combat"}
//! <- {"type":"ack","cmd":"start_combat","outcome":{"combat_started":{...}}}
//! -> {"cmd":"tick","count":400}
//! <- {"type":"round","tick":231,"report":{...}}
//! <- {"type":"ack","cmd":"tick","outcome":null}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use battler_core::board::GridCoord;
use battler_core::round::RoundReport;
use battler_core::simulation::{ActionOutcome, PlayerAction};
use battler_core::unit::UnitType;
use battler_core::view::{BenchView, GhostPreview, SimulationSnapshot};

/// Protocol version reported in the ready message.
pub const PROTOCOL_VERSION: &str = "1.0";

/// A line that could not be understood.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Not valid JSON, or not a known command.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the simulation by `count` ticks (default 1).
    Tick {
        /// Number of ticks.
        #[serde(default = "default_tick_count")]
        count: u32,
        /// Seconds per tick; the runner's tick length when absent.
        #[serde(default)]
        dt: Option<f64>,
    },

    /// Full snapshot without advancing time.
    Query,

    /// Bench contents only.
    Bench,

    /// Buy a unit onto the bench.
    Buy {
        /// Unit type, e.g. `"melee_tank"`.
        unit_type: UnitType,
    },

    /// Select a bench unit by ordinal.
    Select {
        /// Bench ordinal.
        index: usize,
    },

    /// Place the selected unit on a cell.
    Place {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },

    /// Place the selected unit at a world position on the board plane.
    PlaceWorld {
        /// World X.
        x: f64,
        /// World Z.
        z: f64,
    },

    /// Drop the selection.
    Cancel,

    /// Spawn the wave and start fighting.
    StartCombat,

    /// Pay to refresh the shop.
    Refresh,

    /// Placement ghost for a cell.
    Preview {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },

    /// Current state hash (for determinism verification).
    Hash,

    /// Start a new game with the same rules.
    Restart,

    /// Quit the runner.
    Quit,
}

const fn default_tick_count() -> u32 {
    1
}

impl Command {
    /// Parse from a JSON line.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Parse`] when the line is not a known command.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Command name for acknowledgments.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Query => "query",
            Self::Bench => "bench",
            Self::Buy { .. } => "buy",
            Self::Select { .. } => "select",
            Self::Place { .. } => "place",
            Self::PlaceWorld { .. } => "place_world",
            Self::Cancel => "cancel",
            Self::StartCombat => "start_combat",
            Self::Refresh => "refresh",
            Self::Preview { .. } => "preview",
            Self::Hash => "hash",
            Self::Restart => "restart",
            Self::Quit => "quit",
        }
    }

    /// The player action this command maps to, if it is one.
    ///
    /// `place_world` needs the board to resolve and is handled by the
    /// runner.
    pub fn as_action(&self) -> Option<PlayerAction> {
        match *self {
            Self::Buy { unit_type } => Some(PlayerAction::Purchase(unit_type)),
            Self::Select { index } => Some(PlayerAction::SelectBench(index)),
            Self::Place { x, y } => Some(PlayerAction::Place(GridCoord::new(x, y))),
            Self::Cancel => Some(PlayerAction::CancelPlacement),
            Self::StartCombat => Some(PlayerAction::StartCombat),
            Self::Refresh => Some(PlayerAction::RefreshShop),
            _ => None,
        }
    }
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        /// Protocol version.
        version: String,
        /// Current tick.
        tick: u64,
    },

    /// A command succeeded.
    Ack {
        /// Command name.
        cmd: String,
        /// Result of a player action.
        outcome: Option<ActionOutcome>,
    },

    /// A player action was refused; the game is unchanged.
    Rejected {
        /// Command name.
        cmd: String,
        /// Why it was refused.
        reason: String,
    },

    /// A line could not be processed.
    Error {
        /// What went wrong.
        message: String,
        /// Command name, when the line parsed.
        cmd: Option<String>,
    },

    /// Full snapshot.
    State {
        /// Snapshot of the game.
        snapshot: SimulationSnapshot,
        /// State hash.
        hash: u64,
    },

    /// Bench contents.
    Bench {
        /// Bench view.
        bench: BenchView,
    },

    /// Placement ghost, absent with no selection or off the board.
    Preview {
        /// Ghost, if any.
        ghost: Option<GhostPreview>,
    },

    /// A round was resolved.
    Round {
        /// Tick on which it resolved.
        tick: u64,
        /// Round summary.
        report: RoundReport,
    },

    /// The game has ended.
    GameOver {
        /// Tick on which it ended.
        tick: u64,
        /// Wave reached.
        wave: i32,
        /// Gold held.
        gold: i32,
    },

    /// State hash for determinism verification.
    StateHash {
        /// Current tick.
        tick: u64,
        /// Hash.
        hash: u64,
    },

    /// Goodbye message before shutdown.
    Bye,
}

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str, outcome: Option<ActionOutcome>) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
            outcome,
        }
    }

    /// Create a rejection.
    pub fn rejected(cmd: &str, reason: impl ToString) -> Self {
        Self::Rejected {
            cmd: cmd.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

//! Headless Grid Battler runner.
//!
//! Plays the game without graphics. It can be controlled by JSON commands
//! on stdin with responses on stdout, or it can play a RON scenario
//! script end to end. This enables:
//!
//! - **AI control**: an external agent buys, places and fights
//! - **CI verification**: scripted games with determinism checks
//! - **Replay verification**: check that replays reproduce the final hash
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (tick, buy, place, etc.)
//! - **stdout**: Responses and state (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See the [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":60}' | cargo run -p battler_headless
//!
//! # Play a scenario
//! cargo run -p battler_headless -- play --scenario scenarios/archer_line.ron
//!
//! # Verify a replay
//! cargo run -p battler_headless -- replay --file game.replay --verify
//! ```

pub mod game_runner;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use game_runner::{play_scenario, verify_scenario, GameReport, RecordingGame};
pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
pub use scenario::{Scenario, ScenarioError};

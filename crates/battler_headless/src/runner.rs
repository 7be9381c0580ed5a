//! Headless game runner implementation.
//!
//! Reads [`Command`]s one JSON line at a time and writes [`Response`]s the
//! same way. The runner is generic over its IO so tests can drive it with
//! in-memory buffers.

use std::io::{self, BufRead, Write};

use tracing::{debug, info, warn};

use battler_core::board::GridCoord;
use battler_core::config::RulesConfig;
use battler_core::math::{Fixed, Vec3Fixed};
use battler_core::replay::Replay;
use battler_core::simulation::{PlayerAction, Simulation};

use crate::game_runner::RecordingGame;
use crate::protocol::{Command, Response};
use crate::scenario::ScenarioError;

/// Headless runner configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Ticks per simulated second when a tick command gives no `dt`.
    pub tick_rate: u32,
    /// Output state after every tick command (vs only on query).
    pub auto_state_output: bool,
    /// Record a replay of the session.
    pub record: bool,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            auto_state_output: false,
            record: false,
        }
    }
}

/// Headless runner for externally controlled gameplay.
#[derive(Debug)]
pub struct HeadlessRunner {
    config: HeadlessConfig,
    game: RecordingGame,
    dt: Fixed,
    finished: bool,
}

impl HeadlessRunner {
    /// Create a runner for a new game under `rules`.
    ///
    /// # Errors
    ///
    /// Invalid rules, a zero tick rate, or a replay that cannot start.
    pub fn new(rules: RulesConfig, config: HeadlessConfig) -> Result<Self, ScenarioError> {
        if config.tick_rate == 0 {
            return Err(ScenarioError::Invalid("tick_rate must be positive".into()));
        }
        let dt = Fixed::ONE / Fixed::from_num(config.tick_rate);
        let game = RecordingGame::new(Simulation::new(rules)?, "interactive", config.record)?;
        Ok(Self {
            config,
            game,
            dt,
            finished: false,
        })
    }

    /// The simulation being driven.
    pub const fn simulation(&self) -> &Simulation {
        self.game.simulation()
    }

    /// Whether a quit command was received.
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stop and hand back the session replay, if recording.
    pub fn into_replay(self) -> Option<Replay> {
        self.game.into_replay()
    }

    /// Run the command loop until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Reading input or writing output failed.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        info!("Starting interactive session");
        output.write_all(Response::ready(self.simulation().tick_count()).to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            for response in self.handle_line(&line) {
                output.write_all(response.to_json_line().as_bytes())?;
            }
            output.flush()?;
            if self.finished {
                return Ok(());
            }
        }

        output.write_all(Response::Bye.to_json_line().as_bytes())?;
        output.flush()
    }

    /// Handle one input line. Blank lines produce nothing.
    pub fn handle_line(&mut self, line: &str) -> Vec<Response> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        match Command::from_json(line) {
            Ok(cmd) => self.handle(cmd),
            Err(e) => {
                warn!(error = %e, "Unreadable command");
                vec![Response::error(e.to_string(), None)]
            }
        }
    }

    /// Handle one command.
    pub fn handle(&mut self, cmd: Command) -> Vec<Response> {
        let name = cmd.name();
        debug!(cmd = name, "Command received");

        if let Some(action) = cmd.as_action() {
            return vec![self.act(name, action)];
        }

        match cmd {
            Command::Tick { count, dt } => self.tick(count, dt),
            Command::Query => vec![self.state()],
            Command::Bench => vec![Response::Bench {
                bench: self.simulation().bench_view(),
            }],
            Command::Preview { x, y } => vec![Response::Preview {
                ghost: self.simulation().ghost_preview(GridCoord::new(x, y)),
            }],
            Command::PlaceWorld { x, z } => vec![self.place_world(x, z)],
            Command::Hash => vec![Response::StateHash {
                tick: self.simulation().tick_count(),
                hash: self.simulation().state_hash(),
            }],
            Command::Restart => match self.game.restart() {
                Ok(()) => {
                    info!("Game restarted");
                    vec![Response::ack(name, None)]
                }
                Err(e) => vec![Response::error(e.to_string(), Some(name))],
            },
            Command::Quit => {
                self.finished = true;
                vec![Response::Bye]
            }
            Command::Buy { .. }
            | Command::Select { .. }
            | Command::Place { .. }
            | Command::Cancel
            | Command::StartCombat
            | Command::Refresh => vec![Response::error("unhandled action", Some(name))],
        }
    }

    fn act(&mut self, name: &str, action: PlayerAction) -> Response {
        match self.game.act(action) {
            Ok(outcome) => Response::ack(name, Some(outcome)),
            Err(reason) => {
                warn!(cmd = name, %reason, "Action rejected");
                Response::rejected(name, reason)
            }
        }
    }

    fn place_world(&mut self, x: f64, z: f64) -> Response {
        let position = Fixed::checked_from_num(x)
            .zip(Fixed::checked_from_num(z))
            .map(|(x, z)| Vec3Fixed::new(x, Fixed::ZERO, z));
        match position.and_then(|p| self.simulation().board().world_to_grid(p)) {
            Some(cell) => self.act("place_world", PlayerAction::Place(cell)),
            None => {
                warn!(x, z, "World position outside the board");
                Response::rejected("place_world", format!("World position ({x}, {z}) is outside the board"))
            }
        }
    }

    fn tick(&mut self, count: u32, dt: Option<f64>) -> Vec<Response> {
        let dt = match dt {
            None => self.dt,
            Some(seconds) => match Fixed::checked_from_num(seconds) {
                Some(dt) => dt,
                None => return vec![Response::error(format!("Invalid dt {seconds}"), Some("tick"))],
            },
        };

        let mut responses = Vec::new();
        for _ in 0..count {
            let events = self.game.tick(dt);
            if let Some(report) = events.round.clone() {
                responses.push(Response::Round {
                    tick: events.tick,
                    report,
                });
            }
            if events.entered_game_over() {
                let state = self.simulation().state();
                info!(wave = state.wave, gold = state.gold, "Game over");
                responses.push(Response::GameOver {
                    tick: events.tick,
                    wave: state.wave,
                    gold: state.gold,
                });
            }
        }
        if self.config.auto_state_output {
            responses.push(self.state());
        }
        responses.push(Response::ack("tick", None));
        responses
    }

    fn state(&self) -> Response {
        let sim = self.simulation();
        Response::State {
            snapshot: sim.snapshot(),
            hash: sim.state_hash(),
        }
    }
}

//! Headless Grid Battler runner.
//!
//! This binary runs the game without graphics, controlled via JSON on stdin/stdout.
//! Designed for AI agents, CI testing, and replay verification.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p battler_headless
//!
//! # Play a scripted scenario and record it
//! cargo run -p battler_headless -- play --scenario scenarios/archer_line.ron --record game.replay
//!
//! # Check that a scenario is deterministic
//! cargo run -p battler_headless -- verify --scenario scenarios/archer_line.ron --runs 5
//!
//! # Verify a replay
//! cargo run -p battler_headless -- replay --file game.replay --verify
//!
//! # Check a rules file
//! cargo run -p battler_headless -- validate --rules rules.ron
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use battler_core::config::RulesConfig;
use battler_core::replay::{Replay, ReplayPlayer};
use battler_headless::{
    game_runner::{play_scenario, verify_scenario},
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "battler_headless")]
#[command(about = "Headless Grid Battler runner for AI control and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive game over stdin/stdout
    Run {
        /// Rules file (RON); built-in rules when absent
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Ticks per second when a tick command gives no dt
        #[arg(long, default_value = "20")]
        tick_rate: u32,

        /// Output state after every tick command
        #[arg(long)]
        auto_state: bool,

        /// Save a replay of the session here on exit
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Play a scripted scenario and print a JSON report
    Play {
        /// Scenario file (RON)
        #[arg(short, long)]
        scenario: PathBuf,

        /// Save a replay of the game here
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Verify determinism by playing a scenario several times
    Verify {
        /// Scenario file (RON)
        #[arg(short, long)]
        scenario: PathBuf,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Replay a recorded game
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Verify replay produces identical hash
        #[arg(long)]
        verify: bool,
    },

    /// Check a rules file
    Validate {
        /// Rules file (RON)
        #[arg(short, long)]
        rules: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            rules,
            tick_rate,
            auto_state,
            record,
        }) => cmd_run(rules, tick_rate, auto_state, record),
        Some(Commands::Play { scenario, record }) => cmd_play(scenario, record),
        Some(Commands::Verify { scenario, runs }) => cmd_verify(scenario, runs),
        Some(Commands::Replay { file, verify }) => cmd_replay(file, verify),
        Some(Commands::Validate { rules }) => cmd_validate(rules),
        None => cmd_run(None, HeadlessConfig::default().tick_rate, false, None),
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn load_scenario(path: &Path) -> Scenario {
    Scenario::load(path).unwrap_or_else(|e| fail(e))
}

fn cmd_run(rules: Option<PathBuf>, tick_rate: u32, auto_state: bool, record: Option<PathBuf>) {
    let rules = match rules {
        Some(path) => RulesConfig::load(&path).unwrap_or_else(|e| fail(e)),
        None => RulesConfig::default(),
    };
    let config = HeadlessConfig {
        tick_rate,
        auto_state_output: auto_state,
        record: record.is_some(),
    };

    let mut runner = HeadlessRunner::new(rules, config).unwrap_or_else(|e| fail(e));
    let stdin = io::stdin();
    if let Err(e) = runner.run(stdin.lock(), io::stdout().lock()) {
        fail(format!("I/O error: {e}"));
    }

    if let (Some(path), Some(replay)) = (record, runner.into_replay()) {
        save_replay(&replay, &path);
    }
}

fn save_replay(replay: &Replay, path: &Path) {
    match replay.save(path) {
        Ok(()) => tracing::info!(path = %path.display(), "Replay saved"),
        Err(e) => fail(format!("Failed to save replay: {e}")),
    }
}

fn cmd_play(scenario: PathBuf, record: Option<PathBuf>) {
    let scenario = load_scenario(&scenario);
    let (report, replay) = play_scenario(&scenario, record.is_some()).unwrap_or_else(|e| fail(e));

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => fail(format!("Failed to serialize report: {e}")),
    }

    if let (Some(path), Some(replay)) = (record, replay) {
        save_replay(&replay, &path);
    }
}

fn cmd_verify(scenario: PathBuf, runs: u32) {
    tracing::info!("Verifying determinism: {} ({} runs)", scenario.display(), runs);

    let scenario = load_scenario(&scenario);
    let check = verify_scenario(&scenario, runs).unwrap_or_else(|e| fail(e));

    if check.deterministic {
        eprintln!("PASS: All {} runs produced identical results", check.hashes.len());
        if let Some(hash) = check.hashes.first() {
            eprintln!("  Final hash: {hash:016x}");
        }
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for (run, hash) in check.hashes.iter().enumerate() {
            eprintln!("  Run {}: {hash:016x}", run + 1);
        }
        std::process::exit(1);
    }
}

fn cmd_replay(file: PathBuf, verify: bool) {
    if verify {
        tracing::info!("Verifying replay: {}", file.display());
    } else {
        tracing::info!("Playing replay: {}", file.display());
    }

    let replay = Replay::load(&file).unwrap_or_else(|e| fail(format!("Failed to load replay: {e}")));

    eprintln!("Loaded replay:");
    eprintln!("  Scenario: {}", replay.scenario_id);
    eprintln!("  Actions: {}", replay.action_count());
    eprintln!("  Ticks: {}", replay.tick_entries());

    let mut player = ReplayPlayer::new(replay)
        .unwrap_or_else(|e| fail(format!("Failed to create replay player: {e}")));

    if verify {
        eprintln!("Verifying replay...");
        match player.verify() {
            Ok(true) => {
                eprintln!("PASS: Replay verification successful");
                eprintln!("  Expected hash: {:016x}", player.replay().final_hash);
                eprintln!("  Actual hash:   {:016x}", player.simulation().state_hash());
            }
            Ok(false) => {
                eprintln!("FAIL: Replay produced different hash!");
                eprintln!("  Expected: {:016x}", player.replay().final_hash);
                eprintln!("  Actual:   {:016x}", player.simulation().state_hash());
                std::process::exit(1);
            }
            Err(e) => fail(format!("FAIL: Error during verification: {e}")),
        }
    } else {
        let mut last_decile = 0;
        while player.advance() {
            let decile = (player.progress_percent() / 10.0) as u32;
            if decile > last_decile {
                eprintln!("Progress: {}%", decile * 10);
                last_decile = decile;
            }
        }

        let sim = player.simulation();
        eprintln!("Replay complete at tick {}", player.current_tick());
        eprintln!("Final state hash: {:016x}", sim.state_hash());
        eprintln!("\nFinal State:");
        eprintln!("  Phase: {}", sim.state().phase.display_name());
        eprintln!("  Wave: {}", sim.state().wave);
        eprintln!("  HP: {}", sim.state().player_hp);
        eprintln!("  Gold: {}", sim.state().gold);
        eprintln!("  Units: {}", sim.units().len());
    }
}

fn cmd_validate(rules: PathBuf) {
    let config = RulesConfig::load(&rules).unwrap_or_else(|e| fail(e));
    match config.validate() {
        Ok(()) => {
            eprintln!("PASS: {} is valid", rules.display());
            eprintln!("  Board: {}x{}", config.board.width, config.board.height);
            eprintln!("  Unit types: {}", config.units.len());
            eprintln!("  Wave size: {}", config.ai_wave.len());
        }
        Err(e) => fail(format!("FAIL: {e}")),
    }
}

//! Headless Turn Runner
//!
//! Plays turns without pacing or a display and prints per-turn outcomes.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use looper_tactics::battle::{
    load_scenario, CancelToken, ImmediateClock, Scenario, TurnEngine, TurnSummary,
};
use looper_tactics::core::error::Result;
use looper_tactics::core::GameConfig;
use looper_tactics::render::{StrokeBuffer, WorldBounds};

/// Headless Turn Runner - resolve and replay turns, print outcomes
#[derive(Parser, Debug)]
#[command(name = "turn_runner")]
#[command(about = "Play turns headless and output per-unit outcomes")]
struct Args {
    /// Scenario: "diagonal", "random", or a file name from data/scenarios/
    #[arg(long, default_value = "diagonal")]
    scenario: String,

    /// Unit count for the diagonal and random layouts
    #[arg(long, default_value_t = 10)]
    units: u32,

    /// Random seed for the random layout
    #[arg(long)]
    seed: Option<u64>,

    /// Number of turns to play
    #[arg(long, default_value_t = 1)]
    turns: u32,

    /// Override frames per turn
    #[arg(long)]
    frames: Option<usize>,

    /// Config file (defaults to data/config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print the engine event log to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct RunResult {
    scenario: String,
    seed: Option<u64>,
    frames_per_turn: usize,
    turns: Vec<TurnSummary>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = GameConfig::load_or_default(args.config.as_deref())?;
    if let Some(frames) = args.frames {
        config.engine.frames_per_turn = frames;
    }
    config.validate()?;

    let (scenario, seed) = match args.scenario.as_str() {
        "diagonal" => (Scenario::diagonal(args.units), None),
        "random" => {
            let seed = args.seed.unwrap_or_else(rand::random);
            let bounds = WorldBounds {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 800.0,
                max_y: 600.0,
            };
            (Scenario::random(args.units, seed, bounds)?, Some(seed))
        }
        name => (load_scenario(name)?, None),
    };

    let mut engine = TurnEngine::new(config.engine.clone());
    scenario.populate(&mut engine, &config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut surface = StrokeBuffer::new();
    let mut clock = ImmediateClock::new();
    let mut turns = Vec::with_capacity(args.turns as usize);

    engine.initial_render(&mut surface)?;
    for _ in 0..args.turns {
        let summary = runtime.block_on(engine.execute_turn(
            &mut surface,
            &mut clock,
            CancelToken::new(),
        ))?;
        turns.push(summary);
    }

    if args.verbose {
        for event in engine.events() {
            eprintln!(
                "  [turn {}] {:?}: {}",
                event.turn, event.event_type, event.description
            );
        }
    }

    let result = RunResult {
        scenario: scenario.name.clone(),
        seed,
        frames_per_turn: config.engine.frames_per_turn,
        turns,
    };

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        "text" => print_text(&result),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn print_text(result: &RunResult) {
    println!("Turn Runner");
    println!("===========");
    println!("Scenario: {}", result.scenario);
    if let Some(seed) = result.seed {
        println!("Seed: {}", seed);
    }
    println!("Frames per turn: {}", result.frames_per_turn);

    for turn in &result.turns {
        println!();
        println!(
            "Turn {} ({} frames{})",
            turn.turn,
            turn.frames_played,
            if turn.cancelled { ", cancelled" } else { "" }
        );
        for unit in &turn.units {
            println!(
                "  {} {:?}: health {} -> {} at ({:.1}, {:.1}) heading {:.1}",
                unit.id,
                unit.team,
                unit.start_health,
                unit.end_health,
                unit.position.x,
                unit.position.y,
                unit.position.heading
            );
        }
    }
}

//! Looper Tactics - Entry Point
//!
//! Interactive console for the turn engine. Units are set up from a
//! scenario, intents are typed in, and turns are resolved and played back
//! against a headless stroke buffer.

use looper_tactics::battle::{
    load_scenario, CancelToken, Combatant, ImmediateClock, IntervalClock, PowerKind, Scenario,
    TurnEngine, Unit, UnitId, UnitKind,
};
use looper_tactics::core::error::{Result, TacticsError};
use looper_tactics::core::types::{Point, Position};
use looper_tactics::core::GameConfig;
use looper_tactics::render::StrokeBuffer;
use looper_tactics::spatial::geometry::{distance, signed_angle};

use std::io::{self, Write};
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("looper_tactics=debug")
        .init();

    tracing::info!("Looper Tactics starting...");

    // Paced playback waits on tokio timers
    let rt = Runtime::new()?;

    let config = GameConfig::load_or_default(None)?;
    let scenario = match std::env::args().nth(1) {
        Some(name) => load_scenario(&name)?,
        None => Scenario::diagonal(10),
    };

    let mut engine = TurnEngine::new(config.engine.clone());
    let added = scenario.populate(&mut engine, &config)?;
    tracing::info!(scenario = %scenario.name, units = added, "Scenario loaded");

    engine.set_on_complete(|summary| {
        let hits = summary.units.iter().filter(|u| u.damage_taken() > 0).count();
        println!(
            "Turn {} {} after {}/{} frames, {} unit(s) took damage",
            summary.turn,
            if summary.cancelled { "cancelled" } else { "finished" },
            summary.frames_played,
            summary.frames_per_turn,
            hits
        );
    });

    let mut surface = StrokeBuffer::new();
    engine.initial_render(&mut surface)?;

    println!("\n=== LOOPER TACTICS ===");
    println!("Simultaneous-turn skirmish. Plan every unit, then watch the turn unfold.");
    println!();
    println!("Commands:");
    println!("  status / s             - Show every unit and its intent");
    println!("  heading <id> <deg>     - Set the heading for the coming turn");
    println!("  dist <id> <px>         - Set the flight distance (clamped)");
    println!("  aim <id> <x> <y>       - Point a unit at a spot and fly there");
    println!("  power <id> <360|none>  - Select or clear a power");
    println!("  grant <id> <360>       - Give a unit one charge of a power");
    println!("  add <id> <x> <y> <deg> - Add a looper");
    println!("  remove <id>            - Remove a unit");
    println!("  preview                - Resolve the turn without playing it");
    println!("  turn / t               - Play a turn at full speed");
    println!("  play                   - Play a turn at the configured frame rate");
    println!("  quit / q               - Exit");
    println!();

    loop {
        display_status(&engine);

        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let words: Vec<&str> = input.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };

        let outcome = match command {
            "quit" | "q" => break,
            "status" | "s" => {
                display_detailed_status(&engine);
                Ok(())
            }
            "heading" => parse_id_value(args).and_then(|(id, heading)| {
                engine.set_next_heading(id, heading)?;
                println!("{id} will turn to {heading:.1}°");
                Ok(())
            }),
            "dist" => parse_id_value(args).and_then(|(id, dist)| {
                let stored = engine.set_fly_dist(id, dist)?;
                println!("{id} will fly {stored:.1}px");
                Ok(())
            }),
            "aim" => aim(&mut engine, args),
            "power" => select_power(&mut engine, args),
            "grant" => grant_power(&mut engine, args),
            "add" => add_unit(&mut engine, &config, args),
            "remove" => parse_id(args.first()).and_then(|id| {
                if engine.remove_unit(id)? {
                    println!("Removed {id}");
                } else {
                    println!("No unit {id}");
                }
                Ok(())
            }),
            "preview" => {
                preview(&engine);
                Ok(())
            }
            "turn" | "t" => {
                let mut clock = ImmediateClock::new();
                rt.block_on(engine.execute_turn(&mut surface, &mut clock, CancelToken::new()))
                    .map(|_| ())
            }
            "play" => {
                let period = engine.config().frame_interval();
                rt.block_on(async {
                    let mut clock = IntervalClock::new(period);
                    engine
                        .execute_turn(&mut surface, &mut clock, CancelToken::new())
                        .await
                })
                .map(|_| ())
            }
            _ => {
                println!("Unknown command '{command}'");
                Ok(())
            }
        };

        match outcome {
            Ok(()) => engine.rerender(&mut surface)?,
            Err(err) => println!("Error: {err}"),
        }
    }

    println!(
        "\nGoodbye! {} units after {} turns.",
        engine.units().len(),
        engine.turn_number()
    );
    Ok(())
}

fn usage(text: &str) -> TacticsError {
    TacticsError::InvalidIntent(format!("usage: {text}"))
}

fn parse_id(word: Option<&&str>) -> Result<UnitId> {
    word.and_then(|w| w.trim_start_matches('#').parse::<u32>().ok())
        .map(UnitId)
        .ok_or_else(|| usage("<id> must be a unit number"))
}

fn parse_number(word: Option<&&str>) -> Result<f64> {
    word.and_then(|w| w.parse::<f64>().ok())
        .ok_or_else(|| usage("expected a number"))
}

fn parse_id_value(args: &[&str]) -> Result<(UnitId, f64)> {
    Ok((parse_id(args.first())?, parse_number(args.get(1))?))
}

/// Turn a unit towards a point and set its distance to reach it
fn aim(engine: &mut TurnEngine, args: &[&str]) -> Result<()> {
    let id = parse_id(args.first())?;
    let target = Point::new(parse_number(args.get(1))?, parse_number(args.get(2))?);

    let unit = engine.unit(id).ok_or(TacticsError::UnitNotFound(id))?;
    let origin = unit.position().point();
    let horizontal = Point::new(origin.x + unit.stats().max_dist, origin.y);

    let heading = signed_angle(horizontal, origin, target)?;
    engine.set_next_heading(id, heading)?;
    let stored = engine.set_fly_dist(id, distance(origin, target))?;
    println!("{id} aimed at ({:.0}, {:.0}): {heading:.1}°, {stored:.1}px", target.x, target.y);
    Ok(())
}

fn parse_power(word: Option<&&str>) -> Result<Option<PowerKind>> {
    match word {
        Some(&"none") => Ok(None),
        Some(name) => PowerKind::from_name(name)
            .map(Some)
            .ok_or_else(|| usage("power must be one of: 360, none")),
        None => Err(usage("power <id> <360|none>")),
    }
}

fn select_power(engine: &mut TurnEngine, args: &[&str]) -> Result<()> {
    let id = parse_id(args.first())?;
    let power = parse_power(args.get(1))?;
    engine.select_power(id, power)?;
    match power {
        Some(kind) => println!("{id} will use {}", kind.name()),
        None => println!("{id} cleared its power"),
    }
    Ok(())
}

fn grant_power(engine: &mut TurnEngine, args: &[&str]) -> Result<()> {
    let id = parse_id(args.first())?;
    let power = parse_power(args.get(1))?.ok_or_else(|| usage("grant <id> <360>"))?;
    let count = engine.grant_power(id, power)?;
    println!("{id} now holds {count} x {}", power.name());
    Ok(())
}

fn add_unit(engine: &mut TurnEngine, config: &GameConfig, args: &[&str]) -> Result<()> {
    let id = parse_id(args.first())?;
    let x = parse_number(args.get(1))?;
    let y = parse_number(args.get(2))?;
    let heading = parse_number(args.get(3)).unwrap_or(0.0);

    let unit = Unit::new(
        UnitKind::Looper,
        id,
        Position::new(x, y, heading),
        config.looper.clone(),
    );
    if engine.add_unit(unit)? {
        println!("Added {id} at ({x:.0}, {y:.0})");
    } else {
        println!("{id} is already on the field");
    }
    Ok(())
}

fn preview(engine: &TurnEngine) {
    let table = engine.preview_turn();
    let Some(last) = table.final_states() else {
        println!("Nothing to resolve");
        return;
    };
    println!("After {} frames:", table.frame_count());
    for (id, state) in table.unit_ids().iter().zip(last) {
        println!(
            "  {} at ({:.1}, {:.1}) health {}",
            id, state.position.x, state.position.y, state.health
        );
    }
}

/// Display a brief status summary
fn display_status(engine: &TurnEngine) {
    let alive = engine.units().iter().filter(|u| u.health() > 0).count();
    println!();
    println!(
        "--- Turn {} | Units: {} ({} above zero health) ---",
        engine.turn_number() + 1,
        engine.units().len(),
        alive
    );
}

/// Display every unit with its intent
fn display_detailed_status(engine: &TurnEngine) {
    println!();
    for unit in engine.units() {
        let state = unit.state();
        let intent = unit.intent();
        let end = unit.planned_endpoint();
        println!(
            "{} {:?} {:?}{}",
            unit.id(),
            unit.kind(),
            state.team,
            if state.controllable { "" } else { " (fixed)" }
        );
        println!(
            "  At ({:.1}, {:.1}) facing {:.1}°, health {}",
            state.position.x, state.position.y, state.position.heading, state.health
        );
        println!(
            "  Plan: {:.1}° for {:.1}px, ending at ({:.1}, {:.1})",
            intent.next_heading, intent.fly_dist, end.x, end.y
        );
        for kind in PowerKind::ALL {
            let count = state.powers.count(kind);
            if count > 0 {
                let marker = if state.powers.selected() == Some(kind) { " *" } else { "" };
                println!(
                    "  Power {} x{}{} - {}",
                    kind.name(),
                    count,
                    marker,
                    kind.description()
                );
            }
        }
    }
}

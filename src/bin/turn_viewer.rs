//! Terminal Turn Viewer
//!
//! Draws the battlefield on a braille canvas and plays turns back at the
//! configured frame rate. Mouse drags on path markers steer units, drags on
//! empty space pan.

use std::cell::Cell;
use std::fs::File;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;

use looper_tactics::battle::{
    load_scenario, CancelToken, Combatant, FramePacer, Playback, PlaybackStatus, PowerKind,
    Scenario, TurnEngine, UnitId,
};
use looper_tactics::core::error::Result;
use looper_tactics::core::types::Point;
use looper_tactics::core::GameConfig;
use looper_tactics::input::PointerController;
use looper_tactics::render::{Camera, TerminalSurface, WorldBounds};

const IDLE_POLL: Duration = Duration::from_millis(250);
const PAN_STEP: f64 = 40.0;
const HEADING_STEP: f64 = 5.0;
const DIST_STEP: f64 = 25.0;

/// Terminal Turn Viewer - watch turns play out in the terminal
#[derive(Parser, Debug)]
#[command(name = "turn_viewer")]
#[command(about = "Plan and watch turns on a terminal canvas")]
struct Args {
    /// Scenario: "diagonal" or a file name from data/scenarios/
    #[arg(long, default_value = "diagonal")]
    scenario: String,

    /// Unit count for the diagonal layout
    #[arg(long, default_value_t = 6)]
    units: u32,

    /// Config file (defaults to data/config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum width of the visible battlefield in pixels
    #[arg(long, default_value_t = 1200.0)]
    width: f64,

    /// Minimum height of the visible battlefield in pixels
    #[arg(long, default_value_t = 800.0)]
    height: f64,

    /// Log file (the terminal is taken by the canvas)
    #[arg(long, default_value = "turn_viewer.log")]
    log: PathBuf,
}

struct Viewer {
    engine: TurnEngine,
    controller: PointerController,
    playback: Option<Playback>,
    pacer: FramePacer,
    selected: usize,
    last_pointer: Option<Point>,
    dirty: Rc<Cell<bool>>,
    message: String,
}

enum Flow {
    Continue,
    Quit,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log = File::create(&args.log)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(log))
        .init();

    let config = GameConfig::load_or_default(args.config.as_deref())?;
    let scenario = match args.scenario.as_str() {
        "diagonal" => Scenario::diagonal(args.units),
        name => load_scenario(name)?,
    };

    let mut engine = TurnEngine::new(config.engine.clone());
    scenario.populate(&mut engine, &config)?;
    let ids: Vec<UnitId> = engine.units().iter().map(|u| u.id()).collect();
    for id in ids {
        engine.grant_power(id, PowerKind::Spin360)?;
    }

    let dirty = Rc::new(Cell::new(true));
    let hook_dirty = Rc::clone(&dirty);
    engine.set_rerender_hook(move |_| hook_dirty.set(true));

    let message = Rc::new(Cell::new(None));
    let hook_message = Rc::clone(&message);
    engine.set_on_complete(move |summary| {
        hook_message.set(Some((summary.turn, summary.cancelled)));
    });

    // Widen the view so every unit's longest flight stays on screen
    let points: Vec<Point> = engine.units().iter().map(|u| u.position().point()).collect();
    let (width, height) = match WorldBounds::around(&points, config.looper.max_dist) {
        Some(fit) => (args.width.max(fit.width()), args.height.max(fit.height())),
        None => (args.width, args.height),
    };
    let mut controller = PointerController::new(Camera::new(width, height));
    controller.center_on_units(&engine);

    let mut surface = TerminalSurface::enter(controller.camera().visible_bounds())?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let mut viewer = Viewer {
        engine,
        controller,
        playback: None,
        pacer: FramePacer::new(config.engine.frame_interval(), Instant::now()),
        selected: 0,
        last_pointer: None,
        dirty,
        message: format!("Scenario '{}'", scenario.name),
    };

    let outcome = run(&mut viewer, &mut surface, &message);

    if let Err(err) = execute!(std::io::stdout(), DisableMouseCapture) {
        tracing::error!(?err, "failed to release the mouse");
    }
    surface.leave()?;
    outcome
}

fn run<B: ratatui::backend::Backend>(
    viewer: &mut Viewer,
    surface: &mut TerminalSurface<B>,
    completed: &Cell<Option<(u32, bool)>>,
) -> Result<()> {
    loop {
        if let Some((turn, cancelled)) = completed.take() {
            viewer.message = if cancelled {
                format!("Turn {turn} cancelled")
            } else {
                format!("Turn {turn} done")
            };
        }

        // Input wakes the loop early; frames still only advance on the pacer
        let status = match viewer.playback.as_mut() {
            Some(playback) if viewer.pacer.take_due(Instant::now()) => {
                surface.set_status(format!(
                    "Playing frame {}/{} | [c] cancel [hjkl] pan",
                    playback.cursor() + 1,
                    playback.table().frame_count()
                ));
                Some(viewer.engine.play_frame(playback, surface)?)
            }
            _ => None,
        };

        if matches!(status, Some(PlaybackStatus::Finished | PlaybackStatus::Cancelled)) {
            if let Some(playback) = viewer.playback.take() {
                surface.set_status(idle_status(viewer));
                viewer.engine.finish_turn(playback, surface)?;
                viewer.dirty.set(true);
            }
        }

        if viewer.playback.is_none() && viewer.dirty.replace(false) {
            surface.set_bounds(viewer.controller.camera().visible_bounds());
            surface.set_status(idle_status(viewer));
            viewer.engine.rerender(surface)?;
        }

        let timeout = if viewer.playback.is_some() {
            viewer.pacer.wait_time(Instant::now())
        } else {
            IDLE_POLL
        };
        if !event::poll(timeout)? {
            continue;
        }

        let flow = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(viewer, key)?,
            Event::Mouse(mouse) => {
                handle_mouse(viewer, surface, mouse)?;
                Flow::Continue
            }
            Event::Resize(..) => {
                viewer.dirty.set(true);
                Flow::Continue
            }
            _ => Flow::Continue,
        };

        if viewer.playback.is_some() {
            // Panning during playback shows on the next frame
            surface.set_bounds(viewer.controller.camera().visible_bounds());
        }

        if let Flow::Quit = flow {
            if let Some(playback) = viewer.playback.take() {
                playback.cancel_token().cancel();
                viewer.engine.finish_turn(playback, surface)?;
            }
            return Ok(());
        }
    }
}

fn selected_id(viewer: &Viewer) -> Option<UnitId> {
    viewer.engine.units().get(viewer.selected).map(|u| u.id())
}

fn idle_status(viewer: &Viewer) -> String {
    let unit = match selected_id(viewer).and_then(|id| viewer.engine.unit(id)) {
        Some(unit) => {
            let intent = unit.intent();
            let power = match unit.state().powers.selected() {
                Some(kind) => kind.name(),
                None => "-",
            };
            format!(
                "{} hp {} heading {:.0}° dist {:.0} power {}",
                unit.id(),
                unit.health(),
                intent.next_heading,
                intent.fly_dist,
                power
            )
        }
        None => "no units".to_string(),
    };
    format!(
        "{} | {} | [tab] unit [←→] heading [↑↓] dist [p] 360 [enter] turn [hjkl] pan [q] quit",
        viewer.message, unit
    )
}

fn handle_key(viewer: &mut Viewer, key: KeyEvent) -> Result<Flow> {
    match key.code {
        KeyCode::Char('q') => return Ok(Flow::Quit),
        KeyCode::Char('h') => viewer.controller.pan(PAN_STEP, 0.0),
        KeyCode::Char('l') => viewer.controller.pan(-PAN_STEP, 0.0),
        KeyCode::Char('k') => viewer.controller.pan(0.0, PAN_STEP),
        KeyCode::Char('j') => viewer.controller.pan(0.0, -PAN_STEP),
        KeyCode::Char('c') | KeyCode::Esc => {
            if let Some(playback) = viewer.playback.as_ref() {
                playback.cancel_token().cancel();
            }
            return Ok(Flow::Continue);
        }
        _ if viewer.playback.is_some() => return Ok(Flow::Continue),
        KeyCode::Tab => {
            let count = viewer.engine.units().len().max(1);
            viewer.selected = (viewer.selected + 1) % count;
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            viewer.playback = Some(viewer.engine.begin_turn(CancelToken::new())?);
            let period = viewer.engine.config().frame_interval();
            viewer.pacer = FramePacer::new(period, Instant::now());
            return Ok(Flow::Continue);
        }
        code => {
            if let Some(id) = selected_id(viewer) {
                if let Err(err) = adjust_intent(&mut viewer.engine, id, code) {
                    viewer.message = err.to_string();
                }
            }
        }
    }
    viewer.dirty.set(true);
    Ok(Flow::Continue)
}

fn adjust_intent(engine: &mut TurnEngine, id: UnitId, code: KeyCode) -> Result<()> {
    let Some(unit) = engine.unit(id) else {
        return Ok(());
    };
    let intent = unit.intent();
    let selected = unit.state().powers.selected();

    match code {
        KeyCode::Left => engine.set_next_heading(id, intent.next_heading - HEADING_STEP),
        KeyCode::Right => engine.set_next_heading(id, intent.next_heading + HEADING_STEP),
        KeyCode::Up => engine.set_fly_dist(id, intent.fly_dist + DIST_STEP).map(|_| ()),
        KeyCode::Down => engine.set_fly_dist(id, intent.fly_dist - DIST_STEP).map(|_| ()),
        KeyCode::Char('p') => {
            let toggled = match selected {
                Some(_) => None,
                None => Some(PowerKind::Spin360),
            };
            engine.select_power(id, toggled)
        }
        _ => Ok(()),
    }
}

fn handle_mouse<B: ratatui::backend::Backend>(
    viewer: &mut Viewer,
    surface: &TerminalSurface<B>,
    mouse: MouseEvent,
) -> Result<()> {
    if let MouseEventKind::Up(MouseButton::Left) = mouse.kind {
        // Released anywhere, even off the canvas
        viewer.controller.pointer_up();
        viewer.last_pointer = None;
        return Ok(());
    }
    let Some(pointer) = surface.cell_to_point(mouse.column, mouse.row) else {
        return Ok(());
    };
    let movement = match viewer.last_pointer {
        Some(last) => pointer - last,
        None => Point::default(),
    };
    viewer.last_pointer = Some(pointer);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            viewer.controller.pointer_down(&viewer.engine, pointer);
            if let Some(id) = viewer.controller.guided() {
                if let Some(i) = viewer.engine.units().iter().position(|u| u.id() == id) {
                    viewer.selected = i;
                }
            }
        }
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            if viewer
                .controller
                .pointer_move(&mut viewer.engine, pointer, movement)?
            {
                viewer.dirty.set(true);
            }
        }
        _ => {}
    }
    Ok(())
}

//! Turn execution: roster ownership, intent gating and playback
//!
//! Each turn: Idle -> Resolving (whole table computed) -> Playing (one frame
//! per clock tick) -> Idle. Intents and the roster only change while Idle.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::playback::{CancelToken, FrameClock, Playback, PlaybackStatus};
use crate::battle::powers::PowerKind;
use crate::battle::resolution::{resolve_turn, FrameTable};
use crate::battle::units::{Combatant, Team, Unit, UnitId};
use crate::core::config::EngineConfig;
use crate::core::error::{Result, TacticsError};
use crate::core::types::{Frame, Position};
use crate::render::RenderSurface;

/// Engine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnPhase {
    #[default]
    Idle, // Accepting intents
    Resolving, // Computing the frame table
    Playing,   // Replaying frames
}

/// Log entry for engine events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnEvent {
    pub turn: u32,
    pub event_type: TurnEventType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurnEventType {
    UnitAdded { unit_id: UnitId },
    UnitRemoved { unit_id: UnitId },
    TurnStarted { units: usize },
    TurnCompleted { frames: usize },
    TurnCancelled { frame: Frame },
    TurnAborted { frame: Frame },
}

/// How one unit came out of a turn
#[derive(Debug, Clone, Serialize)]
pub struct UnitOutcome {
    pub id: UnitId,
    pub team: Team,
    pub start_health: i32,
    pub end_health: i32,
    pub position: Position,
}

impl UnitOutcome {
    pub fn damage_taken(&self) -> i32 {
        self.start_health.saturating_sub(self.end_health)
    }
}

/// Result of one played turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnSummary {
    pub turn: u32,
    pub frames_played: usize,
    pub frames_per_turn: usize,
    pub cancelled: bool,
    pub units: Vec<UnitOutcome>,
}

type CompletionHook = Box<dyn FnMut(&TurnSummary)>;
type RerenderHook = Box<dyn FnMut(UnitId)>;

/// Owns the roster and runs turns
pub struct TurnEngine {
    units: Vec<Unit>,
    index: AHashMap<UnitId, usize>,
    phase: TurnPhase,
    config: EngineConfig,
    turn: u32,
    on_complete: Option<CompletionHook>,
    rerender_hook: Option<RerenderHook>,
    log: Vec<TurnEvent>,
}

impl Default for TurnEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for TurnEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnEngine")
            .field("units", &self.units.len())
            .field("phase", &self.phase)
            .field("turn", &self.turn)
            .finish()
    }
}

impl TurnEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            units: Vec::new(),
            index: AHashMap::new(),
            phase: TurnPhase::Idle,
            config,
            turn: 0,
            on_complete: None,
            rerender_hook: None,
            log: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// True from `begin_turn` until `finish_turn`
    pub fn is_executing(&self) -> bool {
        self.phase != TurnPhase::Idle
    }

    /// Turns completed so far
    pub fn turn_number(&self) -> u32 {
        self.turn
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.index.get(&id).map(|&i| &self.units[i])
    }

    pub fn events(&self) -> &[TurnEvent] {
        &self.log
    }

    /// Called once at the end of every turn, cancelled or not
    pub fn set_on_complete(&mut self, hook: impl FnMut(&TurnSummary) + 'static) {
        self.on_complete = Some(Box::new(hook));
    }

    /// Called after every successful intent or power change
    pub fn set_rerender_hook(&mut self, hook: impl FnMut(UnitId) + 'static) {
        self.rerender_hook = Some(Box::new(hook));
    }

    fn log_event(&mut self, event_type: TurnEventType, description: String) {
        self.log.push(TurnEvent {
            turn: self.turn,
            event_type,
            description,
        });
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.phase {
            TurnPhase::Idle => Ok(()),
            phase => Err(TacticsError::TurnInProgress { phase }),
        }
    }

    fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        let i = *self.index.get(&id).ok_or(TacticsError::UnitNotFound(id))?;
        Ok(&mut self.units[i])
    }

    fn notify_rerender(&mut self, id: UnitId) {
        if let Some(hook) = self.rerender_hook.as_mut() {
            hook(id);
        }
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, unit) in self.units.iter().enumerate() {
            self.index.insert(unit.id(), i);
        }
    }

    /// Register a unit; `Ok(false)` if the id is already on the roster
    pub fn add_unit(&mut self, unit: impl Into<Unit>) -> Result<bool> {
        self.ensure_idle()?;
        let unit = unit.into();
        let id = unit.id();
        if self.index.contains_key(&id) {
            tracing::debug!(%id, "Ignoring duplicate unit");
            return Ok(false);
        }
        self.index.insert(id, self.units.len());
        self.units.push(unit);
        self.log_event(TurnEventType::UnitAdded { unit_id: id }, format!("Unit {id} joined"));
        tracing::debug!(%id, "Unit added");
        Ok(true)
    }

    /// Drop a unit by id or reference; `Ok(false)` if it was not there
    pub fn remove_unit<'a>(&mut self, unit: impl Into<UnitRef<'a>>) -> Result<bool> {
        self.ensure_idle()?;
        let id = unit.into().id();
        let Some(i) = self.index.get(&id).copied() else {
            return Ok(false);
        };
        self.units.remove(i);
        self.rebuild_index();
        self.log_event(TurnEventType::UnitRemoved { unit_id: id }, format!("Unit {id} left"));
        tracing::debug!(%id, "Unit removed");
        Ok(true)
    }

    pub fn set_next_heading(&mut self, id: UnitId, heading: f64) -> Result<()> {
        self.ensure_idle()?;
        self.unit_mut(id)?.set_next_heading(heading)?;
        tracing::trace!(%id, heading, "Heading set");
        self.notify_rerender(id);
        Ok(())
    }

    /// Returns the stored (clamped) distance
    pub fn set_fly_dist(&mut self, id: UnitId, dist: f64) -> Result<f64> {
        self.ensure_idle()?;
        let stored = self.unit_mut(id)?.set_fly_dist(dist)?;
        tracing::trace!(%id, requested = dist, stored, "Fly distance set");
        self.notify_rerender(id);
        Ok(stored)
    }

    pub fn select_power(&mut self, id: UnitId, power: Option<PowerKind>) -> Result<()> {
        self.ensure_idle()?;
        self.unit_mut(id)?.state_mut().powers.select(power)?;
        self.notify_rerender(id);
        Ok(())
    }

    /// Returns the new charge count
    pub fn grant_power(&mut self, id: UnitId, power: PowerKind) -> Result<u32> {
        self.ensure_idle()?;
        let count = self.unit_mut(id)?.state_mut().powers.grant(power);
        tracing::debug!(%id, power = power.name(), count, "Power granted");
        Ok(count)
    }

    /// Resolve the current intents without starting a turn
    pub fn preview_turn(&self) -> FrameTable {
        resolve_turn(&self.units, self.config.frames_per_turn)
    }

    /// Resolve the turn and hand back a playback cursor
    pub fn begin_turn(&mut self, cancel: CancelToken) -> Result<Playback> {
        if self.phase != TurnPhase::Idle {
            return Err(TacticsError::AlreadyExecuting);
        }

        self.phase = TurnPhase::Resolving;
        let table = resolve_turn(&self.units, self.config.frames_per_turn);
        self.phase = TurnPhase::Playing;

        let units = self.units.len();
        self.log_event(
            TurnEventType::TurnStarted { units },
            format!("Turn {} started with {} units", self.turn + 1, units),
        );
        tracing::info!(turn = self.turn + 1, units, frames = table.frame_count(), "Turn started");
        Ok(Playback::for_turn(self.turn + 1, table, cancel))
    }

    /// The turn in flight must be the one `playback` was started for
    fn ensure_playing(&self, playback: &Playback) -> Result<()> {
        if self.phase != TurnPhase::Playing || playback.turn() != self.turn + 1 {
            return Err(TacticsError::NotPlaying);
        }
        Ok(())
    }

    /// Render the next frame of `playback` and present it
    pub fn play_frame(
        &mut self,
        playback: &mut Playback,
        surface: &mut dyn RenderSurface,
    ) -> Result<PlaybackStatus> {
        self.ensure_playing(playback)?;
        let Some((frame, row)) = playback.advance() else {
            return Ok(PlaybackStatus::Finished);
        };

        surface.clear();
        for (unit, state) in self.units.iter_mut().zip(row) {
            unit.render(surface, Some(state));
        }
        surface.present()?;
        tracing::trace!(frame, "Frame rendered");

        Ok(playback.status())
    }

    /// Idle re-render, back to Idle, and the completion hook
    pub fn finish_turn(
        &mut self,
        playback: Playback,
        surface: &mut dyn RenderSurface,
    ) -> Result<TurnSummary> {
        self.ensure_playing(&playback)?;

        let table = playback.table();
        let frames_played = playback.cursor();
        let cancelled = !playback.is_done();

        let units = self
            .units
            .iter()
            .enumerate()
            .map(|(i, unit)| UnitOutcome {
                id: unit.id(),
                team: unit.state().team,
                start_health: table.initial_health(i).unwrap_or_else(|| unit.health()),
                end_health: unit.health(),
                position: unit.position(),
            })
            .collect();

        self.phase = TurnPhase::Idle;
        self.turn += 1;
        let summary = TurnSummary {
            turn: self.turn,
            frames_played,
            frames_per_turn: table.frame_count(),
            cancelled,
            units,
        };

        if cancelled {
            self.log_event(
                TurnEventType::TurnCancelled {
                    frame: frames_played,
                },
                format!("Turn {} cancelled after {} frames", self.turn, frames_played),
            );
            tracing::info!(turn = self.turn, frames_played, "Turn cancelled");
        } else {
            self.log_event(
                TurnEventType::TurnCompleted {
                    frames: frames_played,
                },
                format!("Turn {} completed", self.turn),
            );
            tracing::info!(turn = self.turn, frames_played, "Turn completed");
        }

        let rendered = self.rerender(surface);

        if let Some(hook) = self.on_complete.as_mut() {
            hook(&summary);
        }

        rendered?;
        Ok(summary)
    }

    /// Run a whole turn, waiting on `clock` between frames
    pub async fn execute_turn(
        &mut self,
        surface: &mut dyn RenderSurface,
        clock: &mut impl FrameClock,
        cancel: CancelToken,
    ) -> Result<TurnSummary> {
        let mut playback = self.begin_turn(cancel)?;

        loop {
            match self.play_frame(&mut playback, surface) {
                Ok(PlaybackStatus::Continue) => clock.next_frame().await,
                Ok(_) => break,
                Err(err) => {
                    let frame = playback.cursor();
                    tracing::warn!(%err, turn = self.turn + 1, frame, "Playback aborted");
                    self.log_event(
                        TurnEventType::TurnAborted { frame },
                        format!("Turn {} aborted at frame {}: {}", self.turn + 1, frame, err),
                    );
                    self.phase = TurnPhase::Idle;
                    return Err(err);
                }
            }
        }

        self.finish_turn(playback, surface)
    }

    /// First draw after setup
    pub fn initial_render(&mut self, surface: &mut dyn RenderSurface) -> Result<()> {
        tracing::debug!(units = self.units.len(), "Initial render");
        self.rerender(surface)
    }

    /// Clear and draw every unit at its live state with its planned path
    pub fn rerender(&mut self, surface: &mut dyn RenderSurface) -> Result<()> {
        surface.clear();
        for unit in &mut self.units {
            unit.render(surface, None);
        }
        surface.present()
    }
}

/// A unit given either by id or by reference
#[derive(Debug, Clone, Copy)]
pub enum UnitRef<'a> {
    Id(UnitId),
    Unit(&'a Unit),
}

impl UnitRef<'_> {
    pub fn id(&self) -> UnitId {
        match self {
            UnitRef::Id(id) => *id,
            UnitRef::Unit(unit) => unit.id(),
        }
    }
}

impl From<UnitId> for UnitRef<'_> {
    fn from(id: UnitId) -> Self {
        UnitRef::Id(id)
    }
}

impl<'a> From<&'a Unit> for UnitRef<'a> {
    fn from(unit: &'a Unit) -> Self {
        UnitRef::Unit(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::StrokeBuffer;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine(frames: usize) -> TurnEngine {
        TurnEngine::new(EngineConfig {
            frames_per_turn: frames,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_add_unit_is_idempotent() {
        let mut engine = engine(10);
        assert!(engine.add_unit(Unit::looper(1, Position::default())).unwrap());
        assert!(!engine.add_unit(Unit::looper(1, Position::new(50.0, 0.0, 0.0))).unwrap());
        assert_eq!(engine.units().len(), 1);
        assert_eq!(engine.unit(UnitId(1)).unwrap().position(), Position::default());
    }

    #[test]
    fn test_remove_unit_by_id_or_ref() {
        let mut engine = engine(10);
        engine.add_unit(Unit::looper(1, Position::default())).unwrap();
        engine.add_unit(Unit::looper(2, Position::default())).unwrap();
        engine.add_unit(Unit::looper(3, Position::default())).unwrap();

        assert!(engine.remove_unit(UnitId(1)).unwrap());
        assert!(!engine.remove_unit(UnitId(1)).unwrap());

        let other = Unit::looper(3, Position::default());
        assert!(engine.remove_unit(&other).unwrap());
        assert_eq!(engine.units().len(), 1);
        // Index stays valid after removals shift the roster
        assert_eq!(engine.unit(UnitId(2)).unwrap().id(), UnitId(2));
    }

    #[test]
    fn test_unknown_unit_intent() {
        let mut engine = engine(10);
        assert!(matches!(
            engine.set_fly_dist(UnitId(9), 100.0),
            Err(TacticsError::UnitNotFound(UnitId(9)))
        ));
    }

    #[test]
    fn test_rerender_hook_fires_on_intent_change() {
        let mut engine = engine(10);
        engine.add_unit(Unit::looper(4, Position::default())).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.set_rerender_hook(move |id| sink.borrow_mut().push(id));

        engine.set_next_heading(UnitId(4), 30.0).unwrap();
        assert_eq!(engine.set_fly_dist(UnitId(4), 1.0).unwrap(), 125.0);
        let _ = engine.set_fly_dist(UnitId(4), f64::NAN);
        assert_eq!(*seen.borrow(), vec![UnitId(4), UnitId(4)]);
    }

    #[test]
    fn test_intents_locked_during_playback() {
        let mut engine = engine(10);
        engine.add_unit(Unit::looper(1, Position::default())).unwrap();
        let playback = engine.begin_turn(CancelToken::new()).unwrap();

        assert!(engine.is_executing());
        assert!(matches!(
            engine.set_next_heading(UnitId(1), 90.0),
            Err(TacticsError::TurnInProgress {
                phase: TurnPhase::Playing
            })
        ));
        assert!(matches!(
            engine.add_unit(Unit::looper(2, Position::default())),
            Err(TacticsError::TurnInProgress { .. })
        ));
        assert!(matches!(
            engine.begin_turn(CancelToken::new()),
            Err(TacticsError::AlreadyExecuting)
        ));

        let mut surface = StrokeBuffer::new();
        engine.finish_turn(playback, &mut surface).unwrap();
        assert!(!engine.is_executing());
        assert!(engine.set_next_heading(UnitId(1), 90.0).is_ok());
    }

    #[test]
    fn test_stepped_turn_moves_units() {
        let mut engine = engine(100);
        engine.add_unit(Unit::looper(1, Position::default())).unwrap();
        engine.set_fly_dist(UnitId(1), 200.0).unwrap();

        let mut surface = StrokeBuffer::new();
        let mut playback = engine.begin_turn(CancelToken::new()).unwrap();
        let mut ticks = 0;
        while engine.play_frame(&mut playback, &mut surface).unwrap() == PlaybackStatus::Continue {
            ticks += 1;
        }
        assert_eq!(ticks, 99);
        let summary = engine.finish_turn(playback, &mut surface).unwrap();

        assert!(!summary.cancelled);
        assert_eq!(summary.frames_played, 100);
        assert!((summary.units[0].position.x - 198.0).abs() < 1e-9);
        // 100 frames plus the idle re-render
        assert_eq!(surface.presented_frames(), 101);
        assert_eq!(engine.turn_number(), 1);
    }

    #[test]
    fn test_play_frame_requires_playing() {
        let mut engine = engine(10);
        let mut playback = Playback::new(engine.preview_turn(), CancelToken::new());
        let mut surface = StrokeBuffer::new();
        assert!(matches!(
            engine.play_frame(&mut playback, &mut surface),
            Err(TacticsError::NotPlaying)
        ));
    }

    #[test]
    fn test_foreign_playback_rejected_mid_turn() {
        let mut engine = engine(10);
        engine.add_unit(Unit::looper(1, Position::default())).unwrap();
        let mut surface = StrokeBuffer::new();
        let mut playback = engine.begin_turn(CancelToken::new()).unwrap();
        assert_eq!(playback.turn(), 1);

        let mut preview = Playback::new(engine.preview_turn(), CancelToken::new());
        assert!(matches!(
            engine.play_frame(&mut preview, &mut surface),
            Err(TacticsError::NotPlaying)
        ));
        assert_eq!(preview.cursor(), 0);
        assert!(matches!(
            engine.finish_turn(preview, &mut surface),
            Err(TacticsError::NotPlaying)
        ));
        assert_eq!(engine.phase(), TurnPhase::Playing);
        assert_eq!(engine.turn_number(), 0);

        // The turn's own cursor still plays through
        while engine.play_frame(&mut playback, &mut surface).unwrap() == PlaybackStatus::Continue {}
        let summary = engine.finish_turn(playback, &mut surface).unwrap();
        assert_eq!(summary.frames_played, 10);
        assert!(!summary.cancelled);
    }

    #[test]
    fn test_stale_playback_rejected_next_turn() {
        let mut engine = engine(4);
        engine.add_unit(Unit::looper(1, Position::default())).unwrap();
        let mut surface = StrokeBuffer::new();

        let mut first = engine.begin_turn(CancelToken::new()).unwrap();
        engine.play_frame(&mut first, &mut surface).unwrap();
        // Finishing consumes the cursor, so fake a leftover from turn 1
        let mut stale = Playback::for_turn(1, engine.preview_turn(), CancelToken::new());
        engine.finish_turn(first, &mut surface).unwrap();

        let _second = engine.begin_turn(CancelToken::new()).unwrap();
        assert!(matches!(
            engine.play_frame(&mut stale, &mut surface),
            Err(TacticsError::NotPlaying)
        ));
    }

    #[test]
    fn test_event_log_records_lifecycle() {
        let mut engine = engine(5);
        engine.add_unit(Unit::looper(1, Position::default())).unwrap();
        let cancel = CancelToken::new();
        let mut playback = engine.begin_turn(cancel.clone()).unwrap();
        let mut surface = StrokeBuffer::new();
        cancel.cancel();
        assert_eq!(
            engine.play_frame(&mut playback, &mut surface).unwrap(),
            PlaybackStatus::Cancelled
        );
        engine.finish_turn(playback, &mut surface).unwrap();

        let kinds: Vec<_> = engine.events().iter().map(|e| e.event_type.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TurnEventType::UnitAdded { unit_id: UnitId(1) },
                TurnEventType::TurnStarted { units: 1 },
                TurnEventType::TurnCancelled { frame: 1 },
            ]
        );
    }
}

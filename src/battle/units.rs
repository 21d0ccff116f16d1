//! Unit abstraction: identity, live state and the shared combat contract
//!
//! Every unit variant implements [`Combatant`]. The roster stores the closed
//! [`Unit`] enum so the engine never needs dynamic dispatch on units.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    LOOPER_DAMAGE, LOOPER_HEIGHT, LOOPER_MAX_DIST, LOOPER_RANGE, LOOPER_WIDTH, MIN_FLY_FRACTION,
    STARTING_HEALTH,
};
use crate::battle::looper::Looper;
use crate::battle::powers::PowerInventory;
use crate::battle::resolution::FrameState;
use crate::core::error::{Result, TacticsError};
use crate::core::types::Position;
use crate::render::RenderSurface;

/// Unique identifier for units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for UnitId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<&Unit> for UnitId {
    fn from(unit: &Unit) -> Self {
        unit.id()
    }
}

/// Side a unit fights for. No combat rule reads it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    #[default]
    Red,
    Blue,
}

/// Unit variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    #[default]
    Looper,
}

/// Per-variant movement and weapon tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStats {
    /// Longest distance the unit can fly in one turn
    pub max_dist: f64,
    /// Weapon reach; targets at exactly this distance are hit
    pub range: f64,
    /// Health removed from each target per frame in range
    pub damage: i32,
    pub width: f64,
    pub height: f64,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            max_dist: LOOPER_MAX_DIST,
            range: LOOPER_RANGE,
            damage: LOOPER_DAMAGE,
            width: LOOPER_WIDTH,
            height: LOOPER_HEIGHT,
        }
    }
}

impl UnitStats {
    pub fn validate(&self) -> Result<()> {
        if !self.max_dist.is_finite() || self.max_dist <= 0.0 {
            return Err(TacticsError::InvalidConfig(format!(
                "max_dist must be positive, got {}",
                self.max_dist
            )));
        }
        if !self.range.is_finite() || self.range < 0.0 {
            return Err(TacticsError::InvalidConfig(format!(
                "range must be non-negative, got {}",
                self.range
            )));
        }
        if self.damage < 0 {
            return Err(TacticsError::InvalidConfig(format!(
                "damage must be non-negative, got {}",
                self.damage
            )));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(TacticsError::InvalidConfig(
                "unit width and height must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Lower bound of the fly distance
    pub fn min_fly_dist(&self) -> f64 {
        MIN_FLY_FRACTION * self.max_dist
    }

    pub fn clamp_fly_dist(&self, dist: f64) -> f64 {
        dist.clamp(self.min_fly_dist(), self.max_dist)
    }
}

/// What a unit plans to do next turn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub next_heading: f64,
    pub fly_dist: f64,
}

/// A unit as seen by targeting within one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: UnitId,
    pub position: Position,
}

/// Live state shared by every variant
#[derive(Debug, Clone)]
pub struct UnitState {
    pub id: UnitId,
    pub position: Position,
    pub health: i32,
    pub team: Team,
    pub controllable: bool,
    /// Endpoint of the planned path, set by the idle render for hit-testing
    pub pointer_position: Option<Position>,
    pub powers: PowerInventory,
    pub(crate) next_heading: f64,
    pub(crate) fly_dist: f64,
}

impl UnitState {
    pub fn new(id: UnitId, position: Position, stats: &UnitStats) -> Self {
        Self {
            id,
            position,
            health: STARTING_HEALTH,
            team: Team::default(),
            controllable: true,
            pointer_position: None,
            powers: PowerInventory::new(),
            next_heading: position.heading,
            fly_dist: stats.max_dist,
        }
    }

    pub fn next_heading(&self) -> f64 {
        self.next_heading
    }

    pub fn fly_dist(&self) -> f64 {
        self.fly_dist
    }

    pub fn intent(&self) -> Intent {
        Intent {
            next_heading: self.next_heading,
            fly_dist: self.fly_dist,
        }
    }
}

/// Contract every unit variant fulfils
pub trait Combatant {
    fn state(&self) -> &UnitState;
    fn state_mut(&mut self) -> &mut UnitState;
    fn stats(&self) -> &UnitStats;
    fn kind(&self) -> UnitKind;

    /// Push the indices of every contact this unit damages when standing at `at`
    fn acquire_targets(&self, at: Position, contacts: &[Contact], out: &mut Vec<usize>);

    /// Draw the unit.
    ///
    /// With a frame the unit adopts the frame's position and health. Without
    /// one it draws its live state plus, when controllable, the planned path.
    fn render(&mut self, surface: &mut dyn RenderSurface, frame: Option<&FrameState>);

    fn id(&self) -> UnitId {
        self.state().id
    }

    fn position(&self) -> Position {
        self.state().position
    }

    fn health(&self) -> i32 {
        self.state().health
    }

    fn intent(&self) -> Intent {
        self.state().intent()
    }

    /// Per-frame positions for the coming turn.
    ///
    /// Frame 0 is the current position turned to `next_heading`; each later
    /// frame is `fly_dist / frames` further along that heading.
    fn generate_path(&self, frames: usize) -> Vec<Position> {
        let mut path = Vec::with_capacity(frames);
        self.generate_path_into(frames, &mut path);
        path
    }

    fn generate_path_into(&self, frames: usize, out: &mut Vec<Position>) {
        out.clear();
        if frames == 0 {
            return;
        }
        let state = self.state();
        let step = state.fly_dist / frames as f64;
        let start = Position {
            heading: state.next_heading,
            ..state.position
        };
        out.extend((0..frames).map(|f| start.advanced(step * f as f64)));
    }

    fn fire_at(&self, at: Position, contacts: &[Contact]) -> Vec<usize> {
        let mut out = Vec::new();
        self.acquire_targets(at, contacts, &mut out);
        out
    }

    /// Store a clamped fly distance and return what was stored
    fn set_fly_dist(&mut self, dist: f64) -> Result<f64> {
        if !dist.is_finite() {
            return Err(TacticsError::InvalidIntent(format!(
                "fly distance must be finite, got {dist}"
            )));
        }
        let clamped = self.stats().clamp_fly_dist(dist);
        self.state_mut().fly_dist = clamped;
        Ok(clamped)
    }

    fn set_next_heading(&mut self, heading: f64) -> Result<()> {
        if !heading.is_finite() {
            return Err(TacticsError::InvalidIntent(format!(
                "heading must be finite, got {heading}"
            )));
        }
        self.state_mut().next_heading = heading;
        Ok(())
    }

    /// Where the unit ends up if the turn runs with the current intent
    fn planned_endpoint(&self) -> Position {
        let state = self.state();
        Position {
            heading: state.next_heading,
            ..state.position
        }
        .advanced(state.fly_dist)
    }
}

/// Closed set of unit variants
#[derive(Debug, Clone)]
pub enum Unit {
    Looper(Looper),
}

impl Unit {
    /// Build a unit of `kind` with the given tuning
    pub fn new(kind: UnitKind, id: UnitId, position: Position, stats: UnitStats) -> Self {
        match kind {
            UnitKind::Looper => Unit::Looper(Looper::with_stats(id, position, stats)),
        }
    }

    pub fn looper(id: u32, position: Position) -> Self {
        Unit::Looper(Looper::new(UnitId(id), position))
    }
}

impl From<Looper> for Unit {
    fn from(looper: Looper) -> Self {
        Unit::Looper(looper)
    }
}

impl Combatant for Unit {
    fn state(&self) -> &UnitState {
        match self {
            Unit::Looper(u) => u.state(),
        }
    }

    fn state_mut(&mut self) -> &mut UnitState {
        match self {
            Unit::Looper(u) => u.state_mut(),
        }
    }

    fn stats(&self) -> &UnitStats {
        match self {
            Unit::Looper(u) => u.stats(),
        }
    }

    fn kind(&self) -> UnitKind {
        match self {
            Unit::Looper(u) => u.kind(),
        }
    }

    fn acquire_targets(&self, at: Position, contacts: &[Contact], out: &mut Vec<usize>) {
        match self {
            Unit::Looper(u) => u.acquire_targets(at, contacts, out),
        }
    }

    fn render(&mut self, surface: &mut dyn RenderSurface, frame: Option<&FrameState>) {
        match self {
            Unit::Looper(u) => u.render(surface, frame),
        }
    }

    fn generate_path_into(&self, frames: usize, out: &mut Vec<Position>) {
        match self {
            Unit::Looper(u) => u.generate_path_into(frames, out),
        }
    }

    fn set_fly_dist(&mut self, dist: f64) -> Result<f64> {
        match self {
            Unit::Looper(u) => u.set_fly_dist(dist),
        }
    }

    fn set_next_heading(&mut self, heading: f64) -> Result<()> {
        match self {
            Unit::Looper(u) => u.set_next_heading(heading),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_new_unit_defaults() {
        let unit = Unit::looper(7, Position::new(10.0, 20.0, 45.0));
        assert_eq!(unit.id(), UnitId(7));
        assert_eq!(unit.health(), STARTING_HEALTH);
        assert_eq!(unit.intent().fly_dist, unit.stats().max_dist);
        assert_eq!(unit.intent().next_heading, 45.0);
        assert!(unit.state().controllable);
        assert_eq!(unit.state().team, Team::Red);
    }

    #[test]
    fn test_fly_dist_clamped() {
        let mut unit = Unit::looper(1, Position::default());
        let max = unit.stats().max_dist;
        assert_eq!(unit.set_fly_dist(0.0).unwrap(), 0.25 * max);
        assert_eq!(unit.set_fly_dist(-40.0).unwrap(), 0.25 * max);
        assert_eq!(unit.set_fly_dist(max * 3.0).unwrap(), max);
        assert_eq!(unit.set_fly_dist(300.0).unwrap(), 300.0);
        assert_eq!(unit.intent().fly_dist, 300.0);
    }

    #[test]
    fn test_non_finite_intent_rejected() {
        let mut unit = Unit::looper(1, Position::default());
        assert!(matches!(
            unit.set_fly_dist(f64::NAN),
            Err(TacticsError::InvalidIntent(_))
        ));
        assert!(matches!(
            unit.set_next_heading(f64::INFINITY),
            Err(TacticsError::InvalidIntent(_))
        ));
        assert_eq!(unit.intent().fly_dist, unit.stats().max_dist);
    }

    #[test]
    fn test_generate_path_shape() {
        let mut unit = Unit::looper(1, Position::new(30.0, 40.0, 0.0));
        unit.set_next_heading(90.0).unwrap();
        unit.set_fly_dist(200.0).unwrap();

        let path = unit.generate_path(100);
        assert_eq!(path.len(), 100);
        assert!(approx(path[0].x, 30.0) && approx(path[0].y, 40.0));
        assert!(path.iter().all(|p| p.heading == 90.0));
        for pair in path.windows(2) {
            assert!(approx(pair[0].point().distance(&pair[1].point()), 2.0));
            assert!(approx(pair[1].y - pair[0].y, 2.0));
        }
        // Path generation leaves the live position alone
        assert_eq!(unit.position(), Position::new(30.0, 40.0, 0.0));
    }

    #[test]
    fn test_generate_path_zero_frames() {
        let unit = Unit::looper(1, Position::default());
        assert!(unit.generate_path(0).is_empty());
    }

    #[test]
    fn test_planned_endpoint() {
        let mut unit = Unit::looper(1, Position::new(0.0, 0.0, 0.0));
        unit.set_fly_dist(250.0).unwrap();
        let end = unit.planned_endpoint();
        assert!(approx(end.x, 250.0) && approx(end.y, 0.0));
    }

    #[test]
    fn test_unit_id_from_unit() {
        let unit = Unit::looper(3, Position::default());
        assert_eq!(UnitId::from(&unit), UnitId(3));
        assert_eq!(UnitId(3).to_string(), "#3");
    }

    #[test]
    fn test_stats_validation() {
        assert!(UnitStats::default().validate().is_ok());
        let bad = UnitStats {
            max_dist: 0.0,
            ..UnitStats::default()
        };
        assert!(matches!(bad.validate(), Err(TacticsError::InvalidConfig(_))));
    }
}

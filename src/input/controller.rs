//! Pointer controller: drags on path markers become intents, drags on empty
//! space pan the camera.

use crate::battle::execution::TurnEngine;
use crate::battle::units::{Combatant, UnitId};
use crate::core::error::{Result, TacticsError};
use crate::core::types::Point;
use crate::input::hit_test::{pointer_marker_contains, unit_contains};
use crate::render::camera::Camera;
use crate::spatial::geometry::{distance, signed_angle};

/// Cursor the host should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorHint {
    #[default]
    Default,
    /// Over a unit hull
    Pointing,
    /// Over a path marker
    Normal,
    /// Panning
    Grabbing,
}

#[derive(Debug, Clone)]
pub struct PointerController {
    camera: Camera,
    grabbing: bool,
    guided: Option<UnitId>,
    cursor: CursorHint,
}

impl PointerController {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            grabbing: false,
            guided: None,
            cursor: CursorHint::Default,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn translation(&self) -> Point {
        self.camera.translation
    }

    /// Unit whose intent is being dragged
    pub fn guided(&self) -> Option<UnitId> {
        self.guided
    }

    pub fn is_grabbing(&self) -> bool {
        self.grabbing
    }

    pub fn cursor(&self) -> CursorHint {
        if self.grabbing {
            CursorHint::Grabbing
        } else {
            self.cursor
        }
    }

    /// Pan without a drag (keyboard scrolling); allowed in any phase
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.camera.pan(dx, dy);
    }

    /// Pan so the units sit in the middle of the viewport
    pub fn center_on_units(&mut self, engine: &TurnEngine) {
        let points: Vec<Point> = engine.units().iter().map(|u| u.position().point()).collect();
        self.camera.center_on(&points);
    }

    pub fn pointer_down(&mut self, engine: &TurnEngine, pointer: Point) {
        if engine.is_executing() {
            self.grabbing = true;
            return;
        }

        let translation = self.translation();
        let on_marker = engine
            .units()
            .iter()
            .find(|u| pointer_marker_contains(pointer, translation, u.state().pointer_position));

        if let Some(unit) = on_marker {
            self.guided = Some(unit.id());
            tracing::debug!(id = %unit.id(), "Guiding unit");
        } else if engine
            .units()
            .iter()
            .any(|u| unit_contains(pointer, translation, u))
        {
            // Pressing a hull neither pans nor guides
            self.grabbing = false;
        } else {
            self.grabbing = true;
        }
    }

    pub fn pointer_up(&mut self) {
        self.grabbing = false;
        self.guided = None;
        self.cursor = CursorHint::Default;
    }

    /// Handle a move to `pointer` (screen pixels) by `movement` since the
    /// last event. Returns whether the scene needs a redraw.
    pub fn pointer_move(
        &mut self,
        engine: &mut TurnEngine,
        pointer: Point,
        movement: Point,
    ) -> Result<bool> {
        if engine.is_executing() {
            // Only the camera moves during playback
            if self.grabbing {
                self.camera.pan(movement.x, movement.y);
                return Ok(true);
            }
            return Ok(false);
        }

        let mut redraw = false;
        let translation = self.translation();

        if let Some(id) = self.guided {
            self.steer(engine, id, pointer)?;
            redraw = true;
        } else if engine
            .units()
            .iter()
            .any(|u| unit_contains(pointer, translation, u))
        {
            self.cursor = CursorHint::Pointing;
        } else if engine
            .units()
            .iter()
            .any(|u| pointer_marker_contains(pointer, translation, u.state().pointer_position))
        {
            self.cursor = CursorHint::Normal;
        } else {
            self.cursor = CursorHint::Default;
        }

        if self.grabbing {
            self.camera.pan(movement.x, movement.y);
            redraw = true;
        }
        Ok(redraw)
    }

    /// Point the guided unit at the pointer and stretch its path to reach it
    fn steer(&self, engine: &mut TurnEngine, id: UnitId, pointer: Point) -> Result<()> {
        let unit = engine.unit(id).ok_or(TacticsError::UnitNotFound(id))?;
        let origin = unit.position().point();
        let horizontal = Point::new(origin.x + unit.stats().max_dist, origin.y);
        let target = self.camera.screen_to_world(pointer);

        match signed_angle(horizontal, origin, target) {
            Ok(heading) => engine.set_next_heading(id, heading)?,
            // Pointer right on the unit: keep the old heading
            Err(TacticsError::DegenerateGeometry) => {}
            Err(err) => return Err(err),
        }

        let reach = distance(self.camera.world_to_screen(origin), pointer);
        engine.set_fly_dist(id, reach)?;
        Ok(())
    }
}

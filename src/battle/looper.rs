//! Looper: a fast flier that fires on everything within range

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::battle::constants::POINTER_RADIUS;
use crate::battle::resolution::FrameState;
use crate::battle::units::{Combatant, Contact, UnitId, UnitKind, UnitState, UnitStats};
use crate::core::types::{Point, Position};
use crate::render::RenderSurface;

#[derive(Debug, Clone)]
pub struct Looper {
    state: UnitState,
    stats: UnitStats,
}

impl Looper {
    pub fn new(id: UnitId, position: Position) -> Self {
        Self::with_stats(id, position, UnitStats::default())
    }

    pub fn with_stats(id: UnitId, position: Position, stats: UnitStats) -> Self {
        Self {
            state: UnitState::new(id, position, &stats),
            stats,
        }
    }

    /// Trapezoid hull, nose forward along the heading
    fn draw_hull(&self, surface: &mut dyn RenderSurface) {
        let Position { x, y, heading } = self.state.position;
        let (w, h) = (self.stats.width, self.stats.height);

        surface.save();
        surface.translate(x, y);
        surface.rotate(heading.to_radians());
        surface.translate(-x, -y);
        // Hull coordinates are written nose-up
        surface.save();
        surface.translate(x, y);
        surface.rotate(FRAC_PI_2);
        surface.translate(-x, -y);

        surface.begin_path();
        surface.move_to(x - w / 2.0, y + h / 2.0);
        surface.line_to(x + w / 2.0, y + h / 2.0);
        surface.line_to(x + w / 4.0, y - h / 2.0);
        surface.line_to(x - w / 4.0, y - h / 2.0);
        surface.close_path();
        surface.stroke();

        surface.restore();
        surface.restore();
    }

    /// Planned path plus the draggable marker past its end
    fn draw_plan(&mut self, surface: &mut dyn RenderSurface) {
        let from = self.state.position;
        let end = self.planned_endpoint();

        surface.begin_path();
        surface.move_to(from.x, from.y);
        surface.line_to(end.x, end.y);
        surface.stroke();

        let marker = end.advanced(POINTER_RADIUS);
        surface.begin_path();
        surface.arc(marker.x, marker.y, POINTER_RADIUS, 0.0, TAU);
        surface.stroke();

        self.state.pointer_position = Some(end);

        if let Some(power) = self.state.powers.selected() {
            power.render(surface, from);
        }
    }

    fn draw_fire(&self, surface: &mut dyn RenderSurface, targets: &[Point]) {
        if targets.is_empty() {
            return;
        }
        let from = self.state.position;
        surface.begin_path();
        for target in targets {
            surface.move_to(from.x, from.y);
            surface.line_to(target.x, target.y);
        }
        surface.stroke();
    }
}

impl Combatant for Looper {
    fn state(&self) -> &UnitState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut UnitState {
        &mut self.state
    }

    fn stats(&self) -> &UnitStats {
        &self.stats
    }

    fn kind(&self) -> UnitKind {
        UnitKind::Looper
    }

    fn acquire_targets(&self, at: Position, contacts: &[Contact], out: &mut Vec<usize>) {
        let origin = at.point();
        out.extend(
            contacts
                .iter()
                .enumerate()
                .filter(|(_, c)| c.id != self.state.id)
                .filter(|(_, c)| origin.distance(&c.position.point()) <= self.stats.range)
                .map(|(i, _)| i),
        );
    }

    fn render(&mut self, surface: &mut dyn RenderSurface, frame: Option<&FrameState>) {
        match frame {
            Some(frame) => {
                self.state.position = frame.position;
                self.state.health = frame.health;
                self.draw_hull(surface);
                self.draw_fire(surface, &frame.fire_at);
            }
            None => {
                self.draw_hull(surface);
                if self.state.controllable {
                    self.draw_plan(surface);
                } else {
                    self.state.pointer_position = None;
                }
            }
        }
    }
}

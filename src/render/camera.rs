//! Camera pan for 2D rendering
//!
//! The battlefield is drawn in screen pixels shifted by an accumulated pan
//! translation. Panning never touches simulation state.

use crate::core::types::Point;

/// Camera configuration
#[derive(Debug, Clone)]
pub struct Camera {
    /// Accumulated pan offset in pixels (world → screen)
    pub translation: Point,
    /// Viewport size in pixels
    pub viewport_size: (f64, f64),
}

/// Axis-aligned bounding box in world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl WorldBounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Smallest box around `points`, grown by `padding` on every side
    pub fn around(points: &[Point], padding: f64) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;

        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(Self {
            min_x: min_x - padding,
            min_y: min_y - padding,
            max_x: max_x + padding,
            max_y: max_y + padding,
        })
    }
}

impl Camera {
    /// Create a camera with no pan
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            translation: Point::default(),
            viewport_size: (viewport_width, viewport_height),
        }
    }

    /// Convert world coordinates to screen coordinates
    pub fn world_to_screen(&self, world: Point) -> Point {
        world + self.translation
    }

    /// Convert screen coordinates to world coordinates
    pub fn screen_to_world(&self, screen: Point) -> Point {
        screen - self.translation
    }

    /// Pan the camera by a pointer movement in pixels
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.translation.x += dx;
        self.translation.y += dy;
    }

    /// Region of the world currently inside the viewport
    pub fn visible_bounds(&self) -> WorldBounds {
        let min = self.screen_to_world(Point::default());
        WorldBounds {
            min_x: min.x,
            min_y: min.y,
            max_x: min.x + self.viewport_size.0,
            max_y: min.y + self.viewport_size.1,
        }
    }

    /// Pan so the midpoint of `points` sits at the viewport center
    pub fn center_on(&mut self, points: &[Point]) {
        if points.is_empty() {
            return;
        }

        let sum_x: f64 = points.iter().map(|p| p.x).sum();
        let sum_y: f64 = points.iter().map(|p| p.y).sum();
        let count = points.len() as f64;

        self.translation = Point::new(
            self.viewport_size.0 / 2.0 - sum_x / count,
            self.viewport_size.1 / 2.0 - sum_y / count,
        );
    }
}

//! Rendering seam between the simulation and whatever draws it
//!
//! Units describe themselves through the canvas-like [`RenderSurface`]
//! primitives. The simulation never reads anything back from a surface.

pub mod camera;
pub mod stroke;
pub mod terminal;

pub use camera::{Camera, WorldBounds};
pub use stroke::{Affine, Segment, StrokeBuffer};
pub use terminal::TerminalSurface;

use crate::core::error::Result;

/// 2D drawing surface with canvas semantics.
///
/// Transforms compose onto the current matrix; `save`/`restore` push and
/// pop it. A path persists until the next `begin_path`, so stroking twice
/// draws it twice.
pub trait RenderSurface {
    /// Wipe everything drawn so far (ignores the current transform)
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f64, dy: f64);
    fn rotate(&mut self, radians: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn close_path(&mut self);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64);
    fn stroke(&mut self);

    /// Called once after every unit has drawn a frame
    fn present(&mut self) -> Result<()> {
        Ok(())
    }
}

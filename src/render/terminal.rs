//! Terminal render surface (ratatui canvas)
//!
//! Strokes are recorded in a [`StrokeBuffer`] and flushed to a braille
//! canvas on `present`. Screen y grows downwards while the ratatui canvas y
//! grows upwards, so y is negated on the way out.

use std::io::{self, Stdout};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    widgets::{
        canvas::{Canvas, Line},
        Block, Borders, Paragraph,
    },
    Terminal,
};

use crate::core::error::Result;
use crate::core::types::Point;
use crate::render::camera::WorldBounds;
use crate::render::stroke::StrokeBuffer;
use crate::render::RenderSurface;

pub struct TerminalSurface<B: Backend> {
    buffer: StrokeBuffer,
    terminal: Terminal<B>,
    bounds: WorldBounds,
    status: String,
    canvas_area: Rect,
}

impl TerminalSurface<CrosstermBackend<Stdout>> {
    /// Switch stdout to raw mode on the alternate screen
    pub fn enter(bounds: WorldBounds) -> Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        Ok(Self::with_terminal(terminal, bounds))
    }

    /// Give the terminal back to the shell
    pub fn leave(mut self) -> Result<()> {
        self.terminal.show_cursor()?;
        if let Err(err) = disable_raw_mode() {
            tracing::error!(?err, "failed to disable raw mode");
        }
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        Ok(())
    }
}

impl<B: Backend> TerminalSurface<B> {
    pub fn with_terminal(terminal: Terminal<B>, bounds: WorldBounds) -> Self {
        Self {
            buffer: StrokeBuffer::new(),
            terminal,
            bounds,
            status: String::new(),
            canvas_area: Rect::default(),
        }
    }

    /// Visible window of the battlefield, in screen pixels
    pub fn set_bounds(&mut self, bounds: WorldBounds) {
        self.bounds = bounds;
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// Text shown under the canvas on the next `present`
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn strokes(&self) -> &StrokeBuffer {
        &self.buffer
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }

    /// Map a terminal cell to a point in the visible window, if the cell
    /// lies on the canvas as of the last `present`
    pub fn cell_to_point(&self, column: u16, row: u16) -> Option<Point> {
        let area = self.canvas_area;
        if area.width == 0
            || area.height == 0
            || column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }
        let fx = (f64::from(column - area.x) + 0.5) / f64::from(area.width);
        let fy = (f64::from(row - area.y) + 0.5) / f64::from(area.height);
        Some(Point::new(
            fx * self.bounds.width(),
            fy * self.bounds.height(),
        ))
    }

    fn draw(&mut self) -> io::Result<()> {
        let segments = self.buffer.segments();
        let bounds = self.bounds;
        let status = self.status.as_str();
        let canvas_area = &mut self.canvas_area;

        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(3)])
                .split(f.size());

            let block = Block::default().borders(Borders::ALL).title("Battlefield");
            *canvas_area = block.inner(chunks[0]);

            let canvas = Canvas::default()
                .block(block)
                .x_bounds([bounds.min_x, bounds.max_x])
                .y_bounds([-bounds.max_y, -bounds.min_y])
                .paint(|ctx| {
                    for segment in segments {
                        ctx.draw(&Line {
                            x1: segment.from.x,
                            y1: -segment.from.y,
                            x2: segment.to.x,
                            y2: -segment.to.y,
                            color: Color::White,
                        });
                    }
                });
            f.render_widget(canvas, chunks[0]);

            let footer =
                Paragraph::new(status).block(Block::default().borders(Borders::ALL));
            f.render_widget(footer, chunks[1]);
        })?;
        Ok(())
    }
}

impl<B: Backend> RenderSurface for TerminalSurface<B> {
    fn clear(&mut self) {
        self.buffer.clear();
    }

    fn save(&mut self) {
        self.buffer.save();
    }

    fn restore(&mut self) {
        self.buffer.restore();
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.buffer.translate(dx, dy);
    }

    fn rotate(&mut self, radians: f64) {
        self.buffer.rotate(radians);
    }

    fn begin_path(&mut self) {
        self.buffer.begin_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.buffer.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.buffer.line_to(x, y);
    }

    fn close_path(&mut self) {
        self.buffer.close_path();
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) {
        self.buffer.arc(x, y, radius, start_angle, end_angle);
    }

    fn stroke(&mut self) {
        self.buffer.stroke();
    }

    fn present(&mut self) -> Result<()> {
        self.buffer.present()?;
        self.draw()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn surface() -> TerminalSurface<TestBackend> {
        let terminal = Terminal::new(TestBackend::new(40, 16)).unwrap();
        let bounds = WorldBounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 100.0,
            max_y: 100.0,
        };
        TerminalSurface::with_terminal(terminal, bounds)
    }

    #[test]
    fn test_present_draws_status_line() {
        let mut surface = surface();
        surface.set_status("frame 1/500");
        surface.begin_path();
        surface.move_to(10.0, 10.0);
        surface.line_to(90.0, 90.0);
        surface.stroke();
        surface.present().unwrap();

        let buffer = surface.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("frame 1/500"));
        assert!(text.contains("Battlefield"));
        assert_eq!(surface.strokes().presented_frames(), 1);
    }

    #[test]
    fn test_cell_to_point_inside_canvas_only() {
        let mut surface = surface();
        assert!(surface.cell_to_point(5, 5).is_none());
        surface.present().unwrap();

        // 40x16 terminal: canvas block is 40x13, bordered, so 38x11 inside
        let top_left = surface.cell_to_point(1, 1).unwrap();
        assert!((top_left.x - 0.5 / 38.0 * 100.0).abs() < 1e-9);
        assert!((top_left.y - 0.5 / 11.0 * 100.0).abs() < 1e-9);
        assert!(surface.cell_to_point(0, 0).is_none());
        assert!(surface.cell_to_point(39, 5).is_none());
    }

    #[test]
    fn test_clear_drops_recorded_strokes() {
        let mut surface = surface();
        surface.begin_path();
        surface.move_to(0.0, 0.0);
        surface.line_to(5.0, 5.0);
        surface.stroke();
        assert_eq!(surface.strokes().segments().len(), 1);
        surface.clear();
        assert!(surface.strokes().segments().is_empty());
    }
}

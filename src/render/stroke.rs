//! Headless render surface that records stroked line segments

use serde::Serialize;

use crate::core::error::Result;
use crate::core::types::Point;
use crate::render::RenderSurface;

/// Line segments used to approximate a full circle
const ARC_SEGMENTS: usize = 24;

/// 2D affine transform in canvas order: `x' = a·x + c·y + e`, `y' = b·x + d·y + f`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            e: self.e + self.a * dx + self.c * dy,
            f: self.f + self.b * dx + self.d * dy,
            ..self
        }
    }

    pub fn rotated(self, radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: self.a * cos + self.c * sin,
            b: self.b * cos + self.d * sin,
            c: self.c * cos - self.a * sin,
            d: self.d * cos - self.b * sin,
            ..self
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

/// A stroked line in device coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

/// One polyline of the current path
#[derive(Debug, Clone, Default)]
struct SubPath {
    points: Vec<Point>,
    closed: bool,
}

/// Records everything stroked since the last `clear`.
///
/// Used headless (runner, tests) and as the backing store of the terminal
/// surface.
#[derive(Debug, Default)]
pub struct StrokeBuffer {
    transform: Affine,
    stack: Vec<Affine>,
    path: Vec<SubPath>,
    segments: Vec<Segment>,
    presented: u64,
}

impl StrokeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments stroked since the last clear
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of completed frames handed to `present`
    pub fn presented_frames(&self) -> u64 {
        self.presented
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    fn push_point(&mut self, point: Point, start_new: bool) {
        if start_new || self.path.is_empty() {
            self.path.push(SubPath::default());
        }
        if let Some(sub) = self.path.last_mut() {
            sub.points.push(point);
        }
    }
}

impl RenderSurface for StrokeBuffer {
    fn clear(&mut self) {
        self.segments.clear();
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(transform) = self.stack.pop() {
            self.transform = transform;
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.transform = self.transform.translated(dx, dy);
    }

    fn rotate(&mut self, radians: f64) {
        self.transform = self.transform.rotated(radians);
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let point = self.transform.apply(x, y);
        self.push_point(point, true);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let point = self.transform.apply(x, y);
        self.push_point(point, false);
    }

    fn close_path(&mut self) {
        let reopen = match self.path.last_mut() {
            Some(sub) if !sub.points.is_empty() => {
                sub.closed = true;
                sub.points.first().copied()
            }
            _ => None,
        };
        // Drawing continues from the start of the closed sub-path
        if let Some(start) = reopen {
            self.path.push(SubPath {
                points: vec![start],
                closed: false,
            });
        }
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) {
        let sweep = end_angle - start_angle;
        let steps = ((sweep.abs() / std::f64::consts::TAU) * ARC_SEGMENTS as f64)
            .ceil()
            .max(1.0) as usize;
        for step in 0..=steps {
            let angle = start_angle + sweep * step as f64 / steps as f64;
            let point = self
                .transform
                .apply(x + radius * angle.cos(), y + radius * angle.sin());
            // Canvas connects an arc to an existing sub-path with a line
            self.push_point(point, false);
        }
    }

    fn stroke(&mut self) {
        for sub in &self.path {
            for pair in sub.points.windows(2) {
                self.segments.push(Segment {
                    from: pair[0],
                    to: pair[1],
                });
            }
            if sub.closed && sub.points.len() > 2 {
                if let (Some(&last), Some(&first)) = (sub.points.last(), sub.points.first()) {
                    self.segments.push(Segment { from: last, to: first });
                }
            }
        }
    }

    fn present(&mut self) -> Result<()> {
        self.presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(p: Point, x: f64, y: f64) -> bool {
        (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9
    }

    #[test]
    fn test_line_is_recorded_on_stroke() {
        let mut buffer = StrokeBuffer::new();
        buffer.begin_path();
        buffer.move_to(0.0, 0.0);
        buffer.line_to(10.0, 0.0);
        assert!(buffer.segments().is_empty());
        buffer.stroke();
        assert_eq!(buffer.segments().len(), 1);
    }

    #[test]
    fn test_closed_path_strokes_back_to_start() {
        let mut buffer = StrokeBuffer::new();
        buffer.begin_path();
        buffer.move_to(0.0, 0.0);
        buffer.line_to(10.0, 0.0);
        buffer.line_to(10.0, 10.0);
        buffer.close_path();
        buffer.stroke();
        assert_eq!(buffer.segments().len(), 3);
        let closing = buffer.segments()[2];
        assert!(approx(closing.to, 0.0, 0.0));
    }

    #[test]
    fn test_rotation_about_point() {
        // Rotate 90 degrees about (5, 5), the pattern units use for their hull
        let mut buffer = StrokeBuffer::new();
        buffer.save();
        buffer.translate(5.0, 5.0);
        buffer.rotate(std::f64::consts::FRAC_PI_2);
        buffer.translate(-5.0, -5.0);
        buffer.begin_path();
        buffer.move_to(5.0, 5.0);
        buffer.line_to(15.0, 5.0);
        buffer.stroke();
        buffer.restore();

        let segment = buffer.segments()[0];
        assert!(approx(segment.from, 5.0, 5.0));
        assert!(approx(segment.to, 5.0, 15.0));
        assert_eq!(buffer.transform(), Affine::IDENTITY);
    }

    #[test]
    fn test_full_arc_is_closed_ring() {
        let mut buffer = StrokeBuffer::new();
        buffer.begin_path();
        buffer.arc(0.0, 0.0, 10.0, 0.0, std::f64::consts::TAU);
        buffer.stroke();
        let segments = buffer.segments();
        assert_eq!(segments.len(), ARC_SEGMENTS);
        assert!(approx(segments[0].from, 10.0, 0.0));
        let last = segments[segments.len() - 1];
        assert!((last.to.x - 10.0).abs() < 1e-9 && last.to.y.abs() < 1e-9);
    }

    #[test]
    fn test_clear_keeps_transform_stack() {
        let mut buffer = StrokeBuffer::new();
        buffer.translate(3.0, 4.0);
        buffer.begin_path();
        buffer.move_to(0.0, 0.0);
        buffer.line_to(1.0, 0.0);
        buffer.stroke();
        buffer.clear();
        assert!(buffer.segments().is_empty());
        assert_eq!(buffer.transform().e, 3.0);
    }

    #[test]
    fn test_present_counts_frames() {
        let mut buffer = StrokeBuffer::new();
        buffer.present().unwrap();
        buffer.present().unwrap();
        assert_eq!(buffer.presented_frames(), 2);
    }
}

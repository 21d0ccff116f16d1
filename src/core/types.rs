//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation frame index within a turn
pub type Frame = usize;

/// 2D point without orientation (targets, pointer locations)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl std::ops::Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

/// Where a unit is and which way it faces.
///
/// Screen convention: +x right, +y down, heading in degrees with 0 along +x
/// and 90 along +y.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Unit vector along `heading`
    pub fn direction(&self) -> Point {
        let radians = self.heading.to_radians();
        Point::new(radians.cos(), radians.sin())
    }

    /// Same heading, moved `distance` along it
    pub fn advanced(&self, distance: f64) -> Self {
        let dir = self.direction();
        Self {
            x: self.x + dir.x * distance,
            y: self.y + dir.y * distance,
            heading: self.heading,
        }
    }
}

impl From<Position> for Point {
    fn from(position: Position) -> Self {
        position.point()
    }
}

//! Spatial helpers shared by the simulation and the input layer

pub mod geometry;

pub use geometry::{distance, point_in_circle, point_in_oriented_rect, signed_angle};

//! Input layer: pointer events in, intents and camera pans out

pub mod controller;

pub use controller::{CursorHint, PointerController};
pub use hit_test::{pointer_marker_contains, unit_contains};

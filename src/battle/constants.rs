//! Battle constants - tunable values in one place

// Turn timing
pub const DEFAULT_FRAMES_PER_TURN: usize = 500;
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

// Units
pub const STARTING_HEALTH: i32 = 100;
/// A unit always flies at least this fraction of its max distance
pub const MIN_FLY_FRACTION: f64 = 0.25;

// Looper tuning
pub const LOOPER_MAX_DIST: f64 = 500.0;
pub const LOOPER_RANGE: f64 = 100.0;
pub const LOOPER_DAMAGE: i32 = 100;
pub const LOOPER_WIDTH: f64 = 30.0;
pub const LOOPER_HEIGHT: f64 = 10.0;

// Input
/// Radius of the draggable marker at the end of a planned path
pub const POINTER_RADIUS: f64 = 10.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_fly_fraction_in_unit_interval() {
        assert!(MIN_FLY_FRACTION > 0.0 && MIN_FLY_FRACTION < 1.0);
    }

    #[test]
    fn test_looper_hull_wider_than_deep() {
        assert!(LOOPER_WIDTH > LOOPER_HEIGHT);
    }
}

//! Power-ups a unit can hold and arm for its next turn
//!
//! Powers are inventory only: arming one changes what the idle render
//! shows, never how a turn resolves.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, TacticsError};
use crate::core::types::Position;
use crate::render::RenderSurface;

/// Radius of the ring drawn around a unit with Spin360 armed
const SPIN_MARKER_RADIUS: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerKind {
    Spin360,
}

impl PowerKind {
    pub const ALL: [PowerKind; 1] = [PowerKind::Spin360];

    pub fn name(&self) -> &'static str {
        match self {
            PowerKind::Spin360 => "360",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PowerKind::Spin360 => "Spin 360 Degrees over the duration of your turn",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Draw the armed-power marker around a unit
    pub fn render(&self, surface: &mut dyn RenderSurface, at: Position) {
        match self {
            PowerKind::Spin360 => {
                // Open ring with a gap at the unit's heading
                let start = at.heading.to_radians() + 0.5;
                surface.begin_path();
                surface.arc(
                    at.x,
                    at.y,
                    SPIN_MARKER_RADIUS,
                    start,
                    start + std::f64::consts::TAU - 1.0,
                );
                surface.stroke();
            }
        }
    }
}

/// Per-unit power counts plus the currently armed power
#[derive(Debug, Clone, Default)]
pub struct PowerInventory {
    counts: AHashMap<PowerKind, u32>,
    selected: Option<PowerKind>,
}

impl PowerInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: PowerKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Add one charge; returns the new count
    pub fn grant(&mut self, kind: PowerKind) -> u32 {
        let count = self.counts.entry(kind).or_insert(0);
        *count += 1;
        *count
    }

    pub fn selected(&self) -> Option<PowerKind> {
        self.selected
    }

    /// Arm a power, or disarm with `None`.
    ///
    /// Re-selecting the armed power is a no-op. A power without charges
    /// cannot be armed.
    pub fn select(&mut self, power: Option<PowerKind>) -> Result<()> {
        match power {
            None => self.selected = None,
            Some(kind) if self.selected == Some(kind) => {}
            Some(kind) => {
                if self.count(kind) == 0 {
                    return Err(TacticsError::PowerUnavailable(kind.name().to_string()));
                }
                self.selected = Some(kind);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::StrokeBuffer;

    #[test]
    fn test_spin360_metadata() {
        assert_eq!(PowerKind::Spin360.name(), "360");
        assert_eq!(
            PowerKind::Spin360.description(),
            "Spin 360 Degrees over the duration of your turn"
        );
        assert_eq!(PowerKind::from_name("360"), Some(PowerKind::Spin360));
        assert_eq!(PowerKind::from_name("720"), None);
    }

    #[test]
    fn test_cannot_select_without_charges() {
        let mut inventory = PowerInventory::new();
        let result = inventory.select(Some(PowerKind::Spin360));
        assert!(matches!(result, Err(TacticsError::PowerUnavailable(_))));
        assert_eq!(inventory.selected(), None);
    }

    #[test]
    fn test_select_and_clear() {
        let mut inventory = PowerInventory::new();
        assert_eq!(inventory.grant(PowerKind::Spin360), 1);
        inventory.select(Some(PowerKind::Spin360)).unwrap();
        assert_eq!(inventory.selected(), Some(PowerKind::Spin360));

        // Selecting again changes nothing
        inventory.select(Some(PowerKind::Spin360)).unwrap();
        assert_eq!(inventory.selected(), Some(PowerKind::Spin360));

        inventory.select(None).unwrap();
        assert_eq!(inventory.selected(), None);
        assert_eq!(inventory.count(PowerKind::Spin360), 1);
    }

    #[test]
    fn test_spin_marker_draws_ring() {
        let mut buffer = StrokeBuffer::new();
        PowerKind::Spin360.render(&mut buffer, Position::new(50.0, 50.0, 0.0));
        assert!(!buffer.segments().is_empty());
        for segment in buffer.segments() {
            let r = segment.from.distance(&crate::core::types::Point::new(50.0, 50.0));
            assert!((r - SPIN_MARKER_RADIUS).abs() < 1e-9);
        }
    }
}

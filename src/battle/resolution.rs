//! Turn resolution: intents in, per-frame world states out
//!
//! Within a frame everything is simultaneous. All units move, then all
//! units pick targets against that one snapshot, then damage lands.
//! Resolution is pure; units are only read.

use serde::Serialize;

use crate::battle::units::{Combatant, Contact, Unit, UnitId};
use crate::core::types::{Frame, Point, Position};

/// One unit at one frame of a resolved turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameState {
    pub position: Position,
    /// Where this unit's shots land this frame
    pub fire_at: Vec<Point>,
    pub health: i32,
}

/// Resolved turn: `frame × unit` grid of [`FrameState`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameTable {
    unit_ids: Vec<UnitId>,
    initial_health: Vec<i32>,
    frames: Vec<Vec<FrameState>>,
}

impl FrameTable {
    /// Column order, matching the roster order at resolution time
    pub fn unit_ids(&self) -> &[UnitId] {
        &self.unit_ids
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn unit_count(&self) -> usize {
        self.unit_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, frame: Frame) -> Option<&[FrameState]> {
        self.frames.get(frame).map(Vec::as_slice)
    }

    pub fn get(&self, frame: Frame, unit: usize) -> Option<&FrameState> {
        self.frames.get(frame).and_then(|row| row.get(unit))
    }

    pub fn column_of(&self, id: UnitId) -> Option<usize> {
        self.unit_ids.iter().position(|&u| u == id)
    }

    /// Health before frame 0
    pub fn initial_health(&self, unit: usize) -> Option<i32> {
        self.initial_health.get(unit).copied()
    }

    /// Health of one unit across every frame
    pub fn health_track(&self, unit: usize) -> Vec<i32> {
        self.frames
            .iter()
            .filter_map(|row| row.get(unit).map(|s| s.health))
            .collect()
    }

    pub fn final_states(&self) -> Option<&[FrameState]> {
        self.frames.last().map(Vec::as_slice)
    }

    pub fn frames(&self) -> impl Iterator<Item = &[FrameState]> {
        self.frames.iter().map(Vec::as_slice)
    }
}

/// Resolve one turn into `frames_per_turn` frames.
///
/// Cost is `frames × units²` for targeting. Scratch buffers are allocated
/// once and reused for every frame.
pub fn resolve_turn(units: &[Unit], frames_per_turn: usize) -> FrameTable {
    let count = units.len();
    let paths: Vec<Vec<Position>> = units
        .iter()
        .map(|u| u.generate_path(frames_per_turn))
        .collect();

    let mut contacts: Vec<Contact> = units
        .iter()
        .map(|u| Contact {
            id: u.id(),
            position: u.position(),
        })
        .collect();
    let mut targets: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut damage: Vec<i32> = vec![0; count];
    let initial_health: Vec<i32> = units.iter().map(|u| u.health()).collect();
    let mut health = initial_health.clone();

    let mut frames = Vec::with_capacity(frames_per_turn);
    for f in 0..frames_per_turn {
        // Movement commit
        for (contact, path) in contacts.iter_mut().zip(&paths) {
            contact.position = path[f];
        }

        // Targeting against the committed snapshot
        for (i, unit) in units.iter().enumerate() {
            targets[i].clear();
            unit.acquire_targets(contacts[i].position, &contacts, &mut targets[i]);
        }

        // Damage
        damage.fill(0);
        for (source, hits) in targets.iter().enumerate() {
            let dealt = units[source].stats().damage;
            for &target in hits {
                if target != source {
                    damage[target] = damage[target].saturating_add(dealt);
                }
            }
        }

        let row: Vec<FrameState> = (0..count)
            .map(|i| {
                // Health is unclamped but pinned at i32::MIN
                health[i] = health[i].saturating_sub(damage[i]);
                FrameState {
                    position: contacts[i].position,
                    fire_at: targets[i]
                        .iter()
                        .map(|&t| contacts[t].position.point())
                        .collect(),
                    health: health[i],
                }
            })
            .collect();
        frames.push(row);
    }

    tracing::debug!(
        frames = frames_per_turn,
        units = count,
        "Resolved turn"
    );

    FrameTable {
        unit_ids: contacts.iter().map(|c| c.id).collect(),
        initial_health,
        frames,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::looper::Looper;
    use crate::battle::units::UnitStats;

    fn escort(id: u32, x: f64, y: f64, range: f64, damage: i32) -> Unit {
        let stats = UnitStats {
            range,
            damage,
            ..UnitStats::default()
        };
        // Every unit flies the same heading and distance, so separations hold
        Looper::with_stats(UnitId(id), Position::new(x, y, 0.0), stats).into()
    }

    #[test]
    fn test_table_shape() {
        let units = vec![
            Unit::looper(1, Position::new(0.0, 0.0, 0.0)),
            Unit::looper(2, Position::new(1000.0, 0.0, 0.0)),
            Unit::looper(3, Position::new(0.0, 1000.0, 0.0)),
        ];
        let table = resolve_turn(&units, 50);
        assert_eq!(table.frame_count(), 50);
        assert_eq!(table.unit_count(), 3);
        assert!(table.frames().all(|row| row.len() == 3));
        assert_eq!(table.unit_ids(), &[UnitId(1), UnitId(2), UnitId(3)]);
    }

    #[test]
    fn test_symmetric_simultaneous_fire() {
        let units = vec![
            escort(1, 0.0, 0.0, 100.0, 10),
            escort(2, 50.0, 0.0, 100.0, 10),
        ];
        let table = resolve_turn(&units, 1);
        let row = table.frame(0).unwrap();
        assert_eq!(row[0].health, 90);
        assert_eq!(row[1].health, 90);
        assert_eq!(row[0].fire_at, vec![Point::new(50.0, 0.0)]);
        assert_eq!(row[1].fire_at, vec![Point::new(0.0, 0.0)]);
    }

    #[test]
    fn test_health_recurrence() {
        let units = vec![
            escort(1, 0.0, 0.0, 100.0, 3),
            escort(2, 60.0, 0.0, 100.0, 5),
        ];
        let table = resolve_turn(&units, 30);
        for unit in 0..2 {
            let track = table.health_track(unit);
            let mut previous = table.initial_health(unit).unwrap();
            for f in 0..track.len() {
                let received: i32 = table
                    .frame(f)
                    .unwrap()
                    .iter()
                    .enumerate()
                    .filter(|(s, state)| {
                        *s != unit
                            && state.fire_at.contains(&table.get(f, unit).unwrap().position.point())
                    })
                    .map(|(s, _)| units[s].stats().damage)
                    .sum();
                assert_eq!(track[f], previous - received);
                previous = track[f];
            }
        }
        // Health is not clamped at zero
        assert!(table.final_states().unwrap()[0].health < 0);
    }

    #[test]
    fn test_huge_damage_saturates() {
        let units = vec![
            escort(1, 0.0, 0.0, 100.0, 2_000_000_000),
            escort(2, 50.0, 0.0, 100.0, 2_000_000_000),
            escort(3, 0.0, 50.0, 100.0, 2_000_000_000),
        ];
        let table = resolve_turn(&units, 3);
        for unit in 0..3 {
            let track = table.health_track(unit);
            assert!(track[0] < 0);
            assert!(track.windows(2).all(|w| w[1] <= w[0]));
            assert_eq!(track[2], i32::MIN);
        }
    }

    #[test]
    fn test_out_of_range_health_constant() {
        let units = vec![
            escort(1, 0.0, 0.0, 100.0, 10),
            escort(2, 0.0, 500.0, 100.0, 10),
        ];
        let table = resolve_turn(&units, 100);
        assert!(table.health_track(0).iter().all(|&h| h == 100));
        assert!(table.health_track(1).iter().all(|&h| h == 100));
    }

    #[test]
    fn test_resolution_does_not_touch_units() {
        let units = vec![Unit::looper(1, Position::new(5.0, 5.0, 0.0))];
        let before = units[0].position();
        let _ = resolve_turn(&units, 10);
        assert_eq!(units[0].position(), before);
    }

    #[test]
    fn test_empty_roster() {
        let table = resolve_turn(&[], 500);
        assert_eq!(table.frame_count(), 500);
        assert_eq!(table.unit_count(), 0);
    }

    #[test]
    fn test_deterministic() {
        let units = vec![
            Unit::looper(1, Position::new(0.0, 0.0, 0.0)),
            Unit::looper(2, Position::new(300.0, 10.0, 180.0)),
        ];
        assert_eq!(resolve_turn(&units, 200), resolve_turn(&units, 200));
    }
}

//! Starting setups: built-in layouts, seeded random layouts and TOML files
//!
//! Files live in `data/scenarios/{name}.toml`. A scenario is a setup input
//! only; nothing is ever written back.

use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashSet;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battle::constants::{LOOPER_MAX_DIST, MIN_FLY_FRACTION};
use crate::battle::execution::TurnEngine;
use crate::battle::units::{Combatant, Team, Unit, UnitId, UnitKind};
use crate::core::config::GameConfig;
use crate::core::error::{Result, TacticsError};
use crate::core::types::Position;
use crate::render::WorldBounds;

/// Spacing of the diagonal layout, in pixels
const DIAGONAL_STEP: f64 = 30.0;

/// One unit as written in a scenario file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSpec {
    pub id: UnitId,
    #[serde(default)]
    pub kind: UnitKind,
    #[serde(default)]
    pub team: Team,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub heading: f64,
    #[serde(default)]
    pub next_heading: f64,
    /// Defaults to the unit's max distance
    #[serde(default)]
    pub fly_dist: Option<f64>,
    #[serde(default = "default_controllable")]
    pub controllable: bool,
}

fn default_controllable() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub units: Vec<UnitSpec>,
}

impl Scenario {
    /// Units strung along the diagonal, each steering a little further down
    pub fn diagonal(count: u32) -> Self {
        let units = (0..count)
            .map(|i| {
                let step = f64::from(i + 1);
                UnitSpec {
                    id: UnitId(i),
                    kind: UnitKind::Looper,
                    team: Team::Red,
                    x: step * DIAGONAL_STEP,
                    y: step * DIAGONAL_STEP,
                    heading: 0.0,
                    next_heading: f64::from((i + 1) * 20 % 90),
                    fly_dist: None,
                    controllable: true,
                }
            })
            .collect();

        Self {
            name: "diagonal".into(),
            units,
        }
    }

    /// Deterministic random layout inside `bounds`; teams alternate
    pub fn random(count: u32, seed: u64, bounds: WorldBounds) -> Result<Self> {
        let spans = [
            ("x", bounds.min_x, bounds.max_x),
            ("y", bounds.min_y, bounds.max_y),
        ];
        for (axis, min, max) in spans {
            if !(min <= max && (max - min).is_finite()) {
                return Err(TacticsError::InvalidConfig(format!(
                    "random layout needs finite {axis} bounds with min <= max, got {min}..{max}"
                )));
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let min_fly = MIN_FLY_FRACTION * LOOPER_MAX_DIST;
        let units = (0..count)
            .map(|i| {
                let heading: f64 = rng.gen_range(0.0..360.0);
                UnitSpec {
                    id: UnitId(i),
                    kind: UnitKind::Looper,
                    team: if i % 2 == 0 { Team::Red } else { Team::Blue },
                    x: rng.gen_range(bounds.min_x..=bounds.max_x),
                    y: rng.gen_range(bounds.min_y..=bounds.max_y),
                    heading,
                    next_heading: heading + rng.gen_range(-90.0..=90.0),
                    fly_dist: Some(rng.gen_range(min_fly..=LOOPER_MAX_DIST)),
                    controllable: true,
                }
            })
            .collect();

        Ok(Self {
            name: format!("random-{seed}"),
            units,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let scenario = Self::from_toml_str(&contents)?;
        tracing::debug!(units = scenario.units.len(), "Loaded scenario from {:?}", path);
        Ok(scenario)
    }

    /// Ids must be unique and coordinates finite
    pub fn validate(&self) -> Result<()> {
        let mut seen = AHashSet::new();
        for spec in &self.units {
            if !seen.insert(spec.id) {
                return Err(TacticsError::InvalidConfig(format!(
                    "scenario '{}' lists unit {} twice",
                    self.name, spec.id
                )));
            }
            let values = [spec.x, spec.y, spec.heading, spec.next_heading];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(TacticsError::InvalidConfig(format!(
                    "unit {} has a non-finite position or heading",
                    spec.id
                )));
            }
        }
        Ok(())
    }

    /// Build units with the tuning from `config`
    pub fn build_units(&self, config: &GameConfig) -> Result<Vec<Unit>> {
        self.units
            .iter()
            .map(|spec| -> Result<Unit> {
                let position = Position::new(spec.x, spec.y, spec.heading);
                let mut unit = Unit::new(spec.kind, spec.id, position, config.looper.clone());
                let state = unit.state_mut();
                state.team = spec.team;
                state.controllable = spec.controllable;
                unit.set_next_heading(spec.next_heading)?;
                if let Some(dist) = spec.fly_dist {
                    unit.set_fly_dist(dist)?;
                }
                Ok(unit)
            })
            .collect()
    }

    /// Add every unit to `engine`; returns how many were new
    pub fn populate(&self, engine: &mut TurnEngine, config: &GameConfig) -> Result<usize> {
        let mut added = 0;
        for unit in self.build_units(config)? {
            if engine.add_unit(unit)? {
                added += 1;
            }
        }
        tracing::info!(scenario = %self.name, added, "Scenario populated");
        Ok(added)
    }
}

/// Load `data/scenarios/{name}.toml`
pub fn load_scenario(name: &str) -> Result<Scenario> {
    let mut scenario = Scenario::load(&scenario_path(name))?;
    scenario.name = name.to_string();
    Ok(scenario)
}

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from("data/scenarios").join(format!("{}.toml", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> WorldBounds {
        WorldBounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 800.0,
            max_y: 600.0,
        }
    }

    #[test]
    fn test_diagonal_layout() {
        let scenario = Scenario::diagonal(10);
        assert_eq!(scenario.units.len(), 10);
        let third = &scenario.units[2];
        assert_eq!(third.id, UnitId(2));
        assert_eq!((third.x, third.y), (90.0, 90.0));
        assert_eq!(third.next_heading, 60.0);
        // (5 * 20) % 90
        assert_eq!(scenario.units[4].next_heading, 10.0);
    }

    #[test]
    fn test_random_is_deterministic() {
        let a = Scenario::random(6, 42, bounds()).unwrap();
        let b = Scenario::random(6, 42, bounds()).unwrap();
        let c = Scenario::random(6, 43, bounds()).unwrap();
        let xs = |s: &Scenario| s.units.iter().map(|u| u.x).collect::<Vec<_>>();
        assert_eq!(xs(&a), xs(&b));
        assert_ne!(xs(&a), xs(&c));
        assert!(a.units.iter().all(|u| u.x >= 0.0 && u.x <= 800.0));
    }

    #[test]
    fn test_random_fly_dist_within_clamp() {
        let config = GameConfig::default();
        let units = Scenario::random(20, 7, bounds())
            .unwrap()
            .build_units(&config)
            .unwrap();
        for unit in &units {
            let dist = unit.intent().fly_dist;
            assert!(dist >= 0.25 * config.looper.max_dist && dist <= config.looper.max_dist);
        }
    }

    #[test]
    fn test_random_rejects_bad_bounds() {
        let inverted = WorldBounds {
            min_x: 800.0,
            max_x: 0.0,
            ..bounds()
        };
        let nan = WorldBounds {
            max_y: f64::NAN,
            ..bounds()
        };
        let infinite = WorldBounds {
            min_x: f64::NEG_INFINITY,
            ..bounds()
        };
        let too_wide = WorldBounds {
            min_y: f64::MIN,
            max_y: f64::MAX,
            ..bounds()
        };
        for bad in [inverted, nan, infinite, too_wide] {
            assert!(matches!(
                Scenario::random(4, 1, bad),
                Err(TacticsError::InvalidConfig(_))
            ));
        }

        // A zero-width strip is still a valid layout
        let line = WorldBounds {
            min_x: 100.0,
            max_x: 100.0,
            ..bounds()
        };
        let scenario = Scenario::random(3, 1, line).unwrap();
        assert!(scenario.units.iter().all(|u| u.x == 100.0));
    }

    #[test]
    fn test_build_units_applies_file_values() {
        let scenario = Scenario::from_toml_str(
            r#"
            name = "inline"

            [[units]]
            id = 5
            team = "blue"
            x = 10.0
            y = 20.0
            next_heading = 45.0
            fly_dist = 10.0
            controllable = false
            "#,
        )
        .unwrap();
        let units = scenario.build_units(&GameConfig::default()).unwrap();
        let unit = &units[0];
        assert_eq!(unit.id(), UnitId(5));
        assert_eq!(unit.state().team, Team::Blue);
        assert!(!unit.state().controllable);
        assert_eq!(unit.intent().next_heading, 45.0);
        // Clamped to a quarter of max distance
        assert_eq!(unit.intent().fly_dist, 125.0);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Scenario::from_toml_str(
            r#"
            name = "dupes"
            [[units]]
            id = 1
            x = 0.0
            y = 0.0
            [[units]]
            id = 1
            x = 5.0
            y = 5.0
            "#,
        );
        assert!(matches!(result, Err(TacticsError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_shipped_scenarios() {
        for name in ["duel", "crossing"] {
            let scenario = load_scenario(name).expect("shipped scenario should load");
            assert_eq!(scenario.name, name);
            assert!(!scenario.units.is_empty());
        }
    }
}

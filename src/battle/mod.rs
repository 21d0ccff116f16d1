//! Battle system - simultaneous turn resolution and paced playback
//!
//! A turn is decided before it is shown:
//! - Every unit commits an intent (heading + distance) while the engine is idle
//! - The whole turn is resolved into a frame table in one pass
//! - The table is replayed one frame per clock tick
//! - Movement, targeting and damage are simultaneous within a frame

pub mod constants;
pub mod execution;
pub mod looper;
pub mod playback;
pub mod powers;
pub mod resolution;
pub mod scenario;
pub mod units;

// Re-exports for convenient access
pub use constants::*;
pub use execution::{
    TurnEngine, TurnEvent, TurnEventType, TurnPhase, TurnSummary, UnitOutcome, UnitRef,
};
pub use looper::Looper;
pub use playback::{
    CancelToken, FrameClock, FramePacer, ImmediateClock, IntervalClock, Playback,
    PlaybackStatus,
};
pub use powers::{PowerInventory, PowerKind};
pub use resolution::{resolve_turn, FrameState, FrameTable};
pub use scenario::{load_scenario, Scenario, UnitSpec};
pub use units::{
    Combatant, Contact, Intent, Team, Unit, UnitId, UnitKind, UnitState, UnitStats,
};

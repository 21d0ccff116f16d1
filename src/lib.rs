//! Looper Tactics - simultaneous turn-based tactical combat

pub mod battle;
pub mod core;
pub mod input;
pub mod render;
pub mod spatial;

pub mod config;
pub mod error;
pub mod types;

pub use config::{EngineConfig, GameConfig};
pub use error::{Result, TacticsError};
pub use types::{Frame, Point, Position};

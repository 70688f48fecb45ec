//! Math Muncher - a grid arithmetic game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (board generation, enemies, round control)
//! - `settings`: Game configuration and validation
//! - `error`: Configuration errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::{GameConfig, Timings};

/// Game configuration constants
pub mod consts {
    /// Default board size
    pub const GRID_WIDTH: usize = 6;
    pub const GRID_HEIGHT: usize = 5;

    /// Points per correct cell are this times the level
    pub const POINTS_PER_LEVEL: u64 = 10;

    /// Virtual milliseconds per step of the headless demo
    pub const DEMO_STEP_MS: u64 = 100;
}

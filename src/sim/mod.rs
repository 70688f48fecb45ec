//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Time only arrives through the [`Scheduler`]
//! - Stable iteration order (by enemy index)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod controller;
pub mod entities;
pub mod grid;
pub mod puzzle;
pub mod scheduler;
pub mod snapshot;
pub mod state;

pub use autopilot::next_intent;
pub use controller::{FACTOR_TARGETS, GameEvent, Intent, RoundController};
pub use entities::{Enemy, EnemyWarning, EntrySide, SafeZone};
pub use grid::{Cell, CellContent, Direction, Grid, Operator, Position};
pub use puzzle::{Comparison, Mode, Puzzle};
pub use scheduler::{Scheduler, Timer, TimerHandle, VirtualClock};
pub use snapshot::Snapshot;
pub use state::{GamePhase, GameState, RoundState};

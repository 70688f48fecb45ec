//! Configuration errors
//!
//! Gameplay never fails: bad input during play is absorbed as a no-op. The only
//! errors are configurations that could not produce a solvable board.

use thiserror::Error;

use crate::sim::Mode;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },

    #[error("grid has {cells} cells but at least {required} correct cells are required")]
    TooFewCells { cells: usize, required: usize },

    #[error("{entities} entities (player, safe zones, enemies) do not fit on {cells} cells")]
    Overcrowded { entities: usize, cells: usize },

    #[error("starting lives must be at least 1")]
    NoLives,

    #[error("correct cell chance must lie in [0, 1], got {0}")]
    BadChance(f64),

    #[error("target {target} is degenerate for {mode} mode (minimum {minimum})")]
    DegenerateTarget { target: i32, mode: Mode, minimum: i32 },

    #[error("inequality mode needs a comparison operator")]
    MissingOperator,

    #[error("unknown game mode: {0:?}")]
    UnknownMode(String),

    #[error("malformed config: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err.to_string())
    }
}

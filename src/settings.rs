//! Game configuration
//!
//! The menu only chooses mode, enemy count and safe-zone count; everything
//! else has defaults matching the classic board.

use serde::{Deserialize, Serialize};

use crate::consts::{GRID_HEIGHT, GRID_WIDTH};
use crate::error::ConfigError;
use crate::sim::Mode;

/// Timer periods and delays, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub enemy_move_ms: u64,
    /// Warning countdown tick; also the amount subtracted per tick
    pub warning_tick_ms: u64,
    pub safe_zone_move_ms: u64,
    /// Delay before the first enemy enters
    pub entry_base_ms: u64,
    /// Extra delay per subsequent enemy
    pub entry_stagger_ms: u64,
    pub level_transition_ms: u64,
    pub freeze_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            enemy_move_ms: 800,
            warning_tick_ms: 100,
            safe_zone_move_ms: 3000,
            entry_base_ms: 1500,
            entry_stagger_ms: 1000,
            level_transition_ms: 1000,
            freeze_ms: 2000,
        }
    }
}

/// Everything needed to start a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub mode: Mode,
    pub num_enemies: usize,
    pub num_safe_zones: usize,

    // === Board ===
    pub grid_width: usize,
    pub grid_height: usize,
    /// Each cell is generated correct with this probability
    pub correct_cell_chance: f64,
    pub min_correct_cells: usize,

    // === Rules ===
    pub starting_lives: u32,
    /// Respawn without waiting for acknowledgment after this delay
    pub auto_respawn_ms: Option<u64>,
    /// A wrong answer also costs a life (on top of the freeze)
    pub wrong_answer_costs_life: bool,
    /// Clearing this level wins the game; None plays forever
    pub max_level: Option<u32>,

    pub timings: Timings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Equals,
            num_enemies: 2,
            num_safe_zones: 1,

            grid_width: GRID_WIDTH,
            grid_height: GRID_HEIGHT,
            correct_cell_chance: 0.4,
            min_correct_cells: 3,

            starting_lives: 3,
            auto_respawn_ms: None,
            wrong_answer_costs_life: false,
            max_level: None,

            timings: Timings::default(),
        }
    }
}

impl GameConfig {
    /// Default board with the menu's three choices
    pub fn new(mode: Mode, num_enemies: usize, num_safe_zones: usize) -> Self {
        Self {
            mode,
            num_enemies,
            num_safe_zones,
            ..Self::default()
        }
    }

    pub fn cells(&self) -> usize {
        self.grid_width * self.grid_height
    }

    /// Reject configurations that cannot produce a fair, solvable board
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.grid_width,
                height: self.grid_height,
            });
        }
        let cells = self.cells();
        if cells < self.min_correct_cells {
            return Err(ConfigError::TooFewCells {
                cells,
                required: self.min_correct_cells,
            });
        }
        let entities = 1 + self.num_safe_zones + self.num_enemies;
        if entities > cells {
            return Err(ConfigError::Overcrowded { entities, cells });
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::NoLives);
        }
        if !(0.0..=1.0).contains(&self.correct_cell_chance) {
            return Err(ConfigError::BadChance(self.correct_cell_chance));
        }
        Ok(())
    }

    /// Parse and validate a JSON config document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse a mode name as typed on a command line
pub fn parse_mode(s: &str) -> Result<Mode, ConfigError> {
    Mode::from_str(s).ok_or_else(|| ConfigError::UnknownMode(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert_eq!(config.cells(), 30);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.timings.enemy_move_ms, 800);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = GameConfig::new(Mode::Factors, 2, 1);
        config.grid_width = 0;
        assert!(matches!(config.validate(), Err(ConfigError::EmptyGrid { .. })));

        let config = GameConfig {
            grid_width: 2,
            grid_height: 1,
            ..GameConfig::new(Mode::Equals, 0, 0)
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooFewCells {
                cells: 2,
                required: 3
            })
        );

        let config = GameConfig::new(Mode::Equals, 25, 5);
        assert_eq!(
            config.validate(),
            Err(ConfigError::Overcrowded {
                entities: 31,
                cells: 30
            })
        );

        let config = GameConfig {
            starting_lives: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoLives));

        let config = GameConfig {
            correct_cell_chance: 1.5,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::BadChance(1.5)));
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config =
            GameConfig::from_json(r#"{"mode": "inequality", "num_enemies": 3}"#).unwrap();
        assert_eq!(config.mode, Mode::Inequality);
        assert_eq!(config.num_enemies, 3);
        assert_eq!(config.num_safe_zones, 1);
        assert_eq!(config.timings, Timings::default());

        let round_trip = GameConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(round_trip, config);
    }

    #[test]
    fn test_from_json_rejects_bad_documents() {
        assert!(matches!(
            GameConfig::from_json(r#"{"mode": "division"}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{"grid_width": 1, "grid_height": 1}"#),
            Err(ConfigError::TooFewCells { .. })
        ));
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("Factors"), Ok(Mode::Factors));
        assert_eq!(parse_mode("ineq"), Ok(Mode::Inequality));
        assert_eq!(
            parse_mode("division"),
            Err(ConfigError::UnknownMode("division".to_string()))
        );
    }
}

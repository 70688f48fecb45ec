//! Read-only view of a game for presentation
//!
//! The controller rebuilds a [`Snapshot`] on demand; the presentation layer
//! (or the headless demo) draws from it and never touches `GameState`.

use std::fmt;

use serde::Serialize;

use super::entities::EntrySide;
use super::grid::Position;
use super::puzzle::{Comparison, Mode};
use super::state::{GamePhase, GameState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellView {
    pub label: String,
    pub correct: bool,
    pub eaten: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnemyView {
    pub position: Position,
    /// Still off-grid; not drawn
    pub entering: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WarningView {
    pub side: EntrySide,
    pub seconds_remaining: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub mode: Mode,
    pub target: Option<i32>,
    pub comparison: Option<Comparison>,
    /// Instruction line, e.g. "Find multiples of: 4"
    pub prompt: String,
    pub width: usize,
    pub height: usize,
    /// Row-major
    pub cells: Vec<CellView>,
    pub player: Option<Position>,
    pub enemies: Vec<EnemyView>,
    pub safe_zones: Vec<Position>,
    pub warnings: Vec<WarningView>,
    pub score: u64,
    pub level: u32,
    pub lives: u32,
    pub game_over: bool,
    pub won: bool,
    pub paused: bool,
    pub player_frozen: bool,
    pub respawn_pending: bool,
}

impl Snapshot {
    pub fn from_state(state: &GameState) -> Self {
        let round = &state.round;
        let puzzle = round.puzzle;
        Self {
            phase: round.phase,
            mode: round.mode,
            target: puzzle.map(|p| p.target()),
            comparison: puzzle.and_then(|p| p.comparison()),
            prompt: puzzle.map(|p| p.prompt()).unwrap_or_default(),
            width: state.grid.width(),
            height: state.grid.height(),
            cells: state
                .grid
                .iter()
                .map(|(_, cell)| CellView {
                    label: cell.content().label(),
                    correct: cell.is_correct(),
                    eaten: cell.is_eaten(),
                })
                .collect(),
            player: state.player,
            enemies: state
                .enemies
                .iter()
                .map(|e| EnemyView {
                    position: e.position,
                    entering: e.entering,
                })
                .collect(),
            safe_zones: state.safe_zones.iter().map(|z| z.position).collect(),
            warnings: state
                .warnings
                .iter()
                .map(|w| WarningView {
                    side: w.side,
                    seconds_remaining: w.seconds_remaining(),
                })
                .collect(),
            score: round.score,
            level: round.level,
            lives: round.lives,
            game_over: round.is_game_over(),
            won: round.won,
            paused: round.is_paused(),
            player_frozen: round.player_frozen,
            respawn_pending: round.pending_respawn.is_some(),
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= 0
            && pos.col >= 0
            && (pos.row as usize) < self.height
            && (pos.col as usize) < self.width
    }

    pub fn cell(&self, pos: Position) -> Option<&CellView> {
        if !self.contains(pos) {
            return None;
        }
        self.cells.get(pos.row as usize * self.width + pos.col as usize)
    }

    /// On-grid enemy at `pos` (entering enemies are not on the board yet)
    pub fn enemy_at(&self, pos: Position) -> bool {
        self.enemies.iter().any(|e| !e.entering && e.position == pos)
    }

    pub fn is_safe_zone(&self, pos: Position) -> bool {
        self.safe_zones.contains(&pos)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Text board for terminals: `[P]` player, `[E]` enemy, `[S]` safe zone,
/// `*` marks eaten cells.
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Level {}  Score {}  Lives {}  {}",
            self.level, self.score, self.lives, self.prompt
        )?;
        for warning in &self.warnings {
            writeln!(
                f,
                "  enemy from the {} in {}s",
                warning.side.as_str(),
                warning.seconds_remaining
            )?;
        }
        for row in 0..self.height {
            for col in 0..self.width {
                let pos = Position::new(row as i32, col as i32);
                let marker = if self.player == Some(pos) {
                    'P'
                } else if self.enemy_at(pos) {
                    'E'
                } else if self.is_safe_zone(pos) {
                    'S'
                } else {
                    ' '
                };
                let label = match self.cell(pos) {
                    Some(cell) if cell.eaten => "*".to_string(),
                    Some(cell) => cell.label.clone(),
                    None => String::new(),
                };
                write!(f, "[{}]{:>7} ", marker, label)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

//! Game state and core simulation types
//!
//! Everything the controller owns for a running game lives here: the round
//! bookkeeping, the board, every token on it, and the seeded RNG.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entities::{Enemy, EnemyWarning, SafeZone};
use super::grid::{Grid, Position};
use super::puzzle::{Mode, Puzzle};

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// No game running (menu)
    #[default]
    Idle,
    /// Board live, player may act
    LevelActive,
    /// Pause between clearing a board and the next one
    LevelComplete,
    /// Player removed from the board, waiting for respawn acknowledgment
    LifeLost,
    /// Run ended
    GameOver,
}

/// Score, lives and level bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    pub mode: Mode,
    /// Rule for the current board (None before the first level)
    pub puzzle: Option<Puzzle>,
    pub level: u32,
    pub score: u64,
    pub lives: u32,
    /// Correct cells eaten on this board
    pub correct_answers: usize,
    /// Correct cells available on this board
    pub total_correct: usize,
    pub phase: GamePhase,
    pub won: bool,
    pub player_frozen: bool,
    /// Where the player will reappear once the respawn is acknowledged
    pub pending_respawn: Option<Position>,
}

impl RoundState {
    pub fn new(mode: Mode, lives: u32) -> Self {
        Self {
            mode,
            puzzle: None,
            level: 1,
            score: 0,
            lives,
            correct_answers: 0,
            total_correct: 0,
            phase: GamePhase::Idle,
            won: false,
            player_frozen: false,
            pending_respawn: None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Timed transition in progress; periodic ticks are suspended
    pub fn is_paused(&self) -> bool {
        matches!(self.phase, GamePhase::LevelComplete | GamePhase::LifeLost)
    }

    /// Movement and eating are allowed
    pub fn accepts_input(&self) -> bool {
        self.phase == GamePhase::LevelActive && !self.player_frozen
    }

    pub fn target(&self) -> Option<i32> {
        self.puzzle.map(|p| p.target())
    }
}

/// Complete game state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub round: RoundState,
    pub grid: Grid,
    /// None while the player is off the board (waiting to respawn)
    pub player: Option<Position>,
    pub enemies: Vec<Enemy>,
    pub safe_zones: Vec<SafeZone>,
    pub warnings: Vec<EnemyWarning>,
}

impl GameState {
    pub fn new(seed: u64, mode: Mode, lives: u32) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            round: RoundState::new(mode, lives),
            grid: Grid::default(),
            player: None,
            enemies: Vec::new(),
            safe_zones: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_safe_zone(&self, pos: Position) -> bool {
        self.safe_zones.iter().any(|s| s.position == pos)
    }

    /// An on-grid enemy (other than `except`) stands on `pos`
    pub fn enemy_at(&self, pos: Position, except: Option<usize>) -> bool {
        self.enemies
            .iter()
            .enumerate()
            .any(|(i, e)| Some(i) != except && !e.entering && e.position == pos)
    }

    pub fn player_at(&self, pos: Position) -> bool {
        self.player == Some(pos)
    }

    /// Uniformly random on-grid cell satisfying `pred`
    pub fn pick_cell(&mut self, pred: impl Fn(&GameState, Position) -> bool) -> Option<Position> {
        let candidates: Vec<Position> = self.grid.positions().filter(|&p| pred(self, p)).collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[self.rng.random_range(0..candidates.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::EntrySide;
    use crate::sim::grid::{Cell, CellContent};

    fn state_with_board() -> GameState {
        let mut state = GameState::new(7, Mode::Equals, 3);
        state.grid = Grid::from_fn(3, 2, |_| Cell::new(CellContent::Number(1), false));
        state
    }

    #[test]
    fn test_phase_flags() {
        let mut round = RoundState::new(Mode::Factors, 3);
        assert!(!round.accepts_input());
        round.phase = GamePhase::LevelActive;
        assert!(round.accepts_input());
        round.player_frozen = true;
        assert!(!round.accepts_input());
        round.phase = GamePhase::LifeLost;
        assert!(round.is_paused());
        round.phase = GamePhase::GameOver;
        assert!(round.is_game_over() && !round.is_paused());
    }

    #[test]
    fn test_pick_cell_respects_predicate() {
        let mut state = state_with_board();
        let only = Position::new(1, 2);
        for _ in 0..20 {
            assert_eq!(state.pick_cell(|_, p| p == only), Some(only));
        }
        assert_eq!(state.pick_cell(|_, _| false), None);
    }

    #[test]
    fn test_entering_enemies_do_not_occupy_cells() {
        let mut state = state_with_board();
        let pos = Position::new(0, 0);
        state.enemies.push(Enemy::entering_at(pos, EntrySide::Top));
        assert!(!state.enemy_at(pos, None));
        state.enemies[0].entering = false;
        assert!(state.enemy_at(pos, None));
        assert!(!state.enemy_at(pos, Some(0)));
    }
}

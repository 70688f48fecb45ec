//! Round controller
//!
//! Owns the game state and funnels every mutation through named operations.
//! Delayed work (enemy entry, freezes, the pause after a cleared board,
//! respawns) goes through the injected [`Scheduler`]; when a timer comes back
//! it is re-checked against the current phase before anything changes.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entities::{
    enter_enemy, move_enemies, place_safe_zones, relocate_safe_zones, spawn_enemies, tick_warnings,
};
use super::grid::{Direction, Position};
use super::puzzle::{Comparison, Mode, Puzzle, ensure_minimum_correct, generate_grid};
use super::scheduler::{Scheduler, Timer, TimerHandle, VirtualClock};
use super::snapshot::Snapshot;
use super::state::{GamePhase, GameState};
use crate::consts::POINTS_PER_LEVEL;
use crate::error::ConfigError;
use crate::settings::GameConfig;

/// Targets for factors mode: all have plenty of divisors and non-divisors
pub const FACTOR_TARGETS: [i32; 8] = [12, 18, 20, 24, 30, 36, 40, 48];

/// Player intents forwarded by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Move(Direction),
    Eat,
    AcknowledgeRespawn,
    Restart,
    ReturnToMenu,
}

/// Notifications for the presentation layer, drained after each step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelStarted { level: u32, target: i32 },
    CorrectAnswer { points: u64 },
    WrongAnswer { message: String },
    EnemyEntered { enemy: usize, position: Position },
    LifeLost { lives_left: u32 },
    Respawned { position: Position },
    LevelComplete { level: u32 },
    GameOver { won: bool, score: u64, level: u32 },
}

pub struct RoundController<S: Scheduler> {
    config: GameConfig,
    state: GameState,
    scheduler: S,
    /// Periodic tick handles for the current level
    ticks: Vec<TimerHandle>,
    /// Pending one-shot handles (entries, transition)
    one_shots: Vec<TimerHandle>,
    freeze_timer: Option<TimerHandle>,
    respawn_timer: Option<TimerHandle>,
    /// Bumped every level so stale entry timers can be recognised
    round_id: u64,
    events: Vec<GameEvent>,
}

impl<S: Scheduler> RoundController<S> {
    /// Controller in the idle (menu) phase
    pub fn new(scheduler: S, seed: u64) -> Self {
        let config = GameConfig::default();
        Self {
            state: GameState::new(seed, config.mode, config.starting_lives),
            config,
            scheduler,
            ticks: Vec::new(),
            one_shots: Vec::new(),
            freeze_timer: None,
            respawn_timer: None,
            round_id: 0,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn phase(&self) -> GamePhase {
        self.state.round.phase
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_state(&self.state)
    }

    /// Take all events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Validate `config` and start at level 1
    pub fn start_game(&mut self, config: GameConfig) -> Result<(), ConfigError> {
        if let Err(err) = config.validate() {
            log::warn!("Rejected game config: {}", err);
            return Err(err);
        }
        self.cancel_all();

        // Keep the RNG stream running across restarts
        let seed = self.state.seed;
        let rng = self.state.rng.clone();
        self.state = GameState::new(seed, config.mode, config.starting_lives);
        self.state.rng = rng;
        self.config = config;

        log::info!(
            "New game: mode={}, enemies={}, safe zones={}",
            self.config.mode,
            self.config.num_enemies,
            self.config.num_safe_zones
        );
        self.start_level();
        Ok(())
    }

    /// Start over with the current configuration
    pub fn restart(&mut self) {
        let config = self.config.clone();
        if let Err(err) = self.start_game(config) {
            log::warn!("Restart failed: {}", err);
        }
    }

    /// Stop everything and go back to the idle phase
    pub fn return_to_menu(&mut self) {
        self.cancel_all();
        let round = &mut self.state.round;
        round.phase = GamePhase::Idle;
        round.player_frozen = false;
        round.pending_respawn = None;
    }

    pub fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::Move(dir) => self.move_player(dir),
            Intent::Eat => self.eat_current_cell(),
            Intent::AcknowledgeRespawn => self.acknowledge_respawn(),
            Intent::Restart => self.restart(),
            Intent::ReturnToMenu => self.return_to_menu(),
        }
    }

    fn roll_puzzle(&mut self) -> Result<Puzzle, ConfigError> {
        let mode = self.config.mode;
        let span = 5 + self.state.round.level as i32 * 3;
        let rng = &mut self.state.rng;
        let (target, comparison) = match mode {
            Mode::Multiples => (rng.random_range(2..=8), None),
            Mode::Factors => (FACTOR_TARGETS[rng.random_range(0..FACTOR_TARGETS.len())], None),
            Mode::Inequality => {
                let cmp = if rng.random_bool(0.5) {
                    Comparison::Greater
                } else {
                    Comparison::Less
                };
                (5 + rng.random_range(0..span), Some(cmp))
            }
            Mode::Equals => (3 + rng.random_range(0..span), None),
        };
        Puzzle::new(target, mode, comparison)
    }

    /// Build a fresh board for the current level and arm its timers
    fn start_level(&mut self) {
        self.cancel_all();
        self.round_id += 1;

        let puzzle = match self.roll_puzzle() {
            Ok(puzzle) => puzzle,
            Err(err) => {
                log::error!("Could not build level {}: {}", self.state.round.level, err);
                self.end_game(false);
                return;
            }
        };

        let config = &self.config;
        let mut grid = generate_grid(
            &puzzle,
            config.grid_width,
            config.grid_height,
            config.correct_cell_chance,
            &mut self.state.rng,
        );
        let total = ensure_minimum_correct(
            &mut grid,
            &puzzle,
            config.min_correct_cells,
            &mut self.state.rng,
        );
        self.state.grid = grid;

        let round = &mut self.state.round;
        round.puzzle = Some(puzzle);
        round.correct_answers = 0;
        round.total_correct = total;
        round.phase = GamePhase::LevelActive;
        round.player_frozen = false;
        round.pending_respawn = None;

        self.state.player = self.state.pick_cell(|_, _| true);
        place_safe_zones(&mut self.state, self.config.num_safe_zones);

        let timings = self.config.timings;
        let delays = spawn_enemies(
            &mut self.state,
            self.config.num_enemies,
            timings.entry_base_ms,
            timings.entry_stagger_ms,
        );
        for (enemy, delay) in delays.into_iter().enumerate() {
            let timer = Timer::EnemyEntry {
                enemy,
                round: self.round_id,
            };
            self.one_shots.push(self.scheduler.schedule_once(delay, timer));
        }

        self.ticks
            .push(self.scheduler.schedule_repeating(timings.enemy_move_ms, Timer::EnemyMove));
        self.ticks.push(
            self.scheduler
                .schedule_repeating(timings.warning_tick_ms, Timer::WarningCountdown),
        );
        if self.config.num_safe_zones > 0 {
            self.ticks.push(
                self.scheduler
                    .schedule_repeating(timings.safe_zone_move_ms, Timer::SafeZoneMove),
            );
        }

        let level = self.state.round.level;
        log::info!(
            "Level {}: {} ({} correct cells)",
            level,
            puzzle.prompt(),
            total
        );
        self.events.push(GameEvent::LevelStarted {
            level,
            target: puzzle.target(),
        });
    }

    /// Step the player one cell (clamped at the edges)
    pub fn move_player(&mut self, dir: Direction) {
        if !self.state.round.accepts_input() {
            return;
        }
        let Some(pos) = self.state.player else {
            return;
        };
        self.state.player = Some(self.state.grid.step(pos, dir));
        self.check_enemy_collision();
    }

    /// Eat the cell under the player
    pub fn eat_current_cell(&mut self) {
        if !self.state.round.accepts_input() {
            return;
        }
        let (Some(pos), Some(puzzle)) = (self.state.player, self.state.round.puzzle) else {
            return;
        };
        let Some(cell) = self.state.grid.get_mut(pos) else {
            return;
        };
        if !cell.mark_eaten() {
            return;
        }
        let correct = cell.is_correct();
        let content = *cell.content();

        if correct {
            let round = &mut self.state.round;
            let points = POINTS_PER_LEVEL * round.level as u64;
            round.score += points;
            round.correct_answers += 1;
            self.events.push(GameEvent::CorrectAnswer { points });
            if round.correct_answers == round.total_correct {
                self.complete_level();
            }
        } else {
            let message = puzzle.mismatch_message(&content);
            log::debug!("Wrong answer at {:?}: {}", pos, message);
            self.events.push(GameEvent::WrongAnswer { message });
            self.freeze_player();
            if self.config.wrong_answer_costs_life {
                self.lose_life();
            }
        }
    }

    fn freeze_player(&mut self) {
        if let Some(handle) = self.freeze_timer.take() {
            self.scheduler.cancel(handle);
        }
        self.state.round.player_frozen = true;
        log::debug!("Player frozen for {}ms", self.config.timings.freeze_ms);
        self.freeze_timer = Some(
            self.scheduler
                .schedule_once(self.config.timings.freeze_ms, Timer::Unfreeze),
        );
    }

    fn complete_level(&mut self) {
        let level = self.state.round.level;
        log::info!("Level {} complete, score {}", level, self.state.round.score);
        self.events.push(GameEvent::LevelComplete { level });

        if self.config.max_level.is_some_and(|max| level >= max) {
            self.end_game(true);
            return;
        }

        self.cancel_all();
        let round = &mut self.state.round;
        round.level += 1;
        round.phase = GamePhase::LevelComplete;
        let pause = self.config.timings.level_transition_ms;
        self.one_shots
            .push(self.scheduler.schedule_once(pause, Timer::LevelTransition));
    }

    /// Lose a life if the player shares a cell with an enemy outside a safe zone
    pub fn check_enemy_collision(&mut self) {
        if self.state.round.phase != GamePhase::LevelActive {
            return;
        }
        let Some(pos) = self.state.player else {
            return;
        };
        if self.state.is_safe_zone(pos) {
            return;
        }
        if self.state.enemy_at(pos, None) {
            self.lose_life();
        }
    }

    /// Take a life; either end the game or pull the player off the board until
    /// the respawn is acknowledged
    pub fn lose_life(&mut self) {
        // Only a live board can cost a life; a cleared board is waiting for
        // its transition timer
        if self.state.round.phase != GamePhase::LevelActive {
            return;
        }
        let round = &mut self.state.round;
        round.lives = round.lives.saturating_sub(1);
        let lives_left = round.lives;
        self.events.push(GameEvent::LifeLost { lives_left });

        if lives_left == 0 {
            self.end_game(false);
            return;
        }

        if let Some(handle) = self.freeze_timer.take() {
            self.scheduler.cancel(handle);
        }
        let respawn = self
            .state
            .pick_cell(|s, p| !s.enemy_at(p, None))
            .or_else(|| self.state.pick_cell(|_, _| true));

        let round = &mut self.state.round;
        round.player_frozen = false;
        round.phase = GamePhase::LifeLost;
        round.pending_respawn = respawn;
        self.state.player = None;
        log::debug!("Life lost, {} left, respawn at {:?}", lives_left, respawn);

        self.cancel_respawn_timer();
        if let Some(delay) = self.config.auto_respawn_ms {
            self.respawn_timer = Some(self.scheduler.schedule_once(delay, Timer::AutoRespawn));
        }
    }

    fn cancel_respawn_timer(&mut self) {
        if let Some(handle) = self.respawn_timer.take() {
            self.scheduler.cancel(handle);
        }
    }

    /// Put the player back on the board after a lost life
    pub fn acknowledge_respawn(&mut self) {
        if self.state.round.is_game_over() {
            return;
        }
        let Some(pos) = self.state.round.pending_respawn.take() else {
            return;
        };
        self.cancel_respawn_timer();
        self.state.player = Some(pos);
        let round = &mut self.state.round;
        round.phase = GamePhase::LevelActive;
        round.player_frozen = false;
        log::debug!("Player respawned at {:?}", pos);
        self.events.push(GameEvent::Respawned { position: pos });
        // An enemy may have landed on the respawn cell in the meantime
        self.check_enemy_collision();
    }

    /// Stop the run and cancel every pending timer
    pub fn end_game(&mut self, won: bool) {
        if self.state.round.is_game_over() {
            return;
        }
        self.cancel_all();
        let round = &mut self.state.round;
        round.phase = GamePhase::GameOver;
        round.won = won;
        round.player_frozen = false;
        round.pending_respawn = None;
        log::info!(
            "Game over ({}): score {}, level {}",
            if won { "won" } else { "lost" },
            round.score,
            round.level
        );
        self.events.push(GameEvent::GameOver {
            won,
            score: round.score,
            level: round.level,
        });
    }

    fn cancel_all(&mut self) {
        for handle in self.ticks.drain(..).chain(self.one_shots.drain(..)) {
            self.scheduler.cancel(handle);
        }
        if let Some(handle) = self.freeze_timer.take() {
            self.scheduler.cancel(handle);
        }
        self.cancel_respawn_timer();
    }

    /// Periodic ticks only run on a live board
    fn ticks_suspended(&self) -> bool {
        let round = &self.state.round;
        round.is_game_over() || round.is_paused() || round.phase != GamePhase::LevelActive
    }

    /// Handle a timer delivered by the scheduler
    pub fn handle_timer(&mut self, timer: Timer) {
        match timer {
            Timer::EnemyMove => {
                if self.ticks_suspended() {
                    return;
                }
                move_enemies(&mut self.state);
                self.check_enemy_collision();
            }
            Timer::WarningCountdown => {
                if self.ticks_suspended() {
                    return;
                }
                tick_warnings(&mut self.state, self.config.timings.warning_tick_ms);
            }
            Timer::SafeZoneMove => {
                if self.ticks_suspended() {
                    return;
                }
                relocate_safe_zones(&mut self.state);
                self.check_enemy_collision();
            }
            Timer::EnemyEntry { enemy, round } => {
                if matches!(self.phase(), GamePhase::GameOver | GamePhase::Idle)
                    || round != self.round_id
                {
                    return;
                }
                if let Some(position) = enter_enemy(&mut self.state, enemy) {
                    log::debug!("Enemy {} entered at {:?}", enemy, position);
                    self.events.push(GameEvent::EnemyEntered { enemy, position });
                    self.check_enemy_collision();
                }
            }
            Timer::Unfreeze => {
                self.freeze_timer = None;
                if self.state.round.is_game_over() {
                    return;
                }
                self.state.round.player_frozen = false;
            }
            Timer::LevelTransition => {
                if self.phase() == GamePhase::LevelComplete {
                    self.start_level();
                }
            }
            Timer::AutoRespawn => {
                self.respawn_timer = None;
                self.acknowledge_respawn();
            }
        }
    }
}

impl RoundController<VirtualClock> {
    /// Move virtual time forward, handling every timer that falls due
    pub fn advance(&mut self, ms: u64) {
        let until = self.scheduler.now_ms().saturating_add(ms);
        while let Some(timer) = self.scheduler.pop_due(until) {
            self.handle_timer(timer);
        }
    }
}

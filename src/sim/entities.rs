//! Enemy and safe-zone movement
//!
//! These functions are only called by the round controller, which hands them
//! the state it owns. They never touch timers: spawning returns the entry
//! delays and the controller schedules them.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::{Direction, Position};
use super::state::GameState;

/// Board edge an enemy enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    Top,
    Right,
    Bottom,
    Left,
}

impl EntrySide {
    pub const ALL: [EntrySide; 4] = [
        EntrySide::Top,
        EntrySide::Right,
        EntrySide::Bottom,
        EntrySide::Left,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySide::Top => "top",
            EntrySide::Right => "right",
            EntrySide::Bottom => "bottom",
            EntrySide::Left => "left",
        }
    }
}

/// A roaming enemy token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub position: Position,
    /// Staged off-grid; ignored by movement, collision and rendering
    pub entering: bool,
    pub entry_side: Option<EntrySide>,
}

impl Enemy {
    pub fn entering_at(position: Position, side: EntrySide) -> Self {
        Self {
            position,
            entering: true,
            entry_side: Some(side),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeZone {
    pub position: Position,
}

/// Countdown shown on the edge an enemy is about to enter from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyWarning {
    pub side: EntrySide,
    pub remaining_ms: u64,
    pub enemy: usize,
}

impl EnemyWarning {
    /// Whole seconds left, rounded up
    pub fn seconds_remaining(&self) -> u64 {
        self.remaining_ms.div_ceil(1000)
    }
}

/// Entry delay for the enemy at `index`, saturating at `u64::MAX`
pub fn entry_delay_ms(index: usize, base_ms: u64, stagger_ms: u64) -> u64 {
    base_ms.saturating_add((index as u64).saturating_mul(stagger_ms))
}

/// Stage `count` enemies one cell outside a random edge each. Returns the
/// entry delay per enemy index, for the controller to schedule.
pub fn spawn_enemies(state: &mut GameState, count: usize, base_ms: u64, stagger_ms: u64) -> Vec<u64> {
    let width = state.grid.width() as i32;
    let height = state.grid.height() as i32;
    state.enemies.clear();
    state.warnings.clear();

    let mut delays = Vec::with_capacity(count);
    for index in 0..count {
        let side = EntrySide::ALL[state.rng.random_range(0..EntrySide::ALL.len())];
        let position = match side {
            EntrySide::Top => Position::new(-1, state.rng.random_range(0..width)),
            EntrySide::Right => Position::new(state.rng.random_range(0..height), width),
            EntrySide::Bottom => Position::new(height, state.rng.random_range(0..width)),
            EntrySide::Left => Position::new(state.rng.random_range(0..height), -1),
        };
        let delay = entry_delay_ms(index, base_ms, stagger_ms);
        state.enemies.push(Enemy::entering_at(position, side));
        state.warnings.push(EnemyWarning {
            side,
            remaining_ms: delay,
            enemy: index,
        });
        delays.push(delay);
    }
    delays
}

fn blocked_for_entry(state: &GameState, pos: Position, index: usize) -> bool {
    state.player_at(pos) || state.is_safe_zone(pos) || state.enemy_at(pos, Some(index))
}

/// Bring an entering enemy onto the board. Returns where it landed, or None
/// if the enemy does not exist or already entered.
///
/// The clamped edge cell is preferred; if it is taken, the first free
/// neighbour in up/down/left/right order is used, and if none is free the
/// enemy keeps the clamped cell anyway.
pub fn enter_enemy(state: &mut GameState, index: usize) -> Option<Position> {
    let enemy = state.enemies.get(index)?;
    if !enemy.entering {
        return None;
    }

    let clamped = state.grid.clamp(enemy.position);
    let landing = if blocked_for_entry(state, clamped, index) {
        Direction::ALL
            .iter()
            .map(|&dir| clamped.offset(dir))
            .find(|&p| state.grid.contains(p) && !blocked_for_entry(state, p, index))
            .unwrap_or(clamped)
    } else {
        clamped
    };

    let enemy = &mut state.enemies[index];
    enemy.position = landing;
    enemy.entering = false;
    enemy.entry_side = None;
    state.warnings.retain(|w| w.enemy != index);
    Some(landing)
}

/// One random-walk step per on-grid enemy. A blocked move is skipped, not retried.
pub fn move_enemies(state: &mut GameState) {
    for index in 0..state.enemies.len() {
        if state.enemies[index].entering {
            continue;
        }
        let dir = Direction::ALL[state.rng.random_range(0..Direction::ALL.len())];
        let dest = state.grid.step(state.enemies[index].position, dir);
        let blocked =
            state.is_safe_zone(dest) || state.enemy_at(dest, Some(index)) || state.player_at(dest);
        if !blocked {
            state.enemies[index].position = dest;
        }
    }
}

/// Place `count` safe zones at level start, avoiding the player and each other
pub fn place_safe_zones(state: &mut GameState, count: usize) {
    state.safe_zones.clear();
    for _ in 0..count {
        let picked = state.pick_cell(|s, p| !s.player_at(p) && !s.is_safe_zone(p));
        if let Some(position) = picked {
            state.safe_zones.push(SafeZone { position });
        }
    }
}

/// Move every safe zone to a random cell free of enemies and other safe zones
pub fn relocate_safe_zones(state: &mut GameState) {
    for index in 0..state.safe_zones.len() {
        let picked = state.pick_cell(|s, p| {
            !s.enemy_at(p, None)
                && !s
                    .safe_zones
                    .iter()
                    .enumerate()
                    .any(|(i, z)| i != index && z.position == p)
        });
        if let Some(position) = picked {
            state.safe_zones[index].position = position;
        }
    }
}

/// Count every warning down by `step_ms`. Display only: entry runs on its own timer.
pub fn tick_warnings(state: &mut GameState, step_ms: u64) {
    for warning in &mut state.warnings {
        warning.remaining_ms = warning.remaining_ms.saturating_sub(step_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::{Cell, CellContent, Grid};
    use crate::sim::puzzle::Mode;

    fn board(seed: u64) -> GameState {
        let mut state = GameState::new(seed, Mode::Equals, 3);
        state.grid = Grid::from_fn(6, 5, |_| Cell::new(CellContent::Number(1), false));
        state
    }

    fn landed(position: Position) -> Enemy {
        Enemy {
            position,
            entering: false,
            entry_side: None,
        }
    }

    #[test]
    fn test_spawn_stages_enemies_off_grid_with_staggered_delays() {
        let mut state = board(1);
        let delays = spawn_enemies(&mut state, 3, 1500, 1000);
        assert_eq!(delays, vec![1500, 2500, 3500]);
        assert_eq!(state.enemies.len(), 3);
        assert_eq!(state.warnings.len(), 3);
        for (i, enemy) in state.enemies.iter().enumerate() {
            assert!(enemy.entering);
            assert!(!state.grid.contains(enemy.position));
            let side = enemy.entry_side.unwrap();
            let p = enemy.position;
            match side {
                EntrySide::Top => assert_eq!(p.row, -1),
                EntrySide::Right => assert_eq!(p.col, 6),
                EntrySide::Bottom => assert_eq!(p.row, 5),
                EntrySide::Left => assert_eq!(p.col, -1),
            }
            assert_eq!(state.warnings[i].side, side);
            assert_eq!(state.warnings[i].enemy, i);
        }
    }

    #[test]
    fn test_enter_clamps_and_clears_warning() {
        let mut state = board(2);
        state.enemies.push(Enemy::entering_at(Position::new(-1, 3), EntrySide::Top));
        state.warnings.push(EnemyWarning {
            side: EntrySide::Top,
            remaining_ms: 1500,
            enemy: 0,
        });
        assert_eq!(enter_enemy(&mut state, 0), Some(Position::new(0, 3)));
        assert!(!state.enemies[0].entering);
        assert_eq!(state.enemies[0].entry_side, None);
        assert!(state.warnings.is_empty());
        // Entering twice is a no-op
        assert_eq!(enter_enemy(&mut state, 0), None);
    }

    #[test]
    fn test_enter_probes_neighbours_in_order() {
        let mut state = board(3);
        state.player = Some(Position::new(0, 3));
        state.enemies.push(Enemy::entering_at(Position::new(-1, 3), EntrySide::Top));
        // Up is off-grid, so down is the first free neighbour
        assert_eq!(enter_enemy(&mut state, 0), Some(Position::new(1, 3)));

        let mut state = board(3);
        state.player = Some(Position::new(0, 3));
        state.safe_zones.push(SafeZone {
            position: Position::new(1, 3),
        });
        state.enemies.push(Enemy::entering_at(Position::new(-1, 3), EntrySide::Top));
        assert_eq!(enter_enemy(&mut state, 0), Some(Position::new(0, 2)));
    }

    #[test]
    fn test_enter_falls_back_to_clamped_cell() {
        let mut state = board(4);
        state.player = Some(Position::new(0, 0));
        state.enemies.push(landed(Position::new(1, 0)));
        state.safe_zones.push(SafeZone {
            position: Position::new(0, 1),
        });
        state.enemies.push(Enemy::entering_at(Position::new(0, -1), EntrySide::Left));
        assert_eq!(enter_enemy(&mut state, 1), Some(Position::new(0, 0)));
    }

    #[test]
    fn test_enemies_never_step_onto_blocked_cells() {
        let mut state = board(5);
        state.player = Some(Position::new(2, 3));
        state.safe_zones.push(SafeZone {
            position: Position::new(2, 1),
        });
        state.enemies.push(landed(Position::new(2, 2)));
        state.enemies.push(landed(Position::new(1, 2)));
        state.enemies.push(Enemy::entering_at(Position::new(5, 2), EntrySide::Bottom));
        for _ in 0..200 {
            move_enemies(&mut state);
            for (i, enemy) in state.enemies.iter().enumerate().take(2) {
                assert!(state.grid.contains(enemy.position));
                assert!(!state.is_safe_zone(enemy.position));
                assert!(!state.player_at(enemy.position));
                assert!(!state.enemy_at(enemy.position, Some(i)));
            }
            assert_eq!(state.enemies[2].position, Position::new(5, 2));
        }
    }

    #[test]
    fn test_safe_zones_avoid_enemies_and_each_other() {
        let mut state = board(6);
        state.player = Some(Position::new(0, 0));
        place_safe_zones(&mut state, 3);
        assert_eq!(state.safe_zones.len(), 3);
        assert!(state.safe_zones.iter().all(|z| z.position != Position::new(0, 0)));

        state.enemies.push(landed(Position::new(2, 2)));
        state.enemies.push(landed(Position::new(3, 4)));
        for _ in 0..100 {
            relocate_safe_zones(&mut state);
            for (i, zone) in state.safe_zones.iter().enumerate() {
                assert!(!state.enemy_at(zone.position, None));
                assert!(
                    state
                        .safe_zones
                        .iter()
                        .enumerate()
                        .all(|(j, z)| j == i || z.position != zone.position)
                );
            }
        }
    }

    #[test]
    fn test_entry_delay_saturates() {
        assert_eq!(entry_delay_ms(2, 1500, 1000), 3500);
        assert_eq!(entry_delay_ms(3, u64::MAX - 1, u64::MAX), u64::MAX);
        assert_eq!(entry_delay_ms(0, u64::MAX, u64::MAX), u64::MAX);
    }

    #[test]
    fn test_warning_countdown_saturates() {
        let mut state = board(7);
        state.warnings.push(EnemyWarning {
            side: EntrySide::Left,
            remaining_ms: 250,
            enemy: 0,
        });
        tick_warnings(&mut state, 100);
        assert_eq!(state.warnings[0].remaining_ms, 150);
        assert_eq!(state.warnings[0].seconds_remaining(), 1);
        tick_warnings(&mut state, 100);
        tick_warnings(&mut state, 100);
        assert_eq!(state.warnings[0].remaining_ms, 0);
        assert_eq!(state.warnings[0].seconds_remaining(), 0);
    }
}

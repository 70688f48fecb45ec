//! Simple computer player
//!
//! Drives the headless demo and long-running soak tests. It only reads a
//! [`Snapshot`], so it plays through the same intents a human would.

use super::controller::Intent;
use super::grid::{Direction, Position};
use super::snapshot::Snapshot;
use super::state::GamePhase;

/// Nearest uneaten correct cell by Manhattan distance, row-major on ties
fn nearest_target(snapshot: &Snapshot, from: Position) -> Option<Position> {
    (0..snapshot.height as i32)
        .flat_map(|row| (0..snapshot.width as i32).map(move |col| Position::new(row, col)))
        .filter(|&p| snapshot.cell(p).is_some_and(|c| c.correct && !c.eaten))
        .min_by_key(|&p| from.distance(p))
}

/// A cell is dangerous if an enemy stands on it and it is not a safe zone
fn dangerous(snapshot: &Snapshot, pos: Position) -> bool {
    snapshot.enemy_at(pos) && !snapshot.is_safe_zone(pos)
}

/// Pick the next intent, or None to wait
pub fn next_intent(snapshot: &Snapshot) -> Option<Intent> {
    if snapshot.game_over {
        return None;
    }
    if snapshot.respawn_pending {
        return Some(Intent::AcknowledgeRespawn);
    }
    if snapshot.phase != GamePhase::LevelActive || snapshot.player_frozen {
        return None;
    }

    let player = snapshot.player?;
    if snapshot
        .cell(player)
        .is_some_and(|c| c.correct && !c.eaten)
    {
        return Some(Intent::Eat);
    }

    let target = nearest_target(snapshot, player)?;
    let safe_steps: Vec<(Direction, Position)> = Direction::ALL
        .iter()
        .map(|&dir| (dir, player.offset(dir)))
        .filter(|&(_, p)| snapshot.contains(p) && !dangerous(snapshot, p))
        .collect();

    safe_steps
        .iter()
        .find(|(_, p)| p.distance(target) < player.distance(target))
        .or_else(|| safe_steps.first())
        .map(|&(dir, _)| Intent::Move(dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GameConfig;
    use crate::sim::controller::RoundController;
    use crate::sim::puzzle::Mode;
    use crate::sim::scheduler::VirtualClock;
    use crate::sim::snapshot::{CellView, EnemyView};

    fn board(width: usize, height: usize) -> Snapshot {
        Snapshot {
            phase: GamePhase::LevelActive,
            mode: Mode::Equals,
            target: Some(5),
            comparison: None,
            prompt: String::new(),
            width,
            height,
            cells: (0..width * height)
                .map(|_| CellView {
                    label: "1".to_string(),
                    correct: false,
                    eaten: false,
                })
                .collect(),
            player: Some(Position::new(0, 0)),
            enemies: Vec::new(),
            safe_zones: Vec::new(),
            warnings: Vec::new(),
            score: 0,
            level: 1,
            lives: 3,
            game_over: false,
            won: false,
            paused: false,
            player_frozen: false,
            respawn_pending: false,
        }
    }

    fn mark_correct(snapshot: &mut Snapshot, pos: Position) {
        let index = pos.row as usize * snapshot.width + pos.col as usize;
        snapshot.cells[index].correct = true;
    }

    #[test]
    fn test_eats_when_standing_on_answer() {
        let mut snap = board(3, 3);
        mark_correct(&mut snap, Position::new(0, 0));
        assert_eq!(next_intent(&snap), Some(Intent::Eat));
    }

    #[test]
    fn test_walks_toward_nearest_answer() {
        let mut snap = board(4, 4);
        mark_correct(&mut snap, Position::new(3, 3));
        mark_correct(&mut snap, Position::new(0, 2));
        assert_eq!(next_intent(&snap), Some(Intent::Move(Direction::Right)));
    }

    #[test]
    fn test_steps_around_enemies() {
        let mut snap = board(3, 3);
        mark_correct(&mut snap, Position::new(0, 2));
        snap.enemies.push(EnemyView {
            position: Position::new(0, 1),
            entering: false,
        });
        assert_eq!(next_intent(&snap), Some(Intent::Move(Direction::Down)));

        // Safe zones are fine to step on
        snap.safe_zones.push(Position::new(0, 1));
        assert_eq!(next_intent(&snap), Some(Intent::Move(Direction::Right)));
    }

    #[test]
    fn test_waits_or_respawns() {
        let mut snap = board(2, 2);
        snap.player_frozen = true;
        assert_eq!(next_intent(&snap), None);

        snap.player_frozen = false;
        snap.phase = GamePhase::LifeLost;
        snap.player = None;
        snap.respawn_pending = true;
        assert_eq!(next_intent(&snap), Some(Intent::AcknowledgeRespawn));

        snap.game_over = true;
        assert_eq!(next_intent(&snap), None);
    }

    #[test]
    fn test_autopilot_clears_quiet_board() {
        let mut game = RoundController::new(VirtualClock::new(), 21);
        game.start_game(GameConfig::new(Mode::Factors, 0, 0)).unwrap();
        for _ in 0..200 {
            if game.state().round.level > 1 {
                break;
            }
            if let Some(intent) = next_intent(&game.snapshot()) {
                game.apply(intent);
            }
            game.advance(100);
        }
        assert_eq!(game.state().round.level, 2);
    }
}

//! Timer scheduling
//!
//! The controller never sleeps or owns wall-clock timers. It asks a
//! [`Scheduler`] to deliver [`Timer`] values later and handles them when the
//! driver hands them back. [`VirtualClock`] is the deterministic driver used by
//! tests and the headless demo.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

/// A continuation the controller asked to receive later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timer {
    /// Periodic random walk of on-grid enemies
    EnemyMove,
    /// Periodic entry warning countdown
    WarningCountdown,
    /// Periodic safe-zone relocation
    SafeZoneMove,
    /// Enemy `enemy` of round `round` lands on the board
    EnemyEntry { enemy: usize, round: u64 },
    /// End of a wrong-answer freeze
    Unfreeze,
    /// End of the pause after a cleared board
    LevelTransition,
    /// Automatic respawn acknowledgment
    AutoRespawn,
}

/// Opaque handle for cancelling a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(u64);

/// Source of delayed and periodic timer deliveries
pub trait Scheduler {
    /// Deliver `timer` every `interval_ms` until cancelled
    fn schedule_repeating(&mut self, interval_ms: u64, timer: Timer) -> TimerHandle;
    /// Deliver `timer` once after `delay_ms`
    fn schedule_once(&mut self, delay_ms: u64, timer: Timer) -> TimerHandle;
    /// Stop a pending delivery. Unknown or spent handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

#[derive(Debug, Clone)]
struct Slot {
    timer: Timer,
    interval_ms: Option<u64>,
}

/// Manually advanced clock. Timers due at the same instant fire in the order
/// they were scheduled.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now_ms: u64,
    next_handle: u64,
    next_seq: u64,
    /// (due, seq, handle); cancelled entries are skipped lazily
    queue: BinaryHeap<Reverse<(u64, u64, u64)>>,
    live: HashMap<u64, Slot>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of timers still scheduled
    pub fn pending(&self) -> usize {
        self.live.len()
    }

    fn push(&mut self, due_ms: u64, handle: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse((due_ms, seq, handle)));
    }

    fn insert(&mut self, delay_ms: u64, timer: Timer, interval_ms: Option<u64>) -> TimerHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.live.insert(handle, Slot { timer, interval_ms });
        self.push(self.now_ms.saturating_add(delay_ms), handle);
        TimerHandle(handle)
    }

    /// Pop the next timer due at or before `until_ms`, moving the clock to its
    /// due time. When nothing is due the clock moves to `until_ms` and None is
    /// returned.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Timer> {
        while let Some(&Reverse((due, _, handle))) = self.queue.peek() {
            if due > until_ms {
                break;
            }
            self.queue.pop();
            let Some(slot) = self.live.get(&handle) else {
                continue;
            };
            let (timer, interval_ms) = (slot.timer, slot.interval_ms);
            self.now_ms = self.now_ms.max(due);
            match interval_ms {
                Some(interval) => self.push(due.saturating_add(interval), handle),
                None => {
                    self.live.remove(&handle);
                }
            }
            return Some(timer);
        }
        self.now_ms = self.now_ms.max(until_ms);
        None
    }
}

impl Scheduler for VirtualClock {
    fn schedule_repeating(&mut self, interval_ms: u64, timer: Timer) -> TimerHandle {
        let interval = interval_ms.max(1);
        self.insert(interval, timer, Some(interval))
    }

    fn schedule_once(&mut self, delay_ms: u64, timer: Timer) -> TimerHandle {
        self.insert(delay_ms, timer, None)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.live.remove(&handle.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(clock: &mut VirtualClock, until: u64) -> Vec<(u64, Timer)> {
        let mut fired = Vec::new();
        while let Some(timer) = clock.pop_due(until) {
            fired.push((clock.now_ms(), timer));
        }
        fired
    }

    #[test]
    fn test_once_fires_at_due_time() {
        let mut clock = VirtualClock::new();
        clock.schedule_once(1000, Timer::LevelTransition);
        assert!(drain(&mut clock, 999).is_empty());
        assert_eq!(clock.now_ms(), 999);
        assert_eq!(drain(&mut clock, 1000), vec![(1000, Timer::LevelTransition)]);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_repeating_fires_every_interval() {
        let mut clock = VirtualClock::new();
        clock.schedule_repeating(800, Timer::EnemyMove);
        let fired = drain(&mut clock, 2500);
        assert_eq!(
            fired,
            vec![
                (800, Timer::EnemyMove),
                (1600, Timer::EnemyMove),
                (2400, Timer::EnemyMove)
            ]
        );
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn test_cancel_stops_delivery() {
        let mut clock = VirtualClock::new();
        let tick = clock.schedule_repeating(100, Timer::WarningCountdown);
        let once = clock.schedule_once(50, Timer::Unfreeze);
        clock.cancel(once);
        assert_eq!(drain(&mut clock, 250).len(), 2);
        clock.cancel(tick);
        assert!(drain(&mut clock, 1000).is_empty());
        // Cancelling twice is harmless
        clock.cancel(tick);
    }

    #[test]
    fn test_same_instant_keeps_schedule_order() {
        let mut clock = VirtualClock::new();
        clock.schedule_once(500, Timer::EnemyEntry { enemy: 0, round: 1 });
        clock.schedule_once(500, Timer::AutoRespawn);
        let fired: Vec<Timer> = drain(&mut clock, 500).into_iter().map(|(_, t)| t).collect();
        assert_eq!(
            fired,
            vec![Timer::EnemyEntry { enemy: 0, round: 1 }, Timer::AutoRespawn]
        );
    }

    #[test]
    fn test_huge_delays_saturate() {
        let mut clock = VirtualClock::new();
        clock.schedule_once(10, Timer::Unfreeze);
        clock.schedule_once(u64::MAX, Timer::LevelTransition);
        assert_eq!(clock.pop_due(100), Some(Timer::Unfreeze));
        clock.schedule_once(u64::MAX, Timer::AutoRespawn);
        assert!(drain(&mut clock, u64::MAX - 1).is_empty());
        assert_eq!(clock.pending(), 2);
    }

    #[test]
    fn test_timers_scheduled_mid_drain_use_current_time() {
        let mut clock = VirtualClock::new();
        clock.schedule_once(300, Timer::Unfreeze);
        assert_eq!(clock.pop_due(1000), Some(Timer::Unfreeze));
        clock.schedule_once(200, Timer::LevelTransition);
        assert_eq!(drain(&mut clock, 1000), vec![(500, Timer::LevelTransition)]);
    }
}

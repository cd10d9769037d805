//! Simulated clock and timer queue.
//!
//! All combat timing runs on one logical timeline. The clock never reads the
//! wall clock: the frame collaborator advances it, and pending timers fire in
//! order of (fire time, scheduling order) while it does. This keeps casts,
//! DOT ticks and effect expiry deterministic and lets tests drive time
//! directly.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Handle returned when a timer is scheduled, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

impl TimerId {
    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Converts seconds to whole milliseconds. Negative durations clamp to zero.
#[must_use]
pub fn secs_to_ms(secs: f32) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (f64::from(secs) * 1000.0).round() as u64
    } else {
        0
    }
}

/// Entry in the timer heap.
#[derive(Debug)]
struct PendingTimer<T> {
    fire_at: u64,
    seq: u64,
    id: TimerId,
    task: T,
}

impl<T> PartialEq for PendingTimer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl<T> Eq for PendingTimer<T> {}

impl<T> Ord for PendingTimer<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: earliest fire time, then earliest
        // scheduled, must compare greatest.
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for PendingTimer<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Monotonic millisecond clock with a cancellable timer queue.
#[derive(Debug)]
pub struct Clock<T> {
    /// Current time in milliseconds since the clock was created.
    now_ms: u64,
    /// Sequence counter, doubles as the timer ID source.
    next_seq: u64,
    /// Scheduled timers, including cancelled ones not yet popped.
    queue: BinaryHeap<PendingTimer<T>>,
    /// Timers that are still armed.
    live: AHashSet<TimerId>,
}

impl<T> Default for Clock<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clock<T> {
    /// Creates a clock at time zero with no pending timers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            queue: BinaryHeap::new(),
            live: AHashSet::new(),
        }
    }

    /// Current time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Current time in seconds.
    #[must_use]
    pub fn now_secs(&self) -> f64 {
        self.now_ms as f64 / 1000.0
    }

    /// Schedules `task` to fire `after_secs` seconds from now.
    pub fn schedule(&mut self, after_secs: f32, task: T) -> TimerId {
        self.schedule_at(self.now_ms.saturating_add(secs_to_ms(after_secs)), task)
    }

    /// Schedules `task` at an absolute time. Times in the past fire on the
    /// next poll.
    pub fn schedule_at(&mut self, fire_at: u64, task: T) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = TimerId(seq);
        self.queue.push(PendingTimer {
            fire_at,
            seq,
            id,
            task,
        });
        self.live.insert(id);
        id
    }

    /// Cancels a pending timer. Returns false if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.live.remove(&id)
    }

    /// Checks whether a timer is still armed.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.live.contains(&id)
    }

    /// Number of armed timers.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.live.len()
    }

    /// Returns the deadline `dt_secs` from now, for use with [`Clock::pop_due`].
    #[must_use]
    pub fn deadline_after(&self, dt_secs: f32) -> u64 {
        self.now_ms.saturating_add(secs_to_ms(dt_secs))
    }

    /// Pops the next armed timer due at or before `deadline`.
    ///
    /// The clock moves to the timer's fire time before returning, so anything
    /// scheduled while handling it is relative to the moment it fired.
    pub fn pop_due(&mut self, deadline: u64) -> Option<(TimerId, T)> {
        loop {
            let head = self.queue.peek()?;
            if !self.live.contains(&head.id) {
                self.queue.pop();
                continue;
            }
            if head.fire_at > deadline {
                return None;
            }
            let timer = self.queue.pop()?;
            self.live.remove(&timer.id);
            self.now_ms = self.now_ms.max(timer.fire_at);
            return Some((timer.id, timer.task));
        }
    }

    /// Moves the clock forward to `time`. Never moves backwards.
    pub fn advance_to(&mut self, time: u64) {
        self.now_ms = self.now_ms.max(time);
    }

    /// Advances by `dt_secs`, returning every task that came due in order.
    pub fn advance(&mut self, dt_secs: f32) -> Vec<T> {
        let deadline = self.deadline_after(dt_secs);
        let mut fired = Vec::new();
        while let Some((_, task)) = self.pop_due(deadline) {
            fired.push(task);
        }
        self.advance_to(deadline);
        fired
    }

    /// Drops every pending timer. Time is left untouched.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.live.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_fire_in_time_order() {
        let mut clock = Clock::new();
        clock.schedule(2.0, "second");
        clock.schedule(1.0, "first");
        clock.schedule(3.0, "third");

        assert_eq!(clock.advance(0.5), Vec::<&str>::new());
        assert_eq!(clock.advance(2.0), vec!["first", "second"]);
        assert_eq!(clock.now_ms(), 2500);
        assert_eq!(clock.advance(1.0), vec!["third"]);
    }

    #[test]
    fn test_equal_fire_times_keep_schedule_order() {
        let mut clock = Clock::new();
        clock.schedule(1.0, 1);
        clock.schedule(1.0, 2);
        clock.schedule(1.0, 3);
        assert_eq!(clock.advance(1.0), vec![1, 2, 3]);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut clock = Clock::new();
        let a = clock.schedule(1.0, "a");
        clock.schedule(1.0, "b");

        assert!(clock.cancel(a));
        assert!(!clock.cancel(a));
        assert_eq!(clock.pending_count(), 1);
        assert_eq!(clock.advance(5.0), vec!["b"]);
    }

    #[test]
    fn test_pop_due_moves_clock_to_fire_time() {
        let mut clock = Clock::new();
        clock.schedule(1.0, ());
        let deadline = clock.deadline_after(10.0);

        assert!(clock.pop_due(deadline).is_some());
        assert_eq!(clock.now_ms(), 1000);

        // Rescheduling from inside a handler is relative to the fire time
        clock.schedule(1.0, ());
        assert!(clock.pop_due(deadline).is_some());
        assert_eq!(clock.now_ms(), 2000);
        assert!(clock.pop_due(deadline).is_none());
    }

    #[test]
    fn test_clock_is_monotonic() {
        let mut clock: Clock<()> = Clock::new();
        clock.advance_to(500);
        clock.advance_to(100);
        assert_eq!(clock.now_ms(), 500);
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut clock = Clock::new();
        let id = clock.schedule(1.0, ());
        clock.clear();
        assert!(!clock.is_pending(id));
        assert!(clock.advance(2.0).is_empty());
    }

    #[test]
    fn test_huge_durations_saturate() {
        let mut clock = Clock::new();
        clock.advance(1.0);
        let id = clock.schedule(1e30, ());
        assert_eq!(clock.deadline_after(1e30), u64::MAX);

        assert_eq!(clock.advance(1e30), vec![()]);
        assert!(!clock.is_pending(id));
        assert_eq!(clock.now_ms(), u64::MAX);
    }

    #[test]
    fn test_secs_to_ms() {
        assert_eq!(secs_to_ms(1.5), 1500);
        assert_eq!(secs_to_ms(0.0), 0);
        assert_eq!(secs_to_ms(-3.0), 0);
        assert_eq!(secs_to_ms(f32::NAN), 0);
    }
}

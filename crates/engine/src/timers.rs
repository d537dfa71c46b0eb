// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer queue for recurring renewals

use lh_core::clock::saturating_add;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::time::{Duration, Instant};

/// Identifies one registration in the queue
pub(crate) type TimerId = u64;

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    fire_at: Instant,
    interval: Duration,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.id == other.id
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap: earliest first, ties by id
        Reverse((self.fire_at, self.id)).cmp(&Reverse((other.fire_at, other.id)))
    }
}

/// Min-heap of fixed-rate repeating timers
#[derive(Default)]
pub(crate) struct TimerQueue {
    timers: BinaryHeap<Timer>,
    cancelled: HashSet<TimerId>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `id` at `first`, then every `interval` after that
    pub fn schedule_repeating(&mut self, id: TimerId, first: Instant, interval: Duration) {
        self.cancelled.remove(&id);
        self.timers.push(Timer {
            id,
            fire_at: first,
            interval,
        });
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.cancelled.insert(id);
    }

    /// Ids due at or before `now`, re-arming each at `fire_at + interval`
    pub fn poll(&mut self, now: Instant) -> Vec<TimerId> {
        let mut ready = Vec::new();

        while let Some(timer) = self.timers.peek() {
            if timer.fire_at > now {
                break;
            }
            let Some(timer) = self.timers.pop() else {
                break;
            };

            if self.cancelled.remove(&timer.id) {
                continue;
            }

            ready.push(timer.id);
            self.timers.push(Timer {
                fire_at: saturating_add(timer.fire_at, timer.interval),
                ..timer
            });
        }

        ready
    }

    /// Drop every timer
    pub fn clear(&mut self) {
        self.timers.clear();
        self.cancelled.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len() - self.cancelled.len().min(self.timers.len())
    }

    pub fn next_fire_time(&self) -> Option<Instant> {
        self.timers.peek().map(|timer| timer.fire_at)
    }
}

#[cfg(test)]
#[path = "timers_tests.rs"]
mod tests;

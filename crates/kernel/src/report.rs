use std::collections::VecDeque;
use std::time::Duration;

use deepfield_partition::PackStats;

/// Summary of one simulation tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    /// No interactable entities: nothing was placed, stepped, or synced.
    pub skipped: bool,
    pub interactable: usize,
    /// Entities whose authoritative position was reconciled this tick.
    pub synced: usize,
    pub groups: usize,
    /// Present in partitioned mode only.
    pub pack: Option<PackStats>,
    pub elapsed: Duration,
}

impl TickReport {
    pub fn overflowed(&self) -> bool {
        self.pack.as_ref().is_some_and(|p| p.overflowed)
    }
}

/// Rolling window of recent tick durations.
#[derive(Debug, Clone)]
pub struct TickTimer {
    history: VecDeque<Duration>,
    capacity: usize,
}

impl TickTimer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(dt);
    }

    pub fn count(&self) -> usize {
        self.history.len()
    }

    pub fn average(&self) -> Duration {
        if self.history.is_empty() {
            return Duration::ZERO;
        }
        self.history.iter().sum::<Duration>() / self.history.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.history.iter().copied().max().unwrap_or_default()
    }

    pub fn min(&self) -> Duration {
        self.history.iter().copied().min().unwrap_or_default()
    }
}

impl Default for TickTimer {
    fn default() -> Self {
        Self::new(120)
    }
}

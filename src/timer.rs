//! Named one-shot timers (§4.A), adapted to a per-session `tokio::select!`
//! reactor instead of a single-threaded OS-level `select()` loop: each
//! session owns one `TimerWheel`, polled via [`TimerWheel::next_expired`]
//! inside its event loop's `select!`.
//!
//! `timer_new` is a no-op if a timer with the same name already exists —
//! not a reset — matching the upstream semantics exactly.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

pub struct TimerWheel {
    timers: HashMap<&'static str, Instant>,
}

impl Default for TimerWheel {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerWheel {
    pub fn new() -> Self {
        Self {
            timers: HashMap::new(),
        }
    }

    /// Arm `name` to fire after `delay` from now, unless it is already armed.
    /// Returns `true` if it was newly armed.
    pub fn new_timer(&mut self, name: &'static str, delay: Duration) -> bool {
        if self.timers.contains_key(name) {
            return false;
        }
        self.timers.insert(name, Instant::now() + delay);
        true
    }

    pub fn del(&mut self, name: &'static str) {
        self.timers.remove(name);
    }

    /// §5 "cancellation": called when a session dies.
    pub fn delall(&mut self) {
        self.timers.clear();
    }

    pub fn is_armed(&self, name: &'static str) -> bool {
        self.timers.contains_key(name)
    }

    /// The earliest deadline across all armed timers, for use as the sleep
    /// target in the owning session's `select!`.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().min().copied()
    }

    /// Remove and return every timer whose deadline has passed.
    pub fn take_expired(&mut self) -> Vec<&'static str> {
        let now = Instant::now();
        let fired: Vec<&'static str> = self
            .timers
            .iter()
            .filter(|(_, &deadline)| deadline <= now)
            .map(|(&name, _)| name)
            .collect();
        for name in &fired {
            self.timers.remove(name);
        }
        fired
    }
}

use std::time::Duration;

/// A single decrementing duration driven by external ticks.
///
/// The countdown never reads a clock itself; callers feed it the time that
/// elapsed since the previous tick. Once `remaining` reaches zero the
/// countdown stays expired until it is primed again with [`Countdown::set_target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: Duration,
    running: bool,
}

impl Countdown {
    /// A stopped countdown primed to `target`.
    pub fn new(target: Duration) -> Self {
        Self {
            remaining: target,
            running: false,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Start if paused, pause if running.
    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Prime the countdown with a fresh duration. Always leaves it stopped.
    pub fn set_target(&mut self, target: Duration) {
        self.remaining = target;
        self.running = false;
    }

    /// Advance by `elapsed`. Returns true only on the tick that drives
    /// `remaining` to zero.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if !self.running || self.expired() {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(elapsed);

        if self.expired() {
            self.running = false;
            true
        } else {
            false
        }
    }

    pub fn expired(&self) -> bool {
        self.remaining.is_zero()
    }
}

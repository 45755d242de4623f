use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app loop
#[derive(Clone, Debug)]
pub enum PomEvent {
    Key(KeyEvent),
    Resize,
    /// Carries the wall time since the previous tick
    Tick(Duration),
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait PomEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<PomEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<PomEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(PomEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(PomEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(%err, "terminal input reader stopped");
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PomEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PomEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<PomEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<PomEvent>) -> Self {
        Self { rx }
    }
}

impl PomEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PomEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Merges input events and periodic ticks into one ordered stream.
///
/// Ticks are scheduled against a deadline, so a burst of key presses never
/// starves the countdown, and each tick reports exactly the time since the
/// previous one.
pub struct Runner<E: PomEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    last_tick: Instant,
}

impl<E: PomEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            last_tick: Instant::now(),
        }
    }

    /// Blocks until the next event or the next tick deadline, whichever comes first
    pub fn step(&mut self) -> PomEvent {
        let wait = self
            .ticker
            .interval()
            .saturating_sub(self.last_tick.elapsed());
        if wait.is_zero() {
            return PomEvent::Tick(self.split_tick());
        }

        match self.event_source.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => PomEvent::Tick(self.split_tick()),
            Err(RecvTimeoutError::Disconnected) => {
                // Input is gone; keep time moving at the tick rate
                std::thread::sleep(wait);
                PomEvent::Tick(self.split_tick())
            }
        }
    }

    /// Time since the last tick, restarting the interval from now.
    ///
    /// Called before acting on a key so time spent before a start/pause is
    /// charged to the state it was spent in.
    pub fn split_tick(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;
        elapsed
    }
}

//! The pomodoro state machine.
//!
//! [`transition`] is a pure function from the current [`SessionState`] and one
//! [`Event`] to the next state plus the [`Effect`]s the caller must perform.
//! [`SessionController`] owns the state between events and is what the event
//! loop talks to.

use std::time::Duration;

use tracing::{debug, info};

use crate::countdown::Countdown;
use crate::error::ConfigError;

const NOTIFICATION_TITLE: &str = "Pom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    work_duration: Duration,
    break_duration: Duration,
    total_cycles: u32,
}

impl SessionConfig {
    pub fn new(
        work_duration: Duration,
        break_duration: Duration,
        total_cycles: u32,
    ) -> Result<Self, ConfigError> {
        if work_duration.is_zero() {
            return Err(ConfigError::NotPositive {
                field: "work duration",
            });
        }
        if break_duration.is_zero() {
            return Err(ConfigError::NotPositive {
                field: "break duration",
            });
        }
        if total_cycles == 0 {
            return Err(ConfigError::NotPositive { field: "cycles" });
        }

        Ok(Self {
            work_duration,
            break_duration,
            total_cycles,
        })
    }

    pub fn work_duration(&self) -> Duration {
        self.work_duration
    }

    pub fn break_duration(&self) -> Duration {
        self.break_duration
    }

    pub fn total_cycles(&self) -> u32 {
        self.total_cycles
    }

    /// Countdown length for a phase. `Finished` has none.
    pub fn duration_for(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Work => self.work_duration,
            Phase::Break => self.break_duration,
            Phase::Finished => Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Work,
    Break,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    pub completed_cycles: u32,
    pub countdown: Countdown,
}

impl SessionState {
    /// Work phase, nothing completed, countdown primed but not running.
    pub fn initial(config: &SessionConfig) -> Self {
        Self {
            phase: Phase::Work,
            completed_cycles: 0,
            countdown: Countdown::new(config.work_duration()),
        }
    }

    pub fn snapshot(&self, config: &SessionConfig) -> Snapshot {
        Snapshot {
            phase: self.phase,
            remaining: self.countdown.remaining(),
            running: self.countdown.is_running(),
            completed_cycles: self.completed_cycles,
            total_cycles: config.total_cycles(),
        }
    }
}

/// Input consumed by the controller. Raw key codes are mapped to these by
/// [`crate::keymap::Keymap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Start if paused, pause if running.
    Toggle,
    /// Re-prime the current phase's countdown and stop it.
    Reset,
    Quit,
    /// Time that passed since the previous tick.
    Tick(Duration),
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub phase: Phase,
    pub remaining: Duration,
    pub running: bool,
    pub completed_cycles: u32,
    pub total_cycles: u32,
}

/// Desktop notifications fired at phase boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    BreakStarted,
    WorkStarted,
    SessionFinished,
}

impl Notice {
    pub fn title(&self) -> &'static str {
        NOTIFICATION_TITLE
    }

    pub fn message(&self) -> &'static str {
        match self {
            Notice::BreakStarted => "You are on break!",
            Notice::WorkStarted => "Start working...",
            Notice::SessionFinished => "Session finished!",
        }
    }
}

/// Side effects requested by [`transition`], in the order they should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Notify(Notice),
    Render(Snapshot),
    Terminate,
}

/// Apply one event. Emits at most one `Notify`, always one `Render`, and a
/// trailing `Terminate` when the session has ended.
pub fn transition(
    config: &SessionConfig,
    mut state: SessionState,
    event: Event,
) -> (SessionState, Vec<Effect>) {
    let mut effects = Vec::new();
    let mut terminate = false;

    match event {
        Event::Quit => {
            finish(&mut state);
            terminate = true;
        }
        _ if state.phase == Phase::Finished => {}
        Event::Reset => {
            state
                .countdown
                .set_target(config.duration_for(state.phase));
        }
        Event::Toggle => state.countdown.toggle(),
        Event::Tick(elapsed) => {
            if state.countdown.tick(elapsed) {
                if let Some(notice) = on_expiry(config, &mut state) {
                    terminate = state.phase == Phase::Finished;
                    effects.push(Effect::Notify(notice));
                }
            }
        }
    }

    effects.push(Effect::Render(state.snapshot(config)));
    if terminate {
        effects.push(Effect::Terminate);
    }

    (state, effects)
}

/// Work always hands over to a break; cycles are counted when a break ends.
/// A countdown expiring in `Finished` changes nothing.
fn on_expiry(config: &SessionConfig, state: &mut SessionState) -> Option<Notice> {
    let (next, notice) = match state.phase {
        Phase::Work => (Phase::Break, Notice::BreakStarted),
        Phase::Break => {
            state.completed_cycles += 1;
            if state.completed_cycles >= config.total_cycles() {
                (Phase::Finished, Notice::SessionFinished)
            } else {
                (Phase::Work, Notice::WorkStarted)
            }
        }
        Phase::Finished => {
            finish(state);
            return None;
        }
    };

    if next == Phase::Finished {
        finish(state);
    } else {
        state.phase = next;
        state.countdown.set_target(config.duration_for(next));
        state.countdown.start();
    }

    Some(notice)
}

fn finish(state: &mut SessionState) {
    state.phase = Phase::Finished;
    state.countdown.set_target(Duration::ZERO);
}

/// Owns the session between events.
#[derive(Debug)]
pub struct SessionController {
    config: SessionConfig,
    state: SessionState,
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            state: SessionState::initial(&config),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot(&self.config)
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase == Phase::Finished
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        if !matches!(event, Event::Tick(_)) {
            debug!(?event, phase = %self.state.phase, "input event");
        }

        let before = self.state.phase;
        let (next, effects) = transition(&self.config, self.state, event);
        self.state = next;

        if before != next.phase {
            info!(
                from = %before,
                to = %next.phase,
                completed = next.completed_cycles,
                total = self.config.total_cycles(),
                "phase change"
            );
        }

        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const MINUTE: Duration = Duration::from_secs(60);

    fn config(work_mins: u64, break_mins: u64, cycles: u32) -> SessionConfig {
        SessionConfig::new(MINUTE * work_mins as u32, MINUTE * break_mins as u32, cycles).unwrap()
    }

    fn notices(effects: &[Effect]) -> Vec<Notice> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Notify(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    fn terminates(effects: &[Effect]) -> bool {
        effects.iter().any(|e| matches!(e, Effect::Terminate))
    }

    #[test]
    fn test_config_rejects_zero_values() {
        assert_eq!(
            SessionConfig::new(Duration::ZERO, MINUTE, 1),
            Err(ConfigError::NotPositive {
                field: "work duration"
            })
        );
        assert_eq!(
            SessionConfig::new(MINUTE, Duration::ZERO, 1),
            Err(ConfigError::NotPositive {
                field: "break duration"
            })
        );
        assert_eq!(
            SessionConfig::new(MINUTE, MINUTE, 0),
            Err(ConfigError::NotPositive { field: "cycles" })
        );
    }

    #[test]
    fn test_initial_state() {
        let cfg = config(25, 5, 4);
        let state = SessionState::initial(&cfg);

        assert_eq!(state.phase, Phase::Work);
        assert_eq!(state.completed_cycles, 0);
        assert!(!state.countdown.is_running());
        assert_eq!(state.countdown.remaining(), MINUTE * 25);
    }

    #[test]
    fn test_every_event_renders_once() {
        let cfg = config(25, 5, 4);
        let mut ctl = SessionController::new(cfg);

        for event in [
            Event::Toggle,
            Event::Tick(Duration::from_millis(100)),
            Event::Reset,
            Event::Quit,
        ] {
            let effects = ctl.handle(event);
            let renders = effects
                .iter()
                .filter(|e| matches!(e, Effect::Render(_)))
                .count();
            assert_eq!(renders, 1, "event {:?}", event);
        }
    }

    #[test]
    fn test_toggle_starts_and_pauses() {
        let mut ctl = SessionController::new(config(25, 5, 4));

        ctl.handle(Event::Toggle);
        assert!(ctl.snapshot().running);

        ctl.handle(Event::Toggle);
        assert!(!ctl.snapshot().running);
    }

    #[test]
    fn test_ticks_ignored_until_started() {
        let mut ctl = SessionController::new(config(25, 5, 4));
        ctl.handle(Event::Tick(MINUTE * 30));
        assert_eq!(ctl.snapshot().remaining, MINUTE * 25);
        assert_eq!(ctl.snapshot().phase, Phase::Work);
    }

    #[test]
    fn test_full_cycle_scenario() {
        let mut ctl = SessionController::new(config(1, 1, 2));
        ctl.handle(Event::Toggle);

        // Work -> Break
        let effects = ctl.handle(Event::Tick(MINUTE));
        assert_eq!(notices(&effects), vec![Notice::BreakStarted]);
        assert_eq!(ctl.state().phase, Phase::Break);
        assert_eq!(ctl.state().completed_cycles, 0);
        assert!(ctl.snapshot().running);
        assert_eq!(ctl.snapshot().remaining, MINUTE);
        assert!(!terminates(&effects));

        // Break -> Work
        let effects = ctl.handle(Event::Tick(MINUTE));
        assert_eq!(notices(&effects), vec![Notice::WorkStarted]);
        assert_eq!(ctl.state().phase, Phase::Work);
        assert_eq!(ctl.state().completed_cycles, 1);
        assert!(ctl.snapshot().running);

        // Work -> Break
        let effects = ctl.handle(Event::Tick(MINUTE));
        assert_eq!(notices(&effects), vec![Notice::BreakStarted]);
        assert_eq!(ctl.state().phase, Phase::Break);

        // Break -> Finished
        let effects = ctl.handle(Event::Tick(MINUTE));
        assert_eq!(notices(&effects), vec![Notice::SessionFinished]);
        assert_eq!(ctl.state().phase, Phase::Finished);
        assert_eq!(ctl.state().completed_cycles, 2);
        assert_matches!(effects.last(), Some(Effect::Terminate));
        assert!(ctl.is_finished());
    }

    #[test]
    fn test_effect_order_on_transition() {
        let mut ctl = SessionController::new(config(1, 1, 1));
        ctl.handle(Event::Toggle);
        ctl.handle(Event::Tick(MINUTE));

        let effects = ctl.handle(Event::Tick(MINUTE));
        assert_matches!(
            effects.as_slice(),
            [
                Effect::Notify(Notice::SessionFinished),
                Effect::Render(Snapshot {
                    phase: Phase::Finished,
                    completed_cycles: 1,
                    total_cycles: 1,
                    ..
                }),
                Effect::Terminate
            ]
        );
    }

    #[test]
    fn test_partial_ticks_accumulate() {
        let mut ctl = SessionController::new(config(1, 1, 1));
        ctl.handle(Event::Toggle);

        for _ in 0..599 {
            let effects = ctl.handle(Event::Tick(Duration::from_millis(100)));
            assert!(notices(&effects).is_empty());
        }
        assert_eq!(ctl.snapshot().remaining, Duration::from_millis(100));

        let effects = ctl.handle(Event::Tick(Duration::from_millis(100)));
        assert_eq!(notices(&effects), vec![Notice::BreakStarted]);
    }

    #[test]
    fn test_quit_from_any_state() {
        let cfg = config(25, 5, 4);
        let setups: Vec<Vec<Event>> = vec![
            vec![],
            vec![Event::Toggle],
            vec![Event::Toggle, Event::Tick(MINUTE)],
            vec![Event::Toggle, Event::Tick(MINUTE * 25)],
            vec![Event::Toggle, Event::Tick(MINUTE * 25), Event::Toggle],
        ];

        for setup in setups {
            let mut ctl = SessionController::new(cfg);
            for event in &setup {
                ctl.handle(*event);
            }

            let effects = ctl.handle(Event::Quit);
            assert_eq!(ctl.state().phase, Phase::Finished, "after {:?}", setup);
            assert!(notices(&effects).is_empty());
            assert_matches!(effects.last(), Some(Effect::Terminate));
            assert!(!ctl.snapshot().running);
        }
    }

    #[test]
    fn test_quit_does_not_count_cycle() {
        let mut ctl = SessionController::new(config(1, 1, 3));
        ctl.handle(Event::Toggle);
        ctl.handle(Event::Tick(MINUTE));
        ctl.handle(Event::Quit);
        assert_eq!(ctl.state().completed_cycles, 0);
    }

    #[test]
    fn test_reset_during_work() {
        let mut ctl = SessionController::new(config(25, 5, 4));
        ctl.handle(Event::Toggle);
        ctl.handle(Event::Tick(MINUTE * 25 - Duration::from_secs(10)));
        assert_eq!(ctl.snapshot().remaining, Duration::from_secs(10));

        ctl.handle(Event::Reset);
        assert_eq!(ctl.snapshot().remaining, MINUTE * 25);
        assert!(!ctl.snapshot().running);
        assert_eq!(ctl.snapshot().phase, Phase::Work);
    }

    #[test]
    fn test_reset_during_break_uses_break_duration() {
        let mut ctl = SessionController::new(config(25, 5, 4));
        ctl.handle(Event::Toggle);
        ctl.handle(Event::Tick(MINUTE * 25));
        ctl.handle(Event::Tick(MINUTE * 2));
        assert_eq!(ctl.snapshot().remaining, MINUTE * 3);

        ctl.handle(Event::Reset);
        assert_eq!(ctl.snapshot().remaining, MINUTE * 5);
        assert!(!ctl.snapshot().running);
        assert_eq!(ctl.snapshot().phase, Phase::Break);
    }

    #[test]
    fn test_finished_ignores_input() {
        let mut ctl = SessionController::new(config(1, 1, 1));
        ctl.handle(Event::Quit);
        let frozen = ctl.snapshot();

        for event in [Event::Toggle, Event::Reset, Event::Tick(MINUTE)] {
            let effects = ctl.handle(event);
            assert_eq!(effects, vec![Effect::Render(frozen)]);
        }
    }

    #[test]
    fn test_expiry_in_finished_state_is_inert() {
        let cfg = config(1, 1, 2);
        let mut countdown = Countdown::new(MINUTE);
        countdown.start();
        let state = SessionState {
            phase: Phase::Finished,
            completed_cycles: 1,
            countdown,
        };

        let mut next = state;
        assert!(on_expiry(&cfg, &mut next).is_none());
        assert_eq!(next.phase, Phase::Finished);
        assert_eq!(next.completed_cycles, 1);
        assert!(!next.countdown.is_running());

        let (after, effects) = transition(&cfg, state, Event::Tick(MINUTE * 2));
        assert_eq!(after.phase, Phase::Finished);
        assert!(notices(&effects).is_empty());
        assert!(!terminates(&effects));
    }

    #[test]
    fn test_transition_is_pure() {
        let cfg = config(1, 1, 1);
        let state = SessionState::initial(&cfg);

        let (a, fx_a) = transition(&cfg, state, Event::Toggle);
        let (b, fx_b) = transition(&cfg, state, Event::Toggle);
        assert_eq!(a, b);
        assert_eq!(fx_a, fx_b);
        assert_eq!(state, SessionState::initial(&cfg));
    }

    #[test]
    fn test_notice_text() {
        assert_eq!(Notice::BreakStarted.title(), "Pom");
        assert_eq!(Notice::BreakStarted.message(), "You are on break!");
        assert_eq!(Notice::WorkStarted.message(), "Start working...");
        assert_eq!(Notice::SessionFinished.message(), "Session finished!");
    }
}

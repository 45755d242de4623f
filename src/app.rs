use std::io;

use ratatui::{backend::Backend, Terminal};

use crate::{
    keymap::Keymap,
    notify::{deliver, Notifier},
    runtime::{PomEvent, PomEventSource, Runner, Ticker},
    session::{Effect, Event, SessionController, Snapshot},
    ui::TimerView,
};

/// Everything the event loop needs besides the terminal
pub struct App<N: Notifier> {
    pub controller: SessionController,
    pub keymap: Keymap,
    pub notifier: N,
}

impl<N: Notifier> App<N> {
    pub fn new(controller: SessionController, keymap: Keymap, notifier: N) -> Self {
        Self {
            controller,
            keymap,
            notifier,
        }
    }

    /// Drive the session until it terminates. Keys and ticks are processed one
    /// at a time, each event's effects run to completion before the next.
    pub fn run<B, E, T>(&mut self, terminal: &mut Terminal<B>, runner: &mut Runner<E, T>) -> io::Result<()>
    where
        B: Backend,
        E: PomEventSource,
        T: Ticker,
    {
        self.draw(terminal, &self.controller.snapshot())?;

        while !self.step(terminal, runner)? {}
        Ok(())
    }

    /// Process the next runner event. Returns true once the session asked to
    /// terminate.
    pub fn step<B, E, T>(&mut self, terminal: &mut Terminal<B>, runner: &mut Runner<E, T>) -> io::Result<bool>
    where
        B: Backend,
        E: PomEventSource,
        T: Ticker,
    {
        match runner.step() {
            PomEvent::Tick(elapsed) => self.dispatch(terminal, Event::Tick(elapsed)),
            PomEvent::Resize => {
                self.draw(terminal, &self.controller.snapshot())?;
                Ok(false)
            }
            PomEvent::Key(key) => {
                let Some(event) = self.keymap.action(&key) else {
                    return Ok(false);
                };
                // Settle the time since the last tick before the key can
                // start or pause the countdown
                if self.dispatch(terminal, Event::Tick(runner.split_tick()))? {
                    return Ok(true);
                }
                self.dispatch(terminal, event)
            }
        }
    }

    fn dispatch<B: Backend>(&mut self, terminal: &mut Terminal<B>, event: Event) -> io::Result<bool> {
        for effect in self.controller.handle(event) {
            match effect {
                Effect::Notify(notice) => deliver(&self.notifier, notice),
                Effect::Render(snapshot) => self.draw(terminal, &snapshot)?,
                Effect::Terminate => return Ok(true),
            }
        }
        Ok(false)
    }

    fn draw<B: Backend>(&self, terminal: &mut Terminal<B>, snapshot: &Snapshot) -> io::Result<()> {
        let view = TimerView::new(snapshot, &self.keymap);
        terminal.draw(|f| f.render_widget(&view, f.area()))?;
        Ok(())
    }
}

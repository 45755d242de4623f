use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::session::Event;

/// Key bindings for the three session controls.
///
/// One key toggles start/pause. Quit is always reachable through ctrl+c as
/// well as its own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keymap {
    pub toggle: char,
    pub reset: char,
    pub quit: char,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            toggle: 's',
            reset: 'r',
            quit: 'q',
        }
    }
}

/// A single entry in the help bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub key: String,
    pub action: &'static str,
}

impl Keymap {
    pub fn action(&self, key: &KeyEvent) -> Option<Event> {
        // Windows reports releases too
        if key.kind == KeyEventKind::Release {
            return None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Event::Quit),
            KeyCode::Esc => Some(Event::Quit),
            KeyCode::Char(c) if c == self.quit => Some(Event::Quit),
            KeyCode::Char(c) if c == self.toggle => Some(Event::Toggle),
            KeyCode::Char(c) if c == self.reset => Some(Event::Reset),
            _ => None,
        }
    }

    /// Help bar entries. The toggle label follows the countdown state.
    pub fn help(&self, running: bool) -> Vec<HelpEntry> {
        vec![
            HelpEntry {
                key: self.toggle.to_string(),
                action: if running { "pause" } else { "start" },
            },
            HelpEntry {
                key: self.reset.to_string(),
                action: "reset",
            },
            HelpEntry {
                key: self.quit.to_string(),
                action: "quit",
            },
        ]
    }
}

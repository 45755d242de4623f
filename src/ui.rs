use std::time::Duration;

use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::{
    keymap::Keymap,
    session::{Phase, Snapshot},
};

const HORIZONTAL_MARGIN: u16 = 5;

/// Format a countdown as `MM:SS`, or `H:MM:SS` from one hour up.
/// Partial seconds round up so the display only reads `00:00` once expired.
pub fn format_remaining(remaining: Duration) -> String {
    let total_secs = remaining.as_millis().div_ceil(1000) as u64;
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;

    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

/// One frame of the timer screen, built from a controller snapshot
pub struct TimerView<'a> {
    pub snapshot: &'a Snapshot,
    pub keymap: &'a Keymap,
    pub now: DateTime<Local>,
}

impl<'a> TimerView<'a> {
    pub fn new(snapshot: &'a Snapshot, keymap: &'a Keymap) -> Self {
        Self {
            snapshot,
            keymap,
            now: Local::now(),
        }
    }

    fn phase_label(&self) -> (&'static str, Color) {
        match self.snapshot.phase {
            Phase::Work => ("Working", Color::Red),
            Phase::Break => ("On break", Color::Green),
            Phase::Finished => ("Finished", Color::Cyan),
        }
    }

    /// Wall-clock time the current phase ends, shown only while counting
    pub fn ends_at(&self) -> Option<DateTime<Local>> {
        if !self.snapshot.running || self.snapshot.phase == Phase::Finished {
            return None;
        }
        chrono::Duration::from_std(self.snapshot.remaining)
            .ok()
            .map(|d| self.now + d)
    }

    fn status_line(&self) -> Line<'static> {
        let (label, color) = self.phase_label();
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let mut spans = vec![Span::styled(label.to_string(), bold.fg(color))];
        if self.snapshot.phase != Phase::Finished {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format_remaining(self.snapshot.remaining),
                bold,
            ));
            if !self.snapshot.running {
                spans.push(Span::styled(
                    "  (paused)",
                    Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
                ));
            }
        }
        Line::from(spans)
    }

    fn cycles_line(&self) -> Line<'static> {
        let mut text = format!(
            "{}/{} cycles",
            self.snapshot.completed_cycles, self.snapshot.total_cycles
        );
        if let Some(end) = self.ends_at() {
            text.push_str(&format!("  ·  ends at {}", end.format("%H:%M")));
        }
        Line::from(Span::styled(text, Style::default().fg(Color::Magenta)))
    }

    fn help_line(&self) -> Line<'static> {
        let key_style = Style::default().add_modifier(Modifier::BOLD);
        let dim = Style::default().add_modifier(Modifier::DIM);

        let mut spans = Vec::new();
        for (idx, entry) in self.keymap.help(self.snapshot.running).into_iter().enumerate() {
            if idx > 0 {
                spans.push(Span::styled(" • ", dim));
            }
            spans.push(Span::styled(entry.key, key_style));
            spans.push(Span::styled(format!(" {}", entry.action), dim));
        }
        Line::from(spans)
    }
}

impl Widget for &TimerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let content_height = 5;
        let pad = area.height.saturating_sub(content_height) / 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints(
                [
                    Constraint::Length(pad),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Min(0),
                ]
                .as_ref(),
            )
            .split(area);

        Paragraph::new(self.status_line())
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
        Paragraph::new(self.cycles_line())
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
        Paragraph::new(self.help_line())
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }
}

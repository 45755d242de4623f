use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use pom::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    error::ConfigError,
    keymap::Keymap,
    logging,
    notify::{DesktopNotifier, Notifier, SilentNotifier, FLUSH_TIMEOUT},
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    session::{SessionConfig, SessionController},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};
use tracing::{info, warn};

/// pomodoro timer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Alternates work and break countdowns for a number of cycles and sends a desktop notification at every switch. Run without arguments to use your saved defaults (25/5/4 out of the box)."
)]
pub struct Cli {
    /// work duration in minutes
    #[clap(value_name = "WORK")]
    work: Option<u64>,

    /// break duration in minutes
    #[clap(value_name = "BREAK")]
    break_len: Option<u64>,

    /// number of work+break cycles to run
    #[clap(value_name = "CYCLES")]
    cycles: Option<u32>,

    /// read WORK and BREAK as seconds instead of minutes
    #[clap(long)]
    seconds: bool,

    /// countdown refresh interval in milliseconds
    #[clap(long = "tick-ms", value_name = "MS")]
    tick_ms: Option<u64>,

    /// don't send desktop notifications
    #[clap(long)]
    no_notify: bool,

    /// store WORK, BREAK and CYCLES as the defaults for future runs
    #[clap(long, requires = "work", conflicts_with = "seconds")]
    save_defaults: bool,
}

impl Cli {
    /// Resolve the session from positional values, or from stored defaults
    /// when none were given.
    fn session_config(&self, defaults: &Config) -> Result<SessionConfig, ConfigError> {
        let (work, break_len, cycles) = match (self.work, self.break_len, self.cycles) {
            (None, None, None) => (
                defaults.work_minutes,
                defaults.break_minutes,
                defaults.cycles,
            ),
            (Some(w), Some(b), Some(c)) => (w, b, c),
            (w, b, c) => {
                let given = [w.is_some(), b.is_some(), c.is_some()]
                    .iter()
                    .filter(|g| **g)
                    .count();
                return Err(ConfigError::ArgumentCount(given));
            }
        };

        let unit_secs = if self.seconds { 1 } else { 60 };
        SessionConfig::new(
            Duration::from_secs(work.saturating_mul(unit_secs)),
            Duration::from_secs(break_len.saturating_mul(unit_secs)),
            cycles,
        )
    }

    /// Apply command line overrides on top of the stored config
    fn apply_overrides(&self, mut cfg: Config) -> Config {
        if let Some(ms) = self.tick_ms {
            cfg.tick_rate_ms = ms;
        }
        if self.no_notify {
            cfg.notifications = false;
        }
        cfg
    }
}

fn config_error_kind(err: &ConfigError) -> ErrorKind {
    match err {
        ConfigError::ArgumentCount(_) => ErrorKind::WrongNumberOfValues,
        ConfigError::NotPositive { .. } => ErrorKind::ValueValidation,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    logging::init(AppDirs::log_path().as_deref());

    let store = FileConfigStore::new();
    let stored = store.load();

    let session_config = match cli.session_config(&stored) {
        Ok(cfg) => cfg,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(config_error_kind(&err), err).exit();
        }
    };

    if cli.save_defaults {
        let updated = Config {
            work_minutes: session_config.work_duration().as_secs() / 60,
            break_minutes: session_config.break_duration().as_secs() / 60,
            cycles: session_config.total_cycles(),
            ..stored.clone()
        };
        match store.save(&updated) {
            Ok(()) => info!(path = %store.path().display(), "saved defaults"),
            Err(err) => warn!(%err, "could not save defaults"),
        }
    }

    let settings = cli.apply_overrides(stored);

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    info!(
        work_secs = session_config.work_duration().as_secs(),
        break_secs = session_config.break_duration().as_secs(),
        cycles = session_config.total_cycles(),
        "starting session"
    );

    let notifier: Box<dyn Notifier> = if settings.notifications {
        Box::new(DesktopNotifier::new())
    } else {
        Box::new(SilentNotifier)
    };
    let mut app = App::new(
        SessionController::new(session_config),
        Keymap::default(),
        notifier,
    );
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(settings.tick_rate()),
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal, &mut runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    // The final notice is usually still being shown when the loop ends
    app.notifier.flush(FLUSH_TIMEOUT);

    result?;

    let snapshot = app.controller.snapshot();
    info!(
        completed = snapshot.completed_cycles,
        total = snapshot.total_cycles,
        "session ended"
    );
    println!(
        "Goodbye! {}/{} cycles completed.",
        snapshot.completed_cycles, snapshot.total_cycles
    );

    Ok(())
}

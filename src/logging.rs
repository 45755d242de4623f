use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `POM_LOG=debug`
pub const LOG_ENV: &str = "POM_LOG";

/// Route `tracing` output to `path`. The terminal belongs to the TUI, so
/// nothing is ever written to stdout or stderr. If the file can't be opened
/// logging stays off.
pub fn init(path: Option<&Path>) {
    let Some(path) = path else { return };

    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }

    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(_) => return,
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Send tracing output to `~/.sshh/sshh.log`. The terminal belongs to the
/// TUI and the ssh child, so nothing is ever written to it.
///
/// `RUST_LOG` overrides `level`. If the log file cannot be opened, logging
/// stays off.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let Ok(dir) = crate::config::sshh_dir() else {
        return;
    };
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("sshh.log"))
    else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

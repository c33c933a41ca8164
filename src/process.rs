use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::config::Config;
use crate::display;
use crate::health;
use crate::model::Tunnel;
use crate::ssh;

/// Shell convention for a process killed by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 128 + libc::SIGINT;

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Code(i32),
    /// Killed by a signal; the number is only known on unix.
    Signaled(Option<i32>),
}

impl From<ExitStatus> for ExitKind {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => ExitKind::Code(code),
            None => ExitKind::Signaled(signal_of(&status)),
        }
    }
}

#[cfg(unix)]
fn signal_of(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: &ExitStatus) -> Option<i32> {
    None
}

impl std::fmt::Display for ExitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitKind::Code(code) => write!(f, "exit status {}", code),
            ExitKind::Signaled(Some(sig)) => write!(f, "killed by signal {}", sig),
            ExitKind::Signaled(None) => f.write_str("killed by signal"),
        }
    }
}

/// What the supervisor observed. A run reports `ConnectFailed` alone, or
/// `Connected` followed by one of the two disconnect outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Connected,
    ConnectFailed(ExitKind),
    DisconnectedNormally,
    DisconnectedWithError(ExitKind),
}

#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("'{0}' not found — is the ssh client installed?")]
    NotFound(String),
    #[error("failed to start '{bin}'")]
    Spawn {
        bin: String,
        #[source]
        source: io::Error,
    },
    #[error("failed waiting for the ssh process")]
    Wait(#[source] io::Error),
    #[error("lost track of the ssh process")]
    MonitorLost,
    #[error("local port {0} is already in use — stop the conflicting process first")]
    PortInUse(u16),
    #[error("tunnel '{0}' failed to connect")]
    ConnectFailed(String),
    #[error("tunnel '{name}' disconnected ({exit})")]
    Disconnected { name: String, exit: ExitKind },
}

/// A process the supervisor can block on.
pub trait TunnelProcess: Send + 'static {
    fn wait(&mut self) -> io::Result<ExitKind>;
}

impl TunnelProcess for Child {
    fn wait(&mut self) -> io::Result<ExitKind> {
        Child::wait(self).map(ExitKind::from)
    }
}

/// Result of racing a blocking call against a deadline.
pub enum Race<T> {
    Finished(T),
    /// Deadline passed first; the call is still running.
    Running(Pending<T>),
    /// The worker thread went away without producing a value.
    Lost,
}

pub struct Pending<T> {
    rx: Receiver<T>,
}

impl<T> Pending<T> {
    /// Block until the call completes.
    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }
}

/// Run `work` on its own thread and wait for whichever comes first: its
/// result or `deadline`.
pub fn first_of<T, F>(work: F, deadline: Duration) -> Race<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(work());
    });
    match rx.recv_timeout(deadline) {
        Ok(value) => Race::Finished(value),
        Err(RecvTimeoutError::Timeout) => Race::Running(Pending { rx }),
        Err(RecvTimeoutError::Disconnected) => Race::Lost,
    }
}

/// Exit after having connected. Interrupts are the user stopping the tunnel.
pub fn classify_exit(exit: ExitKind) -> Outcome {
    match exit {
        ExitKind::Code(0) => Outcome::DisconnectedNormally,
        ExitKind::Code(code) if code == INTERRUPTED_EXIT_CODE => Outcome::DisconnectedNormally,
        // no exit code at all: the process died from a signal
        ExitKind::Signaled(_) => Outcome::DisconnectedNormally,
        other => Outcome::DisconnectedWithError(other),
    }
}

/// Watch `process` until it exits, reporting each outcome as it happens.
///
/// Exiting inside `window` means the connection never came up. Still running
/// at the end of `window` means connected; the final exit is then classified.
pub fn supervise<P, R>(mut process: P, window: Duration, mut report: R) -> Result<Outcome, TunnelError>
where
    P: TunnelProcess,
    R: FnMut(&Outcome),
{
    let pending = match first_of(move || process.wait(), window) {
        Race::Finished(exit) => {
            let outcome = Outcome::ConnectFailed(exit.map_err(TunnelError::Wait)?);
            tracing::info!(?outcome, "tunnel exited inside observation window");
            report(&outcome);
            return Ok(outcome);
        }
        Race::Running(pending) => pending,
        Race::Lost => return Err(TunnelError::MonitorLost),
    };

    tracing::info!("tunnel still running after observation window");
    report(&Outcome::Connected);

    let exit = pending
        .wait()
        .ok_or(TunnelError::MonitorLost)?
        .map_err(TunnelError::Wait)?;
    let outcome = classify_exit(exit);
    tracing::info!(?outcome, "tunnel exited");
    report(&outcome);
    Ok(outcome)
}

/// Start an ssh forward for `tunnel` on the current terminal and supervise it.
pub fn run_tunnel(tunnel: &Tunnel, cfg: &Config) -> Result<(), TunnelError> {
    if let Some(port) = health::bound_local_port(tunnel) {
        if !health::is_port_free(port) {
            return Err(TunnelError::PortInUse(port));
        }
    }

    let args = ssh::tunnel_args(tunnel, cfg.connect_timeout());
    tracing::info!(tunnel = %tunnel.name, ?args, "starting tunnel");
    display::print_starting(tunnel);

    // Inherited stdio so ssh can prompt for passwords and host keys
    let child = Command::new(&cfg.ssh_bin)
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TunnelError::NotFound(cfg.ssh_bin.clone()),
            _ => TunnelError::Spawn {
                bin: cfg.ssh_bin.clone(),
                source: e,
            },
        })?;

    let outcome = supervise(child, cfg.observation_window(), |o| display::print_outcome(tunnel, o))?;

    match outcome {
        Outcome::ConnectFailed(_) => Err(TunnelError::ConnectFailed(tunnel.name.clone())),
        Outcome::DisconnectedWithError(exit) => Err(TunnelError::Disconnected {
            name: tunnel.name.clone(),
            exit,
        }),
        Outcome::Connected | Outcome::DisconnectedNormally => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        after: Duration,
        exit: io::Result<ExitKind>,
    }

    impl Scripted {
        fn new(after_ms: u64, exit: ExitKind) -> Self {
            Self {
                after: Duration::from_millis(after_ms),
                exit: Ok(exit),
            }
        }
    }

    impl TunnelProcess for Scripted {
        fn wait(&mut self) -> io::Result<ExitKind> {
            thread::sleep(self.after);
            std::mem::replace(&mut self.exit, Err(io::Error::other("waited twice")))
        }
    }

    fn run(process: Scripted, window_ms: u64) -> (Result<Outcome, TunnelError>, Vec<Outcome>) {
        let mut seen = Vec::new();
        let result = supervise(process, Duration::from_millis(window_ms), |o| seen.push(*o));
        (result, seen)
    }

    #[test]
    fn early_exit_is_connect_failure() {
        let (result, seen) = run(Scripted::new(30, ExitKind::Code(255)), 400);
        assert_eq!(result.unwrap(), Outcome::ConnectFailed(ExitKind::Code(255)));
        assert_eq!(seen, vec![Outcome::ConnectFailed(ExitKind::Code(255))]);
    }

    #[test]
    fn interrupt_after_window_is_normal_disconnect() {
        let (result, seen) = run(Scripted::new(300, ExitKind::Code(130)), 40);
        assert_eq!(result.unwrap(), Outcome::DisconnectedNormally);
        assert_eq!(seen, vec![Outcome::Connected, Outcome::DisconnectedNormally]);
    }

    #[test]
    fn other_failure_after_window_is_error() {
        let (result, seen) = run(Scripted::new(300, ExitKind::Code(255)), 40);
        assert_eq!(result.unwrap(), Outcome::DisconnectedWithError(ExitKind::Code(255)));
        assert_eq!(
            seen,
            vec![Outcome::Connected, Outcome::DisconnectedWithError(ExitKind::Code(255))]
        );
    }

    #[test]
    fn wait_error_propagates() {
        let process = Scripted {
            after: Duration::ZERO,
            exit: Err(io::Error::other("boom")),
        };
        let (result, seen) = run(process, 400);
        assert!(matches!(result, Err(TunnelError::Wait(_))));
        assert!(seen.is_empty());
    }

    #[test]
    fn classify_signal_and_codes() {
        assert_eq!(classify_exit(ExitKind::Signaled(Some(2))), Outcome::DisconnectedNormally);
        assert_eq!(classify_exit(ExitKind::Signaled(None)), Outcome::DisconnectedNormally);
        assert_eq!(classify_exit(ExitKind::Code(0)), Outcome::DisconnectedNormally);
        assert_eq!(
            classify_exit(ExitKind::Code(1)),
            Outcome::DisconnectedWithError(ExitKind::Code(1))
        );
    }

    #[test]
    fn first_of_prefers_earlier_event() {
        match first_of(|| 7, Duration::from_millis(500)) {
            Race::Finished(v) => assert_eq!(v, 7),
            _ => panic!("expected the work to finish first"),
        }
        match first_of(
            || {
                thread::sleep(Duration::from_millis(200));
                9
            },
            Duration::from_millis(20),
        ) {
            Race::Running(pending) => assert_eq!(pending.wait(), Some(9)),
            _ => panic!("expected the deadline to pass first"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn real_child_exit_codes() {
        let child = Command::new("sh").args(["-c", "exit 3"]).spawn().unwrap();
        let outcome = supervise(child, Duration::from_secs(5), |_| {}).unwrap();
        assert_eq!(outcome, Outcome::ConnectFailed(ExitKind::Code(3)));

        let child = Command::new("sh").args(["-c", "kill -TERM $$"]).spawn().unwrap();
        let outcome = supervise(child, Duration::from_secs(5), |_| {}).unwrap();
        assert_eq!(outcome, Outcome::ConnectFailed(ExitKind::Signaled(Some(libc::SIGTERM))));
    }
}

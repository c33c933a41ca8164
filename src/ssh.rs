use anyhow::{Context, Result};
use std::process::Command;
use std::time::Duration;

use crate::model::{DEFAULT_SSH_PORT, ForwardMode, Host, Tunnel};

/// Arguments for an interactive session to `host`.
pub fn connect_args(host: &Host) -> Vec<String> {
    let mut args = Vec::new();
    if host.port != 0 && host.port != DEFAULT_SSH_PORT {
        args.push("-p".to_string());
        args.push(host.port.to_string());
    }
    if let Some(ref key) = host.key {
        if !key.is_empty() {
            args.push("-i".to_string());
            args.push(key.clone());
        }
    }
    args.push(host.target());
    args
}

/// Arguments for a forward-only session (`-N`) carrying the tunnel.
pub fn tunnel_args(tunnel: &Tunnel, connect_timeout: Duration) -> Vec<String> {
    let mut args = vec!["-N".to_string()];

    match tunnel.mode {
        ForwardMode::Local => {
            args.push("-L".to_string());
            args.push(format!(
                "127.0.0.1:{}:{}:{}",
                tunnel.local_port,
                tunnel.remote_host_or_default(),
                tunnel.remote_port_or_zero()
            ));
        }
        ForwardMode::Remote => {
            args.push("-R".to_string());
            args.push(format!(
                "{}:127.0.0.1:{}",
                tunnel.remote_port_or_zero(),
                tunnel.local_port
            ));
        }
        ForwardMode::Dynamic => {
            args.push("-D".to_string());
            args.push(format!("127.0.0.1:{}", tunnel.local_port));
        }
    }

    args.push("-o".to_string());
    args.push(format!("ConnectTimeout={}", connect_timeout.as_secs().max(1)));
    args.push("-o".to_string());
    args.push("ExitOnForwardFailure=yes".to_string());

    if tunnel.ssh_port != 0 && tunnel.ssh_port != DEFAULT_SSH_PORT {
        args.push("-p".to_string());
        args.push(tunnel.ssh_port.to_string());
    }
    if let Some(ref key) = tunnel.ssh_key {
        if !key.is_empty() {
            args.push("-i".to_string());
            args.push(key.clone());
        }
    }

    args.push(tunnel.target());
    args
}

/// Hand the terminal to an interactive ssh session.
///
/// On unix the current process is replaced and this only returns on failure.
pub fn connect(host: &Host, ssh_bin: &str) -> Result<()> {
    let mut cmd = Command::new(ssh_bin);
    cmd.args(connect_args(host));
    tracing::info!(host = %host.name, target = %host.target(), "connecting");
    exec(cmd, ssh_bin)
}

#[cfg(unix)]
fn exec(mut cmd: Command, ssh_bin: &str) -> Result<()> {
    use std::os::unix::process::CommandExt;

    let err = cmd.exec();
    Err(err).with_context(|| format!("failed to exec '{}' — is it installed?", ssh_bin))
}

#[cfg(not(unix))]
fn exec(mut cmd: Command, ssh_bin: &str) -> Result<()> {
    let status = cmd
        .status()
        .with_context(|| format!("failed to run '{}' — is it installed?", ssh_bin))?;
    if !status.success() {
        anyhow::bail!("ssh exited with {}", status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tunnel(mode: ForwardMode) -> Tunnel {
        Tunnel {
            name: "db".into(),
            ssh_host: "bastion".into(),
            ssh_user: Some("ops".into()),
            ssh_port: 22,
            ssh_key: None,
            mode,
            local_port: 8080,
            remote_host: Some("db.internal".into()),
            remote_port: Some(5432),
        }
    }

    #[test]
    fn connect_args_default_port() {
        let host = Host {
            name: "web".into(),
            host: "10.0.0.1".into(),
            user: "deploy".into(),
            port: 22,
            key: None,
            tags: vec![],
        };
        assert_eq!(connect_args(&host), vec!["deploy@10.0.0.1"]);
    }

    #[test]
    fn connect_args_port_and_key() {
        let host = Host {
            name: "web".into(),
            host: "10.0.0.1".into(),
            user: String::new(),
            port: 2222,
            key: Some("/k/id".into()),
            tags: vec![],
        };
        assert_eq!(connect_args(&host), vec!["-p", "2222", "-i", "/k/id", "10.0.0.1"]);
    }

    #[test]
    fn tunnel_args_local() {
        let args = tunnel_args(&tunnel(ForwardMode::Local), Duration::from_secs(10));
        assert_eq!(
            args,
            vec![
                "-N",
                "-L",
                "127.0.0.1:8080:db.internal:5432",
                "-o",
                "ConnectTimeout=10",
                "-o",
                "ExitOnForwardFailure=yes",
                "ops@bastion",
            ]
        );
    }

    #[test]
    fn tunnel_args_remote() {
        let args = tunnel_args(&tunnel(ForwardMode::Remote), Duration::from_secs(10));
        assert_eq!(args[1], "-R");
        assert_eq!(args[2], "5432:127.0.0.1:8080");
    }

    #[test]
    fn tunnel_args_dynamic_with_port_and_key() {
        let mut t = tunnel(ForwardMode::Dynamic);
        t.ssh_port = 2200;
        t.ssh_key = Some("~/.ssh/k".into());
        t.ssh_user = None;
        let args = tunnel_args(&t, Duration::from_secs(10));
        assert_eq!(args[1], "-D");
        assert_eq!(args[2], "127.0.0.1:8080");
        let tail = &args[args.len() - 5..];
        assert_eq!(tail, ["-p", "2200", "-i", "~/.ssh/k", "bastion"]);
    }
}

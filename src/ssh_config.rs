use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{DEFAULT_SSH_PORT, Host};

/// Somewhere importable hosts can be discovered.
pub trait HostSource {
    fn discover(&self) -> Result<Vec<Host>>;
}

/// Hosts declared in an OpenSSH client config file and its includes.
pub struct SshConfigSource {
    path: PathBuf,
}

impl SshConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HostSource for SshConfigSource {
    fn discover(&self) -> Result<Vec<Host>> {
        let ssh_dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let default_user = whoami::username();
        let mut hosts = Vec::new();
        parse_file(&self.path, &ssh_dir, &default_user, &mut hosts)?;
        tracing::debug!(path = %self.path.display(), found = hosts.len(), "parsed ssh config");
        Ok(hosts)
    }
}

/// Replace a leading `~/` with the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn parse_file(path: &Path, ssh_dir: &Path, default_user: &str, hosts: &mut Vec<Host>) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut current: Option<Host> = None;

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = match split_directive(line) {
            Some(pair) => pair,
            None => continue,
        };

        match key.to_lowercase().as_str() {
            "include" => {
                flush_host(&mut current, hosts);
                process_include(value, ssh_dir, default_user, hosts)?;
            }
            "host" => {
                flush_host(&mut current, hosts);

                // Skip wildcard patterns
                let name = value.split_whitespace().next().unwrap_or("");
                if !name.contains('*') && !name.contains('?') {
                    current = Some(Host {
                        name: name.to_string(),
                        host: String::new(),
                        user: default_user.to_string(),
                        port: DEFAULT_SSH_PORT,
                        key: None,
                        tags: Vec::new(),
                    });
                }
            }
            "match" => flush_host(&mut current, hosts),
            "hostname" => {
                if let Some(ref mut h) = current {
                    h.host = value.to_string();
                }
            }
            "user" => {
                if let Some(ref mut h) = current {
                    h.user = value.to_string();
                }
            }
            "port" => {
                if let Some(ref mut h) = current {
                    if let Ok(p) = value.parse() {
                        h.port = p;
                    }
                }
            }
            "identityfile" => {
                if let Some(ref mut h) = current {
                    h.key = Some(expand_tilde(value).to_string_lossy().to_string());
                }
            }
            _ => {}
        }
    }

    flush_host(&mut current, hosts);

    Ok(())
}

fn flush_host(current: &mut Option<Host>, hosts: &mut Vec<Host>) {
    if let Some(mut h) = current.take() {
        if h.host.is_empty() {
            h.host = h.name.clone();
        }
        hosts.push(h);
    }
}

fn split_directive(line: &str) -> Option<(&str, &str)> {
    // SSH config directives can use whitespace or '=' as separator
    let line = line.trim();
    if let Some(eq_pos) = line.find('=') {
        let key = line[..eq_pos].trim();
        let value = line[eq_pos + 1..].trim();
        if !key.is_empty() && !value.is_empty() && !key.contains(char::is_whitespace) {
            return Some((key, value));
        }
    }
    let mut parts = line.splitn(2, char::is_whitespace);
    let key = parts.next()?;
    let value = parts.next()?.trim();
    if value.is_empty() {
        return None;
    }
    Some((key, value))
}

fn process_include(pattern: &str, ssh_dir: &Path, default_user: &str, hosts: &mut Vec<Host>) -> Result<()> {
    let expanded = if pattern.starts_with("~/") {
        expand_tilde(pattern)
    } else if pattern.starts_with('/') {
        PathBuf::from(pattern)
    } else {
        ssh_dir.join(pattern)
    };

    let pattern_str = expanded.to_string_lossy().to_string();
    let entries = match glob::glob(&pattern_str) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(pattern = %pattern_str, error = %e, "bad Include pattern");
            return Ok(());
        }
    };
    for path in entries.flatten() {
        if path.is_file() {
            parse_file(&path, ssh_dir, default_user, hosts)?;
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// `~/.sshh`, created on first use.
pub fn sshh_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("cannot determine home directory")?
        .join(".sshh");
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(sshh_dir()?.join("config.toml"))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ssh client binary
    pub ssh_bin: String,
    /// Seconds passed to ssh as ConnectTimeout
    pub connect_timeout: u64,
    /// Seconds a tunnel must stay up before it counts as connected
    pub observation_window: u64,
    /// SSH client config used for import (defaults to ~/.ssh/config)
    pub ssh_config: Option<String>,
    /// Log filter when RUST_LOG is unset
    pub log_level: String,
    /// Editor for `sshh config` (overrides $VISUAL/$EDITOR)
    pub editor: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ssh_bin: "ssh".to_string(),
            connect_timeout: 10,
            observation_window: 12,
            ssh_config: None,
            log_level: "warn".to_string(),
            editor: None,
        }
    }
}

impl Config {
    /// Load config from ~/.sshh/config.toml, falling back to defaults.
    pub fn load() -> Self {
        let path = match config_path() {
            Ok(p) => p,
            Err(_) => return Self::default(),
        };
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    fn parse(content: &str) -> Self {
        toml::from_str(content).unwrap_or_default()
    }

    /// The observation window must outlast ssh's own connect timeout,
    /// otherwise a slow-to-fail host is reported as connected.
    pub fn normalize(&mut self) {
        if self.observation_window <= self.connect_timeout {
            let raised = self.connect_timeout.saturating_add(2);
            tracing::warn!(
                observation_window = self.observation_window,
                connect_timeout = self.connect_timeout,
                raised,
                "observation window not longer than connect timeout"
            );
            self.observation_window = raised;
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn observation_window(&self) -> Duration {
        Duration::from_secs(self.observation_window)
    }

    /// Path of the ssh client config to import from.
    pub fn ssh_config_path(&self) -> Result<PathBuf> {
        match self.ssh_config {
            Some(ref p) => Ok(crate::ssh_config::expand_tilde(p)),
            None => Ok(dirs::home_dir()
                .context("cannot determine home directory")?
                .join(".ssh")
                .join("config")),
        }
    }

    /// Resolve which editor to use: config > $VISUAL > $EDITOR > vi
    pub fn resolve_editor(&self) -> String {
        if let Some(ref e) = self.editor {
            return e.clone();
        }
        std::env::var("VISUAL")
            .or_else(|_| std::env::var("EDITOR"))
            .unwrap_or_else(|_| "vi".to_string())
    }

    /// Write a default config file if none exists. Returns the path.
    pub fn init() -> Result<PathBuf> {
        let path = config_path()?;
        if path.exists() {
            return Ok(path);
        }
        let default = Self::default();
        let content = toml::to_string_pretty(&default)
            .context("failed to serialize default config")?;
        fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

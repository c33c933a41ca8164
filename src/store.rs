use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{Host, Tunnel};

/// Persists the saved host and tunnel collections.
pub trait Store {
    fn save(&mut self, hosts: &[Host], tunnels: &[Tunnel]) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    hosts: Vec<Host>,
    #[serde(default)]
    tunnels: Vec<Tunnel>,
}

/// `~/.sshh/hosts.toml`.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(crate::config::sshh_dir()?.join("hosts.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empty collections when the file does not exist yet.
    pub fn load(&self) -> Result<(Vec<Host>, Vec<Tunnel>)> {
        if !self.path.exists() {
            return Ok((Vec::new(), Vec::new()));
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let file: StoreFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok((file.hosts, file.tunnels))
    }
}

impl Store for FileStore {
    fn save(&mut self, hosts: &[Host], tunnels: &[Tunnel]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let file = StoreFile {
            hosts: hosts.to_vec(),
            tunnels: tunnels.to_vec(),
        };
        let content = toml::to_string_pretty(&file).context("failed to serialize hosts")?;
        write_private(&self.path, &content)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), hosts = hosts.len(), tunnels = tunnels.len(), "saved");
        Ok(())
    }
}

#[cfg(unix)]
pub(crate) fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut f = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    f.write_all(content.as_bytes())
}

#[cfg(not(unix))]
pub(crate) fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, content)
}

/// First host with the given name.
pub fn find_host<'a>(hosts: &'a [Host], name: &str) -> Option<(usize, &'a Host)> {
    hosts.iter().enumerate().find(|(_, h)| h.name == name)
}

/// First tunnel with the given name.
pub fn find_tunnel<'a>(tunnels: &'a [Tunnel], name: &str) -> Option<(usize, &'a Tunnel)> {
    tunnels.iter().enumerate().find(|(_, t)| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ForwardMode;

    fn host(name: &str) -> Host {
        Host {
            name: name.into(),
            host: format!("{}.example.com", name),
            user: "deploy".into(),
            port: 22,
            key: None,
            tags: vec!["prod".into()],
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let store = FileStore::new(std::env::temp_dir().join("sshh_test_store_missing.toml"));
        let _ = fs::remove_file(store.path());
        let (hosts, tunnels) = store.load().unwrap();
        assert!(hosts.is_empty());
        assert!(tunnels.is_empty());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join("sshh_test_store_roundtrip.toml");
        let mut store = FileStore::new(&path);
        let tunnels = vec![Tunnel {
            name: "socks".into(),
            ssh_host: "bastion".into(),
            ssh_user: Some("ops".into()),
            ssh_port: 2222,
            ssh_key: None,
            mode: ForwardMode::Dynamic,
            local_port: 1080,
            remote_host: None,
            remote_port: None,
        }];
        store.save(&[host("web1"), host("db1")], &tunnels).unwrap();

        let (hosts, loaded) = store.load().unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[1].name, "db1");
        assert_eq!(loaded, tunnels);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = std::env::temp_dir().join("sshh_test_store_malformed.toml");
        fs::write(&path, "[[hosts]]\nname = 3\n").unwrap();
        let result = FileStore::new(&path).load();
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn find_resolves_first_match() {
        let mut dup = host("web1");
        dup.host = "other".into();
        let hosts = vec![host("db1"), host("web1"), dup];
        let (idx, found) = find_host(&hosts, "web1").unwrap();
        assert_eq!(idx, 1);
        assert_eq!(found.host, "web1.example.com");
        assert!(find_host(&hosts, "nope").is_none());
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::Host;

/// Orders hosts by how recently they were connected to.
pub trait Recency {
    /// A stable permutation of `0..hosts.len()`: hosts with a recorded
    /// timestamp first (most recent first), the rest in their original order.
    fn recent_order(&self, hosts: &[Host]) -> Vec<usize>;

    fn sort_by_recent(&self, hosts: &[Host]) -> Vec<Host> {
        self.recent_order(hosts)
            .into_iter()
            .map(|i| hosts[i].clone())
            .collect()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    entries: HashMap<String, u64>,
}

/// Last-used timestamps keyed by host name, stored in `~/.sshh/history.toml`.
#[derive(Debug, Default)]
pub struct History {
    path: Option<PathBuf>,
    entries: HashMap<String, u64>,
}

impl History {
    pub fn load() -> Result<Self> {
        Self::load_from(crate::config::sshh_dir()?.join("history.toml"))
    }

    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path: Some(path),
                entries: HashMap::new(),
            });
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file: HistoryFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Self {
            path: Some(path),
            entries: file.entries,
        })
    }

    /// In-memory history, never written to disk.
    #[cfg(test)]
    pub fn from_entries(entries: impl IntoIterator<Item = (String, u64)>) -> Self {
        Self {
            path: None,
            entries: entries.into_iter().collect(),
        }
    }

    pub fn last_used(&self, name: &str) -> Option<u64> {
        self.entries.get(name).copied()
    }

    /// Mark a host as used now and save.
    pub fn record(&mut self, name: &str) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.entries.insert(name.to_string(), now);
        self.save()
    }

    fn save(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        let file = HistoryFile {
            entries: self.entries.clone(),
        };
        let content = toml::to_string_pretty(&file).context("failed to serialize history")?;
        crate::store::write_private(path, &content)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

impl Recency for History {
    fn recent_order(&self, hosts: &[Host]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..hosts.len()).collect();
        // sort_by is stable, so untimestamped hosts keep their relative order
        order.sort_by(|&a, &b| {
            let ta = self.last_used(&hosts[a].name);
            let tb = self.last_used(&hosts[b].name);
            match (ta, tb) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str) -> Host {
        Host {
            name: name.into(),
            host: name.into(),
            user: String::new(),
            port: 22,
            key: None,
            tags: vec![],
        }
    }

    fn names(hosts: &[Host]) -> Vec<&str> {
        hosts.iter().map(|h| h.name.as_str()).collect()
    }

    #[test]
    fn recent_first_then_original_order() {
        let hist = History::from_entries([("B".to_string(), 2), ("C".to_string(), 5)]);
        let hosts = vec![host("A"), host("B"), host("C"), host("D")];
        assert_eq!(names(&hist.sort_by_recent(&hosts)), ["C", "B", "A", "D"]);
        assert_eq!(hist.recent_order(&hosts), vec![2, 1, 0, 3]);
    }

    #[test]
    fn empty_history_keeps_order() {
        let hist = History::default();
        let hosts = vec![host("z"), host("a"), host("m")];
        assert_eq!(names(&hist.sort_by_recent(&hosts)), ["z", "a", "m"]);
    }

    #[test]
    fn record_persists() {
        let path = std::env::temp_dir().join("sshh_test_history.toml");
        let _ = fs::remove_file(&path);

        let mut hist = History::load_from(&path).unwrap();
        assert!(hist.last_used("web").is_none());
        hist.record("web").unwrap();

        let reloaded = History::load_from(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(reloaded.last_used("web").is_some());
    }
}

use serde::{Deserialize, Serialize};

pub const DEFAULT_SSH_PORT: u16 = 22;

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

fn is_default_port(port: &u16) -> bool {
    *port == DEFAULT_SSH_PORT
}

/// A saved SSH destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub name: String,
    pub host: String,
    #[serde(default)]
    pub user: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Host {
    /// `user@host` or just `host` when no user is set.
    pub fn target(&self) -> String {
        if self.user.is_empty() {
            self.host.clone()
        } else {
            format!("{}@{}", self.user, self.host)
        }
    }
}

/// SSH port-forwarding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardMode {
    #[default]
    Local,
    Remote,
    Dynamic,
}

impl ForwardMode {
    /// Selector order used by the tunnel form.
    pub const ALL: [ForwardMode; 3] = [ForwardMode::Local, ForwardMode::Remote, ForwardMode::Dynamic];

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ForwardMode::Local => "local",
            ForwardMode::Remote => "remote",
            ForwardMode::Dynamic => "dynamic",
        }
    }
}

impl std::fmt::Display for ForwardMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A saved port-forward specification.
///
/// `remote_host` and `remote_port` only matter for `local` and `remote` modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunnel {
    pub name: String,
    pub ssh_host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_user: Option<String>,
    #[serde(default = "default_port", skip_serializing_if = "is_default_port")]
    pub ssh_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<String>,
    #[serde(rename = "type", default)]
    pub mode: ForwardMode,
    #[serde(default)]
    pub local_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_port: Option<u16>,
}

impl Tunnel {
    /// `user@host` or just `host` when no user is set.
    pub fn target(&self) -> String {
        match self.ssh_user.as_deref() {
            Some(user) if !user.is_empty() => format!("{}@{}", user, self.ssh_host),
            _ => self.ssh_host.clone(),
        }
    }

    pub fn remote_host_or_default(&self) -> &str {
        self.remote_host.as_deref().unwrap_or("localhost")
    }

    pub fn remote_port_or_zero(&self) -> u16 {
        self.remote_port.unwrap_or(0)
    }
}

/// The human-readable mapping a tunnel establishes.
impl std::fmt::Display for Tunnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mode {
            ForwardMode::Local => write!(
                f,
                "127.0.0.1:{} → {}:{}",
                self.local_port,
                self.remote_host_or_default(),
                self.remote_port_or_zero()
            ),
            ForwardMode::Remote => write!(
                f,
                "{}:{} → 127.0.0.1:{}",
                self.ssh_host,
                self.remote_port_or_zero(),
                self.local_port
            ),
            ForwardMode::Dynamic => write!(f, "SOCKS5 127.0.0.1:{}", self.local_port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tunnel(mode: ForwardMode) -> Tunnel {
        Tunnel {
            name: "db".into(),
            ssh_host: "bastion".into(),
            ssh_user: None,
            ssh_port: 22,
            ssh_key: None,
            mode,
            local_port: 8080,
            remote_host: Some("db.internal".into()),
            remote_port: Some(5432),
        }
    }

    #[test]
    fn mode_cycles_forward_and_wraps() {
        assert_eq!(ForwardMode::Local.next(), ForwardMode::Remote);
        assert_eq!(ForwardMode::Remote.next(), ForwardMode::Dynamic);
        assert_eq!(ForwardMode::Dynamic.next(), ForwardMode::Local);
    }

    #[test]
    fn mode_cycles_backward_and_wraps() {
        assert_eq!(ForwardMode::Local.prev(), ForwardMode::Dynamic);
        assert_eq!(ForwardMode::Dynamic.prev(), ForwardMode::Remote);
    }

    #[test]
    fn tunnel_mapping_display() {
        assert_eq!(tunnel(ForwardMode::Local).to_string(), "127.0.0.1:8080 → db.internal:5432");
        assert_eq!(tunnel(ForwardMode::Remote).to_string(), "bastion:5432 → 127.0.0.1:8080");
        assert_eq!(tunnel(ForwardMode::Dynamic).to_string(), "SOCKS5 127.0.0.1:8080");
    }

    #[test]
    fn target_with_and_without_user() {
        let mut t = tunnel(ForwardMode::Local);
        assert_eq!(t.target(), "bastion");
        t.ssh_user = Some("ops".into());
        assert_eq!(t.target(), "ops@bastion");

        let h = Host {
            name: "web".into(),
            host: "10.0.0.1".into(),
            user: String::new(),
            port: 22,
            key: None,
            tags: vec![],
        };
        assert_eq!(h.target(), "10.0.0.1");
    }

    #[test]
    fn tunnel_toml_uses_type_key() {
        let t: Tunnel = toml::from_str(
            "name = \"s\"\nssh_host = \"h\"\ntype = \"dynamic\"\nlocal_port = 1080\n",
        )
        .unwrap();
        assert_eq!(t.mode, ForwardMode::Dynamic);
        assert_eq!(t.ssh_port, 22);
        assert_eq!(t.remote_port, None);
    }
}

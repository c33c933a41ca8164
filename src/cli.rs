use clap::{Parser, Subcommand};
use clap_complete::engine::{ArgValueCompleter, CompletionCandidate};

use crate::store::FileStore;

#[derive(Parser)]
#[command(name = "sshh", about = "SSH host and tunnel manager", version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Connect to a saved host directly (interactive list if omitted)
    #[arg(add = ArgValueCompleter::new(complete_host_names))]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

fn saved_names(current: &std::ffi::OsStr, tunnels: bool) -> Vec<CompletionCandidate> {
    let prefix = current.to_str().unwrap_or("");
    let Ok((hosts, saved_tunnels)) = FileStore::open_default().and_then(|s| s.load()) else {
        return Vec::new();
    };
    let names: Vec<String> = if tunnels {
        saved_tunnels.into_iter().map(|t| t.name).collect()
    } else {
        hosts.into_iter().map(|h| h.name).collect()
    };
    names
        .iter()
        .filter(|n| n.starts_with(prefix))
        .map(CompletionCandidate::new)
        .collect()
}

fn complete_host_names(current: &std::ffi::OsStr) -> Vec<CompletionCandidate> {
    saved_names(current, false)
}

fn complete_tunnel_names(current: &std::ffi::OsStr) -> Vec<CompletionCandidate> {
    saved_names(current, true)
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a saved tunnel in the foreground
    Tunnel {
        /// Tunnel name (interactive picker if omitted)
        #[arg(add = ArgValueCompleter::new(complete_tunnel_names))]
        name: Option<String>,
    },
    /// List saved hosts and tunnels
    #[command(alias = "ls")]
    List,
    /// Initialize or edit ~/.sshh/config.toml
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

mod cli;
mod config;
mod display;
mod health;
mod history;
mod logging;
mod model;
mod picker;
mod process;
mod ssh;
mod ssh_config;
mod store;
mod tui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use cli::{Cli, Command};
use config::Config;
use history::{History, Recency};
use model::Host;
use ssh_config::SshConfigSource;
use store::FileStore;
use tui::{App, Selection};

fn main() -> Result<()> {
    clap_complete::CompleteEnv::with_factory(Cli::command).complete();

    let cli = Cli::parse();
    let mut cfg = Config::load();
    logging::init(&cfg.log_level);
    cfg.normalize();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Some(Command::Tunnel { name }) => cmd_tunnel(name, &cfg),
        Some(Command::List) => cmd_list(),
        Some(Command::Config) => cmd_config(&cfg),
        Some(Command::Completions { shell }) => cmd_completions(shell),
        None => match cli.host {
            Some(name) => cmd_connect(&name, &cfg),
            None => cmd_interactive(&cfg),
        },
    }
}

/// Stamp the host in history, then hand over to ssh.
fn connect_host(host: &Host, history: &mut History, cfg: &Config) -> Result<()> {
    if let Err(e) = history.record(&host.name) {
        tracing::warn!(error = %format!("{e:#}"), "failed to record history");
    }
    ssh::connect(host, &cfg.ssh_bin)
}

fn cmd_connect(name: &str, cfg: &Config) -> Result<()> {
    let store = FileStore::open_default()?;
    let (hosts, _) = store.load()?;
    let (_, host) = store::find_host(&hosts, name).with_context(|| {
        format!("host '{}' not found in {}", name, store.path().display())
    })?;
    let mut history = History::load().unwrap_or_else(|e| {
        tracing::warn!(error = %format!("{e:#}"), "ignoring unreadable history");
        History::default()
    });
    connect_host(host, &mut history, cfg)
}

fn cmd_interactive(cfg: &Config) -> Result<()> {
    let mut store = FileStore::open_default()?;
    let (hosts, tunnels) = store.load()?;
    let mut history = History::load()?;
    let source = SshConfigSource::new(cfg.ssh_config_path()?);
    let label = cfg
        .ssh_config
        .clone()
        .unwrap_or_else(|| "~/.ssh/config".to_string());

    let selection = {
        let mut app = App::new(&mut store, &history, &source, label, hosts, tunnels);
        tui::run(&mut app)?
    };

    match selection {
        Selection::Quit => Ok(()),
        Selection::Connect(host) => connect_host(&host, &mut history, cfg),
        Selection::RunTunnel(tunnel) => {
            process::run_tunnel(&tunnel, cfg)?;
            Ok(())
        }
    }
}

fn cmd_tunnel(name: Option<String>, cfg: &Config) -> Result<()> {
    let store = FileStore::open_default()?;
    let (_, tunnels) = store.load()?;

    let tunnel = match name {
        Some(n) => store::find_tunnel(&tunnels, &n)
            .map(|(_, t)| t)
            .with_context(|| format!("tunnel '{}' not found in {}", n, store.path().display()))?,
        None => picker::pick_tunnel("Run tunnel", &tunnels)?,
    };

    process::run_tunnel(tunnel, cfg)?;
    Ok(())
}

fn cmd_list() -> Result<()> {
    let store = FileStore::open_default()?;
    let (hosts, tunnels) = store.load()?;
    let history = History::load().unwrap_or_else(|e| {
        tracing::warn!(error = %format!("{e:#}"), "ignoring unreadable history");
        History::default()
    });
    display::print_list(&history.sort_by_recent(&hosts), &tunnels);
    Ok(())
}

fn cmd_config(cfg: &Config) -> Result<()> {
    let path = Config::init()?;
    let editor = cfg.resolve_editor();

    let status = std::process::Command::new(&editor)
        .arg(&path)
        .status()
        .with_context(|| format!("failed to launch editor '{}'", editor))?;

    if !status.success() {
        anyhow::bail!("editor exited with {}", status);
    }

    Ok(())
}

fn cmd_completions(shell: clap_complete::Shell) -> Result<()> {
    let shell_name = match shell {
        clap_complete::Shell::Bash => "bash",
        clap_complete::Shell::Zsh => "zsh",
        clap_complete::Shell::Fish => "fish",
        clap_complete::Shell::Elvish => "elvish",
        clap_complete::Shell::PowerShell => "powershell",
        _ => anyhow::bail!("unsupported shell"),
    };
    unsafe { std::env::set_var("COMPLETE", shell_name) };
    clap_complete::CompleteEnv::with_factory(Cli::command).complete();
    Ok(())
}

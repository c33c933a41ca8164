use colored::Colorize;
use console::Alignment;

use crate::model::{Host, Tunnel};
use crate::process::Outcome;

/// Print saved hosts and tunnels as aligned columns.
pub fn print_list(hosts: &[Host], tunnels: &[Tunnel]) {
    if hosts.is_empty() && tunnels.is_empty() {
        println!("{}", "No saved hosts or tunnels.".yellow());
        println!("Run sshh to add one, or press i in the host list to import from ~/.ssh/config.");
        return;
    }

    if !hosts.is_empty() {
        println!("{}", "Hosts".bold());
        let w_name = hosts.iter().map(|h| h.name.len()).max().unwrap_or(0);
        let w_target = hosts
            .iter()
            .map(|h| console::measure_text_width(&host_target(h)))
            .max()
            .unwrap_or(0);
        for h in hosts {
            let tags = if h.tags.is_empty() {
                String::new()
            } else {
                format!("[{}]", h.tags.join(", ")).dimmed().to_string()
            };
            println!(
                "  {} {}  {}  {}",
                "●".cyan(),
                pad(&h.name.bold().to_string(), w_name),
                pad(&host_target(h), w_target),
                tags
            );
        }
    }

    if !tunnels.is_empty() {
        if !hosts.is_empty() {
            println!();
        }
        println!("{}", "Tunnels".bold());
        let w_name = tunnels.iter().map(|t| t.name.len()).max().unwrap_or(0);
        let w_mode = "dynamic".len();
        for t in tunnels {
            println!(
                "  {} {}  {}  {}  {}",
                "⇄".magenta(),
                pad(&t.name.bold().to_string(), w_name),
                pad(t.mode.as_str(), w_mode),
                t,
                format!("via {}", t.target()).dimmed()
            );
        }
    }
}

fn host_target(h: &Host) -> String {
    format!("{}:{}", h.target(), h.port)
}

pub fn print_starting(tunnel: &Tunnel) {
    println!(
        "{} {} {} via {}",
        "○".dimmed(),
        tunnel.name.bold(),
        "connecting".dimmed(),
        tunnel.target()
    );
}

/// Terminal feedback for each supervisor outcome. A failed connect prints
/// nothing: ssh has already written its own diagnostic.
pub fn print_outcome(tunnel: &Tunnel, outcome: &Outcome) {
    match outcome {
        Outcome::Connected => {
            println!(
                "{} {} {} {}",
                "●".green(),
                tunnel.name.green().bold(),
                tunnel.mode.as_str().green(),
                tunnel
            );
            println!("  {}", "Ctrl+C to stop".dimmed());
        }
        Outcome::DisconnectedNormally => {
            println!("{} {} {}", "○".dimmed(), tunnel.name.bold(), "stopped".dimmed());
        }
        Outcome::ConnectFailed(_) | Outcome::DisconnectedWithError(_) => {}
    }
}

/// Pad an ANSI-colored string to a visible width using console's awareness of escape codes.
fn pad(s: &str, width: usize) -> String {
    console::pad_str(s, width, Alignment::Left, None).to_string()
}

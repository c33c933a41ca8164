use anyhow::{Context, Result};
use dialoguer::FuzzySelect;
use dialoguer::theme::ColorfulTheme;

use crate::model::Tunnel;

/// Fuzzy-pick a saved tunnel by name and mapping.
pub fn pick_tunnel<'a>(prompt: &str, tunnels: &'a [Tunnel]) -> Result<&'a Tunnel> {
    if tunnels.is_empty() {
        anyhow::bail!("no saved tunnels — add one from the tunnel list in `sshh`");
    }
    let items: Vec<String> = tunnels.iter().map(|t| format!("{}  {}", t.name, t)).collect();

    let idx = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&items)
        .interact()
        .context("selection cancelled")?;
    Ok(&tunnels[idx])
}

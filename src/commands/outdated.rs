use std::io::IsTerminal;

use colored::Colorize;

use crate::api::{self, BrewApi};
use crate::error::Result;
use crate::state::InstallState;

/// List installed formulae whose Cellar version is behind the API stable
/// version. Pinned formulae are flagged.
pub async fn outdated(api: &BrewApi) -> Result<()> {
    let is_tty = std::io::stdout().is_terminal();

    let index = api::installed_index(api).await?;
    let state = InstallState::from_index(&index);
    let outdated = state.outdated_names();

    if outdated.is_empty() {
        if is_tty {
            println!("{} All packages are up to date", "✓".green());
        }
        return Ok(());
    }

    for name in &outdated {
        if is_tty {
            if state.is_pinned(name) {
                println!("{} {}", name.bold(), "(pinned)".yellow());
            } else {
                println!("{}", name.bold());
            }
        } else {
            println!("{}", name);
        }
    }

    Ok(())
}

use std::io::IsTerminal;

use colored::Colorize;

use crate::api::{self, BrewApi};
use crate::error::Result;
use crate::index::PackageIndex;

/// Print the installed formulae that (transitively) depend on `formula`.
pub async fn uses(api: &BrewApi, formula: &str) -> Result<()> {
    let is_tty = std::io::stdout().is_terminal();

    let index = api::installed_index(api).await?;
    let Some(target) = index.lookup(formula) else {
        println!("{} {} is not installed", "⚠".yellow(), formula.bold());
        return Ok(());
    };

    let dependents = index.dependents_of(&target);
    if dependents.is_empty() {
        if is_tty {
            println!(
                "{} No installed formulae depend on {}",
                "✓".green(),
                formula.cyan()
            );
        }
        return Ok(());
    }

    if is_tty {
        println!(
            "{} {} installed formulae depend on {}:",
            "✓".green(),
            dependents.len().to_string().bold(),
            formula.cyan()
        );
    }
    for pkg in dependents {
        if is_tty {
            println!("  {}", pkg.name.bold());
        } else {
            println!("{}", pkg.name);
        }
    }

    Ok(())
}

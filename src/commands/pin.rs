use colored::Colorize;

use crate::cellar;
use crate::error::Result;

/// Pin formulae so `upgrade` leaves them alone.
pub fn pin(formula_names: &[String]) -> Result<()> {
    if formula_names.is_empty() {
        println!("{} No formulae specified", "✗".red());
        return Ok(());
    }

    let installed: Vec<String> = cellar::newest_installed(cellar::list_installed()?)
        .into_iter()
        .map(|k| k.name)
        .collect();
    let mut pinned = cellar::read_pinned()?;

    for formula in formula_names {
        if !installed.contains(formula) {
            println!("  {} {} is not installed", "⚠".yellow(), formula.bold());
            continue;
        }
        if pinned.contains(formula) {
            println!("  {} is already pinned", formula.bold());
        } else {
            pinned.push(formula.clone());
            println!("  {} Pinned {}", "✓".green(), formula.bold().green());
        }
    }

    cellar::write_pinned(&pinned)?;
    Ok(())
}

/// Remove formulae from the pinned set.
pub fn unpin(formula_names: &[String]) -> Result<()> {
    if formula_names.is_empty() {
        println!("{} No formulae specified", "✗".red());
        return Ok(());
    }

    let mut pinned = cellar::read_pinned()?;

    for formula in formula_names {
        if let Some(pos) = pinned.iter().position(|x| x == formula) {
            pinned.remove(pos);
            println!("  {} Unpinned {}", "✓".green(), formula.bold().green());
        } else {
            println!("  {} is not pinned", formula.bold());
        }
    }

    cellar::write_pinned(&pinned)?;
    Ok(())
}

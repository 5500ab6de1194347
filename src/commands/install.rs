use std::collections::HashSet;

use colored::Colorize;

use crate::actions::{InstallAction, Outcome};
use crate::api::{self, BrewApi};
use crate::brew::BrewRunner;
use crate::error::Result;
use crate::graph::DepGraph;
use crate::index::{InMemoryIndex, PackageIndex};
use crate::package::Package;
use crate::state::InstallState;

/// Install formulae and whatever dependencies are missing, in dependency
/// order. Returns whether everything succeeded.
pub async fn install(api: &BrewApi, names: &[String]) -> Result<bool> {
    if names.is_empty() {
        println!("{} No formulae specified", "✗".red());
        return Ok(true);
    }

    let installed = api::installed_index(api).await?;
    let state = InstallState::from_index(&installed);

    // Fetch the transitive dependency closure of the requested names.
    let mut closure = InMemoryIndex::new();
    let mut to_install: Vec<Package> = Vec::new();
    let mut to_process: Vec<String> = names.to_vec();
    let mut processed: HashSet<String> = HashSet::new();

    while let Some(name) = to_process.pop() {
        if !processed.insert(name.clone()) {
            continue;
        }
        let formula = match api.fetch_formula(&name).await {
            Ok(f) => f,
            Err(e) => {
                println!("  {} {}: {}", "⚠".yellow(), name.bold(), e);
                continue;
            }
        };

        for dep in &formula.dependencies {
            if !processed.contains(dep) {
                to_process.push(dep.clone());
            }
        }

        let mut pkg = Package::new(formula.canonical_name().to_string());
        pkg.aliases = formula.aliases.clone();
        pkg.oldnames = formula.oldnames.clone();
        pkg.dependencies = formula.dependencies.clone();
        pkg.build_dependencies = formula.build_dependencies.clone();
        pkg.keg_only = formula.keg_only;
        pkg.bottled = formula.versions.bottle;
        let already = state.is_installed(&pkg.name) || state.is_installed(pkg.short_name());
        if !already {
            to_install.push(pkg.clone());
        }
        closure.insert(pkg)?;
    }

    if to_install.is_empty() {
        println!("{} Already installed", "✓".green());
        return Ok(true);
    }

    let order = DepGraph::build(&closure, &to_install).sorted()?;
    println!(
        "{} {} formulae to install: {}",
        "→".bold(),
        order.len().to_string().bold(),
        order.join(", ").cyan()
    );

    let mut runner = BrewRunner::new()?;
    let mut failures = 0usize;
    for name in &order {
        let Some(pkg) = closure.lookup(name) else {
            continue;
        };
        match runner.install(&pkg) {
            Outcome::Installed => {
                println!("  {} Installed {}", "✓".green(), pkg.name.bold().green());
            }
            Outcome::Skipped => {}
            Outcome::Failed(error) => {
                println!(
                    "  {} Failed to install {}: {}",
                    "✗".red(),
                    pkg.name.bold(),
                    error
                );
                failures += 1;
            }
        }
    }

    println!(
        "{} Installed {} packages ({} failed)",
        "✓".green().bold(),
        (order.len() - failures).to_string().bold(),
        failures.to_string().bold()
    );
    Ok(failures == 0)
}

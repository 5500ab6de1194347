use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::actions::FlagBottleCheck;
use crate::api::{self, BrewApi};
use crate::brew::{BrewLinkage, BrewRunner};
use crate::error::Result;
use crate::reconcile::Reconciler;
use crate::state::InstallState;

/// Upgrade named formulae, or everything outdated when `names` is empty.
/// Returns whether the batch succeeded, for exit-code purposes.
pub async fn upgrade(api: &BrewApi, names: &[String], dry_run: bool) -> Result<bool> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message("Checking for outdated packages...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let index = api::installed_index(api).await?;
    spinner.finish_and_clear();

    let state = InstallState::from_index(&index);
    let outdated = state.outdated_names();

    if names.is_empty() && outdated.is_empty() {
        println!("{} All packages are up to date", "✓".green());
        return Ok(true);
    }

    if names.is_empty() {
        println!(
            "Found {} outdated packages: {}",
            outdated.len().to_string().bold(),
            outdated.join(", ").cyan()
        );
    }

    if dry_run {
        println!("{} Dry run complete - no packages were upgraded", "✓".green());
        return Ok(true);
    }

    let bottles = FlagBottleCheck::new(&index);
    let linkage = BrewLinkage;
    let mut runner = BrewRunner::new()?;
    let mut reconciler = Reconciler::new(&index, &bottles, &linkage);

    let report = reconciler.upgrade_batch(names, &mut runner)?;
    Ok(report.success())
}

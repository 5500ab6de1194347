//! Upgrade reconciliation: batch install ordering, dependent re-upgrade, and
//! broken-linkage repair.
//!
//! A batch moves through fixed phases: install the requested set in
//! topological order, re-scan installed dependents of whatever succeeded,
//! upgrade the safe subset in a second narrower pass, then probe linkage
//! across installed dependents and rebuild the broken ones from source.
//! Individual package failures never abort the batch; a dependency cycle
//! aborts everything because no order exists.

use std::cmp::Ordering;
use std::collections::HashSet;

use colored::Colorize;
use tracing::{debug, warn};

use crate::actions::{BottleCheck, InstallAction, LinkageCheck, Outcome};
use crate::error::{InstallError, Result};
use crate::graph::DepGraph;
use crate::index::PackageIndex;
use crate::package::Package;
use crate::state::InstallState;

/// Outdated installed dependents of an upgraded set, split into disjoint
/// groups. Only `upgradeable` is acted on automatically.
#[derive(Debug, Default, Clone)]
pub struct DependentsPartition {
    /// Outdated, unpinned, bottled with all dependencies bottled.
    pub upgradeable: Vec<Package>,
    /// Outdated but pinned; reported, never auto-upgraded.
    pub pinned: Vec<Package>,
    /// Outdated but missing a bottle for itself or a dependency. Upgrading
    /// these would force a from-source build as a side effect of someone
    /// else's upgrade, so they are left alone.
    pub skipped: Vec<Package>,
}

impl DependentsPartition {
    pub fn is_empty(&self) -> bool {
        self.upgradeable.is_empty() && self.pinned.is_empty() && self.skipped.is_empty()
    }
}

/// What happened to each package in one reconciliation run.
#[derive(Debug, Default, Clone)]
pub struct BatchReport {
    pub upgraded: Vec<String>,
    pub failed: Vec<(String, InstallError)>,
    pub dependents_upgraded: Vec<String>,
    pub pinned_dependents: Vec<String>,
    pub skipped_dependents: Vec<String>,
    pub reinstalled: Vec<String>,
    pub reinstall_failed: Vec<(String, InstallError)>,
    pub pinned_broken: Vec<String>,
}

impl BatchReport {
    /// Whether the run should exit zero.
    pub fn success(&self) -> bool {
        self.failed.is_empty() && self.reinstall_failed.is_empty()
    }

    fn record_failure(&mut self, name: &str, error: InstallError) {
        self.failed.push((name.to_string(), error));
    }
}

/// Ordering for presenting two packages from the same batch: a runtime
/// dependency always comes before its dependent, otherwise plain name order.
pub fn dependent_order(a: &Package, b: &Package) -> Ordering {
    if a.depends_on(&b.name) {
        Ordering::Greater
    } else if b.depends_on(&a.name) {
        Ordering::Less
    } else {
        a.name.cmp(&b.name)
    }
}

/// Drives one upgrade batch end to end against the collaborator interfaces.
pub struct Reconciler<'a> {
    index: &'a dyn PackageIndex,
    bottles: &'a dyn BottleCheck,
    linkage: &'a dyn LinkageCheck,
    state: InstallState,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        index: &'a dyn PackageIndex,
        bottles: &'a dyn BottleCheck,
        linkage: &'a dyn LinkageCheck,
    ) -> Self {
        Self {
            index,
            bottles,
            linkage,
            state: InstallState::from_index(index),
        }
    }

    /// Upgrade `names` (or everything outdated when empty), then reconcile
    /// dependents and broken linkage. Per-package failures are collected in
    /// the report; only a dependency cycle is fatal.
    pub fn upgrade_batch(
        &mut self,
        names: &[String],
        actions: &mut dyn InstallAction,
    ) -> Result<BatchReport> {
        self.state.reload(self.index);
        let mut report = BatchReport::default();

        let requested = if names.is_empty() {
            self.state.outdated_names()
        } else {
            names.to_vec()
        };

        let mut packages: Vec<Package> = Vec::with_capacity(requested.len());
        let mut seen: HashSet<String> = HashSet::new();
        for name in &requested {
            match self.index.lookup(name) {
                Some(pkg) => {
                    if seen.insert(pkg.name.clone()) {
                        packages.push(pkg);
                    }
                }
                None => {
                    println!("  {} No available formula: {}", "⚠".yellow(), name.bold());
                }
            }
        }

        if packages.is_empty() {
            println!("{} Nothing to upgrade", "✓".green());
            return Ok(report);
        }

        // Installing: requested set in dependency order. A cycle here aborts
        // the whole batch before anything runs.
        let order = DepGraph::build(self.index, &packages).sorted()?;
        debug!(?order, "install order");
        let upgraded = self.install_pass(&order, actions, &mut report, false);

        // Dependents-Scan: fresh snapshot first, then replay this run's
        // install-succeeded events on top of it.
        self.refresh_state(&report);
        let upgraded_packages: Vec<Package> = upgraded
            .iter()
            .filter_map(|name| self.index.lookup(name))
            .collect();
        let partition = self.scan_dependents(&upgraded_packages);

        for pkg in &partition.pinned {
            println!(
                "  {} Not upgrading {}, it is pinned",
                "⚠".yellow(),
                pkg.name.bold()
            );
            report.pinned_dependents.push(pkg.name.clone());
        }
        for pkg in &partition.skipped {
            println!(
                "  {} Skipping {}: no bottle for it or one of its dependencies",
                "⚠".yellow(),
                pkg.name.bold()
            );
            report.skipped_dependents.push(pkg.name.clone());
        }

        // Dependents-Upgrade: second, narrower pass over the safe subset.
        if partition.is_empty() {
            println!("{} No dependents to upgrade", "✓".green());
        } else if !partition.upgradeable.is_empty() {
            println!(
                "{} Upgrading {} dependents: {}",
                "→".bold(),
                partition.upgradeable.len().to_string().bold(),
                partition
                    .upgradeable
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
                    .cyan()
            );
            let dep_order = DepGraph::build(self.index, &partition.upgradeable).sorted()?;
            let done = self.install_pass(&dep_order, actions, &mut report, true);
            report.dependents_upgraded = done;
        }

        // Broken-Linkage-Scan over installed dependents, then the repair
        // pass. Reinstalls force a source build since the bottle's linkage
        // is known-broken.
        self.refresh_state(&report);
        self.repair_broken_linkage(actions, &mut report);

        self.print_summary(&report);
        Ok(report)
    }

    /// Partition the outdated installed dependents of `upgraded`.
    pub fn scan_dependents(&self, upgraded: &[Package]) -> DependentsPartition {
        let mut seen: HashSet<String> = HashSet::new();
        let mut dependents: Vec<Package> = Vec::new();
        for pkg in upgraded {
            for dependent in self.index.dependents_of(pkg) {
                if seen.insert(dependent.name.clone()) {
                    dependents.push(dependent);
                }
            }
        }
        // Never revisit members of the upgraded set itself.
        dependents.retain(|d| !upgraded.iter().any(|u| u.name == d.name));
        dependents.retain(|d| self.state.is_outdated(&d.name));

        let mut partition = DependentsPartition::default();
        for dependent in dependents {
            if !self.bottles.bottled(&dependent) || !self.bottles.all_deps_bottled(&dependent) {
                partition.skipped.push(dependent);
            } else if self.state.is_pinned(&dependent.name) {
                partition.pinned.push(dependent);
            } else {
                partition.upgradeable.push(dependent);
            }
        }

        partition.upgradeable.sort_by(dependent_order);
        partition.pinned.sort_by(dependent_order);
        partition.skipped.sort_by(dependent_order);
        partition
    }

    /// Install `order` one package at a time, recording outcomes. Returns
    /// the names that actually installed.
    fn install_pass(
        &mut self,
        order: &[String],
        actions: &mut dyn InstallAction,
        report: &mut BatchReport,
        dependents_pass: bool,
    ) -> Vec<String> {
        let mut succeeded = Vec::new();
        for name in order {
            let Some(pkg) = self.index.lookup(name) else {
                continue;
            };
            let outcome = if self.state.is_installed(&pkg.name) {
                actions.upgrade(&pkg)
            } else {
                actions.install(&pkg)
            };
            match outcome {
                Outcome::Installed => {
                    self.state.mark_installed(&pkg.name);
                    succeeded.push(pkg.name.clone());
                    if !dependents_pass {
                        report.upgraded.push(pkg.name.clone());
                    }
                    println!("  {} Upgraded {}", "✓".green(), pkg.name.bold().green());
                }
                Outcome::Skipped => {
                    debug!(package = %pkg.name, "already attempted, skipping");
                }
                Outcome::Failed(error) => {
                    println!(
                        "  {} Failed to upgrade {}: {}",
                        "✗".red(),
                        pkg.name.bold(),
                        error
                    );
                    report.record_failure(&pkg.name, error);
                }
            }
        }
        succeeded
    }

    /// Probe installed dependents for broken linkage and rebuild the
    /// unpinned ones from source.
    fn repair_broken_linkage(&mut self, actions: &mut dyn InstallAction, report: &mut BatchReport) {
        let installed = self.index.installed();

        let mut seen: HashSet<String> = HashSet::new();
        let mut broken: Vec<Package> = Vec::new();
        for pkg in &installed {
            for dependent in self.index.dependents_of(pkg) {
                if !seen.insert(dependent.name.clone()) {
                    continue;
                }
                if self.linkage.broken_linkage(&dependent) {
                    broken.push(dependent);
                }
            }
        }

        if broken.is_empty() {
            return;
        }

        broken.sort_by(dependent_order);
        let (reinstallable, pinned_broken): (Vec<Package>, Vec<Package>) =
            broken.into_iter().partition(|p| !self.state.is_pinned(&p.name));

        for pkg in &pinned_broken {
            warn!(package = %pkg.name, "broken linkage on pinned package, not touching it");
            println!(
                "  {} {} has broken linkage but is pinned; reinstall it manually",
                "⚠".yellow(),
                pkg.name.bold()
            );
            report.pinned_broken.push(pkg.name.clone());
        }

        if reinstallable.is_empty() {
            return;
        }

        println!(
            "{} Reinstalling {} packages with broken linkage: {}",
            "→".bold(),
            reinstallable.len().to_string().bold(),
            reinstallable
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
                .cyan()
        );

        for pkg in &reinstallable {
            match actions.reinstall_from_source(pkg) {
                Outcome::Installed => {
                    self.state.mark_installed(&pkg.name);
                    report.reinstalled.push(pkg.name.clone());
                    println!("  {} Reinstalled {}", "✓".green(), pkg.name.bold().green());
                }
                Outcome::Skipped => {
                    debug!(package = %pkg.name, "reinstall skipped");
                }
                Outcome::Failed(error) => {
                    println!(
                        "  {} Failed to reinstall {}: {}",
                        "✗".red(),
                        pkg.name.bold(),
                        error
                    );
                    report.reinstall_failed.push((pkg.name.clone(), error));
                }
            }
        }
    }

    /// Fresh snapshot of the index plus this run's install-succeeded events.
    /// The index itself is read-once per command, so successes recorded by
    /// the engine must be replayed on top of each reload.
    fn refresh_state(&mut self, report: &BatchReport) {
        self.state.reload(self.index);
        for name in report
            .upgraded
            .iter()
            .chain(report.dependents_upgraded.iter())
            .chain(report.reinstalled.iter())
        {
            self.state.mark_installed(name);
        }
    }

    fn print_summary(&self, report: &BatchReport) {
        let total = report.upgraded.len() + report.dependents_upgraded.len();
        println!(
            "{} Upgraded {} packages ({} failed)",
            if report.success() { "✓".green().bold() } else { "✗".red().bold() },
            total.to_string().bold(),
            (report.failed.len() + report.reinstall_failed.len())
                .to_string()
                .bold()
        );
        for (name, error) in report.failed.iter().chain(report.reinstall_failed.iter()) {
            println!("    {} {}: {}", "✗".red(), name.bold(), error);
        }
    }
}

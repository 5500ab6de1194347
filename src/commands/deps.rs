use std::collections::HashSet;

use colored::Colorize;

use crate::api::BrewApi;
use crate::error::Result;
use crate::graph::DepGraph;
use crate::index::InMemoryIndex;
use crate::package::Package;

/// Print the dependency closure of a formula in install order.
pub async fn deps(api: &BrewApi, formula: &str) -> Result<()> {
    let mut closure = InMemoryIndex::new();
    let mut packages: Vec<Package> = Vec::new();
    let mut to_process = vec![formula.to_string()];
    let mut processed: HashSet<String> = HashSet::new();

    while let Some(name) = to_process.pop() {
        if !processed.insert(name.clone()) {
            continue;
        }
        let f = api.fetch_formula(&name).await?;
        for dep in &f.dependencies {
            if !processed.contains(dep) {
                to_process.push(dep.clone());
            }
        }
        let mut pkg = Package::new(f.canonical_name().to_string());
        pkg.aliases = f.aliases.clone();
        pkg.dependencies = f.dependencies.clone();
        pkg.keg_only = f.keg_only;
        packages.push(pkg.clone());
        closure.insert(pkg)?;
    }

    let order = DepGraph::build(&closure, &packages).sorted()?;
    for name in order.iter().filter(|n| {
        n.as_str() != formula && closure.canonical_name(formula) != Some(n.as_str())
    }) {
        println!("{}", name.cyan());
    }

    Ok(())
}

//! Homebrew JSON API client and the production package-index assembly.
//!
//! [`BrewApi`] queries Homebrew's public JSON API with an in-memory cache per
//! client instance. [`installed_index`] joins that metadata with the local
//! Cellar to produce the [`InMemoryIndex`] snapshot the engine runs against.

use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cellar;
use crate::error::{Error, Result};
use crate::index::InMemoryIndex;
use crate::package::Package;

const HOMEBREW_API_BASE: &str = "https://formulae.brew.sh/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Homebrew formula metadata from the JSON API (fields we consume).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub oldnames: Vec<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub versions: Versions,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub build_dependencies: Vec<String>,
    #[serde(default)]
    pub keg_only: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Versions {
    #[serde(default)]
    pub stable: Option<String>,
    #[serde(default)]
    pub bottle: bool,
}

impl Formula {
    /// Canonical name: `full_name` when present (carries the tap prefix for
    /// non-core formulae), plain name otherwise.
    pub fn canonical_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.name
        } else {
            &self.full_name
        }
    }
}

/// Homebrew API client with in-memory caching.
#[derive(Clone)]
pub struct BrewApi {
    client: reqwest::Client,
    formula_cache: moka::future::Cache<String, Formula>,
}

impl BrewApi {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(format!("kegwork/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Lasts for the duration of one command invocation.
        let formula_cache = moka::future::Cache::new(1000);

        Ok(Self {
            client,
            formula_cache,
        })
    }

    /// Fetch metadata for a specific formula by name.
    pub async fn fetch_formula(&self, name: &str) -> Result<Formula> {
        if let Some(cached) = self.formula_cache.get(name).await {
            return Ok(cached);
        }

        let url = format!("{}/formula/{}.json", HOMEBREW_API_BASE, name);
        let response = self.client.get(&url).send().await?;

        if response.status() == 404 {
            return Err(Error::FormulaNotFound(name.to_string()));
        }

        let formula: Formula = response.json().await?;
        self.formula_cache
            .insert(name.to_string(), formula.clone())
            .await;

        Ok(formula)
    }

    /// Fetch the complete formula list. Large download; used by reverse
    /// queries (`uses`) only.
    pub async fn fetch_all_formulae(&self) -> Result<Vec<Formula>> {
        let url = format!("{}/formula.json", HOMEBREW_API_BASE);
        let formulae = self.client.get(&url).send().await?.json().await?;
        Ok(formulae)
    }
}

/// Join one installed keg with its API metadata into a `Package` snapshot.
fn snapshot(keg: &cellar::InstalledKeg, formula: Option<&Formula>, pinned: &[String]) -> Package {
    let mut pkg = Package::new(
        formula
            .map(|f| f.canonical_name().to_string())
            .unwrap_or_else(|| keg.name.clone()),
    );

    // Receipts record the actual runtime dependencies of the installed keg,
    // which is what linkage reconciliation must follow; fall back to the
    // declared list for receipts that predate runtime_dependencies.
    let receipt_deps = keg.runtime_dependency_names();
    if let Some(f) = formula {
        pkg.aliases = f.aliases.clone();
        pkg.oldnames = f.oldnames.clone();
        pkg.dependencies = if receipt_deps.is_empty() {
            f.dependencies.clone()
        } else {
            receipt_deps
        };
        pkg.build_dependencies = f.build_dependencies.clone();
        pkg.keg_only = f.keg_only;
        pkg.bottled = f.versions.bottle;
        pkg.outdated = match &f.versions.stable {
            Some(stable) => {
                cellar::strip_bottle_revision(&keg.version)
                    != cellar::strip_bottle_revision(stable)
            }
            None => false,
        };
    } else {
        pkg.dependencies = receipt_deps;
    }

    pkg.installed = true;
    pkg.linked = cellar::is_linked(&keg.name);
    pkg.pinned = pinned.iter().any(|p| p == &keg.name);
    if let Some(receipt) = &keg.receipt {
        pkg.installed_as_dependency = receipt.installed_as_dependency;
        pkg.installed_on_request = receipt.installed_on_request;
    }

    pkg
}

/// Build the package index for the currently-installed set: scan the Cellar,
/// fetch metadata for every formula in parallel, and fold in the pinned
/// file. Formulae unknown to the API (taps, removed formulae) are indexed
/// from their receipts alone.
pub async fn installed_index(api: &BrewApi) -> Result<InMemoryIndex> {
    let kegs = cellar::newest_installed(cellar::list_installed()?);
    let pinned = cellar::read_pinned()?;

    let fetches = kegs.iter().map(|keg| {
        let api = api.clone();
        let name = keg.name.clone();
        async move { api.fetch_formula(&name).await.ok() }
    });
    let formulae: Vec<Option<Formula>> = join_all(fetches).await;

    let mut index = InMemoryIndex::new();
    for (keg, formula) in kegs.iter().zip(formulae.iter()) {
        let pkg = snapshot(keg, formula.as_ref(), &pinned);
        debug!(package = %pkg.name, outdated = pkg.outdated, "indexed");
        index.insert(pkg)?;
    }

    Ok(index)
}

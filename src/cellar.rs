//! Reading installed-package state from the Homebrew Cellar.
//!
//! Installed versions, their `INSTALL_RECEIPT.json` files, the pinned-formulae
//! tracking file, and the linked-keg markers together form the on-disk side
//! of the package index.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Detect the Homebrew prefix on this system.
pub fn detect_prefix() -> PathBuf {
    if let Ok(prefix) = std::env::var("HOMEBREW_PREFIX") {
        return PathBuf::from(prefix);
    }

    #[cfg(target_arch = "aarch64")]
    {
        PathBuf::from("/opt/homebrew")
    }
    #[cfg(not(target_arch = "aarch64"))]
    {
        PathBuf::from("/usr/local")
    }
}

/// Get the Cellar directory path.
pub fn cellar_path() -> PathBuf {
    detect_prefix().join("Cellar")
}

fn pinned_file_path() -> PathBuf {
    detect_prefix().join("var/homebrew/pinned_formulae")
}

/// Runtime dependency recorded in an install receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeDependency {
    pub full_name: String,
    pub version: String,
    #[serde(default)]
    pub declared_directly: bool,
}

/// Install receipt as written by Homebrew (fields we consume).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallReceipt {
    #[serde(default)]
    pub poured_from_bottle: bool,
    #[serde(default)]
    pub installed_as_dependency: bool,
    #[serde(default)]
    pub installed_on_request: bool,
    #[serde(default)]
    pub runtime_dependencies: Vec<RuntimeDependency>,
}

impl InstallReceipt {
    /// Read `INSTALL_RECEIPT.json` from a keg directory.
    pub fn read(keg: &Path) -> Result<Self> {
        let receipt_path = keg.join("INSTALL_RECEIPT.json");
        let contents = fs::read_to_string(&receipt_path)
            .with_context(|| format!("Failed to read receipt: {}", receipt_path.display()))?;
        let receipt: InstallReceipt = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse receipt: {}", receipt_path.display()))?;
        Ok(receipt)
    }
}

/// One installed keg (formula + version directory).
#[derive(Debug, Clone)]
pub struct InstalledKeg {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
    pub receipt: Option<InstallReceipt>,
}

impl InstalledKeg {
    fn from_path(name: String, version: String, path: PathBuf) -> Self {
        let receipt = InstallReceipt::read(&path).ok();
        Self {
            name,
            version,
            path,
            receipt,
        }
    }

    /// Runtime dependency names from the receipt, empty if unreadable.
    pub fn runtime_dependency_names(&self) -> Vec<String> {
        self.receipt
            .as_ref()
            .map(|r| {
                r.runtime_dependencies
                    .iter()
                    .map(|d| d.full_name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Read all installed kegs from the Cellar.
pub fn list_installed() -> Result<Vec<InstalledKeg>> {
    list_installed_at(&cellar_path())
}

/// Read all installed kegs from a specific Cellar directory.
pub fn list_installed_at(cellar: &Path) -> Result<Vec<InstalledKeg>> {
    if !cellar.exists() {
        return Ok(vec![]);
    }

    let mut kegs = Vec::new();

    for entry in fs::read_dir(cellar)
        .with_context(|| format!("Failed to read Cellar: {}", cellar.display()))?
    {
        let entry = entry?;
        let formula_name = entry.file_name().to_string_lossy().to_string();
        if formula_name.starts_with('.') {
            continue;
        }

        for version_entry in fs::read_dir(entry.path())? {
            let version_entry = version_entry?;
            let version = version_entry.file_name().to_string_lossy().to_string();
            if version.starts_with('.') {
                continue;
            }

            kegs.push(InstalledKeg::from_path(
                formula_name.clone(),
                version,
                version_entry.path(),
            ));
        }
    }

    Ok(kegs)
}

/// Newest keg per formula. Formulae interrupted mid-upgrade can have several
/// version directories; only the newest one describes current state.
pub fn newest_installed(kegs: Vec<InstalledKeg>) -> Vec<InstalledKeg> {
    let mut newest: std::collections::HashMap<String, InstalledKeg> = std::collections::HashMap::new();
    for keg in kegs {
        match newest.get(&keg.name) {
            Some(existing)
                if compare_versions(&existing.version, &keg.version)
                    != std::cmp::Ordering::Less => {}
            _ => {
                newest.insert(keg.name.clone(), keg);
            }
        }
    }
    let mut kegs: Vec<InstalledKeg> = newest.into_values().collect();
    kegs.sort_by(|a, b| a.name.cmp(&b.name));
    kegs
}

/// Whether a formula is currently linked into the prefix.
pub fn is_linked(formula: &str) -> bool {
    detect_prefix()
        .join("var/homebrew/linked")
        .join(formula)
        .exists()
}

/// Read the list of pinned formulae from the tracking file.
pub fn read_pinned() -> Result<Vec<String>> {
    let path = pinned_file_path();
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&path)?;
    Ok(content.lines().map(String::from).collect())
}

/// Write the list of pinned formulae to the tracking file.
pub fn write_pinned(pinned: &[String]) -> Result<()> {
    let path = pinned_file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, pinned.join("\n"))?;
    Ok(())
}

/// Compare two version strings semantically, numeric parts first.
pub fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    let a_parts: Vec<u32> = a.split('.').filter_map(|s| s.parse::<u32>().ok()).collect();
    let b_parts: Vec<u32> = b.split('.').filter_map(|s| s.parse::<u32>().ok()).collect();

    for i in 0..a_parts.len().max(b_parts.len()) {
        let a_part = a_parts.get(i).unwrap_or(&0);
        let b_part = b_parts.get(i).unwrap_or(&0);
        match a_part.cmp(b_part) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }

    a.cmp(b)
}

/// Strip bottle revision from a version string (`1.4.0_32` -> `1.4.0`).
pub fn strip_bottle_revision(version: &str) -> &str {
    if let Some(pos) = version.rfind('_') {
        if version[pos + 1..].chars().all(|c| c.is_ascii_digit()) {
            return &version[..pos];
        }
    }
    version
}

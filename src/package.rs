//! Package metadata as consumed by the graph and reconciliation engine.
//!
//! A [`Package`] is a point-in-time snapshot assembled at the index boundary
//! from the Homebrew JSON API and the local Cellar receipts. All flags default
//! to `false` when the underlying source omits them.

use serde::{Deserialize, Serialize};

/// One installable unit and its declared dependencies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Package {
    /// Canonical full name, possibly namespaced (`tap/name`).
    pub name: String,

    /// Historical alias names (e.g. `python` for `python@3.12`).
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Previous canonical names this formula was renamed from.
    #[serde(default)]
    pub oldnames: Vec<String>,

    /// Declared runtime dependency names, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Build-only dependency names, not needed at runtime.
    #[serde(default)]
    pub build_dependencies: Vec<String>,

    #[serde(default)]
    pub installed: bool,
    #[serde(default)]
    pub outdated: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub keg_only: bool,
    #[serde(default)]
    pub linked: bool,
    #[serde(default)]
    pub bottled: bool,
    #[serde(default)]
    pub installed_as_dependency: bool,
    #[serde(default)]
    pub installed_on_request: bool,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Name without the tap prefix (`user/tap/foo` -> `foo`).
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Whether the canonical name carries a tap prefix.
    pub fn is_namespaced(&self) -> bool {
        self.name.contains('/')
    }

    /// Whether this package declares `other` as a runtime dependency.
    pub fn depends_on(&self, other: &str) -> bool {
        self.dependencies.iter().any(|d| d == other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_plain() {
        assert_eq!(Package::new("wget").short_name(), "wget");
    }

    #[test]
    fn test_short_name_namespaced() {
        let pkg = Package::new("homebrew/core/wget");
        assert_eq!(pkg.short_name(), "wget");
        assert!(pkg.is_namespaced());
    }

    #[test]
    fn test_flags_default_false() {
        let pkg: Package = serde_json::from_str(r#"{"name":"openssl@3"}"#).unwrap();
        assert!(!pkg.pinned);
        assert!(!pkg.outdated);
        assert!(!pkg.keg_only);
        assert!(pkg.dependencies.is_empty());
    }

    #[test]
    fn test_depends_on() {
        let mut pkg = Package::new("mosh");
        pkg.dependencies = vec!["protobuf".into(), "ncurses".into()];
        assert!(pkg.depends_on("protobuf"));
        assert!(!pkg.depends_on("openssl@3"));
    }
}

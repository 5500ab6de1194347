//! Package index: lookup by any known name, installed-set enumeration, and
//! reverse (dependent) queries.
//!
//! The index is the authoritative read interface the graph builder and the
//! reconciler consume. Every name form — canonical, short, alias, oldname —
//! resolves to exactly one canonical package; ambiguity is rejected when the
//! index is populated, not discovered later during a sort.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{Error, Result};
use crate::package::Package;

/// Read contract consumed by the graph builder and the upgrade reconciler.
pub trait PackageIndex {
    /// Resolve any known name form to its package, or `None`.
    fn lookup(&self, name: &str) -> Option<Package>;

    /// All currently-installed packages.
    fn installed(&self) -> Vec<Package>;

    /// Transitive runtime dependents of `package` among installed packages.
    fn dependents_of(&self, package: &Package) -> Vec<Package>;
}

/// In-memory index keyed by canonical name, with an alias table for every
/// secondary name form.
#[derive(Debug, Default, Clone)]
pub struct InMemoryIndex {
    packages: HashMap<String, Package>,
    aliases: HashMap<String, String>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package, registering its short name, aliases, and oldnames.
    ///
    /// Returns [`Error::AmbiguousAlias`] if any secondary name is already
    /// claimed by a different canonical package.
    pub fn insert(&mut self, package: Package) -> Result<()> {
        let canonical = package.name.clone();

        let mut secondary: Vec<String> = Vec::new();
        if package.short_name() != canonical {
            secondary.push(package.short_name().to_string());
        }
        secondary.extend(package.aliases.iter().cloned());
        secondary.extend(package.oldnames.iter().cloned());

        for name in secondary {
            match self.aliases.get(&name) {
                Some(existing) if existing != &canonical => {
                    return Err(Error::AmbiguousAlias {
                        alias: name,
                        first: existing.clone(),
                        second: canonical,
                    });
                }
                _ => {
                    self.aliases.insert(name, canonical.clone());
                }
            }
        }

        self.packages.insert(canonical, package);
        Ok(())
    }

    /// Canonicalize any known name form.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.packages.get_key_value(name) {
            return Some(key.as_str());
        }
        self.aliases.get(name).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl PackageIndex for InMemoryIndex {
    fn lookup(&self, name: &str) -> Option<Package> {
        self.canonical_name(name)
            .and_then(|canonical| self.packages.get(canonical))
            .cloned()
    }

    fn installed(&self) -> Vec<Package> {
        let mut installed: Vec<Package> = self
            .packages
            .values()
            .filter(|p| p.installed)
            .cloned()
            .collect();
        installed.sort_by(|a, b| a.name.cmp(&b.name));
        installed
    }

    fn dependents_of(&self, package: &Package) -> Vec<Package> {
        // Reverse edges among installed packages, then BFS from the target.
        let mut reverse: HashMap<&str, Vec<&str>> = HashMap::new();
        for pkg in self.packages.values().filter(|p| p.installed) {
            for dep in &pkg.dependencies {
                if let Some(canonical) = self.canonical_name(dep) {
                    reverse.entry(canonical).or_default().push(&pkg.name);
                }
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(package.name.as_str());

        while let Some(name) = queue.pop_front() {
            if let Some(dependents) = reverse.get(name) {
                for &dep_name in dependents {
                    if seen.insert(dep_name) {
                        queue.push_back(dep_name);
                    }
                }
            }
        }

        let mut result: Vec<Package> = seen
            .into_iter()
            .filter(|name| *name != package.name)
            .filter_map(|name| self.packages.get(name))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installed(name: &str, deps: &[&str]) -> Package {
        Package {
            name: name.into(),
            dependencies: deps.iter().map(|s| s.to_string()).collect(),
            installed: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_lookup_by_canonical_and_short_name() {
        let mut index = InMemoryIndex::new();
        index.insert(installed("homebrew/core/wget", &[])).unwrap();

        assert!(index.lookup("homebrew/core/wget").is_some());
        let by_short = index.lookup("wget").unwrap();
        assert_eq!(by_short.name, "homebrew/core/wget");
    }

    #[test]
    fn test_lookup_by_alias_and_oldname() {
        let mut index = InMemoryIndex::new();
        let mut pkg = installed("python@3.12", &[]);
        pkg.aliases = vec!["python3".into()];
        pkg.oldnames = vec!["python".into()];
        index.insert(pkg).unwrap();

        assert_eq!(index.lookup("python3").unwrap().name, "python@3.12");
        assert_eq!(index.lookup("python").unwrap().name, "python@3.12");
        assert!(index.lookup("python2").is_none());
    }

    #[test]
    fn test_ambiguous_alias_rejected() {
        let mut index = InMemoryIndex::new();
        let mut a = installed("foo@1", &[]);
        a.aliases = vec!["foo".into()];
        let mut b = installed("foo@2", &[]);
        b.aliases = vec!["foo".into()];

        index.insert(a).unwrap();
        let err = index.insert(b).unwrap_err();
        assert!(matches!(err, Error::AmbiguousAlias { .. }));
    }

    #[test]
    fn test_dependents_are_transitive() {
        let mut index = InMemoryIndex::new();
        index.insert(installed("openssl@3", &[])).unwrap();
        index.insert(installed("curl", &["openssl@3"])).unwrap();
        index.insert(installed("carthage", &["curl"])).unwrap();
        index.insert(installed("jq", &[])).unwrap();

        let target = index.lookup("openssl@3").unwrap();
        let dependents: Vec<String> = index
            .dependents_of(&target)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(dependents, vec!["carthage", "curl"]);
    }

    #[test]
    fn test_dependents_skip_uninstalled() {
        let mut index = InMemoryIndex::new();
        index.insert(installed("zlib", &[])).unwrap();
        let mut not_installed = installed("pixman", &["zlib"]);
        not_installed.installed = false;
        index.insert(not_installed).unwrap();

        let target = index.lookup("zlib").unwrap();
        assert!(index.dependents_of(&target).is_empty());
    }
}

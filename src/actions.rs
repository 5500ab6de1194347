//! Collaborator contracts for the reconciliation engine.
//!
//! The engine never builds, downloads, or links anything itself; it drives
//! these interfaces in sorted order. Production implementations live in
//! [`crate::brew`]; tests substitute in-memory fakes.

use crate::error::InstallError;
use crate::index::PackageIndex;
use crate::package::Package;

/// Result of one install/upgrade/reinstall step.
///
/// `Skipped` is the benign "already attempted earlier in this dependency
/// tree" case: it is not an error and is not reported as one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Installed,
    Skipped,
    Failed(InstallError),
}

/// The opaque install/upgrade/reinstall action, invoked once per package in
/// sorted order.
pub trait InstallAction {
    fn install(&mut self, package: &Package) -> Outcome;

    fn upgrade(&mut self, package: &Package) -> Outcome;

    /// Rebuild from source, bypassing any bottle. Used for packages whose
    /// binary linkage is known-broken.
    fn reinstall_from_source(&mut self, package: &Package) -> Outcome;
}

/// Bottle availability checks, used to decide which dependents may be
/// auto-upgraded without forcing a from-source build.
pub trait BottleCheck {
    fn bottled(&self, package: &Package) -> bool;

    fn all_deps_bottled(&self, package: &Package) -> bool;
}

/// Broken-linkage probe, keyed against an on-disk scan cache elsewhere.
pub trait LinkageCheck {
    fn broken_linkage(&self, package: &Package) -> bool;
}

/// [`BottleCheck`] backed by the bottled flags the index reports.
pub struct FlagBottleCheck<'a> {
    index: &'a dyn PackageIndex,
}

impl<'a> FlagBottleCheck<'a> {
    pub fn new(index: &'a dyn PackageIndex) -> Self {
        Self { index }
    }
}

impl BottleCheck for FlagBottleCheck<'_> {
    fn bottled(&self, package: &Package) -> bool {
        package.bottled
    }

    fn all_deps_bottled(&self, package: &Package) -> bool {
        package.dependencies.iter().all(|dep| {
            // A dependency we cannot resolve cannot block the bottle check;
            // it contributes no edge to the graph either.
            self.index.lookup(dep).is_none_or(|d| d.bottled)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InMemoryIndex;

    #[test]
    fn test_flag_bottle_check() {
        let mut index = InMemoryIndex::new();
        index
            .insert(Package {
                name: "zlib".into(),
                installed: true,
                bottled: true,
                ..Default::default()
            })
            .unwrap();
        index
            .insert(Package {
                name: "custom-tool".into(),
                installed: true,
                bottled: false,
                ..Default::default()
            })
            .unwrap();

        let check = FlagBottleCheck::new(&index);

        let mut good = Package::new("wget");
        good.bottled = true;
        good.dependencies = vec!["zlib".into()];
        assert!(check.bottled(&good));
        assert!(check.all_deps_bottled(&good));

        let mut bad = Package::new("other");
        bad.bottled = true;
        bad.dependencies = vec!["custom-tool".into()];
        assert!(!check.all_deps_bottled(&bad));

        let mut unresolved = Package::new("loner");
        unresolved.bottled = true;
        unresolved.dependencies = vec!["no-such-formula".into()];
        assert!(check.all_deps_bottled(&unresolved));
    }
}

//! Dependency graph construction and deterministic topological ordering.
//!
//! The graph is ephemeral: built fresh per operation from the current index
//! state, sorted once, then discarded. Nodes are keyed by canonical name only;
//! short names and aliases are canonicalized at the boundary so a package can
//! never appear under two keys.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::index::PackageIndex;
use crate::package::Package;

/// A dependency cycle. Fatal to the whole sort: no valid order exists.
///
/// Carries the cycle members in traversal order plus each member's outgoing
/// edges for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    pub members: Vec<String>,
    pub edges: Vec<(String, Vec<String>)>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "dependency cycle detected: {}",
            self.members.join(" -> ")
        )?;
        for (name, deps) in &self.edges {
            writeln!(f, "  {} depends on: {}", name, deps.join(", "))?;
        }
        write!(
            f,
            "no install order is possible; uninstall one of {} and reinstall it afterwards",
            self.members.join(", ")
        )
    }
}

impl std::error::Error for CycleError {}

#[derive(Debug, Clone)]
struct Node {
    namespaced: bool,
    keg_only: bool,
    /// Canonical names of in-graph dependencies, sorted for deterministic
    /// traversal.
    children: Vec<String>,
}

/// Directed dependency graph over a relevant set of packages.
///
/// `A -> B` means A depends on B. Edges pointing outside the relevant set are
/// dropped at build time: the graph orders packages that are installed or
/// about to be installed, it does not do full resolution.
#[derive(Debug, Clone, Default)]
pub struct DepGraph {
    nodes: BTreeMap<String, Node>,
}

impl DepGraph {
    /// Build the graph for `packages`, resolving dependency names through
    /// `index`. Names that resolve to nothing, or to a package outside the
    /// set, contribute no edge.
    pub fn build(index: &dyn PackageIndex, packages: &[Package]) -> Self {
        let relevant: HashSet<&str> = packages.iter().map(|p| p.name.as_str()).collect();

        let mut nodes = BTreeMap::new();
        for pkg in packages {
            let mut children: Vec<String> = pkg
                .dependencies
                .iter()
                .filter_map(|dep| index.lookup(dep))
                .filter(|dep| relevant.contains(dep.name.as_str()) && dep.name != pkg.name)
                .map(|dep| dep.name)
                .collect();
            children.sort();
            children.dedup();

            nodes.insert(
                pkg.name.clone(),
                Node {
                    namespaced: pkg.is_namespaced(),
                    keg_only: pkg.keg_only,
                    children,
                },
            );
        }

        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node names in the deterministic pre-sort order: plain names before
    /// namespaced ones, keg-only last within each class, lexicographic
    /// within the rest.
    fn presorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(|s| s.as_str()).collect();
        names.sort_by_key(|name| {
            let node = &self.nodes[*name];
            (node.namespaced, node.keg_only, *name)
        });
        names
    }

    /// Topological order: every dependency precedes its dependents.
    ///
    /// Deterministic for a given input set: roots are taken in pre-sorted
    /// order and children are visited sorted by name. Returns a
    /// [`CycleError`] naming the offending nodes if the graph is cyclic.
    pub fn sorted(&self) -> Result<Vec<String>, CycleError> {
        let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(self.nodes.len());
        let mut path: Vec<&str> = Vec::new();
        let mut order: Vec<String> = Vec::with_capacity(self.nodes.len());

        for name in self.presorted() {
            self.visit(name, &mut marks, &mut path, &mut order)?;
        }
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
        order: &mut Vec<String>,
    ) -> Result<(), CycleError> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::OnStack) => return Err(self.cycle_from(path, name)),
            None => {}
        }

        marks.insert(name, Mark::OnStack);
        path.push(name);
        for child in &self.nodes[name].children {
            self.visit(child, marks, path, order)?;
        }
        path.pop();
        marks.insert(name, Mark::Done);
        order.push(name.to_string());
        Ok(())
    }

    /// Reconstruct the cycle from the DFS path: everything from the first
    /// occurrence of `repeat` to the top of the stack, closed back on itself.
    fn cycle_from(&self, path: &[&str], repeat: &str) -> CycleError {
        let start = path.iter().position(|n| *n == repeat).unwrap_or(0);
        let mut members: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
        members.push(repeat.to_string());

        let edges = path[start..]
            .iter()
            .map(|name| (name.to_string(), self.nodes[*name].children.clone()))
            .collect();

        CycleError { members, edges }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Done,
}

// End-to-end tests for the graph + reconciliation engine, driven entirely
// through the public API with in-memory collaborators.

use std::collections::HashSet;

use kegwork::{
    BottleCheck, DepGraph, InMemoryIndex, InstallAction, InstallError, LinkageCheck, Outcome,
    Package, PackageIndex, Reconciler,
};

fn pkg(name: &str, deps: &[&str]) -> Package {
    Package {
        name: name.into(),
        dependencies: deps.iter().map(|s| s.to_string()).collect(),
        installed: true,
        bottled: true,
        ..Default::default()
    }
}

fn index_of(packages: Vec<Package>) -> InMemoryIndex {
    let mut index = InMemoryIndex::new();
    for p in packages {
        index.insert(p).unwrap();
    }
    index
}

/// Bottle check that trusts package flags, without index access.
struct Flags;

impl BottleCheck for Flags {
    fn bottled(&self, package: &Package) -> bool {
        package.bottled
    }

    fn all_deps_bottled(&self, _package: &Package) -> bool {
        true
    }
}

struct NoBroken;

impl LinkageCheck for NoBroken {
    fn broken_linkage(&self, _package: &Package) -> bool {
        false
    }
}

#[derive(Default)]
struct Recorder {
    log: Vec<String>,
    fail: HashSet<String>,
    attempted: HashSet<String>,
}

impl InstallAction for Recorder {
    fn install(&mut self, package: &Package) -> Outcome {
        self.step("install", package)
    }

    fn upgrade(&mut self, package: &Package) -> Outcome {
        self.step("upgrade", package)
    }

    fn reinstall_from_source(&mut self, package: &Package) -> Outcome {
        self.step("reinstall", package)
    }
}

impl Recorder {
    fn step(&mut self, verb: &str, package: &Package) -> Outcome {
        if !self.attempted.insert(package.name.clone()) {
            return Outcome::Skipped;
        }
        self.log.push(format!("{} {}", verb, package.name));
        if self.fail.contains(&package.name) {
            Outcome::Failed(InstallError::Build("compile error".into()))
        } else {
            Outcome::Installed
        }
    }
}

#[test]
fn diamond_dependency_batch_installs_leaves_first() {
    let mut packages = vec![
        pkg("app", &["libx", "liby"]),
        pkg("libx", &["base"]),
        pkg("liby", &["base"]),
        pkg("base", &[]),
    ];
    for p in &mut packages {
        p.outdated = true;
    }
    let index = index_of(packages);
    let mut actions = Recorder::default();
    let mut reconciler = Reconciler::new(&index, &Flags, &NoBroken);

    let report = reconciler.upgrade_batch(&[], &mut actions).unwrap();
    assert!(report.success());
    assert_eq!(
        actions.log,
        vec![
            "upgrade base",
            "upgrade libx",
            "upgrade liby",
            "upgrade app"
        ]
    );
}

#[test]
fn upgrade_pulls_outdated_dependent_into_second_pass() {
    let mut p = pkg("p", &[]);
    p.outdated = true;
    let mut q = pkg("q", &["p"]);
    q.outdated = true;

    let index = index_of(vec![p, q]);
    let mut actions = Recorder::default();
    let mut reconciler = Reconciler::new(&index, &Flags, &NoBroken);

    let report = reconciler
        .upgrade_batch(&["p".to_string()], &mut actions)
        .unwrap();
    assert_eq!(report.upgraded, vec!["p"]);
    assert_eq!(report.dependents_upgraded, vec!["q"]);
    assert_eq!(actions.log, vec!["upgrade p", "upgrade q"]);
}

#[test]
fn dependent_already_in_batch_is_not_upgraded_twice() {
    let mut p = pkg("p", &[]);
    p.outdated = true;
    let mut q = pkg("q", &["p"]);
    q.outdated = true;

    let index = index_of(vec![p, q]);
    let mut actions = Recorder::default();
    let mut reconciler = Reconciler::new(&index, &Flags, &NoBroken);

    // Both requested up front: the dependents pass must not revisit q.
    let report = reconciler
        .upgrade_batch(&["p".to_string(), "q".to_string()], &mut actions)
        .unwrap();
    assert_eq!(report.upgraded, vec!["p", "q"]);
    assert!(report.dependents_upgraded.is_empty());
    assert_eq!(actions.log, vec!["upgrade p", "upgrade q"]);
}

#[test]
fn cycle_is_fatal_and_names_both_offenders() {
    let mut x = pkg("x", &["y"]);
    x.outdated = true;
    let mut y = pkg("y", &["x"]);
    y.outdated = true;

    let index = index_of(vec![x, y]);
    let mut actions = Recorder::default();
    let mut reconciler = Reconciler::new(&index, &Flags, &NoBroken);

    let err = reconciler.upgrade_batch(&[], &mut actions).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("x"));
    assert!(message.contains("y"));
    assert!(actions.log.is_empty(), "nothing may run without an order");
}

#[test]
fn build_failure_marks_run_failed_but_siblings_proceed() {
    let mut a = pkg("autoconf", &[]);
    a.outdated = true;
    let mut b = pkg("bison", &[]);
    b.outdated = true;
    let mut c = pkg("cmake", &[]);
    c.outdated = true;

    let index = index_of(vec![a, b, c]);
    let mut actions = Recorder::default();
    actions.fail.insert("bison".into());
    let mut reconciler = Reconciler::new(&index, &Flags, &NoBroken);

    let report = reconciler.upgrade_batch(&[], &mut actions).unwrap();
    assert!(!report.success());
    assert_eq!(report.upgraded, vec!["autoconf", "cmake"]);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.is_build_failure());
    assert_eq!(actions.log.len(), 3);
}

#[test]
fn failed_dependency_does_not_stop_its_dependent_attempt() {
    let mut lib = pkg("lib", &[]);
    lib.outdated = true;
    let mut tool = pkg("tool", &["lib"]);
    tool.outdated = true;

    let index = index_of(vec![lib, tool]);
    let mut actions = Recorder::default();
    actions.fail.insert("lib".into());
    let mut reconciler = Reconciler::new(&index, &Flags, &NoBroken);

    let report = reconciler.upgrade_batch(&[], &mut actions).unwrap();
    assert_eq!(report.failed[0].0, "lib");
    assert_eq!(report.upgraded, vec!["tool"]);
}

#[test]
fn graph_sort_matches_reconciler_order() {
    let packages = vec![
        pkg("readline", &[]),
        pkg("sqlite", &["readline"]),
        pkg("python@3.12", &["sqlite", "readline"]),
    ];
    let index = index_of(packages.clone());
    let order = DepGraph::build(&index, &packages).sorted().unwrap();
    assert_eq!(order, vec!["readline", "sqlite", "python@3.12"]);
}

#[test]
fn dependents_query_feeds_reconciler_through_aliases() {
    let mut ssl = pkg("openssl@3", &[]);
    ssl.aliases = vec!["openssl".into()];
    ssl.outdated = true;
    let mut curl = pkg("curl", &["openssl"]);
    curl.outdated = true;

    let index = index_of(vec![ssl, curl]);
    let target = index.lookup("openssl").unwrap();
    assert_eq!(target.name, "openssl@3");

    let mut actions = Recorder::default();
    let mut reconciler = Reconciler::new(&index, &Flags, &NoBroken);
    let report = reconciler
        .upgrade_batch(&["openssl".to_string()], &mut actions)
        .unwrap();
    assert_eq!(report.upgraded, vec!["openssl@3"]);
    assert_eq!(report.dependents_upgraded, vec!["curl"]);
}

#[test]
fn broken_linkage_repair_runs_after_dependent_upgrades() {
    struct Broken(HashSet<String>);
    impl LinkageCheck for Broken {
        fn broken_linkage(&self, package: &Package) -> bool {
            self.0.contains(&package.name)
        }
    }

    let mut p = pkg("icu4c", &[]);
    p.outdated = true;
    let mut q = pkg("harfbuzz", &["icu4c"]);
    q.outdated = true;
    let r = pkg("pango", &["harfbuzz"]);

    let index = index_of(vec![p, q, r]);
    let linkage = Broken(["pango".to_string()].into_iter().collect());
    let mut actions = Recorder::default();
    let mut reconciler = Reconciler::new(&index, &Flags, &linkage);

    let report = reconciler
        .upgrade_batch(&["icu4c".to_string()], &mut actions)
        .unwrap();
    assert_eq!(report.upgraded, vec!["icu4c"]);
    assert_eq!(report.dependents_upgraded, vec!["harfbuzz"]);
    assert_eq!(report.reinstalled, vec!["pango"]);
    assert_eq!(
        actions.log,
        vec!["upgrade icu4c", "upgrade harfbuzz", "reinstall pango"]
    );
}

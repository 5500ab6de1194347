//! Dependency-aware install ordering and upgrade reconciliation for Homebrew
//! formulae.
//!
//! The core engine is synchronous: a [`PackageIndex`](index::PackageIndex)
//! snapshot feeds the [`DepGraph`](graph::DepGraph) builder and the
//! [`Reconciler`](reconcile::Reconciler), which drive the collaborator
//! interfaces in [`actions`]. Production adapters — the Homebrew JSON API
//! client, the Cellar scanner, and the brew-delegating runner — live in
//! [`api`], [`cellar`], and [`brew`].

pub mod actions;
pub mod api;
pub mod brew;
pub mod cellar;
pub mod commands;
pub mod error;
pub mod graph;
pub mod index;
pub mod package;
pub mod reconcile;
pub mod state;

pub use actions::{BottleCheck, InstallAction, LinkageCheck, Outcome};
pub use api::BrewApi;
pub use error::{Error, InstallError, Result};
pub use graph::{CycleError, DepGraph};
pub use index::{InMemoryIndex, PackageIndex};
pub use package::Package;
pub use reconcile::{BatchReport, DependentsPartition, Reconciler};
pub use state::InstallState;

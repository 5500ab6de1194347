//! Command implementations for the kegwork CLI.
//!
//! - **install**: install formulae with their missing dependencies
//! - **upgrade**: batch upgrade plus dependent/linkage reconciliation
//! - **outdated**: list installed formulae behind the API stable version
//! - **deps**: print the resolved install order for a formula
//! - **uses**: installed formulae that depend on a formula
//! - **pin**: pin/unpin formulae against automatic upgrade

pub mod deps;
pub mod install;
pub mod outdated;
pub mod pin;
pub mod upgrade;
pub mod uses;

pub use deps::deps;
pub use install::install;
pub use outdated::outdated;
pub use pin::{pin, unpin};
pub use upgrade::upgrade;
pub use uses::uses;

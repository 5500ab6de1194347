//! Production collaborators that delegate to the `brew` binary.
//!
//! Downloads, builds, linking, and linkage scans all happen inside brew; this
//! module only classifies its exit status and stderr into the engine's
//! outcome types.

use std::collections::HashSet;
use std::process::Command;

use colored::Colorize;
use tracing::debug;

use crate::actions::{InstallAction, LinkageCheck, Outcome};
use crate::error::{InstallError, Result};
use crate::package::Package;

/// Check if brew is available before delegating to it.
pub fn check_brew_available() -> bool {
    Command::new("brew")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Runs install/upgrade/reinstall by shelling out to brew, tracking which
/// packages were already attempted in this batch.
#[derive(Debug, Default)]
pub struct BrewRunner {
    attempted: HashSet<String>,
}

impl BrewRunner {
    pub fn new() -> Result<Self> {
        if !check_brew_available() {
            println!("{} brew is not installed", "✗".red());
            return Err(anyhow::anyhow!("brew not available").into());
        }
        Ok(Self::default())
    }

    fn run(&mut self, package: &Package, args: &[&str]) -> Outcome {
        if !self.attempted.insert(package.name.clone()) {
            debug!(package = %package.name, "already attempted in this batch");
            return Outcome::Skipped;
        }

        debug!(package = %package.name, ?args, "delegating to brew");
        let output = match Command::new("brew").args(args).arg(&package.name).output() {
            Ok(output) => output,
            Err(e) => {
                return Outcome::Failed(InstallError::CannotInstall(format!(
                    "failed to spawn brew: {}",
                    e
                )));
            }
        };

        if output.status.success() {
            return Outcome::Installed;
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Outcome::Failed(classify_brew_failure(&stderr))
    }
}

impl InstallAction for BrewRunner {
    fn install(&mut self, package: &Package) -> Outcome {
        self.run(package, &["install"])
    }

    fn upgrade(&mut self, package: &Package) -> Outcome {
        self.run(package, &["upgrade"])
    }

    fn reinstall_from_source(&mut self, package: &Package) -> Outcome {
        // Reinstall is allowed to repeat a name attempted earlier in the
        // same run; the broken-linkage pass deliberately revisits packages.
        self.attempted.remove(&package.name);
        self.run(package, &["reinstall", "--build-from-source"])
    }
}

/// Linkage probe backed by `brew linkage --cached --test`, which reads
/// brew's on-disk linkage scan database.
#[derive(Debug, Default)]
pub struct BrewLinkage;

impl LinkageCheck for BrewLinkage {
    fn broken_linkage(&self, package: &Package) -> bool {
        Command::new("brew")
            .args(["linkage", "--cached", "--test"])
            .arg(&package.name)
            .output()
            .map(|output| !output.status.success())
            .unwrap_or(false)
    }
}

/// Map brew's stderr onto the recoverable error taxonomy.
fn classify_brew_failure(stderr: &str) -> InstallError {
    let lower = stderr.to_lowercase();
    let message = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("brew exited non-zero")
        .trim()
        .to_string();

    if lower.contains("sha256 mismatch") || lower.contains("checksum mismatch") {
        InstallError::ChecksumMismatch(message)
    } else if lower.contains("failed to download") || lower.contains("download failed") {
        InstallError::Download(message)
    } else if lower.contains("unsatisfied requirement") {
        InstallError::UnsatisfiedRequirements(message)
    } else if lower.contains("make: ") || lower.contains("build failed") || lower.contains("error: compilation") {
        InstallError::Build(message)
    } else {
        InstallError::CannotInstall(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_checksum_mismatch() {
        let err = classify_brew_failure("Error: SHA256 mismatch\nExpected: abc\nActual: def");
        assert!(matches!(err, InstallError::ChecksumMismatch(_)));
    }

    #[test]
    fn test_classify_download_failure() {
        let err = classify_brew_failure("curl: (22) error\nError: Failed to download resource");
        assert!(matches!(err, InstallError::Download(_)));
    }

    #[test]
    fn test_classify_build_failure() {
        let err = classify_brew_failure("make: *** [all] Error 2");
        assert!(err.is_build_failure());
    }

    #[test]
    fn test_classify_fallback() {
        let err = classify_brew_failure("Error: something unusual happened");
        assert!(matches!(err, InstallError::CannotInstall(_)));
    }

    #[test]
    fn test_classify_uses_last_nonempty_line() {
        let err = classify_brew_failure("first line\n\nError: the real reason\n\n");
        match err {
            InstallError::CannotInstall(msg) => assert_eq!(msg, "Error: the real reason"),
            other => panic!("unexpected classification: {:?}", other),
        }
    }
}

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use kegwork::commands;
use kegwork::{BrewApi, Error};

#[derive(Parser)]
#[command(name = "kegwork")]
#[command(author, version, about = "Dependency-aware upgrades for Homebrew formulae", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install formulae with their missing dependencies
    Install {
        /// Formula names
        formulae: Vec<String>,
    },

    /// Upgrade formulae (all outdated when none given), then reconcile
    /// dependents and broken linkage
    Upgrade {
        /// Formula names
        formulae: Vec<String>,

        /// Show what would be upgraded without doing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show outdated installed packages
    Outdated,

    /// Show the install-order dependency closure of a formula
    Deps {
        /// Formula name
        formula: String,
    },

    /// Show installed formulae that depend on a formula
    Uses {
        /// Formula name
        formula: String,
    },

    /// Pin formulae against automatic upgrade
    Pin {
        /// Formula names
        formulae: Vec<String>,
    },

    /// Unpin formulae
    Unpin {
        /// Formula names
        formulae: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("kegwork=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(Error::DependencyCycle(cycle)) => {
            eprintln!("{} {}", "✗".red().bold(), cycle);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> kegwork::Result<bool> {
    let api = BrewApi::new()?;

    match cli.command {
        Commands::Install { formulae } => commands::install(&api, &formulae).await,
        Commands::Upgrade { formulae, dry_run } => {
            commands::upgrade(&api, &formulae, dry_run).await
        }
        Commands::Outdated => {
            commands::outdated(&api).await?;
            Ok(true)
        }
        Commands::Deps { formula } => {
            commands::deps(&api, &formula).await?;
            Ok(true)
        }
        Commands::Uses { formula } => {
            commands::uses(&api, &formula).await?;
            Ok(true)
        }
        Commands::Pin { formulae } => {
            commands::pin(&formulae)?;
            Ok(true)
        }
        Commands::Unpin { formulae } => {
            commands::unpin(&formulae)?;
            Ok(true)
        }
    }
}

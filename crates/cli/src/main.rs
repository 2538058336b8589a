//! Apogee CLI - database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table used by the storefront
//! apogee-cli migrate storefront
//!
//! # Create or update the shop schema
//! apogee-cli migrate admin
//!
//! # Both
//! apogee-cli migrate all
//!
//! # Load categories, labels and products from YAML
//! apogee-cli seed catalog catalog.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "apogee-cli")]
#[command(author, version, about = "Apogee Parts CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Seed the database from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Create the storefront session store
    Storefront,
    /// Run the shop schema migrations
    Admin,
    /// Run all database migrations
    All,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Load categories, labels and products from a YAML file
    Catalog {
        /// Path to the YAML file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::admin().await?;
                commands::migrate::storefront().await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => {
                let summary = commands::seed::catalog(&file).await?;
                tracing::info!(
                    categories = summary.categories,
                    labels = summary.labels,
                    products = summary.products,
                    "Catalog seeded"
                );
            }
        },
    }
    Ok(())
}

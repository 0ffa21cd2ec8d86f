//! Ojasritu CLI - migrations and operator tasks for the storefront.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! ojas-cli migrate
//!
//! # Create a staff account (password from OJAS_STAFF_PASSWORD)
//! ojas-cli staff create -u vaidya -e vaidya@ojasritu.co.in
//!
//! # Load the sample catalog
//! ojas-cli seed catalog
//!
//! # Void gateway orders abandoned for more than an hour
//! ojas-cli orders sweep --older-than-minutes 60
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "ojas-cli")]
#[command(author, version, about = "Ojasritu storefront operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage staff accounts
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
    /// Load sample data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Order maintenance
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum StaffAction {
    /// Create a staff account with a password
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(long, env = "OJAS_STAFF_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Sample categories and products (skips existing slugs)
    Catalog,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Mark gateway orders that never got a payment session as failed
    Sweep {
        /// Only orders created at least this many minutes ago
        #[arg(long, default_value_t = 60)]
        older_than_minutes: u32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Staff { action } => match action {
            StaffAction::Create {
                username,
                email,
                password,
            } => {
                let password = SecretString::from(password);
                commands::staff::create(&username, &email, &password).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog => commands::seed::catalog().await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::Sweep { older_than_minutes } => {
                commands::orders::sweep(older_than_minutes).await?;
            }
        },
    }
    Ok(())
}

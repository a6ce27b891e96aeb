//! Store rating CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sr-cli migrate
//!
//! # Create an admin account
//! sr-cli admin create -n "Platform Administrator" -e admin@example.com -p 'AdminPass1!'
//!
//! # Insert the sample owner, user, stores and ratings
//! sr-cli seed sample
//! ```
//!
//! All commands read `SERVER_DATABASE_URL` (or `DATABASE_URL`), loading `.env`
//! if present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sr-cli")]
#[command(author, version, about = "Store rating CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Insert sample data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Display name (20-60 characters)
        #[arg(short, long)]
        name: String,

        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Password (8-16 characters, one uppercase letter, one of !@#$%^&*)
        #[arg(short, long)]
        password: String,

        /// Postal address
        #[arg(short, long)]
        address: Option<String>,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// A store owner, a regular user, three stores and three ratings
    Sample,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                name,
                email,
                password,
                address,
            } => {
                commands::admin::create_admin(&name, &email, &password, address.as_deref())
                    .await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Sample => commands::seed::sample().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_admin_create() {
        let cli = Cli::try_parse_from([
            "sr-cli",
            "admin",
            "create",
            "-n",
            "Platform Administrator Name",
            "-e",
            "admin@example.com",
            "-p",
            "AdminPass1!",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        match cli.command {
            Commands::Admin {
                action: AdminAction::Create { email, address, .. },
            } => {
                assert_eq!(email, "admin@example.com");
                assert_eq!(address, None);
            }
            _ => panic!("expected admin create"),
        }
    }
}

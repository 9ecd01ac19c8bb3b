//! Maani CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! maani-cli migrate
//!
//! # Expire lapsed subscriptions
//! maani-cli subscriptions sweep
//!
//! # Inspect a subscription
//! maani-cli subscriptions show --user-id 42 --kind buyer
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use maani_core::{SubscriptionKind, UserId};

mod commands;

#[derive(Parser)]
#[command(name = "maani-cli")]
#[command(author, version, about = "Maani CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Subscription maintenance
    Subscriptions {
        #[command(subcommand)]
        action: SubscriptionAction,
    },
}

#[derive(Subcommand)]
enum SubscriptionAction {
    /// Mark subscriptions past their end date inactive
    Sweep,
    /// Print one subscription as JSON
    Show {
        /// Owning user ID
        #[arg(short, long)]
        user_id: i32,

        /// Subscription type (`seller` or `buyer`)
        #[arg(short, long)]
        kind: SubscriptionKind,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Subscriptions { action } => match action {
            SubscriptionAction::Sweep => {
                commands::subscriptions::sweep().await?;
            }
            SubscriptionAction::Show { user_id, kind } => {
                commands::subscriptions::show(UserId::new(user_id), kind).await?;
            }
        },
    }
    Ok(())
}

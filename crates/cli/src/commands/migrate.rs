//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! maani-cli migrate
//! ```
//!
//! Migrations live in `crates/server/migrations/` and are embedded at
//! compile time.

use super::{CommandError, connect};

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

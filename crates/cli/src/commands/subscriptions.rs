//! Subscription maintenance commands.
//!
//! # Usage
//!
//! ```bash
//! # Mark every lapsed subscription inactive (run from cron)
//! maani-cli subscriptions sweep
//!
//! # Print one subscription as JSON
//! maani-cli subscriptions show --user-id 42 --kind seller
//! ```

use chrono::Utc;

use maani_core::{SubscriptionKind, UserId};
use maani_server::db::SubscriptionRepository;
use maani_server::services::SubscriptionService;

use super::{CommandError, connect};

/// Mark lapsed subscriptions inactive. Returns how many changed.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the update fails.
pub async fn sweep() -> Result<u64, CommandError> {
    let pool = connect().await?;

    let expired = SubscriptionService::new(&pool)
        .expire_lapsed(Utc::now())
        .await?;
    Ok(expired)
}

/// Print a subscription with its payment history.
///
/// # Errors
///
/// Returns an error if the lookup fails.
pub async fn show(user_id: UserId, kind: SubscriptionKind) -> Result<(), CommandError> {
    let pool = connect().await?;

    match SubscriptionRepository::new(&pool).get(user_id, kind).await? {
        Some(subscription) => {
            let active = subscription.is_active_at(Utc::now());
            let json = serde_json::to_string_pretty(&subscription)?;
            #[allow(clippy::print_stdout)]
            {
                println!("{json}");
            }
            tracing::info!(%user_id, %kind, active, "Subscription found");
        }
        None => tracing::warn!(%user_id, %kind, "No subscription found"),
    }
    Ok(())
}

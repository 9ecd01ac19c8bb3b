//! Subscription lifecycle: trial start, renewal, cancellation, and expiry.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use maani_core::subscription::{Payment, Subscription, validate_payment};
use maani_core::{SubscriptionKind, UserId};

use crate::db::{RepositoryError, SubscriptionRepository};
use crate::error::{AppError, Result, add_breadcrumb};

/// A stored subscription plus its real-time access state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusView {
    #[serde(flatten)]
    pub subscription: Subscription,
    /// Access right now, regardless of whether the sweep has run.
    pub is_active: bool,
    pub trial_days_remaining: u32,
}

impl SubscriptionStatusView {
    #[must_use]
    pub fn at(subscription: Subscription, now: DateTime<Utc>) -> Self {
        Self {
            is_active: subscription.is_active_at(now),
            trial_days_remaining: subscription.trial_days_remaining(now),
            subscription,
        }
    }
}

/// Service for subscription operations.
pub struct SubscriptionService<'a> {
    repo: SubscriptionRepository<'a>,
}

impl<'a> SubscriptionService<'a> {
    /// Create a new subscription service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            repo: SubscriptionRepository::new(pool),
        }
    }

    /// Start the free trial for `(user_id, kind)`.
    ///
    /// # Errors
    ///
    /// Returns a conflict if the user already has this kind of subscription.
    #[instrument(skip(self))]
    pub async fn create(&self, user_id: UserId, kind: SubscriptionKind) -> Result<Subscription> {
        let subscription = Subscription::start_trial(user_id, kind, Utc::now())?;
        let subscription = self.repo.create(&subscription).await?;

        info!(trial_ends = %subscription.trial_end_date, "Trial started");
        Ok(subscription)
    }

    /// The subscription with its real-time `is_active` and trial days.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no subscription exists.
    #[instrument(skip(self))]
    pub async fn status(
        &self,
        user_id: UserId,
        kind: SubscriptionKind,
    ) -> Result<SubscriptionStatusView> {
        let subscription = self.load(user_id, kind).await?;
        Ok(SubscriptionStatusView::at(subscription, Utc::now()))
    }

    /// Real-time access check. A missing subscription is simply inactive.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn is_active(&self, user_id: UserId, kind: SubscriptionKind) -> Result<bool> {
        let subscription = self.repo.get(user_id, kind).await?;
        Ok(subscription.is_some_and(|s| s.is_active_at(Utc::now())))
    }

    /// Record a payment and extend the subscription one month from now.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a non-positive amount or blank
    /// transaction id, `AppError::NotFound` if no subscription exists.
    #[instrument(skip(self, transaction_id))]
    pub async fn renew(
        &self,
        user_id: UserId,
        kind: SubscriptionKind,
        amount: Decimal,
        transaction_id: &str,
    ) -> Result<Subscription> {
        // Reject bad input before locking the row
        let transaction_id = validate_payment(amount, transaction_id)?;
        let now = Utc::now();
        let subscription = self
            .repo
            .update_with(user_id, kind, |subscription| {
                Ok::<_, AppError>(Some(subscription.renew(amount, transaction_id, now)?))
            })
            .await
            .map_err(|e| with_context(e, user_id, kind))?;

        add_breadcrumb(
            "subscription",
            "Subscription renewed",
            &[
                ("user_id", user_id.to_string()),
                ("kind", kind.to_string()),
                ("transaction_id", transaction_id.to_owned()),
            ],
        );
        info!(end_date = %subscription.end_date, "Subscription renewed");
        Ok(subscription)
    }

    /// Turn off auto-renewal. Access continues until the end date.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no subscription exists.
    #[instrument(skip(self))]
    pub async fn cancel(&self, user_id: UserId, kind: SubscriptionKind) -> Result<Subscription> {
        let now = Utc::now();
        let subscription = self
            .repo
            .update_with(user_id, kind, |subscription| {
                subscription.cancel(now);
                Ok::<_, AppError>(None)
            })
            .await
            .map_err(|e| with_context(e, user_id, kind))?;

        info!("Auto-renew cancelled");
        Ok(subscription)
    }

    /// Whole days left in the trial, rounded up; 0 once it has ended.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no subscription exists.
    #[instrument(skip(self))]
    pub async fn trial_days_remaining(
        &self,
        user_id: UserId,
        kind: SubscriptionKind,
    ) -> Result<u32> {
        let subscription = self.load(user_id, kind).await?;
        Ok(subscription.trial_days_remaining(Utc::now()))
    }

    /// Payments oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no subscription exists.
    #[instrument(skip(self))]
    pub async fn payment_history(
        &self,
        user_id: UserId,
        kind: SubscriptionKind,
    ) -> Result<Vec<Payment>> {
        Ok(self.load(user_id, kind).await?.payment_history)
    }

    /// Mark every lapsed subscription inactive. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the update fails.
    #[instrument(skip(self))]
    pub async fn expire_lapsed(&self, now: DateTime<Utc>) -> Result<u64> {
        let expired = self.repo.expire_lapsed(now).await?;
        info!(expired, "Subscription sweep complete");
        Ok(expired)
    }

    async fn load(&self, user_id: UserId, kind: SubscriptionKind) -> Result<Subscription> {
        self.repo
            .get(user_id, kind)
            .await?
            .ok_or_else(|| not_found(user_id, kind))
    }
}

fn not_found(user_id: UserId, kind: SubscriptionKind) -> AppError {
    AppError::NotFound(format!("No {kind} subscription found for user {user_id}"))
}

fn with_context(err: AppError, user_id: UserId, kind: SubscriptionKind) -> AppError {
    match err {
        AppError::Database(RepositoryError::NotFound) => not_found(user_id, kind),
        other => other,
    }
}

//! Subscription lifecycle state machine.
//!
//! One subscription exists per `(user, kind)`. The lifecycle is:
//!
//! ```text
//!            start_trial                renew
//!   (none) ─────────────▶ trial ─────────────────▶ active ◀─┐
//!                           │                        │  │    │ renew
//!                           │ sweep (end < now)      │  └────┘
//!                           ▼                        │ sweep (end < now)
//!                        inactive ◀──────────────────┘
//!                           │ renew
//!                           └──────────▶ active
//! ```
//!
//! The sweep is a single bulk update in the server's subscription repository,
//! so the stored `status` can be stale between runs.
//! [`Subscription::is_active_at`] is the authoritative real-time check.

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{PaymentStatus, SubscriptionKind, SubscriptionStatus, UserId};

/// Length of the free trial granted on first subscription.
pub const TRIAL_MONTHS: u32 = 3;

/// Billing period added by each successful renewal.
pub const RENEWAL_MONTHS: u32 = 1;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Errors raised by subscription transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    /// Renewal amount was zero or negative.
    #[error("renewal amount must be greater than zero (got {0})")]
    InvalidAmount(Decimal),
    /// Renewal transaction id was empty.
    #[error("transaction id cannot be empty")]
    EmptyTransactionId,
    /// Adding the billing period overflowed the calendar.
    #[error("billing date out of range")]
    DateOverflow,
}

/// A recorded subscription payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub transaction_id: String,
    pub status: PaymentStatus,
}

/// A user's subscription for one side of the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: SubscriptionKind,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_trial: bool,
    pub trial_end_date: DateTime<Utc>,
    pub auto_renew: bool,
    /// Oldest first.
    pub payment_history: Vec<Payment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Begin the three-month free trial.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::DateOverflow`] if `now` is at the end of
    /// the representable calendar.
    pub fn start_trial(
        user_id: UserId,
        kind: SubscriptionKind,
        now: DateTime<Utc>,
    ) -> Result<Self, SubscriptionError> {
        let end_date = now
            .checked_add_months(Months::new(TRIAL_MONTHS))
            .ok_or(SubscriptionError::DateOverflow)?;

        Ok(Self {
            user_id,
            kind,
            status: SubscriptionStatus::Trial,
            start_date: now,
            end_date,
            is_trial: true,
            trial_end_date: end_date,
            auto_renew: true,
            payment_history: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Real-time access check, independent of the sweep.
    ///
    /// True iff the stored status grants access and the period has not ended.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status.grants_access() && self.end_date > now
    }

    /// Whole days of trial left, rounded up. Zero once the trial is over.
    #[must_use]
    pub fn trial_days_remaining(&self, now: DateTime<Utc>) -> u32 {
        if !self.is_trial || now >= self.trial_end_date {
            return 0;
        }
        let millis = (self.trial_end_date - now).num_milliseconds();
        let days = (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    /// Record a successful payment and extend the subscription by one month
    /// from `now`.
    ///
    /// Works from any state; the subscription ends up `active` and no longer
    /// on trial. Returns a copy of the payment that was appended.
    ///
    /// # Errors
    ///
    /// Rejects non-positive amounts and blank transaction ids, and fails with
    /// [`SubscriptionError::DateOverflow`] if the new end date is unrepresentable.
    pub fn renew(
        &mut self,
        amount: Decimal,
        transaction_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Payment, SubscriptionError> {
        let transaction_id = validate_payment(amount, transaction_id)?;
        let end_date = now
            .checked_add_months(Months::new(RENEWAL_MONTHS))
            .ok_or(SubscriptionError::DateOverflow)?;

        self.status = SubscriptionStatus::Active;
        self.end_date = end_date;
        self.is_trial = false;
        self.updated_at = now;
        let payment = Payment {
            amount,
            date: now,
            transaction_id: transaction_id.to_owned(),
            status: PaymentStatus::Success,
        };
        self.payment_history.push(payment.clone());

        Ok(payment)
    }

    /// Turn off auto-renewal. Access continues until `end_date`.
    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.auto_renew = false;
        self.updated_at = now;
    }
}

/// Check renewal input before touching any state.
///
/// Returns the trimmed transaction id.
///
/// # Errors
///
/// Rejects non-positive amounts and blank transaction ids.
pub fn validate_payment(amount: Decimal, transaction_id: &str) -> Result<&str, SubscriptionError> {
    if amount <= Decimal::ZERO {
        return Err(SubscriptionError::InvalidAmount(amount));
    }
    let transaction_id = transaction_id.trim();
    if transaction_id.is_empty() {
        return Err(SubscriptionError::EmptyTransactionId);
    }
    Ok(transaction_id)
}

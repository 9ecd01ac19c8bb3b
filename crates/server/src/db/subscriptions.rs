//! Subscription repository for database operations.
//!
//! State transitions are computed by [`maani_core::subscription::Subscription`];
//! this module only loads, locks, and persists the result.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use maani_core::subscription::{Payment, Subscription};
use maani_core::{PaymentStatus, SubscriptionKind, SubscriptionStatus, UserId};

use super::RepositoryError;

const SUBSCRIPTION_COLUMNS: &str = r"
    id, user_id, kind, status, start_date, end_date, is_trial,
    trial_end_date, auto_renew, created_at, updated_at
";

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: i32,
    user_id: UserId,
    kind: SubscriptionKind,
    status: SubscriptionStatus,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    is_trial: bool,
    trial_end_date: DateTime<Utc>,
    auto_renew: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SubscriptionRow {
    fn into_subscription(self, payment_history: Vec<Payment>) -> Subscription {
        Subscription {
            user_id: self.user_id,
            kind: self.kind,
            status: self.status,
            start_date: self.start_date,
            end_date: self.end_date,
            is_trial: self.is_trial,
            trial_end_date: self.trial_end_date,
            auto_renew: self.auto_renew,
            payment_history,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    amount: Decimal,
    paid_at: DateTime<Utc>,
    transaction_id: String,
    status: PaymentStatus,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            amount: row.amount,
            date: row.paid_at,
            transaction_id: row.transaction_id,
            status: row.status,
        }
    }
}

/// Repository for subscription database operations.
pub struct SubscriptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriptionRepository<'a> {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the subscription for `(user_id, kind)` with its payment history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        kind: SubscriptionKind,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let Some(row) = fetch_row(&mut *conn, user_id, kind, false).await? else {
            return Ok(None);
        };
        let payments = fetch_payments(&mut *conn, row.id).await?;
        Ok(Some(row.into_subscription(payments)))
    }

    /// Insert a freshly started subscription.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `(user_id, kind)` already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, subscription: &Subscription) -> Result<Subscription, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO maani.subscription (
                user_id, kind, status, start_date, end_date, is_trial,
                trial_end_date, auto_renew, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "
        );

        let row: SubscriptionRow = sqlx::query_as(&sql)
            .bind(subscription.user_id)
            .bind(subscription.kind)
            .bind(subscription.status)
            .bind(subscription.start_date)
            .bind(subscription.end_date)
            .bind(subscription.is_trial)
            .bind(subscription.trial_end_date)
            .bind(subscription.auto_renew)
            .bind(subscription.created_at)
            .bind(subscription.updated_at)
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::from_insert(
                    e,
                    &format!(
                        "{} subscription already exists for user {}",
                        subscription.kind, subscription.user_id
                    ),
                )
            })?;

        Ok(row.into_subscription(Vec::new()))
    }

    /// Apply a transition to a locked subscription and persist it.
    ///
    /// Runs in one transaction: the row is locked, `apply` mutates the loaded
    /// subscription and may return a payment to append, then the new state
    /// and the payment are written together. Nothing is written if `apply`
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (converted into `E`) if the
    /// subscription does not exist, or whatever `apply` returns.
    pub async fn update_with<F, E>(
        &self,
        user_id: UserId,
        kind: SubscriptionKind,
        apply: F,
    ) -> Result<Subscription, E>
    where
        F: FnOnce(&mut Subscription) -> Result<Option<Payment>, E> + Send,
        E: From<RepositoryError>,
    {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let row = fetch_row(&mut *tx, user_id, kind, true)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let subscription_id = row.id;
        let payments = fetch_payments(&mut *tx, subscription_id).await?;
        let mut subscription = row.into_subscription(payments);

        let payment = apply(&mut subscription)?;

        sqlx::query(
            r"
            UPDATE maani.subscription
            SET status = $2, end_date = $3, is_trial = $4, auto_renew = $5, updated_at = $6
            WHERE id = $1
            ",
        )
        .bind(subscription_id)
        .bind(subscription.status)
        .bind(subscription.end_date)
        .bind(subscription.is_trial)
        .bind(subscription.auto_renew)
        .bind(subscription.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        if let Some(payment) = payment {
            sqlx::query(
                r"
                INSERT INTO maani.subscription_payment
                    (subscription_id, amount, paid_at, transaction_id, status)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(subscription_id)
            .bind(payment.amount)
            .bind(payment.date)
            .bind(&payment.transaction_id)
            .bind(payment.status)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;
        }

        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(subscription)
    }

    /// Move every lapsed `trial`/`active` subscription to `inactive`.
    ///
    /// Returns the number of rows changed; running it again with the same
    /// `now` changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn expire_lapsed(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE maani.subscription
            SET status = 'inactive', updated_at = $1
            WHERE status IN ('trial', 'active')
              AND end_date < $1
            ",
        )
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

async fn fetch_row(
    conn: &mut PgConnection,
    user_id: UserId,
    kind: SubscriptionKind,
    for_update: bool,
) -> Result<Option<SubscriptionRow>, RepositoryError> {
    let lock = if for_update { "FOR UPDATE" } else { "" };
    let sql = format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM maani.subscription WHERE user_id = $1 AND kind = $2 {lock}"
    );

    Ok(sqlx::query_as(&sql)
        .bind(user_id)
        .bind(kind)
        .fetch_optional(conn)
        .await?)
}

async fn fetch_payments(
    conn: &mut PgConnection,
    subscription_id: i32,
) -> Result<Vec<Payment>, RepositoryError> {
    let rows: Vec<PaymentRow> = sqlx::query_as(
        r"
        SELECT amount, paid_at, transaction_id, status
        FROM maani.subscription_payment
        WHERE subscription_id = $1
        ORDER BY paid_at, id
        ",
    )
    .bind(subscription_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(Payment::from).collect())
}

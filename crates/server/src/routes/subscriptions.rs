//! Subscription route handlers.
//!
//! Every route is keyed by `(user_id, type)`; a user holds at most one
//! seller and one buyer subscription.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use maani_core::subscription::{Payment, Subscription};
use maani_core::{SubscriptionKind, UserId};

use super::{ApiJson, ApiPath};
use crate::error::Result;
use crate::services::{SubscriptionService, SubscriptionStatusView};
use crate::state::AppState;

type SubscriptionPath = ApiPath<(UserId, SubscriptionKind)>;

/// Start the free trial.
///
/// # Errors
///
/// Returns a conflict if the subscription already exists.
pub async fn create(
    State(state): State<AppState>,
    ApiPath((user_id, kind)): SubscriptionPath,
) -> Result<(StatusCode, Json<Subscription>)> {
    let subscription = SubscriptionService::new(state.pool())
        .create(user_id, kind)
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// # Errors
///
/// Returns not found if the subscription does not exist.
pub async fn status(
    State(state): State<AppState>,
    ApiPath((user_id, kind)): SubscriptionPath,
) -> Result<Json<SubscriptionStatusView>> {
    let view = SubscriptionService::new(state.pool())
        .status(user_id, kind)
        .await?;
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveResponse {
    pub is_active: bool,
}

/// Access check. Users without a subscription are inactive, not missing.
///
/// # Errors
///
/// Returns a server error if the lookup fails.
pub async fn active(
    State(state): State<AppState>,
    ApiPath((user_id, kind)): SubscriptionPath,
) -> Result<Json<ActiveResponse>> {
    let is_active = SubscriptionService::new(state.pool())
        .is_active(user_id, kind)
        .await?;
    Ok(Json(ActiveResponse { is_active }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewRequest {
    pub amount: Decimal,
    pub transaction_id: String,
}

/// Record a payment and extend access by one month.
///
/// # Errors
///
/// Returns a validation error for a non-positive amount or blank
/// transaction id, not found if the subscription does not exist.
pub async fn renew(
    State(state): State<AppState>,
    ApiPath((user_id, kind)): SubscriptionPath,
    ApiJson(request): ApiJson<RenewRequest>,
) -> Result<Json<Subscription>> {
    let subscription = SubscriptionService::new(state.pool())
        .renew(user_id, kind, request.amount, &request.transaction_id)
        .await?;
    Ok(Json(subscription))
}

/// # Errors
///
/// Returns not found if the subscription does not exist.
pub async fn cancel(
    State(state): State<AppState>,
    ApiPath((user_id, kind)): SubscriptionPath,
) -> Result<Json<Subscription>> {
    let subscription = SubscriptionService::new(state.pool())
        .cancel(user_id, kind)
        .await?;
    Ok(Json(subscription))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialDaysResponse {
    pub trial_days_remaining: u32,
}

/// # Errors
///
/// Returns not found if the subscription does not exist.
pub async fn trial_days(
    State(state): State<AppState>,
    ApiPath((user_id, kind)): SubscriptionPath,
) -> Result<Json<TrialDaysResponse>> {
    let trial_days_remaining = SubscriptionService::new(state.pool())
        .trial_days_remaining(user_id, kind)
        .await?;
    Ok(Json(TrialDaysResponse {
        trial_days_remaining,
    }))
}

/// Payments oldest first.
///
/// # Errors
///
/// Returns not found if the subscription does not exist.
pub async fn history(
    State(state): State<AppState>,
    ApiPath((user_id, kind)): SubscriptionPath,
) -> Result<Json<Vec<Payment>>> {
    let payments = SubscriptionService::new(state.pool())
        .payment_history(user_id, kind)
        .await?;
    Ok(Json(payments))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{get, json as json_request, send};

    #[tokio::test]
    async fn test_unknown_kind_is_validation_error() {
        let (status, body) = send(get("/api/subscriptions/5/vip")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_renew_rejects_zero_amount() {
        let (status, body) = send(json_request(
            "POST",
            "/api/subscriptions/5/seller/renew",
            &json!({ "amount": "0", "transactionId": "pay_123" }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_renew_rejects_blank_transaction() {
        let (status, body) = send(json_request(
            "POST",
            "/api/subscriptions/5/buyer/renew",
            &json!({ "amount": "499.00", "transactionId": "   " }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_renew_requires_body() {
        let (status, body) = send(json_request(
            "POST",
            "/api/subscriptions/5/buyer/renew",
            &json!({ "amount": "499.00" }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                    - Liveness
//! GET  /health/ready                              - Readiness (DB ping)
//!
//! # Sellers
//! POST /api/sellers                               - Register seller
//! GET  /api/sellers/nearby                        - Sellers around a point, nearest first
//! GET  /api/sellers/search                        - Name/type search within a city
//! GET  /api/sellers/{id}                          - Seller detail
//! PUT  /api/sellers/{id}/status                   - Change lifecycle status
//! PUT  /api/sellers/{id}/verification             - Change verification status
//! POST /api/sellers/{id}/reviews                  - Add a 1-5 star review
//! GET  /api/sellers/{id}/delivery-quote           - Cost/time/emissions to a destination
//!
//! # Delivery
//! POST /api/delivery/route                        - Order stops, estimate the tour
//!
//! # Languages
//! GET  /api/languages                             - Supported UI languages
//!
//! # Subscriptions ({type} is seller|buyer)
//! POST /api/subscriptions/{user_id}/{type}             - Start trial
//! GET  /api/subscriptions/{user_id}/{type}             - Status with real-time access
//! GET  /api/subscriptions/{user_id}/{type}/active      - Access check only
//! POST /api/subscriptions/{user_id}/{type}/renew       - Record payment, extend a month
//! POST /api/subscriptions/{user_id}/{type}/cancel      - Turn off auto-renew
//! GET  /api/subscriptions/{user_id}/{type}/trial-days  - Trial days remaining
//! GET  /api/subscriptions/{user_id}/{type}/history     - Payment history
//! ```

pub mod delivery;
pub mod languages;
pub mod sellers;
pub mod subscriptions;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::state::AppState;

/// `Json` extractor whose rejection renders as the API error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor whose rejection renders as the API error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `Path` extractor whose rejection renders as the API error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Create the seller routes router.
pub fn seller_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(sellers::register))
        .route("/nearby", get(sellers::nearby))
        .route("/search", get(sellers::search))
        .route("/{id}", get(sellers::show))
        .route("/{id}/status", put(sellers::update_status))
        .route("/{id}/verification", put(sellers::update_verification))
        .route("/{id}/reviews", post(sellers::add_review))
        .route("/{id}/delivery-quote", get(sellers::delivery_quote))
}

/// Create the delivery routes router.
pub fn delivery_routes() -> Router<AppState> {
    Router::new().route("/route", post(delivery::plan))
}

/// Create the subscription routes router.
pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{user_id}/{kind}",
            post(subscriptions::create).get(subscriptions::status),
        )
        .route("/{user_id}/{kind}/active", get(subscriptions::active))
        .route("/{user_id}/{kind}/renew", post(subscriptions::renew))
        .route("/{user_id}/{kind}/cancel", post(subscriptions::cancel))
        .route("/{user_id}/{kind}/trial-days", get(subscriptions::trial_days))
        .route("/{user_id}/{kind}/history", get(subscriptions::history))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/sellers", seller_routes())
        .nest("/api/delivery", delivery_routes())
        .route("/api/languages", get(languages::list))
        .nest("/api/subscriptions", subscription_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{LocationConfig, MaaniConfig};

    /// Router over a lazy pool that never connects.
    ///
    /// Only requests rejected before reaching the database are meaningful.
    pub(crate) fn app() -> Router {
        let config = MaaniConfig {
            database_url: SecretString::from("postgres://localhost:1/maani_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            location: LocationConfig::default(),
            default_radius_km: 10.0,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/maani_test")
            .unwrap();
        let state = AppState::new(config, pool).unwrap();
        routes().with_state(state)
    }

    pub(crate) async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub(crate) fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    pub(crate) fn json(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}

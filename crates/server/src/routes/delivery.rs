//! Multi-stop delivery planning.

use axum::Json;
use serde::Deserialize;
use tracing::instrument;

use maani_core::GeoPoint;
use maani_core::geo::{RoutePlan, VehicleType, plan_route};

use super::ApiJson;
use crate::error::{AppError, Result};

/// Nearest-neighbour ordering is quadratic in the stop count.
const MAX_ROUTE_STOPS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub stops: Vec<GeoPoint>,
    #[serde(default)]
    pub vehicle: VehicleType,
}

/// Order the stops starting from the first and estimate the tour.
///
/// POST /api/delivery/route
///
/// # Errors
///
/// Returns a validation error for invalid coordinates or too many stops.
#[instrument(skip_all, fields(stops = request.stops.len(), vehicle = %request.vehicle))]
pub async fn plan(ApiJson(request): ApiJson<RouteRequest>) -> Result<Json<RoutePlan>> {
    if request.stops.len() > MAX_ROUTE_STOPS {
        return Err(AppError::Validation(format!(
            "a route can have at most {MAX_ROUTE_STOPS} stops (got {})",
            request.stops.len()
        )));
    }
    Ok(Json(plan_route(&request.stops, request.vehicle)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::routes::test_support::{json as json_request, send};

    #[tokio::test]
    async fn test_plan_orders_stops_from_first() {
        let (status, body) = send(json_request(
            "POST",
            "/api/delivery/route",
            &json!({
                "stops": [
                    { "latitude": 12.9716, "longitude": 77.5946 },
                    { "latitude": 13.0827, "longitude": 80.2707 },
                    { "latitude": 12.9352, "longitude": 77.6245 }
                ],
                "vehicle": "car"
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["vehicle"], "car");
        // Koramangala is visited before Chennai
        assert_eq!(body["stops"][1]["latitude"], 12.9352);
        assert_eq!(body["stops"][2]["latitude"], 13.0827);
        assert!(body["totalDistanceKm"].as_f64().unwrap() > 290.0);
    }

    #[tokio::test]
    async fn test_empty_plan() {
        let (status, body) =
            send(json_request("POST", "/api/delivery/route", &json!({ "stops": [] }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estimatedMinutes"], 0);
        assert_eq!(body["vehicle"], "motorcycle");
    }

    #[tokio::test]
    async fn test_rejects_invalid_stop() {
        let (status, body) = send(json_request(
            "POST",
            "/api/delivery/route",
            &json!({ "stops": [{ "latitude": 12.9, "longitude": 181.0 }] }),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_rejects_too_many_stops() {
        let stops: Vec<_> = (0..=MAX_ROUTE_STOPS)
            .map(|i| json!({ "latitude": 10.0, "longitude": i as f64 * 0.01 }))
            .collect();
        let (status, body) = send(json_request(
            "POST",
            "/api/delivery/route",
            &json!({ "stops": stops }),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

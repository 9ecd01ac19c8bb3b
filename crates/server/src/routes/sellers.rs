//! Seller route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use maani_core::geo::VehicleType;
use maani_core::seller::{NearbySeller, NearbySellerOptions, NewSeller, Seller};
use maani_core::{BusinessType, GeoPoint, SellerId, SellerStatus, VerificationStatus};

use super::{ApiJson, ApiPath, ApiQuery};
use crate::error::Result;
use crate::services::{DeliveryQuote, SellerService};
use crate::state::AppState;

fn service(state: &AppState) -> SellerService<'_> {
    SellerService::new(state.pool(), state.location())
}

/// Register a seller.
///
/// POST /api/sellers
///
/// # Errors
///
/// Returns a validation error for an invalid registration.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<NewSeller>,
) -> Result<(StatusCode, Json<Seller>)> {
    let seller = service(&state).register(registration).await?;
    Ok((StatusCode::CREATED, Json(seller)))
}

/// Query parameters for the nearby search.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: Option<f64>,
    pub business_type: Option<BusinessType>,
    #[serde(default)]
    pub verified_only: bool,
    pub limit: Option<usize>,
}

impl NearbyQuery {
    fn into_options(self, default_radius_km: f64) -> Result<NearbySellerOptions> {
        let center = GeoPoint::new(self.latitude, self.longitude)?;
        let mut options = NearbySellerOptions::new(center)
            .with_radius(self.radius.unwrap_or(default_radius_km))?;
        if let Some(limit) = self.limit {
            options = options.with_limit(limit);
        }
        options.business_type = self.business_type;
        options.verified_only = self.verified_only;
        Ok(options)
    }
}

/// Active sellers around a point, nearest first, each with its `distance` in km.
///
/// GET /api/sellers/nearby?latitude&longitude[&radius][&business_type][&verified_only][&limit]
///
/// # Errors
///
/// Returns a validation error for out-of-range coordinates or a bad radius.
pub async fn nearby(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NearbyQuery>,
) -> Result<Json<Vec<NearbySeller>>> {
    let options = query.into_options(state.config().default_radius_km)?;
    Ok(Json(service(&state).nearby(&options).await?))
}

/// Query parameters for the text search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub city: String,
}

/// Active sellers in `city` whose name or business type contains `query`.
///
/// GET /api/sellers/search?query&city
///
/// # Errors
///
/// Returns a validation error if either parameter is blank.
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<Seller>>> {
    let sellers = service(&state).search(&query.query, &query.city).await?;
    Ok(Json(sellers))
}

/// Seller detail.
///
/// GET /api/sellers/{id}
///
/// # Errors
///
/// Returns not found if the seller does not exist.
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<SellerId>,
) -> Result<Json<Seller>> {
    Ok(Json(service(&state).get(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate<S> {
    pub status: S,
}

/// PUT /api/sellers/{id}/status
///
/// # Errors
///
/// Returns not found if the seller does not exist.
pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<SellerId>,
    ApiJson(update): ApiJson<StatusUpdate<SellerStatus>>,
) -> Result<Json<Seller>> {
    let seller = service(&state).update_status(id, update.status).await?;
    Ok(Json(seller))
}

/// PUT /api/sellers/{id}/verification
///
/// # Errors
///
/// Returns not found if the seller does not exist.
pub async fn update_verification(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<SellerId>,
    ApiJson(update): ApiJson<StatusUpdate<VerificationStatus>>,
) -> Result<Json<Seller>> {
    let seller = service(&state)
        .update_verification(id, update.status)
        .await?;
    Ok(Json(seller))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: u8,
}

/// Add a review and return the seller with its updated rating.
///
/// POST /api/sellers/{id}/reviews
///
/// # Errors
///
/// Returns a validation error unless `rating` is 1 through 5.
pub async fn add_review(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<SellerId>,
    ApiJson(review): ApiJson<ReviewRequest>,
) -> Result<Json<Seller>> {
    let seller = service(&state).add_review(id, review.rating).await?;
    Ok(Json(seller))
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub vehicle: VehicleType,
}

/// GET /api/sellers/{id}/delivery-quote?latitude&longitude[&vehicle]
///
/// # Errors
///
/// Returns a validation error for bad coordinates, not found for an unknown seller.
pub async fn delivery_quote(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<SellerId>,
    ApiQuery(query): ApiQuery<QuoteQuery>,
) -> Result<Json<DeliveryQuote>> {
    let destination = GeoPoint::new(query.latitude, query.longitude)?;
    let quote = service(&state)
        .delivery_quote(id, destination, query.vehicle)
        .await?;
    Ok(Json(quote))
}

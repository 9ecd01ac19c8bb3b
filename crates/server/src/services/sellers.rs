//! Seller registration, lookup, nearby search, and delivery quotes.

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use maani_core::geo::{self, VehicleType};
use maani_core::seller::{
    NearbySeller, NearbySellerOptions, NewSeller, Seller, SellerSearch, Stars, rank_nearby,
};
use maani_core::{GeoPoint, SellerId, SellerStatus, VerificationStatus};

use super::location::{DeliveryConditions, LocationService};
use crate::db::{RepositoryError, SellerRepository};
use crate::error::{AppError, Result};

/// Cost, time, and emissions for delivering from a seller to a destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryQuote {
    pub seller_id: SellerId,
    pub destination: GeoPoint,
    pub distance_km: f64,
    /// Whether the destination is inside the seller's max delivery radius.
    pub deliverable: bool,
    pub estimated_minutes: u32,
    pub delivery_cost: u32,
    pub vehicle: VehicleType,
    pub carbon_footprint_kg: f64,
    pub conditions: DeliveryConditions,
}

impl DeliveryQuote {
    fn compute(
        seller: &Seller,
        destination: GeoPoint,
        vehicle: VehicleType,
        conditions: DeliveryConditions,
    ) -> Self {
        let distance_km = geo::distance(seller.location(), &destination);
        Self {
            seller_id: seller.id,
            destination,
            distance_km,
            deliverable: distance_km <= seller.delivery.max_delivery_radius_km,
            estimated_minutes: geo::delivery_time(distance_km),
            delivery_cost: geo::delivery_cost(
                distance_km,
                seller.delivery.free_delivery_radius_km,
                seller.delivery.base_delivery_cost,
            ),
            vehicle,
            carbon_footprint_kg: geo::carbon_footprint(distance_km, vehicle),
            conditions,
        }
    }
}

/// Service for seller operations.
pub struct SellerService<'a> {
    pool: &'a PgPool,
    location: &'a LocationService,
}

impl<'a> SellerService<'a> {
    /// Create a new seller service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, location: &'a LocationService) -> Self {
        Self { pool, location }
    }

    fn repo(&self) -> SellerRepository<'a> {
        SellerRepository::new(self.pool)
    }

    /// Validate and store a new seller.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for invalid input.
    #[instrument(skip_all, fields(user_id = %registration.user_id))]
    pub async fn register(&self, registration: NewSeller) -> Result<Seller> {
        let registration = registration.validate()?;
        let seller = self.repo().create(&registration).await?;

        info!(seller_id = %seller.id, "Seller registered");
        Ok(seller)
    }

    /// Get a seller by ID.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the seller does not exist.
    #[instrument(skip(self))]
    pub async fn get(&self, id: SellerId) -> Result<Seller> {
        self.repo()
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Active sellers matching `query` by name or business type within `city`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if either term is blank.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, city: &str) -> Result<Vec<Seller>> {
        let search = SellerSearch::new(query, city)?;
        Ok(self.repo().search(&search).await?)
    }

    /// Active sellers within the radius, nearest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    #[instrument(skip_all, fields(center = %options.center, radius_km = options.radius_km))]
    pub async fn nearby(&self, options: &NearbySellerOptions) -> Result<Vec<NearbySeller>> {
        let candidates = self.repo().nearby_candidates(options).await?;
        let candidate_count = candidates.len();
        let ranked = rank_nearby(candidates, options);

        info!(
            candidates = candidate_count,
            results = ranked.len(),
            "Nearby sellers ranked"
        );
        Ok(ranked)
    }

    /// Change a seller's lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the seller does not exist.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: SellerId, status: SellerStatus) -> Result<Seller> {
        let seller = self
            .repo()
            .update_status(id, status)
            .await
            .map_err(|e| with_context(e, id))?;

        info!(%status, "Seller status updated");
        Ok(seller)
    }

    /// Change a seller's verification status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the seller does not exist.
    #[instrument(skip(self))]
    pub async fn update_verification(
        &self,
        id: SellerId,
        status: VerificationStatus,
    ) -> Result<Seller> {
        let seller = self
            .repo()
            .update_verification(id, status)
            .await
            .map_err(|e| with_context(e, id))?;

        info!(%status, "Seller verification updated");
        Ok(seller)
    }

    /// Fold a 1-5 star review into the seller's running average.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an out-of-range rating and
    /// `AppError::NotFound` if the seller does not exist.
    #[instrument(skip(self))]
    pub async fn add_review(&self, id: SellerId, rating: u8) -> Result<Seller> {
        let stars = Stars::new(rating)?;
        let seller = self
            .repo()
            .add_review(id, stars)
            .await
            .map_err(|e| with_context(e, id))?;

        info!(
            average = seller.rating.average,
            count = seller.rating.count,
            "Review recorded"
        );
        Ok(seller)
    }

    /// Quote a delivery from a seller's location to `destination`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the seller does not exist. Upstream
    /// location failures never cause an error.
    #[instrument(skip(self, destination), fields(destination = %destination))]
    pub async fn delivery_quote(
        &self,
        id: SellerId,
        destination: GeoPoint,
        vehicle: VehicleType,
    ) -> Result<DeliveryQuote> {
        let seller = self.get(id).await?;
        let conditions = self.location.delivery_conditions(&destination).await;
        Ok(DeliveryQuote::compute(
            &seller,
            destination,
            vehicle,
            conditions,
        ))
    }
}

fn not_found(id: SellerId) -> AppError {
    AppError::NotFound(format!("Seller {id} not found"))
}

fn with_context(err: RepositoryError, id: SellerId) -> AppError {
    match err {
        RepositoryError::NotFound => not_found(id),
        other => other.into(),
    }
}

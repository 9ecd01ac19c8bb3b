//! Seller repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use maani_core::geo::BoundingBox;
use maani_core::language::Language;
use maani_core::seller::{
    Address, DeliveryPreferences, NearbySellerOptions, NewSeller, Rating, Seller, SellerSearch,
    Stars, VerificationDocument, WorkingHours,
};
use maani_core::{
    BusinessType, Email, GeoPoint, ProductId, SellerId, SellerStatus, UserId, VerificationStatus,
};

use super::RepositoryError;

const SELLER_COLUMNS: &str = r"
    id, user_id, business_name, business_type, contact_email, contact_phone,
    street, city, state, postal_code, country, latitude, longitude,
    languages, free_delivery_radius_km, base_delivery_cost, max_delivery_radius_km,
    working_hours, verification_documents, verification_status, status,
    product_ids, rating_average, rating_count, created_at, updated_at
";

#[derive(Debug, sqlx::FromRow)]
struct SellerRow {
    id: SellerId,
    user_id: UserId,
    business_name: String,
    business_type: BusinessType,
    contact_email: String,
    contact_phone: Option<String>,
    street: String,
    city: String,
    state: String,
    postal_code: String,
    country: String,
    latitude: f64,
    longitude: f64,
    languages: Vec<String>,
    free_delivery_radius_km: f64,
    base_delivery_cost: i64,
    max_delivery_radius_km: f64,
    working_hours: Json<Vec<WorkingHours>>,
    verification_documents: Json<Vec<VerificationDocument>>,
    verification_status: VerificationStatus,
    status: SellerStatus,
    product_ids: Vec<i32>,
    rating_average: f64,
    rating_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SellerRow> for Seller {
    type Error = RepositoryError;

    fn try_from(row: SellerRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |what: &str, detail: String| {
            RepositoryError::DataCorruption(format!("seller {id}: invalid {what}: {detail}"))
        };

        let contact_email =
            Email::parse(&row.contact_email).map_err(|e| corrupt("email", e.to_string()))?;
        let location = GeoPoint::new(row.latitude, row.longitude)
            .map_err(|e| corrupt("location", e.to_string()))?;
        let languages = row
            .languages
            .iter()
            .map(|code| code.parse::<Language>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| corrupt("language", e.to_string()))?;
        let base_delivery_cost = u32::try_from(row.base_delivery_cost)
            .map_err(|e| corrupt("base delivery cost", e.to_string()))?;
        let rating_count = u32::try_from(row.rating_count)
            .map_err(|e| corrupt("rating count", e.to_string()))?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            business_name: row.business_name,
            business_type: row.business_type,
            contact_email,
            contact_phone: row.contact_phone,
            address: Address {
                street: row.street,
                city: row.city,
                state: row.state,
                postal_code: row.postal_code,
                country: row.country,
                location,
            },
            languages,
            delivery: DeliveryPreferences {
                free_delivery_radius_km: row.free_delivery_radius_km,
                base_delivery_cost,
                max_delivery_radius_km: row.max_delivery_radius_km,
            },
            working_hours: row.working_hours.0,
            verification_documents: row.verification_documents.0,
            verification_status: row.verification_status,
            status: row.status,
            products: row.product_ids.into_iter().map(ProductId::new).collect(),
            rating: Rating {
                average: row.rating_average,
                count: rating_count,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for seller database operations.
pub struct SellerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SellerRepository<'a> {
    /// Create a new seller repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a validated registration.
    ///
    /// New sellers start `active`, verification `pending`, with an empty rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, seller: &NewSeller) -> Result<Seller, RepositoryError> {
        let languages: Vec<&str> = seller.languages.iter().map(|l| l.code()).collect();

        let sql = format!(
            r"
            INSERT INTO maani.seller (
                user_id, business_name, business_type, contact_email, contact_phone,
                street, city, state, postal_code, country, latitude, longitude,
                languages, free_delivery_radius_km, base_delivery_cost, max_delivery_radius_km,
                working_hours, verification_documents
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {SELLER_COLUMNS}
            "
        );

        let row: SellerRow = sqlx::query_as(&sql)
            .bind(seller.user_id)
            .bind(&seller.business_name)
            .bind(seller.business_type)
            .bind(seller.contact_email.as_str())
            .bind(seller.contact_phone.as_deref())
            .bind(&seller.address.street)
            .bind(&seller.address.city)
            .bind(&seller.address.state)
            .bind(&seller.address.postal_code)
            .bind(&seller.address.country)
            .bind(seller.address.location.latitude())
            .bind(seller.address.location.longitude())
            .bind(&languages)
            .bind(seller.delivery.free_delivery_radius_km)
            .bind(i64::from(seller.delivery.base_delivery_cost))
            .bind(seller.delivery.max_delivery_radius_km)
            .bind(Json(&seller.working_hours))
            .bind(Json(&seller.verification_documents))
            .fetch_one(self.pool)
            .await?;

        row.try_into()
    }

    /// Get a seller by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: SellerId) -> Result<Option<Seller>, RepositoryError> {
        let sql = format!("SELECT {SELLER_COLUMNS} FROM maani.seller WHERE id = $1");

        let row: Option<SellerRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Seller::try_from).transpose()
    }

    /// Active sellers matching a name/type query within a city.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, search: &SellerSearch) -> Result<Vec<Seller>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {SELLER_COLUMNS}
            FROM maani.seller
            WHERE status = 'active'
              AND strpos(lower(city), $2) > 0
              AND (strpos(lower(business_name), $1) > 0
                   OR strpos(business_type::text, $1) > 0)
            ORDER BY id
            "
        );

        let rows: Vec<SellerRow> = sqlx::query_as(&sql)
            .bind(search.query())
            .bind(search.city())
            .fetch_all(self.pool)
            .await?;

        let sellers = rows
            .into_iter()
            .map(Seller::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        // Postgres and Rust lowercase a few scripts differently
        Ok(sellers.into_iter().filter(|s| search.matches(s)).collect())
    }

    /// Active sellers inside the bounding box, with type/verification filters
    /// pushed down. The caller still has to apply the exact radius.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn nearby_candidates(
        &self,
        options: &NearbySellerOptions,
    ) -> Result<Vec<Seller>, RepositoryError> {
        let BoundingBox {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        } = options.bounding_box();

        let sql = format!(
            r"
            SELECT {SELLER_COLUMNS}
            FROM maani.seller
            WHERE status = 'active'
              AND latitude BETWEEN $1 AND $2
              AND longitude BETWEEN $3 AND $4
              AND ($5::maani.business_type IS NULL OR business_type = $5)
              AND (NOT $6 OR verification_status = 'verified')
            "
        );

        let rows: Vec<SellerRow> = sqlx::query_as(&sql)
            .bind(min_lat)
            .bind(max_lat)
            .bind(min_lon)
            .bind(max_lon)
            .bind(options.business_type)
            .bind(options.verified_only)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Seller::try_from).collect()
    }

    /// Set a seller's lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the seller does not exist.
    pub async fn update_status(
        &self,
        id: SellerId,
        status: SellerStatus,
    ) -> Result<Seller, RepositoryError> {
        let sql = format!(
            r"
            UPDATE maani.seller
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {SELLER_COLUMNS}
            "
        );

        let row: Option<SellerRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Set a seller's verification status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the seller does not exist.
    pub async fn update_verification(
        &self,
        id: SellerId,
        status: VerificationStatus,
    ) -> Result<Seller, RepositoryError> {
        let sql = format!(
            r"
            UPDATE maani.seller
            SET verification_status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {SELLER_COLUMNS}
            "
        );

        let row: Option<SellerRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Fold a review into the seller's rating.
    ///
    /// The row is locked while the new average is computed so concurrent
    /// reviews are never lost.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the seller does not exist.
    pub async fn add_review(&self, id: SellerId, stars: Stars) -> Result<Seller, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(f64, i32)> = sqlx::query_as(
            "SELECT rating_average, rating_count FROM maani.seller WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let (average, count) = current.ok_or(RepositoryError::NotFound)?;
        let count = u32::try_from(count).map_err(|e| {
            RepositoryError::DataCorruption(format!("seller {id}: invalid rating count: {e}"))
        })?;
        let rating = Rating { average, count }.add_review(stars);
        let new_count = i32::try_from(rating.count).unwrap_or(i32::MAX);

        let sql = format!(
            r"
            UPDATE maani.seller
            SET rating_average = $2, rating_count = $3, updated_at = now()
            WHERE id = $1
            RETURNING {SELLER_COLUMNS}
            "
        );

        let row: SellerRow = sqlx::query_as(&sql)
            .bind(id)
            .bind(rating.average)
            .bind(new_count)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        row.try_into()
    }
}

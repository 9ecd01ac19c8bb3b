//! Seller records, registration validation, ratings, and nearby ranking.

use std::collections::HashSet;

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::geo::{self, BoundingBox, DEFAULT_BASE_DELIVERY_COST, DEFAULT_SEARCH_RADIUS_KM};
use crate::language::{Language, default_languages};
use crate::types::{
    BusinessType, Email, GeoError, GeoPoint, ProductId, SellerId, SellerStatus, UserId,
    VerificationStatus,
};

/// Longest accepted business name.
pub const MAX_BUSINESS_NAME_LENGTH: usize = 200;

/// Default cap on nearby results.
pub const DEFAULT_NEARBY_LIMIT: usize = 50;

/// Hard cap on nearby results.
pub const MAX_NEARBY_LIMIT: usize = 200;

/// Errors raised while validating seller input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SellerError {
    #[error("business name cannot be empty")]
    EmptyBusinessName,
    #[error("business name must be at most {max} characters")]
    BusinessNameTooLong { max: usize },
    #[error("address {0} cannot be empty")]
    EmptyAddressField(&'static str),
    #[error("invalid delivery preferences: {0}")]
    InvalidDeliveryPreferences(String),
    #[error("working hours for {0} must open before they close")]
    InvalidWorkingHours(Weekday),
    #[error("working hours for {0} listed more than once")]
    DuplicateWorkingDay(Weekday),
    #[error("verification document {0} must have a kind and a URL")]
    InvalidDocument(usize),
    #[error("rating must be between 1 and 5 (got {0})")]
    InvalidRating(u8),
    #[error("search {0} cannot be empty")]
    EmptySearchField(&'static str),
    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Postal address with its geocoded location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub location: GeoPoint,
}

/// How far and at what price a seller delivers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryPreferences {
    pub free_delivery_radius_km: f64,
    pub base_delivery_cost: u32,
    pub max_delivery_radius_km: f64,
}

impl Default for DeliveryPreferences {
    fn default() -> Self {
        Self {
            free_delivery_radius_km: 5.0,
            base_delivery_cost: DEFAULT_BASE_DELIVERY_COST,
            max_delivery_radius_km: 15.0,
        }
    }
}

impl DeliveryPreferences {
    fn validate(&self) -> Result<(), SellerError> {
        geo::validate_distance("freeDeliveryRadiusKm", self.free_delivery_radius_km)?;
        geo::validate_distance("maxDeliveryRadiusKm", self.max_delivery_radius_km)?;
        if self.free_delivery_radius_km > self.max_delivery_radius_km {
            return Err(SellerError::InvalidDeliveryPreferences(
                "free delivery radius cannot exceed max delivery radius".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Opening hours for one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub day: Weekday,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

impl WorkingHours {
    /// Render as e.g. `"सोमवार 09:00-18:00"` in the given language.
    #[must_use]
    pub fn display_in(&self, language: Language) -> String {
        format!(
            "{} {}-{}",
            language.weekday_name(self.day),
            self.opens_at.format("%H:%M"),
            self.closes_at.format("%H:%M")
        )
    }
}

/// A document submitted for seller verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDocument {
    /// e.g. `gst_certificate`, `pan_card`, `shop_license`.
    pub kind: String,
    pub url: String,
}

/// A validated review score, 1 through 5 stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stars(u8);

impl Stars {
    /// # Errors
    ///
    /// Returns [`SellerError::InvalidRating`] unless `stars` is 1 through 5.
    pub fn new(stars: u8) -> Result<Self, SellerError> {
        if (1..=5).contains(&stars) {
            Ok(Self(stars))
        } else {
            Err(SellerError::InvalidRating(stars))
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Stars {
    type Error = SellerError;

    fn try_from(stars: u8) -> Result<Self, Self::Error> {
        Self::new(stars)
    }
}

impl From<Stars> for u8 {
    fn from(stars: Stars) -> Self {
        stars.0
    }
}

/// Aggregate customer rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rating {
    pub average: f64,
    pub count: u32,
}

impl Rating {
    /// Fold one more review into the running average.
    #[must_use]
    pub fn add_review(self, stars: Stars) -> Self {
        let count = self.count.saturating_add(1);
        let total = self
            .average
            .mul_add(f64::from(self.count), f64::from(stars.get()));
        Self {
            average: total / f64::from(count),
            count,
        }
    }
}

/// A registered seller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: SellerId,
    pub user_id: UserId,
    pub business_name: String,
    pub business_type: BusinessType,
    pub contact_email: Email,
    pub contact_phone: Option<String>,
    pub address: Address,
    pub languages: Vec<Language>,
    pub delivery: DeliveryPreferences,
    pub working_hours: Vec<WorkingHours>,
    pub verification_documents: Vec<VerificationDocument>,
    pub verification_status: VerificationStatus,
    pub status: SellerStatus,
    pub products: Vec<ProductId>,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Seller {
    /// The seller's storefront location.
    #[must_use]
    pub const fn location(&self) -> &GeoPoint {
        &self.address.location
    }
}

/// Seller registration payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSeller {
    pub user_id: UserId,
    pub business_name: String,
    #[serde(default)]
    pub business_type: BusinessType,
    pub contact_email: Email,
    #[serde(default)]
    pub contact_phone: Option<String>,
    pub address: Address,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub delivery: DeliveryPreferences,
    #[serde(default)]
    pub working_hours: Vec<WorkingHours>,
    #[serde(default)]
    pub verification_documents: Vec<VerificationDocument>,
}

impl NewSeller {
    /// Validate and normalize a registration.
    ///
    /// Trims text fields, drops a blank phone number, and fills in the
    /// regional default languages when none were given.
    ///
    /// # Errors
    ///
    /// Returns the first [`SellerError`] found.
    pub fn validate(mut self) -> Result<Self, SellerError> {
        self.business_name = self.business_name.trim().to_owned();
        if self.business_name.is_empty() {
            return Err(SellerError::EmptyBusinessName);
        }
        if self.business_name.chars().count() > MAX_BUSINESS_NAME_LENGTH {
            return Err(SellerError::BusinessNameTooLong {
                max: MAX_BUSINESS_NAME_LENGTH,
            });
        }

        let address = &mut self.address;
        for (field, value) in [
            ("street", &mut address.street),
            ("city", &mut address.city),
            ("state", &mut address.state),
            ("postal code", &mut address.postal_code),
            ("country", &mut address.country),
        ] {
            *value = value.trim().to_owned();
            if value.is_empty() {
                return Err(SellerError::EmptyAddressField(field));
            }
        }

        self.contact_phone = self
            .contact_phone
            .map(|phone| phone.trim().to_owned())
            .filter(|phone| !phone.is_empty());

        self.delivery.validate()?;

        let mut seen = Vec::with_capacity(self.working_hours.len());
        for hours in &self.working_hours {
            if hours.opens_at >= hours.closes_at {
                return Err(SellerError::InvalidWorkingHours(hours.day));
            }
            if seen.contains(&hours.day) {
                return Err(SellerError::DuplicateWorkingDay(hours.day));
            }
            seen.push(hours.day);
        }

        for (idx, document) in self.verification_documents.iter().enumerate() {
            if document.kind.trim().is_empty() || document.url.trim().is_empty() {
                return Err(SellerError::InvalidDocument(idx));
            }
        }

        if self.languages.is_empty() {
            self.languages = default_languages(&self.address.state, &self.address.country);
        } else {
            let mut seen = HashSet::new();
            self.languages.retain(|language| seen.insert(*language));
        }

        Ok(self)
    }
}

/// Free-text seller search: `query` against name/type, `city` against address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerSearch {
    query: String,
    city: String,
}

impl SellerSearch {
    /// Build a search; both terms are required.
    ///
    /// # Errors
    ///
    /// Returns [`SellerError::EmptySearchField`] for a blank term.
    pub fn new(query: &str, city: &str) -> Result<Self, SellerError> {
        let query = query.trim();
        let city = city.trim();
        if query.is_empty() {
            return Err(SellerError::EmptySearchField("query"));
        }
        if city.is_empty() {
            return Err(SellerError::EmptySearchField("city"));
        }
        Ok(Self {
            query: query.to_lowercase(),
            city: city.to_lowercase(),
        })
    }

    /// Lowercased query term.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Lowercased city term.
    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Case-insensitive partial match against an active seller.
    #[must_use]
    pub fn matches(&self, seller: &Seller) -> bool {
        seller.status == SellerStatus::Active
            && seller.address.city.to_lowercase().contains(&self.city)
            && (seller.business_name.to_lowercase().contains(&self.query)
                || seller.business_type.as_str().contains(&self.query))
    }
}

/// Options for a nearby-seller query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbySellerOptions {
    pub center: GeoPoint,
    pub radius_km: f64,
    pub business_type: Option<BusinessType>,
    pub verified_only: bool,
    pub limit: usize,
}

impl NearbySellerOptions {
    /// Defaults: 10 km radius, any business type, unverified included, 50 results.
    #[must_use]
    pub const fn new(center: GeoPoint) -> Self {
        Self {
            center,
            radius_km: DEFAULT_SEARCH_RADIUS_KM,
            business_type: None,
            verified_only: false,
            limit: DEFAULT_NEARBY_LIMIT,
        }
    }

    /// Set the search radius.
    ///
    /// # Errors
    ///
    /// Rejects negative or non-finite radii.
    pub fn with_radius(mut self, radius_km: f64) -> Result<Self, GeoError> {
        self.radius_km = geo::validate_distance("radius", radius_km)?;
        Ok(self)
    }

    /// Set the result cap, clamped to 1..=200.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_NEARBY_LIMIT);
        self
    }

    /// Rectangle used to prefilter candidates in storage.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        geo::bounding_box(&self.center, self.radius_km)
    }

    /// Whether a seller passes the non-distance filters.
    #[must_use]
    pub fn accepts(&self, seller: &Seller) -> bool {
        seller.status == SellerStatus::Active
            && self
                .business_type
                .is_none_or(|business_type| business_type == seller.business_type)
            && (!self.verified_only || seller.verification_status == VerificationStatus::Verified)
    }
}

/// A seller annotated with its exact distance from the search center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbySeller {
    #[serde(flatten)]
    pub seller: Seller,
    /// Kilometres from the search center.
    pub distance: f64,
}

/// Turn storage candidates into the final nearby result.
///
/// Candidates only need to be an over-approximation (e.g. a bounding-box
/// match): each one is re-checked against the filters and the box, measured
/// exactly, dropped if outside the radius, then sorted nearest first (ties by
/// id) and truncated to the limit.
#[must_use]
pub fn rank_nearby(candidates: Vec<Seller>, options: &NearbySellerOptions) -> Vec<NearbySeller> {
    let bbox = options.bounding_box();
    let mut ranked: Vec<NearbySeller> = candidates
        .into_iter()
        .filter(|seller| options.accepts(seller) && bbox.contains(seller.location()))
        .map(|seller| {
            let distance = geo::distance(&options.center, seller.location());
            NearbySeller { seller, distance }
        })
        .filter(|nearby| nearby.distance <= options.radius_km)
        .collect();

    ranked.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.seller.id.cmp(&b.seller.id))
    });
    ranked.truncate(options.limit);
    ranked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use chrono::TimeZone;

    use super::*;

    pub(crate) fn seller_at(id: i32, lat: f64, lon: f64) -> Seller {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Seller {
            id: SellerId::new(id),
            user_id: UserId::new(id * 10),
            business_name: format!("Kirana Store {id}"),
            business_type: BusinessType::Retail,
            contact_email: Email::parse("owner@kirana.in").unwrap(),
            contact_phone: None,
            address: Address {
                street: "1 MG Road".to_owned(),
                city: "Bengaluru".to_owned(),
                state: "Karnataka".to_owned(),
                postal_code: "560001".to_owned(),
                country: "India".to_owned(),
                location: GeoPoint::new(lat, lon).unwrap(),
            },
            languages: vec![Language::Kn, Language::En],
            delivery: DeliveryPreferences::default(),
            working_hours: Vec::new(),
            verification_documents: Vec::new(),
            verification_status: VerificationStatus::Pending,
            status: SellerStatus::Active,
            products: Vec::new(),
            rating: Rating::default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn registration() -> NewSeller {
        serde_json::from_value(serde_json::json!({
            "userId": 3,
            "businessName": "  Anand Sweets  ",
            "businessType": "food",
            "contactEmail": "hello@anandsweets.in",
            "contactPhone": "   ",
            "address": {
                "street": "12 Brigade Road",
                "city": "Bengaluru",
                "state": "Karnataka",
                "postalCode": "560025",
                "country": "India",
                "location": { "latitude": 12.9716, "longitude": 77.5946 }
            },
            "workingHours": [
                { "day": "Mon", "opensAt": "09:00:00", "closesAt": "21:00:00" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_normalizes_registration() {
        let seller = registration().validate().unwrap();
        assert_eq!(seller.business_name, "Anand Sweets");
        assert_eq!(seller.contact_phone, None);
        assert_eq!(seller.languages, vec![Language::Kn, Language::En]);
        assert_eq!(seller.delivery, DeliveryPreferences::default());
        assert_eq!(seller.business_type, BusinessType::Food);
    }

    #[test]
    fn test_validate_drops_repeated_languages_keeping_order() {
        let mut seller = registration();
        seller.languages = vec![Language::Hi, Language::En, Language::Hi, Language::En];
        let seller = seller.validate().unwrap();
        assert_eq!(seller.languages, vec![Language::Hi, Language::En]);
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let mut blank = registration();
        blank.business_name = "   ".to_owned();
        assert_eq!(blank.validate(), Err(SellerError::EmptyBusinessName));

        let mut no_city = registration();
        no_city.address.city = String::new();
        assert_eq!(
            no_city.validate(),
            Err(SellerError::EmptyAddressField("city"))
        );

        let mut backwards = registration();
        backwards.working_hours = vec![WorkingHours {
            day: Weekday::Tue,
            opens_at: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            closes_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        }];
        assert_eq!(
            backwards.validate(),
            Err(SellerError::InvalidWorkingHours(Weekday::Tue))
        );

        let mut duplicate = registration();
        let monday = *duplicate.working_hours.first().unwrap();
        duplicate.working_hours.push(monday);
        assert_eq!(
            duplicate.validate(),
            Err(SellerError::DuplicateWorkingDay(Weekday::Mon))
        );

        let mut delivery = registration();
        delivery.delivery.free_delivery_radius_km = 20.0;
        assert!(matches!(
            delivery.validate(),
            Err(SellerError::InvalidDeliveryPreferences(_))
        ));

        let mut document = registration();
        document.verification_documents = vec![VerificationDocument {
            kind: "gst_certificate".to_owned(),
            url: " ".to_owned(),
        }];
        assert_eq!(document.validate(), Err(SellerError::InvalidDocument(0)));
    }

    #[test]
    fn test_registration_rejects_invalid_coordinates() {
        let result: Result<NewSeller, _> = serde_json::from_value(serde_json::json!({
            "userId": 3,
            "businessName": "Anand Sweets",
            "contactEmail": "hello@anandsweets.in",
            "address": {
                "street": "x", "city": "x", "state": "x", "postalCode": "x", "country": "x",
                "location": { "latitude": 95.0, "longitude": 77.0 }
            }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_rating_running_average() {
        let stars = |n| Stars::new(n).unwrap();
        let rating = Rating::default()
            .add_review(stars(5))
            .add_review(stars(4))
            .add_review(stars(3));
        assert_eq!(rating.count, 3);
        assert!((rating.average - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_stars_bounds() {
        assert_eq!(Stars::new(0), Err(SellerError::InvalidRating(0)));
        assert_eq!(Stars::new(6), Err(SellerError::InvalidRating(6)));
        assert_eq!(Stars::new(1).unwrap().get(), 1);
        assert!(serde_json::from_str::<Stars>("9").is_err());
        assert_eq!(serde_json::from_str::<Stars>("5").unwrap().get(), 5);
    }

    #[test]
    fn test_working_hours_display() {
        let hours = WorkingHours {
            day: Weekday::Mon,
            opens_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            closes_at: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
        };
        assert_eq!(hours.display_in(Language::En), "Monday 09:00-18:30");
        assert_eq!(hours.display_in(Language::Hi), "सोमवार 09:00-18:30");
    }

    #[test]
    fn test_search_matches_case_insensitively() {
        let search = SellerSearch::new("KIRANA", " bengaluru ").unwrap();
        let seller = seller_at(1, 12.97, 77.59);
        assert!(search.matches(&seller));

        let by_type = SellerSearch::new("retail", "Bengaluru").unwrap();
        assert!(by_type.matches(&seller));

        let other_city = SellerSearch::new("kirana", "Mysuru").unwrap();
        assert!(!other_city.matches(&seller));

        let mut suspended = seller;
        suspended.status = SellerStatus::Suspended;
        assert!(!search.matches(&suspended));

        assert_eq!(
            SellerSearch::new(" ", "Pune"),
            Err(SellerError::EmptySearchField("query"))
        );
        assert_eq!(
            SellerSearch::new("tea", ""),
            Err(SellerError::EmptySearchField("city"))
        );
    }

    #[test]
    fn test_rank_nearby_filters_and_orders() {
        let center = GeoPoint::new(12.9716, 77.5946).unwrap();
        let options = NearbySellerOptions::new(center).with_radius(5.0).unwrap();

        let near = seller_at(3, 12.98, 77.60);
        let nearer = seller_at(2, 12.972, 77.595);
        // Inside the bounding box corner but outside the circle
        let bbox = options.bounding_box();
        let corner = seller_at(4, bbox.max_lat - 0.001, bbox.max_lon - 0.001);
        let far = seller_at(5, 13.10, 77.59);
        let mut inactive = seller_at(1, 12.9716, 77.5946);
        inactive.status = SellerStatus::Inactive;

        let ranked = rank_nearby(vec![near, far, corner, inactive, nearer], &options);
        let ids: Vec<i32> = ranked.iter().map(|n| n.seller.id.as_i32()).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(ranked.windows(2).all(|w| match w {
            [a, b] => a.distance <= b.distance,
            _ => true,
        }));
        for nearby in &ranked {
            let exact = geo::distance(&center, nearby.seller.location());
            assert!((nearby.distance - exact).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rank_nearby_ties_by_id_and_limit() {
        let center = GeoPoint::new(19.0, 72.8).unwrap();
        let options = NearbySellerOptions::new(center).with_limit(2);
        let ranked = rank_nearby(
            vec![
                seller_at(9, 19.0, 72.8),
                seller_at(4, 19.0, 72.8),
                seller_at(6, 19.0, 72.8),
            ],
            &options,
        );
        let ids: Vec<i32> = ranked.iter().map(|n| n.seller.id.as_i32()).collect();
        assert_eq!(ids, vec![4, 6]);
    }

    #[test]
    fn test_nearby_options_filters() {
        let center = GeoPoint::new(19.0, 72.8).unwrap();
        let mut options = NearbySellerOptions::new(center);
        assert!((options.radius_km - 10.0).abs() < f64::EPSILON);
        assert!(options.with_radius(-1.0).is_err());
        assert_eq!(options.with_limit(0).limit, 1);
        assert_eq!(options.with_limit(10_000).limit, MAX_NEARBY_LIMIT);

        let seller = seller_at(1, 19.0, 72.8);
        options.verified_only = true;
        assert!(!options.accepts(&seller));
        options.verified_only = false;
        options.business_type = Some(BusinessType::Food);
        assert!(!options.accepts(&seller));
        options.business_type = Some(BusinessType::Retail);
        assert!(options.accepts(&seller));
    }

    #[test]
    fn test_nearby_seller_serializes_flat_with_distance() {
        let nearby = NearbySeller {
            seller: seller_at(1, 19.0, 72.8),
            distance: 1.5,
        };
        let json = serde_json::to_value(&nearby).unwrap();
        assert_eq!(json["businessName"], "Kirana Store 1");
        assert_eq!(json["distance"], 1.5);
    }
}

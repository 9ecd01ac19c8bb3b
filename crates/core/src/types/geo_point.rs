//! Validated latitude/longitude pair.

use serde::{Deserialize, Serialize};

/// Errors produced when validating coordinates or geo inputs.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeoError {
    /// Latitude outside [-90, 90] or not a finite number.
    #[error("latitude must be between -90 and 90 (got {0})")]
    InvalidLatitude(f64),
    /// Longitude outside [-180, 180] or not a finite number.
    #[error("longitude must be between -180 and 180 (got {0})")]
    InvalidLongitude(f64),
    /// A distance or radius was negative or not finite.
    #[error("{field} must be a non-negative number (got {value})")]
    InvalidDistance {
        /// Name of the offending input.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// A point on the Earth's surface in decimal degrees.
///
/// Construction always validates the range, including when deserializing,
/// so every `GeoPoint` in the system is known to be in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl GeoPoint {
    /// Create a point, rejecting out-of-range or non-finite coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidLatitude`] or [`GeoError::InvalidLongitude`].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

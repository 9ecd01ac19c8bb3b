//! Geo-distance and delivery routing utilities.
//!
//! Everything here is a pure function over validated [`GeoPoint`]s. Distances
//! are great-circle kilometres on a spherical Earth (Haversine), which is
//! accurate to well under one percent at city scale.
//!
//! ```
//! use maani_core::GeoPoint;
//! use maani_core::geo::{delivery_cost, delivery_time, distance};
//!
//! let mumbai = GeoPoint::new(19.0760, 72.8777).unwrap();
//! let pune = GeoPoint::new(18.5204, 73.8567).unwrap();
//!
//! let km = distance(&mumbai, &pune);
//! assert!((115.0..125.0).contains(&km));
//! assert_eq!(delivery_time(10.0), 50);
//! assert_eq!(delivery_cost(10.0, 5.0, 50), 75);
//! ```

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::types::{GeoError, GeoPoint, ParseStatusError};

/// Mean Earth radius used by every distance calculation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default search radius for nearby-seller queries.
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 10.0;

/// Default flat fee charged once a delivery leaves the free radius.
pub const DEFAULT_BASE_DELIVERY_COST: u32 = 50;

/// Fixed handling time included in every delivery estimate.
const BASE_DELIVERY_MINUTES: f64 = 30.0;

/// Travel time per kilometre in the delivery estimate.
const MINUTES_PER_KM: f64 = 2.0;

/// Charge per kilometre beyond the free radius.
const COST_PER_KM: f64 = 5.0;

/// Great-circle distance between two points in kilometres.
#[must_use]
pub fn distance(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1 = from.latitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let delta_lat = (to.latitude() - from.latitude()).to_radians();
    let delta_lon = (to.longitude() - from.longitude()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Whether `point` lies within `radius_km` of `center` (inclusive).
#[must_use]
pub fn is_within_radius(point: &GeoPoint, center: &GeoPoint, radius_km: f64) -> bool {
    distance(point, center) <= radius_km
}

/// Validate a caller-supplied distance or radius.
///
/// # Errors
///
/// Returns [`GeoError::InvalidDistance`] if `value` is negative, NaN or infinite.
pub fn validate_distance(field: &'static str, value: f64) -> Result<f64, GeoError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(GeoError::InvalidDistance { field, value })
    }
}

/// Latitude/longitude rectangle enclosing a search circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Whether the point falls inside the rectangle (edges included).
    #[must_use]
    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude())
            && (self.min_lon..=self.max_lon).contains(&point.longitude())
    }
}

/// Approximate rectangle containing every point within `radius_km` of `center`.
///
/// Uses the angular radius on the sphere. If the circle reaches a pole the
/// latitude is clamped to [-90, 90] and the longitude spans the full range;
/// if the longitude span crosses the antimeridian it is also widened to the
/// full range. Negative or non-finite radii are treated as zero.
#[must_use]
pub fn bounding_box(center: &GeoPoint, radius_km: f64) -> BoundingBox {
    let angular = radius_km.max(0.0) / EARTH_RADIUS_KM;
    let lat = center.latitude().to_radians();
    let lon = center.longitude().to_radians();

    let min_lat = lat - angular;
    let max_lat = lat + angular;

    if min_lat > -FRAC_PI_2 && max_lat < FRAC_PI_2 {
        let delta_lon = (angular.sin() / lat.cos()).asin();
        let min_lon = lon - delta_lon;
        let max_lon = lon + delta_lon;

        if min_lon < -PI || max_lon > PI {
            return BoundingBox {
                min_lat: min_lat.to_degrees(),
                max_lat: max_lat.to_degrees(),
                min_lon: -180.0,
                max_lon: 180.0,
            };
        }

        BoundingBox {
            min_lat: min_lat.to_degrees(),
            max_lat: max_lat.to_degrees(),
            min_lon: min_lon.to_degrees(),
            max_lon: max_lon.to_degrees(),
        }
    } else {
        BoundingBox {
            min_lat: min_lat.to_degrees().max(-90.0),
            max_lat: max_lat.to_degrees().min(90.0),
            min_lon: -180.0,
            max_lon: 180.0,
        }
    }
}

/// Estimated delivery time in whole minutes: `30 + 2 * km`, rounded.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // non-negative, far below u32::MAX for Earth distances
pub fn delivery_time(distance_km: f64) -> u32 {
    MINUTES_PER_KM
        .mul_add(distance_km.max(0.0), BASE_DELIVERY_MINUTES)
        .round() as u32
}

/// Delivery charge in whole currency units.
///
/// Free inside `free_radius_km`; beyond it, `base_cost + 5` per extra
/// kilometre, rounded to the nearest unit. Never negative.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped non-negative before the cast
pub fn delivery_cost(distance_km: f64, free_radius_km: f64, base_cost: u32) -> u32 {
    if distance_km <= free_radius_km {
        return 0;
    }
    let extra_km = (distance_km - free_radius_km).max(0.0);
    COST_PER_KM
        .mul_add(extra_km, f64::from(base_cost))
        .round()
        .max(0.0) as u32
}

/// Vehicle used for a delivery, determining its emission factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Bicycle,
    #[default]
    Motorcycle,
    Car,
    Truck,
}

impl VehicleType {
    /// Kilograms of CO2 emitted per kilometre.
    #[must_use]
    pub const fn emission_factor(self) -> f64 {
        match self {
            Self::Bicycle => 0.0,
            Self::Motorcycle => 0.12,
            Self::Car => 0.2,
            Self::Truck => 0.3,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bicycle => "bicycle",
            Self::Motorcycle => "motorcycle",
            Self::Car => "car",
            Self::Truck => "truck",
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VehicleType {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bicycle" => Ok(Self::Bicycle),
            "motorcycle" => Ok(Self::Motorcycle),
            "car" => Ok(Self::Car),
            "truck" => Ok(Self::Truck),
            _ => Err(ParseStatusError {
                kind: "vehicle type",
                value: s.to_owned(),
            }),
        }
    }
}

/// Kilograms of CO2 for driving `distance_km` with `vehicle`.
#[must_use]
pub fn carbon_footprint(distance_km: f64, vehicle: VehicleType) -> f64 {
    distance_km * vehicle.emission_factor()
}

/// Order stops with the nearest-neighbour heuristic.
///
/// Starts at the first stop and repeatedly moves to the closest unvisited one.
/// Ties go to the stop that appears first in the input. Inputs with at most
/// two stops are returned unchanged. This is an approximation, not an optimal
/// tour.
#[must_use]
pub fn optimal_route(points: &[GeoPoint]) -> Vec<GeoPoint> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let Some((first, rest)) = points.split_first() else {
        return Vec::new();
    };

    let mut route = Vec::with_capacity(points.len());
    let mut unvisited = rest.to_vec();
    let mut current = *first;
    route.push(current);

    while !unvisited.is_empty() {
        let mut nearest = 0;
        let mut nearest_km = f64::INFINITY;
        for (idx, candidate) in unvisited.iter().enumerate() {
            let km = distance(&current, candidate);
            if km < nearest_km {
                nearest_km = km;
                nearest = idx;
            }
        }
        current = unvisited.remove(nearest);
        route.push(current);
    }

    route
}

/// Total length of a route, summing consecutive legs.
#[must_use]
pub fn route_distance(route: &[GeoPoint]) -> f64 {
    route
        .windows(2)
        .map(|leg| match leg {
            [from, to] => distance(from, to),
            _ => 0.0,
        })
        .sum()
}

/// An ordered multi-stop delivery with its aggregate estimates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    pub stops: Vec<GeoPoint>,
    pub total_distance_km: f64,
    pub estimated_minutes: u32,
    pub vehicle: VehicleType,
    pub carbon_footprint_kg: f64,
}

/// Order `stops` and compute distance, time and emissions for the tour.
///
/// An empty input produces an empty plan with zero estimates.
#[must_use]
pub fn plan_route(stops: &[GeoPoint], vehicle: VehicleType) -> RoutePlan {
    let ordered = optimal_route(stops);
    let total = route_distance(&ordered);
    let estimated_minutes = if ordered.is_empty() {
        0
    } else {
        delivery_time(total)
    };

    RoutePlan {
        stops: ordered,
        total_distance_km: total,
        estimated_minutes,
        vehicle,
        carbon_footprint_kg: carbon_footprint(total, vehicle),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_distance_new_york_london() {
        let new_york = pt(40.7128, -74.0060);
        let london = pt(51.5074, -0.1278);
        let km = distance(&new_york, &london);
        assert!((km - 5570.0).abs() < 50.0, "got {km}");
    }

    #[test]
    fn test_distance_symmetric_and_zero() {
        let points = [
            pt(28.6139, 77.2090),
            pt(-33.8688, 151.2093),
            pt(89.9, 179.9),
            pt(-89.9, -179.9),
            pt(0.0, 0.0),
        ];
        for a in &points {
            assert!(distance(a, a).abs() < 1e-9);
            for b in &points {
                assert!((distance(a, b) - distance(b, a)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_is_within_radius_inclusive() {
        let center = pt(12.9716, 77.5946);
        let near = pt(12.98, 77.60);
        let km = distance(&near, &center);
        assert!(is_within_radius(&near, &center, km));
        assert!(!is_within_radius(&near, &center, km - 0.001));
    }

    #[test]
    fn test_bounding_box_contains_circle() {
        let center = pt(19.0760, 72.8777);
        let bbox = bounding_box(&center, 10.0);
        assert!(bbox.contains(&center));
        // ~9 km north and east are inside; ~20 km north is not
        assert!(bbox.contains(&pt(19.157, 72.8777)));
        assert!(bbox.contains(&pt(19.0760, 72.963)));
        assert!(!bbox.contains(&pt(19.256, 72.8777)));
        assert!(bbox.min_lon > -180.0 && bbox.max_lon < 180.0);
    }

    #[test]
    fn test_bounding_box_clamps_at_pole() {
        let bbox = bounding_box(&pt(89.95, 10.0), 50.0);
        assert!((bbox.max_lat - 90.0).abs() < f64::EPSILON);
        assert!((bbox.min_lon + 180.0).abs() < f64::EPSILON);
        assert!((bbox.max_lon - 180.0).abs() < f64::EPSILON);

        let south = bounding_box(&pt(-89.99, 0.0), 10.0);
        assert!((south.min_lat + 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounding_box_widens_across_antimeridian() {
        let bbox = bounding_box(&pt(0.0, 179.99), 20.0);
        assert!((bbox.min_lon + 180.0).abs() < f64::EPSILON);
        assert!((bbox.max_lon - 180.0).abs() < f64::EPSILON);
        assert!(bbox.max_lat < 90.0);
    }

    #[test]
    fn test_delivery_time() {
        assert_eq!(delivery_time(0.0), 30);
        assert_eq!(delivery_time(10.0), 50);
        assert_eq!(delivery_time(2.3), 35);
    }

    #[test]
    fn test_delivery_cost() {
        assert_eq!(delivery_cost(3.0, 5.0, DEFAULT_BASE_DELIVERY_COST), 0);
        assert_eq!(delivery_cost(5.0, 5.0, DEFAULT_BASE_DELIVERY_COST), 0);
        assert_eq!(delivery_cost(10.0, 5.0, DEFAULT_BASE_DELIVERY_COST), 75);
        assert_eq!(delivery_cost(5.5, 5.0, 0), 3);
    }

    #[test]
    fn test_delivery_cost_never_negative() {
        assert_eq!(delivery_cost(1.0, -3.0, 0), 20);
        assert_eq!(delivery_cost(-1.0, 0.0, 10), 0);
    }

    #[test]
    fn test_carbon_footprint() {
        assert!((carbon_footprint(100.0, VehicleType::Car) - 20.0).abs() < 1e-9);
        assert!((carbon_footprint(100.0, VehicleType::Truck) - 30.0).abs() < 1e-9);
        assert!(carbon_footprint(100.0, VehicleType::Bicycle).abs() < f64::EPSILON);
        assert!((carbon_footprint(50.0, VehicleType::Motorcycle) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_vehicle_parse() {
        assert_eq!("Car".parse::<VehicleType>().unwrap(), VehicleType::Car);
        let err = "rocket".parse::<VehicleType>().unwrap_err();
        assert_eq!(err.kind, "vehicle type");
        assert_eq!(err.to_string(), "invalid vehicle type: rocket");
    }

    #[test]
    fn test_optimal_route_small_inputs_unchanged() {
        assert!(optimal_route(&[]).is_empty());
        let a = pt(10.0, 10.0);
        assert_eq!(optimal_route(&[a]), vec![a]);
        let b = pt(50.0, 50.0);
        assert_eq!(optimal_route(&[b, a]), vec![b, a]);
    }

    #[test]
    fn test_optimal_route_nearest_neighbour_order() {
        let start = pt(0.0, 0.0);
        let far = pt(0.0, 3.0);
        let near = pt(0.0, 1.0);
        let mid = pt(0.0, 2.0);
        let route = optimal_route(&[start, far, near, mid]);
        assert_eq!(route, vec![start, near, mid, far]);
    }

    #[test]
    fn test_optimal_route_tie_prefers_first_input() {
        let start = pt(0.0, 0.0);
        let east = pt(0.0, 1.0);
        let west = pt(0.0, -1.0);
        let route = optimal_route(&[start, west, east]);
        assert_eq!(route.get(1), Some(&west));

        let route = optimal_route(&[start, east, west]);
        assert_eq!(route.get(1), Some(&east));
    }

    #[test]
    fn test_optimal_route_is_permutation() {
        let input = [
            pt(12.97, 77.59),
            pt(13.08, 80.27),
            pt(17.38, 78.48),
            pt(12.30, 76.64),
            pt(15.31, 75.71),
            pt(12.97, 77.59),
        ];
        let route = optimal_route(&input);
        assert_eq!(route.len(), input.len());
        for point in &input {
            let expected = input.iter().filter(|p| *p == point).count();
            let actual = route.iter().filter(|p| *p == point).count();
            assert_eq!(expected, actual);
        }
        assert_eq!(route.first(), input.first());
    }

    #[test]
    fn test_route_distance() {
        assert!(route_distance(&[]).abs() < f64::EPSILON);
        assert!(route_distance(&[pt(1.0, 1.0)]).abs() < f64::EPSILON);

        let a = pt(0.0, 0.0);
        let b = pt(0.0, 1.0);
        let c = pt(1.0, 1.0);
        let total = route_distance(&[a, b, c]);
        assert!((total - (distance(&a, &b) + distance(&b, &c))).abs() < 1e-9);
    }

    #[test]
    fn test_plan_route() {
        let empty = plan_route(&[], VehicleType::Car);
        assert!(empty.stops.is_empty());
        assert_eq!(empty.estimated_minutes, 0);

        let plan = plan_route(&[pt(0.0, 0.0), pt(0.0, 0.5)], VehicleType::Car);
        assert_eq!(plan.stops.len(), 2);
        assert_eq!(plan.estimated_minutes, delivery_time(plan.total_distance_km));
        assert!((plan.carbon_footprint_kg - plan.total_distance_km * 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_validate_distance() {
        assert_eq!(validate_distance("radius", 2.5), Ok(2.5));
        assert!(validate_distance("radius", -1.0).is_err());
        assert!(validate_distance("radius", f64::NAN).is_err());
    }
}

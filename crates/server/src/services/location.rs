//! Reverse geocoding and weather lookups for delivery destinations.
//!
//! Both upstreams are best-effort. Any failure is logged and replaced with a
//! neutral default so a slow or broken third party never fails a request.
//! Successful lookups are cached for an hour per ~100 m grid cell.

use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use maani_core::GeoPoint;

use crate::config::LocationConfig;

/// Label used when reverse geocoding fails.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Timezone used when the weather lookup fails.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// WMO weather codes from this value up are rain, snow, or thunderstorms.
const PRECIPITATION_CODE: u16 = 61;

/// Wind speed (km/h) at or above which two-wheeler delivery is unsafe.
const MAX_DELIVERY_WIND_KMH: f64 = 40.0;

const CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const CACHE_CAPACITY: u64 = 10_000;

/// Errors from the upstream location APIs. Never surfaced to clients.
#[derive(Debug, Error)]
pub enum LocationError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {0}")]
    Status(u16),

    /// Endpoint URL could not be built.
    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
}

/// Human-readable place for a coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl Place {
    fn unknown() -> Self {
        Self {
            name: UNKNOWN_LOCATION.to_owned(),
            city: None,
            state: None,
            country: None,
        }
    }
}

/// Current weather at a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub temperature_c: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub weather_code: Option<u16>,
    pub timezone: String,
    pub is_delivery_friendly: bool,
}

impl Weather {
    fn unknown() -> Self {
        Self {
            temperature_c: None,
            wind_speed_kmh: None,
            weather_code: None,
            timezone: DEFAULT_TIMEZONE.to_owned(),
            is_delivery_friendly: true,
        }
    }
}

/// Place and weather for a delivery destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryConditions {
    pub place: Place,
    pub weather: Weather,
}

/// Whether the weather allows normal delivery.
#[must_use]
pub fn is_delivery_friendly(weather_code: u16, wind_speed_kmh: f64) -> bool {
    weather_code < PRECIPITATION_CODE && wind_speed_kmh < MAX_DELIVERY_WIND_KMH
}

/// Cache key: coordinates rounded to three decimals.
#[allow(clippy::cast_possible_truncation)] // |lat|, |lon| <= 180_000 after scaling
fn grid_cell(point: &GeoPoint) -> (i32, i32) {
    (
        (point.latitude() * 1000.0).round() as i32,
        (point.longitude() * 1000.0).round() as i32,
    )
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    #[serde(default)]
    address: ReverseAddress,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl From<ReverseResponse> for Place {
    fn from(resp: ReverseResponse) -> Self {
        let ReverseAddress {
            city,
            town,
            village,
            state,
            country,
        } = resp.address;
        Self {
            name: resp
                .display_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_owned()),
            city: city.or(town).or(village),
            state,
            country,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    timezone: Option<String>,
    current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: Option<f64>,
    windspeed: Option<f64>,
    weathercode: Option<u16>,
}

impl From<ForecastResponse> for Weather {
    fn from(resp: ForecastResponse) -> Self {
        let (temperature_c, wind_speed_kmh, weather_code) = resp
            .current_weather
            .map_or((None, None, None), |w| {
                (w.temperature, w.windspeed, w.weathercode)
            });
        Self {
            temperature_c,
            wind_speed_kmh,
            weather_code,
            timezone: resp
                .timezone
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_owned()),
            is_delivery_friendly: is_delivery_friendly(
                weather_code.unwrap_or(0),
                wind_speed_kmh.unwrap_or(0.0),
            ),
        }
    }
}

/// Client for the geocoding and weather upstreams.
///
/// Cheap to clone; clones share the HTTP connection pool and caches.
#[derive(Clone)]
pub struct LocationService {
    client: reqwest::Client,
    geocoding_url: Url,
    weather_url: Url,
    places: Cache<(i32, i32), Place>,
    weather: Cache<(i32, i32), Weather>,
}

impl LocationService {
    /// Create a new location service.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &LocationConfig) -> Result<Self, LocationError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("maani-server/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            geocoding_url: config.geocoding_url.clone(),
            weather_url: config.weather_url.clone(),
            places: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
            weather: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        })
    }

    /// Place name for a coordinate, or [`UNKNOWN_LOCATION`] on failure.
    #[instrument(skip_all, fields(point = %point))]
    pub async fn reverse_geocode(&self, point: &GeoPoint) -> Place {
        let key = grid_cell(point);
        if let Some(place) = self.places.get(&key).await {
            debug!("Cache hit for place");
            return place;
        }

        match self.fetch_place(point).await {
            Ok(place) => {
                self.places.insert(key, place.clone()).await;
                place
            }
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed, using fallback");
                Place::unknown()
            }
        }
    }

    /// Current weather for a coordinate, or a delivery-friendly UTC default
    /// on failure.
    #[instrument(skip_all, fields(point = %point))]
    pub async fn current_weather(&self, point: &GeoPoint) -> Weather {
        let key = grid_cell(point);
        if let Some(weather) = self.weather.get(&key).await {
            debug!("Cache hit for weather");
            return weather;
        }

        match self.fetch_weather(point).await {
            Ok(weather) => {
                self.weather.insert(key, weather.clone()).await;
                weather
            }
            Err(e) => {
                warn!(error = %e, "Weather lookup failed, using fallback");
                Weather::unknown()
            }
        }
    }

    /// Place and weather, fetched concurrently.
    pub async fn delivery_conditions(&self, point: &GeoPoint) -> DeliveryConditions {
        let (place, weather) =
            tokio::join!(self.reverse_geocode(point), self.current_weather(point));
        DeliveryConditions { place, weather }
    }

    async fn fetch_place(&self, point: &GeoPoint) -> Result<Place, LocationError> {
        let mut url = self.geocoding_url.join("reverse")?;
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &point.latitude().to_string())
            .append_pair("lon", &point.longitude().to_string());

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LocationError::Status(status.as_u16()));
        }

        Ok(response.json::<ReverseResponse>().await?.into())
    }

    async fn fetch_weather(&self, point: &GeoPoint) -> Result<Weather, LocationError> {
        let mut url = self.weather_url.join("v1/forecast")?;
        url.query_pairs_mut()
            .append_pair("latitude", &point.latitude().to_string())
            .append_pair("longitude", &point.longitude().to_string())
            .append_pair("current_weather", "true")
            .append_pair("timezone", "auto");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LocationError::Status(status.as_u16()));
        }

        Ok(response.json::<ForecastResponse>().await?.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Json, Router, http::StatusCode, routing::get};

    use super::*;

    /// Serve a fake upstream on an ephemeral port and return its base URL.
    async fn spawn_upstream(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    fn service(geocoding_url: Url, weather_url: Url) -> LocationService {
        LocationService::new(&LocationConfig {
            geocoding_url,
            weather_url,
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    fn bengaluru() -> GeoPoint {
        GeoPoint::new(12.9716, 77.5946).unwrap()
    }

    #[test]
    fn test_is_delivery_friendly() {
        assert!(is_delivery_friendly(0, 10.0));
        assert!(is_delivery_friendly(60, 39.9));
        assert!(!is_delivery_friendly(61, 5.0));
        assert!(!is_delivery_friendly(95, 5.0));
        assert!(!is_delivery_friendly(1, 40.0));
    }

    #[test]
    fn test_grid_cell_rounds_to_three_decimals() {
        let a = GeoPoint::new(12.97161, 77.59459).unwrap();
        let b = GeoPoint::new(12.97157, 77.59461).unwrap();
        assert_eq!(grid_cell(&a), grid_cell(&b));
        assert_eq!(grid_cell(&a), (12_972, 77_595));
    }

    #[test]
    fn test_place_from_reverse_response() {
        let resp: ReverseResponse = serde_json::from_value(serde_json::json!({
            "display_name": "MG Road, Bengaluru, Karnataka, India",
            "address": { "town": "Bengaluru", "state": "Karnataka", "country": "India" }
        }))
        .unwrap();
        let place = Place::from(resp);
        assert_eq!(place.city.as_deref(), Some("Bengaluru"));
        assert_eq!(place.state.as_deref(), Some("Karnataka"));

        let empty: ReverseResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(Place::from(empty).name, UNKNOWN_LOCATION);
    }

    #[test]
    fn test_weather_from_forecast_response() {
        let resp: ForecastResponse = serde_json::from_value(serde_json::json!({
            "timezone": "Asia/Kolkata",
            "current_weather": { "temperature": 31.4, "windspeed": 12.0, "weathercode": 63 }
        }))
        .unwrap();
        let weather = Weather::from(resp);
        assert_eq!(weather.timezone, "Asia/Kolkata");
        assert_eq!(weather.weather_code, Some(63));
        assert!(!weather.is_delivery_friendly);
    }

    #[tokio::test]
    async fn test_lookups_parse_and_cache() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let upstream = spawn_upstream(
            Router::new()
                .route(
                    "/reverse",
                    get(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                        async {
                            Json(serde_json::json!({
                                "display_name": "Brigade Road, Bengaluru",
                                "address": { "city": "Bengaluru", "country": "India" }
                            }))
                        }
                    }),
                )
                .route(
                    "/v1/forecast",
                    get(|| async {
                        Json(serde_json::json!({
                            "timezone": "Asia/Kolkata",
                            "current_weather": { "temperature": 27.0, "windspeed": 8.0, "weathercode": 2 }
                        }))
                    }),
                ),
        )
        .await;

        let location = service(upstream.clone(), upstream);
        let conditions = location.delivery_conditions(&bengaluru()).await;
        assert_eq!(conditions.place.name, "Brigade Road, Bengaluru");
        assert_eq!(conditions.weather.timezone, "Asia/Kolkata");
        assert!(conditions.weather.is_delivery_friendly);

        let again = location.reverse_geocode(&bengaluru()).await;
        assert_eq!(again, conditions.place);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_upstream_errors_fall_back() {
        let upstream = spawn_upstream(
            Router::new()
                .route("/reverse", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
                .route("/v1/forecast", get(|| async { "not json" })),
        )
        .await;

        let location = service(upstream.clone(), upstream);
        let conditions = location.delivery_conditions(&bengaluru()).await;
        assert_eq!(conditions.place.name, UNKNOWN_LOCATION);
        assert_eq!(conditions.weather.timezone, DEFAULT_TIMEZONE);
        assert!(conditions.weather.is_delivery_friendly);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_falls_back() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let dead = Url::parse(&format!("http://{addr}/")).unwrap();

        let location = service(dead.clone(), dead);
        assert_eq!(location.reverse_geocode(&bengaluru()).await, Place::unknown());
        assert_eq!(location.current_weather(&bengaluru()).await, Weather::unknown());
    }
}

//! Integration tests for the Maani server.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations and start the server
//! cargo run -p maani-cli -- migrate
//! cargo run -p maani-server
//!
//! # Run the ignored integration tests against it
//! cargo test -p maani-integration-tests -- --ignored
//! ```
//!
//! Set `MAANI_BASE_URL` to target a server other than `http://localhost:3000`.

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("MAANI_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

/// HTTP client for tests.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// A user ID unlikely to collide with earlier runs.
#[must_use]
pub fn unique_user_id() -> i32 {
    let bits = Uuid::new_v4().as_u128() % 1_000_000_000;
    i32::try_from(bits).unwrap_or(i32::MAX)
}

/// Registration payload for a seller at the given coordinates.
#[must_use]
pub fn seller_registration(user_id: i32, name: &str, latitude: f64, longitude: f64) -> Value {
    json!({
        "userId": user_id,
        "businessName": name,
        "businessType": "food",
        "contactEmail": format!("seller{user_id}@maani.test"),
        "address": {
            "street": "12 MG Road",
            "city": "Bengaluru",
            "state": "Karnataka",
            "postalCode": "560001",
            "country": "India",
            "location": { "latitude": latitude, "longitude": longitude }
        },
        "languages": ["kn", "en"]
    })
}

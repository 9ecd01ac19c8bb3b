//! Business logic services.
//!
//! # Services
//!
//! - `sellers` - Registration, search, nearby ranking, reviews, delivery quotes
//! - `subscriptions` - Trial, renewal, cancellation, expiry sweep
//! - `location` - Reverse geocoding and weather (best-effort, cached)

pub mod location;
pub mod sellers;
pub mod subscriptions;

pub use location::{DeliveryConditions, LocationError, LocationService};
pub use sellers::{DeliveryQuote, SellerService};
pub use subscriptions::{SubscriptionService, SubscriptionStatusView};

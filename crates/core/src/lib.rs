//! Maani Core - Shared domain library.
//!
//! This crate provides the domain types and pure business logic used across
//! all Maani components:
//! - `server` - Public JSON API (sellers, subscriptions, delivery)
//! - `cli` - Command-line tools for migrations and the subscription sweep
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Anything time-dependent takes `now` as an argument
//! so it can be tested without a clock.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, coordinates, and statuses
//! - [`geo`] - Distance, bounding box, delivery estimates, and route ordering
//! - [`subscription`] - Subscription lifecycle state machine
//! - [`seller`] - Seller records, rating aggregation, and nearby ranking
//! - [`language`] - Static regional-language and weekday tables

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod geo;
pub mod language;
pub mod seller;
pub mod subscription;
pub mod types;

pub use types::*;

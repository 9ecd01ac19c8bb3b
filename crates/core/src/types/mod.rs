//! Core types for Maani.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod geo_point;
pub mod id;
pub mod status;

pub use email::{Email, EmailError};
pub use geo_point::{GeoError, GeoPoint};
pub use id::*;
pub use status::*;

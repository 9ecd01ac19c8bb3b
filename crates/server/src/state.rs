//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::MaaniConfig;
use crate::services::{LocationError, LocationService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: MaaniConfig,
    pool: PgPool,
    location: LocationService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the outbound HTTP client cannot be built.
    pub fn new(config: MaaniConfig, pool: PgPool) -> Result<Self, LocationError> {
        let location = LocationService::new(&config.location)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                location,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &MaaniConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the geocoding/weather client.
    #[must_use]
    pub fn location(&self) -> &LocationService {
        &self.inner.location
    }
}

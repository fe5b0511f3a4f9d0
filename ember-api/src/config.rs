//! API Configuration Module
//!
//! Configuration for CORS and other API settings, loaded from
//! environment variables with sensible defaults for development.

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS and production hardening.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            // CORS defaults: permissive for development
            cors_origins: Vec::new(), // Empty = allow all
            cors_max_age_secs: 86400, // 24 hours
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `EMBER_CORS_ORIGINS`: Comma-separated allowed origins
    ///   (empty = allow all)
    /// - `EMBER_CORS_MAX_AGE_SECS`: Preflight cache duration
    ///   (default: 86400)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins = std::env::var("EMBER_CORS_ORIGINS")
            .ok()
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        let cors_max_age_secs = std::env::var("EMBER_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        Self {
            cors_origins,
            cors_max_age_secs,
        }
    }
}

//! Server configuration from environment variables.

use std::env;
use thiserror::Error;

use soundcheck_core::StorageConfig;

/// Default listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Default storage bucket for venue photos.
pub const DEFAULT_PHOTO_BUCKET: &str = "venue-photos";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Postgres connection string.
    pub database_url: String,
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// Bearer token required on admin endpoints.
    pub admin_token: String,
    /// Google Places API key. Optional at startup; photo backfill refuses to
    /// run without it.
    pub google_places_api_key: Option<String>,
    /// Supabase storage settings for uploaded photos.
    pub storage: StorageConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DATABASE_URL`: Postgres connection string
    /// - `ADMIN_API_TOKEN`: Bearer token for admin endpoints
    /// - `SUPABASE_URL`: Supabase project base URL
    /// - `SUPABASE_SERVICE_KEY`: Supabase service role key
    ///
    /// Optional:
    /// - `SOUNDCHECK_ADDR`: Listen address (default: "0.0.0.0:3000")
    /// - `SOUNDCHECK_PHOTO_BUCKET`: Storage bucket (default: "venue-photos")
    /// - `GOOGLE_PLACES_API_KEY`: Places API key
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let admin_token = env::var("ADMIN_API_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("ADMIN_API_TOKEN".to_string()))?;

        let supabase_url = env::var("SUPABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("SUPABASE_URL".to_string()))?;

        let service_key = env::var("SUPABASE_SERVICE_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("SUPABASE_SERVICE_KEY".to_string()))?;

        let listen_addr =
            env::var("SOUNDCHECK_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());

        let bucket = env::var("SOUNDCHECK_PHOTO_BUCKET")
            .unwrap_or_else(|_| DEFAULT_PHOTO_BUCKET.to_string());

        let google_places_api_key = env::var("GOOGLE_PLACES_API_KEY").ok();

        Ok(Self {
            database_url,
            listen_addr,
            admin_token,
            google_places_api_key,
            storage: StorageConfig {
                base_url: supabase_url,
                service_key,
                bucket,
            },
        })
    }
}

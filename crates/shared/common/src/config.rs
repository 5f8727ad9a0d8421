//! Shared configuration structures loaded from environment variables.

use std::env;

use domain::{
    CITIES_API_URL, COUNTRIES_API_URL, DEFAULT_CATEGORY_LIMIT, DEFAULT_FAMILY_LIMIT,
    DEFAULT_SUB_CATEGORY_LIMIT, MIN_PASSWORD_LENGTH, STATES_API_URL,
};
use serde::{Deserialize, Serialize};

/// Default SQLite database used when `DATABASE_URL` is not set
pub const DEFAULT_DATABASE_URL: &str = "sqlite://staff-admin.db?mode=rwc";

pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

pub const DEFAULT_GEO_TIMEOUT_MS: u64 = 10_000;

/// Minimum signing secret length accepted outside debug builds
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Document store configuration.
#[derive(Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", defaults.max_connections),
        }
    }
}

/// Identity provider configuration.
#[derive(Clone, Deserialize, Serialize)]
pub struct IdentityConfig {
    #[serde(skip_serializing)]
    jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub min_password_length: usize,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("min_password_length", &self.min_password_length)
            .finish()
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret-key-minimum-32-chars!!".to_string(),
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            min_password_length: MIN_PASSWORD_LENGTH,
        }
    }
}

impl IdentityConfig {
    pub fn new(jwt_secret: impl Into<String>, token_ttl_minutes: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl_minutes,
            ..Self::default()
        }
    }

    /// Load from the environment, refusing weak secrets in release builds.
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                Self::default().jwt_secret
            }
            Err(_) => return Err("JWT_SECRET environment variable must be set".to_string()),
        };

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(format!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            ));
        }

        Ok(Self {
            jwt_secret,
            token_ttl_minutes: env_or("TOKEN_TTL_MINUTES", DEFAULT_TOKEN_TTL_MINUTES),
            min_password_length: env_or("MIN_PASSWORD_LENGTH", MIN_PASSWORD_LENGTH),
        })
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// Maximum live catalog nodes per parent scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogLimits {
    pub family: usize,
    pub category: usize,
    pub sub_category: usize,
}

impl Default for CatalogLimits {
    fn default() -> Self {
        Self {
            family: DEFAULT_FAMILY_LIMIT,
            category: DEFAULT_CATEGORY_LIMIT,
            sub_category: DEFAULT_SUB_CATEGORY_LIMIT,
        }
    }
}

impl CatalogLimits {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            family: env_or("FAMILY_LIMIT", defaults.family),
            category: env_or("CATEGORY_LIMIT", defaults.category),
            sub_category: env_or("SUB_CATEGORY_LIMIT", defaults.sub_category),
        }
    }

    pub fn for_level(&self, level: domain::CatalogLevel) -> usize {
        match level {
            domain::CatalogLevel::Family => self.family,
            domain::CatalogLevel::Category => self.category,
            domain::CatalogLevel::SubCategory => self.sub_category,
        }
    }
}

/// Country, state and city lookup endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoConfig {
    pub countries_url: String,
    pub states_url: String,
    pub cities_url: String,
    pub timeout_ms: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            countries_url: COUNTRIES_API_URL.to_string(),
            states_url: STATES_API_URL.to_string(),
            cities_url: CITIES_API_URL.to_string(),
            timeout_ms: DEFAULT_GEO_TIMEOUT_MS,
        }
    }
}

impl GeoConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            countries_url: env::var("GEO_COUNTRIES_URL").unwrap_or(defaults.countries_url),
            states_url: env::var("GEO_STATES_URL").unwrap_or(defaults.states_url),
            cities_url: env::var("GEO_CITIES_URL").unwrap_or(defaults.cities_url),
            timeout_ms: env_or("GEO_TIMEOUT_MS", defaults.timeout_ms),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub identity: IdentityConfig,
    pub limits: CatalogLimits,
    pub geo: GeoConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            store: StoreConfig::from_env(),
            identity: IdentityConfig::from_env()?,
            limits: CatalogLimits::from_env(),
            geo: GeoConfig::from_env(),
        })
    }
}

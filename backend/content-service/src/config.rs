/// Configuration management for Content Service
///
/// All settings come from environment variables (a `.env` file is loaded by
/// `main` first). Production deployments are checked for unsafe defaults.
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Bearer token validation
    pub auth: AuthConfig,
    /// Feed paging and search limits
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Where content and purchases are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown STORAGE_BACKEND '{}'", other)),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Pool size override; unset keeps the db-pool sizing
    pub max_connections: Option<u32>,
    /// Storage implementation to wire at startup
    pub backend: StorageBackend,
}

/// Identity provider token settings. At most one key source is used;
/// the RSA public key wins when both are set.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_public_key_pem: Option<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_public_key_pem", &self.jwt_public_key_pem.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AuthConfig {
    pub fn is_configured(&self) -> bool {
        self.jwt_public_key_pem.is_some() || self.jwt_secret.is_some()
    }
}

/// Feed paging and search limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub search_result_limit: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: crate::models::DEFAULT_PAGE_SIZE,
            max_page_size: crate::models::MAX_PAGE_SIZE,
            search_result_limit: 10,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_source<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app = AppConfig {
            env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
            host: lookup("CONTENT_SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or_default(&lookup, "CONTENT_SERVICE_PORT", 8081)?,
        };
        let production = app.is_production();

        let cors = {
            let allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
                Some(value) => value,
                None if production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                None => "http://localhost:3000".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => StorageBackend::Postgres,
        };
        if production && backend == StorageBackend::Memory {
            return Err("STORAGE_BACKEND=memory is not allowed in production".to_string());
        }

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "postgresql://localhost/blocktube".to_string()),
            max_connections: parse_optional(&lookup, "DATABASE_MAX_CONNECTIONS")?,
            backend,
        };
        if database.max_connections == Some(0) {
            return Err("DATABASE_MAX_CONNECTIONS must be positive".to_string());
        }

        let auth = AuthConfig {
            jwt_public_key_pem: lookup("JWT_PUBLIC_KEY_PEM").filter(|v| !v.trim().is_empty()),
            jwt_secret: lookup("JWT_SECRET").filter(|v| !v.trim().is_empty()),
        };
        if production && !auth.is_configured() {
            return Err(
                "JWT_PUBLIC_KEY_PEM or JWT_SECRET must be set in production".to_string(),
            );
        }

        let defaults = FeedConfig::default();
        let feed = FeedConfig {
            default_page_size: parse_or_default(
                &lookup,
                "FEED_DEFAULT_PAGE_SIZE",
                defaults.default_page_size,
            )?,
            max_page_size: parse_or_default(&lookup, "FEED_MAX_PAGE_SIZE", defaults.max_page_size)?,
            search_result_limit: parse_or_default(
                &lookup,
                "SEARCH_RESULT_LIMIT",
                defaults.search_result_limit,
            )?,
        };
        if feed.max_page_size == 0 || feed.search_result_limit == 0 {
            return Err("FEED_MAX_PAGE_SIZE and SEARCH_RESULT_LIMIT must be positive".to_string());
        }

        Ok(Config {
            app,
            cors,
            database,
            auth,
            feed,
        })
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional(lookup, key)?.unwrap_or(default))
}

fn parse_optional<F, T>(lookup: &F, key: &str) -> Result<Option<T>, String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|val| {
            val.trim()
                .parse()
                .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_development_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.app.port, 8081);
        assert_eq!(config.database.backend, StorageBackend::Postgres);
        assert_eq!(config.feed.search_result_limit, 10);
        assert!(!config.auth.is_configured());
    }

    #[test]
    fn test_production_rejects_wildcard_cors() {
        let err = load(&[
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "*"),
            ("JWT_SECRET", "a-very-long-shared-secret"),
        ])
        .unwrap_err();
        assert!(err.contains("CORS_ALLOWED_ORIGINS"));
    }

    #[test]
    fn test_production_requires_token_key_and_durable_storage() {
        let missing_key = load(&[
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "https://blocktube.app"),
        ])
        .unwrap_err();
        assert!(missing_key.contains("JWT"));

        let memory = load(&[
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "https://blocktube.app"),
            ("JWT_SECRET", "a-very-long-shared-secret"),
            ("STORAGE_BACKEND", "memory"),
        ])
        .unwrap_err();
        assert!(memory.contains("STORAGE_BACKEND"));
    }

    #[test]
    fn test_pool_size_applies_only_when_set() {
        assert_eq!(load(&[]).unwrap().database.max_connections, None);

        let config = load(&[("DATABASE_MAX_CONNECTIONS", "5")]).unwrap();
        assert_eq!(config.database.max_connections, Some(5));

        let err = load(&[("DATABASE_MAX_CONNECTIONS", "0")]).unwrap_err();
        assert!(err.contains("DATABASE_MAX_CONNECTIONS"));
    }

    #[test]
    fn test_bad_numbers_are_reported() {
        let err = load(&[("SEARCH_RESULT_LIMIT", "ten")]).unwrap_err();
        assert!(err.contains("SEARCH_RESULT_LIMIT"));
    }
}

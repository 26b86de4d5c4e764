use std::sync::Arc;

use anyhow::Result;
use redis::aio::ConnectionManager;
use sea_orm::Database;
use tracing::{debug, info, warn};

use crate::auth::tokens::{RedisTokenStore, TokenBackend};
use crate::schemas::AppState;

/// Relational database settings
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Redis connection settings
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub db: u8,
}

impl RedisConfig {
    /// Connection URL in the form `redis://:<password>@<host>:<port>/<db>`.
    /// An empty password yields `redis://<host>:<port>/<db>`.
    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}/{}", self.host, self.port, self.db)
        } else {
            format!("redis://:{}@{}:{}/{}", self.password, self.host, self.port, self.db)
        }
    }
}

/// Authentication settings
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Secret key sourced from SECRET_KEY
    pub secret_key: String,
    /// Access token lifetime in seconds (Redis TTL and cookie Max-Age)
    pub token_lifetime_secs: u64,
    /// Name of the access token cookie
    pub cookie_name: String,
    /// Whether the access token cookie carries the `Secure` attribute.
    /// Disable only for plain-HTTP development setups.
    pub cookie_secure: bool,
    /// Prefix for Redis token keys
    pub token_prefix: String,
}

/// HTTP server settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Public base URL of this service; the admin middleware re-validates
    /// cookies by calling `<base_url>/auth/protected`.
    pub base_url: String,
}

/// Application configuration assembled from the environment
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from `.env` / environment variables, falling
    /// back to local-development defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let database = DatabaseConfig {
            url: env_or("DATABASE_URL", "sqlite://authgate.db"),
        };

        let redis = RedisConfig {
            host: env_or("REDIS_HOST", "127.0.0.1"),
            port: env_parsed("REDIS_PORT", 6379),
            password: env_or("REDIS_PASSWORD", ""),
            db: env_parsed("REDIS_DB", 0),
        };

        let secret_key = env_or("SECRET_KEY", "insecure-dev-secret");
        if secret_key == "insecure-dev-secret" {
            warn!("SECRET_KEY is not set; using the insecure development default");
        }

        let auth = AuthConfig {
            secret_key,
            token_lifetime_secs: env_parsed("ACCESS_TOKEN_EXPIRE", 3600),
            cookie_name: env_or("ACCESS_TOKEN_COOKIE", "access_token"),
            cookie_secure: env_parsed("COOKIE_SECURE", true),
            token_prefix: env_or("ACCESS_TOKEN_PREFIX", "access_token"),
        };

        let bind_address = env_or("BIND_ADDRESS", "0.0.0.0:3000");
        let server = ServerConfig {
            base_url: env_or("BASE_URL", &format!("http://{}", bind_address)),
            bind_address,
        };

        AppConfig {
            database,
            redis,
            auth,
            server,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

/// Initialize application state: database connection, Redis-backed token
/// store, and the HTTP client used by the admin auth relay.
pub async fn initialize_app_state(config: AppConfig) -> Result<AppState> {
    info!("Connecting to database: {}", config.database.url);
    let db = Database::connect(&config.database.url).await?;

    info!(
        "Connecting to Redis at {}:{}/{}",
        config.redis.host, config.redis.port, config.redis.db
    );
    let client = redis::Client::open(config.redis.url())?;
    let conn = ConnectionManager::new(client).await?;
    debug!("Redis connection manager initialized");

    let tokens: Arc<dyn TokenBackend> = Arc::new(RedisTokenStore::new(
        conn,
        &config.auth.token_prefix,
        config.auth.token_lifetime_secs,
    ));

    let http = reqwest::Client::new();

    Ok(AppState {
        db,
        tokens,
        http,
        config: Arc::new(config),
    })
}

/// Configuration management for the API server
///
/// Configuration comes from environment variables, with a `.env` file picked
/// up in development.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string. When unset it is assembled
///   from `DB_HOST` (default localhost), `DB_PORT` (default 5432), `DB_USER`,
///   `DB_PASSWORD` and `DB_NAME`
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `PORT`: Port to bind to (default: 5001)
/// - `FRONTEND_URL`, `FRONTEND_URL_PROD`: Allowed CORS origins; `*` allows any
/// - `APP_ENV`: `production` turns on HSTS
/// - `JWT_SECRET`: Secret key for JWT signing (required, 32+ characters)
/// - `ADMIN_EMAIL`: Registrations with this email get the admin role
/// - `RUST_LOG`: Log filter (default: shopfront_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use shopfront_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Origin allowed when no frontend URL is configured
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,

    /// Email that is granted the admin role on registration
    pub admin_email: Option<String>,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Origins allowed by CORS; a single `*` means any
    pub cors_origins: Vec<String>,

    /// Running in production (enables HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or a value doesn't
    /// parse
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match var("PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("PORT must be a valid port number: {}", e))?,
            None => 5001,
        };

        let mut cors_origins: Vec<String> = ["FRONTEND_URL", "FRONTEND_URL_PROD"]
            .into_iter()
            .filter_map(|key| var(key))
            .map(|origin| origin.trim_end_matches('/').to_string())
            .collect();
        if cors_origins.is_empty() {
            cors_origins.push(DEFAULT_FRONTEND_URL.to_string());
        }

        let production = var("APP_ENV")
            .map(|value| value.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let url = match var("DATABASE_URL") {
            Some(url) => url,
            None => {
                let user = var("DB_USER").ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL or DB_USER and DB_NAME environment variables are required")
                })?;
                let name = var("DB_NAME")
                    .ok_or_else(|| anyhow::anyhow!("DB_NAME environment variable is required"))?;
                let host = var("DB_HOST").unwrap_or_else(|| "localhost".to_string());
                let port = var("DB_PORT").unwrap_or_else(|| "5432".to_string());

                match var("DB_PASSWORD") {
                    Some(password) => format!("postgresql://{user}:{password}@{host}:{port}/{name}"),
                    None => format!("postgresql://{user}@{host}:{port}/{name}"),
                }
            }
        };

        let max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value.parse::<u32>()?,
            None => 10,
        };

        let secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url,
                max_connections,
            },
            jwt: JwtConfig { secret },
            admin_email: var("ADMIN_EMAIL").map(|email| email.trim().to_lowercase()),
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether CORS should accept any origin
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }

    /// Whether a registration with `email` gets the admin role
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| admin.eq_ignore_ascii_case(email.trim()))
    }
}

/*
 * Responsibility
 * - Environment / configuration loading (PORT, JWT_SECRET, ...)
 * - Validation of required values (startup fails when they are missing)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Verification secret used when `JWT_SECRET` is unset in development.
///
/// This mirrors the issuer's documented placeholder and is unsafe for
/// production; production startup refuses to run without an explicit secret.
pub const DEV_JWT_SECRET: &str = "your-super-secret-jwt-key-change-in-production";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    /// Shared HMAC secret used to verify access tokens.
    pub jwt_secret: String,
    /// Clock-skew tolerance applied to `exp` (seconds).
    pub token_leeway_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.trim().is_empty() => s,
            // An unset secret is a startup failure in production. Development
            // falls back to the documented placeholder so local setups work,
            // but loudly.
            _ if app_env.is_production() => return Err(ConfigError::Missing("JWT_SECRET")),
            _ => {
                tracing::warn!(
                    "JWT_SECRET is not set; using the built-in development secret (never use this in production)"
                );
                DEV_JWT_SECRET.to_string()
            }
        };

        let token_leeway_seconds = std::env::var("TOKEN_LEEWAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        Ok(Self {
            addr,
            app_env,
            jwt_secret,
            token_leeway_seconds,
        })
    }
}

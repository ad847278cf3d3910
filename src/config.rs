/*!
 * Configuration
 * Environment-driven settings, read once at startup
 */
use chrono::Duration;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::logging::config::LogConfig;

pub const DEFAULT_JWT_SECRET: &str = "hackerhire-dev-secret-change-in-production";

const DEFAULT_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:5173",
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },

    #[error(
        "JWT_SECRET must be set to a secure, unique value in production; \
         refusing to start with the default secret"
    )]
    InsecureSecret,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub bcrypt_cost: u32,
    pub allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
    pub seed_admins: bool,
    /// Replaces the primary seeded admin's password when set.
    pub admin_password_hash: Option<String>,
    pub admin_password: Option<String>,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            environment: "development".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            session_ttl: Duration::hours(24),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            allowed_origins: DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
            max_body_bytes: 1024 * 1024,
            seed_admins: true,
            admin_password_hash: None,
            admin_password: None,
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = get("ENVIRONMENT").unwrap_or(defaults.environment);
        let is_production = environment == "production";

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .or_else(|| get("FRONTEND_ORIGIN").map(|origin| vec![origin]))
            .unwrap_or(defaults.allowed_origins);

        let log = LogConfig {
            level: get("LOG_LEVEL")
                .unwrap_or_else(|| if is_production { "info" } else { "debug" }.to_string()),
            dir: get("LOG_DIR").map(PathBuf::from),
            json: is_production,
        };

        let ttl_hours: i64 = parse_var(
            "SESSION_TTL_HOURS",
            get("SESSION_TTL_HOURS"),
            defaults.session_ttl.num_hours(),
        )?;
        let session_ttl = Duration::try_hours(ttl_hours).ok_or_else(|| ConfigError::Invalid {
            var: "SESSION_TTL_HOURS",
            value: ttl_hours.to_string(),
        })?;

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", get("PORT"), defaults.port)?,
            jwt_secret: get("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            session_ttl,
            bcrypt_cost: parse_var("BCRYPT_COST", get("BCRYPT_COST"), defaults.bcrypt_cost)?,
            allowed_origins,
            max_body_bytes: parse_var(
                "MAX_BODY_BYTES",
                get("MAX_BODY_BYTES"),
                defaults.max_body_bytes,
            )?,
            seed_admins: parse_var("SEED_ADMINS", get("SEED_ADMINS"), defaults.seed_admins)?,
            admin_password_hash: get("ADMIN_PASSWORD_HASH"),
            admin_password: get("ADMIN_PASSWORD"),
            environment,
            log,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_production() && self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::InsecureSecret);
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid {
                var: "BCRYPT_COST",
                value: self.bcrypt_cost.to_string(),
            });
        }
        if self.session_ttl <= Duration::zero() {
            return Err(ConfigError::Invalid {
                var: "SESSION_TTL_HOURS",
                value: self.session_ttl.num_hours().to_string(),
            });
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            var: "HOST",
            value: raw,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    var: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { var, value: raw }),
        None => Ok(default),
    }
}

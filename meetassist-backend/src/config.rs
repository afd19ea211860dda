use std::env;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} must be a valid number")]
    Invalid(&'static str),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub secret_key: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_expiry_hours: i64,
    /// Built SPA directory, None when static serving is off
    pub frontend_dist: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret_key = lookup("SECRET_KEY")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("SECRET_KEY"))?;

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 8080,
        };

        let jwt_expiry_hours = match lookup("JWT_EXPIRY_HOURS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .ok_or(ConfigError::Invalid("JWT_EXPIRY_HOURS"))?,
            None => 24,
        };

        // Set DISABLE_FRONTEND=1 to disable static file serving (for separate dev server)
        let frontend_disabled = lookup("DISABLE_FRONTEND")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let frontend_dist = if frontend_disabled {
            None
        } else {
            lookup("FRONTEND_DIST").or_else(detect_frontend_dist)
        };

        Ok(Self {
            secret_key,
            port,
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "./.db/meetassist.db".to_string()),
            jwt_expiry_hours,
            frontend_dist,
        })
    }
}

/// Check both possible locations for frontend dist
fn detect_frontend_dist() -> Option<String> {
    ["./frontend/dist", "../frontend/dist"]
        .into_iter()
        .find(|p| Path::new(p).exists())
        .map(str::to_string)
}

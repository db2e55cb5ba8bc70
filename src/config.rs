use std::env;

use crate::models::WildcardPolicy;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000,\
     http://localhost:3001,http://127.0.0.1:3001,\
     http://localhost:3002,http://127.0.0.1:3002";

/// What `DELETE /api/bookings/:id` does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DeleteMode {
    #[default]
    Cancel,
    Hard,
}

impl DeleteMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cancel" => Some(DeleteMode::Cancel),
            "hard" | "delete" => Some(DeleteMode::Hard),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub delete_mode: DeleteMode,
    pub wildcard_policy: WildcardPolicy,
    pub dev_fallback: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            database_url: "bookings.db".to_string(),
            environment: "development".to_string(),
            cors_origins: split_origins(DEFAULT_CORS_ORIGINS),
            delete_mode: DeleteMode::default(),
            wildcard_policy: WildcardPolicy::default(),
            dev_fallback: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            environment: env::var("APP_ENV").unwrap_or(defaults.environment),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| split_origins(&v))
                .unwrap_or(defaults.cors_origins),
            delete_mode: env::var("DELETE_MODE")
                .ok()
                .map(|v| {
                    DeleteMode::parse(&v).unwrap_or_else(|| {
                        tracing::warn!("unknown DELETE_MODE {v:?}, using cancel");
                        DeleteMode::Cancel
                    })
                })
                .unwrap_or(defaults.delete_mode),
            wildcard_policy: env::var("WILDCARD_STYLIST")
                .ok()
                .map(|v| {
                    WildcardPolicy::parse(&v).unwrap_or_else(|| {
                        tracing::warn!("unknown WILDCARD_STYLIST {v:?}, using occupying");
                        WildcardPolicy::Occupying
                    })
                })
                .unwrap_or(defaults.wildcard_policy),
            dev_fallback: env::var("DEV_FALLBACK")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.dev_fallback),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Non-durable responses are only ever allowed outside production.
    pub fn degraded_mode(&self) -> bool {
        self.dev_fallback && !self.is_production()
    }
}

fn split_origins(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

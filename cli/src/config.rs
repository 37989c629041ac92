use std::time::Duration;

use anyhow::{Context, Result, bail};

use mealbook_core::service::DEFAULT_CACHE_TTL;

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_MEALS_API_URL: &str = "https://69064c07ee3d0d14c13570c2.mockapi.io/baitap";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub host: String,
    pub environment: Environment,
    /// URL the keep-alive job pings; required in production.
    pub api_url: Option<String>,
    pub meals: MealsConfig,
}

/// Settings for the remote meal collection. Needed by the meal commands,
/// which run without a database.
#[derive(Debug, Clone)]
pub struct MealsConfig {
    pub api_url: String,
    pub cache_ttl: Duration,
}

impl MealsConfig {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cache_ttl = match var("MEALS_CACHE_TTL_SECS") {
            Some(s) => Duration::from_secs(
                s.trim()
                    .parse()
                    .with_context(|| format!("Invalid MEALS_CACHE_TTL_SECS '{s}'"))?,
            ),
            None => DEFAULT_CACHE_TTL,
        };

        Ok(MealsConfig {
            api_url: var("MEALS_API_URL").unwrap_or_else(|| DEFAULT_MEALS_API_URL.to_string()),
            cache_ttl,
        })
    }
}

impl Config {
    /// Load from the process environment, reading `.env` first if one exists.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url =
            var("DATABASE_URL").context("DATABASE_URL is missing. Check your .env file.")?;

        let port = match var("PORT") {
            Some(p) => p
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT '{p}'"))?,
            None => DEFAULT_PORT,
        };

        let environment = Environment::parse(var("NODE_ENV").as_deref());
        let api_url = var("API_URL");
        if environment.is_production() && api_url.is_none() {
            bail!("Missing required env: API_URL");
        }

        let meals = MealsConfig::from_lookup(&lookup)?;

        Ok(Config {
            database_url,
            port,
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            environment,
            api_url,
            meals,
        })
    }
}

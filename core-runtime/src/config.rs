//! # Core Configuration Module
//!
//! Provides configuration management for the club synchronization core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! holding every setting the sync engine needs: where the store lives, which
//! club and season are tracked, how to reach the federation API, and how
//! batch limits and the run lock behave. Nothing is read from
//! process-wide globals once the config is built; the service hands explicit
//! values down to the orchestrator.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/var/lib/club/club.db")
//!     .club_number(5403)
//!     .current_season(2025)
//!     .build()?;
//! ```
//!
//! ### From the environment
//!
//! ```ignore
//! // CLUB_SYNC_DATABASE_PATH, CLUB_SYNC_CLUB_NUMBER, CLUB_SYNC_SEASON, ...
//! let config = CoreConfig::from_env()?;
//! ```
//!
//! ## Error Handling
//!
//! `build()` validates the assembled config and fails fast with
//! [`Error::Config`] and an actionable message.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default federation API root
pub const DEFAULT_API_BASE_URL: &str = "https://api-dofa.fff.fr/api";

/// Default tracked club
pub const DEFAULT_CLUB_NUMBER: i64 = 5403;

/// Default season
pub const DEFAULT_SEASON: i64 = 2025;

/// Environment variable prefix read by [`CoreConfig::from_env`]
pub const ENV_PREFIX: &str = "CLUB_SYNC_";

/// Core configuration for the synchronization service.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// External number of the tracked club
    pub club_number: i64,

    /// Season used when a payload does not name one
    pub current_season: i64,

    /// Federation API access
    pub api: ApiConfig,

    /// Sync engine behavior
    pub sync: SyncConfig,
}

/// Federation API access settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// API root, without trailing slash
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Attempts per request, including the first one
    pub retry_attempts: u32,

    /// Delay between attempts in milliseconds
    pub retry_delay_ms: u64,

    /// Maximum number of `hydra:next` pages followed per collection
    pub max_pages: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_delay_ms: 500,
            max_pages: 20,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("API base URL cannot be empty".to_string()));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "API base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 || self.timeout_secs > 600 {
            return Err(Error::Config(
                "API timeout must be between 1 and 600 seconds".to_string(),
            ));
        }

        if self.retry_attempts == 0 || self.retry_attempts > 10 {
            return Err(Error::Config(
                "API retry attempts must be between 1 and 10".to_string(),
            ));
        }

        if self.max_pages == 0 {
            return Err(Error::Config(
                "API max pages must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Per-call upper bounds on records a reconciler processes.
///
/// These guard against unbounded payloads. Overflow is reported, never
/// silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub venues: usize,
    pub members: usize,
    pub teams: usize,
    /// Engagements per team
    pub engagements: usize,
    /// Engagements fanned out to match/standings endpoints
    pub pools: usize,
    /// Matches per partition (calendar or results)
    pub matches: usize,
    pub opponents: usize,
    pub standings: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            venues: 50,
            members: 100,
            teams: 50,
            engagements: 20,
            pools: 50,
            matches: 200,
            opponents: 100,
            standings: 500,
        }
    }
}

impl BatchLimits {
    /// Same bound for every entity type
    pub fn uniform(limit: usize) -> Self {
        Self {
            venues: limit,
            members: limit,
            teams: limit,
            engagements: limit,
            pools: limit,
            matches: limit,
            opponents: limit,
            standings: limit,
        }
    }

    fn validate(&self) -> Result<()> {
        let all = [
            ("venues", self.venues),
            ("members", self.members),
            ("teams", self.teams),
            ("engagements", self.engagements),
            ("pools", self.pools),
            ("matches", self.matches),
            ("opponents", self.opponents),
            ("standings", self.standings),
        ];

        for (name, value) in all {
            if value == 0 {
                return Err(Error::Config(format!(
                    "Batch limit for {} must be greater than 0",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Sync engine behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// When false the service refuses to run a sync
    pub enabled: bool,

    /// Per-call record limits
    pub batch_limits: BatchLimits,

    /// Lease duration of the run lock in seconds
    pub lock_ttl_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_limits: BatchLimits::default(),
            lock_ttl_secs: 300,
        }
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Build a config from `CLUB_SYNC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        CoreConfigBuilder::from_vars(|key| std::env::var(key).ok())?.build()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path is not empty
    /// - Club number and season are positive
    /// - API settings are usable
    /// - Batch limits and lock lease are non-zero
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.club_number <= 0 {
            return Err(Error::Config(format!(
                "Club number must be positive, got {}",
                self.club_number
            )));
        }

        if !(1900..=2200).contains(&self.current_season) {
            return Err(Error::Config(format!(
                "Season {} is outside the supported range",
                self.current_season
            )));
        }

        self.api.validate()?;
        self.sync.batch_limits.validate()?;

        if self.sync.lock_ttl_secs == 0 {
            return Err(Error::Config(
                "Lock TTL must be greater than 0 seconds".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Debug, Default, Clone)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    club_number: Option<i64>,
    current_season: Option<i64>,
    api: ApiConfig,
    sync: SyncConfig,
}

impl CoreConfigBuilder {
    /// Seed a builder from `CLUB_SYNC_*` variables supplied by `lookup`.
    ///
    /// Unset variables keep their defaults; unparsable values are an error.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut builder = Self::default();

        if let Some(path) = get("DATABASE_PATH") {
            builder = builder.database_path(path);
        }
        if let Some(url) = get("API_BASE_URL") {
            builder = builder.api_base_url(url);
        }
        if let Some(value) = get("CLUB_NUMBER") {
            builder = builder.club_number(parse_var("CLUB_NUMBER", &value)?);
        }
        if let Some(value) = get("SEASON") {
            builder = builder.current_season(parse_var("SEASON", &value)?);
        }
        if let Some(value) = get("HTTP_TIMEOUT_SECS") {
            builder = builder.http_timeout_secs(parse_var("HTTP_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = get("RETRY_ATTEMPTS") {
            builder = builder.retry_attempts(parse_var("RETRY_ATTEMPTS", &value)?);
        }
        if let Some(value) = get("MAX_PAGES") {
            builder = builder.max_pages(parse_var("MAX_PAGES", &value)?);
        }
        if let Some(value) = get("LOCK_TTL_SECS") {
            builder = builder.lock_ttl_secs(parse_var("LOCK_TTL_SECS", &value)?);
        }
        if let Some(value) = get("ENABLED") {
            builder = builder.enabled(parse_bool("ENABLED", &value)?);
        }

        Ok(builder)
    }

    /// Sets the database path.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the tracked club's external number.
    ///
    /// Default: 5403
    pub fn club_number(mut self, club_number: i64) -> Self {
        self.club_number = Some(club_number);
        self
    }

    /// Sets the season used when payloads omit it.
    ///
    /// Default: 2025
    pub fn current_season(mut self, season: i64) -> Self {
        self.current_season = Some(season);
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.api.timeout_secs = secs;
        self
    }

    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.api.retry_attempts = attempts;
        self
    }

    pub fn retry_delay_ms(mut self, delay_ms: u64) -> Self {
        self.api.retry_delay_ms = delay_ms;
        self
    }

    pub fn max_pages(mut self, pages: u32) -> Self {
        self.api.max_pages = pages;
        self
    }

    pub fn batch_limits(mut self, limits: BatchLimits) -> Self {
        self.sync.batch_limits = limits;
        self
    }

    pub fn lock_ttl_secs(mut self, secs: u64) -> Self {
        self.sync.lock_ttl_secs = secs;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.sync.enabled = enabled;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the database path is missing or any value
    /// fails validation.
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config(
                "Database path is required. Use .database_path() or set CLUB_SYNC_DATABASE_PATH."
                    .to_string(),
            )
        })?;

        let config = CoreConfig {
            database_path,
            club_number: self.club_number.unwrap_or(DEFAULT_CLUB_NUMBER),
            current_season: self.current_season.unwrap_or(DEFAULT_SEASON),
            api: self.api,
            sync: self.sync,
        };

        config.validate()?;

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        Error::Config(format!(
            "{}{} has an invalid value: '{}'",
            ENV_PREFIX, name, value
        ))
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{}{} must be a boolean, got '{}'",
            ENV_PREFIX, name, value
        ))),
    }
}

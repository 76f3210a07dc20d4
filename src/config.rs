//! Bot configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Deployment-specific validation rules
//! (event window, venue roster, date style) live here so that a single
//! binary serves different event deployments.

use std::net::SocketAddr;

use chrono::Datelike;

/// How canonical dates are rendered and compared.
///
/// Both variants exist in the field; a deployment picks exactly one and
/// never mixes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// Canonical `month/day`, e.g. `12/25`.
    MonthDay,
    /// Canonical `year/month/day`, e.g. `2026/12/25`.
    YearMonthDay,
}

/// How intake collects a new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeMode {
    /// All fields submitted as one labeled multi-line form.
    Form,
    /// One field asked per message from the start.
    Step,
}

/// How intake recovers from a form with errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionStyle {
    /// Re-emit the entire template with every error listed.
    Resubmit,
    /// Re-request only the first broken field, one at a time.
    FieldByField,
}

/// Top-level bot configuration.
///
/// Loaded once at startup via [`BotConfig::from_env`].
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8000`).
    pub listen_addr: SocketAddr,

    /// PostgreSQL connection string. When unset the service runs on the
    /// in-memory store (local development only).
    pub database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Minimum idle connections in the pool.
    pub database_min_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Messaging channel secret used to verify webhook signatures.
    /// Empty disables verification (local development only).
    pub channel_secret: String,

    /// Messaging channel access token for reply/push delivery.
    /// Empty routes all delivery to the log-only notifier.
    pub channel_access_token: String,

    /// Date rendering style for this deployment.
    pub date_style: DateStyle,

    /// Calendar year the event takes place in; used to validate dates.
    pub event_year: i32,

    /// Months the event runs across (the event window is at most two
    /// months wide in practice).
    pub allowed_months: Vec<u32>,

    /// Enumerated venue roster. Numeric shorthand in submissions is the
    /// 1-based position in this list.
    pub venues: Vec<String>,

    /// Whether intake starts with the bulk form or asks field by field.
    pub intake_mode: IntakeMode,

    /// How form validation errors are corrected.
    pub correction_style: CorrectionStyle,

    /// Whether one owner may hold several open requests at once.
    pub allow_multiple_requests: bool,

    /// Seconds of inactivity after which an intake session is evicted.
    pub session_ttl_secs: u64,
}

impl BotConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()?;

        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 10);
        let database_min_connections = parse_env("DATABASE_MIN_CONNECTIONS", 2);
        let database_connect_timeout_secs = parse_env("DATABASE_CONNECT_TIMEOUT_SECS", 5);

        let channel_secret = std::env::var("LINE_CHANNEL_SECRET").unwrap_or_default();
        let channel_access_token = std::env::var("LINE_CHANNEL_ACCESS_TOKEN").unwrap_or_default();

        let date_style = match std::env::var("DATE_STYLE").ok().as_deref() {
            Some("year-month-day") => DateStyle::YearMonthDay,
            _ => DateStyle::MonthDay,
        };

        let event_year = parse_env("EVENT_YEAR", chrono::Utc::now().year());

        let allowed_months = parse_env_list("EVENT_MONTHS", &[12, 1]);

        let venues = parse_env_list(
            "VENUES",
            &[
                "Hall A".to_string(),
                "Hall B".to_string(),
                "Hall C".to_string(),
            ],
        );

        let intake_mode = match std::env::var("INTAKE_MODE").ok().as_deref() {
            Some("step") => IntakeMode::Step,
            _ => IntakeMode::Form,
        };

        let correction_style = match std::env::var("CORRECTION_STYLE").ok().as_deref() {
            Some("resubmit") => CorrectionStyle::Resubmit,
            _ => CorrectionStyle::FieldByField,
        };

        let allow_multiple_requests = parse_env_bool("ALLOW_MULTIPLE_REQUESTS", false);

        let session_ttl_secs = parse_env("SESSION_TTL_SECS", 1800);

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections,
            database_min_connections,
            database_connect_timeout_secs,
            channel_secret,
            channel_access_token,
            date_style,
            event_year,
            allowed_months,
            venues,
            intake_mode,
            correction_style,
            allow_multiple_requests,
            session_ttl_secs,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("TRUE") | Some("1") => true,
        Some("false") | Some("FALSE") | Some("0") => false,
        _ => default,
    }
}

/// Parses a comma-separated environment variable into a list, returning
/// `default` when missing or empty.
fn parse_env_list<T: std::str::FromStr + Clone>(key: &str, default: &[T]) -> Vec<T> {
    let Ok(raw) = std::env::var(key) else {
        return default.to_vec();
    };
    let parsed: Vec<T> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    if parsed.is_empty() {
        default.to_vec()
    } else {
        parsed
    }
}

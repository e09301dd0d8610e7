//! Configuration module for the calendar backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::fmt::Display;
use std::fs;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_LOOKAHEAD_MINUTES: i64 = 10;
const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PUSH_TTL_SECS: u32 = 3600;

/// VAPID credentials used to sign push requests.
#[derive(Debug, Clone)]
pub struct VapidConfig {
    /// PEM-encoded P-256 private key
    pub private_key: String,
    /// Contact URI sent as the `sub` claim (`mailto:` or `https:`)
    pub subject: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional pre-shared key; when unset, authentication is disabled
    pub api_psk: Option<String>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// Time between notification sweeps
    pub sweep_interval: Duration,
    /// How far ahead the sweep looks for due tasks
    pub lookahead: chrono::Duration,
    /// Per-delivery request timeout
    pub push_timeout: Duration,
    /// TTL in seconds the push service keeps an undelivered message
    pub push_ttl: u32,
    /// Signing credentials; push requests go out unsigned when unset
    pub vapid: Option<VapidConfig>,
    /// Values that were rejected while loading. Logged by `main` once tracing is up.
    pub notices: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let mut notices = Vec::new();

        let api_psk = env::var("CALENDAR_API_PSK")
            .ok()
            .filter(|psk| !psk.is_empty());

        let bind_addr = env::var("CALENDAR_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|e| format!("Invalid CALENDAR_BIND_ADDR: {}", e))?;

        let log_level = env::var("CALENDAR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_json = env::var("CALENDAR_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let sweep_interval = Duration::from_secs(env_number(
            "CALENDAR_SWEEP_INTERVAL_SECS",
            DEFAULT_SWEEP_INTERVAL_SECS,
            1..=86_400,
            &mut notices,
        ));

        // Capped at one day
        let lookahead_minutes = env_number(
            "CALENDAR_LOOKAHEAD_MINUTES",
            DEFAULT_LOOKAHEAD_MINUTES,
            1..=1_440,
            &mut notices,
        );
        let lookahead = chrono::Duration::try_minutes(lookahead_minutes)
            .unwrap_or_else(|| chrono::Duration::minutes(DEFAULT_LOOKAHEAD_MINUTES));

        let push_timeout = Duration::from_secs(env_number(
            "CALENDAR_PUSH_TIMEOUT_SECS",
            DEFAULT_PUSH_TIMEOUT_SECS,
            1..=300,
            &mut notices,
        ));

        // Push services keep messages for at most four weeks
        let push_ttl = env_number(
            "CALENDAR_PUSH_TTL_SECS",
            DEFAULT_PUSH_TTL_SECS,
            0..=2_419_200,
            &mut notices,
        );

        let vapid = load_vapid()?;

        Ok(Self {
            api_psk,
            bind_addr,
            log_level,
            log_json,
            sweep_interval,
            lookahead,
            push_timeout,
            push_ttl,
            vapid,
            notices,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_psk: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log_level: "info".to_string(),
            log_json: false,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            lookahead: chrono::Duration::minutes(DEFAULT_LOOKAHEAD_MINUTES),
            push_timeout: Duration::from_secs(DEFAULT_PUSH_TIMEOUT_SECS),
            push_ttl: DEFAULT_PUSH_TTL_SECS,
            vapid: None,
            notices: Vec::new(),
        }
    }
}

/// Read the VAPID key file and subject. Both must be set together.
fn load_vapid() -> Result<Option<VapidConfig>, String> {
    let key_file = env::var("CALENDAR_VAPID_PRIVATE_KEY_FILE")
        .ok()
        .filter(|path| !path.is_empty());
    let Some(path) = key_file else {
        return Ok(None);
    };

    let private_key = fs::read_to_string(&path)
        .map_err(|e| format!("Cannot read CALENDAR_VAPID_PRIVATE_KEY_FILE {}: {}", path, e))?;
    let subject = env::var("CALENDAR_VAPID_SUBJECT")
        .ok()
        .filter(|subject| !subject.is_empty())
        .ok_or_else(|| {
            "CALENDAR_VAPID_SUBJECT is required when CALENDAR_VAPID_PRIVATE_KEY_FILE is set"
                .to_string()
        })?;

    Ok(Some(VapidConfig {
        private_key,
        subject,
    }))
}

/// Read a numeric variable, falling back to `default` when unset, malformed or outside `valid`.
fn env_number<T>(key: &str, default: T, valid: RangeInclusive<T>, notices: &mut Vec<String>) -> T
where
    T: FromStr + PartialOrd + Copy + Display,
{
    parse_number(key, env::var(key).ok(), default, valid, notices)
}

fn parse_number<T>(
    key: &str,
    raw: Option<String>,
    default: T,
    valid: RangeInclusive<T>,
    notices: &mut Vec<String>,
) -> T
where
    T: FromStr + PartialOrd + Copy + Display,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid.contains(&value) => value,
        Ok(_) => {
            notices.push(format!(
                "Ignoring {}={:?} outside {}..={}, using {}",
                key,
                raw,
                valid.start(),
                valid.end(),
                default
            ));
            default
        }
        Err(_) => {
            notices.push(format!("Ignoring invalid {}={:?}, using {}", key, raw, default));
            default
        }
    }
}

use std::env;

use crate::error::DomainError;

/// Side effects `location_update` applies to the availability record. The
/// observed behavior diverged between a direct upsert and publishing a
/// driver-available event; both stay supported and the choice is explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceMode {
    Upsert,
    Publish,
    Both,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub socket_endpoint: String,
    pub event_buffer_size: usize,
    pub nearest_limit: usize,
    pub offer_ttl_secs: u64,
    pub sample_ttl_secs: u64,
    pub min_dwell_minutes: i64,
    pub presence_mode: PresenceMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            socket_endpoint: "ws://localhost:3000/ws".to_string(),
            event_buffer_size: 1024,
            nearest_limit: 3,
            offer_ttl_secs: 300,
            sample_ttl_secs: 60,
            min_dwell_minutes: 10,
            presence_mode: PresenceMode::Upsert,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, DomainError> {
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let presence_mode = match env::var("PRESENCE_MODE").as_deref() {
            Ok("upsert") | Err(_) => PresenceMode::Upsert,
            Ok("publish") => PresenceMode::Publish,
            Ok("both") => PresenceMode::Both,
            Ok(other) => {
                return Err(DomainError::Internal(format!(
                    "invalid PRESENCE_MODE: {other}"
                )));
            }
        };

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            socket_endpoint: env::var("SOCKET_ENDPOINT").unwrap_or(defaults.socket_endpoint),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
            nearest_limit: parse_or_default("NEAREST_DRIVER_LIMIT", defaults.nearest_limit)?,
            offer_ttl_secs: parse_or_default("OFFER_TTL_SECS", defaults.offer_ttl_secs)?,
            sample_ttl_secs: parse_or_default("TRIP_SAMPLE_TTL_SECS", defaults.sample_ttl_secs)?,
            min_dwell_minutes: parse_or_default("MIN_DWELL_MINUTES", defaults.min_dwell_minutes)?,
            presence_mode,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, DomainError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| DomainError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

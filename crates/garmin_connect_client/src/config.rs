use crate::GarminError;
use crate::credentials::CredentialPaths;
use crate::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://connect.garmin.com";
pub const DEFAULT_TOKEN_DIR: &str = "token";
pub const DEFAULT_DB_PATH: &str = "common.db";

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub credentials: CredentialPaths,
    pub retry: RetryPolicy,
    /// Relative paths resolve against the working directory.
    pub db_path: PathBuf,
    pub metrics_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, GarminError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function. This avoids mutating global environment in tests and keeps
    /// `from_env()` small and safe.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, GarminError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base_url = get("GARMIN_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let token_dir = get("GARMIN_TOKEN_DIR").unwrap_or_else(|| DEFAULT_TOKEN_DIR.into());

        let defaults = RetryPolicy::default();
        let max_attempts = match get("GARMIN_RETRY_ATTEMPTS") {
            Some(v) => parse_value::<u32>("GARMIN_RETRY_ATTEMPTS", &v)?,
            None => defaults.max_attempts,
        };
        if max_attempts == 0 {
            return Err(GarminError::Config(
                "GARMIN_RETRY_ATTEMPTS must be at least 1".into(),
            ));
        }
        let backoff = match get("GARMIN_RETRY_BACKOFF_SECS") {
            Some(v) => Duration::from_secs(parse_value::<u64>("GARMIN_RETRY_BACKOFF_SECS", &v)?),
            None => defaults.backoff,
        };
        let recreate_client = match get("GARMIN_RECREATE_ON_RETRY") {
            Some(v) => parse_bool("GARMIN_RECREATE_ON_RETRY", &v)?,
            None => defaults.recreate_client,
        };

        let db_path = get("GARMIN_SYNC_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.into());
        let metrics_file = get("GARMIN_SYNC_METRICS_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            base_url,
            credentials: CredentialPaths::in_dir(token_dir),
            retry: RetryPolicy {
                max_attempts,
                backoff,
                recreate_client,
            },
            db_path: PathBuf::from(db_path),
            metrics_file,
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, GarminError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| GarminError::Config(format!("{key}: invalid value {raw:?}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, GarminError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GarminError::Config(format!("{key}: invalid value {raw:?}"))),
    }
}

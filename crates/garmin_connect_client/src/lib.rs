//! Minimal `GarminClient` trait, daily statistics model, and the supporting
//! credential, configuration and reconnect plumbing.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod credentials;
pub mod http_client;
pub mod retry;
pub mod utils;

#[derive(Debug, Error)]
pub enum GarminError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("credential error: {0}")]
    Credential(String),
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("decoding error: {0}")]
    Decode(String),
    #[error("not connected: call login first")]
    NotConnected,
    #[error("login failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl GarminError {
    /// Connection refused, rate limiting and rejected credentials: the failures
    /// a fresh login attempt may recover from.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            GarminError::Http(_)
                | GarminError::Auth(_)
                | GarminError::RateLimited(_)
                | GarminError::NotConnected
        )
    }

    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => GarminError::Auth(body),
            429 => GarminError::RateLimited(body),
            _ => GarminError::Status { status, body },
        }
    }
}

/// Who the session belongs to, as returned by a successful login.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct LoginInfo {
    pub display_name: String,
    pub full_name: Option<String>,
}

/// Aggregated health metrics the service reports for one calendar date.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    #[serde(default)]
    pub calendar_date: Option<NaiveDate>,
    #[serde(default, rename = "activeKilocalories")]
    pub active_calories: Option<f64>,
    #[serde(default)]
    pub active_seconds: Option<i64>,
    #[serde(default)]
    pub highly_active_seconds: Option<i64>,
    #[serde(default)]
    pub max_heart_rate: Option<i64>,
    #[serde(default)]
    pub min_heart_rate: Option<i64>,
    #[serde(default)]
    pub max_avg_heart_rate: Option<i64>,
    #[serde(default)]
    pub min_avg_heart_rate: Option<i64>,
    #[serde(default)]
    pub resting_heart_rate: Option<i64>,
    #[serde(default)]
    pub sleeping_seconds: Option<i64>,
}

impl DailyStats {
    /// True when the service answered but reported no metric at all.
    pub fn is_empty(&self) -> bool {
        self.active_calories.is_none()
            && self.active_seconds.is_none()
            && self.highly_active_seconds.is_none()
            && self.max_heart_rate.is_none()
            && self.min_heart_rate.is_none()
            && self.max_avg_heart_rate.is_none()
            && self.min_avg_heart_rate.is_none()
            && self.resting_heart_rate.is_none()
            && self.sleeping_seconds.is_none()
    }
}

#[async_trait]
pub trait GarminClient: Send + Sync + 'static {
    /// Authenticate with the configured credentials and open a session.
    async fn login(&self) -> Result<LoginInfo, GarminError>;

    async fn get_full_name(&self) -> Result<String, GarminError>;

    /// `metric` or `statute_us`, as reported by the user settings.
    async fn get_unit_system(&self) -> Result<String, GarminError>;

    async fn get_heart_rates(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError>;

    async fn get_steps_data(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError>;

    /// Most recent activities, newest first, paged by `start` and `limit`.
    async fn get_activities(
        &self,
        start: u32,
        limit: u32,
    ) -> Result<serde_json::Value, GarminError>;

    /// Daily summary for `date`. `Ok(None)` means the service holds no data
    /// for that day, which is distinct from a failed call.
    async fn get_stats(&self, date: NaiveDate) -> Result<Option<DailyStats>, GarminError>;
}

//! HTTP client implementation for the Garmin Connect API.
//!
//! This module provides a reqwest-based implementation of the [`GarminClient`](crate::GarminClient) trait.

use crate::credentials::Credentials;
use crate::utils::format_day;
use crate::{DailyStats, GarminClient, GarminError, LoginInfo};
use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct Session {
    token: SecretString,
    display_name: String,
}

/// Client for the Garmin Connect API using reqwest.
#[derive(Debug)]
pub struct ReqwestGarminClient {
    base_url: String,
    username: String,
    password: SecretString,
    client: reqwest::Client,
    session: RwLock<Option<Session>>,
}

impl ReqwestGarminClient {
    /// Create a new, not yet logged in, client instance.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the service (e.g., "https://connect.garmin.com")
    /// * `username` - Account login
    /// * `password` - Account password
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: SecretString,
    ) -> Result<Self, GarminError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            password,
            client,
            session: RwLock::new(None),
        })
    }

    pub fn from_credentials(
        base_url: &str,
        credentials: &Credentials,
    ) -> Result<Self, GarminError> {
        Self::new(
            base_url,
            credentials.username.clone(),
            credentials.password.clone(),
        )
    }

    /// Build an authenticated GET request, or fail when no session is open.
    async fn get_request(&self, path: &str) -> Result<reqwest::RequestBuilder, GarminError> {
        let guard = self.session.read().await;
        let session = guard.as_ref().ok_or(GarminError::NotConnected)?;
        let url = format!("{}{}", self.base_url, path);
        Ok(self
            .client
            .get(url)
            .bearer_auth(session.token.expose_secret()))
    }

    async fn display_name(&self) -> Result<String, GarminError> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.display_name.clone())
            .ok_or(GarminError::NotConnected)
    }

    /// Execute a request and expect a JSON response.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GarminError> {
        let resp = request.send().await?;
        self.handle_response(resp).await
    }

    /// Handle a response, converting status codes to appropriate errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, GarminError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(self.error_from_response(resp).await);
        }
        let text = resp.text().await?;
        decode_body(&text)
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> GarminError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();
        GarminError::from_status(status, body_snippet)
    }
}

/// Read body as text first so we can provide a helpful error message when
/// the returned JSON doesn't match the expected shape.
fn decode_body<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, GarminError> {
    serde_json::from_str::<T>(text).map_err(|e| {
        let body_snippet: String = text.chars().take(512).collect();
        GarminError::Decode(format!("{e} - body: {body_snippet}"))
    })
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    display_name: String,
    #[serde(default)]
    full_name: Option<String>,
}

#[async_trait]
impl GarminClient for ReqwestGarminClient {
    async fn login(&self) -> Result<LoginInfo, GarminError> {
        let url = format!("{}/auth/login", self.base_url);
        let body = serde_json::json!({
            "username": self.username,
            "password": self.password.expose_secret(),
        });
        let payload: LoginResponse = self
            .execute_json(self.client.post(url).json(&body))
            .await?;

        let info = LoginInfo {
            display_name: payload.display_name.clone(),
            full_name: payload.full_name,
        };
        *self.session.write().await = Some(Session {
            token: SecretString::new(payload.access_token.into()),
            display_name: payload.display_name,
        });
        Ok(info)
    }

    async fn get_full_name(&self) -> Result<String, GarminError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct SocialProfile {
            full_name: Option<String>,
        }

        let req = self
            .get_request("/userprofile-service/socialProfile")
            .await?;
        let profile: SocialProfile = self.execute_json(req).await?;
        profile
            .full_name
            .ok_or_else(|| GarminError::Decode("missing fullName in social profile".into()))
    }

    async fn get_unit_system(&self) -> Result<String, GarminError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct UserSettings {
            user_data: Option<UserData>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct UserData {
            measurement_system: Option<String>,
        }

        let req = self
            .get_request("/userprofile-service/userprofile/user-settings")
            .await?;
        let settings: UserSettings = self.execute_json(req).await?;
        settings
            .user_data
            .and_then(|d| d.measurement_system)
            .ok_or_else(|| GarminError::Decode("missing measurementSystem in user settings".into()))
    }

    async fn get_heart_rates(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError> {
        let display = self.display_name().await?;
        let path = format!("/wellness-service/wellness/dailyHeartRate/{display}");
        let req = self.get_request(&path).await?;
        self.execute_json(req.query(&[("date", format_day(date))]))
            .await
    }

    async fn get_steps_data(&self, date: NaiveDate) -> Result<serde_json::Value, GarminError> {
        let display = self.display_name().await?;
        let path = format!("/wellness-service/wellness/dailySummaryChart/{display}");
        let req = self.get_request(&path).await?;
        self.execute_json(req.query(&[("date", format_day(date))]))
            .await
    }

    async fn get_activities(
        &self,
        start: u32,
        limit: u32,
    ) -> Result<serde_json::Value, GarminError> {
        let req = self
            .get_request("/activitylist-service/activities/search/activities")
            .await?;
        let qp = [("start", start.to_string()), ("limit", limit.to_string())];
        self.execute_json(req.query(&qp)).await
    }

    async fn get_stats(&self, date: NaiveDate) -> Result<Option<DailyStats>, GarminError> {
        let display = self.display_name().await?;
        let path = format!("/usersummary-service/usersummary/daily/{display}");
        let req = self.get_request(&path).await?;
        let resp = req
            .query(&[("calendarDate", format_day(date))])
            .send()
            .await?;

        match resp.status().as_u16() {
            204 | 404 => {
                tracing::debug!(%date, "no daily summary");
                return Ok(None);
            }
            s if !(200..300).contains(&s) => return Err(self.error_from_response(resp).await),
            _ => {}
        }

        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let stats: Option<DailyStats> = decode_body(&text)?;
        tracing::debug!(%date, "daily summary received");
        Ok(stats.filter(|s| !s.is_empty()))
    }
}

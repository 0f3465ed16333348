//! Shared test utilities and a scripted `GarminClient` used by unit tests.
#![cfg(test)]

use async_trait::async_trait;
use chrono::NaiveDate;
use garmin_connect_client::{DailyStats, GarminClient, GarminError, LoginInfo};
use std::collections::HashMap;
use std::sync::Mutex;

/// What the mock answers for a given day.
#[derive(Clone, Debug)]
pub enum DayScript {
    Stats(DailyStats),
    NoData,
    Fail(&'static str),
}

/// Answers `get_stats` from a per-day script and records every requested day.
/// Days missing from the script answer `NoData`.
#[derive(Default)]
pub struct MockClient {
    script: HashMap<NaiveDate, DayScript>,
    pub calls: Mutex<Vec<NaiveDate>>,
}

impl MockClient {
    pub fn with(mut self, day: NaiveDate, answer: DayScript) -> Self {
        self.script.insert(day, answer);
        self
    }

    pub fn requested_days(&self) -> Vec<NaiveDate> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn stats_for(date: NaiveDate) -> DailyStats {
    DailyStats {
        calendar_date: Some(date),
        active_calories: Some(2100.5),
        active_seconds: Some(3600),
        highly_active_seconds: Some(600),
        max_heart_rate: Some(165),
        min_heart_rate: Some(52),
        sleeping_seconds: Some(25200),
        ..Default::default()
    }
}

#[async_trait]
impl GarminClient for MockClient {
    async fn login(&self) -> Result<LoginInfo, GarminError> {
        Ok(LoginInfo {
            display_name: "test_user".into(),
            full_name: Some("Test User".into()),
        })
    }

    async fn get_full_name(&self) -> Result<String, GarminError> {
        Ok("Test User".into())
    }

    async fn get_unit_system(&self) -> Result<String, GarminError> {
        Ok("metric".into())
    }

    async fn get_heart_rates(&self, _date: NaiveDate) -> Result<serde_json::Value, GarminError> {
        Ok(serde_json::json!({ "restingHeartRate": 54 }))
    }

    async fn get_steps_data(&self, _date: NaiveDate) -> Result<serde_json::Value, GarminError> {
        Err(GarminError::RateLimited("steps throttled".into()))
    }

    async fn get_activities(
        &self,
        _start: u32,
        _limit: u32,
    ) -> Result<serde_json::Value, GarminError> {
        Ok(serde_json::json!([]))
    }

    async fn get_stats(&self, date: NaiveDate) -> Result<Option<DailyStats>, GarminError> {
        self.calls.lock().unwrap().push(date);
        match self.script.get(&date).cloned().unwrap_or(DayScript::NoData) {
            DayScript::Stats(s) => Ok(Some(s)),
            DayScript::NoData => Ok(None),
            DayScript::Fail(msg) => Err(GarminError::Status {
                status: 500,
                body: msg.into(),
            }),
        }
    }
}

//! The day loop: fetch one daily summary per calendar day and persist it.

use crate::error::SyncResult;
use crate::store::{InsertOutcome, LocalStore, NewRecord};
use chrono::NaiveDate;
use garmin_connect_client::GarminClient;
use garmin_connect_client::utils::{day_range, days_between};
use serde::Serialize;

pub const DAYS_METRIC: &str = "garmin_sync_days_total";

/// What happened to a single day of the range.
#[derive(Debug, Clone, PartialEq)]
pub enum DayOutcome {
    Inserted(i64),
    Duplicate,
    NoData,
    /// The fetch failed after connecting; the day was skipped.
    FetchFailed(String),
}

impl DayOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DayOutcome::Inserted(_) => "inserted",
            DayOutcome::Duplicate => "duplicate",
            DayOutcome::NoData => "no_data",
            DayOutcome::FetchFailed(_) => "fetch_failed",
        }
    }
}

/// Per-run tally. Absorbed fetch failures are counted here rather than lost.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub days: u64,
    pub inserted: u64,
    pub duplicates: u64,
    pub no_data: u64,
    pub fetch_failed: u64,
    pub failed_days: Vec<NaiveDate>,
}

impl SyncReport {
    fn record(&mut self, day: NaiveDate, outcome: &DayOutcome) {
        self.days += 1;
        match outcome {
            DayOutcome::Inserted(_) => self.inserted += 1,
            DayOutcome::Duplicate => self.duplicates += 1,
            DayOutcome::NoData => self.no_data += 1,
            DayOutcome::FetchFailed(_) => {
                self.fetch_failed += 1;
                self.failed_days.push(day);
            }
        }
        metrics::counter!(DAYS_METRIC, "outcome" => outcome.label()).increment(1);
    }

    /// True when every day was either stored, already present, or empty upstream.
    pub fn is_clean(&self) -> bool {
        self.fetch_failed == 0
    }
}

/// Fetch and store a single day. Fetch errors are absorbed into
/// [`DayOutcome::FetchFailed`]; store errors other than a duplicate date
/// propagate.
pub async fn sync_day<C>(client: &C, store: &LocalStore, day: NaiveDate) -> SyncResult<DayOutcome>
where
    C: GarminClient + ?Sized,
{
    let stats = match client.get_stats(day).await {
        Ok(Some(stats)) => stats,
        Ok(None) => {
            tracing::info!(%day, "no data for day");
            return Ok(DayOutcome::NoData);
        }
        Err(e) => {
            tracing::error!(%day, error = %e, "fetch failed; skipping day");
            return Ok(DayOutcome::FetchFailed(e.to_string()));
        }
    };

    if let Some(reported) = stats.calendar_date.filter(|r| *r != day) {
        tracing::warn!(
            %day,
            %reported,
            "service answered for another date; keeping the requested one"
        );
    }

    let record = NewRecord::from_stats(day, &stats);
    Ok(match store.insert(&record).await? {
        InsertOutcome::Inserted(id) => DayOutcome::Inserted(id),
        InsertOutcome::Duplicate => DayOutcome::Duplicate,
    })
}

/// Sync every day of `[start, end)` in ascending order, strictly one after
/// another.
pub async fn sync_range<C>(
    client: &C,
    store: &LocalStore,
    start: NaiveDate,
    end: NaiveDate,
) -> SyncResult<SyncReport>
where
    C: GarminClient + ?Sized,
{
    tracing::info!(%start, %end, days = days_between(start, end), "sync starts");
    let mut report = SyncReport::default();
    for day in day_range(start, end) {
        let outcome = sync_day(client, store, day).await?;
        report.record(day, &outcome);
    }
    tracing::info!(
        days = report.days,
        inserted = report.inserted,
        duplicates = report.duplicates,
        no_data = report.no_data,
        fetch_failed = report.fetch_failed,
        "sync ends"
    );
    Ok(report)
}

/// Everything the service knows about one day, for manual inspection.
/// Individual call failures are reported inline instead of aborting.
pub async fn inspect_day<C>(client: &C, day: NaiveDate) -> serde_json::Value
where
    C: GarminClient + ?Sized,
{
    fn or_error<T: Serialize>(
        r: Result<T, garmin_connect_client::GarminError>,
    ) -> serde_json::Value {
        match r {
            Ok(v) => serde_json::to_value(v).unwrap_or(serde_json::Value::Null),
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        }
    }

    serde_json::json!({
        "date": day,
        "stats": or_error(client.get_stats(day).await),
        "heart_rates": or_error(client.get_heart_rates(day).await),
        "steps": or_error(client.get_steps_data(day).await),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{DayScript, MockClient, day, stats_for};

    async fn store() -> LocalStore {
        let store = LocalStore::open_in_memory().await.expect("db");
        store.create_table_if_absent().await.expect("table");
        store
    }

    #[tokio::test]
    async fn one_fetch_per_day_in_ascending_order() {
        let client = MockClient::default();
        let store = store().await;
        let (start, end) = (day(2021, 9, 28), day(2021, 10, 3));

        let report = sync_range(&client, &store, start, end).await.expect("sync");

        assert_eq!(
            client.requested_days(),
            vec![
                day(2021, 9, 28),
                day(2021, 9, 29),
                day(2021, 9, 30),
                day(2021, 10, 1),
                day(2021, 10, 2)
            ]
        );
        assert_eq!(report.days, 5);
        assert_eq!(report.no_data, 5);
    }

    #[tokio::test]
    async fn empty_range_makes_no_calls() {
        let client = MockClient::default();
        let store = store().await;
        let report = sync_range(&client, &store, day(2021, 10, 8), day(2021, 10, 8))
            .await
            .expect("sync");
        assert!(client.requested_days().is_empty());
        assert_eq!(report, SyncReport::default());
    }

    #[tokio::test]
    async fn failures_and_gaps_do_not_abort_the_loop() {
        let client = MockClient::default()
            .with(day(2021, 10, 7), DayScript::Stats(stats_for(day(2021, 10, 7))))
            .with(day(2021, 10, 8), DayScript::Fail("boom"))
            .with(day(2021, 10, 9), DayScript::NoData)
            .with(day(2021, 10, 10), DayScript::Stats(stats_for(day(2021, 10, 10))));
        let store = store().await;

        let report = sync_range(&client, &store, day(2021, 10, 7), day(2021, 10, 11))
            .await
            .expect("sync");

        assert_eq!(report.days, 4);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.fetch_failed, 1);
        assert_eq!(report.no_data, 1);
        assert_eq!(report.failed_days, vec![day(2021, 10, 8)]);
        assert!(!report.is_clean());

        let dates: Vec<_> = store
            .select_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec![day(2021, 10, 7), day(2021, 10, 10)]);
    }

    #[tokio::test]
    async fn rerun_counts_duplicates_and_keeps_one_row() {
        let d = day(2021, 10, 8);
        let client = MockClient::default().with(d, DayScript::Stats(stats_for(d)));
        let store = store().await;

        let first = sync_range(&client, &store, d, day(2021, 10, 9)).await.unwrap();
        let second = sync_range(&client, &store, d, day(2021, 10, 9)).await.unwrap();

        assert_eq!(first.inserted, 1);
        assert_eq!(second.duplicates, 1);
        assert_eq!(second.inserted, 0);
        assert_eq!(store.count().await.unwrap(), 1);
        let row = &store.select_all().await.unwrap()[0];
        assert_eq!(row.active_calories, Some(2100.5));
        assert_eq!(row.min_heart_rate, Some(52));
    }

    #[tokio::test]
    async fn mismatched_calendar_date_is_stored_under_requested_day() {
        let requested = day(2021, 10, 8);
        let client = MockClient::default()
            .with(requested, DayScript::Stats(stats_for(day(2021, 10, 7))));
        let store = store().await;

        let outcome = sync_day(&client, &store, requested).await.unwrap();

        assert!(matches!(outcome, DayOutcome::Inserted(_)));
        assert_eq!(store.select_all().await.unwrap()[0].date, requested);
    }

    #[tokio::test]
    async fn inspect_reports_errors_inline() {
        let d = day(2021, 9, 26);
        let client = MockClient::default().with(d, DayScript::Stats(stats_for(d)));

        let v = inspect_day(&client, d).await;

        assert_eq!(v["date"], "2021-09-26");
        assert_eq!(v["stats"]["activeKilocalories"], 2100.5);
        assert_eq!(v["heart_rates"]["restingHeartRate"], 54);
        assert!(v["steps"]["error"].as_str().unwrap().contains("rate limited"));
    }
}

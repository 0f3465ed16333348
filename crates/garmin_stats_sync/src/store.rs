//! SQLite-backed store for daily statistics, one row per calendar date.

use crate::error::SyncResult;
use chrono::NaiveDate;
use garmin_connect_client::DailyStats;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

pub const MAIN_TABLE: &str = "main_table";

const CREATE_MAIN_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS main_table (
  id             INTEGER PRIMARY KEY AUTOINCREMENT,
  date           TEXT    NOT NULL UNIQUE,
  actCalories    REAL,
  actSeconds     INTEGER,
  highActSeconds INTEGER,
  maxHr          INTEGER,
  maxAvgHr       INTEGER,
  minHr          INTEGER,
  minAvgHr       INTEGER,
  restHr         INTEGER,
  sleepSeconds   INTEGER
)
"#;

/// A persisted row of `main_table`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StoredRecord {
    pub id: i64,
    pub date: NaiveDate,
    #[sqlx(rename = "actCalories")]
    pub active_calories: Option<f64>,
    #[sqlx(rename = "actSeconds")]
    pub active_seconds: Option<i64>,
    #[sqlx(rename = "highActSeconds")]
    pub highly_active_seconds: Option<i64>,
    #[sqlx(rename = "maxHr")]
    pub max_heart_rate: Option<i64>,
    #[sqlx(rename = "maxAvgHr")]
    pub max_avg_heart_rate: Option<i64>,
    #[sqlx(rename = "minHr")]
    pub min_heart_rate: Option<i64>,
    #[sqlx(rename = "minAvgHr")]
    pub min_avg_heart_rate: Option<i64>,
    #[sqlx(rename = "restHr")]
    pub resting_heart_rate: Option<i64>,
    #[sqlx(rename = "sleepSeconds")]
    pub sleeping_seconds: Option<i64>,
}

/// For inserting new records (without id)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewRecord {
    pub date: NaiveDate,
    pub active_calories: Option<f64>,
    pub active_seconds: Option<i64>,
    pub highly_active_seconds: Option<i64>,
    pub max_heart_rate: Option<i64>,
    pub max_avg_heart_rate: Option<i64>,
    pub min_heart_rate: Option<i64>,
    pub min_avg_heart_rate: Option<i64>,
    pub resting_heart_rate: Option<i64>,
    pub sleeping_seconds: Option<i64>,
}

impl NewRecord {
    pub fn from_stats(date: NaiveDate, stats: &DailyStats) -> Self {
        Self {
            date,
            active_calories: stats.active_calories,
            active_seconds: stats.active_seconds,
            highly_active_seconds: stats.highly_active_seconds,
            max_heart_rate: stats.max_heart_rate,
            max_avg_heart_rate: stats.max_avg_heart_rate,
            min_heart_rate: stats.min_heart_rate,
            min_avg_heart_rate: stats.min_avg_heart_rate,
            resting_heart_rate: stats.resting_heart_rate,
            sleeping_seconds: stats.sleeping_seconds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(i64),
    /// A row for the date already existed; nothing was written.
    Duplicate,
}

/// Application store holding the database connection pool
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Open (creating if missing) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(Self { pool })
    }

    /// Private in-memory database.
    ///
    /// Uses max_connections(1) so every query sees the same in-memory
    /// database instead of a fresh one per pooled connection.
    pub async fn open_in_memory() -> SyncResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub async fn create_table_if_absent(&self) -> SyncResult<()> {
        sqlx::query(CREATE_MAIN_TABLE).execute(&self.pool).await?;
        tracing::debug!(table = MAIN_TABLE, "table ready");
        Ok(())
    }

    /// Insert one record in its own transaction. A row for an existing date
    /// rolls the transaction back and yields [`InsertOutcome::Duplicate`].
    pub async fn insert(&self, record: &NewRecord) -> SyncResult<InsertOutcome> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO main_table (
              date, actCalories, actSeconds, highActSeconds,
              maxHr, maxAvgHr, minHr, minAvgHr, restHr, sleepSeconds
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(record.date)
        .bind(record.active_calories)
        .bind(record.active_seconds)
        .bind(record.highly_active_seconds)
        .bind(record.max_heart_rate)
        .bind(record.max_avg_heart_rate)
        .bind(record.min_heart_rate)
        .bind(record.min_avg_heart_rate)
        .bind(record.resting_heart_rate)
        .bind(record.sleeping_seconds)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(done) => {
                tx.commit().await?;
                let id = done.last_insert_rowid();
                tracing::info!(date = %record.date, id, table = MAIN_TABLE, "record committed");
                Ok(InsertOutcome::Inserted(id))
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                tx.rollback().await?;
                tracing::warn!(date = %record.date, "item already in db");
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => {
                tx.rollback().await?;
                tracing::error!(date = %record.date, error = %e, "can not insert into main table");
                Err(e.into())
            }
        }
    }

    /// Every stored row, oldest date first.
    pub async fn select_all(&self) -> SyncResult<Vec<StoredRecord>> {
        let rows = sqlx::query_as::<_, StoredRecord>(
            r#"
            SELECT id, date, actCalories, actSeconds, highActSeconds,
                   maxHr, maxAvgHr, minHr, minAvgHr, restHr, sleepSeconds
            FROM main_table
            ORDER BY date ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> SyncResult<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM main_table")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn close(self) {
        self.pool.close().await;
        tracing::debug!("database closed");
    }
}

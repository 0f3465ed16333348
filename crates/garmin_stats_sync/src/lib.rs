//! Batch job that copies daily statistics from Garmin Connect into a local
//! SQLite table, one row per calendar date.

pub mod cli;
pub mod error;
pub mod observability;
pub mod store;
pub mod sync;
mod test_utils;

use cli::Command;
use error::{SyncError, SyncResult};
use garmin_connect_client::config::Config;
use garmin_connect_client::credentials::Credentials;
use garmin_connect_client::http_client::ReqwestGarminClient;
use garmin_connect_client::retry::{ClientFactory, Reconnector};
use garmin_connect_client::GarminClient;
use metrics_exporter_prometheus::PrometheusHandle;
use store::LocalStore;

/// Exit status when the login retry budget is exhausted.
pub const SERVICE_UNAVAILABLE_EXIT: i32 = 503;
pub const STARTUP_FAILURE_EXIT: i32 = 1;
pub const USAGE_EXIT: i32 = 2;

pub fn exit_code(err: &SyncError) -> i32 {
    match err {
        e if e.is_unreachable() => SERVICE_UNAVAILABLE_EXIT,
        SyncError::Usage(_) => USAGE_EXIT,
        _ => STARTUP_FAILURE_EXIT,
    }
}

/// Build the reconnecting client from the credential files. Credentials are
/// read once here; the factory rebuilds clients from that copy.
pub fn connector(cfg: &Config) -> SyncResult<Reconnector<ReqwestGarminClient>> {
    let credentials = Credentials::load(&cfg.credentials)?;
    let base_url = cfg.base_url.clone();
    let factory: ClientFactory<ReqwestGarminClient> =
        Box::new(move || ReqwestGarminClient::from_credentials(&base_url, &credentials));
    Ok(Reconnector::new(cfg.retry.clone(), factory)?)
}

async fn open_store(cfg: &Config) -> SyncResult<LocalStore> {
    let store = LocalStore::open(&cfg.db_path).await?;
    store.create_table_if_absent().await?;
    Ok(store)
}

/// Log who we are connected as. Purely informational, so failures only warn.
async fn log_account<C: GarminClient + ?Sized>(client: &C) {
    match client.get_full_name().await {
        Ok(name) => tracing::info!(%name, "connected account"),
        Err(e) => tracing::warn!(error = %e, "full name unavailable"),
    }
    match client.get_unit_system().await {
        Ok(units) => tracing::debug!(%units, "unit system"),
        Err(e) => tracing::warn!(error = %e, "unit system unavailable"),
    }
}

pub async fn run(
    cmd: Command,
    cfg: &Config,
    metrics: Option<&PrometheusHandle>,
) -> SyncResult<()> {
    match cmd {
        Command::List => {
            let store = open_store(cfg).await?;
            for row in store.select_all().await? {
                println!("{}", serde_json::to_string(&row)?);
            }
            store.close().await;
        }
        Command::Inspect { day } => {
            let mut conn = connector(cfg)?;
            conn.connect().await?;
            let report = sync::inspect_day(conn.client(), day).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Sync { start, end } => {
            let mut conn = connector(cfg)?;
            conn.connect().await?;
            log_account(conn.client()).await;

            let store = open_store(cfg).await?;
            let report = sync::sync_range(conn.client(), &store, start, end).await;
            store.close().await;
            let report = report?;

            if !report.is_clean() {
                tracing::warn!(failed_days = ?report.failed_days, "some days could not be fetched");
            }
            if let (Some(handle), Some(path)) = (metrics, cfg.metrics_file.as_deref()) {
                if let Err(e) = observability::write_metrics_file(handle, path) {
                    tracing::warn!(error = %e, "could not write metrics file");
                }
            }
        }
    }
    Ok(())
}

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;

pub const DEFAULT_LOG_FILTER: &str = "info,sqlx=warn";

/// Filter from `GARMIN_SYNC_LOG_LEVEL`, falling back to `RUST_LOG`, then `info`.
pub fn log_filter_from_env() -> String {
    std::env::var("GARMIN_SYNC_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string())
}

pub fn init_tracing(log_env: &str) {
    // Keep sqlx statement logging quiet unless asked for explicitly.
    let combined_filter = format!("{log_env},sqlx=warn");
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
}

/// Install the global Prometheus recorder so run counters are collected.
pub fn install_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "metrics recorder not installed");
            None
        }
    }
}

/// Write the exposition text for a node-exporter style textfile collector.
/// The file is replaced atomically so scrapers never read a partial write.
pub fn write_metrics_file(handle: &PrometheusHandle, path: &Path) -> std::io::Result<()> {
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, handle.render())?;
    std::fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), "metrics written");
    Ok(())
}

use garmin_connect_client::config::Config;
use garmin_stats_sync::cli::Command;
use garmin_stats_sync::{exit_code, observability, run};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok(); // Load .env file if present

    let log_env = observability::log_filter_from_env();
    observability::init_tracing(&log_env);
    tracing::info!(%log_env, "garmin_stats_sync: log filter");

    let cmd = match Command::parse(std::env::args().skip(1)) {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(exit_code(&e));
        }
    };

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration; aborting startup");
            std::process::exit(garmin_stats_sync::STARTUP_FAILURE_EXIT);
        }
    };

    let metrics = observability::install_metrics();

    tracing::info!(?cmd, "garmin_stats_sync: starts");
    if let Err(e) = run(cmd, &cfg, metrics.as_ref()).await {
        let code = exit_code(&e);
        tracing::error!(error = %e, code, "garmin_stats_sync: failed");
        std::process::exit(code);
    }
    tracing::info!("garmin_stats_sync: ends");
}

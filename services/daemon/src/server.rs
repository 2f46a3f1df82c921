use crate::cli::RunArgs;
use crate::infra::{build_tracker, AppState};
use crate::routes::status_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use legis_tracker::config::AppConfig;
use legis_tracker::error::AppError;
use legis_tracker::telemetry;
use legis_tracker::tracker::{run_tracker, HistoryMode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

pub(crate) async fn run(mut args: RunArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = status_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(?config.environment, %addr, "status server listening");

    let status_server = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!(error = %err, "status server stopped");
        }
    });

    let mut tracker = build_tracker(&config)?;
    let cycles = run_tracker(
        &mut tracker,
        args.history_mode(),
        &config.tracker,
        &readiness_flag,
        shutdown_signal(),
    )
    .await?;

    readiness_flag.store(false, Ordering::Release);
    status_server.abort();
    info!(cycles, bills = tracker.bills().len(), "bill tracker stopped");
    Ok(())
}

pub(crate) async fn backfill() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let mut tracker = build_tracker(&config)?;
    if let Some(report) = tracker.startup(HistoryMode::Force).await? {
        println!(
            "Backfill complete: {} sessions, {} bills ({} new), saved: {}",
            report.sessions_fetched, report.bills_processed, report.new_bills, report.saved
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl-c handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
}

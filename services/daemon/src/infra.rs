use legis_tracker::bills::{EnactedTextDirectory, JsonFileStore};
use legis_tracker::config::AppConfig;
use legis_tracker::feed::{FeedError, LegisInfoClient};
use legis_tracker::tracker::{BillTracker, TracingNotifier};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type DaemonTracker = BillTracker<LegisInfoClient, JsonFileStore, TracingNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires the LEGISinfo client, the JSON store and the logging notifier.
pub(crate) fn build_tracker(config: &AppConfig) -> Result<DaemonTracker, FeedError> {
    let feed = LegisInfoClient::new(&config.feed)?;
    let store = JsonFileStore::new(config.tracker.db_path.clone());
    let tracker = BillTracker::new(feed, store, TracingNotifier, config.tracker.history.clone());

    Ok(match &config.tracker.enacted_text_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "reading enacted texts from directory");
            tracker.with_enacted_texts(Box::new(EnactedTextDirectory::new(dir.clone())))
        }
        None => tracker,
    })
}

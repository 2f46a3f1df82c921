use super::{BillTracker, ChangeNotifier, HistoryMode};
use crate::bills::{BillStore, StoreError};
use crate::config::TrackerConfig;
use crate::feed::BillFeed;
use metrics::counter;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

/// Loads the store, runs any startup backfill, then polls until `shutdown`.
///
/// `shutdown` is watched from the start, so an interrupt during the backfill
/// returns zero cycles with nothing saved by the interrupted backfill.
pub async fn run_tracker<F, S, N, D>(
    tracker: &mut BillTracker<F, S, N>,
    mode: HistoryMode,
    schedule: &TrackerConfig,
    ready: &AtomicBool,
    shutdown: D,
) -> Result<usize, StoreError>
where
    F: BillFeed,
    S: BillStore,
    N: ChangeNotifier,
    D: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let backfill = tokio::select! {
        result = tracker.startup(mode) => result?,
        _ = &mut shutdown => {
            info!("shutdown requested during startup; daemon stopped");
            return Ok(0);
        }
    };
    if let Some(report) = backfill {
        info!(
            sessions = report.sessions_fetched,
            bills = report.bills_processed,
            "startup backfill finished"
        );
    }

    Ok(run_daemon(tracker, schedule, ready, shutdown).await)
}

/// Runs poll cycles until `shutdown` resolves and returns the number of cycles run.
///
/// `ready` flips to true after the first successful cycle. A failed cycle is
/// retried after `retry_delay` instead of the full poll interval. Shutdown is
/// only observed between cycles.
pub async fn run_daemon<F, S, N, D>(
    tracker: &mut BillTracker<F, S, N>,
    schedule: &TrackerConfig,
    ready: &AtomicBool,
    shutdown: D,
) -> usize
where
    F: BillFeed,
    S: BillStore,
    N: ChangeNotifier,
    D: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut cycles = 0;

    info!(
        interval_secs = schedule.poll_interval.as_secs(),
        "bill tracker daemon started"
    );

    loop {
        let delay = match tracker.run_cycle().await {
            Ok(_) => {
                ready.store(true, Ordering::SeqCst);
                schedule.poll_interval
            }
            Err(err) => {
                counter!("legis_cycle_failures_total").increment(1);
                error!(
                    error = %err,
                    retry_secs = schedule.retry_delay.as_secs(),
                    "poll cycle failed"
                );
                schedule.retry_delay
            }
        };
        cycles += 1;

        info!(sleep_secs = delay.as_secs(), "waiting for next poll");
        tokio::select! {
            _ = &mut shutdown => {
                info!(cycles, "shutdown requested; daemon stopped");
                return cycles;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

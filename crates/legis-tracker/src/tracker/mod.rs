//! Polling orchestration: fetch, diff, sweep, enrich, persist, notify.

mod daemon;
mod notify;

pub use daemon::{run_daemon, run_tracker};
pub use notify::{BillChange, ChangeKind, ChangeNotifier, NotifyError, TracingNotifier};

use crate::bills::{
    detect_parliament, lifecycle, parliament_of, process_enacted_bill, BillKey, BillRecord,
    BillStore, EnactedTextSource, ParliamentTracker, StoreError,
};
use crate::config::HistoryConfig;
use crate::feed::{BillFeed, FeedError, RawBill, SessionPage};
use metrics::{counter, gauge};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, error, info, warn};

/// Below this many stored bills, startup treats the store as unpopulated.
pub const SPARSE_STORE_THRESHOLD: usize = 10;

/// Whether startup should pull historical sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    Skip,
    #[default]
    WhenSparse,
    Force,
}

/// Summary of one polling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub parliament: Option<u32>,
    pub fetched: usize,
    pub dropped: usize,
    pub skipped: usize,
    pub processed: usize,
    pub new_bills: usize,
    pub changed: usize,
    pub died: usize,
    pub enactments_processed: usize,
    pub saved: bool,
}

/// Summary of a historical backfill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub sessions_fetched: usize,
    pub bills_processed: usize,
    pub new_bills: usize,
    pub dropped: usize,
    pub saved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Changed,
    Unchanged,
}

/// Owns the bill collection and drives it from a feed.
pub struct BillTracker<F, S, N> {
    feed: F,
    store: S,
    notifier: N,
    enacted_texts: Option<Box<dyn EnactedTextSource>>,
    history: HistoryConfig,
    bills: BTreeMap<BillKey, BillRecord>,
    parliament: ParliamentTracker,
}

impl<F, S, N> BillTracker<F, S, N>
where
    F: BillFeed,
    S: BillStore,
    N: ChangeNotifier,
{
    pub fn new(feed: F, store: S, notifier: N, history: HistoryConfig) -> Self {
        Self {
            feed,
            store,
            notifier,
            enacted_texts: None,
            history,
            bills: BTreeMap::new(),
            parliament: ParliamentTracker::new(),
        }
    }

    pub fn with_enacted_texts(mut self, source: Box<dyn EnactedTextSource>) -> Self {
        self.enacted_texts = Some(source);
        self
    }

    pub fn bills(&self) -> &BTreeMap<BillKey, BillRecord> {
        &self.bills
    }

    pub fn bill(&self, key: &BillKey) -> Option<&BillRecord> {
        self.bills.get(key)
    }

    pub fn current_parliament(&self) -> Option<u32> {
        self.parliament.current()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the stored collection and runs a backfill when `mode` asks for one.
    ///
    /// A store that cannot be read is an error; an absent one is an empty start.
    pub async fn startup(
        &mut self,
        mode: HistoryMode,
    ) -> Result<Option<BackfillReport>, StoreError> {
        let stored = self.store.load()?;
        let existed = stored.is_some();
        if let Some(collection) = stored {
            self.bills = collection.bills;
            info!(
                bills = self.bills.len(),
                last_updated = ?collection.last_updated,
                "loaded stored bills"
            );
        } else {
            info!("no stored bills found; starting empty");
        }
        gauge!("legis_bills_tracked").set(self.bills.len() as f64);

        let backfill = match mode {
            HistoryMode::Skip => false,
            HistoryMode::Force => true,
            HistoryMode::WhenSparse => !existed || self.bills.len() < SPARSE_STORE_THRESHOLD,
        };

        if !backfill {
            return Ok(None);
        }
        Ok(Some(self.backfill().await))
    }

    /// Polls the current listing once and applies it to the collection.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, FeedError> {
        let batch = self.feed.fetch_current().await?;
        counter!("legis_cycles_total").increment(1);

        let mut report = CycleReport {
            fetched: batch.bills.len(),
            dropped: batch.dropped,
            ..CycleReport::default()
        };
        self.record_dropped(batch.dropped);

        let detected = detect_parliament(batch.bills.iter().map(|bill| bill.session.as_str()));
        let Some(parliament) = self.parliament.observe(detected) else {
            warn!(
                fetched = report.fetched,
                "no parliament could be detected from the feed; skipping cycle"
            );
            return Ok(report);
        };
        report.parliament = Some(parliament);
        gauge!("legis_current_parliament").set(f64::from(parliament));

        let mut changes = Vec::new();
        let mut seen = HashSet::new();

        for raw in &batch.bills {
            if parliament_of(&raw.session) != Some(parliament) {
                debug!(
                    bill = %raw.key(),
                    parliament,
                    "skipping bill outside the tracked parliament"
                );
                report.skipped += 1;
                continue;
            }

            seen.insert(raw.key());
            report.processed += 1;
            match self.process_bill(raw, true, &mut changes) {
                Outcome::Created => report.new_bills += 1,
                Outcome::Changed => report.changed += 1,
                Outcome::Unchanged => {}
            }
        }

        for key in lifecycle::sweep(&mut self.bills, parliament, &seen) {
            if let Some(record) = self.bills.get(&key) {
                changes.push(change_for(record, ChangeKind::DiedWithoutPassing));
            }
            report.died += 1;
        }

        report.enactments_processed = self.enrich_enacted(&mut changes);
        report.saved = self.persist();
        self.publish(&changes);

        counter!("legis_bill_changes_total").increment(report.changed as u64);
        counter!("legis_bills_died_total").increment(report.died as u64);
        gauge!("legis_bills_tracked").set(self.bills.len() as f64);

        info!(
            parliament,
            processed = report.processed,
            new = report.new_bills,
            changed = report.changed,
            died = report.died,
            "poll cycle complete"
        );
        Ok(report)
    }

    /// Walks historical sessions and records every bill found, without announcing them.
    ///
    /// A parliament's scan stops at the first session that is missing, empty,
    /// undecodable or unreachable. The collection is saved once at the end.
    pub async fn backfill(&mut self) -> BackfillReport {
        let mut report = BackfillReport::default();
        let parliaments = self.history.parliaments.clone();
        info!(
            first = *parliaments.start(),
            last = *parliaments.end(),
            "historical backfill started"
        );

        for parliament in parliaments {
            for session in 1..=self.history.max_sessions {
                let batch = match self.feed.fetch_session(parliament, session).await {
                    Ok(SessionPage::Found(batch)) => batch,
                    Ok(SessionPage::NotFound) => {
                        debug!(parliament, session, "session not published; next parliament");
                        break;
                    }
                    Err(FeedError::Decode(err)) => {
                        warn!(
                            parliament,
                            session,
                            error = %err,
                            "session listing could not be decoded; next parliament"
                        );
                        break;
                    }
                    Err(err) => {
                        warn!(
                            parliament,
                            session,
                            error = %err,
                            "session fetch failed; next parliament"
                        );
                        break;
                    }
                };

                report.dropped += batch.dropped;
                self.record_dropped(batch.dropped);
                if batch.is_empty() {
                    debug!(parliament, session, "session listing empty; next parliament");
                    break;
                }

                report.sessions_fetched += 1;
                let mut ignored = Vec::new();
                for raw in &batch.bills {
                    report.bills_processed += 1;
                    if self.process_bill(raw, false, &mut ignored) == Outcome::Created {
                        report.new_bills += 1;
                    }
                }
                info!(parliament, session, bills = batch.bills.len(), "historical session loaded");

                tokio::time::sleep(self.history.request_delay).await;
            }
        }

        report.saved = self.persist();
        gauge!("legis_bills_tracked").set(self.bills.len() as f64);
        info!(
            sessions = report.sessions_fetched,
            bills = report.bills_processed,
            new = report.new_bills,
            "historical backfill complete"
        );
        report
    }

    fn process_bill(
        &mut self,
        raw: &RawBill,
        announce: bool,
        changes: &mut Vec<BillChange>,
    ) -> Outcome {
        let key = raw.key();
        let created = !self.bills.contains_key(&key);
        let record = self
            .bills
            .entry(key)
            .or_insert_with_key(|key| BillRecord::new(key.clone(), raw.title.clone()));

        record.merge_metadata(raw.metadata());
        let previous = record
            .current_state()
            .map(|state| (state.status_text().to_string(), state.stage()));

        if !record.update(raw.status_update()) {
            return Outcome::Unchanged;
        }

        let Some(current) = record.current_state() else {
            return Outcome::Unchanged;
        };
        let status = current.status_text().to_string();
        let stage = current.stage();
        let text_changed = current.text_changed();

        if created {
            if announce {
                changes.push(change_for(record, ChangeKind::NewBill { status, stage }));
            } else {
                debug!(bill = %record.key(), "historical bill recorded");
            }
            return Outcome::Created;
        }

        if let Some((previous_status, previous_stage)) = previous {
            changes.push(change_for(
                record,
                ChangeKind::StatusChanged {
                    previous_status,
                    status,
                    previous_stage,
                    stage,
                    text_changed,
                },
            ));
        }
        Outcome::Changed
    }

    fn enrich_enacted(&mut self, changes: &mut Vec<BillChange>) -> usize {
        let Some(source) = self.enacted_texts.as_deref() else {
            return 0;
        };

        let mut processed = 0;
        for (key, record) in self.bills.iter_mut() {
            if !record.is_enacted() || record.enactment_processed() {
                continue;
            }

            let enacted = match source.enacted_text(key) {
                Ok(Some(enacted)) => enacted,
                Ok(None) => continue,
                Err(err) => {
                    warn!(bill = %key, error = %err, "enacted text unavailable");
                    continue;
                }
            };

            if process_enacted_bill(record, &enacted) {
                processed += 1;
                changes.push(change_for(
                    record,
                    ChangeKind::EnactmentProcessed {
                        chapter_citation: record.chapter_citation().map(str::to_string),
                        cif_status: record.cif_status(),
                    },
                ));
            }
        }
        processed
    }

    fn persist(&self) -> bool {
        match self.store.save(&self.bills) {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, "failed to save bills; keeping in-memory state");
                false
            }
        }
    }

    fn publish(&self, changes: &[BillChange]) {
        for change in changes {
            if let Err(err) = self.notifier.publish(change) {
                warn!(
                    bill = %change.key,
                    event = change.kind.name(),
                    error = %err,
                    "notification failed"
                );
            }
        }
    }

    fn record_dropped(&self, dropped: usize) {
        if dropped > 0 {
            warn!(dropped, "feed records without bill number or session were dropped");
            counter!("legis_feed_records_dropped_total").increment(dropped as u64);
        }
    }
}

fn change_for(record: &BillRecord, kind: ChangeKind) -> BillChange {
    BillChange {
        key: record.key().clone(),
        title: record.title.clone(),
        kind,
    }
}

use super::domain::BillKey;
use super::record::BillRecord;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

/// Marks bills from earlier parliaments that are no longer in the feed as dead.
///
/// Enacted bills are law and never die. The rule is a heuristic: an old bill
/// missing from a single partial response is treated the same as one that
/// lapsed when its parliament ended.
pub fn sweep(
    records: &mut BTreeMap<BillKey, BillRecord>,
    current_parliament: u32,
    seen_this_cycle: &HashSet<BillKey>,
) -> Vec<BillKey> {
    let mut died = Vec::new();

    for (key, record) in records.iter_mut() {
        if !record.is_active() || record.is_enacted() {
            continue;
        }

        if record.parliament() == Some(current_parliament) || seen_this_cycle.contains(key) {
            continue;
        }

        if record.mark_died_without_passing() {
            info!(
                bill = %key,
                "bill died on the order paper (parliament ended without royal assent)"
            );
            died.push(key.clone());
        }
    }

    died
}

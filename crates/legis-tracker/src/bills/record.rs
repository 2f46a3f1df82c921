use super::domain::{classify, BillCategory, BillKey, BillStage, Chamber, CifStatus};
use super::state::{BillState, StatusUpdate};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::info;

/// Descriptive fields that the feed may refresh on every sighting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillMetadata {
    pub sponsor: Option<String>,
    pub sponsor_affiliation: Option<String>,
    pub enactment_date: Option<NaiveDateTime>,
    pub last_activity: Option<NaiveDateTime>,
    pub has_royal_recommendation: bool,
}

/// One tracked bill and its complete status history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillRecord {
    key: BillKey,
    pub title: String,
    category: BillCategory,
    pub sponsor: Option<String>,
    pub sponsor_affiliation: Option<String>,
    enactment_date: Option<NaiveDateTime>,
    pub last_activity: Option<NaiveDateTime>,
    pub has_royal_recommendation: bool,
    current_stage: BillStage,
    publication_count: u32,
    is_active: bool,
    died_without_passing: bool,
    chapter_citation: Option<String>,
    cif_status: CifStatus,
    cif_details: Option<String>,
    history: Vec<BillState>,
}

/// Every stored field of a record, used to rebuild one from the persisted document.
#[derive(Debug, Clone)]
pub(crate) struct RecordParts {
    pub key: BillKey,
    pub title: String,
    pub category: BillCategory,
    pub sponsor: Option<String>,
    pub sponsor_affiliation: Option<String>,
    pub enactment_date: Option<NaiveDateTime>,
    pub last_activity: Option<NaiveDateTime>,
    pub has_royal_recommendation: bool,
    pub current_stage: BillStage,
    pub publication_count: u32,
    pub is_active: bool,
    pub died_without_passing: bool,
    pub chapter_citation: Option<String>,
    pub cif_status: CifStatus,
    pub cif_details: Option<String>,
    pub history: Vec<BillState>,
}

impl BillRecord {
    pub fn new(key: BillKey, title: impl Into<String>) -> Self {
        let title = title.into();
        let category = classify(&key.bill_id, &title);

        Self {
            key,
            title,
            category,
            sponsor: None,
            sponsor_affiliation: None,
            enactment_date: None,
            last_activity: None,
            has_royal_recommendation: false,
            current_stage: BillStage::FirstReading,
            publication_count: 0,
            is_active: true,
            died_without_passing: false,
            chapter_citation: None,
            cif_status: CifStatus::NotDetermined,
            cif_details: None,
            history: Vec::new(),
        }
    }

    pub(crate) fn from_parts(parts: RecordParts) -> Self {
        let mut record = Self {
            key: parts.key,
            title: parts.title,
            category: parts.category,
            sponsor: parts.sponsor,
            sponsor_affiliation: parts.sponsor_affiliation,
            enactment_date: parts.enactment_date,
            last_activity: parts.last_activity,
            has_royal_recommendation: parts.has_royal_recommendation,
            current_stage: parts.current_stage,
            publication_count: parts.publication_count,
            is_active: parts.is_active,
            died_without_passing: parts.died_without_passing,
            chapter_citation: parts.chapter_citation,
            cif_status: parts.cif_status,
            cif_details: parts.cif_details,
            history: parts.history,
        };

        if let Some(last) = record.history.last() {
            record.current_stage = last.stage();
        }
        if record.enactment_date.is_some() {
            record.is_active = true;
            record.died_without_passing = false;
        }

        record
    }

    pub fn key(&self) -> &BillKey {
        &self.key
    }

    pub fn category(&self) -> BillCategory {
        self.category
    }

    pub fn enactment_date(&self) -> Option<NaiveDateTime> {
        self.enactment_date
    }

    pub fn is_enacted(&self) -> bool {
        self.enactment_date.is_some()
    }

    pub fn current_stage(&self) -> BillStage {
        self.current_stage
    }

    pub fn publication_count(&self) -> u32 {
        self.publication_count
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn died_without_passing(&self) -> bool {
        self.died_without_passing
    }

    pub fn chapter_citation(&self) -> Option<&str> {
        self.chapter_citation.as_deref()
    }

    pub fn cif_status(&self) -> CifStatus {
        self.cif_status
    }

    pub fn cif_details(&self) -> Option<&str> {
        self.cif_details.as_deref()
    }

    pub fn history(&self) -> &[BillState] {
        &self.history
    }

    pub fn current_state(&self) -> Option<&BillState> {
        self.history.last()
    }

    pub fn parliament(&self) -> Option<u32> {
        self.key.parliament()
    }

    pub fn days_since_last_activity(&self, today: NaiveDate) -> Option<i64> {
        self.last_activity
            .map(|activity| (today - activity.date()).num_days())
    }

    /// Sets the enactment date. An enacted bill is permanent law, so this also
    /// revives a record that an earlier sweep marked dead.
    pub fn record_enactment(&mut self, date: NaiveDateTime) {
        self.enactment_date = Some(date);
        self.is_active = true;
        self.died_without_passing = false;
    }

    /// Refreshes descriptive fields; absent values never erase known ones.
    pub fn merge_metadata(&mut self, metadata: BillMetadata) {
        if let Some(sponsor) = metadata.sponsor {
            self.sponsor = Some(sponsor);
        }
        if let Some(affiliation) = metadata.sponsor_affiliation {
            self.sponsor_affiliation = Some(affiliation);
        }
        if let Some(activity) = metadata.last_activity {
            self.last_activity = Some(activity);
        }
        if let Some(date) = metadata.enactment_date {
            self.record_enactment(date);
        }
        self.has_royal_recommendation = metadata.has_royal_recommendation;
    }

    pub(crate) fn mark_died_without_passing(&mut self) -> bool {
        if self.is_enacted() || !self.is_active {
            return false;
        }
        self.is_active = false;
        self.died_without_passing = true;
        true
    }

    pub(crate) fn enactment_processed(&self) -> bool {
        self.chapter_citation.is_some() || self.cif_status != CifStatus::NotDetermined
    }

    pub(crate) fn set_enactment_outcome(
        &mut self,
        chapter_citation: Option<String>,
        cif_status: CifStatus,
        cif_details: Option<String>,
    ) {
        self.chapter_citation = chapter_citation;
        self.cif_status = cif_status;
        self.cif_details = cif_details;
    }

    /// Decides the stage implied by a new status, plus whether the bill text changed.
    ///
    /// Rules are checked in precedence order and the first match wins. A chamber
    /// switch is checked before any status text, so a message that also mentions
    /// "committee" still resolves to the chamber transition.
    pub fn determine_stage(
        &self,
        status_text: &str,
        chamber: Chamber,
        new_publication_count: u32,
    ) -> (BillStage, bool) {
        let Some(previous) = self.current_state() else {
            return (BillStage::FirstReading, false);
        };

        if previous.chamber() != chamber {
            match chamber {
                Chamber::Senate => {
                    info!(bill = %self.key, "bill moved to the Senate");
                    return (BillStage::SenateStages, false);
                }
                Chamber::HouseOfCommons => {
                    info!(bill = %self.key, "bill moved to the House of Commons");
                    return (BillStage::PassedOriginatingChamber, false);
                }
                Chamber::Unknown => {}
            }
        }

        let status = status_text.to_lowercase();

        if status.contains("royal assent") || self.is_enacted() {
            return (BillStage::RoyalAssent, false);
        }

        if status.contains("defeated")
            || status.contains("withdrawn")
            || status.contains("not proceeded")
        {
            return (BillStage::Defeated, false);
        }

        if status.contains("third reading") {
            return (BillStage::ThirdReading, false);
        }

        if status.contains("report") {
            let text_changed = new_publication_count > self.publication_count;
            if text_changed {
                info!(
                    bill = %self.key,
                    from = self.publication_count,
                    to = new_publication_count,
                    "amendment detected at report stage"
                );
            }
            return (BillStage::ReportStage, text_changed);
        }

        if status.contains("committee") {
            return (BillStage::Committee, false);
        }

        if status.contains("second reading") {
            return (BillStage::SecondReading, false);
        }

        if status.contains("first reading") || status.contains("introduced") {
            return (BillStage::FirstReading, false);
        }

        if status.contains("passed") && status.contains("house") {
            return (BillStage::PassedOriginatingChamber, false);
        }

        (self.current_stage, false)
    }

    /// Records `update` when it differs from the latest snapshot. Returns true
    /// when a history entry was appended.
    pub fn update(&mut self, update: StatusUpdate) -> bool {
        self.update_at(update, Utc::now())
    }

    pub fn update_at(&mut self, update: StatusUpdate, observed_at: DateTime<Utc>) -> bool {
        let StatusUpdate {
            status_code,
            status_text,
            chamber,
            reference_url,
            publication_count,
        } = update;

        let (stage, text_changed) = self.determine_stage(&status_text, chamber, publication_count);
        let candidate = BillState::new(
            status_code,
            status_text,
            observed_at,
            chamber,
            reference_url,
            stage,
            text_changed,
        );

        let Some(previous) = self.current_state() else {
            self.current_stage = stage;
            self.publication_count = publication_count;
            self.history.push(candidate);
            return true;
        };

        // A fresh amendment signal is a change on its own; a cleared one is not.
        if previous.same_observation(&candidate) && !text_changed {
            return false;
        }

        let previous_status = previous.status_text().to_string();
        let previous_stage = previous.stage();

        self.current_stage = stage;
        self.publication_count = publication_count;

        if text_changed {
            info!(bill = %self.key, stage = stage.label(), "bill text amended");
        }
        info!(
            bill = %self.key,
            from = %previous_status,
            to = %candidate.status_text(),
            from_stage = previous_stage.code(),
            to_stage = stage.code(),
            "bill status changed"
        );

        self.history.push(candidate);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn status(text: &str, code: &str, chamber: Chamber, publications: u32) -> StatusUpdate {
        StatusUpdate {
            status_code: code.to_string(),
            status_text: text.to_string(),
            chamber,
            reference_url: "https://www.parl.ca/legisinfo/en/bill/44-1/C-11".to_string(),
            publication_count: publications,
        }
    }

    fn tracked_bill() -> BillRecord {
        let mut bill = BillRecord::new(
            BillKey::new("44-1", "C-11"),
            "An Act to amend the Broadcasting Act",
        );
        bill.update(status("First reading", "100", Chamber::HouseOfCommons, 1));
        bill
    }

    fn assert_stage_consistent(bill: &BillRecord) {
        let last = bill.history().last().expect("history present");
        assert_eq!(bill.current_stage(), last.stage());
    }

    #[test]
    fn first_sighting_is_always_recorded() {
        let mut bill = BillRecord::new(BillKey::new("44-1", "C-99"), "New Test Bill");
        assert!(bill.current_state().is_none());

        let changed = bill.update(status("Second reading", "200", Chamber::HouseOfCommons, 0));

        assert!(changed);
        assert_eq!(bill.history().len(), 1);
        assert_eq!(bill.current_stage(), BillStage::FirstReading);
        assert!(!bill.history()[0].text_changed());
    }

    #[test]
    fn identical_poll_leaves_history_untouched() {
        let mut bill = tracked_bill();
        let changed = bill.update(status("First reading", "100", Chamber::HouseOfCommons, 1));
        assert!(!changed);
        assert_eq!(bill.history().len(), 1);
    }

    #[test]
    fn status_change_appends_and_tracks_stage() {
        let mut bill = tracked_bill();
        assert!(bill.update(status("Third reading", "300", Chamber::HouseOfCommons, 1)));
        assert_eq!(bill.history().len(), 2);
        assert_eq!(bill.current_stage(), BillStage::ThirdReading);
        assert_stage_consistent(&bill);
    }

    #[test]
    fn chamber_switch_takes_precedence_over_status_text() {
        let mut bill = tracked_bill();
        let (stage, changed) =
            bill.determine_stage("Referred to committee", Chamber::Senate, 1);
        assert_eq!(stage, BillStage::SenateStages);
        assert!(!changed);

        bill.update(status("At committee in the Senate", "400", Chamber::Senate, 1));
        let (stage, _) = bill.determine_stage("Committee report", Chamber::HouseOfCommons, 5);
        assert_eq!(stage, BillStage::PassedOriginatingChamber);
    }

    #[test]
    fn unknown_chamber_falls_through_to_status_text() {
        let bill = tracked_bill();
        let (stage, _) = bill.determine_stage("At committee", Chamber::Unknown, 1);
        assert_eq!(stage, BillStage::Committee);
    }

    #[test]
    fn report_stage_flags_amendments_when_publications_rise() {
        let bill = tracked_bill();
        assert_eq!(
            bill.determine_stage("Report stage", Chamber::HouseOfCommons, 2),
            (BillStage::ReportStage, true)
        );
        assert_eq!(
            bill.determine_stage("Consideration of committee report", Chamber::HouseOfCommons, 1),
            (BillStage::ReportStage, false)
        );
    }

    #[test]
    fn amendment_is_recorded_once() {
        let mut bill = tracked_bill();
        assert!(bill.update(status("Report stage", "500", Chamber::HouseOfCommons, 2)));
        assert!(bill.history()[1].text_changed());
        assert_eq!(bill.publication_count(), 2);

        assert!(!bill.update(status("Report stage", "500", Chamber::HouseOfCommons, 2)));
        assert_eq!(bill.history().len(), 2);

        assert!(bill.update(status("Report stage", "500", Chamber::HouseOfCommons, 3)));
        assert_eq!(bill.history().len(), 3);
        assert_stage_consistent(&bill);
    }

    #[test]
    fn textual_rules_follow_precedence() {
        let bill = tracked_bill();
        let stage = |text: &str| bill.determine_stage(text, Chamber::HouseOfCommons, 0).0;

        assert_eq!(stage("Royal assent received"), BillStage::RoyalAssent);
        assert_eq!(stage("Defeated at third reading"), BillStage::Defeated);
        assert_eq!(stage("Bill withdrawn"), BillStage::Defeated);
        assert_eq!(stage("Not proceeded with"), BillStage::Defeated);
        assert_eq!(stage("At third reading"), BillStage::ThirdReading);
        assert_eq!(stage("At committee"), BillStage::Committee);
        assert_eq!(stage("At second reading"), BillStage::SecondReading);
        assert_eq!(stage("Introduced and read the first time"), BillStage::FirstReading);
        assert_eq!(stage("Passed the House"), BillStage::PassedOriginatingChamber);
        assert_eq!(stage("Awaiting scheduling"), BillStage::FirstReading);
    }

    #[test]
    fn unmatched_status_retains_current_stage() {
        let mut bill = tracked_bill();
        bill.update(status("At committee", "400", Chamber::HouseOfCommons, 1));
        assert!(bill.update(status("Awaiting scheduling", "401", Chamber::HouseOfCommons, 1)));
        assert_eq!(bill.current_stage(), BillStage::Committee);
        assert_stage_consistent(&bill);
    }

    #[test]
    fn enactment_date_forces_royal_assent() {
        let mut bill = tracked_bill();
        let date = NaiveDate::from_ymd_opt(2024, 1, 20)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        bill.record_enactment(date);
        let (stage, _) = bill.determine_stage("At second reading", Chamber::HouseOfCommons, 1);
        assert_eq!(stage, BillStage::RoyalAssent);
    }

    #[test]
    fn history_keeps_observation_timestamps() {
        let mut bill = BillRecord::new(BillKey::new("44-1", "C-5"), "Test");
        let first = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        bill.update_at(status("First reading", "100", Chamber::HouseOfCommons, 0), first);
        bill.update_at(status("Second reading", "200", Chamber::HouseOfCommons, 0), second);

        let stamps: Vec<_> = bill.history().iter().map(BillState::timestamp).collect();
        assert_eq!(stamps, vec![first, second]);
    }

    #[test]
    fn enactment_revives_and_pins_lifecycle() {
        let mut bill = tracked_bill();
        assert!(bill.mark_died_without_passing());
        assert!(!bill.is_active());

        bill.merge_metadata(BillMetadata {
            enactment_date: NaiveDate::from_ymd_opt(2024, 6, 20)
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            ..BillMetadata::default()
        });

        assert!(bill.is_active());
        assert!(!bill.died_without_passing());
        assert!(!bill.mark_died_without_passing());
    }

    #[test]
    fn metadata_merge_keeps_known_values() {
        let mut bill = tracked_bill();
        bill.merge_metadata(BillMetadata {
            sponsor: Some("Hon. Jane Doe".to_string()),
            sponsor_affiliation: Some("5".to_string()),
            has_royal_recommendation: true,
            ..BillMetadata::default()
        });
        bill.merge_metadata(BillMetadata::default());

        assert_eq!(bill.sponsor.as_deref(), Some("Hon. Jane Doe"));
        assert_eq!(bill.sponsor_affiliation.as_deref(), Some("5"));
        assert!(!bill.has_royal_recommendation);
    }

    #[test]
    fn category_is_derived_at_creation() {
        let bill = tracked_bill();
        assert_eq!(bill.category().label(), "Government Bill (House) - Amending");
    }

    #[test]
    fn days_since_last_activity_counts_calendar_days() {
        let mut bill = tracked_bill();
        assert_eq!(
            bill.days_since_last_activity(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
            None
        );
        bill.last_activity =
            NaiveDate::from_ymd_opt(2024, 1, 15).and_then(|d| d.and_hms_opt(10, 0, 0));
        assert_eq!(
            bill.days_since_last_activity(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
            Some(17)
        );
    }
}

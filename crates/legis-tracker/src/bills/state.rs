use super::domain::{BillStage, Chamber};
use chrono::{DateTime, Utc};

/// Immutable snapshot of a bill's status at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillState {
    status_code: String,
    status_text: String,
    timestamp: DateTime<Utc>,
    chamber: Chamber,
    reference_url: String,
    stage: BillStage,
    text_changed: bool,
}

impl BillState {
    pub fn new(
        status_code: impl Into<String>,
        status_text: impl Into<String>,
        timestamp: DateTime<Utc>,
        chamber: Chamber,
        reference_url: impl Into<String>,
        stage: BillStage,
        text_changed: bool,
    ) -> Self {
        Self {
            status_code: status_code.into(),
            status_text: status_text.into(),
            timestamp,
            chamber,
            reference_url: reference_url.into(),
            stage,
            text_changed,
        }
    }

    pub fn status_code(&self) -> &str {
        &self.status_code
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn chamber(&self) -> Chamber {
        self.chamber
    }

    pub fn reference_url(&self) -> &str {
        &self.reference_url
    }

    pub fn stage(&self) -> BillStage {
        self.stage
    }

    /// True when this snapshot recorded an amendment (publication count rose at report stage).
    pub fn text_changed(&self) -> bool {
        self.text_changed
    }

    /// Equality on everything a poll can observe; the timestamp is ignored.
    pub(crate) fn same_observation(&self, other: &BillState) -> bool {
        self.status_code == other.status_code
            && self.status_text == other.status_text
            && self.chamber == other.chamber
            && self.stage == other.stage
    }
}

/// Status fields read from one feed record, the input to [`super::BillRecord::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status_code: String,
    pub status_text: String,
    pub chamber: Chamber,
    pub reference_url: String,
    pub publication_count: u32,
}

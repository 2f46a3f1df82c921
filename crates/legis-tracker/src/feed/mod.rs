//! Bill listing feed: the collaborator contract plus the LEGISinfo implementation.

mod legisinfo;
mod parser;

pub use legisinfo::LegisInfoClient;
pub use parser::parse_feed;

use crate::bills::{BillKey, BillMetadata, Chamber, StatusUpdate};
use chrono::NaiveDateTime;

/// One bill as published by the feed, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBill {
    pub bill_id: String,
    pub session: String,
    pub title: String,
    pub status_code: String,
    pub status_text: String,
    pub chamber: Chamber,
    pub reference_url: String,
    pub sponsor: Option<String>,
    pub sponsor_affiliation: Option<String>,
    pub enactment_date: Option<NaiveDateTime>,
    pub last_activity: Option<NaiveDateTime>,
    pub has_royal_recommendation: bool,
    pub publication_count: u32,
}

impl RawBill {
    pub fn key(&self) -> BillKey {
        BillKey::new(self.session.clone(), self.bill_id.clone())
    }

    pub fn status_update(&self) -> StatusUpdate {
        StatusUpdate {
            status_code: self.status_code.clone(),
            status_text: self.status_text.clone(),
            chamber: self.chamber,
            reference_url: self.reference_url.clone(),
            publication_count: self.publication_count,
        }
    }

    pub fn metadata(&self) -> BillMetadata {
        BillMetadata {
            sponsor: self.sponsor.clone(),
            sponsor_affiliation: self.sponsor_affiliation.clone(),
            enactment_date: self.enactment_date,
            last_activity: self.last_activity,
            has_royal_recommendation: self.has_royal_recommendation,
        }
    }
}

/// Records decoded from one feed response. `dropped` counts entries that were
/// skipped for lacking a bill number or session code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedBatch {
    pub bills: Vec<RawBill>,
    pub dropped: usize,
}

impl FeedBatch {
    pub fn is_empty(&self) -> bool {
        self.bills.is_empty()
    }
}

/// Outcome of requesting a historical session listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPage {
    Found(FeedBatch),
    NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("feed at {url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("feed response could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Source of bill listings.
#[allow(async_fn_in_trait)]
pub trait BillFeed {
    /// The current listing.
    async fn fetch_current(&self) -> Result<FeedBatch, FeedError>;

    /// The listing for one historical session.
    async fn fetch_session(&self, parliament: u32, session: u32)
        -> Result<SessionPage, FeedError>;
}

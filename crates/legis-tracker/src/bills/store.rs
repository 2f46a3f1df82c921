//! Durable storage for the bill collection.
//!
//! The collection is kept as one JSON document:
//! `{ "schema_version": 1, "last_updated": ..., "bills": [...] }`. Persisted
//! shapes are separate from the in-memory types and every enum is written as
//! an explicit code, so an unknown code fails the load instead of being
//! silently defaulted.

use super::domain::{BillCategory, BillKey, BillStage, Chamber, CifStatus};
use super::record::{BillRecord, RecordParts};
use super::state::BillState;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

pub const SCHEMA_VERSION: u32 = 1;

/// Collection read back from storage.
#[derive(Debug, Clone, Default)]
pub struct LoadedCollection {
    pub last_updated: Option<DateTime<Utc>>,
    pub bills: BTreeMap<BillKey, BillRecord>,
}

/// Storage abstraction so the tracker can be exercised without touching disk.
pub trait BillStore: Send + Sync {
    /// Returns `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<LoadedCollection>, StoreError>;
    fn save(&self, bills: &BTreeMap<BillKey, BillRecord>) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access bill store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("bill store {path} is not valid JSON: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode bill collection: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("unsupported bill store schema version {0}")]
    UnsupportedSchema(u32),
    #[error("bill {bill} has unknown {field} '{value}'")]
    UnknownCode {
        bill: String,
        field: &'static str,
        value: String,
    },
}

/// Keeps the collection in a single JSON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl BillStore for JsonFileStore {
    fn load(&self) -> Result<Option<LoadedCollection>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };

        let document: StoredDocument =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
                path: self.path.clone(),
                source,
            })?;

        decode_document(document).map(Some)
    }

    fn save(&self, bills: &BTreeMap<BillKey, BillRecord>) -> Result<(), StoreError> {
        let document = encode_document(bills, Utc::now());
        let payload = serde_json::to_vec_pretty(&document).map_err(StoreError::Encode)?;

        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&directory).map_err(|err| self.io_error(err))?;

        let mut staged = NamedTempFile::new_in(&directory).map_err(|err| self.io_error(err))?;
        staged
            .write_all(&payload)
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|err| self.io_error(err))?;
        staged
            .persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;

        info!(bills = bills.len(), path = %self.path.display(), "bill store saved");
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    schema_version: u32,
    last_updated: DateTime<Utc>,
    bills: Vec<StoredBill>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredBill {
    session: String,
    bill_id: String,
    title: String,
    bill_type: String,
    sponsor: Option<String>,
    sponsor_affiliation: Option<String>,
    royal_assent_date: Option<NaiveDateTime>,
    last_activity_date: Option<NaiveDateTime>,
    has_royal_recommendation: bool,
    current_stage: String,
    publication_count: u32,
    is_active: bool,
    died_on_order_paper: bool,
    chapter_citation: Option<String>,
    cif_status: String,
    cif_details: Option<String>,
    history: Vec<StoredState>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredState {
    status_code: String,
    status_text: String,
    timestamp: DateTime<Utc>,
    chamber: String,
    text_url: String,
    stage: String,
    text_changed: bool,
}

fn encode_document(bills: &BTreeMap<BillKey, BillRecord>, now: DateTime<Utc>) -> StoredDocument {
    StoredDocument {
        schema_version: SCHEMA_VERSION,
        last_updated: now,
        bills: bills.values().map(encode_bill).collect(),
    }
}

fn encode_bill(record: &BillRecord) -> StoredBill {
    StoredBill {
        session: record.key().session.clone(),
        bill_id: record.key().bill_id.clone(),
        title: record.title.clone(),
        bill_type: record.category().label(),
        sponsor: record.sponsor.clone(),
        sponsor_affiliation: record.sponsor_affiliation.clone(),
        royal_assent_date: record.enactment_date(),
        last_activity_date: record.last_activity,
        has_royal_recommendation: record.has_royal_recommendation,
        current_stage: record.current_stage().code().to_string(),
        publication_count: record.publication_count(),
        is_active: record.is_active(),
        died_on_order_paper: record.died_without_passing(),
        chapter_citation: record.chapter_citation().map(str::to_string),
        cif_status: record.cif_status().code().to_string(),
        cif_details: record.cif_details().map(str::to_string),
        history: record.history().iter().map(encode_state).collect(),
    }
}

fn encode_state(state: &BillState) -> StoredState {
    StoredState {
        status_code: state.status_code().to_string(),
        status_text: state.status_text().to_string(),
        timestamp: state.timestamp(),
        chamber: state.chamber().label().to_string(),
        text_url: state.reference_url().to_string(),
        stage: state.stage().code().to_string(),
        text_changed: state.text_changed(),
    }
}

fn decode_document(document: StoredDocument) -> Result<LoadedCollection, StoreError> {
    if document.schema_version != SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchema(document.schema_version));
    }

    let mut bills = BTreeMap::new();
    for stored in document.bills {
        let record = decode_bill(stored)?;
        bills.insert(record.key().clone(), record);
    }

    Ok(LoadedCollection {
        last_updated: Some(document.last_updated),
        bills,
    })
}

fn decode_bill(stored: StoredBill) -> Result<BillRecord, StoreError> {
    let key = BillKey::new(stored.session, stored.bill_id);
    let unknown = |field: &'static str, value: &str| StoreError::UnknownCode {
        bill: key.to_string(),
        field,
        value: value.to_string(),
    };

    let category = BillCategory::from_label(&stored.bill_type)
        .ok_or_else(|| unknown("bill_type", &stored.bill_type))?;
    let current_stage = BillStage::from_code(&stored.current_stage)
        .ok_or_else(|| unknown("current_stage", &stored.current_stage))?;
    let cif_status = CifStatus::from_code(&stored.cif_status)
        .ok_or_else(|| unknown("cif_status", &stored.cif_status))?;

    let history = stored
        .history
        .into_iter()
        .map(|state| {
            let chamber = Chamber::from_label(&state.chamber)
                .ok_or_else(|| unknown("chamber", &state.chamber))?;
            let stage =
                BillStage::from_code(&state.stage).ok_or_else(|| unknown("stage", &state.stage))?;
            Ok(BillState::new(
                state.status_code,
                state.status_text,
                state.timestamp,
                chamber,
                state.text_url,
                stage,
                state.text_changed,
            ))
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    Ok(BillRecord::from_parts(RecordParts {
        key: key.clone(),
        title: stored.title,
        category,
        sponsor: stored.sponsor,
        sponsor_affiliation: stored.sponsor_affiliation,
        enactment_date: stored.royal_assent_date,
        last_activity: stored.last_activity_date,
        has_royal_recommendation: stored.has_royal_recommendation,
        current_stage,
        publication_count: stored.publication_count,
        is_active: stored.is_active,
        died_without_passing: stored.died_on_order_paper,
        chapter_citation: stored.chapter_citation,
        cif_status,
        cif_details: stored.cif_details,
        history,
    }))
}

//! Bill domain model: identity, stages, status history and lifecycle rules.

pub mod domain;
pub mod enactment;
pub mod lifecycle;
pub mod parliament;
pub mod record;
pub mod state;
pub mod store;

pub use domain::{
    classify, BillCategory, BillForm, BillKey, BillOrigin, BillStage, Chamber, CifStatus,
};
pub use enactment::{
    analyze_coming_into_force, extract_chapter_citation, process_enacted_bill, EnactedText,
    EnactedTextDirectory, EnactedTextError, EnactedTextSource,
};
pub use parliament::{detect_parliament, parliament_of, ParliamentTracker};
pub use record::{BillMetadata, BillRecord};
pub use state::{BillState, StatusUpdate};
pub use store::{BillStore, JsonFileStore, LoadedCollection, StoreError};

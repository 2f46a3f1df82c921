use crate::bills::{BillKey, BillStage, CifStatus};
use tracing::info;

/// Outbound hook for bill events (log sinks, webhooks, mail adapters).
pub trait ChangeNotifier: Send + Sync {
    fn publish(&self, change: &BillChange) -> Result<(), NotifyError>;
}

/// One event raised by a tracking cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillChange {
    pub key: BillKey,
    pub title: String,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    NewBill {
        status: String,
        stage: BillStage,
    },
    StatusChanged {
        previous_status: String,
        status: String,
        previous_stage: BillStage,
        stage: BillStage,
        text_changed: bool,
    },
    DiedWithoutPassing,
    EnactmentProcessed {
        chapter_citation: Option<String>,
        cif_status: CifStatus,
    },
}

impl ChangeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewBill { .. } => "new_bill",
            Self::StatusChanged { .. } => "status_changed",
            Self::DiedWithoutPassing => "died_without_passing",
            Self::EnactmentProcessed { .. } => "enactment_processed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Default notifier: writes every event to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl ChangeNotifier for TracingNotifier {
    fn publish(&self, change: &BillChange) -> Result<(), NotifyError> {
        match &change.kind {
            ChangeKind::NewBill { status, stage } => info!(
                bill = %change.key,
                title = %change.title,
                status = %status,
                stage = stage.label(),
                "new bill tracked"
            ),
            ChangeKind::StatusChanged {
                previous_status,
                status,
                previous_stage,
                stage,
                text_changed,
            } => info!(
                bill = %change.key,
                from = %previous_status,
                to = %status,
                from_stage = previous_stage.label(),
                to_stage = stage.label(),
                amended = text_changed,
                "bill update"
            ),
            ChangeKind::DiedWithoutPassing => info!(
                bill = %change.key,
                title = %change.title,
                "bill died on the order paper"
            ),
            ChangeKind::EnactmentProcessed {
                chapter_citation,
                cif_status,
            } => info!(
                bill = %change.key,
                citation = chapter_citation.as_deref().unwrap_or("none"),
                cif = cif_status.label(),
                "enactment recorded"
            ),
        }
        Ok(())
    }
}

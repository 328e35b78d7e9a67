//! Per-request result of the resolve and materialize stages
//!
//! Every sub-step reports an outcome value instead of an error, so a summary
//! can describe partial completion (customer created, project skipped, ...).

use serde::Serialize;
use uuid::Uuid;

/// Outcome of resolving one entity reference
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    /// Existing record reused
    Matched { id: Uuid },
    /// New record inserted
    Created { id: Uuid },
    /// Not attempted (nothing to resolve, or a prerequisite is missing)
    Skipped { reason: String },
    /// Store error; logged, id stays null
    Failed { error: String },
}

impl Resolution {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Resolution::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Resolution::Failed {
            error: error.to_string(),
        }
    }

    /// Resolved id, if any
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Resolution::Matched { id } | Resolution::Created { id } => Some(*id),
            Resolution::Skipped { .. } | Resolution::Failed { .. } => None,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Resolution::Created { .. })
    }
}

/// Customer and project resolution outcomes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionReport {
    pub customer: Resolution,
    pub project: Resolution,
}

/// Kind of record a materialization step writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Project,
    Task,
    TimeEntry,
    MaterialTransaction,
}

/// Outcome of one write
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteOutcome {
    Written { id: Uuid },
    Skipped { reason: String },
    Failed { error: String },
}

/// One write attempted (or skipped) by the materializer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteReport {
    pub kind: RecordKind,
    #[serde(flatten)]
    pub outcome: WriteOutcome,
}

impl WriteReport {
    pub fn written(kind: RecordKind, id: Uuid) -> Self {
        Self {
            kind,
            outcome: WriteOutcome::Written { id },
        }
    }

    pub fn skipped(kind: RecordKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            outcome: WriteOutcome::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn failed(kind: RecordKind, error: impl ToString) -> Self {
        Self {
            kind,
            outcome: WriteOutcome::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn written_id(&self) -> Option<Uuid> {
        match self.outcome {
            WriteOutcome::Written { id } => Some(id),
            _ => None,
        }
    }
}

/// Response body: the classified command merged with resolution and write outcomes
///
/// `customerId` and `projectId` are always present and `null` when unresolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary<T> {
    #[serde(flatten)]
    pub command: T,
    pub customer_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub resolution: ResolutionReport,
    pub writes: Vec<WriteReport>,
}

impl<T> ResultSummary<T> {
    pub fn new(command: T, resolution: ResolutionReport, writes: Vec<WriteReport>) -> Self {
        Self {
            command,
            customer_id: resolution.customer.id(),
            project_id: resolution.project.id(),
            resolution,
            writes,
        }
    }
}

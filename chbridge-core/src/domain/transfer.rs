// chbridge-core/src/domain/transfer.rs

use crate::domain::error::{DomainError, FailureKind};
use crate::domain::schema::{ColumnName, EditableRow, TableName};

/// Asks the source system to write the given columns of a table to a destination
/// it controls. `destination` is opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub table: TableName,
    pub columns: Vec<ColumnName>,
    pub destination: String,
}

impl ExportRequest {
    pub fn check(&self) -> Result<(), DomainError> {
        if self.table.trim().is_empty() {
            return Err(DomainError::Validation("Please select a table.".into()));
        }
        if self.columns.is_empty() {
            return Err(DomainError::Validation(
                "Please select at least one column.".into(),
            ));
        }
        if self.destination.trim().is_empty() {
            return Err(DomainError::Validation(
                "Export destination cannot be empty.".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    pub table: TableName,
    pub rows: Vec<EditableRow>,
    /// Advisory only: forwarded to the receiver, never enforced locally.
    pub batch_size: usize,
}

impl IngestRequest {
    pub fn check(&self) -> Result<(), DomainError> {
        if self.table.trim().is_empty() {
            return Err(DomainError::Validation(
                "Please choose a target table.".into(),
            ));
        }
        if self.rows.is_empty() {
            return Err(DomainError::Validation(
                "No rows selected for ingestion.".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(DomainError::Validation(
                "Batch size must be at least 1.".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReceipt {
    pub message: String,
    pub records_processed: usize,
}

/// Single result of a transfer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        message: String,
        records: Option<usize>,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::Success { message, .. } | Outcome::Failure { message, .. } => message,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Outcome::Failure { kind, .. } => Some(*kind),
            Outcome::Success { .. } => None,
        }
    }
}

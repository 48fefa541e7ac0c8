// chbridge-core/src/domain/workflow/state.rs

use std::fmt;

use crate::domain::error::FailureKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub reason: String,
}

/// Current step of a workflow instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkflowState {
    #[default]
    SelectingSource,
    Connecting,
    AwaitingSchema,
    SelectingColumns,
    StagingRows,
    Transferring,
    Done,
    Failed(Failure),
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelectingSource => "selecting_source",
            Self::Connecting => "connecting",
            Self::AwaitingSchema => "awaiting_schema",
            Self::SelectingColumns => "selecting_columns",
            Self::StagingRows => "staging_rows",
            Self::Transferring => "transferring",
            Self::Done => "done",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(failure) => write!(f, "failed ({}: {})", failure.kind, failure.reason),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Step-local report that does not move the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Empty(String),
    Error { kind: FailureKind, message: String },
}

/// Network-bound actions subject to single-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Connect,
    ResumeSession,
    ListTables,
    ListColumns,
    LoadFile,
    Export,
    Ingest,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connect => "connect",
            Self::ResumeSession => "resume_session",
            Self::ListTables => "list_tables",
            Self::ListColumns => "list_columns",
            Self::LoadFile => "load_file",
            Self::Export => "export",
            Self::Ingest => "ingest",
        };
        write!(f, "{}", s)
    }
}

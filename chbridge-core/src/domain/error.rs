// chbridge-core/src/domain/error.rs

use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

pub const EXPORT_FALLBACK: &str =
    "Data export failed. Please check the data source logs for more details.";
pub const INGEST_FALLBACK: &str = "Data ingestion failed. Please try again.";

/// User-facing failure taxonomy. Every error the workflow can surface maps to one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Auth,
    Transport,
    Validation,
    Parse,
    EmptyFile,
    Export,
    Ingest,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth_error",
            Self::Transport => "transport_error",
            Self::Validation => "validation_error",
            Self::Parse => "parse_error",
            Self::EmptyFile => "empty_file",
            Self::Export => "export_error",
            Self::Ingest => "ingest_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Credential rejected by the data source: {0}")]
    #[diagnostic(
        code(chbridge::domain::auth),
        help("Reconnect with valid host, database and user credentials.")
    )]
    Unauthorized(String),

    #[error("No session credential available for '{0}'")]
    #[diagnostic(
        code(chbridge::domain::missing_credential),
        help("Connect (or resume a session) before issuing privileged requests.")
    )]
    MissingCredential(String),

    #[error("Transport Error: {0}")]
    #[diagnostic(code(chbridge::domain::transport))]
    Transport(String),

    #[error("Validation Error: {0}")]
    #[diagnostic(code(chbridge::domain::validation))]
    Validation(String),

    #[error("Cannot {action} while {state}")]
    #[diagnostic(code(chbridge::domain::transition))]
    InvalidTransition { action: String, state: String },

    #[error("No columns selected")]
    #[diagnostic(
        code(chbridge::domain::no_columns),
        help("Select at least one column first.")
    )]
    NoColumnsSelected,

    #[error("No rows available to stage")]
    #[diagnostic(code(chbridge::domain::no_rows))]
    NoRowsAvailable,

    #[error("Invalid edit: {0}")]
    #[diagnostic(code(chbridge::domain::invalid_edit))]
    InvalidEdit(String),

    #[error("Parse Error: {0}")]
    #[diagnostic(
        code(chbridge::domain::parse),
        help("Check the delimiter and re-upload the file.")
    )]
    Parse(String),

    #[error("The uploaded file contains no rows")]
    #[diagnostic(code(chbridge::domain::empty_file), help("Upload a file with a header and at least one record."))]
    EmptyFile,

    #[error("Export failed: {0}")]
    #[diagnostic(code(chbridge::domain::export))]
    Export(String),

    #[error("Ingestion failed: {0}")]
    #[diagnostic(code(chbridge::domain::ingest))]
    Ingest(String),
}

impl DomainError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unauthorized(_) | Self::MissingCredential(_) => FailureKind::Auth,
            Self::Transport(_) => FailureKind::Transport,
            Self::Validation(_)
            | Self::InvalidTransition { .. }
            | Self::NoColumnsSelected
            | Self::NoRowsAvailable
            | Self::InvalidEdit(_) => FailureKind::Validation,
            Self::Parse(_) => FailureKind::Parse,
            Self::EmptyFile => FailureKind::EmptyFile,
            Self::Export(_) => FailureKind::Export,
            Self::Ingest(_) => FailureKind::Ingest,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Export(msg) if msg.trim().is_empty() => EXPORT_FALLBACK.to_string(),
            Self::Ingest(msg) if msg.trim().is_empty() => INGEST_FALLBACK.to_string(),
            Self::Export(msg) | Self::Ingest(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    pub(crate) fn transition(action: &str, state: impl fmt::Display) -> Self {
        Self::InvalidTransition {
            action: action.to_string(),
            state: state.to_string(),
        }
    }
}

// chbridge-core/src/error.rs

use crate::domain::error::{DomainError, FailureKind};
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    // --- DOMAIN ERRORS (workflow rules, validation, source-reported failures) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (HTTP, CSV, IO, config) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

impl BridgeError {
    /// Classifies the error into the user-facing failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            BridgeError::Domain(e) => e.kind(),
            BridgeError::Infrastructure(e) => e.kind(),
        }
    }

    /// True when the data source refused the credential itself.
    pub fn is_rejected_credential(&self) -> bool {
        matches!(self, BridgeError::Domain(DomainError::Unauthorized(_)))
    }

    /// Message shown to the user. Source-reported transfer failures are passed
    /// through verbatim, with a generic fallback when the source sent nothing.
    pub fn user_message(&self) -> String {
        match self {
            BridgeError::Domain(e) => e.user_message(),
            BridgeError::Infrastructure(e) => e.to_string(),
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::Infrastructure(InfrastructureError::Http(err))
    }
}

impl From<csv::Error> for BridgeError {
    fn from(err: csv::Error) -> Self {
        BridgeError::Infrastructure(InfrastructureError::Csv(err))
    }
}

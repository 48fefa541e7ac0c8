// chbridge-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::error::FailureKind;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- TRANSPORT (HTTP) ---
    #[error("HTTP Transport Error: {0}")]
    #[diagnostic(
        code(chbridge::infra::http),
        help("Check that the data-source service is reachable at the configured base URL.")
    )]
    Http(#[from] reqwest::Error),

    #[error("Malformed response from data source: {0}")]
    #[diagnostic(code(chbridge::infra::json))]
    Json(#[from] serde_json::Error),

    // --- FLAT FILES ---
    #[error("Delimited File Error: {0}")]
    #[diagnostic(
        code(chbridge::infra::csv),
        help("Check the delimiter and that every record has as many fields as the header.")
    )]
    Csv(#[from] csv::Error),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(chbridge::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(chbridge::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(chbridge::infra::config))]
    ConfigError(String),
}

impl InfrastructureError {
    pub fn kind(&self) -> FailureKind {
        match self {
            InfrastructureError::Http(_) | InfrastructureError::Json(_) => FailureKind::Transport,
            InfrastructureError::Csv(_) | InfrastructureError::Io(_) => FailureKind::Parse,
            InfrastructureError::YamlError(_) | InfrastructureError::ConfigError(_) => {
                FailureKind::Validation
            }
        }
    }
}

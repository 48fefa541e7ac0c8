// chbridge-core/src/domain/source.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::domain::error::DomainError;

/// Origin of the data for one workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Database,
    FlatFile,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Database => "database",
            Self::FlatFile => "flat_file",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ConnectionParams {
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    #[validate(length(min = 1, message = "Database cannot be empty"))]
    pub database: String,

    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: String,

    pub password: String,
}

impl ConnectionParams {
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::Validation(e.to_string()))
    }
}

// Password stays out of logs.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Opaque session token issued by the data source after a successful connect.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub credential: Credential,
    pub message: String,
}

/// Raw bytes of an uploaded delimited file plus the delimiter chosen by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    pub bytes: Vec<u8>,
    pub delimiter: String,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, delimiter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes,
            delimiter: delimiter.into(),
        }
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .field("delimiter", &self.delimiter)
            .finish()
    }
}

// chbridge-core/src/ports/data_source.rs

// What the workflow needs from the remote data-source service, whatever the transport.
// Every privileged operation receives the credential explicitly; callers never reach
// these methods without one.

use crate::domain::schema::{ColumnName, TableName};
use crate::domain::source::{ConnectionParams, Credential, Session};
use crate::domain::transfer::{ExportRequest, IngestReceipt, IngestRequest};
use crate::error::BridgeError;
use async_trait::async_trait;

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Opens a session. Invalid credentials or an unreachable host are errors.
    async fn connect(&self, params: &ConnectionParams) -> Result<Session, BridgeError>;

    /// Checks whether a previously issued credential is still accepted.
    async fn validate(&self, credential: &Credential) -> Result<bool, BridgeError>;

    async fn list_tables(&self, credential: &Credential) -> Result<Vec<TableName>, BridgeError>;

    async fn list_columns(
        &self,
        credential: &Credential,
        table: &str,
    ) -> Result<Vec<ColumnName>, BridgeError>;

    /// Returns the status message reported by the source.
    async fn export_table(
        &self,
        credential: &Credential,
        request: &ExportRequest,
    ) -> Result<String, BridgeError>;

    async fn ingest_rows(
        &self,
        credential: &Credential,
        request: &IngestRequest,
    ) -> Result<IngestReceipt, BridgeError>;

    fn name(&self) -> &str;
}

// chbridge-core/src/application/explorer.rs

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::application::credentials::CredentialHolder;
use crate::domain::error::DomainError;
use crate::domain::schema::{ColumnName, TableName};
use crate::domain::source::FileUpload;
use crate::error::BridgeError;
use crate::ports::{DataSource, FileLoader, LoadedFile};

/// Discovers tables and columns of a connected source, and loads flat files.
pub struct SchemaExplorer {
    source: Arc<dyn DataSource>,
    loader: Arc<dyn FileLoader>,
    credentials: Arc<CredentialHolder>,
}

impl SchemaExplorer {
    pub fn new(
        source: Arc<dyn DataSource>,
        loader: Arc<dyn FileLoader>,
        credentials: Arc<CredentialHolder>,
    ) -> Self {
        Self {
            source,
            loader,
            credentials,
        }
    }

    /// An empty list is returned as-is; callers report it as an empty state.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn list_tables(&self) -> Result<Vec<TableName>, BridgeError> {
        let credential = self.credentials.require("list_tables")?;
        let start = Instant::now();

        match self.source.list_tables(&credential).await {
            Ok(tables) => {
                if tables.is_empty() {
                    warn!("No tables found in the database");
                } else {
                    info!(count = tables.len(), "📋 Fetched tables in {:.2?}", start.elapsed());
                }
                Ok(tables)
            }
            Err(e) => {
                error!("❌ Listing tables failed after {:.2?}: {}", start.elapsed(), e);
                Err(e)
            }
        }
    }

    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn list_columns(&self, table: &str) -> Result<Vec<ColumnName>, BridgeError> {
        let credential = self.credentials.require("list_columns")?;
        let start = Instant::now();

        match self.source.list_columns(&credential, table).await {
            Ok(columns) => {
                if columns.is_empty() {
                    warn!(table, "No columns found");
                } else {
                    debug!(table, ?columns, "Fetched columns in {:.2?}", start.elapsed());
                }
                Ok(columns)
            }
            Err(e) => {
                error!(table, "❌ Listing columns failed after {:.2?}: {}", start.elapsed(), e);
                Err(e)
            }
        }
    }

    /// Zero resulting rows is an `EmptyFile` error.
    #[instrument(skip(self, upload), fields(file = %upload.name, delimiter = %upload.delimiter))]
    pub async fn load_file(&self, upload: &FileUpload) -> Result<LoadedFile, BridgeError> {
        let loaded = self.loader.load_file(upload).await?;
        if loaded.rows.is_empty() {
            warn!("Uploaded file yielded no rows");
            return Err(DomainError::EmptyFile.into());
        }
        info!(rows = loaded.rows.len(), "📄 File parsed");
        Ok(loaded)
    }
}

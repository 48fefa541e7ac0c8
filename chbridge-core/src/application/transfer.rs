// chbridge-core/src/application/transfer.rs

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::application::credentials::CredentialHolder;
use crate::domain::transfer::{ExportRequest, IngestReceipt, IngestRequest, Outcome};
use crate::error::BridgeError;
use crate::ports::DataSource;

/// Runs bulk transfers against the data source and reports one outcome per request.
pub struct TransferExecutor {
    source: Arc<dyn DataSource>,
    credentials: Arc<CredentialHolder>,
}

impl TransferExecutor {
    pub fn new(source: Arc<dyn DataSource>, credentials: Arc<CredentialHolder>) -> Self {
        Self {
            source,
            credentials,
        }
    }

    /// A credential refused by the source is dropped from the holder.
    pub async fn export_table(&self, request: &ExportRequest) -> Outcome {
        let result = self.try_export(request).await;
        self.settle(result.map(|message| (message, None)))
    }

    pub async fn ingest_rows(&self, request: &IngestRequest) -> Outcome {
        let result = self.try_ingest(request).await;
        self.settle(result.map(|receipt| (receipt.message, Some(receipt.records_processed))))
    }

    fn settle(&self, result: Result<(String, Option<usize>), BridgeError>) -> Outcome {
        if matches!(&result, Err(e) if e.is_rejected_credential()) {
            warn!("Credential rejected during transfer; session cleared");
            self.credentials.clear();
        }
        outcome_of(result)
    }

    #[instrument(skip(self, request), fields(table = %request.table, columns = request.columns.len()))]
    async fn try_export(&self, request: &ExportRequest) -> Result<String, BridgeError> {
        request.check()?;
        let credential = self.credentials.require("export")?;
        let start = Instant::now();

        match self.source.export_table(&credential, request).await {
            Ok(message) => {
                info!(destination = %request.destination, "📤 Export finished in {:.2?}", start.elapsed());
                Ok(message)
            }
            Err(e) => {
                error!("❌ Export failed after {:.2?}: {}", start.elapsed(), e);
                Err(e)
            }
        }
    }

    #[instrument(skip(self, request), fields(table = %request.table, rows = request.rows.len(), batch_size = request.batch_size))]
    async fn try_ingest(
        &self,
        request: &IngestRequest,
    ) -> Result<IngestReceipt, BridgeError> {
        request.check()?;
        let credential = self.credentials.require("ingest")?;
        let start = Instant::now();

        match self.source.ingest_rows(&credential, request).await {
            Ok(receipt) => {
                info!(
                    records = receipt.records_processed,
                    "📥 Ingestion finished in {:.2?}",
                    start.elapsed()
                );
                Ok(receipt)
            }
            Err(e) => {
                error!("❌ Ingestion failed after {:.2?}: {}", start.elapsed(), e);
                Err(e)
            }
        }
    }
}

fn outcome_of(result: Result<(String, Option<usize>), BridgeError>) -> Outcome {
    match result {
        Ok((message, records)) => Outcome::Success { message, records },
        Err(e) => Outcome::Failure {
            kind: e.kind(),
            message: e.user_message(),
        },
    }
}

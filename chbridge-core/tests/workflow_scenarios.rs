// chbridge-core/tests/workflow_scenarios.rs
//
// End-to-end workflows against an in-memory data source and the real delimited loader.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use chbridge_core::application::{
    CredentialHolder, TransferExecutor, Trigger, WorkflowCoordinator, WorkflowOptions,
};
use chbridge_core::domain::{
    ColumnName, ConnectionParams, Credential, DomainError, EditableRow, ExportRequest,
    FailureKind, FileUpload, IngestReceipt, IngestRequest, Notice, Outcome, RawRow, Session,
    TableName, WorkflowState,
};
use chbridge_core::error::BridgeError;
use chbridge_core::infrastructure::adapters::DelimitedFileLoader;
use chbridge_core::ports::DataSource;

// --- FAKE DATA SOURCE ---

#[derive(Default)]
struct FakeSource {
    tables: Vec<TableName>,
    columns: HashMap<TableName, Vec<ColumnName>>,
    token_valid: AtomicBool,
    reject_credential: AtomicBool,
    fail_tables_once: AtomicBool,
    calls: Mutex<HashMap<&'static str, usize>>,
    gated: Mutex<HashSet<String>>,
    gate: Notify,
    exports: Mutex<Vec<ExportRequest>>,
    ingests: Mutex<Vec<IngestRequest>>,
}

impl FakeSource {
    fn clickhouse() -> Self {
        Self {
            tables: vec!["users".into(), "orders".into()],
            columns: HashMap::from([
                ("users".into(), vec!["id".into(), "name".into(), "dob".into()]),
                ("orders".into(), vec!["order_id".into(), "amount".into()]),
            ]),
            token_valid: AtomicBool::new(true),
            ..Self::default()
        }
    }

    fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().get(call).copied().unwrap_or(0)
    }

    fn hit(&self, call: &'static str) {
        *self.calls.lock().unwrap().entry(call).or_default() += 1;
    }

    /// Holds the next call matching `key` until `release` is called.
    fn hold(&self, key: &str) {
        self.gated.lock().unwrap().insert(key.to_string());
    }

    fn release(&self) {
        self.gate.notify_one();
    }

    async fn pass(&self, key: String) {
        let held = self.gated.lock().unwrap().remove(&key);
        if held {
            self.gate.notified().await;
        }
    }

    fn check_credential(&self) -> Result<(), BridgeError> {
        if self.reject_credential.load(Ordering::SeqCst) {
            return Err(DomainError::Unauthorized("Token expired".into()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn connect(&self, params: &ConnectionParams) -> Result<Session, BridgeError> {
        self.hit("connect");
        if params.password == "wrong" {
            return Err(DomainError::Unauthorized("Invalid credentials".into()).into());
        }
        Ok(Session {
            credential: Credential::new("tok-1"),
            message: "Connection established successfully!".into(),
        })
    }

    async fn validate(&self, _credential: &Credential) -> Result<bool, BridgeError> {
        self.hit("validate");
        Ok(self.token_valid.load(Ordering::SeqCst))
    }

    async fn list_tables(&self, _credential: &Credential) -> Result<Vec<TableName>, BridgeError> {
        self.hit("list_tables");
        self.pass("tables".into()).await;
        self.check_credential()?;
        if self.fail_tables_once.swap(false, Ordering::SeqCst) {
            return Err(DomainError::Transport("connection reset by peer".into()).into());
        }
        Ok(self.tables.clone())
    }

    async fn list_columns(
        &self,
        _credential: &Credential,
        table: &str,
    ) -> Result<Vec<ColumnName>, BridgeError> {
        self.hit("list_columns");
        self.pass(format!("columns:{}", table)).await;
        self.check_credential()?;
        Ok(self.columns.get(table).cloned().unwrap_or_default())
    }

    async fn export_table(
        &self,
        _credential: &Credential,
        request: &ExportRequest,
    ) -> Result<String, BridgeError> {
        self.hit("export");
        self.pass("export".into()).await;
        self.check_credential()?;
        self.exports.lock().unwrap().push(request.clone());
        Ok("Data export completed successfully.".into())
    }

    async fn ingest_rows(
        &self,
        _credential: &Credential,
        request: &IngestRequest,
    ) -> Result<IngestReceipt, BridgeError> {
        self.hit("ingest");
        self.pass("ingest".into()).await;
        self.check_credential()?;
        self.ingests.lock().unwrap().push(request.clone());
        Ok(IngestReceipt {
            message: "Data ingestion successful".into(),
            records_processed: request.rows.len(),
        })
    }

    fn name(&self) -> &str {
        "fake"
    }
}

// --- HELPERS ---

fn params() -> ConnectionParams {
    ConnectionParams {
        host: "localhost".into(),
        port: 8123,
        database: "default".into(),
        username: "default".into(),
        password: "secret".into(),
    }
}

fn coordinator(source: &Arc<FakeSource>) -> WorkflowCoordinator {
    coordinator_with(source, Arc::new(CredentialHolder::new()))
}

fn coordinator_with(source: &Arc<FakeSource>, holder: Arc<CredentialHolder>) -> WorkflowCoordinator {
    WorkflowCoordinator::new(
        source.clone(),
        Arc::new(DelimitedFileLoader::new()),
        holder,
        WorkflowOptions::default(),
    )
}

async fn connected_with_tables(source: &Arc<FakeSource>) -> Result<WorkflowCoordinator> {
    let wf = coordinator(source);
    wf.choose_database()?;
    wf.connect(params()).await?;
    wf.list_tables().await?;
    Ok(wf)
}

fn upload(content: &str) -> FileUpload {
    FileUpload::new("people.csv", content.as_bytes().to_vec(), ",")
}

// --- SCENARIOS ---

#[tokio::test]
async fn test_database_export_end_to_end() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = connected_with_tables(&source).await?;
    assert_eq!(wf.snapshot().tables(), ["users", "orders"]);

    let columns = wf.select_table("users").await?.applied().unwrap();
    assert_eq!(columns, ["id", "name", "dob"]);
    assert_eq!(wf.state(), WorkflowState::SelectingColumns);

    wf.toggle_column("id", true)?;
    wf.toggle_column("name", true)?;
    let outcome = wf.export().await?.applied().unwrap();

    assert!(outcome.is_success());
    assert_eq!(wf.state(), WorkflowState::Done);
    let exports = source.exports.lock().unwrap();
    assert_eq!(exports.len(), 1);
    assert_eq!(exports[0].table, "users");
    assert_eq!(exports[0].columns, ["id", "name"]);
    assert_eq!(exports[0].destination, "export.csv");
    Ok(())
}

#[tokio::test]
async fn test_flat_file_ingest_with_edit() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = coordinator(&source);
    wf.choose_flat_file(upload("id,name\n1,Bob\n2,Eve\n3,Joe\n"))?;

    let columns = wf.load_file().await?.applied().unwrap();
    assert_eq!(columns, ["id", "name"]);
    assert_eq!(
        wf.snapshot().message(),
        Some("File loaded successfully! Parsed rows: 3")
    );

    wf.toggle_column("name", true)?;
    wf.select_rows()?;
    wf.edit_field(0, "name", "Alice")?;
    wf.set_ingest_table("people")?;
    wf.connect(params()).await?;
    assert_eq!(wf.state(), WorkflowState::StagingRows);

    let outcome = wf.ingest().await?.applied().unwrap();
    assert_eq!(
        outcome,
        Outcome::Success {
            message: "Data ingestion successful".into(),
            records: Some(3)
        }
    );

    let ingests = source.ingests.lock().unwrap();
    let names: Vec<_> = ingests[0].rows.iter().map(|r| r.get("name").unwrap()).collect();
    assert_eq!(names, ["Alice", "Eve", "Joe"]);
    assert!(ingests[0].rows.iter().all(|r| r.get("id").is_none()));
    assert_eq!(ingests[0].table, "people");
    assert_eq!(ingests[0].batch_size, 1000);
    Ok(())
}

#[tokio::test]
async fn test_transport_failure_then_retry_without_reconnect() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    source.fail_tables_once.store(true, Ordering::SeqCst);

    let wf = coordinator(&source);
    wf.choose_database()?;
    wf.connect(params()).await?;

    let err = wf.list_tables().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);
    let snapshot = wf.snapshot();
    assert_eq!(snapshot.state(), &WorkflowState::AwaitingSchema);
    assert!(matches!(
        snapshot.notice(),
        Some(Notice::Error { kind: FailureKind::Transport, .. })
    ));

    let tables = wf.list_tables().await?.applied().unwrap();
    assert_eq!(tables, ["users", "orders"]);
    assert_eq!(source.count("connect"), 1);
    Ok(())
}

#[tokio::test]
async fn test_empty_file_never_reaches_column_selection() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = coordinator(&source);
    wf.choose_flat_file(upload("id,name\n"))?;

    let err = wf.load_file().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::EmptyFile);

    let snapshot = wf.snapshot();
    assert_eq!(snapshot.state(), &WorkflowState::AwaitingSchema);
    assert!(snapshot.columns().is_empty());
    assert!(snapshot.rows().is_empty());
    assert!(wf.toggle_column("id", true).is_err());
    Ok(())
}

#[tokio::test]
async fn test_empty_table_list_is_reported_not_failed() -> Result<()> {
    let source = Arc::new(FakeSource {
        tables: vec![],
        ..FakeSource::clickhouse()
    });
    let wf = connected_with_tables(&source).await?;
    let snapshot = wf.snapshot();
    assert_eq!(snapshot.state(), &WorkflowState::AwaitingSchema);
    assert_eq!(
        snapshot.notice(),
        Some(&Notice::Empty("No tables found in the database.".into()))
    );
    Ok(())
}

// --- CONCURRENCY ---

#[tokio::test]
async fn test_duplicate_export_triggers_one_call() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = connected_with_tables(&source).await?;
    wf.select_table("users").await?;
    wf.toggle_column("id", true)?;

    source.hold("export");
    let (first, second) = futures::join!(wf.export(), async {
        let second = wf.export().await;
        source.release();
        second
    });

    assert!(first?.is_applied());
    assert_eq!(second?, Trigger::Ignored);
    assert_eq!(source.count("export"), 1);
    Ok(())
}

#[tokio::test]
async fn test_columns_wait_for_outstanding_table_listing() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = connected_with_tables(&source).await?;

    source.hold("tables");
    let (tables, columns) = futures::join!(wf.list_tables(), async {
        let columns = wf.select_table("users").await;
        source.release();
        columns
    });

    assert!(tables?.is_applied());
    assert!(matches!(
        columns,
        Err(BridgeError::Domain(DomainError::InvalidTransition { .. }))
    ));
    assert_eq!(source.count("list_columns"), 0);
    assert_eq!(wf.state(), WorkflowState::AwaitingSchema);

    assert!(wf.select_table("users").await?.is_applied());
    assert_eq!(source.count("list_columns"), 1);
    Ok(())
}

#[tokio::test]
async fn test_export_waits_for_outstanding_table_listing() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = connected_with_tables(&source).await?;
    wf.select_table("users").await?;
    wf.toggle_column("id", true)?;

    source.hold("tables");
    let (tables, export) = futures::join!(wf.list_tables(), async {
        let export = wf.export().await;
        source.release();
        export
    });

    assert!(tables?.is_applied());
    assert!(matches!(
        export,
        Err(BridgeError::Domain(DomainError::InvalidTransition { .. }))
    ));
    assert_eq!(source.count("export"), 0);
    assert_eq!(wf.state(), WorkflowState::SelectingColumns);
    assert_eq!(wf.snapshot().selected_columns(), ["id"]);

    assert!(wf.export().await?.applied().unwrap().is_success());
    assert_eq!(source.count("export"), 1);
    Ok(())
}

#[tokio::test]
async fn test_reselecting_loading_table_is_ignored() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = connected_with_tables(&source).await?;

    source.hold("columns:users");
    let (first, second) = futures::join!(wf.select_table("users"), async {
        let second = wf.select_table("users").await;
        source.release();
        second
    });

    assert!(first?.is_applied());
    assert_eq!(second?, Trigger::Ignored);
    assert_eq!(source.count("list_columns"), 1);
    Ok(())
}

#[tokio::test]
async fn test_superseded_columns_response_is_discarded() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = connected_with_tables(&source).await?;

    source.hold("columns:users");
    let (users, orders) = futures::join!(wf.select_table("users"), async {
        let orders = wf.select_table("orders").await;
        source.release();
        orders
    });

    assert_eq!(users?, Trigger::Stale);
    assert!(orders?.is_applied());
    let snapshot = wf.snapshot();
    assert_eq!(snapshot.table(), Some("orders"));
    assert_eq!(snapshot.columns(), ["order_id", "amount"]);
    assert!(snapshot.selected_columns().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_reset_while_exporting_discards_result() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = connected_with_tables(&source).await?;
    wf.select_table("users").await?;
    wf.toggle_column("id", true)?;

    source.hold("export");
    let (export, ()) = futures::join!(wf.export(), async {
        wf.reset();
        source.release();
    });

    assert_eq!(export?, Trigger::Stale);
    assert_eq!(wf.state(), WorkflowState::SelectingSource);
    assert!(!wf.credentials().is_issued());
    Ok(())
}

// --- CREDENTIALS ---

#[tokio::test]
async fn test_rejected_credential_returns_to_connecting() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = connected_with_tables(&source).await?;
    source.reject_credential.store(true, Ordering::SeqCst);

    let err = wf.select_table("users").await.unwrap_err();
    assert!(err.is_rejected_credential());

    let snapshot = wf.snapshot();
    assert_eq!(snapshot.state(), &WorkflowState::Connecting);
    assert!(snapshot.tables().is_empty());
    assert!(snapshot.connection().is_some());
    assert!(!wf.credentials().is_issued());
    Ok(())
}

#[tokio::test]
async fn test_rejected_export_requires_reconnect() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = connected_with_tables(&source).await?;
    wf.select_table("users").await?;
    wf.select_all_columns()?;
    source.reject_credential.store(true, Ordering::SeqCst);

    let outcome = wf.export().await?.applied().unwrap();
    assert_eq!(outcome.failure_kind(), Some(FailureKind::Auth));
    assert!(matches!(wf.state(), WorkflowState::Failed(_)));

    wf.retry()?;
    assert_eq!(wf.state(), WorkflowState::Connecting);
    assert!(!wf.credentials().is_issued());
    Ok(())
}

#[tokio::test]
async fn test_missing_credential_fails_locally() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = coordinator(&source);
    wf.choose_flat_file(upload("id,name\n1,Bob\n"))?;
    wf.load_file().await?;
    wf.select_all_columns()?;
    wf.select_rows()?;
    wf.set_ingest_table("people")?;

    let outcome = wf.ingest().await?.applied().unwrap();
    assert_eq!(outcome.failure_kind(), Some(FailureKind::Auth));
    assert_eq!(source.count("ingest"), 0);

    wf.retry()?;
    assert_eq!(wf.state(), WorkflowState::StagingRows);
    assert_eq!(wf.snapshot().rows().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_wrong_password_fails_connect_and_keeps_fields() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = coordinator(&source);
    wf.choose_database()?;

    let mut bad = params();
    bad.password = "wrong".into();
    let err = wf.connect(bad.clone()).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Auth);
    assert!(matches!(wf.state(), WorkflowState::Failed(_)));

    wf.retry()?;
    assert_eq!(wf.snapshot().connection(), Some(&bad));
    assert!(!wf.credentials().is_issued());
    Ok(())
}

#[tokio::test]
async fn test_shared_session_is_resumed() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let holder = Arc::new(CredentialHolder::with_credential(Credential::new("tok-1")));

    let wf = coordinator_with(&source, holder.clone());
    wf.choose_database()?;
    assert!(wf.connect(params()).await.is_err());

    assert_eq!(wf.resume_session().await?, Trigger::Applied(true));
    assert_eq!(wf.state(), WorkflowState::AwaitingSchema);
    wf.list_tables().await?;
    assert_eq!(source.count("connect"), 0);

    source.token_valid.store(false, Ordering::SeqCst);
    let other = coordinator_with(&source, holder.clone());
    other.choose_database()?;
    assert_eq!(other.resume_session().await?, Trigger::Applied(false));
    assert_eq!(other.state(), WorkflowState::Connecting);
    assert!(!holder.is_issued());
    Ok(())
}

#[tokio::test]
async fn test_logout_clears_session() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = connected_with_tables(&source).await?;
    let before = wf.snapshot().generation();

    wf.logout();
    let snapshot = wf.snapshot();
    assert_eq!(snapshot.state(), &WorkflowState::Connecting);
    assert!(snapshot.generation() > before);
    assert!(!wf.credentials().is_issued());
    assert!(wf.list_tables().await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_logout_while_ingesting_discards_result() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let wf = coordinator(&source);
    wf.choose_flat_file(upload("id,name\n1,Bob\n"))?;
    wf.load_file().await?;
    wf.select_all_columns()?;
    wf.select_rows()?;
    wf.set_ingest_table("people")?;
    wf.connect(params()).await?;

    source.hold("ingest");
    let (ingest, ()) = futures::join!(wf.ingest(), async {
        wf.logout();
        source.release();
    });

    assert_eq!(ingest?, Trigger::Stale);
    assert_eq!(source.count("ingest"), 1);
    let snapshot = wf.snapshot();
    assert_eq!(snapshot.state(), &WorkflowState::StagingRows);
    assert!(snapshot.outcome().is_none());
    assert_eq!(snapshot.rows().len(), 1);
    assert!(!wf.credentials().is_issued());
    Ok(())
}

#[tokio::test]
async fn test_executor_reports_outcomes_directly() -> Result<()> {
    let source = Arc::new(FakeSource::clickhouse());
    let holder = Arc::new(CredentialHolder::new());
    let executor = TransferExecutor::new(source.clone(), holder.clone());
    let request = ExportRequest {
        table: "users".into(),
        columns: vec!["id".into()],
        destination: "out.csv".into(),
    };

    let outcome = executor.export_table(&request).await;
    assert_eq!(outcome.failure_kind(), Some(FailureKind::Auth));
    assert_eq!(source.count("export"), 0);

    holder.issue(Credential::new("tok-1"))?;
    let outcome = executor.export_table(&request).await;
    assert_eq!(outcome.message(), "Data export completed successfully.");

    source.reject_credential.store(true, Ordering::SeqCst);
    let ingest = IngestRequest {
        table: "people".into(),
        rows: vec![EditableRow::project(
            &RawRow::from_pairs([("id", "1")]),
            &["id".to_string()],
        )],
        batch_size: 10,
    };
    let outcome = executor.ingest_rows(&ingest).await;
    assert_eq!(outcome.failure_kind(), Some(FailureKind::Auth));
    assert!(outcome.message().contains("Token expired"));
    assert!(!holder.is_issued());
    Ok(())
}

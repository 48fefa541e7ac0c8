// chbridge-core/src/application/coordinator.rs
//
// USE CASE: drive one selection-and-transfer workflow from source choice to transfer.
//
// The snapshot lives behind a mutex that is only held for synchronous transitions,
// never across an `.await`. Network-bound actions follow the same three steps:
//   1. begin: single-flight check, pure transition, ticket tagged with the generation
//   2. await the port
//   3. complete: release the ticket, drop the response if its generation is stale

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

use crate::application::credentials::CredentialHolder;
use crate::application::explorer::SchemaExplorer;
use crate::application::transfer::TransferExecutor;
use crate::domain::error::{DomainError, FailureKind};
use crate::domain::schema::{ColumnName, TableName};
use crate::domain::source::{ConnectionParams, FileUpload};
use crate::domain::transfer::Outcome;
use crate::domain::workflow::{Action, InFlight, Notice, Ticket, Workflow, WorkflowState};
use crate::error::BridgeError;
use crate::ports::{DataSource, FileLoader};

/// Result of a network-bound trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger<T> {
    /// The request ran and its response was applied to the workflow.
    Applied(T),
    /// Dropped: the same action was already outstanding.
    Ignored,
    /// The response arrived after the workflow moved on and was discarded.
    Stale,
}

impl<T> Trigger<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Trigger::Applied(value) => Some(value),
            Trigger::Ignored | Trigger::Stale => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Trigger::Applied(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Trigger<U> {
        match self {
            Trigger::Applied(value) => Trigger::Applied(f(value)),
            Trigger::Ignored => Trigger::Ignored,
            Trigger::Stale => Trigger::Stale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Advisory batch size forwarded with every ingest.
    pub batch_size: usize,
    /// Opaque destination forwarded with every export.
    pub export_destination: String,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            export_destination: "export.csv".to_string(),
        }
    }
}

struct Inner {
    workflow: Workflow,
    in_flight: InFlight,
}

pub struct WorkflowCoordinator {
    source: Arc<dyn DataSource>,
    credentials: Arc<CredentialHolder>,
    explorer: SchemaExplorer,
    executor: TransferExecutor,
    options: WorkflowOptions,
    inner: Mutex<Inner>,
}

impl WorkflowCoordinator {
    pub fn new(
        source: Arc<dyn DataSource>,
        loader: Arc<dyn FileLoader>,
        credentials: Arc<CredentialHolder>,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            explorer: SchemaExplorer::new(
                Arc::clone(&source),
                loader,
                Arc::clone(&credentials),
            ),
            executor: TransferExecutor::new(Arc::clone(&source), Arc::clone(&credentials)),
            source,
            credentials,
            options,
            inner: Mutex::new(Inner {
                workflow: Workflow::default(),
                in_flight: InFlight::default(),
            }),
        }
    }

    /// Copy of the current snapshot.
    pub fn snapshot(&self) -> Workflow {
        self.lock().workflow.clone()
    }

    pub fn state(&self) -> WorkflowState {
        self.lock().workflow.state().clone()
    }

    pub fn credentials(&self) -> &Arc<CredentialHolder> {
        &self.credentials
    }

    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    // --- LOCAL TRANSITIONS (no network) ---

    pub fn choose_database(&self) -> Result<(), BridgeError> {
        self.apply("choose_database", |wf| wf.choose_database())
    }

    pub fn choose_flat_file(&self, upload: FileUpload) -> Result<(), BridgeError> {
        self.apply("choose_flat_file", |wf| wf.choose_flat_file(upload))
    }

    pub fn replace_file(&self, upload: FileUpload) -> Result<(), BridgeError> {
        self.apply("replace_file", |wf| wf.replace_file(upload))
    }

    pub fn toggle_column(&self, column: &str, included: bool) -> Result<(), BridgeError> {
        self.apply("toggle_column", |wf| wf.toggle_column(column, included))
    }

    pub fn select_all_columns(&self) -> Result<(), BridgeError> {
        self.apply("select_all_columns", |wf| wf.select_all_columns())
    }

    /// Stages the loaded rows onto the current selection.
    pub fn select_rows(&self) -> Result<(), BridgeError> {
        self.apply("select_rows", |wf| wf.select_rows())
    }

    pub fn edit_field(
        &self,
        row_index: usize,
        column: &str,
        value: impl Into<String>,
    ) -> Result<(), BridgeError> {
        self.apply("edit_field", |wf| wf.edit_field(row_index, column, value))
    }

    pub fn set_ingest_table(&self, table: &str) -> Result<(), BridgeError> {
        self.apply("set_ingest_table", |wf| wf.set_ingest_table(table))
    }

    pub fn retry(&self) -> Result<(), BridgeError> {
        self.apply("retry", |wf| wf.retry())
    }

    pub fn logout(&self) {
        let mut inner = self.lock();
        self.credentials.clear();
        inner.workflow = inner.workflow.logout();
        info!("👋 Logged out");
    }

    /// Back to source selection. Outstanding responses become stale.
    pub fn reset(&self) {
        let mut inner = self.lock();
        self.credentials.clear();
        inner.workflow = inner.workflow.reset();
        info!(generation = inner.workflow.generation(), "🔄 Workflow reset");
    }

    // --- NETWORK-BOUND TRANSITIONS ---

    #[instrument(skip(self, params), fields(host = %params.host, database = %params.database))]
    pub async fn connect(&self, params: ConnectionParams) -> Result<Trigger<String>, BridgeError> {
        let credentials = Arc::clone(&self.credentials);
        let Some((ticket, params)) = self.begin(Action::Connect, |wf| {
            if credentials.is_issued() {
                return Err(DomainError::Validation(
                    "A session credential is already held; resume the session or log out first"
                        .into(),
                ));
            }
            wf.begin_connect(params.clone()).map(|next| (next, params))
        })?
        else {
            return Ok(Trigger::Ignored);
        };

        info!(port = params.port, "🔌 Connecting to data source");
        let result = self.source.connect(&params).await;

        let mut issue_error: Option<DomainError> = None;
        let trigger = self.settle(
            ticket,
            result,
            |wf, session| match self.credentials.issue(session.credential.clone()) {
                Ok(()) => wf.connected(session.message.clone()),
                Err(e) => {
                    let next = wf.connect_failed(e.kind(), e.to_string());
                    issue_error = Some(e);
                    next
                }
            },
            |wf, e| wf.connect_failed(e.kind(), e.user_message()),
        )?;

        if let Some(e) = issue_error {
            return Err(e.into());
        }
        Ok(trigger.map(|session| session.message))
    }

    /// Reuses a credential already held by the shared holder, after asking the
    /// source whether it is still valid.
    #[instrument(skip(self))]
    pub async fn resume_session(&self) -> Result<Trigger<bool>, BridgeError> {
        let credentials = Arc::clone(&self.credentials);
        let Some((ticket, credential)) = self.begin(Action::ResumeSession, |wf| {
            let credential = credentials.require("resume_session")?;
            wf.begin_resume().map(|next| (next, credential))
        })?
        else {
            return Ok(Trigger::Ignored);
        };

        let result = self.source.validate(&credential).await;
        self.settle(
            ticket,
            result,
            |wf, valid| {
                if *valid {
                    wf.connected("Session resumed")
                } else {
                    self.credentials.clear();
                    wf.with_notice(Notice::Error {
                        kind: FailureKind::Auth,
                        message: "Stored credential is no longer valid; connect again".into(),
                    })
                }
            },
            |wf, e| wf.schema_failed(e.kind(), e.user_message()),
        )
    }

    pub async fn list_tables(&self) -> Result<Trigger<Vec<TableName>>, BridgeError> {
        let Some((ticket, ())) = self.begin(Action::ListTables, |wf| {
            wf.begin_list_tables().map(|next| (next, ()))
        })?
        else {
            return Ok(Trigger::Ignored);
        };

        let result = self.explorer.list_tables().await;
        self.settle(
            ticket,
            result,
            |wf, tables| wf.tables_listed(tables.clone()),
            |wf, e| self.schema_error(wf, e),
        )
    }

    /// Selecting a table resets the selection and fetches its columns exactly once.
    /// Re-selecting the table whose columns are still loading is a duplicate; a
    /// different table supersedes the outstanding request.
    pub async fn select_table(&self, table: &str) -> Result<Trigger<Vec<ColumnName>>, BridgeError> {
        let Some((ticket, ())) = self.begin_with(
            Action::ListColumns,
            |wf| wf.table() == Some(table),
            |wf| wf.select_table(table).map(|next| (next, ())),
        )?
        else {
            return Ok(Trigger::Ignored);
        };

        let result = self.explorer.list_columns(table).await;
        self.settle(
            ticket,
            result,
            |wf, columns| wf.columns_listed(columns.clone()),
            |wf, e| self.schema_error(wf, e),
        )
    }

    /// Parses the chosen file; returns the inferred header columns.
    pub async fn load_file(&self) -> Result<Trigger<Vec<ColumnName>>, BridgeError> {
        let Some((ticket, upload)) = self.begin(Action::LoadFile, |wf| wf.begin_load_file())?
        else {
            return Ok(Trigger::Ignored);
        };

        let result = self.explorer.load_file(&upload).await;
        let trigger = self.settle(
            ticket,
            result,
            |wf, loaded| {
                wf.file_loaded(loaded.rows.clone(), loaded.message.clone())
                    .unwrap_or_else(|e| wf.file_failed(e.kind(), e.to_string()))
            },
            |wf, e| wf.file_failed(e.kind(), e.user_message()),
        )?;

        Ok(trigger.map(|loaded| {
            loaded
                .rows
                .first()
                .map(|row| row.columns().map(str::to_string).collect())
                .unwrap_or_default()
        }))
    }

    /// Exports to the configured destination.
    pub async fn export(&self) -> Result<Trigger<Outcome>, BridgeError> {
        let destination = self.options.export_destination.clone();
        self.export_to(&destination).await
    }

    pub async fn export_to(&self, destination: &str) -> Result<Trigger<Outcome>, BridgeError> {
        let Some((ticket, request)) =
            self.begin(Action::Export, |wf| wf.begin_export(destination))?
        else {
            return Ok(Trigger::Ignored);
        };

        let held = self.credentials.is_issued();
        let outcome = self.executor.export_table(&request).await;
        Ok(self.finish_transfer(ticket, held, outcome))
    }

    pub async fn ingest(&self) -> Result<Trigger<Outcome>, BridgeError> {
        let batch_size = self.options.batch_size;
        let Some((ticket, request)) =
            self.begin(Action::Ingest, |wf| wf.begin_ingest(batch_size))?
        else {
            return Ok(Trigger::Ignored);
        };

        let held = self.credentials.is_issued();
        let outcome = self.executor.ingest_rows(&request).await;
        Ok(self.finish_transfer(ticket, held, outcome))
    }

    // --- PLUMBING ---

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(
        &self,
        action: &str,
        transition: impl FnOnce(&Workflow) -> Result<Workflow, DomainError>,
    ) -> Result<(), BridgeError> {
        let mut inner = self.lock();
        match transition(&inner.workflow) {
            Ok(next) => {
                debug!(action, from = %inner.workflow.state(), to = %next.state(), "Transition");
                inner.workflow = next;
                Ok(())
            }
            Err(e) => Err(Self::reject(&mut inner, action, e)),
        }
    }

    fn begin<P>(
        &self,
        action: Action,
        transition: impl FnOnce(&Workflow) -> Result<(Workflow, P), DomainError>,
    ) -> Result<Option<(Ticket, P)>, BridgeError> {
        self.begin_with(action, |_| true, transition)
    }

    /// Registers `action` unless it is already outstanding in the current generation
    /// and `is_duplicate` confirms the new trigger repeats it. A different action
    /// outstanding in the current generation refuses the trigger; only a newer
    /// request of the same action (or a reset) supersedes an outstanding one.
    fn begin_with<P>(
        &self,
        action: Action,
        is_duplicate: impl FnOnce(&Workflow) -> bool,
        transition: impl FnOnce(&Workflow) -> Result<(Workflow, P), DomainError>,
    ) -> Result<Option<(Ticket, P)>, BridgeError> {
        let mut inner = self.lock();
        let generation = inner.workflow.generation();
        if inner.in_flight.is_outstanding(action, generation) && is_duplicate(&inner.workflow) {
            debug!(%action, generation, "Dropping duplicate trigger");
            return Ok(None);
        }

        if let Some(busy) = inner.in_flight.busy_with(action, generation) {
            let e = DomainError::transition(&action.to_string(), format!("{} is outstanding", busy));
            return Err(Self::reject(&mut inner, &action.to_string(), e));
        }

        let (next, payload) = match transition(&inner.workflow) {
            Ok(value) => value,
            Err(e) => return Err(Self::reject(&mut inner, &action.to_string(), e)),
        };

        let Some(ticket) = inner.in_flight.begin(action, next.generation()) else {
            debug!(%action, "Dropping duplicate trigger");
            return Ok(None);
        };
        debug!(%action, generation = ticket.generation, from = %inner.workflow.state(), to = %next.state(), "Request issued");
        inner.workflow = next;
        Ok(Some((ticket, payload)))
    }

    /// Applies a response unless its generation has been superseded.
    fn complete(&self, ticket: Ticket, apply: impl FnOnce(&Workflow) -> Workflow) -> bool {
        let mut inner = self.lock();
        inner.in_flight.finish(&ticket);

        let current = inner.workflow.generation();
        if ticket.generation != current {
            warn!(
                action = %ticket.action,
                issued = ticket.generation,
                current,
                "Discarding stale response"
            );
            return false;
        }

        inner.workflow = apply(&inner.workflow);
        true
    }

    fn settle<T>(
        &self,
        ticket: Ticket,
        result: Result<T, BridgeError>,
        on_ok: impl FnOnce(&Workflow, &T) -> Workflow,
        on_err: impl FnOnce(&Workflow, &BridgeError) -> Workflow,
    ) -> Result<Trigger<T>, BridgeError> {
        let fresh = match &result {
            Ok(value) => self.complete(ticket, |wf| on_ok(wf, value)),
            Err(e) => self.complete(ticket, |wf| on_err(wf, e)),
        };
        if !fresh {
            return Ok(Trigger::Stale);
        }
        result.map(Trigger::Applied)
    }

    // An auth failure after a credential was held means the executor dropped it
    // as rejected; without one it is a local missing-credential failure.
    fn finish_transfer(&self, ticket: Ticket, held: bool, outcome: Outcome) -> Trigger<Outcome> {
        let rejected = held
            && outcome.failure_kind() == Some(FailureKind::Auth)
            && !self.credentials.is_issued();

        let fresh = self.complete(ticket, |wf| {
            if rejected {
                wf.transfer_rejected(outcome.message())
            } else {
                wf.transfer_finished(outcome.clone())
            }
        });
        if !fresh {
            return Trigger::Stale;
        }

        match &outcome {
            Outcome::Success { message, records } => {
                info!(?records, "✨ {}", message)
            }
            Outcome::Failure { kind, message } => warn!(%kind, "Transfer failed: {}", message),
        }
        Trigger::Applied(outcome)
    }

    // A rejected credential invalidates the session; anything else stays in place.
    fn schema_error(&self, wf: &Workflow, e: &BridgeError) -> Workflow {
        if e.is_rejected_credential() {
            self.credentials.clear();
            wf.credential_rejected(e.user_message())
        } else {
            wf.schema_failed(e.kind(), e.user_message())
        }
    }

    fn reject(inner: &mut Inner, action: &str, e: DomainError) -> BridgeError {
        debug!(action, state = %inner.workflow.state(), "Rejected: {}", e);
        inner.workflow = inner.workflow.with_notice(Notice::Error {
            kind: e.kind(),
            message: e.to_string(),
        });
        e.into()
    }
}

// chbridge-core/src/domain/workflow/snapshot.rs
//
// Immutable workflow snapshot. Every transition borrows the current value and
// returns the next one; the coordinator swaps snapshots atomically.

use crate::domain::error::{DomainError, FailureKind};
use crate::domain::schema::{ColumnName, EditableRow, RawRow, TableName};
use crate::domain::selector::ColumnSelector;
use crate::domain::source::{ConnectionParams, FileUpload, Source};
use crate::domain::stager::RowStager;
use crate::domain::transfer::{ExportRequest, IngestRequest, Outcome};
use crate::domain::workflow::flight::Generation;
use crate::domain::workflow::state::{Failure, Notice, WorkflowState};

#[derive(Debug, Clone, Default)]
pub struct Workflow {
    source: Option<Source>,
    state: WorkflowState,
    generation: Generation,
    connection: Option<ConnectionParams>,
    tables: Vec<TableName>,
    table: Option<TableName>,
    selector: ColumnSelector,
    file: Option<FileUpload>,
    raw_rows: Vec<RawRow>,
    rows: Vec<EditableRow>,
    ingest_table: Option<TableName>,
    notice: Option<Notice>,
    message: Option<String>,
    outcome: Option<Outcome>,
    resume: Option<WorkflowState>,
}

// --- ACCESSORS ---

impl Workflow {
    pub fn source(&self) -> Option<Source> {
        self.source
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn connection(&self) -> Option<&ConnectionParams> {
        self.connection.as_ref()
    }

    pub fn tables(&self) -> &[TableName] {
        &self.tables
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn columns(&self) -> &[ColumnName] {
        self.selector.available()
    }

    pub fn selected_columns(&self) -> &[ColumnName] {
        self.selector.selected()
    }

    pub fn file(&self) -> Option<&FileUpload> {
        self.file.as_ref()
    }

    pub fn raw_rows(&self) -> &[RawRow] {
        &self.raw_rows
    }

    pub fn rows(&self) -> &[EditableRow] {
        &self.rows
    }

    pub fn ingest_table(&self) -> Option<&str> {
        self.ingest_table.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }
}

// --- TRANSITIONS ---

impl Workflow {
    pub fn choose_database(&self) -> Result<Self, DomainError> {
        self.require_unchosen("choose the database source")?;
        let mut next = self.clone();
        next.source = Some(Source::Database);
        next.state = WorkflowState::Connecting;
        next.notice = None;
        Ok(next)
    }

    pub fn choose_flat_file(&self, upload: FileUpload) -> Result<Self, DomainError> {
        self.require_unchosen("choose the flat file source")?;
        let mut next = self.clone();
        next.source = Some(Source::FlatFile);
        next.invalidate_schema();
        next.file = Some(upload);
        next.state = WorkflowState::AwaitingSchema;
        next.notice = None;
        Ok(next)
    }

    /// Re-upload: the previous file's columns, selection and rows are dropped.
    pub fn replace_file(&self, upload: FileUpload) -> Result<Self, DomainError> {
        self.require_source(Source::FlatFile, "replace the file")?;
        self.require_not_transferring("replace the file")?;
        let mut next = self.clone();
        next.invalidate_schema();
        next.file = Some(upload);
        next.state = WorkflowState::AwaitingSchema;
        next.notice = None;
        next.message = None;
        Ok(next)
    }

    pub fn begin_connect(&self, params: ConnectionParams) -> Result<Self, DomainError> {
        self.require_session_step("connect")?;
        params.check()?;
        let mut next = self.clone();
        next.connection = Some(params);
        next.notice = None;
        Ok(next)
    }

    pub fn begin_resume(&self) -> Result<Self, DomainError> {
        self.require_session_step("resume the session")?;
        let mut next = self.clone();
        next.notice = None;
        Ok(next)
    }

    pub fn connected(&self, message: impl Into<String>) -> Self {
        let mut next = self.clone();
        if next.source == Some(Source::Database) && next.state == WorkflowState::Connecting {
            next.state = WorkflowState::AwaitingSchema;
        }
        next.message = Some(message.into());
        next.notice = None;
        next
    }

    pub fn connect_failed(&self, kind: FailureKind, reason: impl Into<String>) -> Self {
        let mut next = self.clone();
        let reason = reason.into();
        if next.source == Some(Source::Database) {
            next.state = WorkflowState::Failed(Failure { kind, reason });
            next.resume = Some(WorkflowState::Connecting);
        } else {
            next.notice = Some(Notice::Error {
                kind,
                message: reason,
            });
        }
        next
    }

    /// The data source refused the credential: everything derived from the
    /// session is invalid and the database branch goes back to Connecting.
    /// Connection fields are kept for re-entry.
    pub fn credential_rejected(&self, message: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.notice = Some(Notice::Error {
            kind: FailureKind::Auth,
            message: message.into(),
        });
        if next.source == Some(Source::Database) {
            next.drop_database_schema();
            next.state = WorkflowState::Connecting;
        }
        next
    }

    pub fn begin_list_tables(&self) -> Result<Self, DomainError> {
        self.require_source(Source::Database, "list tables")?;
        if !matches!(
            self.state,
            WorkflowState::AwaitingSchema
                | WorkflowState::SelectingColumns
                | WorkflowState::StagingRows
        ) {
            return Err(DomainError::transition("list tables", &self.state));
        }
        let mut next = self.clone();
        next.notice = None;
        Ok(next)
    }

    /// An empty list is an empty state, not an error.
    pub fn tables_listed(&self, tables: Vec<TableName>) -> Self {
        let mut next = self.clone();
        next.notice = if tables.is_empty() {
            Some(Notice::Empty("No tables found in the database.".into()))
        } else {
            None
        };
        next.tables = tables;
        next
    }

    pub fn schema_failed(&self, kind: FailureKind, message: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.notice = Some(Notice::Error {
            kind,
            message: message.into(),
        });
        next
    }

    /// Selecting a table always starts a new generation: columns, selection and
    /// staged rows of the previous table are discarded.
    pub fn select_table(&self, table: &str) -> Result<Self, DomainError> {
        self.require_source(Source::Database, "select a table")?;
        if !matches!(
            self.state,
            WorkflowState::AwaitingSchema
                | WorkflowState::SelectingColumns
                | WorkflowState::StagingRows
                | WorkflowState::Done
                | WorkflowState::Failed(_)
        ) {
            return Err(DomainError::transition("select a table", &self.state));
        }
        if !self.tables.iter().any(|t| t == table) {
            return Err(DomainError::Validation(format!(
                "Table '{}' is not part of the listed tables",
                table
            )));
        }

        let mut next = self.clone();
        next.invalidate_schema();
        next.table = Some(table.to_string());
        next.state = WorkflowState::AwaitingSchema;
        next.notice = None;
        next.message = None;
        Ok(next)
    }

    pub fn columns_listed(&self, columns: Vec<ColumnName>) -> Self {
        let mut next = self.clone();
        if columns.is_empty() {
            next.selector = ColumnSelector::default();
            next.notice = Some(Notice::Empty(format!(
                "No columns found for table '{}'.",
                next.table.as_deref().unwrap_or_default()
            )));
        } else {
            next.selector = ColumnSelector::new(columns);
            next.state = WorkflowState::SelectingColumns;
            next.notice = None;
        }
        next
    }

    pub fn begin_load_file(&self) -> Result<(Self, FileUpload), DomainError> {
        self.require_source(Source::FlatFile, "load the file")?;
        if self.state != WorkflowState::AwaitingSchema {
            return Err(DomainError::transition("load the file", &self.state));
        }
        let upload = self
            .file
            .clone()
            .ok_or_else(|| DomainError::Validation("Please upload a file.".into()))?;
        let mut next = self.clone();
        next.notice = None;
        Ok((next, upload))
    }

    /// Columns are the keys of the first row, in header order.
    pub fn file_loaded(
        &self,
        rows: Vec<RawRow>,
        message: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let first = rows.first().ok_or(DomainError::EmptyFile)?;
        let columns: Vec<ColumnName> = first.columns().map(str::to_string).collect();

        let mut next = self.clone();
        next.selector = ColumnSelector::new(columns);
        next.raw_rows = rows;
        next.rows.clear();
        next.state = WorkflowState::SelectingColumns;
        next.message = Some(message.into());
        next.notice = None;
        Ok(next)
    }

    pub fn file_failed(&self, kind: FailureKind, message: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.selector = ColumnSelector::default();
        next.raw_rows.clear();
        next.rows.clear();
        next.notice = Some(Notice::Error {
            kind,
            message: message.into(),
        });
        next
    }

    /// Already staged rows keep the key set they were projected with.
    pub fn toggle_column(&self, column: &str, included: bool) -> Result<Self, DomainError> {
        self.require_column_step("toggle a column")?;
        let mut next = self.clone();
        next.selector = self.selector.toggle(column, included)?;
        next.notice = None;
        Ok(next)
    }

    pub fn select_all_columns(&self) -> Result<Self, DomainError> {
        self.require_column_step("select all columns")?;
        let mut next = self.clone();
        next.selector = self.selector.select_all();
        next.notice = None;
        Ok(next)
    }

    pub fn select_rows(&self) -> Result<Self, DomainError> {
        self.require_column_step("select rows")?;
        let rows = RowStager::stage_selected(&self.raw_rows, self.selector.selected())?;
        let mut next = self.clone();
        next.rows = rows;
        next.state = WorkflowState::StagingRows;
        next.notice = None;
        Ok(next)
    }

    pub fn edit_field(
        &self,
        row_index: usize,
        column: &str,
        value: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if self.state != WorkflowState::StagingRows {
            return Err(DomainError::transition("edit a row", &self.state));
        }
        let mut next = self.clone();
        next.rows = RowStager::edit_field(&self.rows, row_index, column, value)?;
        next.notice = None;
        Ok(next)
    }

    /// Target of a flat-file ingest. Does not touch the file schema.
    pub fn set_ingest_table(&self, table: &str) -> Result<Self, DomainError> {
        self.require_source(Source::FlatFile, "choose the ingest table")?;
        self.require_not_transferring("choose the ingest table")?;
        let table = table.trim();
        if table.is_empty() {
            return Err(DomainError::Validation("Table name cannot be empty.".into()));
        }
        let mut next = self.clone();
        next.ingest_table = Some(table.to_string());
        Ok(next)
    }

    pub fn begin_export(&self, destination: &str) -> Result<(Self, ExportRequest), DomainError> {
        self.require_source(Source::Database, "export")?;
        if !matches!(
            self.state,
            WorkflowState::SelectingColumns | WorkflowState::StagingRows
        ) {
            return Err(DomainError::transition("export", &self.state));
        }
        let request = ExportRequest {
            table: self.table.clone().unwrap_or_default(),
            columns: self.selector.selected().to_vec(),
            destination: destination.to_string(),
        };
        request.check()?;
        Ok((self.enter_transfer(), request))
    }

    pub fn begin_ingest(&self, batch_size: usize) -> Result<(Self, IngestRequest), DomainError> {
        self.require_source(Source::FlatFile, "ingest")?;
        if self.state != WorkflowState::StagingRows {
            return Err(DomainError::transition("ingest", &self.state));
        }
        let request = IngestRequest {
            table: self.ingest_table.clone().unwrap_or_default(),
            rows: self.rows.clone(),
            batch_size,
        };
        request.check()?;
        Ok((self.enter_transfer(), request))
    }

    pub fn transfer_finished(&self, outcome: Outcome) -> Self {
        let mut next = self.clone();
        match &outcome {
            Outcome::Success { message, .. } => {
                next.state = WorkflowState::Done;
                next.message = Some(message.clone());
                next.resume = None;
            }
            Outcome::Failure { kind, message } => {
                next.state = WorkflowState::Failed(Failure {
                    kind: *kind,
                    reason: message.clone(),
                });
            }
        }
        next.outcome = Some(outcome);
        next
    }

    /// Credential refused during a transfer. Staged rows of a flat-file workflow
    /// survive; the database branch must reconnect and rediscover its schema.
    pub fn transfer_rejected(&self, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut next = self.transfer_finished(Outcome::Failure {
            kind: FailureKind::Auth,
            message,
        });
        if next.source == Some(Source::Database) {
            next.drop_database_schema();
            next.resume = Some(WorkflowState::Connecting);
        }
        next
    }

    /// Leaves Failed for the step that failed, with the entered data intact.
    pub fn retry(&self) -> Result<Self, DomainError> {
        if !matches!(self.state, WorkflowState::Failed(_)) {
            return Err(DomainError::transition("retry", &self.state));
        }
        let mut next = self.clone();
        next.state = next.resume.take().unwrap_or(match next.source {
            Some(Source::FlatFile) => WorkflowState::AwaitingSchema,
            _ => WorkflowState::Connecting,
        });
        next.notice = None;
        Ok(next)
    }

    /// Every outstanding request goes stale. Staged flat-file rows survive, and a
    /// transfer cut short returns to the step it started from.
    pub fn logout(&self) -> Self {
        let mut next = self.clone();
        if next.source == Some(Source::Database) {
            next.drop_database_schema();
            next.state = WorkflowState::Connecting;
        } else {
            next.generation += 1;
            if next.state == WorkflowState::Transferring {
                next.state = next.resume.take().unwrap_or(WorkflowState::StagingRows);
            }
        }
        next.message = None;
        next.notice = None;
        next
    }

    pub fn reset(&self) -> Self {
        Self {
            generation: self.generation + 1,
            ..Self::default()
        }
    }

    pub fn with_notice(&self, notice: Notice) -> Self {
        let mut next = self.clone();
        next.notice = Some(notice);
        next
    }
}

// --- GUARDS & HELPERS ---

impl Workflow {
    fn require_unchosen(&self, action: &str) -> Result<(), DomainError> {
        if let Some(source) = self.source {
            return Err(DomainError::Validation(format!(
                "Source already chosen ({}); reset the workflow to {}",
                source, action
            )));
        }
        if self.state != WorkflowState::SelectingSource {
            return Err(DomainError::transition(action, &self.state));
        }
        Ok(())
    }

    fn require_source(&self, expected: Source, action: &str) -> Result<(), DomainError> {
        match self.source {
            Some(source) if source == expected => Ok(()),
            _ => Err(DomainError::transition(action, &self.state)),
        }
    }

    fn require_not_transferring(&self, action: &str) -> Result<(), DomainError> {
        if self.state == WorkflowState::Transferring {
            return Err(DomainError::transition(action, &self.state));
        }
        Ok(())
    }

    // Database: only from Connecting. Flat file: any step once the source is chosen,
    // since authentication is only needed for the final ingest.
    fn require_session_step(&self, action: &str) -> Result<(), DomainError> {
        match self.source {
            Some(Source::Database) if self.state == WorkflowState::Connecting => Ok(()),
            Some(Source::FlatFile) => self.require_not_transferring(action),
            _ => Err(DomainError::transition(action, &self.state)),
        }
    }

    fn require_column_step(&self, action: &str) -> Result<(), DomainError> {
        if !matches!(
            self.state,
            WorkflowState::SelectingColumns | WorkflowState::StagingRows
        ) {
            return Err(DomainError::transition(action, &self.state));
        }
        Ok(())
    }

    fn enter_transfer(&self) -> Self {
        let mut next = self.clone();
        next.resume = Some(self.state.clone());
        next.state = WorkflowState::Transferring;
        next.outcome = None;
        next.notice = None;
        next
    }

    fn invalidate_schema(&mut self) {
        self.generation += 1;
        self.selector = ColumnSelector::default();
        self.raw_rows.clear();
        self.rows.clear();
        self.outcome = None;
        self.resume = None;
    }

    fn drop_database_schema(&mut self) {
        self.invalidate_schema();
        self.tables.clear();
        self.table = None;
    }
}

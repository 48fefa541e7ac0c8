pub mod error;
pub mod schema;
pub mod selector;
pub mod source;
pub mod stager;
pub mod transfer;
pub mod workflow;

// Handy re-exports to keep imports short elsewhere
pub use error::{DomainError, FailureKind};
pub use schema::{ColumnName, EditableRow, RawRow, TableName};
pub use selector::ColumnSelector;
pub use source::{ConnectionParams, Credential, FileUpload, Session, Source};
pub use stager::RowStager;
pub use transfer::{ExportRequest, IngestReceipt, IngestRequest, Outcome};
pub use workflow::{Action, Failure, Generation, Notice, Ticket, Workflow, WorkflowState};

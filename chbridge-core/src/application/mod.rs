// chbridge-core/src/application/mod.rs

pub mod coordinator;
pub mod credentials;
pub mod explorer;
pub mod transfer;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Lets the CLI write `use chbridge_core::application::{WorkflowCoordinator, Trigger};`
// without knowing the file layout.

pub use coordinator::{Trigger, WorkflowCoordinator, WorkflowOptions};
pub use credentials::CredentialHolder;
pub use explorer::SchemaExplorer;
pub use transfer::TransferExecutor;

pub mod flight;
pub mod snapshot;
pub mod state;

pub use flight::{Generation, InFlight, Ticket};
pub use snapshot::Workflow;
pub use state::{Action, Failure, Notice, WorkflowState};

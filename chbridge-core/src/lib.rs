// chbridge-core/src/lib.rs

#![allow(missing_docs)]
// 1. Memory safety
#![deny(unsafe_code)]
// 2. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 3. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts required from the data-source service and the file loader.
pub mod ports;

// 2. Domain
// Workflow snapshot, column selection, row staging, transfer requests.
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure (Adapters)
// HTTP data source, delimited file loader, configuration.
pub mod infrastructure;

// 4. Application (Use Cases)
// Credential holder, schema explorer, transfer executor, workflow coordinator.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use application::{CredentialHolder, Trigger, WorkflowCoordinator, WorkflowOptions};
pub use error::BridgeError;

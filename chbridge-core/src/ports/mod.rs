// chbridge-core/src/ports/mod.rs

pub mod data_source;
pub mod file_loader;

pub use data_source::DataSource;
pub use file_loader::{FileLoader, LoadedFile};

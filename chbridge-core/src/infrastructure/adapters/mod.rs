// chbridge-core/src/infrastructure/adapters/mod.rs

pub mod delimited;
pub mod http;

pub use delimited::DelimitedFileLoader;
pub use http::HttpDataSource;

// chbridge-core/src/ports/file_loader.rs

use crate::domain::schema::RawRow;
use crate::domain::source::FileUpload;
use crate::error::BridgeError;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub message: String,
    pub rows: Vec<RawRow>,
}

/// Turns uploaded bytes into raw rows. May parse locally or call a remote service.
#[async_trait]
pub trait FileLoader: Send + Sync {
    async fn load_file(&self, upload: &FileUpload) -> Result<LoadedFile, BridgeError>;
}

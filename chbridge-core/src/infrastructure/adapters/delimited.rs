// chbridge-core/src/infrastructure/adapters/delimited.rs

use async_trait::async_trait;
use csv::ReaderBuilder;
use std::collections::HashSet;
use tracing::{debug, instrument};

use crate::domain::error::DomainError;
use crate::domain::schema::RawRow;
use crate::domain::source::FileUpload;
use crate::error::BridgeError;
use crate::ports::{FileLoader, LoadedFile};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parses uploaded delimited text locally. The first line is the header; every
/// following record becomes one row keyed by header name.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelimitedFileLoader;

impl DelimitedFileLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, upload: &FileUpload) -> Result<LoadedFile, BridgeError> {
        let delimiter = resolve_delimiter(&upload.delimiter)?;
        let bytes = upload
            .bytes
            .strip_prefix(UTF8_BOM)
            .unwrap_or(&upload.bytes);

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(DomainError::EmptyFile.into());
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = headers.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(DomainError::Parse(format!(
                "Duplicate column '{}' in header of '{}'",
                duplicate, upload.name
            ))
            .into());
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(RawRow::from_pairs(
                headers.iter().map(String::as_str).zip(record.iter()),
            ));
        }

        debug!(columns = headers.len(), rows = rows.len(), "Parsed delimited file");
        Ok(LoadedFile {
            message: format!("File loaded successfully! Parsed rows: {}", rows.len()),
            rows,
        })
    }
}

#[async_trait]
impl FileLoader for DelimitedFileLoader {
    #[instrument(skip_all, fields(file = %upload.name, bytes = upload.bytes.len()))]
    async fn load_file(&self, upload: &FileUpload) -> Result<LoadedFile, BridgeError> {
        self.parse(upload)
    }
}

/// Accepts any single ASCII character, plus `\t` and `tab` for tab-separated files.
pub fn resolve_delimiter(raw: &str) -> Result<u8, DomainError> {
    match raw {
        "\\t" | "tab" | "TAB" => return Ok(b'\t'),
        _ => {}
    }
    match raw.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        [] => Err(DomainError::Validation("Delimiter cannot be empty.".into())),
        _ => Err(DomainError::Validation(format!(
            "Delimiter must be a single ASCII character, got '{}'",
            raw
        ))),
    }
}

// chbridge/src/commands/mod.rs
//
// Wiring shared by every command: configuration, adapters, staging and rendering.

pub mod columns;
pub mod export;
pub mod ingest;
pub mod preview;
pub mod tables;

use anyhow::{Context, Result, bail};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use chbridge_core::application::{CredentialHolder, WorkflowCoordinator, WorkflowOptions};
use chbridge_core::domain::{ConnectionParams, EditableRow, FileUpload, Notice, Outcome};
use chbridge_core::infrastructure::adapters::{DelimitedFileLoader, HttpDataSource};
use chbridge_core::infrastructure::config::{BridgeConfig, load_config};

use crate::cli::{ConnectionArgs, StagingArgs};

pub fn load_settings(project_dir: &Path) -> Result<BridgeConfig> {
    load_config(project_dir)
        .with_context(|| format!("Failed to load configuration from {}", project_dir.display()))
}

pub fn build_coordinator(config: &BridgeConfig, options: WorkflowOptions) -> Result<WorkflowCoordinator> {
    let source = HttpDataSource::new(&config.service.base_url, config.service.timeout())?;
    debug!(base_url = %source.base_url(), "Using bridge service");
    Ok(WorkflowCoordinator::new(
        Arc::new(source),
        Arc::new(DelimitedFileLoader::new()),
        Arc::new(CredentialHolder::new()),
        options,
    ))
}

pub fn workflow_options(
    config: &BridgeConfig,
    batch_size: Option<usize>,
    destination: Option<String>,
) -> WorkflowOptions {
    WorkflowOptions {
        batch_size: batch_size.unwrap_or(config.transfer.batch_size),
        export_destination: destination.unwrap_or_else(|| config.transfer.export_destination.clone()),
    }
}

pub async fn connect(wf: &WorkflowCoordinator, args: &ConnectionArgs) -> Result<()> {
    println!("🔌 Connecting to {}:{}/{}...", args.host, args.port, args.database);
    let params = ConnectionParams {
        host: args.host.clone(),
        port: args.port,
        database: args.database.clone(),
        username: args.username.clone(),
        password: args.password.clone(),
    };
    if let Some(message) = wf.connect(params).await?.applied() {
        println!("   {}", message);
    }
    Ok(())
}

/// Chooses the flat-file source, parses the file, selects columns, stages rows
/// and applies the requested edits.
pub async fn stage_file(wf: &WorkflowCoordinator, args: &StagingArgs, config: &BridgeConfig) -> Result<()> {
    let bytes = fs::read(&args.file)
        .with_context(|| format!("Could not read {}", args.file.display()))?;
    let delimiter = args
        .delimiter
        .clone()
        .unwrap_or_else(|| config.file.delimiter.clone());
    let name = args.file.display().to_string();

    wf.choose_flat_file(FileUpload::new(name, bytes, delimiter))?;
    wf.load_file().await?;
    if let Some(message) = wf.snapshot().message() {
        println!("📄 {}", message);
    }

    if args.columns.is_empty() {
        wf.select_all_columns()?;
    } else {
        for column in &args.columns {
            wf.toggle_column(column.trim(), true)?;
        }
    }
    wf.select_rows()?;

    for raw in &args.edits {
        let (row, column, value) = parse_edit(raw)?;
        wf.edit_field(row, &column, value)
            .with_context(|| format!("Invalid edit '{}'", raw))?;
    }
    Ok(())
}

/// Parses `ROW:COLUMN=VALUE`. The value may be empty and may contain `=`.
pub fn parse_edit(raw: &str) -> Result<(usize, String, String)> {
    let Some((target, value)) = raw.split_once('=') else {
        bail!("Edit '{}' must look like ROW:COLUMN=VALUE", raw);
    };
    let Some((row, column)) = target.split_once(':') else {
        bail!("Edit '{}' must look like ROW:COLUMN=VALUE", raw);
    };
    let row = row
        .trim()
        .parse()
        .with_context(|| format!("Row index in '{}' is not a number", raw))?;
    let column = column.trim();
    if column.is_empty() {
        bail!("Edit '{}' names no column", raw);
    }
    Ok((row, column.to_string(), value.to_string()))
}

pub fn print_notice(notice: Option<&Notice>) {
    match notice {
        Some(Notice::Empty(message)) => println!("ℹ️  {}", message),
        Some(Notice::Error { kind, message }) => eprintln!("⚠️  [{}] {}", kind, message),
        None => {}
    }
}

/// Success is printed; any failure becomes the command's error.
pub fn report(outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Success { message, records } => {
            match records {
                Some(n) => println!("✨ {} ({} records)", message, n),
                None => println!("✨ {}", message),
            }
            Ok(())
        }
        Outcome::Failure { kind, message } => bail!("[{}] {}", kind, message),
    }
}

pub fn list_table(header: &str, items: &[String]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", header]);
    for (i, item) in items.iter().enumerate() {
        table.add_row(vec![i.to_string(), item.clone()]);
    }
    table
}

pub fn rows_table(rows: &[EditableRow]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let Some(first) = rows.first() else {
        return table;
    };
    let mut header = vec!["#".to_string()];
    header.extend(first.columns().map(str::to_string));
    table.set_header(header);

    for (i, row) in rows.iter().enumerate() {
        let mut cells = vec![i.to_string()];
        cells.extend(row.iter().map(|(_, value)| value.to_string()));
        table.add_row(cells);
    }
    table
}

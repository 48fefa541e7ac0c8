// chbridge/src/commands/export.rs
//
// USE CASE: database -> flat file. Connect, pick the table and columns, export.

use anyhow::bail;
use std::path::Path;
use std::time::Instant;

use super::{build_coordinator, connect, load_settings, report, workflow_options};
use crate::cli::ConnectionArgs;

pub async fn execute(
    project_dir: &Path,
    connection: ConnectionArgs,
    table: String,
    columns: Vec<String>,
    destination: Option<String>,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_settings(project_dir)?;
    let wf = build_coordinator(&config, workflow_options(&config, None, destination))?;

    wf.choose_database()?;
    connect(&wf, &connection).await?;
    wf.list_tables().await?;
    wf.select_table(&table).await?;
    if wf.snapshot().columns().is_empty() {
        bail!("Table '{}' has no columns to export", table);
    }

    for column in &columns {
        wf.toggle_column(column.trim(), true)?;
    }

    println!(
        "📤 Exporting {} column(s) of '{}' to {}...",
        columns.len(),
        table,
        wf.options().export_destination
    );
    match wf.export().await?.applied() {
        Some(outcome) => report(outcome)?,
        None => bail!("Export did not complete"),
    }
    println!("   Finished in {:.2?}", start.elapsed());
    Ok(())
}

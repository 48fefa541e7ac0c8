// chbridge/src/commands/ingest.rs
//
// USE CASE: flat file -> database. Stage the file, authenticate, ingest.

use anyhow::bail;
use std::path::Path;
use std::time::Instant;

use super::{build_coordinator, connect, load_settings, report, stage_file, workflow_options};
use crate::cli::{ConnectionArgs, StagingArgs};

pub async fn execute(
    project_dir: &Path,
    connection: ConnectionArgs,
    staging: StagingArgs,
    table: String,
    batch_size: Option<usize>,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_settings(project_dir)?;
    let wf = build_coordinator(&config, workflow_options(&config, batch_size, None))?;

    stage_file(&wf, &staging, &config).await?;
    wf.set_ingest_table(&table)?;
    connect(&wf, &connection).await?;

    println!(
        "📥 Ingesting {} row(s) into '{}' (batch size {})...",
        wf.snapshot().rows().len(),
        table,
        wf.options().batch_size
    );
    match wf.ingest().await?.applied() {
        Some(outcome) => report(outcome)?,
        None => bail!("Ingestion did not complete"),
    }
    println!("   Finished in {:.2?}", start.elapsed());
    Ok(())
}

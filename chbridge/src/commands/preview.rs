// chbridge/src/commands/preview.rs
//
// USE CASE: load and stage a flat file locally, then print what would be ingested.

use std::path::Path;

use super::{build_coordinator, load_settings, rows_table, stage_file, workflow_options};
use crate::cli::StagingArgs;

pub async fn execute(project_dir: &Path, staging: StagingArgs) -> anyhow::Result<()> {
    let config = load_settings(project_dir)?;
    let wf = build_coordinator(&config, workflow_options(&config, None, None))?;

    stage_file(&wf, &staging, &config).await?;

    let snapshot = wf.snapshot();
    println!("{}", rows_table(snapshot.rows()));
    println!(
        "👀 {} row(s) staged with columns [{}]",
        snapshot.rows().len(),
        snapshot.selected_columns().join(", ")
    );
    Ok(())
}

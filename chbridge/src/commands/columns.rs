// chbridge/src/commands/columns.rs
//
// USE CASE: connect, select a table and list its columns.

use std::path::Path;

use super::{build_coordinator, connect, list_table, load_settings, print_notice, workflow_options};
use crate::cli::ConnectionArgs;

pub async fn execute(project_dir: &Path, connection: ConnectionArgs, table: String) -> anyhow::Result<()> {
    let config = load_settings(project_dir)?;
    let wf = build_coordinator(&config, workflow_options(&config, None, None))?;

    wf.choose_database()?;
    connect(&wf, &connection).await?;
    wf.list_tables().await?;
    let columns = wf.select_table(&table).await?.applied().unwrap_or_default();

    if columns.is_empty() {
        print_notice(wf.snapshot().notice());
    } else {
        println!("🧾 Columns of '{}':", table);
        println!("{}", list_table("Column", &columns));
    }
    Ok(())
}

// chbridge/src/commands/tables.rs
//
// USE CASE: connect and list the tables of the database.

use std::path::Path;

use super::{build_coordinator, connect, list_table, load_settings, print_notice, workflow_options};
use crate::cli::ConnectionArgs;

pub async fn execute(project_dir: &Path, connection: ConnectionArgs) -> anyhow::Result<()> {
    let config = load_settings(project_dir)?;
    let wf = build_coordinator(&config, workflow_options(&config, None, None))?;

    wf.choose_database()?;
    connect(&wf, &connection).await?;
    let tables = wf.list_tables().await?.applied().unwrap_or_default();

    if tables.is_empty() {
        print_notice(wf.snapshot().notice());
    } else {
        println!("{}", list_table("Table", &tables));
    }
    Ok(())
}

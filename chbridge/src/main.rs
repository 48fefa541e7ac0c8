// chbridge/src/main.rs

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> miette::Result<()> {
    // RUST_LOG=debug chbridge tables ... to see request details
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_dir = cli.project_dir;

    let result = match cli.command {
        Commands::Tables { connection } => commands::tables::execute(&project_dir, connection).await,
        Commands::Columns { connection, table } => {
            commands::columns::execute(&project_dir, connection, table).await
        }
        Commands::Export {
            connection,
            table,
            columns,
            destination,
        } => commands::export::execute(&project_dir, connection, table, columns, destination).await,
        Commands::Preview { staging } => commands::preview::execute(&project_dir, staging).await,
        Commands::Ingest {
            connection,
            staging,
            table,
            batch_size,
        } => commands::ingest::execute(&project_dir, connection, staging, table, batch_size).await,
    };

    // Exit code 1 with the full error chain.
    result.map_err(|e| miette::miette!("{:#}", e))
}

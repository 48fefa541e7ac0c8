// chbridge/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chbridge")]
#[command(about = "Select, stage and transfer data between ClickHouse and flat files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding chbridge.yaml
    #[arg(long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection fields sent to the bridge service on connect.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    #[arg(long, env = "CHBRIDGE_HOST", default_value = "localhost")]
    pub host: String,

    #[arg(long, env = "CHBRIDGE_PORT", default_value_t = 8123)]
    pub port: u16,

    #[arg(long, env = "CHBRIDGE_DATABASE", default_value = "default")]
    pub database: String,

    #[arg(long, env = "CHBRIDGE_USERNAME", default_value = "default")]
    pub username: String,

    #[arg(long, env = "CHBRIDGE_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,
}

/// How a flat file is read and staged.
#[derive(Args, Debug, Clone)]
pub struct StagingArgs {
    /// Delimited file to load
    #[arg(long, short)]
    pub file: PathBuf,

    /// Field delimiter (single character, or "\t" / "tab"). Defaults to the configured one.
    #[arg(long, short)]
    pub delimiter: Option<String>,

    /// Columns to keep (comma separated). All columns when omitted.
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Edit a staged value, ROW:COLUMN=VALUE (row index starts at 0). Repeatable.
    #[arg(long = "set", value_name = "ROW:COLUMN=VALUE")]
    pub edits: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 📋 Connects and lists the tables of the database
    Tables {
        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// 🧾 Connects and lists the columns of one table
    Columns {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[arg(long, short)]
        table: String,
    },

    /// 📤 Exports selected columns of a table to a flat file on the service side
    Export {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[arg(long, short)]
        table: String,

        /// Columns to export (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,

        /// Destination path handed to the service. Defaults to the configured one.
        #[arg(long)]
        destination: Option<String>,
    },

    /// 👀 Loads a flat file and prints the staged rows (no network)
    Preview {
        #[command(flatten)]
        staging: StagingArgs,
    },

    /// 📥 Loads, stages and ingests a flat file into a table
    Ingest {
        #[command(flatten)]
        connection: ConnectionArgs,

        #[command(flatten)]
        staging: StagingArgs,

        /// Target table
        #[arg(long, short)]
        table: String,

        /// Advisory batch size. Defaults to the configured one.
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

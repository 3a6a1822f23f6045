//! SheetDrop CLI: validate spreadsheets locally and submit them to the upload endpoint.
//!
//! Set SHEETDROP_API_URL (or API_URL) and optionally SHEETDROP_UPLOAD_ROUTE.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sheetdrop_api_client::ApiClient;
use sheetdrop_cli::{init_tracing, open_sources, run_check, run_upload};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheetdrop", about = "SheetDrop upload CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and upload a CSV or Excel file (only the first path is used)
    Upload {
        /// Paths to spreadsheet files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Validate and read a file without uploading it
    Check {
        /// Paths to spreadsheet files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload { files } => {
            let client = ApiClient::from_env().context(
                "Failed to create API client. Check SHEETDROP_API_URL and SHEETDROP_UPLOAD_ROUTE",
            )?;
            let sources = open_sources(&files).await?;
            let report = run_upload(&client, sources).await?;
            print_json(&report)?;
        }
        Commands::Check { files } => {
            let sources = open_sources(&files).await?;
            let report = run_check(sources).await;
            print_json(&report)?;
            if !report.valid {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

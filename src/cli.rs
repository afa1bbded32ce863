use std::io::{self, Write};
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::dataset::export::{export_bytes, export_to_path, ExportFormat};
use crate::dataset::query::search_with_bands;
use crate::dataset::stats::{describe, key_metrics, period_stats};
use crate::parallel::{process_paths, BatchOutcome, WorkerPool};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "prodeff",
    version,
    about = "Extract employee efficiency records from X3 productivity reports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Parse reports and write the combined dataset.
    Extract {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Destination file; stdout when omitted (json and csv only).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Key metrics, period comparison and per-field statistics as JSON.
    Summary {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Case-insensitive search over employee name and matricule.
    Search {
        query: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Start the dashboard HTTP server.
    Serve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
    Xlsx,
}

/// Parse `args` (program name first) and run the command. Returns the process exit code.
pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 2,
            };
            let _ = err.print();
            return code;
        }
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return 2;
        }
    };

    run(cli.command, &config)
}

pub fn run(command: Command, config: &Config) -> i32 {
    match command {
        Command::Extract {
            files,
            format,
            output,
        } => handle_extract(&files, format, output.as_ref(), config),
        Command::Summary { files } => handle_summary(&files, config),
        Command::Search { query, files } => handle_search(&query, &files, config),
        Command::Serve => handle_serve(config),
    }
}

fn handle_serve(config: &Config) -> i32 {
    match server::run_server(config) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

/// Parse every file on the configured pool and report per-file failures on stderr.
fn load_batch(files: &[PathBuf], config: &Config) -> Option<BatchOutcome> {
    match process_paths(files, &WorkerPool::with_workers(config.workers)) {
        Ok(outcome) => {
            for failure in &outcome.failures {
                eprintln!("skipped {}: {}", failure.file_name, failure.message);
            }
            Some(outcome)
        }
        Err(err) => {
            eprintln!("failed to start worker pool: {err}");
            None
        }
    }
}

fn exit_code(outcome: &BatchOutcome) -> i32 {
    if outcome.has_failures() {
        1
    } else {
        0
    }
}

fn handle_extract(
    files: &[PathBuf],
    format: OutputFormat,
    output: Option<&PathBuf>,
    config: &Config,
) -> i32 {
    if format == OutputFormat::Xlsx && output.is_none() {
        eprintln!("usage: prodeff extract <FILES>... --format xlsx --output <PATH>");
        return 2;
    }
    let Some(outcome) = load_batch(files, config) else {
        return 1;
    };
    let records = outcome.dataset.records();

    let written = match (format, output) {
        (OutputFormat::Json, Some(path)) => serde_json::to_vec_pretty(records)
            .map_err(|err| err.to_string())
            .and_then(|bytes| std::fs::write(path, bytes).map_err(|err| err.to_string())),
        (OutputFormat::Json, None) => serde_json::to_string_pretty(records)
            .map(|payload| println!("{payload}"))
            .map_err(|err| err.to_string()),
        (OutputFormat::Csv, Some(path)) => {
            export_to_path(records, ExportFormat::Csv, path).map_err(|err| err.to_string())
        }
        (OutputFormat::Csv, None) => export_bytes(records, ExportFormat::Csv)
            .map_err(|err| err.to_string())
            .and_then(|bytes| {
                io::stdout()
                    .lock()
                    .write_all(&bytes)
                    .map_err(|err| err.to_string())
            }),
        (OutputFormat::Xlsx, Some(path)) => {
            export_to_path(records, ExportFormat::Xlsx, path).map_err(|err| err.to_string())
        }
        (OutputFormat::Xlsx, None) => Ok(()),
    };

    match written {
        Ok(()) => {
            if let Some(path) = output {
                eprintln!(
                    "extract complete: records={}, output='{}'",
                    records.len(),
                    path.display()
                );
            }
            exit_code(&outcome)
        }
        Err(err) => {
            eprintln!("failed to write dataset: {err}");
            1
        }
    }
}

fn handle_summary(files: &[PathBuf], config: &Config) -> i32 {
    let Some(outcome) = load_batch(files, config) else {
        return 1;
    };
    let records = outcome.dataset.records();
    let payload = serde_json::json!({
        "generated_at": chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "metrics": key_metrics(records),
        "periods": period_stats(records),
        "describe": describe(records),
        "files": outcome.files,
        "failures": outcome.failures,
    });
    match serde_json::to_string_pretty(&payload) {
        Ok(payload) => {
            println!("{payload}");
            exit_code(&outcome)
        }
        Err(err) => {
            eprintln!("failed to serialize summary: {err}");
            1
        }
    }
}

fn handle_search(query: &str, files: &[PathBuf], config: &Config) -> i32 {
    let Some(outcome) = load_batch(files, config) else {
        return 1;
    };
    let hits = search_with_bands(outcome.dataset.records(), query, &config.targets);
    match serde_json::to_string_pretty(&hits) {
        Ok(payload) => {
            println!("{payload}");
            exit_code(&outcome)
        }
        Err(err) => {
            eprintln!("failed to serialize search results: {err}");
            1
        }
    }
}

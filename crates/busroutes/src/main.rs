mod render;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use busroutes_core::config::AppConfig;
use busroutes_core::identifiers::SqlIdentifier;
use busroutes_core::loader::LoadStatus;
use busroutes_core::run::{execute_run, prepare_run, RunRequest, UploadedFile};
use busroutes_core::status::StatusLog;
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Combine, clean and load bus route CSV files", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Combine and clean the files, load them into MySQL and export the cleaned CSV
    Run(RunArgs),
    /// Show the inferred column types and CREATE TABLE statement without connecting
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// CSV files to combine, in order
    #[arg(required_unless_present = "glob")]
    files: Vec<PathBuf>,

    /// Glob pattern selecting more CSV files (repeatable)
    #[arg(long)]
    glob: Vec<String>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Service code; rows are also loaded into `{code}_routes`
    #[arg(short, long, default_value = "apsrtc")]
    service_code: String,

    /// Directory that receives cleaned_bus_routes.csv
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Skip the database load
    #[arg(long)]
    dry_run: bool,

    /// Print the run receipt as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    #[command(flatten)]
    input: InputArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config =
        AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Run(args) => handle_run(&config, args).await,
        Command::Schema(args) => handle_schema(&config, args),
    }
}

fn init_tracing(json: bool) {
    let subscriber = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn handle_run(config: &AppConfig, args: RunArgs) -> Result<()> {
    let files = read_inputs(&args.input)?;

    let receipt = execute_run(
        &config.pipeline,
        &config.database,
        RunRequest {
            service_code: args.service_code,
            files,
            dry_run: args.dry_run,
        },
    )
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else {
        render::print_receipt(&receipt);
    }

    if let Some(export) = &receipt.export {
        let path = export
            .write_to_dir(&args.output_dir)
            .with_context(|| format!("failed to write {}", export.file_name))?;
        if !args.json {
            println!(
                "\nCleaned data ({} rows, {}) written to {}",
                export.rows,
                export.mime_type,
                path.display()
            );
        }
    }

    if receipt.combined_rows.is_none() {
        bail!("no input file could be parsed");
    }
    if receipt.load.status == LoadStatus::Failed {
        bail!(
            "database load failed: {}",
            receipt.load.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn handle_schema(config: &AppConfig, args: SchemaArgs) -> Result<()> {
    let files = read_inputs(&args.input)?;
    let mut log = StatusLog::default();
    let prepared = prepare_run(&config.pipeline, &files, &mut log)?;

    render::print_files(&prepared.files);
    render::print_messages(log.messages());

    let Some(combined) = prepared.combined else {
        bail!("no input file could be parsed");
    };

    render::print_column_types(&combined.column_types);
    let table = SqlIdentifier::new(&config.pipeline.loader.generic_table)?;
    println!("\n{};", combined.column_types.create_table_sql(&table)?);
    Ok(())
}

/// Explicit paths first, then glob matches, each read whole.
fn read_inputs(input: &InputArgs) -> Result<Vec<UploadedFile>> {
    let mut paths = input.files.clone();
    for pattern in &input.glob {
        let mut matched: Vec<PathBuf> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern '{pattern}'"))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(err) => {
                    warn!(error = %err, "could not read path from glob pattern");
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        matched.sort();
        paths.extend(matched);
    }

    if paths.is_empty() {
        bail!("no input files matched");
    }

    paths
        .iter()
        .map(|path| {
            let contents = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(UploadedFile { name, contents })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_to_apsrtc_and_current_dir() {
        let cli = Cli::try_parse_from(["busroutes", "run", "a.csv", "b.csv"]).expect("parse");
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.service_code, "apsrtc");
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.input.files.len(), 2);
        assert!(!args.dry_run);
    }

    #[test]
    fn inputs_are_required() {
        assert!(Cli::try_parse_from(["busroutes", "run"]).is_err());
        assert!(Cli::try_parse_from(["busroutes", "schema", "--glob", "data/*.csv"]).is_ok());
    }

    #[test]
    fn glob_inputs_are_read_in_sorted_order() {
        let fixtures = concat!(env!("CARGO_MANIFEST_DIR"), "/../busroutes-parser/tests/data");
        let input = InputArgs {
            files: Vec::new(),
            glob: vec![format!("{fixtures}/apsrtc_routes_*.csv")],
        };

        let files = read_inputs(&input).expect("read inputs");
        let names: Vec<&str> = files.iter().map(|file| file.name.as_str()).collect();
        assert_eq!(names, ["apsrtc_routes_a.csv", "apsrtc_routes_b.csv"]);
    }
}

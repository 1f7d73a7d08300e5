use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::cleaning::clean_routes;
use crate::config::{DatabaseConfig, PipelineSettings};
use crate::error::{PipelineError, Result};
use crate::export::{export_csv, CsvExport};
use crate::identifiers::ServiceCode;
use crate::ingestion::{ingest_files, FileInput, FileReport, FileStatus, IngestionSummary};
use crate::loader::{LoadStatus, LoadSummary, Loader};
use crate::merge::{assign_ids, concat_tables};
use crate::preview::{preview_head, TablePreview};
use crate::schema::{infer_column_types, ColumnTypeMap};
use crate::status::{StatusLog, StatusMessage};

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub service_code: String,
    pub files: Vec<UploadedFile>,
    /// Prepare and export without touching the database.
    pub dry_run: bool,
}

/// The combined, cleaned table and the column types derived from it.
#[derive(Debug)]
pub struct CombinedTable {
    pub df: DataFrame,
    pub column_types: ColumnTypeMap,
}

/// Everything up to (not including) the database load.
#[derive(Debug)]
pub struct PreparedRun {
    pub files: Vec<FileReport>,
    pub ingestion_summary: IngestionSummary,
    pub previews: Vec<TablePreview>,
    /// `None` when no input could be parsed.
    pub combined: Option<CombinedTable>,
}

#[derive(Debug, Serialize)]
pub struct RunReceipt {
    pub run_id: Uuid,
    pub service_code: String,
    pub files: Vec<FileReport>,
    pub ingestion_summary: IngestionSummary,
    pub combined_rows: Option<usize>,
    pub column_types: ColumnTypeMap,
    pub previews: Vec<TablePreview>,
    pub load: LoadSummary,
    pub export: Option<CsvExport>,
    pub messages: Vec<StatusMessage>,
}

/// Ingests, merges, cleans and maps the uploaded files.
///
/// Per-file failures are reported and skipped. When nothing parses the run
/// records the empty-input error and returns without a combined table.
pub fn prepare_run(
    settings: &PipelineSettings,
    files: &[UploadedFile],
    log: &mut StatusLog,
) -> Result<PreparedRun> {
    let inputs: Vec<FileInput<'_>> = files
        .iter()
        .map(|file| FileInput {
            name: file.name.as_str(),
            contents: file.contents.as_slice(),
        })
        .collect();

    let batch = ingest_files(&inputs, &settings.csv);
    for report in &batch.reports {
        match report.status {
            FileStatus::Parsed => log.info(format!("Successfully read {}", report.name)),
            FileStatus::Failed => log.error(format!(
                "Error reading {}: {}",
                report.name,
                report.error.as_deref().unwrap_or("unknown error")
            )),
        }
    }

    let ingestion_summary = batch.summary();
    let mut prepared = PreparedRun {
        files: batch.reports,
        ingestion_summary,
        previews: Vec::new(),
        combined: None,
    };

    let frames = batch.tables.into_iter().map(|table| table.df).collect();
    let combined = match concat_tables(frames) {
        Ok(df) => df,
        Err(PipelineError::EmptyInput) => {
            log.error(PipelineError::EmptyInput.to_string());
            return Ok(prepared);
        }
        Err(err) => return Err(err),
    };
    prepared
        .previews
        .push(preview_head("Combined DataFrame", &combined, settings.preview_rows)?);
    let combined = assign_ids(combined)?;

    let cleaned = clean_routes(combined, &settings.cleaning)?;
    for column in &cleaned.skipped_columns {
        log.warning(format!("Column {column} not found; skipping its cleanup"));
    }
    prepared
        .previews
        .push(preview_head("Cleaned Data", &cleaned.df, settings.preview_rows)?);

    let column_types = infer_column_types(&cleaned.df);
    prepared.combined = Some(CombinedTable {
        df: cleaned.df,
        column_types,
    });

    Ok(prepared)
}

/// One forward pass: prepare, load (unless skipped), export.
///
/// Load failures are captured in the receipt; the export is produced whenever
/// a combined table exists, whatever happened to the load.
pub async fn execute_run(
    settings: &PipelineSettings,
    database: &DatabaseConfig,
    request: RunRequest,
) -> Result<RunReceipt> {
    let RunRequest {
        service_code,
        files,
        dry_run,
    } = request;

    let run_id = Uuid::new_v4();
    info!(%run_id, service = service_code.as_str(), files = files.len(), dry_run, "starting run");

    let mut log = StatusLog::default();
    let prepared = prepare_run(settings, &files, &mut log)?;

    let PreparedRun {
        files: file_reports,
        ingestion_summary,
        previews,
        combined,
    } = prepared;

    let mut receipt = RunReceipt {
        run_id,
        service_code: service_code.clone(),
        files: file_reports,
        ingestion_summary,
        combined_rows: None,
        column_types: ColumnTypeMap::default(),
        previews,
        load: LoadSummary::skipped(&settings.loader.generic_table),
        export: None,
        messages: Vec::new(),
    };

    let Some(combined) = combined else {
        receipt.messages = log.into_messages();
        return Ok(receipt);
    };

    receipt.combined_rows = Some(combined.df.height());
    receipt.load = load_stage(settings, database, &service_code, dry_run, &combined, &mut log).await;

    match export_csv(&combined.df) {
        Ok(export) => receipt.export = Some(export),
        Err(err) => log.error(format!("Could not build the CSV export: {err}")),
    }

    info!(%run_id, load = ?receipt.load.status, "run finished");
    receipt.column_types = combined.column_types;
    receipt.messages = log.into_messages();
    Ok(receipt)
}

async fn load_stage(
    settings: &PipelineSettings,
    database: &DatabaseConfig,
    service_code: &str,
    dry_run: bool,
    combined: &CombinedTable,
    log: &mut StatusLog,
) -> LoadSummary {
    let skipped = LoadSummary::skipped(&settings.loader.generic_table);

    if dry_run {
        log.info("Dry run: skipping the database load");
        return skipped;
    }

    let service = match ServiceCode::parse(service_code) {
        Ok(service) => service,
        Err(err) => {
            log.error(err.to_string());
            return LoadSummary {
                status: LoadStatus::Failed,
                error: Some(err.to_string()),
                ..skipped
            };
        }
    };

    Loader::new(database.clone(), settings.loader.clone())
        .load(&service, &combined.df, &combined.column_types, log)
        .await
}

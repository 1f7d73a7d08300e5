use blake3::Hasher;
use busroutes_parser::{parse_route_csv, CsvOptions};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};

#[derive(Debug)]
pub struct FileInput<'a> {
    pub name: &'a str,
    pub contents: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Parsed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub name: String,
    pub hash: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct ParsedTable {
    pub name: String,
    pub df: DataFrame,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionSummary {
    pub total: usize,
    pub parsed: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct IngestionBatch {
    pub tables: Vec<ParsedTable>,
    pub reports: Vec<FileReport>,
}

impl IngestionBatch {
    pub fn summary(&self) -> IngestionSummary {
        let parsed = self
            .reports
            .iter()
            .filter(|report| report.status == FileStatus::Parsed)
            .count();
        IngestionSummary {
            total: self.reports.len(),
            parsed,
            failed: self.reports.len() - parsed,
        }
    }
}

/// Parses every input on its own. A file that fails to parse, or whose columns
/// differ from the first parsed file, is reported and left out; the rest carry on.
pub fn ingest_files(inputs: &[FileInput<'_>], options: &CsvOptions) -> IngestionBatch {
    let mut batch = IngestionBatch::default();
    let mut reference_columns: Option<Vec<String>> = None;

    for input in inputs {
        let hash = compute_hash(input.contents);

        match read_table(input, options, reference_columns.as_deref()) {
            Ok(df) => {
                if reference_columns.is_none() {
                    reference_columns = Some(column_names(&df));
                }
                info!(file = input.name, rows = df.height(), "parsed input file");
                batch.reports.push(FileReport {
                    name: input.name.to_string(),
                    hash,
                    status: FileStatus::Parsed,
                    rows: Some(df.height()),
                    error: None,
                });
                batch.tables.push(ParsedTable {
                    name: input.name.to_string(),
                    df,
                });
            }
            Err(err) => {
                warn!(file = input.name, error = %err, "skipping input file");
                batch.reports.push(FileReport {
                    name: input.name.to_string(),
                    hash,
                    status: FileStatus::Failed,
                    rows: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    batch
}

fn read_table(
    input: &FileInput<'_>,
    options: &CsvOptions,
    reference_columns: Option<&[String]>,
) -> Result<DataFrame> {
    let df = parse_route_csv(input.contents, options).map_err(|source| PipelineError::Parse {
        file: input.name.to_string(),
        source,
    })?;

    let Some(expected) = reference_columns else {
        return Ok(df);
    };

    let found = column_names(&df);
    if found.as_slice() == expected {
        return Ok(df);
    }

    let same_set =
        found.len() == expected.len() && expected.iter().all(|name| found.contains(name));
    if !same_set {
        return Err(PipelineError::IncompatibleColumns {
            file: input.name.to_string(),
            expected: expected.to_vec(),
            found,
        });
    }

    Ok(df.select(expected.iter().map(String::as_str))?)
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

fn compute_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    let hash = hasher.finalize();
    hash.to_hex().to_string()
}

use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::Serialize;

use crate::error::Result;

pub const EXPORT_FILE_NAME: &str = "cleaned_bus_routes.csv";
pub const EXPORT_MIME_TYPE: &str = "text/csv";

/// The cleaned table as a downloadable CSV.
#[derive(Debug, Clone, Serialize)]
pub struct CsvExport {
    pub file_name: String,
    pub mime_type: &'static str,
    pub rows: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl CsvExport {
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Serializes the table with a header row and no index column.
pub fn export_csv(df: &DataFrame) -> Result<CsvExport> {
    let mut bytes = Vec::new();
    let mut frame = df.clone();
    CsvWriter::new(&mut bytes)
        .include_header(true)
        .finish(&mut frame)?;

    Ok(CsvExport {
        file_name: EXPORT_FILE_NAME.to_string(),
        mime_type: EXPORT_MIME_TYPE,
        rows: df.height(),
        bytes,
    })
}

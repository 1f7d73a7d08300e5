use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use polars::prelude::*;
use serde::Deserialize;

use crate::errors::ParserError;

/// Knobs handed to the polars CSV reader.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Leading rows polars inspects when inferring column types. `None` scans
    /// the whole file, so a column that turns to text late still reads as text.
    pub infer_schema_rows: Option<usize>,
    /// Parse date-like text columns into temporal columns.
    pub try_parse_dates: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            infer_schema_rows: None,
            try_parse_dates: false,
        }
    }
}

/// Reads the header row and returns usable, unique column names.
///
/// A blank cell becomes `Unnamed: {index}` and a repeated name gets a `.1`,
/// `.2`, ... suffix, so headers written by other tools (an unnamed index
/// column, a column exported twice) still load.
pub fn read_header(content: &[u8]) -> Result<Vec<String>, ParserError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content);
    let header = reader
        .headers()
        .map_err(|source| ParserError::Csv { source })?;

    if header.is_empty() {
        return Err(ParserError::MissingHeader);
    }

    let raw: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(index, name)| {
            if name.trim().is_empty() {
                format!("Unnamed: {index}")
            } else {
                name.to_string()
            }
        })
        .collect();

    Ok(dedupe_names(raw))
}

fn dedupe_names(raw: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = raw.iter().cloned().collect();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(raw.len());

    for name in raw {
        let seen = counts.entry(name.clone()).or_insert(0);
        if *seen == 0 {
            *seen = 1;
            names.push(name);
            continue;
        }

        let mut candidate = format!("{name}.{seen}");
        while taken.contains(&candidate) {
            *seen += 1;
            candidate = format!("{name}.{seen}");
        }
        *seen += 1;
        taken.insert(candidate.clone());
        names.push(candidate);
    }

    names
}

/// Parses one comma-separated byte stream with a header row into a row table.
pub fn parse_route_csv(content: &[u8], options: &CsvOptions) -> Result<DataFrame, ParserError> {
    std::str::from_utf8(content).map_err(|_| ParserError::InvalidUtf8)?;
    let names = read_header(content)?;

    let parse_options = CsvParseOptions::default().with_try_parse_dates(options.try_parse_dates);

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(options.infer_schema_rows)
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(content))
        .finish()
        .map_err(|source| ParserError::Table { source })?;

    df.set_column_names(names.iter().map(String::as_str))
        .map_err(|source| ParserError::Table { source })?;
    Ok(df)
}

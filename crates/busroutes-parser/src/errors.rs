use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("file contents were not valid UTF-8")]
    InvalidUtf8,

    #[error("file has no header row")]
    MissingHeader,

    #[error("CSV error: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    #[error("table parse failed: {source}")]
    Table {
        #[source]
        source: PolarsError,
    },
}

use busroutes_parser::ParserError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{source}")]
    Parse {
        file: String,
        #[source]
        source: ParserError,
    },

    #[error("columns {found:?} do not match the first file's columns {expected:?}")]
    IncompatibleColumns {
        file: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("no input file could be parsed; nothing to combine")]
    EmptyInput,

    #[error("invalid service code '{0}': use 1 to 57 ASCII letters, digits or underscores")]
    InvalidServiceCode(String),

    #[error("invalid SQL identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: &'static str },

    #[error("combined table has no '{0}' column")]
    MissingColumn(String),

    #[error("could not connect to the database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("could not check whether table {table} exists: {source}")]
    SchemaProbe {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not create table {table}: {source}")]
    CreateTable {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("insert into {table} failed: {source}")]
    Insert {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

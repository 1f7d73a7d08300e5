use chrono::NaiveDateTime;
use polars::prelude::*;
use sqlx::mysql::{MySql, MySqlConnection};
use sqlx::query_builder::Separated;
use sqlx::Connection;

use crate::config::DatabaseConfig;
use crate::error::{PipelineError, Result};
use crate::schema::SqlType;

/// SQLSTATE MySQL reports for `ER_NO_SUCH_TABLE`.
pub const MISSING_TABLE_SQLSTATE: &str = "42S02";

/// Upper bound on bind parameters in one MySQL statement.
pub const MAX_PLACEHOLDERS: usize = 65_535;

/// Opens the single connection a run works on. Dropping it releases the
/// socket, so every early return closes it too.
pub async fn connect(config: &DatabaseConfig) -> Result<MySqlConnection> {
    let options = config.connect_options()?;
    MySqlConnection::connect_with(&options)
        .await
        .map_err(PipelineError::Connect)
}

pub fn is_missing_table(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == MISSING_TABLE_SQLSTATE)
}

/// One cell, converted for binding according to its column's [`SqlType`].
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

pub fn bind_value(row: &mut Separated<'_, '_, MySql, &'static str>, value: SqlValue) {
    match value {
        SqlValue::Null => row.push_bind(Option::<String>::None),
        SqlValue::Int(value) => row.push_bind(value),
        SqlValue::Float(value) => row.push_bind(value),
        SqlValue::Text(value) => row.push_bind(value),
        SqlValue::DateTime(value) => row.push_bind(value),
    };
}

pub fn column_values(column: &Column) -> PolarsResult<Vec<SqlValue>> {
    let values = match SqlType::for_dtype(column.dtype()) {
        SqlType::Int => column
            .i64()?
            .into_iter()
            .map(|value| value.map_or(SqlValue::Null, SqlValue::Int))
            .collect(),
        SqlType::Float => column
            .f64()?
            .into_iter()
            .map(|value| value.map_or(SqlValue::Null, SqlValue::Float))
            .collect(),
        SqlType::DateTime => column
            .datetime()?
            .as_datetime_iter()
            .map(|value| value.map_or(SqlValue::Null, SqlValue::DateTime))
            .collect(),
        SqlType::Text => {
            let text = column.cast(&DataType::String)?;
            text.str()?
                .into_iter()
                .map(|value| value.map_or(SqlValue::Null, |s| SqlValue::Text(s.to_string())))
                .collect()
        }
    };
    Ok(values)
}

/// Row-major copy of the table, columns in table order.
pub fn frame_rows(df: &DataFrame) -> PolarsResult<Vec<Vec<SqlValue>>> {
    let mut columns = df
        .get_columns()
        .iter()
        .map(|column| column_values(column).map(Vec::into_iter))
        .collect::<PolarsResult<Vec<_>>>()?;

    let rows = (0..df.height())
        .map(|_| {
            columns
                .iter_mut()
                .map(|values| values.next().unwrap_or(SqlValue::Null))
                .collect()
        })
        .collect();
    Ok(rows)
}

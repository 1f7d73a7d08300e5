use polars::prelude::{DataFrame, DataType};
use serde::Serialize;

use crate::error::Result;
use crate::identifiers::SqlIdentifier;

/// Destination column types for the generic combined table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    Text,
    Int,
    Float,
    DateTime,
}

impl SqlType {
    /// Fixed lookup from a column's value type. Anything without a dedicated
    /// rule, including mixed or unknown types, lands in `TEXT`.
    pub fn for_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::String => SqlType::Text,
            DataType::Int64 => SqlType::Int,
            DataType::Float64 => SqlType::Float,
            DataType::Datetime(_, _) => SqlType::DateTime,
            _ => SqlType::Text,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Int => "INT",
            SqlType::Float => "FLOAT",
            SqlType::DateTime => "DATETIME",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnType {
    pub column: String,
    pub sql_type: SqlType,
}

/// Column name to destination type, in the combined table's column order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ColumnTypeMap {
    columns: Vec<ColumnType>,
}

impl ColumnTypeMap {
    pub fn iter(&self) -> impl Iterator<Item = &ColumnType> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<SqlType> {
        self.columns
            .iter()
            .find(|entry| entry.column == column)
            .map(|entry| entry.sql_type)
    }

    /// `CREATE TABLE IF NOT EXISTS` for the generic table. No primary key.
    pub fn create_table_sql(&self, table: &SqlIdentifier) -> Result<String> {
        let definitions = self
            .columns
            .iter()
            .map(|entry| {
                SqlIdentifier::new(&entry.column)
                    .map(|ident| format!("{} {}", ident.quoted(), entry.sql_type.as_sql()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            table.quoted(),
            definitions.join(", ")
        ))
    }
}

pub fn infer_column_types(df: &DataFrame) -> ColumnTypeMap {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| ColumnType {
            column: column.name().to_string(),
            sql_type: SqlType::for_dtype(column.dtype()),
        })
        .collect();

    ColumnTypeMap { columns }
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::*;

    #[test]
    fn rule_table() {
        let cases = [
            (DataType::String, SqlType::Text),
            (DataType::Int64, SqlType::Int),
            (DataType::Float64, SqlType::Float),
            (
                DataType::Datetime(TimeUnit::Microseconds, None),
                SqlType::DateTime,
            ),
            (
                DataType::Datetime(TimeUnit::Milliseconds, None),
                SqlType::DateTime,
            ),
            (DataType::Boolean, SqlType::Text),
            (DataType::Int32, SqlType::Text),
            (DataType::Date, SqlType::Text),
            (DataType::Null, SqlType::Text),
        ];

        for (dtype, expected) in cases {
            assert_eq!(SqlType::for_dtype(&dtype), expected, "{dtype:?}");
        }
    }

    #[test]
    fn mapping_follows_column_order_and_is_deterministic() -> PolarsResult<()> {
        let df = df!(
            "route_name" => ["A to B", "B to C"],
            "Price" => [550.0, 720.5],
            "id" => [1i64, 2],
        )?;

        let first = infer_column_types(&df);
        let second = infer_column_types(&df);
        assert_eq!(first, second);

        let pairs: Vec<(&str, SqlType)> = first
            .iter()
            .map(|entry| (entry.column.as_str(), entry.sql_type))
            .collect();
        assert_eq!(
            pairs,
            [
                ("route_name", SqlType::Text),
                ("Price", SqlType::Float),
                ("id", SqlType::Int),
            ]
        );
        assert_eq!(first.get("Price"), Some(SqlType::Float));
        assert_eq!(first.get("missing"), None);
        Ok(())
    }

    #[test]
    fn create_table_statement_quotes_every_column() -> PolarsResult<()> {
        let df = df!(
            "route_name" => ["A to B"],
            "Seat Availability" => ["12"],
            "id" => [1i64],
        )?;
        let table = SqlIdentifier::new("bus_routes").unwrap();

        let sql = infer_column_types(&df).create_table_sql(&table).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS `bus_routes` (`route_name` TEXT, `Seat Availability` TEXT, `id` INT)"
        );
        Ok(())
    }
}

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Which columns get normalized and how.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CleaningRules {
    pub price_column: String,
    pub currency_prefix: String,
    pub seat_column: String,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            price_column: "Price".to_string(),
            currency_prefix: "INR ".to_string(),
            seat_column: "Seat_Availability".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct CleanedTable {
    pub df: DataFrame,
    /// Configured columns that were not present and therefore left alone.
    pub skipped_columns: Vec<String>,
}

/// Price as text with missing values blanked and the currency prefix removed.
pub fn price_expr(column: &str, currency_prefix: &str) -> Expr {
    col(column)
        .cast(DataType::String)
        .fill_null(lit(""))
        .str()
        .strip_prefix(lit(currency_prefix))
        .alias(column)
}

/// First run of digits in the value, `"0"` when there is none.
pub fn seat_expr(column: &str) -> Expr {
    col(column)
        .cast(DataType::String)
        .str()
        .extract(lit(r"(\d+)"), 1)
        .fill_null(lit("0"))
        .alias(column)
}

pub fn clean_routes(df: DataFrame, rules: &CleaningRules) -> Result<CleanedTable> {
    let mut exprs = Vec::with_capacity(2);
    let mut skipped_columns = Vec::new();

    if df.column(&rules.price_column).is_ok() {
        exprs.push(price_expr(&rules.price_column, &rules.currency_prefix));
    } else {
        skipped_columns.push(rules.price_column.clone());
    }

    if df.column(&rules.seat_column).is_ok() {
        exprs.push(seat_expr(&rules.seat_column));
    } else {
        skipped_columns.push(rules.seat_column.clone());
    }

    for column in &skipped_columns {
        warn!(column = column.as_str(), "cleaning column not found, leaving table as is");
    }

    if exprs.is_empty() {
        return Ok(CleanedTable {
            df,
            skipped_columns,
        });
    }

    let df = df.lazy().with_columns(exprs).collect()?;
    info!(rows = df.height(), "cleaned combined table");

    Ok(CleanedTable {
        df,
        skipped_columns,
    })
}

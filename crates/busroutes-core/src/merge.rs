use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

/// Synthetic identifier appended to the combined table.
pub const ID_COLUMN: &str = "id";

/// Concatenates the parsed tables in input order and appends `id` = 1..N.
pub fn merge_tables(frames: Vec<DataFrame>) -> Result<DataFrame> {
    assign_ids(concat_tables(frames)?)
}

/// Stacks the parsed tables in input order without touching their columns.
///
/// The tables must share the first table's column order (ingestion guarantees
/// this). Columns whose types disagree between files are harmonized first: all
/// integer becomes Int64, integer/float mixes become Float64, anything else
/// becomes String.
pub fn concat_tables(frames: Vec<DataFrame>) -> Result<DataFrame> {
    if frames.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let frame_count = frames.len();
    let frames = harmonize_types(frames)?;
    let lazyframes: Vec<LazyFrame> = frames.into_iter().map(|df| df.lazy()).collect();
    let combined = concat(&lazyframes, UnionArgs::default())?.collect()?;

    info!(
        files = frame_count,
        rows = combined.height(),
        "combined input tables"
    );
    Ok(combined)
}

/// Sets `id` to 1..N in row order, replacing an existing `id` column in place.
pub fn assign_ids(mut df: DataFrame) -> Result<DataFrame> {
    let ids: Vec<i64> = (1..=df.height() as i64).collect();
    df.with_column(Series::new(ID_COLUMN.into(), ids))?;
    Ok(df)
}

fn harmonize_types(frames: Vec<DataFrame>) -> Result<Vec<DataFrame>> {
    let mut casts: Vec<(String, DataType)> = Vec::new();

    for column in frames[0].get_columns() {
        let name = column.name().as_str();
        let dtypes = frames
            .iter()
            .map(|df| df.column(name).map(|c| c.dtype().clone()))
            .collect::<PolarsResult<Vec<_>>>()?;

        if dtypes.iter().all(|dtype| *dtype == dtypes[0]) {
            continue;
        }

        let target = common_dtype(&dtypes);
        debug!(column = name, ?dtypes, ?target, "harmonizing column type");
        casts.push((name.to_string(), target));
    }

    if casts.is_empty() {
        return Ok(frames);
    }

    let exprs: Vec<Expr> = casts
        .iter()
        .map(|(name, dtype)| col(name.as_str()).cast(dtype.clone()))
        .collect();

    frames
        .into_iter()
        .map(|df| df.lazy().with_columns(exprs.clone()).collect())
        .collect::<PolarsResult<Vec<_>>>()
        .map_err(PipelineError::from)
}

fn common_dtype(dtypes: &[DataType]) -> DataType {
    if dtypes
        .iter()
        .all(|dtype| matches!(dtype, DataType::Int64 | DataType::Null))
    {
        DataType::Int64
    } else if dtypes
        .iter()
        .all(|dtype| matches!(dtype, DataType::Int64 | DataType::Float64 | DataType::Null))
    {
        DataType::Float64
    } else {
        DataType::String
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_dtype_prefers_the_narrowest_shared_type() {
        assert_eq!(
            common_dtype(&[DataType::Int64, DataType::Null]),
            DataType::Int64
        );
        assert_eq!(
            common_dtype(&[DataType::Int64, DataType::Float64]),
            DataType::Float64
        );
        assert_eq!(
            common_dtype(&[DataType::Int64, DataType::String]),
            DataType::String
        );
        assert_eq!(
            common_dtype(&[DataType::Boolean, DataType::Float64]),
            DataType::String
        );
    }
}

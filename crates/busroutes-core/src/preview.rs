use polars::prelude::*;
use serde::Serialize;

/// The first rows of a table rendered as text, for display.
#[derive(Debug, Clone, Serialize)]
pub struct TablePreview {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

pub fn preview_head(title: &str, df: &DataFrame, limit: usize) -> PolarsResult<TablePreview> {
    let head = df.head(Some(limit));

    let cells = head
        .get_columns()
        .iter()
        .map(|column| {
            let text = column.cast(&DataType::String)?;
            let values = text
                .str()?
                .into_iter()
                .map(|value| value.unwrap_or("").to_string())
                .collect::<Vec<_>>();
            Ok(values)
        })
        .collect::<PolarsResult<Vec<_>>>()?;

    let rows = (0..head.height())
        .map(|idx| cells.iter().map(|column| column[idx].clone()).collect())
        .collect();

    Ok(TablePreview {
        title: title.to_string(),
        columns: head
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect(),
        rows,
        total_rows: df.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_the_first_rows_as_text() -> PolarsResult<()> {
        let df = df!(
            "route_name" => ["A to B", "B to C", "C to D"],
            "Price" => [Some(550i64), None, Some(720)],
        )?;

        let preview = preview_head("Combined DataFrame", &df, 2)?;

        assert_eq!(preview.columns, ["route_name", "Price"]);
        assert_eq!(preview.total_rows, 3);
        assert_eq!(
            preview.rows,
            vec![
                vec!["A to B".to_string(), "550".to_string()],
                vec!["B to C".to_string(), String::new()],
            ]
        );
        Ok(())
    }
}

use polars::prelude::*;

use busroutes_core::error::PipelineError;
use busroutes_core::merge::{merge_tables, ID_COLUMN};
use busroutes_parser::{parse_route_csv, CsvOptions};

fn fixture_frame(name: &str) -> DataFrame {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../busroutes-parser/tests/data")
        .join(name);
    let content = std::fs::read(path).expect("read fixture");
    parse_route_csv(&content, &CsvOptions::default()).expect("parse fixture")
}

fn ids(df: &DataFrame) -> Vec<Option<i64>> {
    df.column(ID_COLUMN)
        .expect("id column")
        .i64()
        .expect("id is Int64")
        .into_iter()
        .collect()
}

#[test]
fn merged_rows_get_sequential_ids() {
    let first = fixture_frame("apsrtc_routes_a.csv");
    let second = fixture_frame("apsrtc_routes_b.csv");
    let expected_rows = first.height() + second.height();

    let combined = merge_tables(vec![first, second]).expect("merge failed");

    assert_eq!(combined.height(), expected_rows);
    assert_eq!(ids(&combined), (1..=6).map(Some).collect::<Vec<_>>());
    assert_eq!(
        combined.get_column_names().last().map(|name| name.as_str()),
        Some(ID_COLUMN)
    );

    let names: Vec<Option<&str>> = combined
        .column("route_name")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(names[0], Some("Hyderabad to Vijayawada"));
    assert_eq!(names[3], Some("Tirupati to Chennai"));
}

#[test]
fn merging_nothing_is_an_empty_input_error() {
    let err = merge_tables(Vec::new()).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyInput));
}

#[test]
fn single_header_only_table_merges_to_zero_rows() -> PolarsResult<()> {
    let df = df!("route_name" => Vec::<&str>::new(), "route_link" => Vec::<&str>::new())?;

    let combined = merge_tables(vec![df]).expect("merge failed");

    assert_eq!(combined.height(), 0);
    assert!(combined.column(ID_COLUMN).is_ok());
    Ok(())
}

#[test]
fn mixed_column_types_are_harmonized() {
    let text_prices = fixture_frame("apsrtc_routes_a.csv");
    let numeric_prices = fixture_frame("numeric_price.csv");

    let combined = merge_tables(vec![text_prices, numeric_prices]).expect("merge failed");

    assert_eq!(combined.height(), 5);
    let prices: Vec<Option<&str>> = combined
        .column("Price")
        .unwrap()
        .str()
        .expect("mixed column becomes text")
        .into_iter()
        .collect();
    assert_eq!(prices[0], Some("INR 550"));
    assert_eq!(prices[3], Some("150"));
}

#[test]
fn integer_and_float_columns_merge_as_float() -> PolarsResult<()> {
    let ints = df!("fare" => [100i64, 200])?;
    let floats = df!("fare" => [99.5f64])?;

    let combined = merge_tables(vec![ints, floats]).expect("merge failed");

    assert_eq!(combined.column("fare")?.dtype(), &DataType::Float64);
    assert_eq!(ids(&combined), vec![Some(1), Some(2), Some(3)]);
    Ok(())
}

#[test]
fn existing_id_column_is_overwritten_in_place() -> PolarsResult<()> {
    let first = df!("id" => [10i64, 11], "route_name" => ["A", "B"])?;
    let second = df!("id" => [10i64], "route_name" => ["C"])?;

    let combined = merge_tables(vec![first, second]).expect("merge failed");

    assert_eq!(combined.get_column_names(), ["id", "route_name"]);
    assert_eq!(ids(&combined), vec![Some(1), Some(2), Some(3)]);
    Ok(())
}

use busroutes_core::error::PipelineError;
use busroutes_core::ingestion::{ingest_files, FileInput, FileStatus};
use busroutes_parser::CsvOptions;

fn fixture(name: &str) -> Vec<u8> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../busroutes-parser/tests/data")
        .join(name);
    std::fs::read(path).expect("read fixture")
}

#[test]
fn ingestion_parses_each_file() {
    let first = fixture("apsrtc_routes_a.csv");
    let second = fixture("apsrtc_routes_b.csv");
    let inputs = [
        FileInput {
            name: "apsrtc_routes_a.csv",
            contents: &first,
        },
        FileInput {
            name: "apsrtc_routes_b.csv",
            contents: &second,
        },
    ];

    let batch = ingest_files(&inputs, &CsvOptions::default());

    assert_eq!(batch.tables.len(), 2);
    assert_eq!(batch.reports.len(), 2);
    assert!(batch
        .reports
        .iter()
        .all(|report| report.status == FileStatus::Parsed && report.rows == Some(3)));
    assert_eq!(batch.reports[0].hash.len(), 64);
    assert_ne!(batch.reports[0].hash, batch.reports[1].hash);

    let summary = batch.summary();
    assert_eq!((summary.total, summary.parsed, summary.failed), (2, 2, 0));
}

#[test]
fn ingestion_skips_unparseable_files_and_continues() {
    let empty = fixture("empty.csv");
    let not_utf8 = vec![b'P', b'r', b'i', b'c', b'e', b'\n', 0xff, 0xfe, b'\n'];
    let good = fixture("apsrtc_routes_a.csv");
    let inputs = [
        FileInput {
            name: "empty.csv",
            contents: &empty,
        },
        FileInput {
            name: "not_utf8.csv",
            contents: &not_utf8,
        },
        FileInput {
            name: "apsrtc_routes_a.csv",
            contents: &good,
        },
    ];

    let batch = ingest_files(&inputs, &CsvOptions::default());

    assert_eq!(batch.tables.len(), 1);
    assert_eq!(batch.tables[0].name, "apsrtc_routes_a.csv");
    assert_eq!(batch.reports[0].status, FileStatus::Failed);
    assert_eq!(batch.reports[1].status, FileStatus::Failed);
    assert!(batch.reports[1]
        .error
        .as_deref()
        .is_some_and(|message| message.contains("UTF-8")));
    assert_eq!(batch.reports[2].status, FileStatus::Parsed);
}

#[test]
fn ingestion_rejects_files_with_other_columns() {
    let good = fixture("apsrtc_routes_a.csv");
    let mismatched = fixture("mismatched_columns.csv");
    let inputs = [
        FileInput {
            name: "apsrtc_routes_a.csv",
            contents: &good,
        },
        FileInput {
            name: "mismatched_columns.csv",
            contents: &mismatched,
        },
    ];

    let batch = ingest_files(&inputs, &CsvOptions::default());

    assert_eq!(batch.tables.len(), 1);
    let report = &batch.reports[1];
    assert_eq!(report.status, FileStatus::Failed);
    assert!(report
        .error
        .as_deref()
        .is_some_and(|message| message.contains("do not match")));
}

#[test]
fn reordered_columns_follow_the_first_file() {
    let good = fixture("apsrtc_routes_a.csv");
    let reordered = fixture("reordered_columns.csv");
    let inputs = [
        FileInput {
            name: "apsrtc_routes_a.csv",
            contents: &good,
        },
        FileInput {
            name: "reordered_columns.csv",
            contents: &reordered,
        },
    ];

    let batch = ingest_files(&inputs, &CsvOptions::default());

    assert_eq!(batch.tables.len(), 2);
    assert_eq!(
        batch.tables[1].df.get_column_names(),
        batch.tables[0].df.get_column_names()
    );
}

#[test]
fn incompatible_columns_error_names_both_headers() {
    let err = PipelineError::IncompatibleColumns {
        file: "b.csv".to_string(),
        expected: vec!["route_name".to_string()],
        found: vec!["route".to_string()],
    };
    let message = err.to_string();
    assert!(message.contains("route_name"));
    assert!(message.contains("\"route\""));
}

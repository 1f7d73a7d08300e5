use busroutes_core::ingestion::{FileReport, FileStatus};
use busroutes_core::loader::{LoadStatus, LoadSummary};
use busroutes_core::preview::TablePreview;
use busroutes_core::run::RunReceipt;
use busroutes_core::schema::ColumnTypeMap;
use busroutes_core::status::{StatusLevel, StatusMessage};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn print_messages(messages: &[StatusMessage]) {
    for message in messages {
        let marker = match message.level {
            StatusLevel::Info => "  ",
            StatusLevel::Success => "✅",
            StatusLevel::Warning => "⚠️ ",
            StatusLevel::Error => "❌",
        };
        println!("{marker} {}", message.message);
    }
}

pub fn print_files(files: &[FileReport]) {
    let mut table = new_table();
    table.set_header(vec!["File", "Status", "Rows", "BLAKE3", "Error"]);
    for file in files {
        let status = match file.status {
            FileStatus::Parsed => "parsed",
            FileStatus::Failed => "failed",
        };
        table.add_row(vec![
            file.name.clone(),
            status.to_string(),
            file.rows.map(|rows| rows.to_string()).unwrap_or_default(),
            file.hash.chars().take(12).collect(),
            file.error.clone().unwrap_or_default(),
        ]);
    }
    println!("{table}");
}

pub fn print_preview(preview: &TablePreview) {
    let mut table = new_table();
    table.set_header(preview.columns.clone());
    for row in &preview.rows {
        table.add_row(row.clone());
    }
    println!(
        "\n{} (showing {} of {} rows)",
        preview.title,
        preview.rows.len(),
        preview.total_rows
    );
    println!("{table}");
}

pub fn print_column_types(column_types: &ColumnTypeMap) {
    let mut table = new_table();
    table.set_header(vec!["Column", "SQL type"]);
    for entry in column_types.iter() {
        table.add_row(vec![entry.column.clone(), entry.sql_type.as_sql().to_string()]);
    }
    println!("{table}");
}

pub fn print_load(load: &LoadSummary) {
    match load.status {
        LoadStatus::Skipped => println!("\nDatabase load skipped."),
        LoadStatus::Success | LoadStatus::Failed => {
            println!("\n--- Load Summary ---");
            println!(
                "  {}: {} rows committed",
                load.generic_table, load.generic_rows_committed
            );
            if let Some(routes_table) = &load.routes_table {
                let created = if load.routes_table_created {
                    " (created)"
                } else {
                    ""
                };
                println!(
                    "  {routes_table}{created}: {} rows committed",
                    load.route_rows_committed
                );
            }
        }
    }
}

pub fn print_receipt(receipt: &RunReceipt) {
    print_files(&receipt.files);
    for preview in &receipt.previews {
        print_preview(preview);
    }
    println!();
    print_messages(&receipt.messages);
    print_load(&receipt.load);
}

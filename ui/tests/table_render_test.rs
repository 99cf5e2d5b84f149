//! Body rows when no data column is visible.

use egui_kittest::Harness;
use fundesk_business::FetchError;
use fundesk_business::table::{CellValue, ColumnDef, LoadState, Table, TableOptions, TableState};
use fundesk_ui::widgets::data_table::render_table;
use kittest::Queryable;

#[derive(Debug, Clone)]
struct Drawdown {
    fund: String,
}

fn hidden_table() -> Table<Drawdown> {
    let columns = vec![ColumnDef::new("fund", "Fund", |row: &Drawdown| {
        CellValue::from(row.fund.as_str())
    })];
    let mut table = Table::internal(columns, TableOptions::default(), TableState::default());
    table.toggle_column_visibility("fund").unwrap();
    assert!(table.visible_columns().is_empty());
    table
}

#[test]
fn test_empty_message_with_every_column_hidden() {
    let table = hidden_table();
    let mut harness = Harness::new_ui(move |ui| {
        render_table(ui, "drawdowns", &table, LoadState::Ready);
    });

    harness.run();

    harness.get_by_label("No results.");
}

#[test]
fn test_error_message_with_every_column_hidden() {
    let table = hidden_table();
    let err = FetchError::new("Request failed: connection refused".to_owned());
    let mut harness = Harness::new_ui(move |ui| {
        render_table(ui, "drawdowns", &table, LoadState::Failed(&err));
    });

    harness.run();

    harness.get_by_label("Request failed: connection refused");
}

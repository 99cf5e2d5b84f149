//! Header and body rendering on top of `egui_extras::TableBuilder`.

use egui::{Align, Color32, Layout, RichText, Sense, Ui};
use egui_extras::{Column, TableBuilder, TableRow};
use fundesk_business::table::{ColumnDef, LoadState, SortDirection, Table, TableBody};
use ustr::Ustr;

pub const ROW_HEIGHT: f32 = 30.0;
pub const HEADER_HEIGHT: f32 = 28.0;
const SELECT_WIDTH: f32 = 28.0;
const SKELETON_COLOR: Color32 = Color32::from_rgb(225, 225, 225);

pub const EMPTY_MESSAGE: &str = "No results.";

/// Interaction collected while rendering, applied once the table is no
/// longer borrowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    ToggleSort { column_id: Ustr, multi: bool },
    ToggleRow(Ustr),
    TogglePage,
    /// Index into the table's data.
    RowClicked(usize),
}

impl TableAction {
    pub fn apply<R>(self, table: &mut Table<R>) {
        match self {
            Self::ToggleSort { column_id, multi } => {
                if let Err(err) = table.toggle_sort(&column_id, multi) {
                    log::warn!("Sort request ignored: {err}");
                }
            }
            Self::ToggleRow(row_id) => table.toggle_row_selected(row_id),
            Self::TogglePage => table.toggle_page_selected(),
            Self::RowClicked(_) => {}
        }
    }
}

/// Draws header and body. The caller applies the returned action.
pub fn render_table<R>(
    ui: &mut Ui,
    id: &str,
    table: &Table<R>,
    status: LoadState<'_>,
) -> Option<TableAction> {
    let columns = table.visible_columns();
    let body = table.body(status);
    let mut action = None;

    let mut builder = TableBuilder::new(ui)
        .id_salt(id)
        .striped(true)
        .sense(Sense::click())
        .cell_layout(Layout::left_to_right(Align::Center))
        .column(Column::exact(SELECT_WIDTH));
    for _ in &columns {
        builder = builder.column(Column::remainder().at_least(80.0).clip(true));
    }

    builder
        .header(HEADER_HEIGHT, |mut header| {
            header.col(|ui| {
                let mut all = table.is_page_selected();
                if ui.checkbox(&mut all, "").on_hover_text("Select page").changed() {
                    action = Some(TableAction::TogglePage);
                }
            });
            for column in &columns {
                header.col(|ui| {
                    if let Some(sort) = render_header_cell(ui, table, column) {
                        action = Some(sort);
                    }
                });
            }
        })
        .body(|mut rows| match body {
            TableBody::Skeleton { rows: count, columns } => {
                for _ in 0..count {
                    rows.row(ROW_HEIGHT, |mut row| {
                        row.col(|_| {});
                        for _ in 0..columns {
                            row.col(render_skeleton_cell);
                        }
                    });
                }
            }
            TableBody::Error { message, .. } => {
                rows.row(ROW_HEIGHT, |mut row| {
                    message_row(&mut row, columns.len(), |ui| {
                        ui.colored_label(Color32::RED, &message);
                    });
                });
            }
            TableBody::Empty { .. } => {
                rows.row(ROW_HEIGHT, |mut row| {
                    message_row(&mut row, columns.len(), |ui| {
                        ui.weak(EMPTY_MESSAGE);
                    });
                });
            }
            TableBody::Rows(views) => {
                for view in views {
                    rows.row(ROW_HEIGHT, |mut row| {
                        row.set_selected(view.selected);
                        row.col(|ui| {
                            let mut selected = view.selected;
                            if ui.checkbox(&mut selected, "").changed() {
                                action = Some(TableAction::ToggleRow(view.id));
                            }
                        });
                        for column in &columns {
                            row.col(|ui| {
                                ui.label(column.value(view.row).to_string());
                            });
                        }
                        if row.response().clicked() && action.is_none() {
                            action = Some(TableAction::RowClicked(view.index));
                        }
                    });
                }
            }
        });

    action
}

fn render_header_cell<R>(ui: &mut Ui, table: &Table<R>, column: &ColumnDef<R>) -> Option<TableAction> {
    if !column.sortable {
        ui.strong(&column.header);
        return None;
    }
    let arrow = match table.sort_direction(&column.id) {
        Some(SortDirection::Asc) => " ⏶",
        Some(SortDirection::Desc) => " ⏷",
        None => "",
    };
    let clicked = ui
        .add(egui::Button::new(RichText::new(format!("{}{arrow}", column.header)).strong()).frame(false))
        .on_hover_text("Click to sort, shift-click to add to the sort")
        .clicked();
    clicked.then(|| TableAction::ToggleSort {
        column_id: column.id,
        multi: ui.input(|input| input.modifiers.shift),
    })
}

fn render_skeleton_cell(ui: &mut Ui) {
    let width = ui.available_width().min(120.0);
    let (rect, _) = ui.allocate_exact_size(egui::vec2(width, 12.0), Sense::hover());
    ui.painter().rect_filled(rect, 4.0, SKELETON_COLOR);
}

/// One message spanning the row: first data cell holds it, the rest stay
/// empty. With every data column hidden it goes in the selection column.
fn message_row(row: &mut TableRow<'_, '_>, data_columns: usize, add_contents: impl FnOnce(&mut Ui)) {
    if data_columns == 0 {
        row.col(add_contents);
        return;
    }
    row.col(|_| {});
    row.col(add_contents);
    for _ in 1..data_columns {
        row.col(|_| {});
    }
}

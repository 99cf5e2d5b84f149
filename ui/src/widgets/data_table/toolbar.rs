use chrono::{DateTime, Utc};
use egui::{Align, Layout, TextEdit, Ui};
use fundesk_business::server::ServerTable;
use ustr::Ustr;

pub const SEARCH_HINT: &str = "Search...";

/// Search box, filter and reset buttons, and the column visibility menu.
pub fn render_toolbar<R: Send + 'static>(ui: &mut Ui, server: &mut ServerTable<R>, now: DateTime<Utc>) {
    ui.horizontal(|ui| {
        let mut text = server.search_text().to_owned();
        let response = ui.add(
            TextEdit::singleline(&mut text)
                .hint_text(SEARCH_HINT)
                .desired_width(220.0),
        );
        if response.changed() {
            server.set_search(text, now);
        }

        if ui.button("⊕ Filter").clicked() {
            server.picker_mut().open();
        }
        if !server.filters().is_empty() && ui.button("Reset").clicked() {
            server.clear_filters();
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            let mut toggled: Option<Ustr> = None;
            ui.menu_button("View", |ui| {
                ui.label("Toggle columns");
                ui.separator();
                let table = server.table();
                for column in table.columns().iter().filter(|column| column.hideable) {
                    let mut visible = table.state().is_visible(&column.id);
                    if ui.checkbox(&mut visible, &column.header).changed() {
                        toggled = Some(column.id);
                    }
                }
            });
            if let Some(column_id) = toggled
                && let Err(err) = server.table_mut().toggle_column_visibility(&column_id)
            {
                log::warn!("Column toggle ignored: {err}");
            }

            if server.status().is_fetching {
                ui.spinner();
            }
        });
    });
}

use egui::{Align, ComboBox, Layout, Ui};
use fundesk_business::table::Table;

/// "Rows per page", "Page x of y" and the four navigation buttons.
pub fn render_pagination<R>(ui: &mut Ui, table: &mut Table<R>, page_size_options: &[usize]) {
    ui.horizontal(|ui| {
        let selected = table.state().selection.len();
        if selected > 0 {
            ui.weak(format!("{selected} of {} row(s) selected.", table.row_count()));
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            let can_next = table.can_next_page();
            let can_previous = table.can_previous_page();

            if ui.add_enabled(can_next, egui::Button::new("»")).on_hover_text("Last page").clicked() {
                table.last_page();
            }
            if ui.add_enabled(can_next, egui::Button::new("›")).on_hover_text("Next page").clicked() {
                table.next_page();
            }
            if ui
                .add_enabled(can_previous, egui::Button::new("‹"))
                .on_hover_text("Previous page")
                .clicked()
            {
                table.previous_page();
            }
            if ui
                .add_enabled(can_previous, egui::Button::new("«"))
                .on_hover_text("First page")
                .clicked()
            {
                table.first_page();
            }

            ui.label(page_label(table.state().pagination.page_index(), table.page_count()));

            let mut page_size = table.state().pagination.page_size();
            ComboBox::from_id_salt(ui.id().with("rows_per_page"))
                .selected_text(page_size.to_string())
                .width(60.0)
                .show_ui(ui, |ui| {
                    for &option in page_size_options {
                        ui.selectable_value(&mut page_size, option, option.to_string());
                    }
                });
            if page_size != table.state().pagination.page_size()
                && let Err(err) = table.set_page_size(page_size)
            {
                log::warn!("Page size change ignored: {err}");
            }
            ui.label("Rows per page");
        });
    });
}

/// Always at least one page so an empty table reads "Page 1 of 1".
pub fn page_label(page_index: usize, page_count: usize) -> String {
    format!("Page {} of {}", page_index + 1, page_count.max(1))
}

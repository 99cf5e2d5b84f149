//! Data table widget for server-driven tables.
//!
//! - `toolbar`: search box, filter button and column visibility menu
//! - `filters`: filter picker window and active filter chips
//! - `table`: header, body rows, skeleton and message rows
//! - `pagination`: page size selector and page navigation

mod filters;
mod pagination;
mod table;
mod toolbar;

use chrono::{DateTime, Utc};
use egui::Ui;
use fundesk_business::server::ServerTable;
use fundesk_business::table::TableEvent;

pub use filters::{render_filter_chips, render_filter_picker};
pub use pagination::render_pagination;
pub use table::{TableAction, render_table};
pub use toolbar::render_toolbar;

/// Renders the whole table: toolbar, chips, rows and pagination.
///
/// Returns the row the user clicked, if any.
pub fn data_table<R: Clone + Send + 'static>(
    ui: &mut Ui,
    id: &str,
    server: &mut ServerTable<R>,
    page_size_options: &[usize],
    now: DateTime<Utc>,
) -> Option<TableEvent<R>> {
    render_toolbar(ui, server, now);
    render_filter_chips(ui, server);
    render_filter_picker(ui, id, server, now);
    ui.add_space(4.0);

    let action = render_table(ui, id, server.table(), server.load_state());

    let event = match action {
        Some(TableAction::RowClicked(index)) => server
            .table()
            .data()
            .get(index)
            .cloned()
            .map(TableEvent::RowClicked),
        Some(action) => {
            action.apply(server.table_mut());
            None
        }
        None => None,
    };

    ui.add_space(4.0);
    render_pagination(ui, server.table_mut(), page_size_options);
    event
}

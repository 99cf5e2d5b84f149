//! The headless table: columns, state and the client-side row pipeline.

use std::fmt;
use std::sync::Arc;

use ustr::Ustr;

use super::body::{LoadState, RowView, TableBody};
use super::column::ColumnDef;
use super::state::{ColumnFilter, Pagination, SortDirection, SortSpec, TableChange, TableController, TableState};
use crate::TableError;

pub const DEFAULT_SKELETON_ROWS: usize = 5;

type RowIdFn<R> = Arc<dyn Fn(&R, usize) -> Ustr + Send + Sync>;

/// Which steps the server does and how the table looks while loading.
pub struct TableOptions<R> {
    /// Rows are already one page; `set_row_count` drives the page count.
    pub manual_pagination: bool,
    pub manual_sorting: bool,
    pub manual_filtering: bool,
    pub skeleton_rows: usize,
    row_id: Option<RowIdFn<R>>,
}

impl<R> TableOptions<R> {
    /// Everything handled by the server.
    pub fn manual() -> Self {
        Self {
            manual_pagination: true,
            manual_sorting: true,
            manual_filtering: true,
            ..Self::default()
        }
    }

    pub fn with_skeleton_rows(mut self, rows: usize) -> Self {
        self.skeleton_rows = rows;
        self
    }

    /// How to key selection. Defaults to the row index.
    pub fn with_row_id(mut self, row_id: impl Fn(&R, usize) -> Ustr + Send + Sync + 'static) -> Self {
        self.row_id = Some(Arc::new(row_id));
        self
    }

    fn row_id(&self, row: &R, index: usize) -> Ustr {
        match &self.row_id {
            Some(row_id) => row_id(row, index),
            None => Ustr::from(index.to_string().as_str()),
        }
    }
}

impl<R> Default for TableOptions<R> {
    fn default() -> Self {
        Self {
            manual_pagination: false,
            manual_sorting: false,
            manual_filtering: false,
            skeleton_rows: DEFAULT_SKELETON_ROWS,
            row_id: None,
        }
    }
}

impl<R> Clone for TableOptions<R> {
    fn clone(&self) -> Self {
        Self {
            manual_pagination: self.manual_pagination,
            manual_sorting: self.manual_sorting,
            manual_filtering: self.manual_filtering,
            skeleton_rows: self.skeleton_rows,
            row_id: self.row_id.clone(),
        }
    }
}

impl<R> fmt::Debug for TableOptions<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableOptions")
            .field("manual_pagination", &self.manual_pagination)
            .field("manual_sorting", &self.manual_sorting)
            .field("manual_filtering", &self.manual_filtering)
            .field("skeleton_rows", &self.skeleton_rows)
            .field("custom_row_id", &self.row_id.is_some())
            .finish()
    }
}

enum Ownership {
    Internal,
    Controlled(Box<dyn TableController>),
}

impl fmt::Debug for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => f.write_str("Internal"),
            Self::Controlled(_) => f.write_str("Controlled"),
        }
    }
}

/// Headless table over rows of `R`.
///
/// In internal mode it updates its own [`TableState`]. In controlled mode it
/// only reports [`TableChange`]s and waits for [`Table::sync_state`].
#[derive(Debug)]
pub struct Table<R> {
    columns: Vec<ColumnDef<R>>,
    options: TableOptions<R>,
    state: TableState,
    ownership: Ownership,
    data: Vec<R>,
    row_count: Option<usize>,
}

impl<R> Table<R> {
    /// A table that owns and mutates its own state.
    pub fn internal(columns: Vec<ColumnDef<R>>, options: TableOptions<R>, state: TableState) -> Self {
        Self {
            columns,
            options,
            state,
            ownership: Ownership::Internal,
            data: Vec::new(),
            row_count: None,
        }
    }

    /// A table whose state lives elsewhere. Changes are reported to
    /// `controller`; the owner hands the result back through [`Self::sync_state`].
    pub fn controlled(
        columns: Vec<ColumnDef<R>>,
        options: TableOptions<R>,
        state: TableState,
        controller: impl TableController + 'static,
    ) -> Self {
        Self {
            columns,
            options,
            state,
            ownership: Ownership::Controlled(Box::new(controller)),
            data: Vec::new(),
            row_count: None,
        }
    }

    pub fn is_controlled(&self) -> bool {
        matches!(self.ownership, Ownership::Controlled(_))
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn options(&self) -> &TableOptions<R> {
        &self.options
    }

    pub fn columns(&self) -> &[ColumnDef<R>] {
        &self.columns
    }

    pub fn column(&self, column_id: &str) -> Option<&ColumnDef<R>> {
        self.columns.iter().find(|column| column.id.as_str() == column_id)
    }

    /// Replaces the state snapshot with the owner's copy.
    pub fn sync_state(&mut self, state: TableState) {
        let page_changed = state.pagination.page_index() != self.state.pagination.page_index();
        self.state = state;
        if page_changed && !self.state.selection.is_empty() {
            log::debug!("Page changed, dropping {} selected rows", self.state.selection.len());
            self.state.selection.clear();
        }
    }

    fn commit(&mut self, change: TableChange) {
        match &mut self.ownership {
            Ownership::Internal => change.apply(&mut self.state),
            Ownership::Controlled(controller) => controller.on_change(change),
        }
    }

    pub fn data(&self) -> &[R] {
        &self.data
    }

    /// Replaces the rows. Does not touch the selection.
    pub fn set_data(&mut self, rows: Vec<R>) {
        self.data = rows;
    }

    /// Total rows on the server, used with manual pagination.
    pub fn set_row_count(&mut self, total: Option<usize>) {
        self.row_count = total;
    }

    /// Total rows: the server count when paginating manually, else the
    /// filtered client rows.
    pub fn row_count(&self) -> usize {
        if self.options.manual_pagination {
            self.row_count.unwrap_or(self.data.len())
        } else {
            self.filtered_indices().len()
        }
    }

    /// Never less than one.
    pub fn page_count(&self) -> usize {
        self.row_count().div_ceil(self.state.pagination.page_size())
    }

    pub fn can_previous_page(&self) -> bool {
        self.state.pagination.page_index() > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.state.pagination.page_index() + 1 < self.page_count()
    }

    /// Moves to `page_index`, clamped to the last page.
    pub fn set_page_index(&mut self, page_index: usize) {
        let last = self.page_count().saturating_sub(1);
        let page_index = page_index.min(last);
        if page_index != self.state.pagination.page_index() {
            self.commit(TableChange::Pagination(
                self.state.pagination.with_page_index(page_index),
            ));
        }
    }

    pub fn first_page(&mut self) {
        self.set_page_index(0);
    }

    pub fn previous_page(&mut self) {
        if self.can_previous_page() {
            self.set_page_index(self.state.pagination.page_index() - 1);
        }
    }

    pub fn next_page(&mut self) {
        if self.can_next_page() {
            self.set_page_index(self.state.pagination.page_index() + 1);
        }
    }

    pub fn last_page(&mut self) {
        self.set_page_index(self.page_count().saturating_sub(1));
    }

    /// Changes the page size and picks the page that still shows the
    /// current top row.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), TableError> {
        let offset = self.state.pagination.offset();
        let pagination = Pagination::new(offset / page_size.max(1), page_size)?;
        if pagination != self.state.pagination {
            self.commit(TableChange::Pagination(pagination));
        }
        Ok(())
    }

    pub fn sorting(&self) -> &[SortSpec] {
        &self.state.sorting
    }

    pub fn sort_direction(&self, column_id: &str) -> Option<SortDirection> {
        self.state
            .sorting
            .iter()
            .find(|spec| spec.column_id.as_str() == column_id)
            .map(|spec| spec.direction)
    }

    /// Replaces the whole sort order.
    pub fn set_sorting(&mut self, sorting: Vec<SortSpec>) {
        self.commit(TableChange::Sorting(sorting));
    }

    /// Cycles a column through ascending, descending and unsorted. With
    /// `multi` the other sorted columns are kept.
    pub fn toggle_sort(&mut self, column_id: &str, multi: bool) -> Result<(), TableError> {
        let column = self
            .column(column_id)
            .ok_or_else(|| TableError::UnknownColumn(Ustr::from(column_id)))?;
        if !column.sortable {
            log::debug!("Column '{column_id}' is not sortable");
            return Ok(());
        }

        let next = match self.sort_direction(column_id) {
            None => Some(SortSpec::asc(column_id)),
            Some(SortDirection::Asc) => Some(SortSpec::desc(column_id)),
            Some(SortDirection::Desc) => None,
        };

        let mut sorting = if multi {
            self.state.sorting.clone()
        } else {
            Vec::new()
        };
        match (sorting.iter().position(|spec| spec.column_id.as_str() == column_id), next) {
            (Some(at), Some(spec)) => sorting[at] = spec,
            (Some(at), None) => {
                sorting.remove(at);
            }
            (None, Some(spec)) => sorting.push(spec),
            (None, None) => {}
        }
        self.commit(TableChange::Sorting(sorting));
        Ok(())
    }

    /// Sets or clears one column filter. Goes back to the first page.
    pub fn set_column_filter(&mut self, column_id: &str, value: &str) -> Result<(), TableError> {
        if self.column(column_id).is_none() {
            return Err(TableError::UnknownColumn(Ustr::from(column_id)));
        }
        let mut filters: Vec<ColumnFilter> = self
            .state
            .column_filters
            .iter()
            .filter(|filter| filter.column_id.as_str() != column_id)
            .cloned()
            .collect();
        if !value.is_empty() {
            filters.push(ColumnFilter {
                column_id: Ustr::from(column_id),
                value: value.to_owned(),
            });
        }
        if filters != self.state.column_filters {
            self.commit(TableChange::ColumnFilters(filters));
            self.reset_page();
        }
        Ok(())
    }

    pub fn global_filter(&self) -> &str {
        &self.state.global_filter
    }

    /// Sets the search text. Goes back to the first page.
    pub fn set_global_filter(&mut self, value: &str) {
        if value != self.state.global_filter {
            self.commit(TableChange::GlobalFilter(value.to_owned()));
            self.reset_page();
        }
    }

    /// Back to page one, as after any filter change.
    pub fn reset_page(&mut self) {
        if self.state.pagination.page_index() != 0 {
            self.commit(TableChange::Pagination(self.state.pagination.with_page_index(0)));
        }
    }

    /// Columns marked not hideable stay visible.
    pub fn toggle_column_visibility(&mut self, column_id: &str) -> Result<(), TableError> {
        let column = self
            .column(column_id)
            .ok_or_else(|| TableError::UnknownColumn(Ustr::from(column_id)))?;
        if !column.hideable {
            log::debug!("Column '{column_id}' cannot be hidden");
            return Ok(());
        }
        let id = column.id;
        let mut visibility = self.state.visibility.clone();
        visibility.insert(id, !self.state.is_visible(&id));
        self.commit(TableChange::Visibility(visibility));
        Ok(())
    }

    pub fn visible_columns(&self) -> Vec<&ColumnDef<R>> {
        self.columns
            .iter()
            .filter(|column| self.state.is_visible(&column.id))
            .collect()
    }

    pub fn is_selected(&self, row_id: &Ustr) -> bool {
        self.state.selection.contains(row_id)
    }

    /// Adds or removes one row from the selection.
    pub fn toggle_row_selected(&mut self, row_id: Ustr) {
        let mut selection = self.state.selection.clone();
        if !selection.remove(&row_id) {
            selection.insert(row_id);
        }
        self.commit(TableChange::Selection(selection));
    }

    /// Whether every row on the current page is selected.
    pub fn is_page_selected(&self) -> bool {
        let rows = self.row_model();
        !rows.is_empty() && rows.iter().all(|row| row.selected)
    }

    /// Selects every row on the page, or clears them if all were selected.
    pub fn toggle_page_selected(&mut self) {
        let select = !self.is_page_selected();
        let ids: Vec<Ustr> = self.row_model().iter().map(|row| row.id).collect();
        let mut selection = self.state.selection.clone();
        for id in ids {
            if select {
                selection.insert(id);
            } else {
                selection.remove(&id);
            }
        }
        self.commit(TableChange::Selection(selection));
    }

    /// Selected rows among the loaded data.
    pub fn selected_rows(&self) -> Vec<&R> {
        self.data
            .iter()
            .enumerate()
            .filter(|(index, row)| self.is_selected(&self.options.row_id(row, *index)))
            .map(|(_, row)| row)
            .collect()
    }

    fn filtered_indices(&self) -> Vec<usize> {
        if self.options.manual_filtering {
            return (0..self.data.len()).collect();
        }
        let filters: Vec<(&ColumnDef<R>, &str)> = self
            .state
            .column_filters
            .iter()
            .filter_map(|filter| {
                let column = self.column(&filter.column_id);
                if column.is_none() {
                    log::warn!("Filter on unknown column '{}'", filter.column_id);
                }
                column.map(|column| (column, filter.value.as_str()))
            })
            .collect();
        let search = self.state.global_filter.trim();

        (0..self.data.len())
            .filter(|&index| {
                let row = &self.data[index];
                filters
                    .iter()
                    .all(|(column, value)| column.value(row).contains(value))
                    && (search.is_empty()
                        || self
                            .columns
                            .iter()
                            .any(|column| column.value(row).contains(search)))
            })
            .collect()
    }

    fn sort_indices(&self, indices: &mut [usize]) {
        if self.options.manual_sorting || self.state.sorting.is_empty() {
            return;
        }
        let keys: Vec<(&ColumnDef<R>, SortDirection)> = self
            .state
            .sorting
            .iter()
            .filter_map(|spec| self.column(&spec.column_id).map(|column| (column, spec.direction)))
            .collect();
        indices.sort_by(|&a, &b| {
            keys.iter()
                .map(|(column, direction)| {
                    let left = column.value(&self.data[a]);
                    let right = column.value(&self.data[b]);
                    match (left.is_empty(), right.is_empty(), direction) {
                        (true, false, _) | (false, true, _) => left.compare(&right),
                        (_, _, SortDirection::Asc) => left.compare(&right),
                        (_, _, SortDirection::Desc) => right.compare(&left),
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// The rows of the current page after filtering and sorting.
    pub fn row_model(&self) -> Vec<RowView<'_, R>> {
        let mut indices = self.filtered_indices();
        self.sort_indices(&mut indices);

        let page: &[usize] = if self.options.manual_pagination {
            &indices
        } else {
            let offset = self.state.pagination.offset().min(indices.len());
            let end = (offset + self.state.pagination.page_size()).min(indices.len());
            &indices[offset..end]
        };

        page.iter()
            .map(|&index| {
                let row = &self.data[index];
                let id = self.options.row_id(row, index);
                RowView {
                    id,
                    index,
                    row,
                    selected: self.is_selected(&id),
                }
            })
            .collect()
    }

    /// Decides what the body shows for the given load state.
    pub fn body(&self, status: LoadState<'_>) -> TableBody<'_, R> {
        let colspan = self.visible_columns().len().max(1);
        match status {
            LoadState::Loading => TableBody::Skeleton {
                rows: self.options.skeleton_rows,
                columns: self.visible_columns().len(),
            },
            LoadState::Failed(err) => TableBody::Error {
                message: err.display_message().to_owned(),
                colspan,
            },
            LoadState::Ready => {
                let rows = self.row_model();
                if rows.is_empty() {
                    TableBody::Empty { colspan }
                } else {
                    TableBody::Rows(rows)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::FetchError;
    use crate::table::{CellValue, TableEvent};

    #[derive(Debug, Clone, PartialEq)]
    struct Investor {
        name: &'static str,
        commitment: f64,
        state: Option<&'static str>,
    }

    fn columns() -> Vec<ColumnDef<Investor>> {
        vec![
            ColumnDef::new("name", "Name", |row: &Investor| row.name.into()),
            ColumnDef::new("commitment", "Commitment", |row: &Investor| {
                row.commitment.into()
            }),
            ColumnDef::new("state", "State", |row: &Investor| {
                row.state.map(str::to_owned).into()
            })
            .sortable(false),
            ColumnDef::new("actions", "", |_: &Investor| CellValue::Empty)
                .sortable(false)
                .hideable(false),
        ]
    }

    fn investors(count: usize) -> Vec<Investor> {
        (0..count)
            .map(|i| Investor {
                name: ["Acme", "Birch", "Cedar", "Delta"][i % 4],
                commitment: (i * 1000) as f64,
                state: (i % 3 != 0).then_some("Active"),
            })
            .collect()
    }

    fn internal(rows: usize) -> Table<Investor> {
        let mut table = Table::internal(columns(), TableOptions::default(), TableState::default());
        table.set_data(investors(rows));
        table
    }

    #[test]
    fn last_page_holds_the_remainder() {
        let mut table = internal(23);
        assert_eq!(table.page_count(), 3);
        table.last_page();
        assert_eq!(table.row_model().len(), 3);

        let mut even = internal(20);
        even.last_page();
        assert_eq!(even.page_count(), 2);
        assert_eq!(even.row_model().len(), 10);
    }

    #[test]
    fn changing_page_clears_selection() {
        let mut table = internal(25);
        table.toggle_page_selected();
        assert!(table.is_page_selected());
        assert_eq!(table.selected_rows().len(), 10);

        table.next_page();
        assert!(table.state().selection.is_empty());
        assert!(!table.is_page_selected());
    }

    #[test]
    fn page_index_is_clamped() {
        let mut table = internal(15);
        table.set_page_index(7);
        assert_eq!(table.state().pagination.page_index(), 1);
        assert!(!table.can_next_page());
        table.next_page();
        assert_eq!(table.state().pagination.page_index(), 1);
    }

    #[test]
    fn page_size_change_keeps_top_row() {
        let mut table = internal(100);
        table.set_page_index(3);
        table.set_page_size(20).unwrap();
        assert_eq!(table.state().pagination.page_index(), 1);
        assert_eq!(table.row_model()[0].index, 20);

        assert_eq!(table.set_page_size(0), Err(TableError::InvalidPageSize));
    }

    #[test]
    fn sort_cycles_through_directions() {
        let mut table = internal(8);
        table.toggle_sort("commitment", false).unwrap();
        assert_eq!(table.sorting(), &[SortSpec::asc("commitment")]);
        table.toggle_sort("commitment", false).unwrap();
        assert_eq!(table.row_model()[0].row.commitment, 7000.0);
        table.toggle_sort("commitment", false).unwrap();
        assert!(table.sorting().is_empty());

        assert_eq!(
            table.toggle_sort("missing", false),
            Err(TableError::UnknownColumn(Ustr::from("missing")))
        );
        table.toggle_sort("state", false).unwrap();
        assert!(table.sorting().is_empty());
    }

    #[test]
    fn multi_sort_is_stable() {
        let mut table = internal(8);
        table.toggle_sort("name", true).unwrap();
        table.toggle_sort("commitment", true).unwrap();
        table.toggle_sort("commitment", true).unwrap();

        let names: Vec<_> = table
            .row_model()
            .iter()
            .map(|row| (row.row.name, row.row.commitment))
            .collect();
        assert_eq!(names[0], ("Acme", 4000.0));
        assert_eq!(names[1], ("Acme", 0.0));
        assert_eq!(names[2].0, "Birch");
    }

    #[test]
    fn empty_cells_sort_last_both_ways() {
        let mut table = internal(6);
        table.set_sorting(vec![SortSpec::desc("state")]);
        let last = table.row_model().last().map(|row| row.row.state);
        assert_eq!(last, Some(None));

        table.set_sorting(vec![SortSpec::asc("state")]);
        let last = table.row_model().last().map(|row| row.row.state);
        assert_eq!(last, Some(None));
    }

    #[test]
    fn filters_reset_to_first_page() {
        let mut table = internal(40);
        table.set_page_index(2);
        table.set_global_filter("cedar");
        assert_eq!(table.state().pagination.page_index(), 0);
        assert_eq!(table.row_count(), 10);

        table.set_page_index(1);
        table.set_column_filter("name", "acme").unwrap();
        assert_eq!(table.state().pagination.page_index(), 0);
        assert_eq!(table.row_count(), 0);

        table.set_column_filter("name", "").unwrap();
        assert_eq!(table.state().column_filter("name"), None);
    }

    #[test]
    fn hidden_columns_are_left_out() {
        let mut table = internal(1);
        table.toggle_column_visibility("state").unwrap();
        table.toggle_column_visibility("actions").unwrap();

        let ids: Vec<_> = table.visible_columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["name", "commitment", "actions"]);
    }

    #[test]
    fn loading_renders_skeleton_grid() {
        let mut columns = columns();
        columns.truncate(4);
        let table: Table<Investor> =
            Table::internal(columns, TableOptions::manual(), TableState::default());

        match table.body(LoadState::Loading) {
            TableBody::Skeleton { rows, columns } => {
                assert_eq!(rows, 5);
                assert_eq!(columns, 4);
            }
            other => panic!("expected skeleton, got {other:?}"),
        }
    }

    #[test]
    fn body_reports_errors_and_empty() {
        let table = internal(0);
        assert!(matches!(
            table.body(LoadState::Ready),
            TableBody::Empty { colspan: 4 }
        ));

        let err = FetchError::with_response("HTTP 500", 500, Some("Database unavailable".into()));
        match table.body(LoadState::Failed(&err)) {
            TableBody::Error { message, colspan } => {
                assert_eq!(message, "Database unavailable");
                assert_eq!(colspan, 4);
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn controlled_table_only_reports_changes() {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        let mut table = Table::controlled(
            columns(),
            TableOptions::default(),
            TableState::default(),
            move |change: TableChange| sink.lock().unwrap().push(change),
        );
        table.set_data(investors(30));

        table.next_page();
        assert_eq!(table.state().pagination.page_index(), 0);

        let reported = changes.lock().unwrap().clone();
        assert_eq!(
            reported,
            vec![TableChange::Pagination(Pagination::new(1, 10).unwrap())]
        );

        let mut owned = table.state().clone();
        for change in reported {
            change.apply(&mut owned);
        }
        table.sync_state(owned);
        assert_eq!(table.state().pagination.page_index(), 1);
    }

    #[test]
    fn custom_row_ids_drive_selection() {
        let mut table = Table::internal(
            columns(),
            TableOptions::default().with_row_id(|row: &Investor, _| Ustr::from(row.name)),
            TableState::default(),
        );
        table.set_data(investors(4));
        table.toggle_row_selected(Ustr::from("Birch"));

        let selected: Vec<_> = table.selected_rows().iter().map(|row| row.name).collect();
        assert_eq!(selected, vec!["Birch"]);
        let event = TableEvent::RowClicked(table.selected_rows()[0].clone());
        assert!(matches!(event, TableEvent::RowClicked(Investor { name: "Birch", .. })));
    }
}

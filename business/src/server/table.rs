//! A table whose rows come from a [`DataSource`].
//!
//! The frame loop calls [`ServerTable::tick`] with the current time. A tick
//! settles the debounced search, applies finished fetches and dispatches a new
//! fetch when the parameters changed since the last one. Only the most recent
//! fetch may update the rows.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use flume::{Receiver, Sender};
use fundesk_states::{TaskId, TaskSlot};

use super::{DataSource, FetchParams, FetchResult};
use crate::filters::{
    FilterDefinition, FilterEvent, FilterModel, FilterPicker, Relation, UserDirectory, find_definition,
};
use crate::table::{ColumnDef, LoadState, Table, TableBody, TableController, TableOptions, TableState};
use crate::{BusinessConfig, Debounced, FetchError};

/// Query flags as seen by the page.
#[derive(Debug, Clone, Copy)]
pub struct QueryStatus<'a> {
    /// Nothing has loaded yet and a request is in flight.
    pub is_loading: bool,
    pub is_fetching: bool,
    pub error: Option<&'a FetchError>,
    pub total_count: Option<usize>,
}

/// A [`Table`] with manual pagination, sorting and filtering whose rows
/// come from a [`DataSource`].
pub struct ServerTable<R> {
    table: Table<R>,
    definitions: Vec<FilterDefinition>,
    filters: FilterModel,
    picker: FilterPicker,
    search: Debounced<String>,
    source: Arc<dyn DataSource<R>>,
    slot: TaskSlot,
    send: Sender<(TaskId, FetchResult<R>)>,
    recv: Receiver<(TaskId, FetchResult<R>)>,
    last_params: Option<FetchParams>,
    force_fetch: bool,
    loaded: bool,
    error: Option<FetchError>,
    total_count: Option<usize>,
}

impl<R> fmt::Debug for ServerTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerTable")
            .field("state", self.table.state())
            .field("filters", &self.filters)
            .field("search", &self.search)
            .field("slot", &self.slot)
            .field("last_params", &self.last_params)
            .field("loaded", &self.loaded)
            .field("error", &self.error)
            .field("total_count", &self.total_count)
            .finish_non_exhaustive()
    }
}

impl<R: Send + 'static> ServerTable<R> {
    /// Table state owned by the table itself.
    pub fn new(
        name: &str,
        columns: Vec<ColumnDef<R>>,
        definitions: Vec<FilterDefinition>,
        source: Arc<dyn DataSource<R>>,
        config: &BusinessConfig,
    ) -> Self {
        let state = TableState::with_page_size(config.default_page_size).unwrap_or_default();
        let table = Table::internal(columns, TableOptions::manual(), state);
        Self::with_table(name, table, definitions, source, config)
    }

    /// Table state owned by the page; changes go to `controller` and come
    /// back through [`Self::sync_state`].
    pub fn controlled(
        name: &str,
        columns: Vec<ColumnDef<R>>,
        definitions: Vec<FilterDefinition>,
        source: Arc<dyn DataSource<R>>,
        config: &BusinessConfig,
        state: TableState,
        controller: impl TableController + 'static,
    ) -> Self {
        let table = Table::controlled(columns, TableOptions::manual(), state, controller);
        Self::with_table(name, table, definitions, source, config)
    }

    fn with_table(
        name: &str,
        table: Table<R>,
        definitions: Vec<FilterDefinition>,
        source: Arc<dyn DataSource<R>>,
        config: &BusinessConfig,
    ) -> Self {
        let (send, recv) = flume::unbounded();
        let search = Debounced::new(table.global_filter().to_owned(), config.search_debounce());
        Self {
            table,
            definitions,
            filters: FilterModel::new(),
            picker: FilterPicker::new(None, config.search_debounce()),
            search,
            source,
            slot: TaskSlot::new(name),
            send,
            recv,
            last_params: None,
            force_fetch: false,
            loaded: false,
            error: None,
            total_count: None,
        }
    }

    /// Enables user-select filters.
    pub fn with_user_directory(mut self, directory: Arc<dyn UserDirectory>, debounce: Duration) -> Self {
        self.picker = FilterPicker::new(Some(directory), debounce);
        self
    }

    pub fn table(&self) -> &Table<R> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut Table<R> {
        &mut self.table
    }

    /// Pushes the owner's state snapshot in controlled mode.
    ///
    /// A search the user is still typing survives the sync.
    pub fn sync_state(&mut self, state: TableState) {
        if state.global_filter != *self.search.settled() {
            self.search.sync_settled(state.global_filter.clone());
        }
        self.table.sync_state(state);
    }

    pub fn definitions(&self) -> &[FilterDefinition] {
        &self.definitions
    }

    pub fn filters(&self) -> &FilterModel {
        &self.filters
    }

    pub fn picker(&self) -> &FilterPicker {
        &self.picker
    }

    pub fn picker_mut(&mut self) -> &mut FilterPicker {
        &mut self.picker
    }

    /// Drills the picker into a definition, pre-filling date ranges.
    pub fn choose_filter(&mut self, filter_id: &str) {
        let Some(definition) = find_definition(&self.definitions, filter_id) else {
            log::warn!("No filter definition '{filter_id}'");
            return;
        };
        self.picker.choose(definition, self.filters.date_range());
    }

    /// Text shown in the search box, settled or not.
    pub fn search_text(&self) -> &str {
        self.search.latest()
    }

    /// Search box input. Settles into the global filter after the debounce.
    pub fn set_search(&mut self, text: impl Into<String>, now: DateTime<Utc>) {
        self.search.set(text.into(), now);
    }

    /// Applies what the picker produced. Any change goes back to page one.
    pub fn apply_filter_event(&mut self, event: FilterEvent) {
        if self.filters.apply(event) {
            self.table.reset_page();
        }
    }

    pub fn select_option(&mut self, filter_id: &str, option_id: &str) {
        if self.filters.select_option(filter_id, option_id) {
            self.table.reset_page();
        }
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        if self.filters.set_date_range(start, end) {
            self.table.reset_page();
        }
    }

    /// Removes one chip. Either date bound removes the whole range.
    pub fn remove_filter(&mut self, filter_id: &str, option_id: &str) {
        if self.filters.remove(filter_id, option_id) {
            self.table.reset_page();
        }
    }

    pub fn clear_filters(&mut self) {
        if self.filters.clear_all() {
            self.table.reset_page();
        }
    }

    /// Chooses the operator of a filter; active filters go back to page one.
    pub fn set_relation(&mut self, filter_id: &str, relation: Relation) {
        let is_date_range = matches!(
            find_definition(&self.definitions, filter_id),
            Some(FilterDefinition::DateRange { .. })
        );
        let active = self
            .filters
            .clauses()
            .iter()
            .any(|clause| clause.filter_id.as_str() == filter_id)
            || (is_date_range && self.filters.date_range().is_some());
        if self.filters.set_relation(filter_id, relation) && active {
            self.table.reset_page();
        }
    }

    /// Parameters derived from the current state.
    pub fn params(&self) -> FetchParams {
        let state = self.table.state();
        FetchParams {
            page_index: state.pagination.page_index(),
            page_size: state.pagination.page_size(),
            sort_by: state.sorting.clone(),
            filters: self.filters.clauses().to_vec(),
            relations: self.filters.active_relations(&self.definitions),
            search: state.global_filter.clone(),
        }
    }

    /// Fetches again on the next tick even if nothing changed.
    pub fn refetch(&mut self) {
        self.force_fetch = true;
    }

    /// Runs once per frame: settles the search, ticks the picker, applies
    /// finished fetches and dispatches a fetch if the parameters changed.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if let Some(search) = self.search.poll(now) {
            log::debug!("Search settled on '{search}'");
            self.table.set_global_filter(&search);
        }

        self.picker.tick(now);

        self.drain_results();

        let params = self.params();
        if self.force_fetch || self.last_params.as_ref() != Some(&params) {
            self.force_fetch = false;
            self.dispatch(params);
        }
    }

    fn drain_results(&mut self) {
        let results: Vec<_> = self.recv.try_iter().collect();
        for (id, result) in results {
            if !self.slot.finish(id) {
                log::debug!(
                    "Discarding stale result {} for '{}'",
                    id.generation(),
                    id.owner()
                );
                continue;
            }
            match result {
                Ok(page) => {
                    log::debug!(
                        "'{}' received {} rows of {}",
                        id.owner(),
                        page.data.len(),
                        page.total_count
                    );
                    self.table.set_data(page.data);
                    self.table.set_row_count(Some(page.total_count));
                    self.total_count = Some(page.total_count);
                    self.loaded = true;
                    self.error = None;
                }
                Err(err) => {
                    log::warn!("'{}' fetch failed: {err}", id.owner());
                    self.error = Some(err);
                }
            }
        }
    }

    fn dispatch(&mut self, params: FetchParams) {
        let handle = self.slot.begin();
        let id = handle.id();
        let send = self.send.clone();
        log::debug!(
            "'{}' fetching page {} (size {}, sort '{}', search '{}', {} filters)",
            id.owner(),
            params.page_index,
            params.page_size,
            params.encoded_sort(),
            params.search,
            params.filters.len()
        );
        self.error = None;
        self.source.fetch(
            &params,
            handle.cancellation_token(),
            Box::new(move |result| {
                if send.send((id, result)).is_err() {
                    log::debug!("Fetch finished after its table was dropped");
                }
            }),
        );
        self.last_params = Some(params);
    }

    /// Loading flags in the shape pages expect.
    pub fn status(&self) -> QueryStatus<'_> {
        let in_flight = self.slot.in_flight();
        QueryStatus {
            is_loading: in_flight && !self.loaded,
            is_fetching: in_flight,
            error: self.error.as_ref(),
            total_count: self.total_count,
        }
    }

    pub fn load_state(&self) -> LoadState<'_> {
        let status = self.status();
        match status.error {
            Some(err) => LoadState::Failed(err),
            None if status.is_loading => LoadState::Loading,
            None => LoadState::Ready,
        }
    }

    /// What the table body shows this frame.
    pub fn body(&self) -> TableBody<'_, R> {
        self.table.body(self.load_state())
    }

    /// How long until a debounced input settles, for scheduling a repaint.
    pub fn next_deadline(&self, now: DateTime<Utc>) -> Option<Duration> {
        match (self.search.remaining(now), self.picker.next_deadline(now)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::TimeZone;

    use super::*;
    use crate::filters::FilterOption;
    use crate::table::{Pagination, TableChange};
    use crate::test_utils::{StubSource, TaskRow, task_columns, task_rows};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn ms(millis: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(millis)
    }

    fn config() -> BusinessConfig {
        BusinessConfig::new("http://localhost:8000".to_owned())
    }

    fn definitions() -> Vec<FilterDefinition> {
        vec![
            FilterDefinition::component(
                "state",
                "Status",
                vec![
                    FilterOption::new("Open", "Open"),
                    FilterOption::new("Completed", "Completed"),
                ],
            ),
            FilterDefinition::date_range("due", "Due date")
                .with_relations(vec![Relation::Before, Relation::After]),
        ]
    }

    fn controlled_table(
        changes: &Arc<Mutex<Vec<TableChange>>>,
    ) -> (ServerTable<TaskRow>, Arc<StubSource<TaskRow>>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let sink = Arc::clone(changes);
        let source = Arc::new(StubSource::<TaskRow>::default());
        let table = ServerTable::controlled(
            "limited_partners",
            task_columns(),
            definitions(),
            source.clone(),
            &config(),
            TableState::default(),
            move |change: TableChange| sink.lock().unwrap().push(change),
        );
        (table, source)
    }

    /// What the owning page does each frame: apply the changes, push back.
    fn owner_sync(table: &mut ServerTable<TaskRow>, changes: &Arc<Mutex<Vec<TableChange>>>) -> TableState {
        let mut owned = table.table().state().clone();
        for change in changes.lock().unwrap().drain(..) {
            change.apply(&mut owned);
        }
        table.sync_state(owned.clone());
        owned
    }

    fn server_table() -> (ServerTable<TaskRow>, Arc<StubSource<TaskRow>>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let source = Arc::new(StubSource::<TaskRow>::default());
        let table = ServerTable::new("tasks", task_columns(), definitions(), source.clone(), &config());
        (table, source)
    }

    /// Loads the first page with `total` rows on the server.
    fn loaded(total: usize) -> (ServerTable<TaskRow>, Arc<StubSource<TaskRow>>) {
        let (mut table, source) = server_table();
        table.tick(t0());
        source.respond_page(0, task_rows(10), total);
        table.tick(t0());
        (table, source)
    }

    #[test]
    fn typing_inside_debounce_fetches_once() {
        let (mut table, source) = server_table();
        table.tick(t0());

        table.set_search("a", ms(10));
        table.tick(ms(20));
        table.set_search("ab", ms(50));
        table.set_search("abc", ms(100));
        table.tick(ms(300));
        assert_eq!(source.fetch_count(), 1);

        table.tick(ms(500));
        table.tick(ms(900));

        let searches: Vec<_> = source
            .params()
            .into_iter()
            .map(|params| params.search)
            .filter(|search| !search.is_empty())
            .collect();
        assert_eq!(searches, vec!["abc".to_owned()]);
        assert_eq!(table.search_text(), "abc");
    }

    #[test]
    fn unchanged_params_are_not_refetched() {
        let (mut table, source) = loaded(30);
        table.tick(ms(100));
        table.tick(ms(200));
        assert_eq!(source.fetch_count(), 1);

        table.refetch();
        table.tick(ms(300));
        assert_eq!(source.fetch_count(), 2);
    }

    #[test]
    fn stale_results_are_discarded() {
        let (mut table, source) = loaded(30);

        table.table_mut().next_page();
        table.tick(ms(10));
        table.table_mut().next_page();
        table.tick(ms(20));
        assert_eq!(source.fetch_count(), 3);
        assert!(source.is_cancelled(1));
        assert!(!source.is_cancelled(2));

        let newest = vec![TaskRow {
            id: "task-20".into(),
            title: "Newest".into(),
            state: "Open".into(),
        }];
        source.respond_page(2, newest.clone(), 30);
        source.respond_page(1, task_rows(10), 30);
        table.tick(ms(30));

        assert_eq!(table.table().data(), newest.as_slice());
        assert!(!table.status().is_fetching);
    }

    #[test]
    fn previous_rows_stay_visible_while_refetching() {
        let (mut table, _source) = loaded(30);
        table.table_mut().next_page();
        table.tick(ms(10));

        let status = table.status();
        assert!(!status.is_loading);
        assert!(status.is_fetching);
        assert_eq!(status.total_count, Some(30));
        assert!(matches!(table.body(), TableBody::Rows(rows) if rows.len() == 10));
    }

    #[test]
    fn first_load_shows_skeleton() {
        let (mut table, _source) = server_table();
        table.tick(t0());
        assert!(table.status().is_loading);
        assert!(matches!(
            table.body(),
            TableBody::Skeleton { rows: 5, columns: 4 }
        ));
    }

    #[test]
    fn failure_shows_detail_until_refetch() {
        let (mut table, source) = server_table();
        table.tick(t0());
        source.respond(
            0,
            Err(FetchError::with_response(
                "HTTP 500",
                500,
                Some("Database unavailable".to_owned()),
            )),
        );
        table.tick(t0());
        match table.body() {
            TableBody::Error { message, colspan } => {
                assert_eq!(message, "Database unavailable");
                assert_eq!(colspan, 4);
            }
            other => panic!("expected error body, got {other:?}"),
        }

        table.refetch();
        table.tick(ms(10));
        assert!(table.body().is_skeleton());

        source.respond_page(1, Vec::new(), 0);
        table.tick(ms(20));
        assert!(matches!(table.body(), TableBody::Empty { colspan: 4 }));
    }

    #[test]
    fn filter_changes_go_back_to_first_page() {
        let (mut table, source) = loaded(30);
        table.table_mut().last_page();
        table.tick(ms(10));
        assert_eq!(source.params()[1].page_index, 2);

        table.select_option("state", "Open");
        table.select_option("state", "Completed");
        table.tick(ms(20));

        let params = source.params().pop().unwrap();
        assert_eq!(params.page_index, 0);
        assert_eq!(params.filters.len(), 2);
        let conditions = params.conditions();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].values.len(), 2);
        assert_eq!(params.relations.get(&ustr::Ustr::from("state")), Some(&Relation::Is));
    }

    #[test]
    fn search_resets_page() {
        let (mut table, source) = loaded(30);
        table.table_mut().next_page();
        table.tick(ms(10));

        table.set_search("fund", ms(20));
        table.tick(ms(500));

        let params = source.params().pop().unwrap();
        assert_eq!(params.search, "fund");
        assert_eq!(params.page_index, 0);
    }

    #[test]
    fn dropping_the_table_cancels_its_fetch() {
        let (mut table, source) = server_table();
        table.tick(t0());
        assert!(!source.is_cancelled(0));

        drop(table);
        assert!(source.is_cancelled(0));
        source.respond_page(0, task_rows(1), 1);
    }

    #[test]
    fn controlled_table_fetches_the_owner_state() {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let (mut table, source) = controlled_table(&changes);
        table.tick(t0());
        source.respond_page(0, task_rows(10), 50);
        table.tick(t0());

        table.table_mut().next_page();
        table.tick(ms(10));
        assert_eq!(source.fetch_count(), 1);

        let owned = owner_sync(&mut table, &changes);
        assert_eq!(owned.pagination, Pagination::new(1, 10).unwrap());
        table.tick(ms(20));

        assert_eq!(source.fetch_count(), 2);
        assert_eq!(source.params()[1].page_index, 1);
    }

    #[test]
    fn controlled_search_keeps_typing_across_owner_sync() {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let (mut table, source) = controlled_table(&changes);
        table.tick(t0());

        table.set_search("abc", ms(10));
        table.tick(ms(410));
        table.set_search("abcd", ms(420));
        let owned = owner_sync(&mut table, &changes);

        assert_eq!(owned.global_filter, "abc");
        assert_eq!(table.search_text(), "abcd");
        table.tick(ms(430));

        table.tick(ms(820));
        owner_sync(&mut table, &changes);
        table.tick(ms(830));

        let searches: Vec<_> = source.params().into_iter().map(|params| params.search).collect();
        assert_eq!(searches, vec!["", "abc", "abcd"]);
        assert_eq!(table.search_text(), "abcd");
    }

    #[test]
    fn date_range_relation_reaches_the_query() {
        let (mut table, source) = loaded(30);
        table.set_date_range(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        );
        table.set_relation("due", Relation::After);
        table.tick(ms(10));

        let params = source.params().pop().unwrap();
        let relations: Vec<_> = params
            .conditions()
            .into_iter()
            .map(|condition| (condition.filter_id.to_string(), condition.relation))
            .collect();
        assert_eq!(
            relations,
            vec![
                ("start_date".to_owned(), Relation::After),
                ("end_date".to_owned(), Relation::After),
            ]
        );
    }
}

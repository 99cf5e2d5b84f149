//! Command-palette style filter picker.
//!
//! `Closed → Root → (Options | DateRange | UserSearch)`. Picking a value closes
//! the picker and hands back a [`FilterEvent`] for the [`FilterModel`](super::FilterModel).

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use flume::{Receiver, Sender};
use fundesk_states::{TaskId, TaskSlot};
use ustr::Ustr;

use super::{FilterDefinition, FilterEvent, FilterOption, UserDirectory, UserRef, UserSearchResult};
use crate::{Debounced, FetchError};

/// Which page of the picker is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerView {
    Closed,
    Root,
    Options {
        filter_id: Ustr,
    },
    DateRange {
        filter_id: Ustr,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    UserSearch {
        filter_id: Ustr,
    },
}

/// Command-palette state for adding filters.
///
/// Opens on the list of definitions and drills into one of them. Picking
/// yields a [`FilterEvent`] for the owner to apply.
pub struct FilterPicker {
    view: PickerView,
    query: String,
    directory: Option<Arc<dyn UserDirectory>>,
    user_query: Debounced<String>,
    /// Query to send on the next tick, set when the user search opens.
    search_requested: Option<String>,
    users: Vec<UserRef>,
    user_error: Option<FetchError>,
    slot: TaskSlot,
    send: Sender<(TaskId, UserSearchResult)>,
    recv: Receiver<(TaskId, UserSearchResult)>,
}

impl std::fmt::Debug for FilterPicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterPicker")
            .field("view", &self.view)
            .field("query", &self.query)
            .field("has_directory", &self.directory.is_some())
            .field("user_query", &self.user_query)
            .field("users", &self.users)
            .field("user_error", &self.user_error)
            .field("slot", &self.slot)
            .finish()
    }
}

impl FilterPicker {
    /// Without a directory, user-select filters show no results.
    pub fn new(directory: Option<Arc<dyn UserDirectory>>, debounce: Duration) -> Self {
        let (send, recv) = flume::unbounded();
        Self {
            view: PickerView::Closed,
            query: String::new(),
            directory,
            user_query: Debounced::new(String::new(), debounce),
            search_requested: None,
            users: Vec::new(),
            user_error: None,
            slot: TaskSlot::new("user_search"),
            send,
            recv,
        }
    }

    pub fn view(&self) -> &PickerView {
        &self.view
    }

    pub fn is_open(&self) -> bool {
        self.view != PickerView::Closed
    }

    /// Shows the list of definitions with an empty query.
    pub fn open(&mut self) {
        self.view = PickerView::Root;
        self.query.clear();
    }

    /// Hides the picker and cancels any user search.
    pub fn close(&mut self) {
        self.view = PickerView::Closed;
        self.query.clear();
        self.slot.cancel();
    }

    /// One level up; closes from the root.
    pub fn back(&mut self) {
        match self.view {
            PickerView::Closed | PickerView::Root => self.close(),
            PickerView::Options { .. }
            | PickerView::DateRange { .. }
            | PickerView::UserSearch { .. } => {
                self.slot.cancel();
                self.view = PickerView::Root;
                self.query.clear();
            }
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Definitions matching the query. Dividers are kept only between
    /// visible entries, and dropped entirely while searching.
    pub fn visible_definitions<'a>(
        &self,
        definitions: &'a [FilterDefinition],
    ) -> Vec<&'a FilterDefinition> {
        let searching = !self.query.trim().is_empty();
        let mut visible: Vec<&FilterDefinition> = Vec::new();
        for definition in definitions {
            if definition.is_divider() {
                if !searching && visible.last().is_some_and(|last| !last.is_divider()) {
                    visible.push(definition);
                }
            } else if definition.matches(&self.query) {
                visible.push(definition);
            }
        }
        if visible.last().is_some_and(|last| last.is_divider()) {
            visible.pop();
        }
        visible
    }

    /// Options of the drilled-into component, filtered by the query.
    pub fn visible_options<'a>(&self, definitions: &'a [FilterDefinition]) -> Vec<&'a FilterOption> {
        let PickerView::Options { filter_id } = &self.view else {
            return Vec::new();
        };
        let query = self.query.trim().to_lowercase();
        super::find_definition(definitions, filter_id)
            .map(FilterDefinition::options)
            .unwrap_or_default()
            .iter()
            .filter(|option| query.is_empty() || option.label.to_lowercase().contains(&query))
            .collect()
    }

    /// Drills into `definition`. `current_range` pre-fills the calendar.
    pub fn choose(
        &mut self,
        definition: &FilterDefinition,
        current_range: Option<(NaiveDate, NaiveDate)>,
    ) {
        self.query.clear();
        match definition {
            FilterDefinition::Component { field, .. } => {
                self.view = PickerView::Options { filter_id: field.id };
            }
            FilterDefinition::DateRange { field } => {
                self.view = PickerView::DateRange {
                    filter_id: field.id,
                    start: current_range.map(|(start, _)| start),
                    end: current_range.map(|(_, end)| end),
                };
            }
            FilterDefinition::UserSelect { field } => {
                if self.directory.is_none() {
                    log::warn!("Filter '{}' needs a user directory but none is configured", field.id);
                }
                self.view = PickerView::UserSearch { filter_id: field.id };
                self.users.clear();
                self.user_error = None;
                self.user_query.reset(String::new());
                self.search_requested = Some(String::new());
            }
            FilterDefinition::Divider => {
                log::warn!("Divider is not selectable");
            }
        }
    }

    /// Picks an option of the component being shown and closes the picker.
    pub fn pick_option(&mut self, option_id: &str) -> Option<FilterEvent> {
        let PickerView::Options { filter_id } = &self.view else {
            return None;
        };
        let event = FilterEvent::Option {
            filter_id: *filter_id,
            option_id: Ustr::from(option_id),
        };
        self.close();
        Some(event)
    }

    pub fn set_range_start(&mut self, date: NaiveDate) {
        if let PickerView::DateRange { start, .. } = &mut self.view {
            *start = Some(date);
        }
    }

    pub fn set_range_end(&mut self, date: NaiveDate) {
        if let PickerView::DateRange { end, .. } = &mut self.view {
            *end = Some(date);
        }
    }

    pub fn date_range_draft(&self) -> Option<(Option<NaiveDate>, Option<NaiveDate>)> {
        match &self.view {
            PickerView::DateRange { start, end, .. } => Some((*start, *end)),
            _ => None,
        }
    }

    /// Emits the range once both ends are chosen.
    pub fn confirm_date_range(&mut self) -> Option<FilterEvent> {
        let PickerView::DateRange {
            start: Some(start),
            end: Some(end),
            ..
        } = self.view
        else {
            return None;
        };
        self.close();
        Some(FilterEvent::DateRange { start, end })
    }

    pub fn user_query(&self) -> &str {
        self.user_query.latest()
    }

    /// Debounced; the search runs once typing stops.
    pub fn set_user_query(&mut self, query: impl Into<String>, now: DateTime<Utc>) {
        self.user_query.set(query.into(), now);
    }

    pub fn users(&self) -> &[UserRef] {
        &self.users
    }

    /// Why the last user search failed.
    pub fn user_error(&self) -> Option<&FetchError> {
        self.user_error.as_ref()
    }

    pub fn is_searching_users(&self) -> bool {
        self.slot.in_flight()
    }

    /// Picks a user from the current results and closes the picker.
    pub fn pick_user(&mut self, user_id: &str) -> Option<FilterEvent> {
        let PickerView::UserSearch { filter_id } = &self.view else {
            return None;
        };
        let filter_id = *filter_id;
        let user = self.users.iter().find(|user| user.id == user_id)?.clone();
        self.close();
        Some(FilterEvent::User { filter_id, user })
    }

    /// Sends settled user queries and applies finished searches.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if !matches!(self.view, PickerView::UserSearch { .. }) {
            return;
        }

        if let Some(query) = self.user_query.poll(now) {
            self.search_requested = Some(query);
        }
        if let Some(query) = self.search_requested.take() {
            self.search_users(&query);
        }

        for (id, result) in self.recv.try_iter() {
            if !self.slot.finish(id) {
                log::debug!("Dropping stale user search {}", id.generation());
                continue;
            }
            match result {
                Ok(users) => {
                    self.users = users;
                    self.user_error = None;
                }
                Err(err) => {
                    log::warn!("User search failed: {err}");
                    self.user_error = Some(err);
                }
            }
        }
    }

    /// Time until the user query settles.
    pub fn next_deadline(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.user_query.remaining(now)
    }

    fn search_users(&mut self, query: &str) {
        let Some(directory) = &self.directory else {
            return;
        };
        let handle = self.slot.begin();
        let id = handle.id();
        let send = self.send.clone();
        log::debug!("Searching users for '{query}'");
        directory.search(
            query,
            handle.cancellation_token(),
            Box::new(move |result| {
                if send.send((id, result)).is_err() {
                    log::debug!("User search finished after the picker was dropped");
                }
            }),
        );
    }
}

//! Compliance tasks. The table owns its own state.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use egui::{RichText, Ui};
use fundesk_business::filters::{FilterDefinition, FilterOption, Relation, UserRef};
use fundesk_business::server::{RestSource, RestUserDirectory, ServerTable};
use fundesk_business::table::{CellValue, ColumnDef, TableEvent};
use fundesk_business::{BusinessConfig, FetchService, SessionHandle};
use serde::Deserialize;

use super::fetch_poll_interval;
use crate::widgets::data_table;

/// Row of `GET /api/tasks`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignee: Option<UserRef>,
}

pub fn task_columns() -> Vec<ColumnDef<Task>> {
    vec![
        ColumnDef::new("title", "Title", |task: &Task| CellValue::from(task.title.as_str()))
            .hideable(false),
        ColumnDef::new("state", "Status", |task: &Task| CellValue::from(task.state.as_str())),
        ColumnDef::new("priority", "Priority", |task: &Task| CellValue::from(task.priority.clone())),
        ColumnDef::new("due_date", "Due date", |task: &Task| CellValue::from(task.due_date)),
        ColumnDef::new("assignee", "Assignee", |task: &Task| {
            CellValue::from(task.assignee.as_ref().map(|user| user.display_name().to_owned()))
        })
        .sortable(false),
    ]
}

/// Status and priority options, due date range and assignee.
pub fn task_filters() -> Vec<FilterDefinition> {
    vec![
        FilterDefinition::component(
            "state",
            "Status",
            vec![
                FilterOption::new("Open", "Open").with_icon("○"),
                FilterOption::new("In Progress", "In progress").with_icon("◐"),
                FilterOption::new("Completed", "Completed").with_icon("●"),
            ],
        )
        .with_relations(vec![Relation::Is, Relation::IsNot]),
        FilterDefinition::component(
            "priority",
            "Priority",
            vec![
                FilterOption::new("high", "High"),
                FilterOption::new("medium", "Medium"),
                FilterOption::new("low", "Low"),
            ],
        ),
        FilterDefinition::divider(),
        FilterDefinition::date_range("due_date", "Due date").with_icon("📅"),
        FilterDefinition::divider(),
        FilterDefinition::user_select("assignee", "Assignee").with_icon("👤"),
    ]
}

#[derive(Debug)]
pub struct TasksScreen {
    table: ServerTable<Task>,
    page_size_options: Vec<usize>,
    selected: Option<Task>,
}

impl TasksScreen {
    pub fn new(
        config: &BusinessConfig,
        fetcher: &Arc<dyn FetchService>,
        session: &SessionHandle,
    ) -> Self {
        let source = RestSource::new(config, "tasks", Arc::clone(fetcher)).with_session(session.clone());
        let directory = RestUserDirectory::new(config, Arc::clone(fetcher)).with_session(session.clone());

        let table = ServerTable::new("tasks", task_columns(), task_filters(), Arc::new(source), config)
            .with_user_directory(Arc::new(directory), config.search_debounce());

        Self {
            table,
            page_size_options: config.page_size_options.clone(),
            selected: None,
        }
    }

    pub fn table(&self) -> &ServerTable<Task> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut ServerTable<Task> {
        &mut self.table
    }

    pub fn selected(&self) -> Option<&Task> {
        self.selected.as_ref()
    }

    /// Ticks the table, renders it and the selected task.
    pub fn show(&mut self, ui: &mut Ui, now: DateTime<Utc>) {
        self.table.tick(now);

        ui.heading("Tasks");
        ui.add_space(8.0);

        if let Some(TableEvent::RowClicked(task)) =
            data_table(ui, "tasks_table", &mut self.table, &self.page_size_options, now)
        {
            log::info!("Opening task {}", task.id);
            self.selected = Some(task);
        }

        let mut close = false;
        if let Some(task) = &self.selected {
            ui.separator();
            ui.horizontal(|ui| {
                ui.label(RichText::new(&task.title).strong());
                ui.label(format!("· {}", task.state));
                if let Some(due) = task.due_date {
                    ui.label(format!("· due {}", due.format("%Y-%m-%d")));
                }
                close = ui.small_button("✕").clicked();
            });
        }
        if close {
            self.selected = None;
        }
    }

    /// When the screen next needs a frame without user input.
    pub fn repaint_after(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.table.status().is_fetching || self.table.picker().is_searching_users() {
            return Some(fetch_poll_interval());
        }
        self.table.next_deadline(now)
    }
}

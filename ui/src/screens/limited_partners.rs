//! Limited partner onboarding. The screen owns the table state so it can
//! outlive the table and be restored.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use egui::Ui;
use flume::Receiver;
use fundesk_business::filters::{FilterDefinition, FilterOption};
use fundesk_business::server::{RestSource, ServerTable};
use fundesk_business::table::{CellValue, ColumnDef, TableChange, TableEvent, TableState};
use fundesk_business::{BusinessConfig, FetchService, SessionHandle};
use serde::Deserialize;

use super::fetch_poll_interval;
use crate::widgets::data_table;

/// Row of `GET /api/limited-partners`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitedPartner {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub lp_type: Option<String>,
    pub status: String,
    #[serde(default)]
    pub commitment: Option<f64>,
    #[serde(default)]
    pub kyc_complete: bool,
}

fn columns() -> Vec<ColumnDef<LimitedPartner>> {
    vec![
        ColumnDef::new("name", "Name", |lp: &LimitedPartner| CellValue::from(lp.name.as_str()))
            .hideable(false),
        ColumnDef::new("lp_type", "Type", |lp: &LimitedPartner| CellValue::from(lp.lp_type.clone())),
        ColumnDef::new("status", "Status", |lp: &LimitedPartner| CellValue::from(lp.status.as_str())),
        ColumnDef::new("commitment", "Commitment", |lp: &LimitedPartner| {
            CellValue::from(lp.commitment)
        }),
        ColumnDef::new("kyc_complete", "KYC", |lp: &LimitedPartner| CellValue::from(lp.kyc_complete))
            .sortable(false),
    ]
}

fn filters() -> Vec<FilterDefinition> {
    vec![
        FilterDefinition::component(
            "status",
            "Status",
            vec![
                FilterOption::new("invited", "Invited"),
                FilterOption::new("documents_pending", "Documents pending"),
                FilterOption::new("under_review", "Under review"),
                FilterOption::new("approved", "Approved"),
            ],
        ),
        FilterDefinition::component(
            "lp_type",
            "Type",
            vec![
                FilterOption::new("individual", "Individual"),
                FilterOption::new("entity", "Entity"),
                FilterOption::new("trust", "Trust"),
            ],
        ),
    ]
}

#[derive(Debug)]
pub struct LimitedPartnersScreen {
    state: TableState,
    changes: Receiver<TableChange>,
    table: ServerTable<LimitedPartner>,
    page_size_options: Vec<usize>,
    selected: Option<LimitedPartner>,
}

impl LimitedPartnersScreen {
    pub fn new(
        config: &BusinessConfig,
        fetcher: &Arc<dyn FetchService>,
        session: &SessionHandle,
    ) -> Self {
        let source =
            RestSource::new(config, "limited-partners", Arc::clone(fetcher)).with_session(session.clone());

        let state = TableState::with_page_size(config.default_page_size).unwrap_or_default();
        let (send, changes) = flume::unbounded();
        let table = ServerTable::controlled(
            "limited_partners",
            columns(),
            filters(),
            Arc::new(source),
            config,
            state.clone(),
            move |change: TableChange| {
                if send.send(change).is_err() {
                    log::debug!("Limited partners screen is gone, dropping table change");
                }
            },
        );

        Self {
            state,
            changes,
            table,
            page_size_options: config.page_size_options.clone(),
            selected: None,
        }
    }

    /// The state this screen owns on behalf of the table.
    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn table(&self) -> &ServerTable<LimitedPartner> {
        &self.table
    }

    pub fn selected(&self) -> Option<&LimitedPartner> {
        self.selected.as_ref()
    }

    /// Applies the changes the table asked for and hands the result back.
    fn sync(&mut self) {
        let mut changed = false;
        for change in self.changes.try_iter() {
            change.apply(&mut self.state);
            changed = true;
        }
        if changed {
            self.table.sync_state(self.state.clone());
        }
    }

    /// Applies pending table changes, ticks and renders.
    pub fn show(&mut self, ui: &mut Ui, now: DateTime<Utc>) {
        self.sync();
        self.table.tick(now);

        ui.heading("Limited partners");
        ui.add_space(8.0);

        if let Some(TableEvent::RowClicked(lp)) = data_table(
            ui,
            "limited_partners_table",
            &mut self.table,
            &self.page_size_options,
            now,
        ) {
            log::info!("Opening limited partner {}", lp.id);
            self.selected = Some(lp);
        }

        if let Some(lp) = &self.selected {
            ui.separator();
            ui.label(format!("{} · {}", lp.name, lp.status));
        }
    }

    pub fn repaint_after(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.table.status().is_fetching {
            return Some(fetch_poll_interval());
        }
        self.table.next_deadline(now)
    }
}

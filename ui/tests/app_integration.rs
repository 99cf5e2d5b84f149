//! Full app frames: tab switching and both screens loading.

mod common;

use std::sync::Arc;

use common::{CannedFetcher, test_config};
use egui_kittest::Harness;
use fundesk_business::table::SortSpec;
use fundesk_business::{BusinessConfig, Credentials, FetchService};
use fundesk_ui::state::State;
use fundesk_ui::{FundeskApp, Screen};
use kittest::Queryable;
use serde_json::json;

fn canned_api() -> CannedFetcher {
    CannedFetcher::new()
        .route(
            "/api/tasks",
            200,
            json!({
                "data": [{ "id": "t-1", "title": "Review subscription docs", "state": "Open" }],
                "totalCount": 1
            }),
        )
        .route(
            "/api/limited-partners",
            200,
            json!({
                "data": [{
                    "id": "lp-1",
                    "name": "Harbor Pension Trust",
                    "lpType": "trust",
                    "status": "under_review",
                    "commitment": 2500000.0
                }],
                "totalCount": 1
            }),
        )
}

fn app_harness_with(config: BusinessConfig, fetcher: Arc<dyn FetchService>) -> Harness<'static, FundeskApp> {
    let mut state = State::with_config(config);
    state.follow_clock = false;
    let app = FundeskApp::with_fetcher(state, fetcher);
    Harness::new_eframe(|_| app)
}

fn app_harness() -> Harness<'static, FundeskApp> {
    app_harness_with(test_config(), canned_api().into_service())
}

fn settle(harness: &mut Harness<'_, FundeskApp>) {
    for _ in 0..3 {
        harness.step();
    }
}

#[test]
fn test_tasks_screen_loads_first() {
    let mut harness = app_harness();

    settle(&mut harness);

    assert_eq!(harness.state().screen(), Screen::Tasks);
    harness.get_by_label("Review subscription docs");
}

#[test]
fn test_switching_tabs_loads_limited_partners() {
    let mut harness = app_harness();
    settle(&mut harness);

    harness.get_by_label("Limited partners").click();
    settle(&mut harness);

    assert_eq!(harness.state().screen(), Screen::LimitedPartners);
    harness.get_by_label("Harbor Pension Trust");
    harness.get_by_label("2500000");
}

#[test]
fn test_sorting_round_trips_through_the_owning_screen() {
    let mut harness = app_harness();
    harness.state_mut().set_screen(Screen::LimitedPartners);
    settle(&mut harness);

    harness.get_by_label("Name").click();
    settle(&mut harness);

    assert_eq!(
        harness.state().limited_partners().state().sorting,
        vec![SortSpec::asc("name")]
    );
    harness.get_by_label("Name ⏶");
}

#[test]
fn test_changed_credentials_reach_the_next_request() {
    let fetcher = Arc::new(canned_api());
    let mut config = test_config();
    config.credentials = Some(Credentials::new("old-token"));
    let mut harness = app_harness_with(config, fetcher.clone());
    settle(&mut harness);

    harness
        .state_mut()
        .state_mut()
        .ctx
        .state_mut::<BusinessConfig>()
        .credentials = Some(Credentials::new("new-token"));
    harness.get_by_label("Limited partners").click();
    settle(&mut harness);

    assert_eq!(
        fetcher.authorizations(),
        vec![
            Some("Bearer old-token".to_owned()),
            Some("Bearer new-token".to_owned()),
        ]
    );
}

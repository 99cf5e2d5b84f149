//! Stubs shared by the unit tests.

#![cfg(test)]

use std::sync::Mutex;

use ehttp::{Request, Response};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::FetchService;
use crate::server::{DataSource, FetchCallback, FetchParams, FetchResult, Page};
use crate::table::{CellValue, ColumnDef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub state: String,
}

pub fn task_rows(count: usize) -> Vec<TaskRow> {
    (0..count)
        .map(|i| TaskRow {
            id: format!("task-{i}"),
            title: format!("Task {i}"),
            state: if i % 2 == 0 { "Open" } else { "Completed" }.to_owned(),
        })
        .collect()
}

pub fn task_columns() -> Vec<ColumnDef<TaskRow>> {
    vec![
        ColumnDef::new("title", "Title", |row: &TaskRow| CellValue::from(row.title.as_str())),
        ColumnDef::new("state", "State", |row: &TaskRow| CellValue::from(row.state.as_str())),
        ColumnDef::new("id", "Id", |row: &TaskRow| CellValue::from(row.id.as_str())),
        ColumnDef::new("actions", "", |_: &TaskRow| CellValue::Empty).sortable(false),
    ]
}

/// Records every fetch and leaves it pending until the test answers it.
pub struct StubSource<R> {
    params: Mutex<Vec<FetchParams>>,
    tokens: Mutex<Vec<CancellationToken>>,
    pending: Mutex<Vec<Option<FetchCallback<R>>>>,
}

impl<R> Default for StubSource<R> {
    fn default() -> Self {
        Self {
            params: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
        }
    }
}

impl<R> StubSource<R> {
    pub fn params(&self) -> Vec<FetchParams> {
        self.params.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.params.lock().unwrap().len()
    }

    pub fn is_cancelled(&self, index: usize) -> bool {
        self.tokens.lock().unwrap()[index].is_cancelled()
    }

    pub fn respond(&self, index: usize, result: FetchResult<R>) {
        let on_done = self.pending.lock().unwrap()[index].take();
        if let Some(on_done) = on_done {
            on_done(result);
        }
    }

    pub fn respond_page(&self, index: usize, data: Vec<R>, total_count: usize) {
        self.respond(index, Ok(Page { data, total_count }));
    }
}

impl<R: Send> DataSource<R> for StubSource<R> {
    fn fetch(&self, params: &FetchParams, cancel: CancellationToken, on_done: FetchCallback<R>) {
        self.params.lock().unwrap().push(params.clone());
        self.tokens.lock().unwrap().push(cancel);
        self.pending.lock().unwrap().push(Some(on_done));
    }
}

/// Answers every request with a canned response and records the URLs.
#[derive(Debug, Default)]
pub struct MockFetcher {
    pub response: Option<ehttp::Result<Response>>,
    pub requests: Mutex<Vec<Request>>,
}

impl MockFetcher {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            response: Some(Ok(Response {
                url: "http://localhost:8000/api".to_owned(),
                ok: (200..300).contains(&status),
                status,
                status_text: String::new(),
                headers: Default::default(),
                bytes: body.as_bytes().to_vec(),
            })),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Some(Err(message.to_owned())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }
}

impl FetchService for MockFetcher {
    fn fetch(
        &self,
        request: Request,
        on_done: Box<dyn FnOnce(ehttp::Result<Response>) + Send + 'static>,
    ) {
        self.requests.lock().unwrap().push(request);
        if let Some(response) = &self.response {
            on_done(response.clone());
        }
    }
}

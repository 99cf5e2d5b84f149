use std::fmt::Debug;

use ehttp::{Request, Response, Result};

/// HTTP transport used by the REST data sources.
///
/// `on_done` may be called from another thread, or synchronously before
/// `fetch` returns.
pub trait FetchService: Send + Sync + Debug {
    fn fetch(&self, request: Request, on_done: Box<dyn FnOnce(Result<Response>) + Send + 'static>);
}

/// Sends requests with [`ehttp::fetch`].
#[derive(Debug, Default)]
pub struct EhttpFetcher;

impl FetchService for EhttpFetcher {
    fn fetch(&self, request: Request, on_done: Box<dyn FnOnce(Result<Response>) + Send + 'static>) {
        ehttp::fetch(request, on_done)
    }
}

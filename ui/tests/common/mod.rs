use std::sync::{Arc, Mutex};

use ehttp::{Request, Response};
use fundesk_business::{BusinessConfig, FetchService};

/// Answers every request synchronously with the first route whose path
/// fragment appears in the URL.
#[derive(Debug, Default)]
pub struct CannedFetcher {
    routes: Vec<(String, u16, String)>,
    requests: Mutex<Vec<String>>,
    authorizations: Mutex<Vec<Option<String>>>,
}

impl CannedFetcher {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self::default()
    }

    pub fn route(mut self, fragment: &str, status: u16, body: serde_json::Value) -> Self {
        self.routes
            .push((fragment.to_owned(), status, body.to_string()));
        self
    }

    #[allow(unused)]
    pub fn urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// `Authorization` header of every request, in order.
    #[allow(unused)]
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.authorizations.lock().unwrap().clone()
    }

    pub fn into_service(self) -> Arc<dyn FetchService> {
        Arc::new(self)
    }
}

impl FetchService for CannedFetcher {
    fn fetch(
        &self,
        request: Request,
        on_done: Box<dyn FnOnce(ehttp::Result<Response>) + Send + 'static>,
    ) {
        self.requests.lock().unwrap().push(request.url.clone());
        self.authorizations
            .lock()
            .unwrap()
            .push(request.headers.get("Authorization").map(str::to_owned));
        let route = self
            .routes
            .iter()
            .find(|(fragment, _, _)| request.url.contains(fragment.as_str()));
        let Some((_, status, body)) = route else {
            on_done(Err(format!("no route for {}", request.url)));
            return;
        };
        on_done(Ok(Response {
            url: request.url,
            ok: (200..300).contains(status),
            status: *status,
            status_text: String::new(),
            headers: Default::default(),
            bytes: body.as_bytes().to_vec(),
        }));
    }
}

#[allow(unused)]
pub fn test_config() -> BusinessConfig {
    BusinessConfig::new("http://localhost:8000".to_owned())
}

//! REST implementations of [`DataSource`] and [`UserDirectory`].

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use ustr::Ustr;

use super::{DataSource, FetchCallback, FetchParams, Page};
use crate::filters::{Relation, UserDirectory, UserRef, UserSearchCallback};
use crate::{BusinessConfig, FetchError, FetchService, SessionHandle};

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Turns a finished request into a typed value or a [`FetchError`].
fn parse_response<T: DeserializeOwned>(result: ehttp::Result<ehttp::Response>) -> Result<T, FetchError> {
    let response = result.map_err(|err| FetchError::new(format!("Request failed: {err}")))?;
    if !response.ok {
        let detail = serde_json::from_slice::<ErrorBody>(&response.bytes)
            .ok()
            .and_then(|body| body.detail)
            .map(|detail| match detail {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            });
        return Err(FetchError::with_response(
            format!("API returned status: {}", response.status),
            response.status,
            detail,
        ));
    }
    serde_json::from_slice(&response.bytes)
        .map_err(|err| FetchError::new(format!("Failed to parse response: {err}")))
}

fn query_string(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Pages of `R` from `GET {api}/{endpoint}`.
pub struct RestSource<R> {
    api_url: Ustr,
    endpoint: String,
    fetcher: Arc<dyn FetchService>,
    session: Option<SessionHandle>,
    _row: PhantomData<fn() -> R>,
}

impl<R> std::fmt::Debug for RestSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestSource")
            .field("api_url", &self.api_url)
            .field("endpoint", &self.endpoint)
            .field(
                "session",
                &self
                    .session
                    .as_ref()
                    .and_then(SessionHandle::current)
                    .map(|session| session.generation()),
            )
            .finish_non_exhaustive()
    }
}

impl<R> RestSource<R> {
    /// `endpoint` is relative to the API base, slashes optional.
    pub fn new(config: &BusinessConfig, endpoint: &str, fetcher: Arc<dyn FetchService>) -> Self {
        Self {
            api_url: config.api_url(),
            endpoint: endpoint.trim_matches('/').to_owned(),
            fetcher,
            session: None,
            _row: PhantomData,
        }
    }

    /// Authorizes every request with the handle's session at send time.
    pub fn with_session(mut self, session: SessionHandle) -> Self {
        self.session = Some(session);
        self
    }

    /// `page` is 1-based on the wire. Each filter value is its own
    /// `<filter_id>=<value>` pair; non-default relations are sent as
    /// `<filter_id>__relation=<op>`.
    pub fn request_url(&self, params: &FetchParams) -> String {
        let mut pairs = vec![
            ("page".to_owned(), (params.page_index + 1).to_string()),
            ("page_size".to_owned(), params.page_size.to_string()),
        ];
        if !params.sort_by.is_empty() {
            pairs.push(("sort_by".to_owned(), params.encoded_sort()));
        }
        let search = params.search.trim();
        if !search.is_empty() {
            pairs.push(("search".to_owned(), search.to_owned()));
        }
        for condition in params.conditions() {
            for value in &condition.values {
                pairs.push((condition.filter_id.to_string(), value.to_string()));
            }
            if condition.relation != Relation::Is {
                pairs.push((
                    format!("{}__relation", condition.filter_id),
                    condition.relation.as_str().to_owned(),
                ));
            }
        }
        format!("{}/{}?{}", self.api_url, self.endpoint, query_string(&pairs))
    }
}

impl<R: DeserializeOwned + Send + 'static> DataSource<R> for RestSource<R> {
    fn fetch(&self, params: &FetchParams, cancel: CancellationToken, on_done: FetchCallback<R>) {
        let url = self.request_url(params);
        let mut request = ehttp::Request::get(&url);
        if let Some(session) = &self.session {
            session.authorize(&mut request);
        }
        log::info!("GET {url}");
        self.fetcher.fetch(
            request,
            Box::new(move |result| {
                if cancel.is_cancelled() {
                    log::debug!("Dropping response for cancelled {url}");
                    return;
                }
                on_done(parse_response::<Page<R>>(result));
            }),
        );
    }
}

/// User search backed by `GET {api}/users?search=`.
pub struct RestUserDirectory {
    api_url: Ustr,
    fetcher: Arc<dyn FetchService>,
    session: Option<SessionHandle>,
}

impl RestUserDirectory {
    pub fn new(config: &BusinessConfig, fetcher: Arc<dyn FetchService>) -> Self {
        Self {
            api_url: config.api_url(),
            fetcher,
            session: None,
        }
    }

    /// Authorizes every request with the handle's session at send time.
    pub fn with_session(mut self, session: SessionHandle) -> Self {
        self.session = Some(session);
        self
    }

    /// `GET {api}/users?search=<query>`.
    pub fn request_url(&self, query: &str) -> String {
        format!(
            "{}/users?{}",
            self.api_url,
            query_string(&[("search".to_owned(), query.trim().to_owned())])
        )
    }
}

impl UserDirectory for RestUserDirectory {
    fn search(&self, query: &str, cancel: CancellationToken, on_done: UserSearchCallback) {
        let url = self.request_url(query);
        let mut request = ehttp::Request::get(&url);
        if let Some(session) = &self.session {
            session.authorize(&mut request);
        }
        self.fetcher.fetch(
            request,
            Box::new(move |result| {
                if cancel.is_cancelled() {
                    return;
                }
                on_done(parse_response::<Vec<UserRef>>(result));
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use super::*;
    use crate::filters::FilterClause;
    use crate::session::{Credentials, SessionScope};
    use crate::table::SortSpec;
    use crate::test_utils::{MockFetcher, TaskRow};

    fn config() -> BusinessConfig {
        BusinessConfig::new("http://localhost:8000".to_owned())
    }

    fn params() -> FetchParams {
        FetchParams {
            page_index: 1,
            page_size: 20,
            sort_by: vec![SortSpec::asc("title"), SortSpec::desc("due_date")],
            filters: vec![
                FilterClause::new("state", "Open"),
                FilterClause::new("state", "In Review"),
                FilterClause::new("start_date", "2024-01-01"),
            ],
            relations: BTreeMap::from([
                (Ustr::from("state"), Relation::IsNot),
                (Ustr::from("start_date"), Relation::Is),
            ]),
            search: " fund ".to_owned(),
        }
    }

    #[test]
    fn request_url_encodes_every_parameter() {
        let source: RestSource<TaskRow> =
            RestSource::new(&config(), "/tasks/", Arc::new(MockFetcher::default()));
        assert_eq!(
            source.request_url(&params()),
            "http://localhost:8000/api/tasks?page=2&page_size=20\
             &sort_by=title_asc%2Cdue_date_desc&search=fund\
             &state=Open&state=In%20Review&state__relation=is_not\
             &start_date=2024-01-01"
        );
    }

    fn fetch_tasks(fetcher: MockFetcher) -> (Option<Result<Page<TaskRow>, FetchError>>, Arc<MockFetcher>) {
        let fetcher = Arc::new(fetcher);
        let source: RestSource<TaskRow> = RestSource::new(&config(), "tasks", fetcher.clone());
        let result = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&result);
        source.fetch(
            &params(),
            CancellationToken::new(),
            Box::new(move |res| *sink.lock().unwrap() = Some(res)),
        );
        let result = result.lock().unwrap().take();
        (result, fetcher)
    }

    #[test]
    fn parses_page_body() {
        let body = r#"{"data":[{"id":"t1","title":"Sign LPA","state":"Open"}],"totalCount":41}"#;
        let (result, fetcher) = fetch_tasks(MockFetcher::json(200, body));

        let page = result.unwrap().unwrap();
        assert_eq!(page.total_count, 41);
        assert_eq!(page.data[0].title, "Sign LPA");
        assert_eq!(fetcher.urls().len(), 1);
    }

    #[test]
    fn error_body_detail_is_surfaced() {
        let (result, _) = fetch_tasks(MockFetcher::json(422, r#"{"detail":"Unknown filter 'stage'"}"#));

        let err = result.unwrap().unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.display_message(), "Unknown filter 'stage'");
    }

    #[test]
    fn error_without_detail_falls_back_to_status() {
        let (result, _) = fetch_tasks(MockFetcher::json(502, "<html>Bad gateway</html>"));

        let err = result.unwrap().unwrap_err();
        assert_eq!(err.display_message(), "API returned status: 502");
    }

    #[test]
    fn transport_errors_become_fetch_errors() {
        let (result, _) = fetch_tasks(MockFetcher::failing("connection refused"));

        let err = result.unwrap().unwrap_err();
        assert_eq!(err.status(), None);
        assert!(err.display_message().contains("connection refused"));
    }

    #[test]
    fn cancelled_fetch_never_calls_back() {
        let source: RestSource<TaskRow> =
            RestSource::new(&config(), "tasks", Arc::new(MockFetcher::json(200, "{}")));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let called = Arc::new(Mutex::new(false));
        let sink = Arc::clone(&called);
        source.fetch(&params(), cancel, Box::new(move |_| *sink.lock().unwrap() = true));
        assert!(!*called.lock().unwrap());
    }

    #[test]
    fn session_headers_are_attached() {
        let fetcher = Arc::new(MockFetcher::json(200, r#"{"data":[],"totalCount":0}"#));
        let mut scope = SessionScope::new();
        scope.session(&Credentials::new("secret").with_organization("fund-ii"));
        let source: RestSource<TaskRow> =
            RestSource::new(&config(), "tasks", fetcher.clone()).with_session(scope.handle());

        source.fetch(&params(), CancellationToken::new(), Box::new(|_| {}));

        let requests = fetcher.requests.lock().unwrap();
        assert_eq!(requests[0].headers.get("Authorization"), Some("Bearer secret"));
        assert_eq!(requests[0].headers.get("X-Organization"), Some("fund-ii"));
    }

    #[test]
    fn rebuilt_session_applies_to_existing_source() {
        let fetcher = Arc::new(MockFetcher::json(200, r#"{"data":[],"totalCount":0}"#));
        let mut scope = SessionScope::new();
        scope.session(&Credentials::new("old-token"));
        let source: RestSource<TaskRow> =
            RestSource::new(&config(), "tasks", fetcher.clone()).with_session(scope.handle());

        scope.invalidate();
        source.fetch(&params(), CancellationToken::new(), Box::new(|_| {}));
        scope.session(&Credentials::new("new-token"));
        source.fetch(&params(), CancellationToken::new(), Box::new(|_| {}));

        let requests = fetcher.requests.lock().unwrap();
        assert_eq!(requests[0].headers.get("Authorization"), None);
        assert_eq!(requests[1].headers.get("Authorization"), Some("Bearer new-token"));
    }

    #[test]
    fn user_directory_queries_users_endpoint() {
        let fetcher = Arc::new(MockFetcher::json(
            200,
            r#"[{"id":"u1","name":"Alice Chen","email":"alice@example.com"}]"#,
        ));
        let directory = RestUserDirectory::new(&config(), fetcher.clone());
        let result = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&result);

        directory.search(
            "ali ce",
            CancellationToken::new(),
            Box::new(move |res| *sink.lock().unwrap() = Some(res)),
        );

        assert_eq!(
            fetcher.urls(),
            vec!["http://localhost:8000/api/users?search=ali%20ce".to_owned()]
        );
        let users = result.lock().unwrap().take().unwrap().unwrap();
        assert_eq!(users[0].display_name(), "Alice Chen");
    }
}

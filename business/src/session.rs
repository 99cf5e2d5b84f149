//! Credential-scoped API sessions.
//!
//! A [`SessionScope`] lives in the application's state context and owns the
//! one [`ApiSession`] derived from the current credentials. Asking for a
//! session with different credentials rebuilds it; [`SessionScope::invalidate`]
//! drops it on logout.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use fundesk_states::State;

/// Bearer token plus the organisation the requests act for.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    organization: Option<String>,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            organization: None,
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("organization", &self.organization)
            .finish()
    }
}

/// Request authorisation derived from one set of credentials.
#[derive(Debug)]
pub struct ApiSession {
    credentials: Credentials,
    generation: u64,
}

impl ApiSession {
    /// Increases every time the owning scope rebuilds its session.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this session was built from `credentials`.
    pub fn is_for(&self, credentials: &Credentials) -> bool {
        &self.credentials == credentials
    }

    /// Adds `Authorization: Bearer` and, if set, `X-Organization`.
    pub fn authorize(&self, request: &mut ehttp::Request) {
        request.headers.insert(
            "Authorization",
            format!("Bearer {}", self.credentials.token),
        );
        if let Some(organization) = self.credentials.organization() {
            request.headers.insert("X-Organization", organization);
        }
    }
}

/// Read side of a [`SessionScope`], handed to data sources.
///
/// Resolves the scope's current session when a request is built, so a
/// rebuilt or invalidated session applies to the next request.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    current: Arc<RwLock<Option<Arc<ApiSession>>>>,
}

impl SessionHandle {
    pub fn current(&self) -> Option<Arc<ApiSession>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Adds the current session's headers, if there is a session.
    pub fn authorize(&self, request: &mut ehttp::Request) {
        if let Some(session) = self.current() {
            session.authorize(request);
        }
    }

    fn replace(&self, session: Option<Arc<ApiSession>>) -> Option<Arc<ApiSession>> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, session)
    }
}

/// Owns the one session built from the current credentials.
#[derive(Debug, Default)]
pub struct SessionScope {
    shared: SessionHandle,
    generation: u64,
}

impl SessionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached session for `credentials`, rebuilding it when the
    /// credentials changed.
    pub fn session(&mut self, credentials: &Credentials) -> Arc<ApiSession> {
        if let Some(current) = self.shared.current()
            && current.is_for(credentials)
        {
            return current;
        }

        self.generation += 1;
        log::info!(
            "Building API session generation {} (organization: {:?})",
            self.generation,
            credentials.organization()
        );
        let session = Arc::new(ApiSession {
            credentials: credentials.clone(),
            generation: self.generation,
        });
        self.shared.replace(Some(Arc::clone(&session)));
        session
    }

    /// The session in use, if any.
    pub fn current(&self) -> Option<Arc<ApiSession>> {
        self.shared.current()
    }

    /// A handle that always sees this scope's current session.
    pub fn handle(&self) -> SessionHandle {
        self.shared.clone()
    }

    /// Drops the session; requests go out without credentials until the
    /// next [`Self::session`].
    pub fn invalidate(&mut self) {
        if self.shared.replace(None).is_some() {
            log::info!("API session invalidated");
        }
    }
}

impl State for SessionScope {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

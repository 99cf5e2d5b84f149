//! Business configuration, compiled defaults plus `FUNDESK_*` overrides.

use std::any::Any;

use chrono::Duration;
use fundesk_states::State;
use serde::Deserialize;
use thiserror::Error;
use ustr::Ustr;

use crate::Credentials;

/// Delay before a search box value is sent to the backend.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 400;
/// Rows per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 10;
/// Choices offered by the rows-per-page selector.
pub const PAGE_SIZE_OPTIONS: [usize; 5] = [10, 20, 30, 40, 50];

/// Why a configuration could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("FUNDESK_PAGE_SIZE must be greater than zero")]
    ZeroPageSize,
    #[error("failed to read FUNDESK_* environment: {0}")]
    Env(String),
}

/// Settings shared by every table and data source.
#[derive(Debug, Clone)]
pub struct BusinessConfig {
    pub api_base_url: String,
    pub search_debounce_ms: u64,
    pub default_page_size: usize,
    pub page_size_options: Vec<usize>,
    /// Bearer token and organisation sent with every API request.
    pub credentials: Option<Credentials>,
}

/// Overrides read from the environment on native builds.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    fundesk_api_base_url: Option<String>,
    fundesk_search_debounce_ms: Option<u64>,
    fundesk_page_size: Option<usize>,
    fundesk_api_token: Option<String>,
    fundesk_organization: Option<String>,
}

impl BusinessConfig {
    pub fn new(base_url: String) -> Self {
        Self {
            api_base_url: base_url,
            ..Self::default()
        }
    }

    /// Base of every REST endpoint: `{api_base_url}/api`, or `/api` when the
    /// base URL is empty (same origin on the web).
    pub fn api_url(&self) -> Ustr {
        if self.api_base_url.is_empty() {
            Ustr::from("/api")
        } else {
            Ustr::from(format!("{}/api", self.api_base_url.trim_end_matches('/')).as_str())
        }
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.search_debounce_ms).unwrap_or(i64::MAX))
    }

    /// Defaults overlaid with the `FUNDESK_*` environment: `API_BASE_URL`,
    /// `SEARCH_DEBOUNCE_MS`, `PAGE_SIZE`, `API_TOKEN` and `ORGANIZATION`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_env::from_env().map_err(|err| ConfigError::Env(err.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = raw.fundesk_api_base_url {
            config.api_base_url = url;
        }
        if let Some(ms) = raw.fundesk_search_debounce_ms {
            config.search_debounce_ms = ms;
        }
        if let Some(size) = raw.fundesk_page_size {
            if size == 0 {
                return Err(ConfigError::ZeroPageSize);
            }
            config.default_page_size = size;
            if !config.page_size_options.contains(&size) {
                config.page_size_options.push(size);
                config.page_size_options.sort_unstable();
            }
        }
        if let Some(token) = raw.fundesk_api_token.filter(|token| !token.is_empty()) {
            let credentials = Credentials::new(token);
            config.credentials = Some(match raw.fundesk_organization {
                Some(organization) => credentials.with_organization(organization),
                None => credentials,
            });
        }
        Ok(config)
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            api_base_url: if cfg!(target_arch = "wasm32") {
                String::new()
            } else {
                "http://localhost:8000".to_owned()
            },
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: PAGE_SIZE_OPTIONS.to_vec(),
            credentials: None,
        }
    }
}

impl State for BusinessConfig {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

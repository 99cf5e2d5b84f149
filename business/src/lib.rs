//! Business layer of the fund desk: filters, the headless table engine and
//! the server-driven table that ties them to a REST backend.

mod config;
mod debounce;
mod error;
mod fetch_service;
mod session;
mod test_utils;

pub mod filters;
pub mod server;
pub mod table;

pub use config::{
    BusinessConfig, ConfigError, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_DEBOUNCE_MS, PAGE_SIZE_OPTIONS,
};
pub use debounce::Debounced;
pub use error::{ErrorResponse, FetchError, TableError};
pub use fetch_service::{EhttpFetcher, FetchService};
pub use session::{ApiSession, Credentials, SessionHandle, SessionScope};

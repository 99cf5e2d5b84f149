//! Server-driven tables: fetch parameters, data sources and the REST client.

mod rest;
mod source;
mod table;

pub use rest::{RestSource, RestUserDirectory};
pub use source::{DataSource, FetchCallback, FetchParams, FetchResult, Page};
pub use table::{QueryStatus, ServerTable};

//! The contract between a server table and whatever loads its rows.

use std::collections::BTreeMap;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use ustr::Ustr;

use crate::FetchError;
use crate::filters::{FilterClause, FilterCondition, Relation, group_conditions};
use crate::table::{SortSpec, encode_sorting};

/// Everything a server needs to produce one page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchParams {
    pub page_index: usize,
    pub page_size: usize,
    pub sort_by: Vec<SortSpec>,
    pub filters: Vec<FilterClause>,
    /// Relation per filter id that has clauses.
    pub relations: BTreeMap<Ustr, Relation>,
    pub search: String,
}

impl FetchParams {
    /// Clauses grouped per filter; values of one filter are alternatives.
    pub fn conditions(&self) -> Vec<FilterCondition> {
        group_conditions(&self.filters, &self.relations)
    }

    pub fn encoded_sort(&self) -> String {
        encode_sorting(&self.sort_by)
    }
}

/// One page of rows and the total across all pages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<R> {
    pub data: Vec<R>,
    pub total_count: usize,
}

pub type FetchResult<R> = Result<Page<R>, FetchError>;
/// Called at most once, possibly from another thread.
pub type FetchCallback<R> = Box<dyn FnOnce(FetchResult<R>) + Send + 'static>;

/// Where a server table gets its rows from.
///
/// `on_done` may run on any thread. Implementations should skip it once
/// `cancel` fires; late calls are dropped by the table anyway.
pub trait DataSource<R>: Send + Sync {
    fn fetch(&self, params: &FetchParams, cancel: CancellationToken, on_done: FetchCallback<R>);
}

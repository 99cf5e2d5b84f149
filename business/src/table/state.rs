//! Table state: sorting, pagination, filters, visibility and selection.
//!
//! [`TableChange`] is the unit a controlled table reports to its owner.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::TableError;
use crate::config::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One column of a multi-column sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub column_id: Ustr,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(column_id: &str) -> Self {
        Self {
            column_id: Ustr::from(column_id),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column_id: &str) -> Self {
        Self {
            column_id: Ustr::from(column_id),
            direction: SortDirection::Desc,
        }
    }

    /// `"created_at_desc"` style encoding used on the wire.
    pub fn encoded(&self) -> String {
        format!("{}_{}", self.column_id, self.direction.as_str())
    }

    /// Inverse of [`Self::encoded`]. Field names may themselves contain `_`.
    pub fn parse_encoded(encoded: &str) -> Option<Self> {
        let (column_id, direction) = encoded.rsplit_once('_')?;
        if column_id.is_empty() {
            return None;
        }
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return None,
        };
        Some(Self {
            column_id: Ustr::from(column_id),
            direction,
        })
    }
}

/// Comma-separated `field_asc` / `field_desc` pairs.
pub fn encode_sorting(sorting: &[SortSpec]) -> String {
    sorting
        .iter()
        .map(SortSpec::encoded)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses a comma separated list, skipping malformed entries.
pub fn parse_sorting(encoded: &str) -> Vec<SortSpec> {
    encoded
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let spec = SortSpec::parse_encoded(part);
            if spec.is_none() {
                log::warn!("Ignoring malformed sort '{part}'");
            }
            spec
        })
        .collect()
}

/// Zero-based page and a page size that is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_index: usize,
    page_size: usize,
}

impl Pagination {
    pub fn new(page_index: usize, page_size: usize) -> Result<Self, TableError> {
        if page_size == 0 {
            return Err(TableError::InvalidPageSize);
        }
        Ok(Self {
            page_index,
            page_size,
        })
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Index of the first row of the page.
    pub fn offset(&self) -> usize {
        self.page_index * self.page_size
    }

    pub(crate) fn with_page_index(self, page_index: usize) -> Self {
        Self { page_index, ..self }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column_id: Ustr,
    pub value: String,
}

/// Ids of the selected rows.
pub type RowSelection = BTreeSet<Ustr>;
pub type ColumnVisibility = BTreeMap<Ustr, bool>;

/// Everything the table needs to render a view of its rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableState {
    pub sorting: Vec<SortSpec>,
    pub pagination: Pagination,
    pub column_filters: Vec<ColumnFilter>,
    pub global_filter: String,
    pub visibility: ColumnVisibility,
    pub selection: RowSelection,
}

impl TableState {
    pub fn with_page_size(page_size: usize) -> Result<Self, TableError> {
        Ok(Self {
            pagination: Pagination::new(0, page_size)?,
            ..Self::default()
        })
    }

    pub fn is_visible(&self, column_id: &Ustr) -> bool {
        self.visibility.get(column_id).copied().unwrap_or(true)
    }

    pub fn column_filter(&self, column_id: &str) -> Option<&str> {
        self.column_filters
            .iter()
            .find(|filter| filter.column_id.as_str() == column_id)
            .map(|filter| filter.value.as_str())
    }
}

/// A requested state transition. In controlled mode these go to the owner
/// instead of being applied by the table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableChange {
    Sorting(Vec<SortSpec>),
    Pagination(Pagination),
    ColumnFilters(Vec<ColumnFilter>),
    GlobalFilter(String),
    Visibility(ColumnVisibility),
    Selection(RowSelection),
}

impl TableChange {
    /// Applies the change. A new page index always clears the selection.
    pub fn apply(self, state: &mut TableState) {
        match self {
            Self::Sorting(sorting) => state.sorting = sorting,
            Self::Pagination(pagination) => {
                if pagination.page_index != state.pagination.page_index {
                    state.selection.clear();
                }
                state.pagination = pagination;
            }
            Self::ColumnFilters(filters) => state.column_filters = filters,
            Self::GlobalFilter(filter) => state.global_filter = filter,
            Self::Visibility(visibility) => state.visibility = visibility,
            Self::Selection(selection) => state.selection = selection,
        }
    }
}

/// Owner of controlled table state.
pub trait TableController {
    fn on_change(&mut self, change: TableChange);
}

impl<F: FnMut(TableChange)> TableController for F {
    fn on_change(&mut self, change: TableChange) {
        self(change);
    }
}

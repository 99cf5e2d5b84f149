use ustr::Ustr;

use crate::FetchError;

/// What the data source is doing, as far as the body is concerned.
#[derive(Debug, Clone, Copy)]
pub enum LoadState<'a> {
    Ready,
    Loading,
    Failed(&'a FetchError),
}

/// One processed row ready for rendering.
#[derive(Debug)]
pub struct RowView<'a, R> {
    pub id: Ustr,
    /// Position in the table's data.
    pub index: usize,
    pub row: &'a R,
    pub selected: bool,
}

impl<R> Clone for RowView<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for RowView<'_, R> {}

/// What the body of the table shows.
#[derive(Debug)]
pub enum TableBody<'a, R> {
    Skeleton { rows: usize, columns: usize },
    Error { message: String, colspan: usize },
    Empty { colspan: usize },
    Rows(Vec<RowView<'a, R>>),
}

impl<R> TableBody<'_, R> {
    pub fn is_skeleton(&self) -> bool {
        matches!(self, Self::Skeleton { .. })
    }
}

/// Interactions reported by a rendered table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent<R> {
    RowClicked(R),
}

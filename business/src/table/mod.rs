//! Headless table engine shared by every list screen.

mod body;
mod column;
mod engine;
mod state;

pub use body::{LoadState, RowView, TableBody, TableEvent};
pub use column::{CellValue, ColumnDef};
pub use engine::{DEFAULT_SKELETON_ROWS, Table, TableOptions};
pub use state::{
    ColumnFilter, ColumnVisibility, Pagination, RowSelection, SortDirection, SortSpec, TableChange,
    TableController, TableState, encode_sorting, parse_sorting,
};

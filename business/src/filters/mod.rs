//! Filter definitions, the active filter model and the command-palette picker.

mod clause;
mod definition;
mod model;
mod picker;
mod user_directory;

pub use clause::{END_DATE, FilterClause, FilterCondition, START_DATE, UserRef, group_conditions};
pub use definition::{FilterDefinition, FilterField, FilterOption, Relation, find_definition};
pub use model::{ChipKind, FilterChip, FilterEvent, FilterModel};
pub use picker::{FilterPicker, PickerView};
pub use user_directory::{UserDirectory, UserSearchCallback, UserSearchResult};

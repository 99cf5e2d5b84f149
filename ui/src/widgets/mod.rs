pub mod data_table;

pub use data_table::data_table;

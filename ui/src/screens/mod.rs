//! Screens built on the data table.

mod limited_partners;
mod tasks;

pub use limited_partners::{LimitedPartner, LimitedPartnersScreen};
pub use tasks::{Task, TasksScreen};

use chrono::Duration;

/// How often to poll for a response while a request is in flight.
pub fn fetch_poll_interval() -> Duration {
    Duration::milliseconds(100)
}

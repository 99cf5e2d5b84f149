//! Frame-local state storage shared by the Fundesk business and UI crates.
//!
//! - [`StateCtx`] keeps one value per registered [`State`] type.
//! - [`Time`] is the virtual clock every time-based decision reads from, so
//!   tests can move time forward without sleeping.
//! - [`TaskSlot`] hands out latest-only [`TaskHandle`]s for async work.

mod basic_state;
mod ctx;
mod error;
mod state;
mod task;

pub use basic_state::Time;
pub use ctx::StateCtx;
pub use error::Error;
pub use state::State;
pub use task::{TaskHandle, TaskId, TaskSlot};

//! Latest-only task tickets.
//!
//! A [`TaskSlot`] belongs to one owner (for example one server table). Every
//! call to [`TaskSlot::begin`] cancels the previous in-flight task and hands
//! out a [`TaskHandle`] with a higher generation, so a result that arrives late
//! can be recognised as stale and dropped.
//!
//! ```ignore
//! let mut slot = TaskSlot::new("tasks");
//! let first = slot.begin();
//! let second = slot.begin();
//!
//! assert!(first.is_cancelled());
//! assert!(!slot.is_current(first.id()));
//! assert!(slot.finish(second.id()));
//! ```

use tokio_util::sync::CancellationToken;
use ustr::Ustr;

/// Identifies one spawned task: the owner plus a generation counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    owner: Ustr,
    generation: u64,
}

impl TaskId {
    pub fn new(owner: Ustr, generation: u64) -> Self {
        Self { owner, generation }
    }

    pub fn owner(&self) -> Ustr {
        self.owner
    }

    /// Higher generations were spawned later.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A task id paired with its cooperative cancellation token.
///
/// Cancelling does not abort anything by itself; the work holding the token
/// has to check `is_cancelled()` or await `cancelled()`.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    cancel_token: CancellationToken,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancel_token: CancellationToken) -> Self {
        Self { id, cancel_token }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Token to hand to the task; cancelled when a newer task starts.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// Holds at most one in-flight task for an owner.
///
/// Dropping the slot cancels whatever is still running.
#[derive(Debug)]
pub struct TaskSlot {
    owner: Ustr,
    generation: u64,
    current: Option<TaskHandle>,
}

impl TaskSlot {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: Ustr::from(owner),
            generation: 0,
            current: None,
        }
    }

    pub fn owner(&self) -> Ustr {
        self.owner
    }

    /// Cancels the running task (if any) and starts tracking a new one.
    pub fn begin(&mut self) -> TaskHandle {
        if let Some(previous) = self.current.take() {
            log::debug!(
                "Superseding task {} generation {}",
                self.owner,
                previous.id().generation()
            );
            previous.cancel();
        }
        self.generation += 1;
        let handle = TaskHandle::new(
            TaskId::new(self.owner, self.generation),
            CancellationToken::new(),
        );
        self.current = Some(handle.clone());
        handle
    }

    pub fn is_current(&self, id: TaskId) -> bool {
        self.current.as_ref().is_some_and(|handle| handle.id() == id)
    }

    /// Marks `id` as finished. Returns `false` for stale or unknown ids,
    /// whose results should be discarded.
    pub fn finish(&mut self, id: TaskId) -> bool {
        if self.is_current(id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn in_flight(&self) -> bool {
        self.current.is_some()
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.cancel();
        }
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_new_and_accessors() {
        let task_id = TaskId::new(Ustr::from("tasks"), 42);

        assert_eq!(task_id.owner(), Ustr::from("tasks"));
        assert_eq!(task_id.generation(), 42);
    }

    #[test]
    fn task_id_equality() {
        let id1 = TaskId::new(Ustr::from("tasks"), 1);
        let id2 = TaskId::new(Ustr::from("tasks"), 1);
        let id3 = TaskId::new(Ustr::from("tasks"), 2);
        let id4 = TaskId::new(Ustr::from("lps"), 1);

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_ne!(id1, id4);
    }

    #[test]
    fn task_handle_clone_shares_token() {
        let handle1 = TaskHandle::new(TaskId::new(Ustr::from("tasks"), 1), CancellationToken::new());
        let handle2 = handle1.clone();
        let token = handle1.cancellation_token();

        handle1.cancel();

        assert!(handle2.is_cancelled());
        assert!(token.is_cancelled());
    }

    #[test]
    fn begin_supersedes_previous_task() {
        let mut slot = TaskSlot::new("tasks");
        let first = slot.begin();
        let second = slot.begin();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(second.id().generation() > first.id().generation());
        assert!(!slot.is_current(first.id()));
        assert!(slot.is_current(second.id()));
    }

    #[test]
    fn finish_accepts_only_current_task() {
        let mut slot = TaskSlot::new("tasks");
        let first = slot.begin();
        let second = slot.begin();

        assert!(!slot.finish(first.id()));
        assert!(slot.in_flight());
        assert!(slot.finish(second.id()));
        assert!(!slot.in_flight());
        assert!(!slot.finish(second.id()));
    }

    #[test]
    fn dropping_slot_cancels_in_flight_task() {
        let handle = {
            let mut slot = TaskSlot::new("tasks");
            slot.begin()
        };

        assert!(handle.is_cancelled());
    }
}

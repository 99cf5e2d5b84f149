use tokio_util::sync::CancellationToken;

use super::UserRef;
use crate::FetchError;

pub type UserSearchResult = Result<Vec<UserRef>, FetchError>;
/// Called at most once, possibly from another thread.
pub type UserSearchCallback = Box<dyn FnOnce(UserSearchResult) + Send + 'static>;

/// Async user lookup behind the user-select filter.
pub trait UserDirectory: Send + Sync {
    fn search(&self, query: &str, cancel: CancellationToken, on_done: UserSearchCallback);
}

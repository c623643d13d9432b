//! # Task Tracker
//!
//! Registry of in-flight download tasks, grouped so that every task belonging
//! to one article can be cancelled at once. Completion callbacks untrack their
//! task from arbitrary worker threads, so the map is guarded by a mutex.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Something that can be asked to stop
pub trait Cancel: Send + Sync {
    fn cancel(&self);
}

impl Cancel for CancellationToken {
    fn cancel(&self) {
        CancellationToken::cancel(self);
    }
}

/// Identifies one tracked task within its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UntrackToken(Uuid);

impl UntrackToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for UntrackToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct IdentifiedTask<T> {
    token: UntrackToken,
    task: T,
}

pub struct TaskTracker<T: Cancel = CancellationToken> {
    groups: Mutex<HashMap<String, Vec<IdentifiedTask<T>>>>,
}

impl<T: Cancel> TaskTracker<T> {
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(HashMap::new()),
        }
    }

    /// Track `task` under `group`, returning the token that untracks it
    pub fn track(&self, group: &str, task: T) -> UntrackToken {
        let token = UntrackToken::new();
        self.groups
            .lock()
            .entry(group.to_string())
            .or_default()
            .push(IdentifiedTask { token, task });
        token
    }

    /// Stop tracking one task. Unknown tokens are ignored, which covers
    /// completions that arrive after the group was cancelled.
    pub fn untrack(&self, group: &str, token: UntrackToken) {
        let mut groups = self.groups.lock();
        let Some(tasks) = groups.get_mut(group) else {
            return;
        };
        if let Some(index) = tasks.iter().position(|t| t.token == token) {
            tasks.remove(index);
        }
        if tasks.is_empty() {
            groups.remove(group);
        }
    }

    /// Cancel every task tracked under `group` and forget the group.
    /// Returns the number of tasks cancelled.
    pub fn cancel_all(&self, group: &str) -> usize {
        let tasks = self.groups.lock().remove(group).unwrap_or_default();
        // Cancel outside the lock; handles may run arbitrary code
        for tracked in &tasks {
            tracked.task.cancel();
        }
        if !tasks.is_empty() {
            debug!(group, count = tasks.len(), "Cancelled tracked tasks");
        }
        tasks.len()
    }

    pub fn task_count(&self, group: &str) -> usize {
        self.groups.lock().get(group).map_or(0, Vec::len)
    }

    pub fn group_count(&self) -> usize {
        self.groups.lock().len()
    }

    pub fn is_tracking(&self, group: &str) -> bool {
        self.groups.lock().contains_key(group)
    }
}

impl<T: Cancel> Default for TaskTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

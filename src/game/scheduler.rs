//! # Presentation Scheduler
//!
//! Deferred, cancellable clean-up actions for time-based effects: hit flashes,
//! damage numbers, blasts, arrow steps and the input lock release.
//!
//! Entries are polled once per frame with the session clock. Nothing here
//! touches combat state directly; the session applies each due action.

use crate::game::EntityId;
use std::time::Duration;

/// Handle of a scheduled entry, used to cancel it.
pub type TaskId = u64;

/// Work to do once an entry is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledAction {
    ClearEnemyFlash(EntityId),
    ClearPlayerFlash,
    ExpireDamageNumber(EntityId),
    ClearBlast(EntityId),
    /// Move the arrow in flight one tile
    AdvanceProjectile,
    /// End the non-interactive window after a screen transition
    ReleaseInput,
}

#[derive(Debug, Clone)]
struct Entry {
    id: TaskId,
    due: Duration,
    action: ScheduledAction,
}

/// A list of `(due time, action)` entries.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
    next_id: TaskId,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules an action for the clock time `due`.
    pub fn schedule(&mut self, due: Duration, action: ScheduledAction) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry { id, due, action });
        id
    }

    /// Removes and returns every action due at `now`, earliest first.
    ///
    /// Entries due at the same time keep their scheduling order.
    pub fn poll(&mut self, now: Duration) -> Vec<ScheduledAction> {
        let (mut due, pending): (Vec<Entry>, Vec<Entry>) =
            self.entries.drain(..).partition(|entry| entry.due <= now);
        self.entries = pending;
        due.sort_by_key(|entry| (entry.due, entry.id));
        due.into_iter().map(|entry| entry.action).collect()
    }

    /// Cancels one entry. Returns false if it already ran or never existed.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Cancels every entry whose action matches.
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&ScheduledAction) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !predicate(&entry.action));
        before - self.entries.len()
    }

    pub fn has_pending(&self, action: ScheduledAction) -> bool {
        self.entries.iter().any(|entry| entry.action == action)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

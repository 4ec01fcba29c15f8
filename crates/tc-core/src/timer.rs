//! Timers
//!
//! A timer queue on a virtual clock: nothing fires until the owner
//! advances time. `SmartTimeout` is a debounce handle that cancels its
//! pending task whenever it is armed again.

use std::time::Duration;

/// Handle of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Entry<T> {
    handle: TimerHandle,
    due: Duration,
    item: T,
}

/// Scheduled items ordered by due time, then scheduling order
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: Duration,
    next_handle: u64,
    entries: Vec<Entry<T>>,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_handle: 1,
            entries: Vec::new(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, item: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(Entry {
            handle,
            due: self.now + delay,
            item,
        });
        handle
    }

    /// Remove a pending task; `None` if it already fired or was cancelled
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let pos = self.entries.iter().position(|e| e.handle == handle)?;
        Some(self.entries.remove(pos).item)
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pop the earliest task due at or before `deadline`, moving the clock
    /// to its due time
    pub fn pop_due(&mut self, deadline: Duration) -> Option<T> {
        let pos = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= deadline)
            .min_by_key(|(_, e)| (e.due, e.handle))
            .map(|(i, _)| i)?;
        let entry = self.entries.remove(pos);
        self.now = self.now.max(entry.due);
        Some(entry.item)
    }

    /// Move the clock forward, returning every task that came due
    pub fn advance(&mut self, by: Duration) -> Vec<T> {
        let deadline = self.now + by;
        let mut fired = Vec::new();
        while let Some(item) = self.pop_due(deadline) {
            fired.push(item);
        }
        self.now = deadline;
        fired
    }

    /// Move the clock to `deadline` without firing anything
    pub fn set_now(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Timeout that resets itself when armed again before it fires
#[derive(Debug, Default, Clone)]
pub struct SmartTimeout {
    handle: Option<TimerHandle>,
}

impl SmartTimeout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset / start the timeout
    pub fn set<T>(&mut self, queue: &mut TimerQueue<T>, delay: Duration, item: T) -> TimerHandle {
        self.cancel(queue);
        let handle = queue.schedule(delay, item);
        self.handle = Some(handle);
        handle
    }

    /// Cancel the pending task, if any
    pub fn cancel<T>(&mut self, queue: &mut TimerQueue<T>) -> Option<T> {
        queue.cancel(self.handle.take()?)
    }

    pub fn is_armed<T>(&self, queue: &TimerQueue<T>) -> bool {
        self.handle.is_some_and(|h| queue.is_pending(h))
    }
}

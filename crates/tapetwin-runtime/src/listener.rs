#![forbid(unsafe_code)]

//! Listener bookkeeping for feed implementations.
//!
//! [`ListenerRegistry`] issues [`ListenerId`]s, stores callbacks per
//! [`Topic`], and dispatches events. It is re-entrant: a listener may add or
//! remove listeners (itself included) while being dispatched.
//!
//! # Dispatch rules
//!
//! 1. Only listeners registered before dispatch starts receive the event.
//! 2. A listener removed during dispatch receives nothing further, even if it
//!    had not been reached yet.
//! 3. A listener is never re-entered: a nested dispatch skips callbacks that
//!    are already running further up the stack.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;

use crate::feed::{FeedError, FeedEvent, FeedResult, Listener, ListenerId, Topic};

struct Entry {
    topic: Topic,
    /// `None` while the callback is running.
    callback: Option<Listener>,
}

/// Registered listeners of one feed.
pub struct ListenerRegistry {
    entries: RefCell<BTreeMap<ListenerId, Entry>>,
    next_id: Cell<ListenerId>,
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
        }
    }

    /// Register `listener` for `topic`.
    pub fn add(&self, topic: Topic, listener: Listener) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        self.entries.borrow_mut().insert(
            id,
            Entry {
                topic,
                callback: Some(listener),
            },
        );
        tracing::debug!(listener_id = id, ?topic, "listener added");
        crate::debug_trace!("listener added: id={}, topic={:?}", id, topic);
        id
    }

    /// Remove a listener.
    ///
    /// Fails with [`FeedError::UnknownListener`] for ids that were never
    /// issued or were already removed.
    pub fn remove(&self, id: ListenerId) -> FeedResult<()> {
        let removed = self.entries.borrow_mut().remove(&id);
        match removed {
            Some(entry) => {
                tracing::debug!(listener_id = id, topic = ?entry.topic, "listener removed");
                crate::debug_trace!("listener removed: id={}", id);
                Ok(())
            }
            None => Err(FeedError::UnknownListener(id)),
        }
    }

    /// Deliver `event` to every listener of its topic. Returns the number of
    /// callbacks invoked.
    pub fn dispatch(&self, event: &FeedEvent) -> usize {
        let topic = event.topic();
        let ids: Vec<ListenerId> = self
            .entries
            .borrow()
            .iter()
            .filter(|(_, entry)| entry.topic == topic)
            .map(|(id, _)| *id)
            .collect();

        let mut delivered = 0;
        for id in ids {
            let taken = self
                .entries
                .borrow_mut()
                .get_mut(&id)
                .and_then(|entry| entry.callback.take());
            let Some(mut callback) = taken else {
                continue;
            };
            callback(event);
            delivered += 1;
            if let Some(entry) = self.entries.borrow_mut().get_mut(&id) {
                entry.callback = Some(callback);
            }
        }

        tracing::trace!(?topic, delivered, "event dispatched");
        crate::debug_trace!("dispatched {:?} to {} listeners", topic, delivered);
        delivered
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of listeners registered for `topic`.
    #[must_use]
    pub fn count(&self, topic: Topic) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|entry| entry.topic == topic)
            .count()
    }

    #[must_use]
    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.borrow().contains_key(&id)
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .field("next_id", &self.next_id.get())
            .finish()
    }
}

#![forbid(unsafe_code)]

//! Subscription activation scopes.
//!
//! A presentation unit subscribes when it is activated and must unsubscribe
//! every listener when it is deactivated, whatever the exit path. A
//! [`SubscriptionScope`] owns the listener ids it acquired and releases all of
//! them on [`release`](SubscriptionScope::release) or on drop, so an early
//! return or a panic unwinding through the owner cannot leak listeners.
//!
//! Teardown has no ordering dependency: each id is removed independently and
//! a failure on one does not stop the others.

use std::fmt;
use std::rc::Rc;

use tapetwin_core::ExecutionSnapshot;

use crate::feed::{FeedError, FeedEvent, FeedResult, Listener, ListenerId, StateFeed, Topic};

/// Listener ids acquired against one feed, released together.
pub struct SubscriptionScope<F: StateFeed + ?Sized> {
    feed: Rc<F>,
    handles: Vec<ListenerId>,
}

impl<F: StateFeed + ?Sized> SubscriptionScope<F> {
    #[must_use]
    pub fn new(feed: Rc<F>) -> Self {
        Self {
            feed,
            handles: Vec::new(),
        }
    }

    /// The feed this scope subscribes against.
    #[must_use]
    pub fn feed(&self) -> &Rc<F> {
        &self.feed
    }

    /// Register a listener and keep its id for release.
    pub fn subscribe(&mut self, topic: Topic, listener: Listener) -> ListenerId {
        let id = self.feed.add_listener(topic, listener);
        self.handles.push(id);
        id
    }

    /// Register a snapshot listener.
    pub fn on_state_change(
        &mut self,
        mut f: impl FnMut(&Rc<ExecutionSnapshot>) + 'static,
    ) -> ListenerId {
        self.subscribe(
            Topic::State,
            Box::new(move |event: &FeedEvent| {
                if let FeedEvent::State(snapshot) = event {
                    f(snapshot);
                }
            }),
        )
    }

    /// Register a program-text listener.
    pub fn on_program_change(&mut self, mut f: impl FnMut(&Rc<str>) + 'static) -> ListenerId {
        self.subscribe(
            Topic::Program,
            Box::new(move |event: &FeedEvent| {
                if let FeedEvent::Program(text) = event {
                    f(text);
                }
            }),
        )
    }

    /// Register an input-text listener.
    pub fn on_input_change(&mut self, mut f: impl FnMut(&Rc<str>) + 'static) -> ListenerId {
        self.subscribe(
            Topic::Input,
            Box::new(move |event: &FeedEvent| {
                if let FeedEvent::Input(text) = event {
                    f(text);
                }
            }),
        )
    }

    /// Release one listener held by this scope.
    ///
    /// Ids this scope does not hold (never acquired, or already released) are
    /// reported as [`FeedError::UnknownListener`] without touching the feed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> FeedResult<()> {
        let Some(pos) = self.handles.iter().position(|&h| h == id) else {
            tracing::warn!(listener_id = id, "unsubscribe of listener not held by scope");
            return Err(FeedError::UnknownListener(id));
        };
        self.handles.swap_remove(pos);
        self.feed.remove_listener(id)
    }

    /// Release every held listener. Returns the failures, if any.
    ///
    /// The scope is empty afterwards even when some removals fail; a failed
    /// id is one the feed no longer knows, so there is nothing left to leak.
    pub fn release(&mut self) -> Vec<FeedError> {
        let mut errors = Vec::new();
        let count = self.handles.len();
        for id in self.handles.drain(..) {
            if let Err(err) = self.feed.remove_listener(id) {
                tracing::warn!(listener_id = id, error = %err, "listener teardown failed");
                errors.push(err);
            }
        }
        if count > 0 {
            tracing::debug!(released = count, failed = errors.len(), "subscription scope released");
            crate::debug_trace!("scope released: count={}, failed={}", count, errors.len());
        }
        errors
    }

    /// Ids currently held.
    #[must_use]
    pub fn handles(&self) -> &[ListenerId] {
        &self.handles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl<F: StateFeed + ?Sized> Drop for SubscriptionScope<F> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

impl<F: StateFeed + ?Sized> fmt::Debug for SubscriptionScope<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionScope")
            .field("handles", &self.handles)
            .finish()
    }
}

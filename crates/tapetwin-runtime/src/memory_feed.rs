#![forbid(unsafe_code)]

//! Host-driven in-memory feed.
//!
//! [`MemoryFeed`] holds the latest snapshot, program text, and input text and
//! notifies listeners whenever the host replaces one of them. It is the feed
//! used by tests, by WASM bridges where JavaScript owns the transport, and by
//! [`Poller`](crate::poll::Poller) for pull-based sources.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tapetwin_core::{DecodeError, ExecutionSnapshot, decode_snapshot};

use crate::feed::{FeedEvent, FeedResult, Listener, ListenerId, StateFeed, Topic};
use crate::listener::ListenerRegistry;

/// In-memory feed whose values are pushed by the host.
pub struct MemoryFeed {
    state: RefCell<Option<Rc<ExecutionSnapshot>>>,
    program: RefCell<Option<Rc<str>>>,
    input: RefCell<Option<Rc<str>>>,
    listeners: ListenerRegistry,
    dense_program: bool,
}

impl Default for MemoryFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFeed {
    /// A feed that delivers full program text (dense variant).
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RefCell::new(None),
            program: RefCell::new(None),
            input: RefCell::new(None),
            listeners: ListenerRegistry::new(),
            dense_program: true,
        }
    }

    /// A feed whose snapshots carry program fragments (sparse variant).
    #[must_use]
    pub fn sparse() -> Self {
        Self {
            dense_program: false,
            ..Self::new()
        }
    }

    /// Replace the held snapshot and notify state listeners.
    pub fn push_state(&self, snapshot: ExecutionSnapshot) -> usize {
        let snapshot = Rc::new(snapshot);
        *self.state.borrow_mut() = Some(snapshot.clone());
        self.listeners.dispatch(&FeedEvent::State(snapshot))
    }

    /// Decode a JSON snapshot document and push it.
    ///
    /// On a decode error the held snapshot is left unchanged.
    pub fn push_state_json(&self, json: &str) -> Result<usize, DecodeError> {
        let snapshot = decode_snapshot(json)?;
        Ok(self.push_state(snapshot))
    }

    /// Replace the program text and notify program listeners.
    pub fn set_program(&self, text: impl Into<Rc<str>>) -> usize {
        let text = text.into();
        *self.program.borrow_mut() = Some(text.clone());
        self.listeners.dispatch(&FeedEvent::Program(text))
    }

    /// Replace the input text and notify input listeners.
    pub fn set_input(&self, text: impl Into<Rc<str>>) -> usize {
        let text = text.into();
        *self.input.borrow_mut() = Some(text.clone());
        self.listeners.dispatch(&FeedEvent::Input(text))
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of listeners registered for `topic`.
    #[must_use]
    pub fn listener_count_for(&self, topic: Topic) -> usize {
        self.listeners.count(topic)
    }
}

impl StateFeed for MemoryFeed {
    fn current_state(&self) -> Option<Rc<ExecutionSnapshot>> {
        self.state.borrow().clone()
    }

    fn program_text(&self) -> Option<Rc<str>> {
        self.program.borrow().clone()
    }

    fn input_text(&self) -> Option<Rc<str>> {
        self.input.borrow().clone()
    }

    fn delivers_program_text(&self) -> bool {
        self.dense_program
    }

    fn add_listener(&self, topic: Topic, listener: Listener) -> ListenerId {
        self.listeners.add(topic, listener)
    }

    fn remove_listener(&self, id: ListenerId) -> FeedResult<()> {
        self.listeners.remove(id)
    }
}

impl fmt::Debug for MemoryFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFeed")
            .field("has_state", &self.state.borrow().is_some())
            .field("has_program", &self.program.borrow().is_some())
            .field("has_input", &self.input.borrow().is_some())
            .field("listeners", &self.listeners.len())
            .field("dense_program", &self.dense_program)
            .finish()
    }
}

#![forbid(unsafe_code)]

//! Remote execution-state feed.
//!
//! [`StateFeed`] is the consumed interface of the external collaborator that
//! reports VM state. Transport (push, poll, websocket, ...) is the
//! implementation's business; consumers only read the latest values and
//! register listeners.
//!
//! Listeners are keyed by a [`ListenerId`]. Every successful registration
//! yields exactly one id, and removing it stops further deliveries to that
//! listener, including deliveries already in flight on the feed.

use std::fmt;
use std::rc::Rc;

use tapetwin_core::{DecodeError, ExecutionSnapshot};

/// Handle returned by listener registration.
pub type ListenerId = u64;

/// Which stream of values a listener follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    State,
    Program,
    Input,
}

/// A value delivered to listeners. Each replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    State(Rc<ExecutionSnapshot>),
    Program(Rc<str>),
    Input(Rc<str>),
}

impl FeedEvent {
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            Self::State(_) => Topic::State,
            Self::Program(_) => Topic::Program,
            Self::Input(_) => Topic::Input,
        }
    }
}

/// Boxed listener callback.
pub type Listener = Box<dyn FnMut(&FeedEvent)>;

/// Errors reported by feeds.
#[derive(Debug)]
pub enum FeedError {
    /// The id was never issued by this feed or has already been removed.
    UnknownListener(ListenerId),
    /// A fetch against the remote side failed.
    Transport(String),
    /// A fetched document could not be decoded.
    Decode(DecodeError),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownListener(id) => write!(f, "unknown listener {id}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Decode(e) => write!(f, "decode error: {e}"),
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::UnknownListener(_) | Self::Transport(_) => None,
        }
    }
}

impl From<DecodeError> for FeedError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// The remote state feed, as seen by a consumer.
pub trait StateFeed {
    /// Latest snapshot, or `None` before the first one arrives.
    fn current_state(&self) -> Option<Rc<ExecutionSnapshot>>;

    /// Latest full program text (dense variant only).
    fn program_text(&self) -> Option<Rc<str>>;

    /// Latest input text.
    fn input_text(&self) -> Option<Rc<str>>;

    /// Whether this feed delivers full program text on [`Topic::Program`].
    ///
    /// Sparse feeds embed a program fragment in each snapshot instead.
    fn delivers_program_text(&self) -> bool {
        true
    }

    /// Register a listener for one topic.
    fn add_listener(&self, topic: Topic, listener: Listener) -> ListenerId;

    /// Remove a listener. Removing an unknown or already removed id is an
    /// error but leaves the feed untouched.
    fn remove_listener(&self, id: ListenerId) -> FeedResult<()>;

    /// Register a snapshot listener.
    fn on_state_change(&self, mut f: impl FnMut(&Rc<ExecutionSnapshot>) + 'static) -> ListenerId
    where
        Self: Sized,
    {
        self.add_listener(
            Topic::State,
            Box::new(move |event: &FeedEvent| {
                if let FeedEvent::State(snapshot) = event {
                    f(snapshot);
                }
            }),
        )
    }

    /// Register a program-text listener.
    fn on_program_change(&self, mut f: impl FnMut(&Rc<str>) + 'static) -> ListenerId
    where
        Self: Sized,
    {
        self.add_listener(
            Topic::Program,
            Box::new(move |event: &FeedEvent| {
                if let FeedEvent::Program(text) = event {
                    f(text);
                }
            }),
        )
    }

    /// Register an input-text listener.
    fn on_input_change(&self, mut f: impl FnMut(&Rc<str>) + 'static) -> ListenerId
    where
        Self: Sized,
    {
        self.add_listener(
            Topic::Input,
            Box::new(move |event: &FeedEvent| {
                if let FeedEvent::Input(text) = event {
                    f(text);
                }
            }),
        )
    }
}

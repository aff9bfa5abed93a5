#![forbid(unsafe_code)]

//! Tape Twin Runtime
//!
//! The event-driven half of the twin. It holds no global state: every
//! consumer is handed an explicit feed reference.
//!
//! # Key Components
//!
//! - [`StateFeed`] - Trait for the remote execution-state feed
//! - [`ListenerRegistry`] - Listener bookkeeping shared by feed implementations
//! - [`MemoryFeed`] - Host-driven in-memory feed (tests, WASM bridges, pollers)
//! - [`SubscriptionScope`] - Acquires listeners and releases all of them on drop
//! - [`TwinPanel`] - Presentation unit that recomputes the view model per delivery
//! - [`Poller`] - Host-driven pull loop that feeds a [`MemoryFeed`]
//!
//! # Concurrency
//!
//! Single-threaded and cooperative. Deliveries are synchronous: a push on the
//! feed runs every matching listener to completion before returning, and each
//! listener recomputes its derivations without suspension points. Types here
//! use `Rc`/`RefCell` and are deliberately `!Send`.

pub mod debug_trace;
pub mod feed;
pub mod listener;
pub mod memory_feed;
pub mod panel;
pub mod poll;
pub mod scope;

pub use feed::{FeedError, FeedEvent, FeedResult, Listener, ListenerId, StateFeed, Topic};
pub use listener::ListenerRegistry;
pub use memory_feed::MemoryFeed;
pub use panel::TwinPanel;
pub use poll::{PollClock, PollOutcome, PollStats, Poller, StateSource};
pub use scope::SubscriptionScope;

pub use tapetwin_core::{TwinConfig, ViewModel};

#![forbid(unsafe_code)]

//! Twin configuration.
//!
//! Defaults match the reference dashboard: 7-cell program and memory windows
//! (three cells either side), a circular tape of 0x8000 cells delivered
//! starting three cells before the head, and six stack rows.
//!
//! # Environment
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `TAPETWIN_WINDOW_BEHIND` | cells before the focal index | `3` |
//! | `TAPETWIN_WINDOW_AHEAD` | cells after the focal index | `3` |
//! | `TAPETWIN_STACK_LIMIT` | stack rows, marker included | `6` |
//! | `TAPETWIN_STACK_ORDER` | `top-first` or `top-last` | `top-first` |
//! | `TAPETWIN_TAPE_SIZE` | circular tape size, `0` for linear | `32768` |
//! | `TAPETWIN_TAPE_LEAD` | cells before the head where the feed's tape slice starts | `3` |
//! | `TAPETWIN_POLL_MS` | poll interval in milliseconds | `100` |
//!
//! Malformed values fall back to the default for that field.

use std::env;
use std::time::Duration;

use crate::stack::StackOrder;
use crate::window::{AddressSpace, WindowSpan};

/// Configuration for view-model derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwinConfig {
    /// Span of the program window around the program counter.
    pub program_span: WindowSpan,
    /// Span of the memory window around the tape head.
    pub memory_span: WindowSpan,
    /// Topology of the memory address space.
    pub tape_space: AddressSpace,
    /// How many cells before the head the feed's tape slice starts.
    pub tape_lead: usize,
    /// Maximum stack rows, truncation marker included.
    pub stack_limit: usize,
    pub stack_order: StackOrder,
    /// Interval between polls of a pull-based state source.
    pub poll_interval: Duration,
}

impl Default for TwinConfig {
    fn default() -> Self {
        Self {
            program_span: WindowSpan::centered(3),
            memory_span: WindowSpan::centered(3),
            tape_space: AddressSpace::tape(),
            tape_lead: 3,
            stack_limit: 6,
            stack_order: StackOrder::TopFirst,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl TwinConfig {
    /// Read configuration from `TAPETWIN_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(behind) = number("TAPETWIN_WINDOW_BEHIND") {
            let behind = usize::try_from(behind).unwrap_or(config.program_span.behind);
            config.program_span.behind = behind;
            config.memory_span.behind = behind;
        }
        if let Some(ahead) = number("TAPETWIN_WINDOW_AHEAD") {
            let ahead = usize::try_from(ahead).unwrap_or(config.program_span.ahead);
            config.program_span.ahead = ahead;
            config.memory_span.ahead = ahead;
        }
        if let Some(limit) = number("TAPETWIN_STACK_LIMIT") {
            config.stack_limit = usize::try_from(limit).unwrap_or(config.stack_limit);
        }
        if let Some(order) = lookup("TAPETWIN_STACK_ORDER").and_then(|v| StackOrder::parse(v.trim()))
        {
            config.stack_order = order;
        }
        if let Some(size) = number("TAPETWIN_TAPE_SIZE") {
            config.tape_space = AddressSpace::circular(size).unwrap_or(AddressSpace::Linear);
        }
        if let Some(lead) = number("TAPETWIN_TAPE_LEAD") {
            config.tape_lead = usize::try_from(lead).unwrap_or(config.tape_lead);
        }
        if let Some(ms) = number("TAPETWIN_POLL_MS") {
            config.poll_interval = Duration::from_millis(ms);
        }
        config
    }

    /// Use `span` for both program and memory windows.
    ///
    /// The tape lead is a property of the feed and is left unchanged.
    #[must_use]
    pub fn with_span(mut self, span: WindowSpan) -> Self {
        self.program_span = span;
        self.memory_span = span;
        self
    }

    #[must_use]
    pub fn with_tape_space(mut self, space: AddressSpace) -> Self {
        self.tape_space = space;
        self
    }

    #[must_use]
    pub fn with_tape_lead(mut self, lead: usize) -> Self {
        self.tape_lead = lead;
        self
    }

    #[must_use]
    pub fn with_stack_order(mut self, order: StackOrder) -> Self {
        self.stack_order = order;
        self
    }

    #[must_use]
    pub fn with_stack_limit(mut self, limit: usize) -> Self {
        self.stack_limit = limit;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#![forbid(unsafe_code)]

//! Top-of-stack projection.
//!
//! The stack is unbounded, the panel is not. [`StackView::project`] keeps at
//! most `limit` rows, top first; if entries are cut off, the last row becomes
//! a [`StackRow::Truncated`] marker.

use std::fmt;

use serde::Serialize;

/// Which end of the raw stack sequence is the top.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StackOrder {
    /// Top of stack at index 0; rows follow the feed's order.
    #[default]
    TopFirst,
    /// Top of stack at the end (push appends).
    TopLast,
}

impl StackOrder {
    /// Parse `top-first` / `top-last`, case-insensitive.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("top-first") {
            Some(Self::TopFirst)
        } else if value.eq_ignore_ascii_case("top-last") {
            Some(Self::TopLast)
        } else {
            None
        }
    }
}

/// One displayed stack row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StackRow {
    Value(u64),
    /// More entries exist below this row.
    Truncated,
}

impl fmt::Display for StackRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "0x{v:04x}"),
            Self::Truncated => f.write_str("..."),
        }
    }
}

/// Bounded rows of the stack in the configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct StackView {
    rows: Vec<StackRow>,
    depth: usize,
}

impl StackView {
    #[must_use]
    pub fn project(stack: &[u64], order: StackOrder, limit: usize) -> Self {
        let depth = stack.len();
        let truncated = depth > limit;
        let shown = if truncated {
            limit.saturating_sub(1)
        } else {
            depth
        };
        let mut rows: Vec<StackRow> = match order {
            StackOrder::TopFirst => stack.iter().take(shown).map(|&v| StackRow::Value(v)).collect(),
            StackOrder::TopLast => stack
                .iter()
                .rev()
                .take(shown)
                .map(|&v| StackRow::Value(v))
                .collect(),
        };
        if truncated && limit > 0 {
            rows.push(StackRow::Truncated);
        }
        Self { rows, depth }
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[StackRow] {
        &self.rows
    }

    /// Full stack depth, including rows not shown.
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.rows.last() == Some(&StackRow::Truncated)
    }
}

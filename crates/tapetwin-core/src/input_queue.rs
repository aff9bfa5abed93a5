#![forbid(unsafe_code)]

//! Remaining input queue.
//!
//! The VM consumes its input text front to back and reports how many
//! characters it has read (`ic`). The queue shown to the user is the suffix
//! that has not been read yet.

use serde::Serialize;

/// Characters of the input text not yet consumed by the VM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct InputQueue {
    chars: Vec<char>,
}

impl InputQueue {
    /// Project the queue from the full input text and a consumed count.
    ///
    /// An unknown count yields the whole text; a count at or past the end
    /// yields an empty queue.
    #[must_use]
    pub fn project(input: &str, consumed: Option<usize>) -> Self {
        Self {
            chars: project_queue(input, consumed),
        }
    }

    #[inline]
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The queue as a string.
    #[must_use]
    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }

    /// Whether replacing `current` with `proposed` keeps the consumed prefix.
    ///
    /// The VM rejects input edits that change characters it has already read,
    /// so a dashboard can flag such an edit before sending it.
    #[must_use]
    pub fn admits_edit(current: &str, proposed: &str, consumed: usize) -> bool {
        let mut cur = current.chars();
        let mut new = proposed.chars();
        for _ in 0..consumed {
            match (cur.next(), new.next()) {
                (Some(a), Some(b)) if a == b => {}
                _ => return false,
            }
        }
        true
    }
}

/// Suffix of `input` starting at character `consumed`.
#[must_use]
pub fn project_queue(input: &str, consumed: Option<usize>) -> Vec<char> {
    input.chars().skip(consumed.unwrap_or(0)).collect()
}

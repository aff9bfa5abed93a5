#![forbid(unsafe_code)]

//! State classification.
//!
//! [`classify`] maps a normalized snapshot onto exactly one [`DisplayPhase`].
//! Rules are checked in a fixed priority order and the first match wins:
//!
//! 1. Not attached to the VM → `Uncontrolled`
//! 2. Starting → `Starting`
//! 3. Running/paused and jumping → `Jumping`
//! 4. Running/paused otherwise → `Running`
//! 5. Waiting for input → `WaitingForInput`
//! 6. Output ready → `OutputReady`
//! 7. Idle → `Idle`
//! 8. Anything else → `Unknown`
//!
//! `Unknown` is reported through the log but never panics: a snapshot with an
//! unrecognized control value is still rendered, just flagged.

use serde::Serialize;

use crate::snapshot::{ControlPhase, ExecutionSnapshot};

/// Mutually exclusive execution status shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayPhase {
    Uncontrolled,
    Starting,
    Jumping,
    Running,
    WaitingForInput,
    OutputReady,
    Idle,
    Unknown,
}

/// Presentation tier of a phase. Carries no semantics beyond display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Informational,
    Warning,
    Attention,
}

impl DisplayPhase {
    /// Phases shown in the status panel, in display order.
    pub const PANEL: [DisplayPhase; 6] = [
        Self::Running,
        Self::Starting,
        Self::Jumping,
        Self::WaitingForInput,
        Self::OutputReady,
        Self::Idle,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Uncontrolled => "currently not controlled",
            Self::Starting => "Starting",
            Self::Jumping => "Jumping",
            Self::Running => "Running",
            Self::WaitingForInput => "Waiting for input",
            Self::OutputReady => "Output ready",
            Self::Idle => "Idle",
            Self::Unknown => "Unknown state",
        }
    }

    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Running | Self::Idle => Severity::Informational,
            Self::Starting | Self::Jumping | Self::Uncontrolled => Severity::Warning,
            Self::WaitingForInput | Self::OutputReady | Self::Unknown => Severity::Attention,
        }
    }
}

/// Classify a snapshot. Pure and total.
#[must_use]
pub fn classify(snapshot: &ExecutionSnapshot) -> DisplayPhase {
    let phase = match &snapshot.control {
        ControlPhase::Uncontrolled => DisplayPhase::Uncontrolled,
        ControlPhase::Starting => DisplayPhase::Starting,
        ControlPhase::Running | ControlPhase::Paused if snapshot.is_jumping => {
            DisplayPhase::Jumping
        }
        ControlPhase::Running | ControlPhase::Paused => DisplayPhase::Running,
        ControlPhase::WaitingForInput => DisplayPhase::WaitingForInput,
        ControlPhase::OutputReady => DisplayPhase::OutputReady,
        ControlPhase::Idle => DisplayPhase::Idle,
        ControlPhase::Unrecognized(raw) => {
            crate::warn!(control = %raw, "snapshot control value not recognized");
            DisplayPhase::Unknown
        }
    };
    crate::trace!(?phase, "classified snapshot");
    phase
}

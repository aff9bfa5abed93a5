#![forbid(unsafe_code)]

//! View-model assembly.
//!
//! [`ViewModel::derive`] combines the latest snapshot, program text, and
//! input text into everything the presentation layer reads. Any of the three
//! may be missing or stale relative to the others; missing data renders as
//! placeholders, never as an error.

use serde::Serialize;

use crate::classify::{DisplayPhase, Severity, classify};
use crate::config::TwinConfig;
use crate::input_queue::InputQueue;
use crate::snapshot::{ControlPhase, ExecutionSnapshot, ProgramView};
use crate::stack::StackView;
use crate::window::{AddressSpace, BufferSlice, Window, build_window};

/// Classified phase with its display attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PhaseBadge {
    pub phase: DisplayPhase,
    pub label: &'static str,
    pub severity: Severity,
}

impl From<DisplayPhase> for PhaseBadge {
    fn from(phase: DisplayPhase) -> Self {
        Self {
            phase,
            label: phase.label(),
            severity: phase.severity(),
        }
    }
}

/// One entry of the status panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PhaseChip {
    pub phase: DisplayPhase,
    pub label: &'static str,
    pub severity: Severity,
    pub active: bool,
}

/// Read-only state handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ViewModel {
    /// `None` until the first snapshot arrives.
    pub phase: Option<PhaseBadge>,
    /// A run is active but single-stepped.
    pub paused: bool,
    pub program_window: Window<char>,
    pub memory_window: Window<i64>,
    pub stack: StackView,
    pub input_queue: InputQueue,
}

impl ViewModel {
    /// View model before anything has been received.
    #[must_use]
    pub fn loading(config: &TwinConfig) -> Self {
        Self::derive(None, None, None, config)
    }

    /// Derive the view model.
    ///
    /// `program` is the full program text of the dense variant; it is ignored
    /// when the snapshot carries its own fragment.
    #[must_use]
    pub fn derive(
        snapshot: Option<&ExecutionSnapshot>,
        program: Option<&[char]>,
        input: Option<&str>,
        config: &TwinConfig,
    ) -> Self {
        let phase = snapshot.map(classify);
        let input_queue = InputQueue::project(
            input.unwrap_or_default(),
            snapshot.and_then(|s| s.input_consumed),
        );

        let detail = match (snapshot, phase) {
            (Some(snapshot), Some(phase)) if phase != DisplayPhase::Uncontrolled => snapshot,
            _ => {
                return Self {
                    phase: phase.map(PhaseBadge::from),
                    paused: false,
                    program_window: Window::placeholder(config.program_span),
                    memory_window: Window::placeholder(config.memory_span),
                    stack: StackView::default(),
                    input_queue,
                };
            }
        };

        Self {
            phase: phase.map(PhaseBadge::from),
            paused: detail.control == ControlPhase::Paused,
            program_window: program_window(detail.program.as_ref(), program, config),
            memory_window: memory_window(detail, config),
            stack: StackView::project(&detail.stack, config.stack_order, config.stack_limit),
            input_queue,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase.is_none()
    }

    /// Whether windows, stack, and status panel should be rendered.
    #[must_use]
    pub fn shows_detail(&self) -> bool {
        self.phase
            .is_some_and(|badge| badge.phase != DisplayPhase::Uncontrolled)
    }

    /// Status panel entries in display order, the current phase marked active.
    #[must_use]
    pub fn phase_chips(&self) -> Vec<PhaseChip> {
        let current = self.phase.map(|badge| badge.phase);
        DisplayPhase::PANEL
            .iter()
            .map(|&phase| PhaseChip {
                phase,
                label: phase.label(),
                severity: phase.severity(),
                active: current == Some(phase),
            })
            .collect()
    }
}

fn program_window(
    view: Option<&ProgramView>,
    program: Option<&[char]>,
    config: &TwinConfig,
) -> Window<char> {
    let Some(view) = view else {
        return Window::placeholder(config.program_span);
    };
    let focal = to_address(view.counter);
    let source = match &view.fragment {
        Some(fragment) => BufferSlice::fragment(&fragment.cells, to_address(fragment.offset)),
        None => program.map_or_else(BufferSlice::empty, BufferSlice::full),
    };
    build_window(source, focal, config.program_span, AddressSpace::Linear)
}

fn memory_window(snapshot: &ExecutionSnapshot, config: &TwinConfig) -> Window<i64> {
    let Some(head) = snapshot.tape_head else {
        return Window::placeholder(config.memory_span);
    };
    let focal = to_address(head);
    let offset = focal.saturating_sub(to_address(config.tape_lead));
    build_window(
        BufferSlice::fragment(&snapshot.tape, offset),
        focal,
        config.memory_span,
        config.tape_space,
    )
}

fn to_address(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

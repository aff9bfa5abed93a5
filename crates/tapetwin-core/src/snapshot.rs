#![forbid(unsafe_code)]

//! Canonical execution snapshot.
//!
//! An [`ExecutionSnapshot`] is the normalized, schema-independent form of one
//! point-in-time report from the VM. Snapshots are immutable once built; a new
//! feed delivery replaces the held snapshot wholesale.

use serde::Serialize;

/// Control phase of the VM after schema normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlPhase {
    /// The hardware interpreter is being started.
    Starting,
    /// Executing instructions.
    Running,
    /// A run is active but single-stepped.
    Paused,
    /// No run is active.
    Idle,
    /// The interpreter blocks on the next input character.
    WaitingForInput,
    /// The interpreter has an output character pending.
    OutputReady,
    /// The dashboard is not attached to the VM's control loop.
    Uncontrolled,
    /// A control value this client does not know. Carries the raw text.
    Unrecognized(String),
}

impl ControlPhase {
    /// Whether a run is active (running or paused).
    #[inline]
    #[must_use]
    pub fn is_executing(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

/// Program location reported by a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramView {
    /// Absolute index of the next instruction.
    pub counter: usize,
    /// Sparse slice of the program around the counter.
    ///
    /// `None` in the dense variant, where the full program text is delivered
    /// separately by the feed.
    pub fragment: Option<ProgramFragment>,
}

/// A bounded slice of the program plus the absolute address of its first cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramFragment {
    pub offset: usize,
    pub cells: Vec<char>,
}

impl ProgramFragment {
    #[must_use]
    pub fn new(offset: usize, text: &str) -> Self {
        Self {
            offset,
            cells: text.chars().collect(),
        }
    }
}

/// Normalized point-in-time VM state.
///
/// Fields other than `control` are only meaningful while a run is active; an
/// idle or uncontrolled VM reports none of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionSnapshot {
    pub control: ControlPhase,
    /// True only while `control` is running or paused.
    pub is_jumping: bool,
    pub program: Option<ProgramView>,
    /// Index of the tape head in the memory address space.
    pub tape_head: Option<usize>,
    /// Tape cells, already windowed by the feed around the head.
    pub tape: Vec<i64>,
    pub stack: Vec<u64>,
    /// Count of input characters already consumed (`ic`).
    pub input_consumed: Option<usize>,
}

impl ExecutionSnapshot {
    /// A snapshot carrying only a control phase.
    #[must_use]
    pub fn with_control(control: ControlPhase) -> Self {
        Self {
            control,
            is_jumping: false,
            program: None,
            tape_head: None,
            tape: Vec::new(),
            stack: Vec::new(),
            input_consumed: None,
        }
    }

    /// Set the jumping flag. Ignored unless a run is active.
    #[must_use]
    pub fn jumping(mut self, jumping: bool) -> Self {
        self.is_jumping = jumping && self.control.is_executing();
        self
    }

    #[must_use]
    pub fn program(mut self, program: ProgramView) -> Self {
        self.program = Some(program);
        self
    }

    #[must_use]
    pub fn tape(mut self, head: usize, cells: Vec<i64>) -> Self {
        self.tape_head = Some(head);
        self.tape = cells;
        self
    }

    #[must_use]
    pub fn stack(mut self, stack: Vec<u64>) -> Self {
        self.stack = stack;
        self
    }

    #[must_use]
    pub fn consumed(mut self, ic: usize) -> Self {
        self.input_consumed = Some(ic);
        self
    }
}

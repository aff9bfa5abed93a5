#![forbid(unsafe_code)]

//! Raw snapshot decoding and schema normalization.
//!
//! The VM server has shipped two control schemas:
//!
//! | Variant | Fields | Example |
//! |---------|--------|---------|
//! | Flat    | `control` (+ optional `jumping`) | `{"control": "wait_input"}` |
//! | Split   | `control_state` + `run_state` | `{"control_state": "running", "run_state": "jumping"}` |
//!
//! Both decode into the same [`RawSnapshot`] and are folded into one
//! [`ControlPhase`] by [`RawSnapshot::normalize`]. The classifier only ever
//! sees the normalized form.
//!
//! When a document carries both schemas the split pair wins, since it is the
//! only one that can express jumping while paused.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::snapshot::{ControlPhase, ExecutionSnapshot, ProgramFragment, ProgramView};

/// Errors produced while decoding a raw snapshot.
#[derive(Debug)]
pub enum DecodeError {
    /// The document is not valid JSON or has mistyped fields.
    Json(serde_json::Error),
    /// Neither `control` nor `control_state` is present.
    MissingControl,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "malformed snapshot: {e}"),
            Self::MissingControl => write!(f, "snapshot has no control field"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::MissingControl => None,
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Program window as sent by the sparse variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawCode {
    pub pc: usize,
    #[serde(default)]
    pub offset: usize,
    pub fragment: RawFragment,
}

/// Program fragment payload: either text or a list of character codes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawFragment {
    Text(String),
    Codes(Vec<u32>),
}

impl RawFragment {
    fn to_cells(&self) -> Vec<char> {
        match self {
            Self::Text(text) => text.chars().collect(),
            Self::Codes(codes) => codes
                .iter()
                .map(|&c| char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect(),
        }
    }
}

/// Snapshot document exactly as the server sends it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawSnapshot {
    /// Flat control value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<String>,
    /// Flat variant jump flag.
    #[serde(default)]
    pub jumping: bool,
    /// Split variant control half.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_state: Option<String>,
    /// Split variant run half.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_state: Option<String>,
    /// Sparse program window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<RawCode>,
    /// Program counter for the dense variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pc: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<usize>,
    #[serde(default)]
    pub tape: Vec<i64>,
    #[serde(default)]
    pub stack: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ic: Option<usize>,
}

/// The control discriminator of a raw document, by schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawControl<'a> {
    Flat { control: &'a str, jumping: bool },
    Split {
        control_state: &'a str,
        run_state: Option<&'a str>,
    },
}

impl RawSnapshot {
    /// Identify which control schema this document uses.
    #[must_use]
    pub fn control_schema(&self) -> Option<RawControl<'_>> {
        if let Some(control_state) = self.control_state.as_deref() {
            return Some(RawControl::Split {
                control_state,
                run_state: self.run_state.as_deref(),
            });
        }
        self.control.as_deref().map(|control| RawControl::Flat {
            control,
            jumping: self.jumping,
        })
    }

    /// Fold this document into the canonical snapshot form.
    pub fn normalize(&self) -> Result<ExecutionSnapshot, DecodeError> {
        let (control, jumping) = match self.control_schema() {
            Some(RawControl::Flat { control, jumping }) => (flat_phase(control), jumping),
            Some(RawControl::Split {
                control_state,
                run_state,
            }) => split_phase(control_state, run_state),
            None => return Err(DecodeError::MissingControl),
        };

        let program = match (&self.code, self.pc) {
            (Some(code), _) => Some(ProgramView {
                counter: code.pc,
                fragment: Some(ProgramFragment {
                    offset: code.offset,
                    cells: code.fragment.to_cells(),
                }),
            }),
            (None, Some(pc)) => Some(ProgramView {
                counter: pc,
                fragment: None,
            }),
            (None, None) => None,
        };

        let is_jumping = jumping && control.is_executing();
        Ok(ExecutionSnapshot {
            control,
            is_jumping,
            program,
            tape_head: self.head,
            tape: self.tape.clone(),
            stack: self.stack.clone(),
            input_consumed: self.ic,
        })
    }
}

/// Decode and normalize a JSON snapshot document.
pub fn decode_snapshot(json: &str) -> Result<ExecutionSnapshot, DecodeError> {
    let raw: RawSnapshot = serde_json::from_str(json)?;
    raw.normalize()
}

fn flat_phase(control: &str) -> ControlPhase {
    match control {
        "startup" | "starting" => ControlPhase::Starting,
        "running" => ControlPhase::Running,
        "paused" => ControlPhase::Paused,
        "idle" => ControlPhase::Idle,
        "wait_input" => ControlPhase::WaitingForInput,
        "output_ready" => ControlPhase::OutputReady,
        "uncontrolled" => ControlPhase::Uncontrolled,
        other => ControlPhase::Unrecognized(other.to_owned()),
    }
}

fn split_phase(control_state: &str, run_state: Option<&str>) -> (ControlPhase, bool) {
    let control = match control_state {
        "startup" | "starting" => ControlPhase::Starting,
        "running" => ControlPhase::Running,
        "paused" => ControlPhase::Paused,
        "idle" => ControlPhase::Idle,
        "uncontrolled" => ControlPhase::Uncontrolled,
        other => ControlPhase::Unrecognized(other.to_owned()),
    };
    if !control.is_executing() {
        return (control, false);
    }
    match run_state {
        None | Some("default") => (control, false),
        Some("jumping") => (control, true),
        Some("wait_input") => (ControlPhase::WaitingForInput, false),
        Some("output_ready") => (ControlPhase::OutputReady, false),
        Some(other) => (ControlPhase::Unrecognized(format!("{control_state}/{other}")), false),
    }
}

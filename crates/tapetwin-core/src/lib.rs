#![forbid(unsafe_code)]

//! Core derivations for the tape VM twin.
//!
//! Everything in this crate is pure and synchronous: a raw execution snapshot
//! goes in, display-ready values come out. The event-driven side (feeds,
//! listeners, activation scopes) lives in `tapetwin-runtime`.
//!
//! # Key Components
//!
//! - [`raw`] - Decodes the server's JSON snapshot (flat or split control schema)
//!   and normalizes it into an [`ExecutionSnapshot`]
//! - [`classify`] - Maps a snapshot onto exactly one [`DisplayPhase`]
//! - [`window`] - Fixed-length, address-tagged windows over linear or circular buffers
//! - [`input_queue`] - Remaining not-yet-consumed input characters
//! - [`stack`] - Truncated top-of-stack rows
//! - [`view_model`] - Assembles all of the above into a [`ViewModel`]
//!
//! # Data flow
//!
//! ```text
//! RawSnapshot ──normalize──▶ ExecutionSnapshot ─┬─▶ classify ─────▶ PhaseBadge
//!                                               ├─▶ build_window ─▶ program / memory windows
//!                                               ├─▶ StackView
//! input text ──────────────────────────────────-┴─▶ project_queue ▶ input queue
//! ```

pub mod classify;
pub mod config;
pub mod input_queue;
pub mod logging;
pub mod raw;
pub mod snapshot;
pub mod stack;
pub mod view_model;
pub mod window;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{trace, warn};

pub use classify::{DisplayPhase, Severity, classify};
pub use config::TwinConfig;
pub use input_queue::{InputQueue, project_queue};
pub use raw::{DecodeError, RawSnapshot, decode_snapshot};
pub use snapshot::{ControlPhase, ExecutionSnapshot, ProgramFragment, ProgramView};
pub use stack::{StackOrder, StackRow, StackView};
pub use view_model::{PhaseBadge, PhaseChip, ViewModel};
pub use window::{AddressSpace, BufferSlice, Window, WindowCell, WindowSpan, build_window};

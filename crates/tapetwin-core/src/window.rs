#![forbid(unsafe_code)]

//! Address windows over program and memory buffers.
//!
//! A [`Window`] is a fixed-length, address-tagged slice of a buffer centered
//! on a focal index. For a [`WindowSpan`] of `behind`/`ahead` the window
//! always has `behind + ahead + 1` cells, one per candidate address
//! `focal - behind ..= focal + ahead`.
//!
//! # Address spaces
//!
//! - [`AddressSpace::Linear`]: candidates outside the buffer are *absent*.
//!   The reported address is the raw candidate, which may be negative.
//! - [`AddressSpace::Circular`]: candidates wrap modulo the space size and the
//!   reported address is the wrapped one, always in `[0, size)`.
//!
//! # Fragments
//!
//! The feed usually delivers only a slice of the underlying buffer. A
//! [`BufferSlice`] records the absolute address of its first cell; lookups are
//! done relative to that offset, and addresses outside the slice are absent
//! even if the full (unobserved) buffer would cover them.
//!
//! # Invariants
//!
//! 1. `window.len() == span.len()` for every input, placeholders included.
//! 2. Circular addresses are always in `[0, size)`.
//! 3. A circular window over a full-size source never contains absent cells.
//! 4. Identical inputs yield identical windows; there is no hidden state.

use std::num::NonZeroU64;

use serde::Serialize;

/// Number of cells before and after the focal index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WindowSpan {
    pub behind: usize,
    pub ahead: usize,
}

impl WindowSpan {
    #[must_use]
    pub const fn new(behind: usize, ahead: usize) -> Self {
        Self { behind, ahead }
    }

    /// Symmetric span with `radius` cells on each side.
    #[must_use]
    pub const fn centered(radius: usize) -> Self {
        Self::new(radius, radius)
    }

    /// Total number of cells, focal cell included.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.behind.saturating_add(self.ahead).saturating_add(1)
    }

    /// Relative offsets `-behind ..= ahead`.
    fn offsets(self) -> impl Iterator<Item = i128> {
        let behind = self.behind as i128;
        let ahead = self.ahead as i128;
        -behind..=ahead
    }
}

impl Default for WindowSpan {
    fn default() -> Self {
        Self::centered(3)
    }
}

/// Topology of the address space a window is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressSpace {
    /// Clipped at its bounds.
    Linear,
    /// Wraps modulo `size`.
    Circular { size: NonZeroU64 },
}

impl AddressSpace {
    /// Size of the VM memory tape.
    pub const TAPE_SIZE: u64 = 0x8000;

    /// Circular space of the given size, or `None` for size zero.
    #[must_use]
    pub fn circular(size: u64) -> Option<Self> {
        NonZeroU64::new(size).map(|size| Self::Circular { size })
    }

    /// The VM's circular memory tape.
    #[must_use]
    pub fn tape() -> Self {
        Self::Circular {
            size: NonZeroU64::new(Self::TAPE_SIZE).unwrap_or(NonZeroU64::MIN),
        }
    }

    /// Resolve a candidate address.
    ///
    /// Circular spaces return a value in `[0, size)`. Linear spaces return the
    /// candidate unchanged, saturated to the `i64` range.
    #[must_use]
    pub fn resolve(self, candidate: i128) -> i64 {
        match self {
            Self::Linear => saturate(candidate),
            Self::Circular { size } => wrap(candidate, size),
        }
    }
}

fn wrap(candidate: i128, size: NonZeroU64) -> i64 {
    let size = i128::from(size.get());
    saturate(((candidate % size) + size) % size)
}

fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Borrowed view of a buffer, plus the absolute address of its first cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSlice<'a, T> {
    cells: &'a [T],
    offset: i64,
}

impl<'a, T> BufferSlice<'a, T> {
    /// The whole buffer, starting at address zero.
    #[must_use]
    pub const fn full(cells: &'a [T]) -> Self {
        Self { cells, offset: 0 }
    }

    /// A pre-sliced fragment whose first cell sits at `offset`.
    #[must_use]
    pub const fn fragment(cells: &'a [T], offset: i64) -> Self {
        Self { cells, offset }
    }

    /// An empty source. Every lookup is absent.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            cells: &[],
            offset: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    fn lookup(&self, address: i64, space: AddressSpace) -> Option<&'a T> {
        let distance = i128::from(address) - i128::from(self.offset);
        let index = match space {
            AddressSpace::Linear if address < 0 => return None,
            AddressSpace::Linear => distance,
            AddressSpace::Circular { size } => i128::from(wrap(distance, size)),
        };
        usize::try_from(index).ok().and_then(|i| self.cells.get(i))
    }
}

/// One addressed cell of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WindowCell<T> {
    pub address: i64,
    /// `None` when the source has no data at `address`.
    pub value: Option<T>,
}

impl<T> WindowCell<T> {
    #[must_use]
    pub const fn absent(address: i64) -> Self {
        Self {
            address,
            value: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        self.value.is_none()
    }
}

/// A fixed-length, address-tagged slice of a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Window<T> {
    focal: Option<i64>,
    cells: Vec<WindowCell<T>>,
}

impl<T> Window<T> {
    /// A window for data that has not arrived yet.
    ///
    /// Has the full span length with every cell absent. With no focal point
    /// known, addresses are the relative offsets `-behind ..= ahead`.
    #[must_use]
    pub fn placeholder(span: WindowSpan) -> Self {
        Self {
            focal: None,
            cells: span
                .offsets()
                .map(|i| WindowCell::absent(saturate(i)))
                .collect(),
        }
    }

    /// Focal address, or `None` for a placeholder.
    #[inline]
    #[must_use]
    pub const fn focal(&self) -> Option<i64> {
        self.focal
    }

    #[inline]
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.focal.is_none()
    }

    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[WindowCell<T>] {
        &self.cells
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells that carry a value.
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_absent()).count()
    }

    /// Addresses of all cells, in window order.
    pub fn addresses(&self) -> impl Iterator<Item = i64> + '_ {
        self.cells.iter().map(|c| c.address)
    }
}

/// Build a window of `span` around `focal` over `source`.
///
/// Never fails: out-of-range linear addresses become absent cells and
/// circular addresses are wrapped.
#[must_use]
pub fn build_window<T: Clone>(
    source: BufferSlice<'_, T>,
    focal: i64,
    span: WindowSpan,
    space: AddressSpace,
) -> Window<T> {
    let focal_address = space.resolve(i128::from(focal));
    let cells = span
        .offsets()
        .map(|i| {
            let address = space.resolve(i128::from(focal) + i);
            WindowCell {
                address,
                value: source.lookup(address, space).cloned(),
            }
        })
        .collect();
    Window {
        focal: Some(focal_address),
        cells,
    }
}

//! Property-based invariant tests for the pure derivations.
//!
//! 1. Circular resolution always lands in `[0, size)`.
//! 2. A circular window over a full-size source has no absent cells.
//! 3. Window length is always `behind + ahead + 1`.
//! 4. Linear windows are absent exactly outside `[0, len)`.
//! 5. Linear present-cell count equals the in-range candidate count.
//! 6. Windows are deterministic.
//! 7. Queue length is `len - consumed` for in-range counts, `len` when unknown.
//! 8. Classification is deterministic; jumping while running is never `Running`.
//! 9. No panics on arbitrary JSON-shaped snapshots.

use proptest::prelude::*;
use tapetwin_core::{
    AddressSpace, BufferSlice, ControlPhase, DisplayPhase, ExecutionSnapshot, WindowSpan,
    build_window, classify, decode_snapshot, project_queue,
};

// ── Strategies ────────────────────────────────────────────────────────────

fn span_strategy() -> impl Strategy<Value = WindowSpan> {
    (0usize..=16, 0usize..=16).prop_map(|(behind, ahead)| WindowSpan::new(behind, ahead))
}

fn control_strategy() -> impl Strategy<Value = ControlPhase> {
    prop_oneof![
        Just(ControlPhase::Starting),
        Just(ControlPhase::Running),
        Just(ControlPhase::Paused),
        Just(ControlPhase::Idle),
        Just(ControlPhase::WaitingForInput),
        Just(ControlPhase::OutputReady),
        Just(ControlPhase::Uncontrolled),
        "[a-z_]{0,12}".prop_map(ControlPhase::Unrecognized),
    ]
}

// ── Windows ───────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn circular_resolution_in_range(size in 1u64..=0x10000, candidate in any::<i64>()) {
        let space = AddressSpace::circular(size).unwrap();
        let resolved = space.resolve(i128::from(candidate));
        prop_assert!(resolved >= 0);
        prop_assert!((resolved as u64) < size);
    }

    #[test]
    fn circular_full_source_never_absent(
        size in 1usize..=64,
        focal in any::<i64>(),
        span in span_strategy(),
    ) {
        let tape: Vec<i64> = (0..size as i64).collect();
        let space = AddressSpace::circular(size as u64).unwrap();
        let window = build_window(BufferSlice::full(&tape), focal, span, space);
        prop_assert_eq!(window.len(), span.len());
        prop_assert_eq!(window.present_count(), span.len());
        for cell in window.cells() {
            prop_assert!(cell.address >= 0 && (cell.address as usize) < size);
            prop_assert_eq!(cell.value, Some(cell.address));
        }
    }

    #[test]
    fn linear_absent_exactly_out_of_range(
        len in 0usize..=32,
        focal in -40i64..=80,
        span in span_strategy(),
    ) {
        let program: Vec<u8> = (0..len).map(|i| i as u8).collect();
        let window = build_window(BufferSlice::full(&program), focal, span, AddressSpace::Linear);
        prop_assert_eq!(window.len(), span.len());

        let mut in_range = 0usize;
        for (i, cell) in window.cells().iter().enumerate() {
            let candidate = focal - span.behind as i64 + i as i64;
            prop_assert_eq!(cell.address, candidate);
            let inside = candidate >= 0 && (candidate as usize) < len;
            prop_assert_eq!(cell.is_absent(), !inside);
            if inside {
                in_range += 1;
                prop_assert_eq!(cell.value, Some(candidate as u8));
            }
        }
        prop_assert_eq!(window.present_count(), in_range);
        prop_assert!(window.present_count() <= span.len().min(len));
    }

    #[test]
    fn fragment_absent_outside_slice(
        offset in 0i64..=50,
        frag_len in 0usize..=10,
        focal in 0i64..=70,
        span in span_strategy(),
    ) {
        let frag: Vec<u8> = vec![1; frag_len];
        let window =
            build_window(BufferSlice::fragment(&frag, offset), focal, span, AddressSpace::Linear);
        for cell in window.cells() {
            let inside = cell.address >= offset && cell.address < offset + frag_len as i64;
            prop_assert_eq!(cell.is_absent(), !inside);
        }
    }

    #[test]
    fn windows_are_deterministic(
        data in proptest::collection::vec(any::<i64>(), 0..20),
        focal in any::<i64>(),
        span in span_strategy(),
        size in 1u64..=32,
    ) {
        let space = AddressSpace::circular(size).unwrap();
        let a = build_window(BufferSlice::full(&data), focal, span, space);
        let b = build_window(BufferSlice::full(&data), focal, span, space);
        prop_assert_eq!(a, b);
    }
}

// ── Input queue ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn queue_length_matches_consumed(text in ".{0,24}", consumed in 0usize..=30) {
        let len = text.chars().count();
        let queue = project_queue(&text, Some(consumed));
        prop_assert_eq!(queue.len(), len.saturating_sub(consumed));
        prop_assert_eq!(project_queue(&text, None).len(), len);
    }

    #[test]
    fn queue_is_suffix(text in "[a-z]{0,24}", consumed in 0usize..=24) {
        let queue: String = project_queue(&text, Some(consumed)).into_iter().collect();
        prop_assert!(text.ends_with(&queue));
    }
}

// ── Classifier ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn classification_is_deterministic(control in control_strategy(), jumping in any::<bool>()) {
        let snap = ExecutionSnapshot::with_control(control).jumping(jumping);
        prop_assert_eq!(classify(&snap), classify(&snap));
    }

    #[test]
    fn jumping_run_is_never_running(paused in any::<bool>()) {
        let control = if paused { ControlPhase::Paused } else { ControlPhase::Running };
        let snap = ExecutionSnapshot::with_control(control).jumping(true);
        prop_assert_eq!(classify(&snap), DisplayPhase::Jumping);
    }

    #[test]
    fn decoding_never_panics(
        control in "[a-z_]{0,12}",
        run_state in proptest::option::of("[a-z_]{0,12}"),
        split in any::<bool>(),
        head in proptest::option::of(0usize..0x8000),
    ) {
        let mut doc = serde_json::Map::new();
        if split {
            doc.insert("control_state".into(), control.into());
            if let Some(run) = run_state {
                doc.insert("run_state".into(), run.into());
            }
        } else {
            doc.insert("control".into(), control.into());
        }
        if let Some(head) = head {
            doc.insert("head".into(), head.into());
        }
        let json = serde_json::Value::Object(doc).to_string();
        let snap = decode_snapshot(&json).unwrap();
        prop_assert!(!snap.is_jumping || snap.control.is_executing());
    }
}

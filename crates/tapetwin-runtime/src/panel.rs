#![forbid(unsafe_code)]

//! The twin panel: a presentation unit bound to a feed.
//!
//! [`TwinPanel::activate`] seeds itself from the feed's current values,
//! subscribes to state, input, and (for dense feeds) program changes, and
//! recomputes the [`ViewModel`] synchronously on every delivery. Recomputation
//! is wholesale; there is no partially updated view.
//!
//! The three inputs arrive independently and in any order. A snapshot that
//! references program text not yet delivered still renders, with absent
//! program cells.
//!
//! A delivery that lands while the panel is borrowed (from inside
//! [`TwinPanel::with_view`], say) cannot be applied in place. The panel is
//! marked stale instead, and the next recomputation re-reads all three values
//! from the feed, which stays the source of truth.
//!
//! Deactivation (explicit or by drop) releases every listener the panel took.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tapetwin_core::{ExecutionSnapshot, TwinConfig, ViewModel};

use crate::feed::{FeedError, StateFeed};
use crate::scope::SubscriptionScope;

type ViewObserver = Box<dyn FnMut(&ViewModel)>;

struct PanelState {
    config: TwinConfig,
    dense: bool,
    snapshot: Option<Rc<ExecutionSnapshot>>,
    program: Option<Rc<[char]>>,
    input: Option<Rc<str>>,
    view: ViewModel,
    revision: u64,
    observer: Option<ViewObserver>,
}

impl PanelState {
    fn resync<F: StateFeed + ?Sized>(&mut self, feed: &F) {
        self.snapshot = feed.current_state();
        self.input = feed.input_text();
        if self.dense {
            self.program = feed.program_text().map(|text| text.chars().collect());
        }
    }

    fn recompute(&mut self) {
        self.view = ViewModel::derive(
            self.snapshot.as_deref(),
            self.program.as_deref(),
            self.input.as_deref(),
            &self.config,
        );
        self.revision += 1;
        tracing::trace!(
            revision = self.revision,
            phase = ?self.view.phase.map(|badge| badge.phase),
            "view model recomputed"
        );
    }
}

struct Shared {
    state: RefCell<PanelState>,
    /// Set when a delivery could not be applied.
    stale: Cell<bool>,
}

/// A live view of one feed.
pub struct TwinPanel<F: StateFeed + ?Sized> {
    shared: Rc<Shared>,
    scope: SubscriptionScope<F>,
}

impl<F: StateFeed + ?Sized + 'static> TwinPanel<F> {
    /// Seed from the feed and subscribe to its changes.
    pub fn activate(feed: Rc<F>, config: TwinConfig) -> Self {
        let mut initial = PanelState {
            view: ViewModel::loading(&config),
            config,
            dense: feed.delivers_program_text(),
            snapshot: None,
            program: None,
            input: None,
            revision: 0,
            observer: None,
        };
        initial.resync(&*feed);
        initial.recompute();
        let dense = initial.dense;
        let shared = Rc::new(Shared {
            state: RefCell::new(initial),
            stale: Cell::new(false),
        });

        let mut scope = SubscriptionScope::new(feed);
        let (weak, source) = (Rc::downgrade(&shared), Rc::downgrade(scope.feed()));
        scope.on_state_change(move |snapshot| {
            let feed = source.upgrade();
            deliver(&weak, feed.as_deref(), |s| s.snapshot = Some(snapshot.clone()));
        });
        let (weak, source) = (Rc::downgrade(&shared), Rc::downgrade(scope.feed()));
        scope.on_input_change(move |text| {
            let feed = source.upgrade();
            deliver(&weak, feed.as_deref(), |s| s.input = Some(text.clone()));
        });
        if dense {
            let (weak, source) = (Rc::downgrade(&shared), Rc::downgrade(scope.feed()));
            scope.on_program_change(move |text| {
                let chars: Rc<[char]> = text.chars().collect();
                let feed = source.upgrade();
                deliver(&weak, feed.as_deref(), |s| s.program = Some(chars));
            });
        }

        tracing::debug!(listeners = scope.len(), dense, "twin panel activated");
        Self { shared, scope }
    }

    /// Current view model.
    #[must_use]
    pub fn view_model(&self) -> ViewModel {
        self.refresh();
        self.shared.state.borrow().view.clone()
    }

    /// Read the current view model without cloning it.
    ///
    /// Deliveries made from inside `f` are picked up once `f` returns.
    pub fn with_view<R>(&self, f: impl FnOnce(&ViewModel) -> R) -> R {
        self.refresh();
        let result = f(&self.shared.state.borrow().view);
        self.refresh();
        result
    }

    /// Re-read the feed if a delivery was missed. Returns whether it did.
    pub fn refresh(&self) -> bool {
        if !self.shared.stale.get() {
            return false;
        }
        let weak = Rc::downgrade(&self.shared);
        deliver(&weak, Some(&**self.scope.feed()), |_| {});
        !self.shared.stale.get()
    }

    /// Whether a delivery is waiting to be picked up by [`refresh`](Self::refresh).
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.shared.stale.get()
    }

    /// Number of derivations performed so far, the initial one included.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.shared.state.borrow().revision
    }

    /// Call `f` with the new view model after every recomputation.
    ///
    /// Replaces any previous observer.
    pub fn on_view_change(&self, f: impl FnMut(&ViewModel) + 'static) {
        self.shared.state.borrow_mut().observer = Some(Box::new(f));
    }

    /// Number of listeners this panel holds on its feed.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.scope.len()
    }

    /// Release every listener. Teardown failures are returned, not raised.
    pub fn deactivate(mut self) -> Vec<FeedError> {
        let errors = self.scope.release();
        tracing::debug!(failed = errors.len(), "twin panel deactivated");
        errors
    }
}

fn deliver<F: StateFeed + ?Sized>(
    shared: &Weak<Shared>,
    feed: Option<&F>,
    apply: impl FnOnce(&mut PanelState),
) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let notify = {
        let Ok(mut guard) = shared.state.try_borrow_mut() else {
            shared.stale.set(true);
            tracing::warn!("twin panel busy, resyncing from feed on next update");
            return;
        };
        if shared.stale.get() {
            if let Some(feed) = feed {
                guard.resync(feed);
                shared.stale.set(false);
            }
        }
        apply(&mut guard);
        guard.recompute();
        let view = guard.view.clone();
        guard.observer.take().map(|observer| (observer, view))
    };
    if let Some((mut observer, view)) = notify {
        observer(&view);
        if let Ok(mut guard) = shared.state.try_borrow_mut() {
            if guard.observer.is_none() {
                guard.observer = Some(observer);
            }
        }
    }
}

impl<F: StateFeed + ?Sized> fmt::Debug for TwinPanel<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("TwinPanel")
            .field("revision", &state.revision)
            .field("phase", &state.view.phase)
            .field("stale", &self.shared.stale.get())
            .field("scope", &self.scope)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_feed::MemoryFeed;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use tapetwin_core::{ControlPhase, DisplayPhase, ProgramView};

    fn paused_at(pc: usize) -> ExecutionSnapshot {
        ExecutionSnapshot::with_control(ControlPhase::Paused).program(ProgramView {
            counter: pc,
            fragment: None,
        })
    }

    #[test]
    fn loading_until_first_snapshot() {
        let feed = Rc::new(MemoryFeed::new());
        let panel = TwinPanel::activate(feed, TwinConfig::default());
        assert!(panel.view_model().is_loading());
        assert_eq!(panel.revision(), 1);
    }

    #[test]
    fn seeds_from_values_already_on_feed() {
        let feed = Rc::new(MemoryFeed::new());
        feed.push_state(ExecutionSnapshot::with_control(ControlPhase::Idle));
        feed.set_input("abc");
        let panel = TwinPanel::activate(feed, TwinConfig::default());
        let vm = panel.view_model();
        assert_eq!(vm.phase.map(|b| b.phase), Some(DisplayPhase::Idle));
        assert_eq!(vm.input_queue.as_string(), "abc");
    }

    #[test]
    fn every_delivery_recomputes() {
        let feed = Rc::new(MemoryFeed::new());
        let panel = TwinPanel::activate(feed.clone(), TwinConfig::default());
        feed.push_state(paused_at(1));
        feed.set_program("+-<>");
        feed.set_input("q");
        assert_eq!(panel.revision(), 4);
        panel.with_view(|vm| {
            assert!(vm.paused);
            assert_eq!(vm.program_window.present_count(), 4);
            assert_eq!(vm.input_queue.len(), 1);
        });
    }

    #[test]
    fn snapshot_before_program_text_renders_absent_cells() {
        let feed = Rc::new(MemoryFeed::new());
        let panel = TwinPanel::activate(feed.clone(), TwinConfig::default());
        feed.push_state(paused_at(2));
        assert_eq!(panel.view_model().program_window.present_count(), 0);
        feed.set_program("abcde");
        assert_eq!(panel.view_model().program_window.present_count(), 5);
    }

    #[test]
    fn sparse_feed_skips_program_subscription() {
        let dense = Rc::new(MemoryFeed::new());
        let sparse = Rc::new(MemoryFeed::sparse());
        assert_eq!(
            TwinPanel::activate(dense, TwinConfig::default()).subscription_count(),
            3
        );
        assert_eq!(
            TwinPanel::activate(sparse, TwinConfig::default()).subscription_count(),
            2
        );
    }

    #[test]
    fn deactivate_releases_listeners() {
        let feed = Rc::new(MemoryFeed::new());
        let panel = TwinPanel::activate(feed.clone(), TwinConfig::default());
        assert_eq!(feed.listener_count(), 3);
        assert!(panel.deactivate().is_empty());
        assert_eq!(feed.listener_count(), 0);
    }

    #[test]
    fn drop_releases_listeners() {
        let feed = Rc::new(MemoryFeed::new());
        drop(TwinPanel::activate(feed.clone(), TwinConfig::default()));
        assert_eq!(feed.listener_count(), 0);
        feed.set_input("still fine");
    }

    #[test]
    fn observer_sees_each_view_and_may_read_panel_state() {
        let feed = Rc::new(MemoryFeed::new());
        let panel = Rc::new(TwinPanel::activate(feed.clone(), TwinConfig::default()));
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let p = Rc::downgrade(&panel);
        panel.on_view_change(move |vm| {
            c.set(c.get() + 1);
            if let Some(panel) = p.upgrade() {
                assert_eq!(&panel.view_model(), vm);
            }
        });
        feed.push_state(ExecutionSnapshot::with_control(ControlPhase::Starting));
        feed.set_input("z");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn push_during_with_view_is_not_lost() {
        let feed = Rc::new(MemoryFeed::new());
        feed.push_state(ExecutionSnapshot::with_control(ControlPhase::Idle));
        let panel = TwinPanel::activate(feed.clone(), TwinConfig::default());
        panel.with_view(|_| {
            feed.push_state(ExecutionSnapshot::with_control(ControlPhase::Running));
        });
        assert!(!panel.is_stale());
        assert_eq!(
            panel.view_model().phase.map(|b| b.phase),
            Some(DisplayPhase::Running)
        );
    }

    #[test]
    fn busy_delivery_is_recovered_by_next_delivery_on_other_topic() {
        let feed = Rc::new(MemoryFeed::new());
        feed.push_state(ExecutionSnapshot::with_control(ControlPhase::Idle));
        let panel = TwinPanel::activate(feed.clone(), TwinConfig::default());
        {
            let _held = panel.shared.state.borrow();
            feed.push_state(ExecutionSnapshot::with_control(ControlPhase::Running));
        }
        assert!(panel.is_stale());
        feed.set_input("abc");
        assert!(!panel.is_stale());
        let vm = panel.shared.state.borrow().view.clone();
        assert_eq!(vm.phase.map(|b| b.phase), Some(DisplayPhase::Running));
        assert_eq!(vm.input_queue.as_string(), "abc");
    }

    #[test]
    fn refresh_is_a_no_op_when_current() {
        let feed = Rc::new(MemoryFeed::new());
        let panel = TwinPanel::activate(feed, TwinConfig::default());
        assert!(!panel.refresh());
        assert_eq!(panel.revision(), 1);
    }

    #[test]
    fn works_over_trait_object_feed() {
        let feed = Rc::new(MemoryFeed::new());
        let dyn_feed: Rc<dyn StateFeed> = feed.clone();
        let panel = TwinPanel::activate(dyn_feed, TwinConfig::default());
        feed.push_state(ExecutionSnapshot::with_control(ControlPhase::Uncontrolled));
        assert!(!panel.view_model().shows_detail());
    }
}

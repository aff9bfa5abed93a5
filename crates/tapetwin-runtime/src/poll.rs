#![forbid(unsafe_code)]

//! Host-driven polling of a pull-based state source.
//!
//! Some VM servers only answer requests. [`Poller`] bridges such a
//! [`StateSource`] onto a [`MemoryFeed`]: on each [`Poller::step`] it checks a
//! host-advanced [`PollClock`], fetches when the interval has elapsed, and pushes a
//! value only when it differs from the one the feed holds. Listeners therefore
//! see one delivery per actual change, not one per poll.
//!
//! The poller never blocks, sleeps, or retries. Fetch errors are logged and
//! counted; the previous value stays in place and the next step tries again.

use core::time::Duration;

use tapetwin_core::{ExecutionSnapshot, TwinConfig};

use crate::feed::{FeedResult, StateFeed};
use crate::memory_feed::MemoryFeed;

/// Poll time, advanced only by the host.
///
/// Tests and hosts without a wall clock drive the poller through this; the
/// poller never reads system time itself.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollClock {
    elapsed: Duration,
}

impl PollClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            elapsed: Duration::ZERO,
        }
    }

    /// A clock already `elapsed` past its origin.
    #[must_use]
    pub const fn at(elapsed: Duration) -> Self {
        Self { elapsed }
    }

    /// Move forward by `dt`, saturating at [`Duration::MAX`].
    pub fn advance(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Pull-based source of VM state.
///
/// `Ok(None)` means the source has nothing yet; it is not an error.
pub trait StateSource {
    fn fetch_state(&mut self) -> FeedResult<Option<ExecutionSnapshot>>;
    fn fetch_program(&mut self) -> FeedResult<Option<String>>;
    fn fetch_input(&mut self) -> FeedResult<Option<String>>;
}

/// Cumulative poller counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub polls: u64,
    /// Values pushed to the feed because they changed.
    pub replaced: u64,
    pub errors: u64,
}

/// Result of one [`Poller::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The interval has not elapsed since the last poll.
    NotDue,
    Polled { replaced: usize, errors: usize },
}

/// Interval-driven bridge from a [`StateSource`] to a [`MemoryFeed`].
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    last_poll: Option<Duration>,
    stats: PollStats,
}

impl Poller {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_poll: None,
            stats: PollStats::default(),
        }
    }

    #[must_use]
    pub fn from_config(config: &TwinConfig) -> Self {
        Self::new(config.poll_interval)
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub const fn stats(&self) -> PollStats {
        self.stats
    }

    /// Whether a poll is due at `clock`. The first step is always due.
    #[must_use]
    pub fn is_due(&self, clock: &PollClock) -> bool {
        self.last_poll
            .is_none_or(|last| clock.elapsed().saturating_sub(last) >= self.interval)
    }

    /// Clock reading at which the next step will poll, `None` before the first.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.last_poll
            .map(|last| last.saturating_add(self.interval))
    }

    /// Poll if due.
    pub fn step<S: StateSource + ?Sized>(
        &mut self,
        clock: &PollClock,
        source: &mut S,
        feed: &MemoryFeed,
    ) -> PollOutcome {
        if !self.is_due(clock) {
            return PollOutcome::NotDue;
        }
        self.poll_now(clock, source, feed)
    }

    /// Poll regardless of the interval.
    pub fn poll_now<S: StateSource + ?Sized>(
        &mut self,
        clock: &PollClock,
        source: &mut S,
        feed: &MemoryFeed,
    ) -> PollOutcome {
        let now = clock.elapsed();
        self.last_poll = Some(now);
        self.stats.polls += 1;
        let mut replaced = 0;
        let mut errors = 0;

        match source.fetch_state() {
            Ok(Some(snapshot)) if feed.current_state().as_deref() != Some(&snapshot) => {
                feed.push_state(snapshot);
                replaced += 1;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "state fetch failed");
                errors += 1;
            }
        }

        if feed.delivers_program_text() {
            match source.fetch_program() {
                Ok(Some(text)) if feed.program_text().as_deref() != Some(text.as_str()) => {
                    feed.set_program(text);
                    replaced += 1;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "program fetch failed");
                    errors += 1;
                }
            }
        }

        match source.fetch_input() {
            Ok(Some(text)) if feed.input_text().as_deref() != Some(text.as_str()) => {
                feed.set_input(text);
                replaced += 1;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "input fetch failed");
                errors += 1;
            }
        }

        self.stats.replaced += replaced as u64;
        self.stats.errors += errors as u64;
        tracing::trace!(replaced, errors, "poll complete");
        crate::debug_trace!("poll at {:?}: replaced={}, errors={}", now, replaced, errors);
        PollOutcome::Polled { replaced, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedError;
    use std::collections::VecDeque;
    use tapetwin_core::ControlPhase;

    /// Source that replays scripted responses, repeating the last one.
    #[derive(Default)]
    struct Scripted {
        states: VecDeque<FeedResult<Option<ExecutionSnapshot>>>,
        programs: VecDeque<FeedResult<Option<String>>>,
        inputs: VecDeque<FeedResult<Option<String>>>,
        program_fetches: u32,
    }

    impl StateSource for Scripted {
        fn fetch_state(&mut self) -> FeedResult<Option<ExecutionSnapshot>> {
            self.states.pop_front().unwrap_or(Ok(None))
        }

        fn fetch_program(&mut self) -> FeedResult<Option<String>> {
            self.program_fetches += 1;
            self.programs.pop_front().unwrap_or(Ok(None))
        }

        fn fetch_input(&mut self) -> FeedResult<Option<String>> {
            self.inputs.pop_front().unwrap_or(Ok(None))
        }
    }

    fn idle() -> ExecutionSnapshot {
        ExecutionSnapshot::with_control(ControlPhase::Idle)
    }

    #[test]
    fn clock_advances_and_saturates() {
        let mut clock = PollClock::new();
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.elapsed(), Duration::from_millis(5));
        let mut clock = PollClock::at(Duration::MAX);
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.elapsed(), Duration::MAX);
    }

    #[test]
    fn first_step_is_due_then_interval_gates() {
        let feed = MemoryFeed::new();
        let mut source = Scripted::default();
        let mut clock = PollClock::new();
        let mut poller = Poller::new(Duration::from_millis(100));
        assert_eq!(poller.next_due(), None);

        assert!(matches!(
            poller.step(&clock, &mut source, &feed),
            PollOutcome::Polled { .. }
        ));
        assert_eq!(poller.next_due(), Some(Duration::from_millis(100)));
        clock.advance(Duration::from_millis(99));
        assert_eq!(poller.step(&clock, &mut source, &feed), PollOutcome::NotDue);
        clock.advance(Duration::from_millis(1));
        assert!(matches!(
            poller.step(&clock, &mut source, &feed),
            PollOutcome::Polled { .. }
        ));
        assert_eq!(poller.stats().polls, 2);
    }

    #[test]
    fn unchanged_values_are_not_pushed_again() {
        let feed = MemoryFeed::new();
        let mut source = Scripted::default();
        source.states.extend([Ok(Some(idle())), Ok(Some(idle()))]);
        source.inputs.extend([Ok(Some("ab".into())), Ok(Some("ab".into()))]);
        let mut clock = PollClock::new();
        let mut poller = Poller::new(Duration::ZERO);

        assert_eq!(
            poller.step(&clock, &mut source, &feed),
            PollOutcome::Polled {
                replaced: 2,
                errors: 0
            }
        );
        clock.advance(Duration::from_millis(1));
        assert_eq!(
            poller.step(&clock, &mut source, &feed),
            PollOutcome::Polled {
                replaced: 0,
                errors: 0
            }
        );
        assert_eq!(poller.stats().replaced, 2);
    }

    #[test]
    fn errors_are_counted_and_keep_previous_value() {
        let feed = MemoryFeed::new();
        feed.set_input("kept");
        let mut source = Scripted::default();
        source
            .inputs
            .push_back(Err(FeedError::Transport("connection reset".into())));
        let mut poller = Poller::new(Duration::ZERO);

        assert_eq!(
            poller.step(&PollClock::new(), &mut source, &feed),
            PollOutcome::Polled {
                replaced: 0,
                errors: 1
            }
        );
        assert_eq!(feed.input_text().as_deref(), Some("kept"));
        assert_eq!(poller.stats().errors, 1);
    }

    #[test]
    fn sparse_feed_never_fetches_program() {
        let clock = PollClock::new();
        let feed = MemoryFeed::sparse();
        let mut source = Scripted::default();
        let mut poller = Poller::new(Duration::ZERO);
        poller.step(&clock, &mut source, &feed);
        assert_eq!(source.program_fetches, 0);

        let dense = MemoryFeed::new();
        poller.poll_now(&clock, &mut source, &dense);
        assert_eq!(source.program_fetches, 1);
    }

    #[test]
    fn interval_comes_from_config() {
        let config = TwinConfig::default().with_poll_interval(Duration::from_millis(40));
        assert_eq!(Poller::from_config(&config).interval(), Duration::from_millis(40));
    }
}

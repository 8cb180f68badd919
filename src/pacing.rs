//! Rate limiting for the inputs a host feeds into a [`Portal`](crate::Portal).
//!
//! Nothing here owns a timer. The host passes the current [`Instant`] on
//! every call and polls again from its own event loop.

use std::time::{Duration, Instant};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
pub const SCROLL_THROTTLE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub search_debounce: Duration,
    pub scroll_throttle: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            search_debounce: SEARCH_DEBOUNCE,
            scroll_throttle: SCROLL_THROTTLE,
        }
    }
}

/// Holds the latest value until no new value has arrived for `delay`.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.delay)
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.deadline().is_some_and(|deadline| now >= deadline);
        if due { self.flush() } else { None }
    }

    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }
}

/// Lets at most one value through per `interval`. The newest value offered
/// during the quiet period is kept and released by `poll`, so the final
/// scroll position is never lost.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_release: Option<Instant>,
    trailing: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_release: None,
            trailing: None,
        }
    }

    fn is_open(&self, now: Instant) -> bool {
        self.last_release
            .is_none_or(|last| now.duration_since(last) >= self.interval)
    }

    pub fn offer(&mut self, value: T, now: Instant) -> Option<T> {
        if self.is_open(now) {
            self.last_release = Some(now);
            self.trailing = None;
            Some(value)
        } else {
            self.trailing = Some(value);
            None
        }
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.trailing.is_some() && self.is_open(now) {
            self.last_release = Some(now);
            self.trailing.take()
        } else {
            None
        }
    }

    pub fn flush(&mut self) -> Option<T> {
        self.trailing.take()
    }
}

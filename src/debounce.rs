//! Trailing-edge debouncing.
//!
//! A [`Debouncer`] holds at most one pending commit. Every `push` drops the
//! previous timer handle (which clears it) and arms a new one, so a burst of
//! pushes yields a single commit carrying the last value.

use gloo_timers::callback::Timeout;
use std::rc::Rc;

/// Source of one-shot timers. Dropping the returned handle cancels the timer.
pub trait Clock {
    type Handle;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Self::Handle;
}

/// Timers backed by `setTimeout`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    type Handle = Timeout;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Timeout {
        Timeout::new(delay_ms, task)
    }
}

pub struct Debouncer<T: 'static, C: Clock = BrowserClock> {
    delay_ms: u32,
    clock: C,
    on_commit: Rc<dyn Fn(T)>,
    pending: Option<C::Handle>,
}

impl<T: 'static, C: Clock> Debouncer<T, C> {
    pub fn new(delay_ms: u32, clock: C, on_commit: impl Fn(T) + 'static) -> Self {
        Debouncer {
            delay_ms,
            clock,
            on_commit: Rc::new(on_commit),
            pending: None,
        }
    }

    /// Re-arm the countdown with `value` as the next commit.
    pub fn push(&mut self, value: T) {
        self.pending = None;
        let on_commit = self.on_commit.clone();
        let handle = self
            .clock
            .schedule(self.delay_ms, Box::new(move || on_commit(value)));
        self.pending = Some(handle);
    }

    /// Drop the pending commit, if any.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

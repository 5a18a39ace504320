//! Structured diagnostic events emitted during optimization.
//!
//! The [driver](crate::driver::FitDriver) routes one [`Event`] per outer
//! iteration (plus one per notable condition, such as the
//! positive-definiteness fallback) through an injected [`Observer`] sink.
//! The core never prints or holds global mutable state; presentation is the
//! sink's concern. [`LogObserver`] is a ready-made sink forwarding to the
//! [`log`] crate.

use std::fmt;

use log::{debug, warn};

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Per-iteration progress.
    Info,
    /// A recoverable condition the caller should know about, such as the
    /// positive-definiteness fallback or a reached iteration cap.
    Warning,
}

/// One structured diagnostic record.
#[derive(Debug, Clone)]
pub struct Event<T> {
    /// Severity of the event.
    pub level: Level,
    /// Outer iteration number (1-based).
    pub iter: usize,
    /// Total objective `f(x) + P(x)` after the iteration.
    pub objective: T,
    /// Stationarity measure of the penalized objective (∞-norm); see
    /// [`Penalty::stationarity`](crate::penalty::Penalty::stationarity).
    pub grad_norm: T,
    /// Step size accepted by the iteration.
    pub step_size: T,
    /// Optional short note (set on warnings).
    pub note: Option<String>,
}

/// Sink for diagnostic events, injected into the
/// [driver](crate::driver::FitBuilder::with_observer).
pub trait Observer<T> {
    /// Called after every outer iteration and for every warning.
    fn observe(&mut self, event: &Event<T>);

    /// Cooperative cancellation, checked once per outer iteration. When this
    /// returns `true` the driver stops and returns the best point found so
    /// far.
    fn should_abort(&self) -> bool {
        false
    }
}

/// Observer that forwards events to the [`log`] crate (`debug!` for
/// progress, `warn!` for warnings).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl<T: fmt::Display> Observer<T> for LogObserver {
    fn observe(&mut self, event: &Event<T>) {
        match event.level {
            Level::Info => debug!(
                "iter = {}\tfx = {}\tstationarity = {}\tstep = {}",
                event.iter, event.objective, event.grad_norm, event.step_size
            ),
            Level::Warning => warn!(
                "iter = {}: {}",
                event.iter,
                event.note.as_deref().unwrap_or("warning")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        seen: Vec<(Level, usize)>,
        abort_after: usize,
    }

    impl Observer<f64> for Recorder {
        fn observe(&mut self, event: &Event<f64>) {
            self.seen.push((event.level, event.iter));
        }

        fn should_abort(&self) -> bool {
            self.seen.len() >= self.abort_after
        }
    }

    #[test]
    fn observer_records_events() {
        let mut recorder = Recorder {
            seen: Vec::new(),
            abort_after: 1,
        };
        let event = Event {
            level: Level::Info,
            iter: 3,
            objective: 1.0,
            grad_norm: 0.5,
            step_size: 0.1,
            note: None,
        };
        recorder.observe(&event);
        assert_eq!(recorder.seen, vec![(Level::Info, 3)]);
        assert!(recorder.should_abort());
    }
}

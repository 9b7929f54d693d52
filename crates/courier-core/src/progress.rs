//! Activity indicator bracketing in-flight requests.
//!
//! The pipeline calls [`ProgressIndicator::start`] when a request has been
//! decorated and [`ProgressIndicator::done`] once its response (or transport
//! failure) has been handled. Exactly one `done` follows each `start`.
//!
//! [`ActivityIndicator`] is the stock implementation. It counts in-flight
//! requests, so overlapping requests keep it busy until the last one finishes:
//!
//! ```
//! use courier_core::progress::{ActivityIndicator, ProgressIndicator};
//!
//! let indicator = ActivityIndicator::new();
//! indicator.on_activity_changed().connect(|&busy| {
//!     println!("spinner {}", if busy { "on" } else { "off" });
//! });
//!
//! indicator.start(); // spinner on
//! indicator.start();
//! indicator.done();
//! assert!(indicator.is_active());
//! indicator.done(); // spinner off
//! assert!(!indicator.is_active());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::logging::targets;
use crate::signal::Signal;

/// A visual cue that brackets request activity.
pub trait ProgressIndicator: Send + Sync {
    /// A request has started.
    fn start(&self);

    /// A request has finished, successfully or not.
    fn done(&self);
}

struct ActivityIndicatorInner {
    in_flight: AtomicUsize,
    activity_changed: Signal<bool>,
    started: Signal<usize>,
    finished: Signal<usize>,
}

/// Reference-counted activity indicator.
///
/// `activity_changed(true)` fires on the idle to busy transition and
/// `activity_changed(false)` when the in-flight count returns to zero.
/// `started` and `finished` fire on every call with the count after it.
/// A `done` without a matching `start` is ignored.
#[derive(Clone)]
pub struct ActivityIndicator {
    inner: Arc<ActivityIndicatorInner>,
}

impl ActivityIndicator {
    /// Create an idle indicator.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ActivityIndicatorInner {
                in_flight: AtomicUsize::new(0),
                activity_changed: Signal::new(),
                started: Signal::new(),
                finished: Signal::new(),
            }),
        }
    }

    /// Number of requests currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Whether at least one request is in flight.
    pub fn is_active(&self) -> bool {
        self.in_flight() > 0
    }

    /// Emitted with `true` when the indicator becomes busy and `false` when it goes idle.
    pub fn on_activity_changed(&self) -> &Signal<bool> {
        &self.inner.activity_changed
    }

    /// Emitted on every `start` with the new in-flight count.
    pub fn on_started(&self) -> &Signal<usize> {
        &self.inner.started
    }

    /// Emitted on every balanced `done` with the new in-flight count.
    pub fn on_finished(&self) -> &Signal<usize> {
        &self.inner.finished
    }
}

impl ProgressIndicator for ActivityIndicator {
    fn start(&self) {
        let count = self.inner.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(target: targets::PROGRESS, in_flight = count, "activity started");

        self.inner.started.emit(count);
        if count == 1 {
            self.inner.activity_changed.emit(true);
        }
    }

    fn done(&self) {
        let previous = self.inner.in_flight.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
            n.checked_sub(1)
        });

        let Ok(previous) = previous else {
            tracing::debug!(target: targets::PROGRESS, "done() without matching start(), ignoring");
            return;
        };

        let count = previous - 1;
        tracing::trace!(target: targets::PROGRESS, in_flight = count, "activity finished");

        self.inner.finished.emit(count);
        if count == 0 {
            self.inner.activity_changed.emit(false);
        }
    }
}

impl Default for ActivityIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActivityIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityIndicator")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Indicator that does nothing. Used when no UI is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopIndicator;

impl ProgressIndicator for NoopIndicator {
    fn start(&self) {}

    fn done(&self) {}
}

static_assertions::assert_impl_all!(ActivityIndicator: Send, Sync);

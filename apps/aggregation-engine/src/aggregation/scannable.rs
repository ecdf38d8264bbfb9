//! Scannable Enumerator
//!
//! Wraps one consolidator and exposes a pull-based, thread-safe sequence
//! interface. The producer side calls [`ScannableEnumerator::update`]; the
//! consumer side drains with [`ScannableEnumerator::move_next`] /
//! [`ScannableEnumerator::current`]. Each enumerator has its own mutex, so
//! unrelated subscriptions never contend.
//!
//! Completed bars are announced out-of-band on an unbounded channel
//! supplied at subscription time, once per completed bar. Delivery is
//! at-least-once; consumers must drain idempotently.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::domain::market::{ConsolidatedData, InstrumentId, MarketData};
use crate::domain::time::TimeProvider;

use super::consolidators::{Consolidator, ConsolidatorError};

/// Sender half of the "new data available" notification channel.
pub type NewDataSender = mpsc::UnboundedSender<InstrumentId>;

/// Receiver half of the "new data available" notification channel.
pub type NewDataReceiver = mpsc::UnboundedReceiver<InstrumentId>;

/// Create a notification channel for [`ScannableEnumerator`] signals.
#[must_use]
pub fn new_data_channel() -> (NewDataSender, NewDataReceiver) {
    mpsc::unbounded_channel()
}

/// State mutated by the producer and consumer roles, behind one mutex.
struct Inner {
    consolidator: Box<dyn Consolidator>,
    queue: VecDeque<ConsolidatedData>,
    current: Option<ConsolidatedData>,
    detached: bool,
    disposed: bool,
}

/// Pull-based view over one subscription's consolidator.
///
/// State machine per period: Idle → Accumulating → BarReady → Idle.
/// `Detached` stops intake but keeps the drain side alive; `Disposed` is
/// terminal: every operation becomes a no-op returning `false`/`None`.
pub struct ScannableEnumerator {
    instrument: InstrumentId,
    period_based: bool,
    time_provider: Arc<dyn TimeProvider>,
    notify: NewDataSender,
    inner: Mutex<Inner>,
}

impl ScannableEnumerator {
    /// Wrap a consolidator for one subscription.
    ///
    /// `period_based` subscriptions are scanned against the time provider on
    /// every `move_next`, so an in-progress bar is flushed as soon as its
    /// period elapses even when no further data arrives.
    #[must_use]
    pub fn new(
        instrument: InstrumentId,
        consolidator: Box<dyn Consolidator>,
        period_based: bool,
        time_provider: Arc<dyn TimeProvider>,
        notify: NewDataSender,
    ) -> Self {
        Self {
            instrument,
            period_based,
            time_provider,
            notify,
            inner: Mutex::new(Inner {
                consolidator,
                queue: VecDeque::new(),
                current: None,
                detached: false,
                disposed: false,
            }),
        }
    }

    /// The instrument this enumerator serves.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    /// Feed one data point to the wrapped consolidator.
    ///
    /// No-op after detach or disposal. When the point completes a bar, the
    /// bar is buffered and the notification channel is signaled once.
    /// Consolidator errors are returned for the caller to log; the
    /// enumerator stays usable.
    pub fn update(&self, data: &MarketData) -> Result<(), ConsolidatorError> {
        let mut inner = self.inner.lock();
        if inner.disposed || inner.detached {
            return Ok(());
        }

        if let Some(completed) = inner.consolidator.update(data)? {
            inner.queue.push_back(completed);
            // Receiver may already be gone during teardown; that's fine.
            let _ = self.notify.send(self.instrument.clone());
        }
        Ok(())
    }

    /// Advance to the next available value.
    ///
    /// Period-based subscriptions always return `true` (the caller observes
    /// "no data yet" via a `None` [`Self::current`]), after first flushing
    /// any in-progress bar whose period has elapsed. Pass-through
    /// subscriptions return whether a point was dequeued. Returns `false`
    /// only after disposal.
    pub fn move_next(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.disposed {
            return false;
        }

        if self.period_based {
            let now = self.time_provider.current_utc();
            if let Some(flushed) = inner.consolidator.scan(now) {
                inner.queue.push_back(flushed);
            }
            inner.current = inner.queue.pop_front();
            true
        } else {
            inner.current = inner.queue.pop_front();
            inner.current.is_some()
        }
    }

    /// The value produced by the last [`Self::move_next`], if any.
    #[must_use]
    pub fn current(&self) -> Option<ConsolidatedData> {
        self.inner.lock().current.clone()
    }

    /// Stop accepting data while leaving buffered output drainable.
    ///
    /// Used by subscription removal: ownership is handed off to whichever
    /// consumer still holds the `Arc`, and `move_next`/`current` keep
    /// serving bars that completed (or flush on scan) before the detach.
    /// Idempotent.
    pub fn detach(&self) {
        self.inner.lock().detached = true;
    }

    /// Whether the enumerator has stopped accepting data.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.inner.lock().detached
    }

    /// Tear down the enumerator, discarding any buffered output.
    /// Idempotent; all later calls are no-ops.
    pub fn dispose(&self) {
        let mut inner = self.inner.lock();
        inner.detached = true;
        inner.disposed = true;
        inner.queue.clear();
        inner.current = None;
    }

    /// Whether the enumerator has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.lock().disposed
    }
}

// =============================================================================
// Tests
// =============================================================================

//! View-scoped fetch state.
//!
//! A [`ScopedSlot`] owns the value a view displays and at most one in-flight
//! fetch for it. Starting a new fetch or cancelling the scope aborts the
//! previous task, and an epoch check discards any result that still slips
//! through. Slots are independent: cancelling one never touches another.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::{AbortHandle, JoinHandle};

/// How a scoped fetch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// Superseded or cancelled; the result was dropped.
    Stale,
    /// Failed while still current; the previous value is kept.
    Failed,
}

#[derive(Debug)]
struct Slot<T> {
    epoch: u64,
    value: Option<T>,
    in_flight: Option<AbortHandle>,
}

#[derive(Debug)]
pub struct ScopedSlot<T> {
    inner: Arc<Mutex<Slot<T>>>,
}

impl<T> Clone for ScopedSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ScopedSlot<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Slot {
                epoch: 0,
                value: None,
                in_flight: None,
            })),
        }
    }
}

impl<T: Send + 'static> ScopedSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a fetch, superseding any fetch already running.
    ///
    /// `on_error` runs only if the failed fetch is still the current one.
    pub fn load<F, E, H>(&self, fetch: F, on_error: H) -> JoinHandle<FetchOutcome>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        E: Send + 'static,
        H: FnOnce(E) + Send + 'static,
    {
        let epoch = {
            let mut slot = self.lock();
            slot.epoch += 1;
            if let Some(previous) = slot.in_flight.take() {
                previous.abort();
            }
            slot.epoch
        };

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let result = fetch.await;
            let mut slot = inner.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.epoch != epoch {
                return FetchOutcome::Stale;
            }
            slot.in_flight = None;
            match result {
                Ok(value) => {
                    slot.value = Some(value);
                    FetchOutcome::Applied
                }
                Err(e) => {
                    drop(slot);
                    on_error(e);
                    FetchOutcome::Failed
                }
            }
        });

        let mut slot = self.lock();
        if slot.epoch == epoch {
            slot.in_flight = Some(handle.abort_handle());
        } else {
            handle.abort();
        }
        handle
    }

    /// Abort the running fetch (if any) and ignore its result.
    pub fn cancel(&self) {
        let mut slot = self.lock();
        slot.epoch += 1;
        if let Some(previous) = slot.in_flight.take() {
            previous.abort();
        }
    }

    pub fn is_loading(&self) -> bool {
        self.lock()
            .in_flight
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.lock().value.as_ref())
    }

    pub fn set(&self, value: Option<T>) {
        self.lock().value = value;
    }
}

impl<T: Clone + Send + 'static> ScopedSlot<T> {
    pub fn get(&self) -> Option<T> {
        self.lock().value.clone()
    }
}

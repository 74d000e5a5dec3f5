//! `StateChannel` — single-producer, single-consumer, latest-wins handoff.
//!
//! # Semantics
//!
//! The channel holds at most one item.  [`StateSender::add`] never blocks: it
//! stores the new item and drops whatever the consumer had not yet taken.
//! [`StateReceiver::remove`] blocks until an item is present and returns it,
//! so the consumer always gets the newest state and staleness is bounded by
//! one planning cycle.  Delivery is deliberately not FIFO.
//!
//! Closing the channel (explicitly, or by dropping the sender) wakes a parked
//! receiver.  A pending item is still handed over once; after that `remove`
//! returns `None`.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

struct Slot<T> {
    latest:    Option<T>,
    closed:    bool,
    discarded: u64,
}

struct Shared<T> {
    slot:  Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    // The slot is valid after any panic: every critical section is a single
    // field assignment or `Option::take`.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a connected sender/receiver pair.
pub fn state_channel<T>() -> (StateSender<T>, StateReceiver<T>) {
    let shared = Arc::new(Shared {
        slot:  Mutex::new(Slot { latest: None, closed: false, discarded: 0 }),
        ready: Condvar::new(),
    });
    (
        StateSender { shared: Arc::clone(&shared) },
        StateReceiver { shared },
    )
}

// ── Sender ────────────────────────────────────────────────────────────────────

/// Producer half.  Dropping it closes the channel.
pub struct StateSender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> StateSender<T> {
    /// Publish `item`, replacing any item not yet removed.
    ///
    /// Items added after [`close`][Self::close] are dropped.
    pub fn add(&self, item: T) {
        self.add_merged(item, |_stale, fresh| fresh);
    }

    /// Publish `item`, combining it with an item not yet removed.
    ///
    /// `merge(pending, item)` decides what the consumer will see.  A merge
    /// that simply returns `item` is exactly [`add`][Self::add].
    pub fn add_merged(&self, item: T, merge: impl FnOnce(T, T) -> T) {
        let mut slot = self.shared.lock();
        if slot.closed {
            return;
        }
        let next = match slot.latest.take() {
            Some(pending) => {
                slot.discarded += 1;
                merge(pending, item)
            }
            None => item,
        };
        slot.latest = Some(next);
        drop(slot);
        self.shared.ready.notify_one();
    }

    /// Close the channel and wake the receiver.  Idempotent.
    pub fn close(&self) {
        self.shared.lock().closed = true;
        self.shared.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// How many items were superseded before the consumer took them.
    pub fn discarded(&self) -> u64 {
        self.shared.lock().discarded
    }
}

impl<T> Drop for StateSender<T> {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Receiver ──────────────────────────────────────────────────────────────────

/// Consumer half.
pub struct StateReceiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> StateReceiver<T> {
    /// Block until an item is available and return the newest one.
    ///
    /// Returns `None` once the channel is closed and drained.
    pub fn remove(&self) -> Option<T> {
        let mut slot = self.shared.lock();
        loop {
            if let Some(item) = slot.latest.take() {
                return Some(item);
            }
            if slot.closed {
                return None;
            }
            slot = self
                .shared
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`remove`][Self::remove] but gives up after `timeout`.
    pub fn remove_timeout(&self, timeout: Duration) -> Option<T> {
        let slot = self.shared.lock();
        let (mut slot, _) = self
            .shared
            .ready
            .wait_timeout_while(slot, timeout, |s| s.latest.is_none() && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        slot.latest.take()
    }

    /// Take the pending item without blocking.
    pub fn try_remove(&self) -> Option<T> {
        self.shared.lock().latest.take()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// How many items were superseded before this receiver took them.
    pub fn discarded(&self) -> u64 {
        self.shared.lock().discarded
    }
}

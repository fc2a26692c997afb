//! Growable table of call state records indexed by session slot.
//!
//! # Design
//! The table itself is the only structure shared between worker threads and
//! sits behind one mutex, held while growing and while looking a slot up.
//! Each record lives in its own `Arc<Mutex<_>>`; the embedding engine gives a
//! slot to a single worker per transaction, so the record lock is never
//! contended in correct use and a slow call on one slot never stalls lookups
//! on the others. Records are reset and reused, never freed.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::record::{CallState, TransactionId};

/// Pre-allocated capacity when none is configured.
pub const DEFAULT_SLOTS: usize = 256;

pub struct SlotPool {
    slots: Mutex<Vec<Arc<Mutex<CallState>>>>,
}

impl SlotPool {
    /// Create a pool with `initial` cleared records (at least one).
    pub fn new(initial: usize) -> Self {
        let mut slots = Vec::new();
        grow(&mut slots, initial.max(1));
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Number of slots currently backed by a record.
    pub fn capacity(&self) -> usize {
        self.slots.lock().len()
    }

    /// Look up the record of `slot` for transaction `xid`.
    ///
    /// Grows the table by doubling until `slot` fits. If the record was last
    /// used by another transaction it is reset before being handed out.
    pub fn acquire(&self, slot: usize, xid: TransactionId) -> SlotHandle {
        let record = {
            let mut slots = self.slots.lock();
            if slots.len() <= slot {
                let mut target = slots.len();
                while target <= slot {
                    target *= 2;
                }
                debug!(from = slots.len(), to = target, "growing slot pool");
                grow(&mut slots, target);
            }
            Arc::clone(&slots[slot])
        };

        if record.lock().claim(xid) {
            debug!(slot, xid, "slot claimed by new transaction");
        }
        SlotHandle { slot, record }
    }
}

impl Default for SlotPool {
    fn default() -> Self {
        Self::new(DEFAULT_SLOTS)
    }
}

fn grow(slots: &mut Vec<Arc<Mutex<CallState>>>, len: usize) {
    slots.reserve(len.saturating_sub(slots.len()));
    while slots.len() < len {
        slots.push(Arc::new(Mutex::new(CallState::default())));
    }
}

/// Access to one slot's record for the remainder of a transaction.
#[derive(Clone)]
pub struct SlotHandle {
    slot: usize,
    record: Arc<Mutex<CallState>>,
}

impl SlotHandle {
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn lock(&self) -> MutexGuard<'_, CallState> {
        self.record.lock()
    }
}

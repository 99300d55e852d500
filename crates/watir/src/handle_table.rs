//! Session-wide arena of located native references.
//!
//! Every element handle owns a slot. Clones of a handle share the slot, so a
//! relocation through one clone is visible to all of them. The slot is freed
//! when the last clone drops. The table lock is only held for slot reads and
//! writes, never across a driver call.

use crate::driver::NativeRef;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

#[derive(Debug, Default)]
struct Slots {
    entries: Vec<Option<NativeRef>>,
    live: Vec<bool>,
    free: Vec<usize>,
}

/// Arena of cached native references
#[derive(Debug, Default)]
pub(crate) struct HandleTable {
    slots: Mutex<Slots>,
}

impl HandleTable {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim a slot, optionally pre-filled
    pub(crate) fn allocate(self: &Arc<Self>, initial: Option<NativeRef>) -> Slot {
        let mut slots = self.lock();
        let id = match slots.free.pop() {
            Some(id) => {
                slots.entries[id] = initial;
                slots.live[id] = true;
                id
            }
            None => {
                slots.entries.push(initial);
                slots.live.push(true);
                slots.entries.len() - 1
            }
        };
        Slot {
            id,
            table: Arc::downgrade(self),
        }
    }

    fn get(&self, id: usize) -> Option<NativeRef> {
        self.lock().entries.get(id).cloned().flatten()
    }

    fn set(&self, id: usize, native: Option<NativeRef>) {
        if let Some(entry) = self.lock().entries.get_mut(id) {
            *entry = native;
        }
    }

    fn release(&self, id: usize) {
        let mut slots = self.lock();
        if slots.live.get(id).copied().unwrap_or(false) {
            slots.entries[id] = None;
            slots.live[id] = false;
            slots.free.push(id);
        }
    }

    /// Slots currently owned by a handle
    #[cfg(test)]
    pub(crate) fn live_count(&self) -> usize {
        self.lock().live.iter().filter(|l| **l).count()
    }
}

/// One handle's claim on the table. Freed on drop.
#[derive(Debug)]
pub(crate) struct Slot {
    id: usize,
    table: Weak<HandleTable>,
}

impl Slot {
    pub(crate) fn get(&self) -> Option<NativeRef> {
        self.table.upgrade().and_then(|t| t.get(self.id))
    }

    pub(crate) fn set(&self, native: Option<NativeRef>) {
        if let Some(table) = self.table.upgrade() {
            table.set(self.id, native);
        }
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.release(self.id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_get_set() {
        let table = HandleTable::new();
        let slot = table.allocate(Some(NativeRef::new("a")));
        assert_eq!(slot.get(), Some(NativeRef::new("a")));
        slot.set(None);
        assert_eq!(slot.get(), None);
        assert_eq!(table.live_count(), 1);
    }

    #[test]
    fn test_drop_frees_and_reuses() {
        let table = HandleTable::new();
        let first = table.allocate(Some(NativeRef::new("a")));
        let id = first.id;
        drop(first);
        assert_eq!(table.live_count(), 0);
        let second = table.allocate(None);
        assert_eq!(second.id, id);
        assert_eq!(second.get(), None);
    }

    #[test]
    fn test_shared_slot_is_released_by_last_owner() {
        let table = HandleTable::new();
        let shared = Arc::new(table.allocate(None));
        let clone = Arc::clone(&shared);
        clone.set(Some(NativeRef::new("x")));
        assert_eq!(shared.get(), Some(NativeRef::new("x")));
        drop(shared);
        assert_eq!(table.live_count(), 1);
        drop(clone);
        assert_eq!(table.live_count(), 0);
    }

    #[test]
    fn test_slot_outliving_table_is_inert() {
        let table = HandleTable::new();
        let slot = table.allocate(Some(NativeRef::new("a")));
        drop(table);
        assert_eq!(slot.get(), None);
        slot.set(Some(NativeRef::new("b")));
    }
}

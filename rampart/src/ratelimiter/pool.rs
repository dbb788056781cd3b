//! Fixed capacity arena holding the rate limiter entries
//!
//! Entries are addressed by index. Freed slots go onto a free list and are reused before the
//! arena grows; it never grows past its capacity.

use rampart_util::time::Timestamp;

use crate::address::AddrKey;

/// Index of an entry in an [EntryPool]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryIdx(u32);

impl EntryIdx {
    fn get(self) -> usize {
        self.0 as usize
    }
}

/// Token bucket of a single source address
#[derive(Clone, Debug)]
pub struct Entry {
    pub key: AddrKey,
    pub tokens: u64,
    pub last_update: Timestamp,
    /// Next entry in the same bucket
    pub next: Option<EntryIdx>,
}

#[derive(Debug)]
pub struct EntryPool {
    slots: Vec<Option<Entry>>,
    free: Vec<EntryIdx>,
    live: usize,
    capacity: usize,
}

impl EntryPool {
    /// Creates an empty pool; `capacity` must fit into 32 bits
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            capacity: capacity.min(u32::MAX as usize),
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stores `entry`; returns `None` if the pool is exhausted
    pub fn alloc(&mut self, entry: Entry) -> Option<EntryIdx> {
        let idx = match self.free.pop() {
            Some(idx) => {
                *self.slots.get_mut(idx.get())? = Some(entry);
                idx
            }
            None if self.slots.len() < self.capacity => {
                let idx = EntryIdx(u32::try_from(self.slots.len()).ok()?);
                self.slots.push(Some(entry));
                idx
            }
            None => return None,
        };
        self.live += 1;
        Some(idx)
    }

    /// Frees the entry at `idx`, returning it; double frees are detected and return `None`
    pub fn free(&mut self, idx: EntryIdx) -> Option<Entry> {
        let entry = self.slots.get_mut(idx.get())?.take()?;
        self.free.push(idx);
        self.live -= 1;
        Some(entry)
    }

    pub fn get(&self, idx: EntryIdx) -> Option<&Entry> {
        self.slots.get(idx.get())?.as_ref()
    }

    pub fn get_mut(&mut self, idx: EntryIdx) -> Option<&mut Entry> {
        self.slots.get_mut(idx.get())?.as_mut()
    }

    /// Frees every entry at once
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }
}

//! The table of pending transactions.

use std::num::{NonZeroU32, NonZeroU64};
use std::{cmp, fmt};

/// The position of the slot index within the value of a transaction ID.
const SLOT_SHIFT: u32 = 32;

//------------ TransactionId -------------------------------------------------

/// The identifier of a transaction.
///
/// Identifiers are handed out by a context when a query is issued and are
/// passed to the query's callback. An identifier only ever matches a
/// transaction of the context that issued it and only while that
/// transaction is pending. Once it has completed or was cancelled, the
/// identifier is dead for good.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TransactionId {
    /// The serial of the issuing context.
    serial: u64,

    /// The slot index and the generation.
    value: NonZeroU64,
}

impl TransactionId {
    fn new(serial: u64, slot: u16, generation: NonZeroU32) -> Self {
        TransactionId {
            serial,
            value: NonZeroU64::from(generation)
                | u64::from(slot) << SLOT_SHIFT,
        }
    }

    /// Returns the raw value of the identifier.
    ///
    /// The value is never zero. It is unique among the transactions of the
    /// issuing context but different contexts hand out the same values.
    pub fn to_u64(self) -> u64 {
        self.value.get()
    }

    fn serial(self) -> u64 {
        self.serial
    }

    fn slot(self) -> usize {
        (self.value.get() >> SLOT_SHIFT) as u16 as usize
    }

    fn generation(self) -> u32 {
        self.value.get() as u32
    }

    #[cfg(test)]
    pub(crate) fn for_test(generation: u32) -> Self {
        Self::new(
            0,
            0,
            NonZeroU32::new(generation).unwrap_or(NonZeroU32::MIN),
        )
    }
}

//--- From

impl From<TransactionId> for u64 {
    fn from(id: TransactionId) -> u64 {
        id.to_u64()
    }
}

//--- Display and Debug

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "TransactionId({}:{}:{})",
            self.serial(),
            self.slot(),
            self.generation()
        )
    }
}

//------------ TransactionTable ----------------------------------------------

/// The pending transactions of a context.
///
/// This is a slot table. The slot index and the generation the slot was
/// filled in make up the transaction ID, so a stale ID never finds a
/// later occupant of its slot.
///
/// This is generic over the entry type for easier testing.
#[derive(Debug)]
pub(crate) struct TransactionTable<T> {
    /// The serial of the owning context.
    serial: u64,

    /// The generation of the last inserted entry.
    generation: u32,

    /// The number of elements in `vec` that are not None.
    count: usize,

    /// Index in `vec` where to look for a space for a new entry.
    curr: usize,

    vec: Vec<Option<Slot<T>>>,
}

#[derive(Debug)]
struct Slot<T> {
    generation: NonZeroU32,
    item: T,
}

impl<T> TransactionTable<T> {
    /// Creates a new empty table for the context with the given serial.
    pub fn new(serial: u64) -> Self {
        Self {
            serial,
            generation: 0,
            count: 0,
            curr: 0,
            vec: Vec::new(),
        }
    }

    /// Returns the number of pending transactions.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Inserts a new entry.
    ///
    /// Upon success, returns the ID of the new transaction. Upon error,
    /// which means the table is full, returns the entry.
    pub fn insert(&mut self, item: T) -> Result<TransactionId, T> {
        // The slot index has to fit in an u16 and we want to keep the
        // vector half empty, so we are full once 2*count > u16::MAX.
        if 2 * self.count > u16::MAX.into() {
            return Err(item);
        }

        // If more than half the vec is empty, look for an empty slot.
        let idx = if self.vec.len() >= 2 * self.count {
            (self.curr..self.vec.len()).find(|&idx| self.vec[idx].is_none())
        } else {
            None
        };

        let generation = self.next_generation();
        let slot = Some(Slot { generation, item });
        let idx = match idx {
            Some(idx) => {
                self.vec[idx] = slot;
                idx
            }
            None => {
                self.vec.push(slot);
                self.vec.len() - 1
            }
        };

        self.count += 1;
        if idx == self.curr {
            self.curr += 1;
        }
        Ok(TransactionId::new(self.serial, idx as u16, generation))
    }

    /// Returns whether the transaction is pending.
    pub fn contains(&self, id: TransactionId) -> bool {
        self.find(id).is_some()
    }

    /// Returns a mutable reference to a pending transaction's entry.
    pub fn get_mut(&mut self, id: TransactionId) -> Option<&mut T> {
        let idx = self.find(id)?;
        self.vec[idx].as_mut().map(|slot| &mut slot.item)
    }

    /// Tries to remove and return the entry of a transaction.
    ///
    /// Returns `None` if the transaction isn't pending.
    pub fn remove(&mut self, id: TransactionId) -> Option<T> {
        let idx = self.find(id)?;
        let res = self.vec[idx].take()?;
        self.count = self.count.saturating_sub(1);
        self.curr = cmp::min(self.curr, idx);
        Some(res.item)
    }

    /// Removes all entries and returns an iterator over them.
    pub fn drain(&mut self) -> impl Iterator<Item = (TransactionId, T)> + '_ {
        let serial = self.serial;
        self.count = 0;
        self.curr = 0;
        self.vec.drain(..).enumerate().filter_map(move |(idx, slot)| {
            slot.map(|slot| {
                (
                    TransactionId::new(serial, idx as u16, slot.generation),
                    slot.item,
                )
            })
        })
    }

    /// Returns the index of a pending transaction's slot.
    fn find(&self, id: TransactionId) -> Option<usize> {
        if id.serial() != self.serial {
            return None;
        }
        let idx = id.slot();
        match self.vec.get(idx)? {
            Some(slot) if slot.generation.get() == id.generation() => {
                Some(idx)
            }
            _ => None,
        }
    }

    /// Advances the generation, skipping zero on wrap-around.
    fn next_generation(&mut self) -> NonZeroU32 {
        self.generation = self.generation.wrapping_add(1);
        match NonZeroU32::new(self.generation) {
            Some(generation) => generation,
            None => {
                self.generation = 1;
                NonZeroU32::MIN
            }
        }
    }
}

//============ Tests =========================================================

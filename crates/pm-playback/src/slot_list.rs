//! Fast Slot List
//!
//! Index-stable storage for active playbacks. Occupied slots never move, so a
//! slot index is a valid handle for as long as the value lives, and clearing
//! a slot during a forward scan over indices is safe.
//!
//! Free slots are found from a cursor that only moves forward and wraps at
//! the end, so under steady play/finish churn a free slot is usually found
//! on the first check. The list grows (doubling) only when a full wrap found
//! nothing.

/// Default slot capacity
pub const DEFAULT_SLOT_CAPACITY: usize = 64;

/// Dense, index-stable container with O(1) free-slot reuse
#[derive(Debug, Clone)]
pub struct FastSlotList<T> {
    slots: Vec<Option<T>>,
    /// Next index to check for a free slot
    cursor: usize,
    /// Occupied slot count
    len: usize,
}

impl<T> FastSlotList<T> {
    /// Create a list with `capacity` empty slots (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            cursor: 0,
            len: 0,
        }
    }

    /// Store `value` in a free slot and return its index
    pub fn insert(&mut self, value: T) -> usize {
        let index = self.free_index();
        self.slots[index] = Some(value);
        self.len += 1;
        self.cursor = index + 1;
        index
    }

    /// Clear a slot, returning its value
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let value = self.slots.get_mut(index)?.take();
        if value.is_some() {
            self.len -= 1;
        }
        value
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Check if a slot is occupied
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Occupied slot count
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total slot count (occupied + free)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterate occupied slots as `(index, value)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (i, v)))
    }

    /// Iterate occupied slots mutably as `(index, value)`
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|v| (i, v)))
    }

    /// Clear every slot, keeping the capacity
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.len = 0;
        self.cursor = 0;
    }

    fn free_index(&mut self) -> usize {
        if self.len < self.slots.len() {
            let capacity = self.slots.len();
            let start = self.cursor.min(capacity);

            // Forward from the cursor, then wrap around
            let order = (start..capacity).chain(0..start);
            for i in order {
                if self.slots[i].is_none() {
                    return i;
                }
            }
        }

        self.grow()
    }

    fn grow(&mut self) -> usize {
        let old = self.slots.len();
        self.slots.resize_with(old * 2, || None);
        log::debug!("slot list grown: {} -> {}", old, self.slots.len());
        old
    }
}

impl<T> Default for FastSlotList<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SLOT_CAPACITY)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut list = FastSlotList::with_capacity(4);
        let a = list.insert("a");
        let b = list.insert("b");

        assert_eq!(list.len(), 2);
        assert_eq!(list.get(a), Some(&"a"));
        assert_eq!(list.get(b), Some(&"b"));

        assert_eq!(list.remove(a), Some("a"));
        assert_eq!(list.remove(a), None);
        assert!(!list.contains(a));
        assert!(list.contains(b));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_indices_are_stable() {
        let mut list = FastSlotList::with_capacity(4);
        let ids: Vec<_> = (0..4).map(|i| list.insert(i)).collect();
        list.remove(ids[1]);

        // Remaining values stay where they were
        assert_eq!(list.get(ids[0]), Some(&0));
        assert_eq!(list.get(ids[2]), Some(&2));
        assert_eq!(list.get(ids[3]), Some(&3));
    }

    #[test]
    fn test_cursor_advances_before_reusing() {
        let mut list = FastSlotList::with_capacity(4);
        let first = list.insert(0);
        list.remove(first);

        // Freed slot 0 is behind the cursor; the next insert goes forward
        assert_eq!(list.insert(1), 1);
        assert_eq!(list.insert(2), 2);
        assert_eq!(list.insert(3), 3);

        // Cursor reached the end: wrap finds slot 0
        assert_eq!(list.insert(4), 0);
        assert_eq!(list.capacity(), 4);
    }

    #[test]
    fn test_grows_only_when_full() {
        let mut list = FastSlotList::with_capacity(2);
        list.insert(0);
        list.insert(1);
        assert_eq!(list.capacity(), 2);

        let index = list.insert(2);
        assert_eq!(index, 2);
        assert_eq!(list.capacity(), 4);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_remove_during_index_scan() {
        let mut list = FastSlotList::with_capacity(8);
        for i in 0..8 {
            list.insert(i);
        }

        for index in 0..list.capacity() {
            if list.get(index).is_some_and(|v| v % 2 == 0) {
                list.remove(index);
            }
        }

        let left: Vec<_> = list.iter().map(|(_, v)| *v).collect();
        assert_eq!(left, vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_clear() {
        let mut list = FastSlotList::with_capacity(4);
        list.insert(1);
        list.insert(2);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.insert(3), 0);
    }

    #[test]
    fn test_out_of_range() {
        let mut list: FastSlotList<u8> = FastSlotList::with_capacity(2);
        assert!(list.get(100).is_none());
        assert!(list.remove(100).is_none());
        assert!(!list.contains(100));
    }
}

//! Recency list: a doubly linked list laid out in a slot arena.
//!
//! Nodes are addressed by their slot index, which stays stable for as long
//! as the node is linked. Unlinked slots go on a free list and are reused by
//! the next `push_front`, so a list that stays at a fixed length never
//! allocates again.

enum Slot<T> {
    Occupied {
        value: T,
        /// Towards the front (more recent)
        prev: Option<usize>,
        /// Towards the back (older)
        next: Option<usize>,
    },
    Vacant {
        next_free: Option<usize>,
    },
}

pub struct RecencyList<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    front: Option<usize>,
    back: Option<usize>,
    len: usize,
}

impl<T> RecencyList<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            front: None,
            back: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, slot: usize) -> Option<&T> {
        match self.slots.get(slot) {
            Some(Slot::Occupied { value, .. }) => Some(value),
            _ => None,
        }
    }

    /// Insert a value as the most recent entry, returning its slot
    pub fn push_front(&mut self, value: T) -> usize {
        let node = Slot::Occupied {
            value,
            prev: None,
            next: self.front,
        };

        let slot = match self.free_head {
            Some(slot) => {
                if let Slot::Vacant { next_free } = self.slots[slot] {
                    self.free_head = next_free;
                }
                self.slots[slot] = node;
                slot
            }
            None => {
                self.slots.push(node);
                self.slots.len() - 1
            }
        };

        match self.front {
            Some(old_front) => self.set_prev(old_front, Some(slot)),
            None => self.back = Some(slot),
        }
        self.front = Some(slot);
        self.len += 1;
        slot
    }

    /// Relink an occupied slot at the front. Returns false if the slot is vacant
    pub fn move_to_front(&mut self, slot: usize) -> bool {
        if self.get(slot).is_none() {
            return false;
        }
        if self.front == Some(slot) {
            return true;
        }

        self.unlink(slot);
        let old_front = self.front;
        if let Some(Slot::Occupied { prev, next, .. }) = self.slots.get_mut(slot) {
            *prev = None;
            *next = old_front;
        }
        match old_front {
            Some(old_front) => self.set_prev(old_front, Some(slot)),
            None => self.back = Some(slot),
        }
        self.front = Some(slot);
        true
    }

    /// Remove the value in `slot`, freeing the slot for reuse
    pub fn remove(&mut self, slot: usize) -> Option<T> {
        self.get(slot)?;
        self.unlink(slot);

        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        self.free_head = Some(slot);
        self.len -= 1;

        match std::mem::replace(&mut self.slots[slot], vacant) {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    /// Remove the least recent entry
    pub fn pop_back(&mut self) -> Option<T> {
        let back = self.back?;
        self.remove(back)
    }

    /// Iterate from the back (least recent) to the front (most recent)
    pub fn iter_oldest_first(&self) -> OldestFirst<'_, T> {
        OldestFirst {
            list: self,
            cursor: self.back,
            remaining: self.len,
        }
    }

    /// Detach an occupied slot from its neighbours, fixing up front/back
    fn unlink(&mut self, slot: usize) {
        let (prev, next) = match self.slots[slot] {
            Slot::Occupied { prev, next, .. } => (prev, next),
            Slot::Vacant { .. } => return,
        };

        match prev {
            Some(prev) => self.set_next(prev, next),
            None => self.front = next,
        }
        match next {
            Some(next) => self.set_prev(next, prev),
            None => self.back = prev,
        }
    }

    fn set_prev(&mut self, slot: usize, to: Option<usize>) {
        if let Slot::Occupied { prev, .. } = &mut self.slots[slot] {
            *prev = to;
        }
    }

    fn set_next(&mut self, slot: usize, to: Option<usize>) {
        if let Slot::Occupied { next, .. } = &mut self.slots[slot] {
            *next = to;
        }
    }
}

pub struct OldestFirst<'a, T> {
    list: &'a RecencyList<T>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for OldestFirst<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let list = self.list;
        match &list.slots[slot] {
            Slot::Occupied { value, prev, .. } => {
                self.cursor = *prev;
                self.remaining -= 1;
                Some(value)
            }
            Slot::Vacant { .. } => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for OldestFirst<'_, T> {}

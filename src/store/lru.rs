//! LRU Arena Module
//!
//! Doubly-linked recency list backed by an index-based arena.
//!
//! Slots carry explicit `prev`/`next` indices instead of references, so
//! the list needs no pointer cycles and removed slots are recycled
//! through a free list. Front = most recently used, back = least.
//! Generic over the payload: the node store keeps full cache entries
//! here, the key-distribution tracker keeps its bounded samples.

/// Sentinel index marking the absence of a neighbor.
const NIL: usize = usize::MAX;

// == Slot ==
#[derive(Debug)]
struct Slot<T> {
    prev: usize,
    next: usize,
    data: Option<T>,
}

// == LRU Arena ==
/// Index-based doubly-linked LRU list.
///
/// Callers hold slot indices (typically in a map keyed by cache key) and
/// use them for O(1) touch and removal.
#[derive(Debug)]
pub struct LruArena<T> {
    slots: Vec<Slot<T>>,
    head: usize,
    tail: usize,
    free: Vec<usize>,
    len: usize,
}

impl<T> Default for LruArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LruArena<T> {
    // == Constructor ==
    /// Creates a new empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: NIL,
            tail: NIL,
            free: Vec::new(),
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts a payload at the front (most recently used) and returns
    /// its slot index.
    pub fn push_front(&mut self, data: T) -> usize {
        let index = match self.free.pop() {
            Some(recycled) => {
                self.slots[recycled].data = Some(data);
                recycled
            }
            None => {
                self.slots.push(Slot {
                    prev: NIL,
                    next: NIL,
                    data: Some(data),
                });
                self.slots.len() - 1
            }
        };
        self.link_front(index);
        self.len += 1;
        index
    }

    // == Move To Front ==
    /// Marks a slot as most recently used.
    pub fn move_to_front(&mut self, index: usize) {
        if index == self.head || !self.is_occupied(index) {
            return;
        }
        self.unlink(index);
        self.link_front(index);
    }

    // == Remove ==
    /// Removes a slot and returns its payload, or None if the index is
    /// vacant.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if !self.is_occupied(index) {
            return None;
        }
        self.unlink(index);
        self.free.push(index);
        self.len -= 1;
        self.slots[index].data.take()
    }

    // == Pop Back ==
    /// Removes and returns the least recently used payload.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.tail == NIL {
            return None;
        }
        self.remove(self.tail)
    }

    // == Back ==
    /// Slot index of the least recently used payload.
    pub fn back(&self) -> Option<usize> {
        if self.tail == NIL {
            None
        } else {
            Some(self.tail)
        }
    }

    // == Prev Toward Front ==
    /// Steps from a slot one position toward the front (more recent).
    pub fn prev_toward_front(&self, index: usize) -> Option<usize> {
        if !self.is_occupied(index) || self.slots[index].prev == NIL {
            None
        } else {
            Some(self.slots[index].prev)
        }
    }

    // == Accessors ==
    /// Shared access to a slot's payload.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(|slot| slot.data.as_ref())
    }

    /// Mutable access to a slot's payload.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(|slot| slot.data.as_mut())
    }

    /// Number of live payloads.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Internal Linking ==
    fn is_occupied(&self, index: usize) -> bool {
        index < self.slots.len() && self.slots[index].data.is_some()
    }

    fn link_front(&mut self, index: usize) {
        self.slots[index].prev = NIL;
        self.slots[index].next = self.head;
        if self.head != NIL {
            self.slots[self.head].prev = index;
        }
        self.head = index;
        if self.tail == NIL {
            self.tail = index;
        }
    }

    fn unlink(&mut self, index: usize) {
        let (prev, next) = (self.slots[index].prev, self.slots[index].next);
        if prev != NIL {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }
        self.slots[index].prev = NIL;
        self.slots[index].next = NIL;
    }
}

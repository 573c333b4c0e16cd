use core::fmt;

/// Link value marking the absence of a neighbour (or the end of the free list).
const NIL: usize = usize::MAX;

/// Stable reference to an element of a [`List`].
///
/// A handle stays valid until the element it names is removed from the list.
/// Slots of removed elements are recycled, so a stale handle may later name a
/// different element; the owner of the list is responsible for dropping
/// handles together with the elements they refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Handle(usize);

/// A node in the doubly linked list.
struct Node<T> {
    val: T,
    prev: usize,
    next: usize,
}

/// One cell of the arena backing the list.
enum Slot<T> {
    Occupied(Node<T>),
    Vacant { next_free: usize },
}

/// A doubly linked list stored in a growable arena.
///
/// Elements live in a `Vec` of slots and are linked by slot index rather than
/// by pointer, so relinking an element is O(1) and never moves its value.
/// Vacated slots are threaded onto a free list and reused by later pushes.
///
/// The front of the list is the most recently pushed (or moved) element and
/// the back is the oldest one.
///
/// # Examples
///
/// ```ignore
/// let mut list = List::new();
/// let a = list.push_front(10);
/// list.push_front(20);
///
/// list.move_to_front(a);
/// assert_eq!(list.front(), Some(&10));
/// assert_eq!(list.back(), Some(&20));
/// ```
pub(crate) struct List<T> {
    slots: Vec<Slot<T>>,
    head: usize,
    tail: usize,
    free: usize,
    len: usize,
}

impl<T> List<T> {
    /// Creates an empty list.
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` elements before the
    /// arena has to grow.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        List {
            slots: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            free: NIL,
            len: 0,
        }
    }

    /// Returns the number of elements in the list.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list contains no elements.
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn node(&self, idx: usize) -> Option<&Node<T>> {
        match self.slots.get(idx) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<T>> {
        match self.slots.get_mut(idx) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    fn set_next(&mut self, idx: usize, next: usize) {
        if idx == NIL {
            self.head = next;
        } else if let Some(node) = self.node_mut(idx) {
            node.next = next;
        }
    }

    fn set_prev(&mut self, idx: usize, prev: usize) {
        if idx == NIL {
            self.tail = prev;
        } else if let Some(node) = self.node_mut(idx) {
            node.prev = prev;
        }
    }

    /// Unlinks the node at `idx` from its neighbours, leaving it in its slot.
    fn detach(&mut self, idx: usize) {
        let Some(node) = self.node(idx) else {
            return;
        };
        let (prev, next) = (node.prev, node.next);
        self.set_next(prev, next);
        self.set_prev(next, prev);
    }

    /// Links the (already detached) node at `idx` in front of the current head.
    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(idx) {
            node.prev = NIL;
            node.next = old_head;
        }
        self.set_prev(old_head, idx);
        self.head = idx;
    }

    /// Pushes a value to the front of the list and returns its handle.
    pub(crate) fn push_front(&mut self, val: T) -> Handle {
        let node = Node {
            val,
            prev: NIL,
            next: NIL,
        };

        let idx = if self.free != NIL {
            let idx = self.free;
            if let Slot::Vacant { next_free } = &self.slots[idx] {
                self.free = *next_free;
            }
            self.slots[idx] = Slot::Occupied(node);
            idx
        } else {
            self.slots.push(Slot::Occupied(node));
            self.slots.len() - 1
        };

        self.attach_front(idx);
        self.len += 1;
        Handle(idx)
    }

    /// Removes the element named by `handle` and returns its value.
    ///
    /// Returns `None` if the handle does not name a live element.
    pub(crate) fn remove(&mut self, handle: Handle) -> Option<T> {
        let idx = handle.0;
        self.node(idx)?;
        self.detach(idx);

        let slot = core::mem::replace(
            &mut self.slots[idx],
            Slot::Vacant {
                next_free: self.free,
            },
        );
        self.free = idx;
        self.len -= 1;

        match slot {
            Slot::Occupied(node) => Some(node.val),
            Slot::Vacant { .. } => None,
        }
    }

    /// Removes the back (oldest) element of the list.
    pub(crate) fn pop_back(&mut self) -> Option<T> {
        if self.tail == NIL {
            return None;
        }
        self.remove(Handle(self.tail))
    }

    /// Moves the element named by `handle` to the front of the list.
    pub(crate) fn move_to_front(&mut self, handle: Handle) {
        let idx = handle.0;
        if idx == self.head || self.node(idx).is_none() {
            return;
        }
        self.detach(idx);
        self.attach_front(idx);
    }

    /// Returns a reference to the element named by `handle`.
    pub(crate) fn get(&self, handle: Handle) -> Option<&T> {
        self.node(handle.0).map(|node| &node.val)
    }

    /// Returns a mutable reference to the element named by `handle`.
    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.node_mut(handle.0).map(|node| &mut node.val)
    }

    /// Returns the front (newest) element.
    pub(crate) fn front(&self) -> Option<&T> {
        self.node(self.head).map(|node| &node.val)
    }

    /// Returns the back (oldest) element.
    pub(crate) fn back(&self) -> Option<&T> {
        self.node(self.tail).map(|node| &node.val)
    }

    /// Iterates over the elements from front to back.
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Visits the elements from front to back with mutable access.
    ///
    /// The walk stops as soon as `f` returns `false`. The visitor cannot
    /// relink elements, so the order of the list is unchanged afterwards.
    pub(crate) fn walk_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        let mut cursor = self.head;
        while let Some(node) = self.node_mut(cursor) {
            cursor = node.next;
            if !f(&mut node.val) {
                break;
            }
        }
    }

    /// Removes every element and releases the arena's slots.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = NIL;
        self.tail = NIL;
        self.free = NIL;
        self.len = 0;
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Front-to-back iterator over a [`List`].
pub(crate) struct Iter<'a, T> {
    list: &'a List<T>,
    cursor: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.cursor)?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&node.val)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.remaining)
            .finish()
    }
}

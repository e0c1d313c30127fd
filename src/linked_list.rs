//! A doubly-linked list which flattens all its nodes onto a Vec for storage,
//! gaining data locality at the expense of O(index) random access.

use std::{
    fmt,
    ops::{Index, IndexMut},
};

use tracing::trace;

use crate::arena::{Arena, NodeHandle};
use crate::error::{Error, Result};

/// A node that lives in a linked list.
#[derive(Clone, Debug)]
struct Node<T> {
    /// The value being stored.
    value: T,

    /// The node previous to this one, None for the head.
    prev: Option<NodeHandle>,

    /// The next node in the list, None for the tail.
    next: Option<NodeHandle>,
}

/// A place in a [`LinkedList`]: either a live node or the end sentinel, which
/// sits one past the tail. Positions are invalidated by erasing the node they
/// name. A later insert may reuse the erased node's slot, after which the
/// stale position silently names that unrelated element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position(Option<NodeHandle>);

impl Position {
    /// The end sentinel, shared by every list.
    pub const END: Position = Position(None);

    /// Whether this is the end sentinel.
    pub fn is_end(&self) -> bool {
        self.0.is_none()
    }
}

/// A doubly-linked list whose nodes live in a single contiguous arena and are
/// addressed by their position in it. There is no node for the sentinel:
/// `head` and `tail` are None when the list is empty, and the end of the list
/// is the [`Position::END`] tag, so nothing ever links back to itself.
#[derive(Clone)]
pub struct LinkedList<T> {
    /// The nodes in the list.
    store: Arena<Node<T>>,

    /// The first node in the list.
    head: Option<NodeHandle>,

    /// The last node in the list.
    tail: Option<NodeHandle>,
}

impl<T> LinkedList<T> {
    /// Creates an empty list. Doesn't allocate until something is pushed.
    pub fn new() -> Self {
        Self {
            store: Arena::new(),
            head: None,
            tail: None,
        }
    }

    /// Creates a new linked list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: Arena::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    /// The length of this linked list.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Position of the first element, or the end position if empty.
    pub fn begin(&self) -> Position {
        Position(self.head)
    }

    pub fn end(&self) -> Position {
        Position::END
    }

    /// Pushes an item onto the back of the list.
    pub fn append(&mut self, item: T) -> Position {
        Position(Some(self.link_back(item)))
    }

    /// Pushes an item onto the front of the list.
    pub fn prepend(&mut self, item: T) -> Position {
        Position(Some(self.link_front(item)))
    }

    /// Splices an item in right before `position`. Inserting before the end
    /// position appends.
    pub fn insert(&mut self, position: Position, item: T) -> Result<Position> {
        let next = match position.0 {
            None => return Ok(self.append(item)),
            Some(next) => next,
        };

        let prev = match self.node(next)?.prev {
            None => return Ok(self.prepend(item)),
            Some(prev) => prev,
        };

        let idx = self.store.insert(Node {
            value: item,
            prev: Some(prev),
            next: Some(next),
        });
        self.store[prev].next = Some(idx);
        self.store[next].prev = Some(idx);

        #[cfg(test)]
        self.continuity_test();

        Ok(Position(Some(idx)))
    }

    /// Removes the first element and returns it.
    pub fn pop_first(&mut self) -> Result<T> {
        let head = self.head.ok_or(Error::EmptyContainer)?;
        self.unlink(head).ok_or(Error::EmptyContainer)
    }

    /// Removes the last element and returns it.
    pub fn pop_last(&mut self) -> Result<T> {
        let tail = self.tail.ok_or(Error::EmptyContainer)?;
        self.unlink(tail).ok_or(Error::EmptyContainer)
    }

    /// Removes the element at `position` and returns it. Erasing the end
    /// position is an error.
    pub fn erase(&mut self, position: Position) -> Result<T> {
        let handle = position.0.ok_or(Error::OutOfRange)?;
        self.unlink(handle).ok_or(Error::OutOfRange)
    }

    /// Removes the element at `index`, walking there from the head.
    pub fn erase_at(&mut self, index: usize) -> Result<T> {
        let handle = self.handle_at(index).ok_or(Error::OutOfRange)?;
        self.unlink(handle).ok_or(Error::OutOfRange)
    }

    /// Erases everything from `first` up to, but not including, `last`. The
    /// whole range is checked before anything is unlinked, so a `last` which
    /// can't be reached from `first` leaves the list untouched.
    pub fn erase_range(&mut self, first: Position, last: Position) -> Result<()> {
        let mut doomed = Vec::new();
        let mut cursor = first;

        while cursor != last {
            let handle = cursor.0.ok_or(Error::OutOfRange)?;
            cursor = Position(self.node(handle)?.next);
            doomed.push(handle);
        }

        if last != Position::END {
            self.node_at(last)?;
        }

        for handle in doomed {
            self.unlink(handle);
        }

        Ok(())
    }

    /// Position following `position`. Stepping off the tail yields the end
    /// position; stepping off the end position is an error.
    pub fn next(&self, position: Position) -> Result<Position> {
        let handle = position.0.ok_or(Error::OutOfRange)?;
        Ok(Position(self.node(handle)?.next))
    }

    /// Position preceding `position`. Stepping back from the end position
    /// lands on the tail; stepping back from the head is an error.
    pub fn prev(&self, position: Position) -> Result<Position> {
        let prev = match position.0 {
            None => self.tail,
            Some(handle) => self.node(handle)?.prev,
        };

        prev.map(|p| Position(Some(p))).ok_or(Error::OutOfRange)
    }

    /// Steps `count` nodes forward. Walking past the end position fails.
    pub fn advance(&self, mut position: Position, count: usize) -> Result<Position> {
        for _ in 0..count {
            let handle = position.0.ok_or(Error::RangeError)?;
            position = Position(self.node(handle)?.next);
        }

        Ok(position)
    }

    /// Steps `count` nodes backward. Walking back past the head fails, the
    /// same as walking forward past the end.
    pub fn retreat(&self, mut position: Position, count: usize) -> Result<Position> {
        for _ in 0..count {
            let prev = match position.0 {
                None => self.tail,
                Some(handle) => self.node(handle)?.prev,
            };
            position = Position(Some(prev.ok_or(Error::RangeError)?));
        }

        Ok(position)
    }

    /// The value at `position`. The end position has no value.
    pub fn value(&self, position: Position) -> Result<&T> {
        self.node_at(position).map(|node| &node.value)
    }

    pub fn value_mut(&mut self, position: Position) -> Result<&mut T> {
        let handle = position.0.ok_or(Error::OutOfRange)?;
        self.store
            .get_mut(handle)
            .map(|node| &mut node.value)
            .ok_or(Error::OutOfRange)
    }

    /// The element `index` nodes in from the head. This is a walk, not an
    /// array lookup.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.handle_at(index).map(|h| &self.store[h].value)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let handle = self.handle_at(index)?;
        Some(&mut self.store[handle].value)
    }

    /// Position of the first element matching `predicate`, or the end
    /// position if none does.
    pub fn position<P>(&self, predicate: P) -> Position
    where
        P: FnMut(&T) -> bool,
    {
        Position(self.handle_where(predicate))
    }

    /// Clears this linked list. Does not free the underlying buffers.
    pub fn clear(&mut self) {
        self.store.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let order: Vec<NodeHandle> = self.handles().collect();
        let values: Vec<&mut T> = self
            .store
            .ordered_mut(&order)
            .into_iter()
            .map(|node| &mut node.value)
            .collect();

        IterMut {
            inner: values.into_iter(),
        }
    }

    pub(crate) fn handle_where<P>(&self, mut predicate: P) -> Option<NodeHandle>
    where
        P: FnMut(&T) -> bool,
    {
        self.handles().find(|h| predicate(&self.store[*h].value))
    }

    /// Value of a node the caller already knows to be live.
    pub(crate) fn value_of_mut(&mut self, handle: NodeHandle) -> &mut T {
        &mut self.store[handle].value
    }

    pub(crate) fn link_front(&mut self, item: T) -> NodeHandle {
        let idx = self.store.insert(Node {
            value: item,
            prev: None,
            next: self.head,
        });

        match self.head {
            Some(head) => self.store[head].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);

        #[cfg(test)]
        self.continuity_test();

        idx
    }

    fn link_back(&mut self, item: T) -> NodeHandle {
        let idx = self.store.insert(Node {
            value: item,
            prev: self.tail,
            next: None,
        });

        match self.tail {
            Some(tail) => self.store[tail].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);

        #[cfg(test)]
        self.continuity_test();

        idx
    }

    /// Remove an arbitrary node from the list, linking its neighbours to each
    /// other. Returns None if the handle doesn't name a live node.
    fn unlink(&mut self, handle: NodeHandle) -> Option<T> {
        let node = self.store.remove(handle)?;

        match node.prev {
            Some(prev) => self.store[prev].next = node.next,
            None => self.head = node.next,
        }

        match node.next {
            Some(next) => self.store[next].prev = node.prev,
            None => self.tail = node.prev,
        }

        trace!(remaining = self.len(), "unlinked list node");

        #[cfg(test)]
        self.continuity_test();

        Some(node.value)
    }

    fn node(&self, handle: NodeHandle) -> Result<&Node<T>> {
        self.store.get(handle).ok_or(Error::OutOfRange)
    }

    fn node_at(&self, position: Position) -> Result<&Node<T>> {
        self.node(position.0.ok_or(Error::OutOfRange)?)
    }

    fn handle_at(&self, index: usize) -> Option<NodeHandle> {
        self.handles().nth(index)
    }

    /// Walks the handles from head to tail.
    fn handles(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        std::iter::successors(self.head, move |h| self.store[*h].next)
    }

    #[cfg(test)]
    fn continuity_test(&self) {
        let mut count = 0;

        // iterate through the list and make sure it matches the number
        // of elements in the store
        let mut cursor = self.head;
        let mut last = None;
        while let Some(h) = cursor {
            count += 1;
            assert!(count <= self.len());
            assert_eq!(last, self.store[h].prev);
            last = Some(h);
            cursor = self.store[h].next;
        }

        assert_eq!(self.len(), count);
        assert_eq!(self.tail, last);
    }
}

impl<T> Default for LinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for LinkedList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("index {} out of bounds for list of length {}", index, self.len()),
        }
    }
}

impl<T> IndexMut<usize> for LinkedList<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("index {} out of bounds for list of length {}", index, len),
        }
    }
}

impl<T: PartialEq> PartialEq for LinkedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for LinkedList<T> {}

impl<T: fmt::Debug> fmt::Debug for LinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for LinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = LinkedList::new();
        list.extend(iter);
        list
    }
}

impl<T> Extend<T> for LinkedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.append(item);
        }
    }
}

impl<T, const N: usize> From<[T; N]> for LinkedList<T> {
    fn from(items: [T; N]) -> Self {
        Self::from_iter(items)
    }
}

/// Borrowing iterator over a list, front to back.
pub struct Iter<'a, T> {
    list: &'a LinkedList<T>,
    front: Option<NodeHandle>,
    back: Option<NodeHandle>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = &self.list.store[self.front?];
        self.front = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = &self.list.store[self.back?];
        self.back = node.prev;
        self.remaining -= 1;
        Some(&node.value)
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

/// Mutable iterator over a list, front to back.
pub struct IterMut<'a, T> {
    inner: std::vec::IntoIter<&'a mut T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<'a, T> ExactSizeIterator for IterMut<'a, T> {}

/// Owning iterator, pops from either end.
pub struct IntoIter<T>(LinkedList<T>);

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.0.pop_first().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len(), Some(self.0.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.0.pop_last().ok()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> IntoIterator for LinkedList<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter(self)
    }
}

impl<'a, T> IntoIterator for &'a LinkedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut LinkedList<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

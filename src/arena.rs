//! Flat node storage shared by the node-based containers. Every node lives in
//! a single contiguous Vec and is addressed by its position in it; removed
//! slots are freelisted and reused by later inserts.

use std::ops::{Index, IndexMut};

/// Alias for the index of a node in an arena's storage vec.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeHandle(usize);

/// A Vec of node slots plus a freelist of the vacant ones. Handles stay valid
/// until the node they name is removed; after that the slot may be handed out
/// again to an unrelated node.
#[derive(Clone, Debug)]
pub(crate) struct Arena<N> {
    /// The slots, vacant ones holding None.
    slots: Vec<Option<N>>,

    /// Slots which aren't in use anymore. These will be reused.
    free: Vec<NodeHandle>,
}

impl<N> Arena<N> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// The number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores a node and returns its handle.
    pub(crate) fn insert(&mut self, node: N) -> NodeHandle {
        // use the first available location in the storage vec, or infer what
        // the next location will be on push.
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx.0] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                NodeHandle(self.slots.len() - 1)
            }
        }
    }

    /// Takes a node out of the arena, freelisting its slot.
    pub(crate) fn remove(&mut self, handle: NodeHandle) -> Option<N> {
        let node = self.slots.get_mut(handle.0)?.take()?;
        self.free.push(handle);
        Some(node)
    }

    pub(crate) fn get(&self, handle: NodeHandle) -> Option<&N> {
        self.slots.get(handle.0)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut N> {
        self.slots.get_mut(handle.0)?.as_mut()
    }

    /// Splits the arena into one mutable borrow per handle, in the order the
    /// handles are given. Handles that are vacant or repeated are skipped.
    pub(crate) fn ordered_mut(&mut self, order: &[NodeHandle]) -> Vec<&mut N> {
        let mut slots: Vec<Option<&mut N>> =
            self.slots.iter_mut().map(Option::as_mut).collect();

        order
            .iter()
            .filter_map(|handle| slots.get_mut(handle.0).and_then(Option::take))
            .collect()
    }

    /// Drops every node. Does not free the underlying buffers.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl<N> Index<NodeHandle> for Arena<N> {
    type Output = N;

    fn index(&self, handle: NodeHandle) -> &N {
        match self.get(handle) {
            Some(node) => node,
            None => panic!("arena slot {} is vacant", handle.0),
        }
    }
}

impl<N> IndexMut<NodeHandle> for Arena<N> {
    fn index_mut(&mut self, handle: NodeHandle) -> &mut N {
        match self.get_mut(handle) {
            Some(node) => node,
            None => panic!("arena slot {} is vacant", handle.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Arena;

    #[test]
    fn test_freelist_reuse() {
        let mut arena = Arena::with_capacity(4);

        let a = arena.insert('a');
        let b = arena.insert('b');
        let c = arena.insert('c');
        assert_eq!(3, arena.len());

        // b's slot goes on the freelist and is the next one handed out
        assert_eq!(Some('b'), arena.remove(b));
        assert_eq!(None, arena.remove(b));
        assert_eq!(None, arena.get(b));
        assert_eq!(2, arena.len());

        let d = arena.insert('d');
        assert_eq!(b, d);
        assert_eq!('d', arena[d]);
        assert_eq!(3, arena.slots.len());

        assert_eq!(Some(&'a'), arena.get(a));
        assert_eq!(Some(&'c'), arena.get(c));
    }

    #[test]
    fn test_ordered_mut() {
        let mut arena: Arena<usize> = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        let c = arena.insert(3);
        arena.remove(b);

        // vacant and repeated handles are skipped
        for (i, n) in arena.ordered_mut(&[c, b, a, c]).into_iter().enumerate() {
            *n += 10 * (i + 1);
        }

        assert_eq!(13, arena[c]);
        assert_eq!(21, arena[a]);
        assert!(arena.get(b).is_none());

        arena.clear();
        assert!(arena.is_empty());
    }
}

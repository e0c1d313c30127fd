//! An ordered map on top of a plain, unbalanced binary search tree.
//!
//! Nodes live in an [`Arena`] and refer to their children and parent by
//! handle. The parent link is only a back-reference used to walk upwards
//! during traversal; ownership runs strictly downward from the map. Nothing
//! rebalances the tree, so feeding it keys in sorted order degrades it into a
//! list and every lookup into a linear walk.

use std::{borrow::Borrow, cmp::Ordering, fmt};

use tracing::{debug, trace};

use crate::arena::{Arena, NodeHandle};
use crate::error::{Error, Result};

/// A node that lives in the tree.
#[derive(Clone, Debug)]
struct Node<K, V> {
    /// Never changes once the node is linked in.
    key: K,

    value: V,

    left: Option<NodeHandle>,

    right: Option<NodeHandle>,

    /// None for the root.
    parent: Option<NodeHandle>,
}

/// A place in a [`TreeMap`]'s in-order sequence: either a live node or the end
/// position one past the greatest key. Removing the node a position names
/// invalidates it. Its slot may be reused by a later insert, after which the
/// stale position silently names that unrelated entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position(Option<NodeHandle>);

impl Position {
    /// The end position, shared by every tree.
    pub const END: Position = Position(None);

    pub fn is_end(&self) -> bool {
        self.0.is_none()
    }
}

/// Outcome of descending the tree looking for a key.
enum Search {
    Found(NodeHandle),

    /// The key would hang off this parent on this side, or become the root if
    /// there is no parent.
    Vacant(Option<(NodeHandle, Ordering)>),
}

/// An ordered map backed by an unbalanced binary search tree. Iterates in
/// ascending key order.
#[derive(Clone)]
pub struct TreeMap<K, V> {
    store: Arena<Node<K, V>>,

    /// None when the map is empty.
    root: Option<NodeHandle>,
}

impl<K, V> TreeMap<K, V> {
    pub fn new() -> Self {
        Self {
            store: Arena::new(),
            root: None,
        }
    }

    /// The number of entries in the map.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Position of the smallest key, or the end position if the map is empty.
    pub fn begin(&self) -> Position {
        Position(self.root.map(|root| self.minimum(root)))
    }

    pub fn end(&self) -> Position {
        Position::END
    }

    /// In-order successor of `position`. Advancing past the greatest key
    /// yields the end position; advancing the end position fails.
    pub fn next(&self, position: Position) -> Result<Position> {
        let handle = position.0.ok_or(Error::OutOfRange)?;
        self.node(handle)?;
        Ok(Position(self.successor(handle)))
    }

    /// In-order predecessor of `position`. Retreating from the end position
    /// lands on the greatest key; retreating from the smallest key, or from
    /// the end of an empty map, fails.
    pub fn prev(&self, position: Position) -> Result<Position> {
        let prev = match position.0 {
            None => self.root.map(|root| self.maximum(root)),
            Some(handle) => {
                self.node(handle)?;
                self.predecessor(handle)
            }
        };

        prev.map(|p| Position(Some(p))).ok_or(Error::OutOfRange)
    }

    /// The key and value at `position`.
    pub fn entry(&self, position: Position) -> Result<(&K, &V)> {
        let node = self.node(position.0.ok_or(Error::OutOfRange)?)?;
        Ok((&node.key, &node.value))
    }

    pub fn value_mut(&mut self, position: Position) -> Result<&mut V> {
        let handle = position.0.ok_or(Error::OutOfRange)?;
        self.store
            .get_mut(handle)
            .map(|node| &mut node.value)
            .ok_or(Error::OutOfRange)
    }

    /// Drops every entry. Does not free the underlying buffers.
    pub fn clear(&mut self) {
        debug!(len = self.len(), "clearing tree map");
        self.store.clear();
        self.root = None;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            map: self,
            front: self.root.map(|root| self.minimum(root)),
            back: self.root.map(|root| self.maximum(root)),
            remaining: self.len(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let order = self.in_order();
        let entries: Vec<(&K, &mut V)> = self
            .store
            .ordered_mut(&order)
            .into_iter()
            .map(|node| (&node.key, &mut node.value))
            .collect();

        IterMut {
            inner: entries.into_iter(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut(self.iter_mut())
    }

    fn node(&self, handle: NodeHandle) -> Result<&Node<K, V>> {
        self.store.get(handle).ok_or(Error::OutOfRange)
    }

    fn minimum(&self, mut handle: NodeHandle) -> NodeHandle {
        while let Some(left) = self.store[handle].left {
            handle = left;
        }
        handle
    }

    fn maximum(&self, mut handle: NodeHandle) -> NodeHandle {
        while let Some(right) = self.store[handle].right {
            handle = right;
        }
        handle
    }

    /// Leftmost node of the right subtree if there is one, otherwise the
    /// first ancestor reached through a left edge.
    fn successor(&self, handle: NodeHandle) -> Option<NodeHandle> {
        if let Some(right) = self.store[handle].right {
            return Some(self.minimum(right));
        }

        let mut child = handle;
        let mut parent = self.store[handle].parent;
        while let Some(p) = parent {
            if self.store[p].left == Some(child) {
                break;
            }
            child = p;
            parent = self.store[p].parent;
        }

        parent
    }

    fn predecessor(&self, handle: NodeHandle) -> Option<NodeHandle> {
        if let Some(left) = self.store[handle].left {
            return Some(self.maximum(left));
        }

        let mut child = handle;
        let mut parent = self.store[handle].parent;
        while let Some(p) = parent {
            if self.store[p].right == Some(child) {
                break;
            }
            child = p;
            parent = self.store[p].parent;
        }

        parent
    }

    fn in_order(&self) -> Vec<NodeHandle> {
        let first = self.root.map(|root| self.minimum(root));
        std::iter::successors(first, |h| self.successor(*h)).collect()
    }
}

impl<K: Ord, V> TreeMap<K, V> {
    /// Stores `value` under `key`, overwriting whatever was there, and hands
    /// back a reference to the stored value.
    pub fn upsert(&mut self, key: K, value: V) -> &mut V {
        let handle = match self.search(&key) {
            Search::Found(handle) => {
                self.store[handle].value = value;
                handle
            }
            Search::Vacant(at) => self.attach(at, key, value),
        };

        #[cfg(test)]
        self.check_invariants();

        &mut self.store[handle].value
    }

    /// The value under `key`, inserting a default one first if the key is
    /// new.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let handle = match self.search(&key) {
            Search::Found(handle) => handle,
            Search::Vacant(at) => self.attach(at, key, V::default()),
        };

        #[cfg(test)]
        self.check_invariants();

        &mut self.store[handle].value
    }

    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(handle) => Ok(&self.store[handle].value),
            Search::Vacant(_) => Err(Error::NotFound),
        }
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(handle) => Ok(&mut self.store[handle].value),
            Search::Vacant(_) => Err(Error::NotFound),
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        matches!(self.search(key), Search::Found(_))
    }

    /// Position of `key`, or the end position if it isn't in the map. Costs
    /// one comparison per level of the tree.
    pub fn find<Q>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(handle) => Position(Some(handle)),
            Search::Vacant(_) => Position::END,
        }
    }

    /// Bust a move, returning whatever was there.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(handle) => self.unlink(handle).ok_or(Error::NotFound),
            Search::Vacant(_) => Err(Error::NotFound),
        }
    }

    /// Removes the entry at `position`. The end position names nothing, so
    /// removing it fails.
    pub fn remove_at(&mut self, position: Position) -> Result<V> {
        let handle = position.0.ok_or(Error::NotFound)?;
        self.unlink(handle).ok_or(Error::NotFound)
    }

    fn search<Q>(&self, key: &Q) -> Search
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cursor = self.root;
        let mut at = None;

        while let Some(handle) = cursor {
            let node = &self.store[handle];
            let ord = key.cmp(node.key.borrow());
            match ord {
                Ordering::Equal => return Search::Found(handle),
                Ordering::Less => cursor = node.left,
                Ordering::Greater => cursor = node.right,
            }
            at = Some((handle, ord));
        }

        Search::Vacant(at)
    }

    /// Links a fresh leaf in at the spot a failed search came up with.
    fn attach(&mut self, at: Option<(NodeHandle, Ordering)>, key: K, value: V) -> NodeHandle {
        let idx = self.store.insert(Node {
            key,
            value,
            left: None,
            right: None,
            parent: at.map(|(parent, _)| parent),
        });

        match at {
            None => self.root = Some(idx),
            Some((parent, Ordering::Less)) => self.store[parent].left = Some(idx),
            Some((parent, _)) => self.store[parent].right = Some(idx),
        }

        idx
    }

    /// Puts the subtree rooted at `replacement` where `target` hangs from its
    /// parent. `target`'s own links are left alone.
    fn transplant(&mut self, target: NodeHandle, replacement: Option<NodeHandle>) {
        let parent = self.store[target].parent;

        match parent {
            None => self.root = replacement,
            Some(p) => {
                if self.store[p].left == Some(target) {
                    self.store[p].left = replacement;
                } else {
                    self.store[p].right = replacement;
                }
            }
        }

        if let Some(r) = replacement {
            self.store[r].parent = parent;
        }
    }

    /// Standard BST deletion. Returns None if the handle doesn't name a live
    /// node, in which case nothing was touched.
    fn unlink(&mut self, handle: NodeHandle) -> Option<V> {
        let (left, right) = {
            let node = self.store.get(handle)?;
            (node.left, node.right)
        };

        match (left, right) {
            (None, _) => self.transplant(handle, right),
            (Some(_), None) => self.transplant(handle, left),
            (Some(left), Some(right)) => {
                let successor = self.minimum(right);

                // a successor deeper in the right subtree leaves its own right
                // child behind and adopts the whole right subtree
                if successor != right {
                    let orphan = self.store[successor].right;
                    self.transplant(successor, orphan);
                    self.store[successor].right = Some(right);
                    self.store[right].parent = Some(successor);
                }

                self.transplant(handle, Some(successor));
                self.store[successor].left = Some(left);
                self.store[left].parent = Some(successor);

                trace!(direct = (successor == right), "spliced successor into removed node");
            }
        }

        let node = self.store.remove(handle)?;

        if self.store.is_empty() {
            self.root = None;
        }

        #[cfg(test)]
        self.check_invariants();

        Some(node.value)
    }

    /// Walks the whole tree checking ordering, parent links and the node
    /// count.
    #[cfg(test)]
    fn check_invariants(&self) {
        let mut count = 0;
        let mut last: Option<&K> = None;
        let mut cursor = self.root.map(|root| self.minimum(root));

        if let Some(root) = self.root {
            assert_eq!(None, self.store[root].parent);
        }

        while let Some(h) = cursor {
            let node = &self.store[h];

            if let Some(prev) = last {
                assert!(prev < &node.key);
            }

            for child in [node.left, node.right].iter().flatten() {
                assert_eq!(Some(h), self.store[*child].parent);
            }

            count += 1;
            assert!(count <= self.len());
            last = Some(&node.key);
            cursor = self.successor(h);
        }

        assert_eq!(self.len(), count);
    }
}

impl<K, V> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Two maps are equal when they hold the same pairs, which for a tree means
/// the same in-order sequence no matter how either was built.
impl<K: PartialEq, V: PartialEq> PartialEq for TreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for TreeMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for TreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TreeMap::new();
        map.extend(iter);
        map
    }
}

/// Later pairs overwrite earlier ones with the same key.
impl<K: Ord, V> Extend<(K, V)> for TreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.upsert(k, v);
        }
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for TreeMap<K, V> {
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_iter(pairs)
    }
}

/// In-order iterator over a tree's entries.
pub struct Iter<'a, K, V> {
    map: &'a TreeMap<K, V>,
    front: Option<NodeHandle>,
    back: Option<NodeHandle>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let handle = self.front?;
        self.front = self.map.successor(handle);
        self.remaining -= 1;

        let node = &self.map.store[handle];
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let handle = self.back?;
        self.back = self.map.predecessor(handle);
        self.remaining -= 1;

        let node = &self.map.store[handle];
        Some((&node.key, &node.value))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

pub struct IterMut<'a, K, V> {
    inner: std::vec::IntoIter<(&'a K, &'a mut V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for IterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<'a, K, V> ExactSizeIterator for IterMut<'a, K, V> {}

pub struct Keys<'a, K, V>(Iter<'a, K, V>);

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.0.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Keys<'a, K, V> {
    fn next_back(&mut self) -> Option<&'a K> {
        self.0.next_back().map(|(k, _)| k)
    }
}

impl<'a, K, V> ExactSizeIterator for Keys<'a, K, V> {}

pub struct Values<'a, K, V>(Iter<'a, K, V>);

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.0.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Values<'a, K, V> {
    fn next_back(&mut self) -> Option<&'a V> {
        self.0.next_back().map(|(_, v)| v)
    }
}

impl<'a, K, V> ExactSizeIterator for Values<'a, K, V> {}

pub struct ValuesMut<'a, K, V>(IterMut<'a, K, V>);

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<&'a mut V> {
        self.0.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for ValuesMut<'a, K, V> {
    fn next_back(&mut self) -> Option<&'a mut V> {
        self.0.next_back().map(|(_, v)| v)
    }
}

impl<'a, K, V> ExactSizeIterator for ValuesMut<'a, K, V> {}

/// Owning in-order iterator.
pub struct IntoIter<K, V> {
    inner: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<(K, V)> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> IntoIterator for TreeMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(mut self) -> IntoIter<K, V> {
        let order = self.in_order();
        let entries: Vec<(K, V)> = order
            .into_iter()
            .filter_map(|h| self.store.remove(h))
            .map(|node| (node.key, node.value))
            .collect();

        IntoIter {
            inner: entries.into_iter(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a TreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut TreeMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

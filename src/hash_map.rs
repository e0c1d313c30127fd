//! A hash map which resolves collisions by chaining entries onto a
//! [`LinkedList`] per bucket.
//!
//! The bucket count is fixed when the map is built and the map never rehashes,
//! so once the number of entries climbs well past the bucket count every chain
//! gets long and lookups slide toward linear scans. Pick a bucket count that
//! is large relative to the number of keys you expect.

use std::{
    borrow::Borrow,
    collections::hash_map::RandomState,
    fmt,
    hash::{BuildHasher, Hash, Hasher},
    iter::Flatten,
    slice,
};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::linked_list::{self, LinkedList};

/// How many buckets a map gets when nobody says otherwise.
pub const DEFAULT_BUCKET_COUNT: usize = 4096;

/// A place in a [`ChainedHashMap`]: a bucket index plus a position within
/// that bucket's chain. The end position is one past the last bucket.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    bucket: usize,
    node: linked_list::Position,
}

impl Position {
    /// Index of the bucket this position points into.
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    /// Whether this is the end position.
    pub fn is_end(&self) -> bool {
        self.node.is_end()
    }
}

/// A hash map made of a fixed number of buckets, each chaining its entries on
/// a linked list. New entries go on the front of their chain.
#[derive(Clone)]
pub struct ChainedHashMap<K, V, S = RandomState>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    buckets: Vec<LinkedList<(K, V)>>,
    len: usize,
    hash_builder: S,
}

impl<K, V> ChainedHashMap<K, V, RandomState>
where
    K: Eq + Hash,
{
    /// Makes an empty map with [`DEFAULT_BUCKET_COUNT`] buckets.
    pub fn new() -> Self {
        ChainedHashMap::with_buckets(DEFAULT_BUCKET_COUNT)
    }

    /// Makes an empty map with a specific number of buckets. Zero is bumped
    /// up to one.
    pub fn with_buckets(bucket_count: usize) -> Self {
        ChainedHashMap::with_buckets_and_hasher(bucket_count, Default::default())
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Makes an empty map with a specific number of buckets and hasher.
    pub fn with_buckets_and_hasher(bucket_count: usize, hash_builder: S) -> Self {
        let bucket_count = bucket_count.max(1);
        debug!(bucket_count, "building chained hash map");

        Self {
            buckets: (0..bucket_count).map(|_| LinkedList::new()).collect(),
            len: 0,
            hash_builder,
        }
    }

    /// The number of entries in the map.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Length of the chain in bucket `index`, if there is such a bucket.
    pub fn bucket_len(&self, index: usize) -> Option<usize> {
        self.buckets.get(index).map(LinkedList::len)
    }

    /// The value under `key`, inserting a default one at the front of its
    /// bucket first if the key is new.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let index = self.bucket_index(&key);
        let bucket = &mut self.buckets[index];

        let handle = match bucket.handle_where(|(k, _)| *k == key) {
            Some(handle) => handle,
            None => {
                trace!(bucket = index, "prepending entry");
                self.len += 1;
                bucket.link_front((key, V::default()))
            }
        };

        #[cfg(test)]
        self.continuity_test();

        &mut self.buckets[index].value_of_mut(handle).1
    }

    /// Stores `value` under `key`, overwriting whatever was there, and hands
    /// back a reference to the stored value.
    pub fn upsert(&mut self, key: K, value: V) -> &mut V {
        let index = self.bucket_index(&key);
        let bucket = &mut self.buckets[index];

        let handle = match bucket.handle_where(|(k, _)| *k == key) {
            Some(handle) => {
                bucket.value_of_mut(handle).1 = value;
                handle
            }
            None => {
                trace!(bucket = index, "prepending entry");
                self.len += 1;
                bucket.link_front((key, value))
            }
        };

        #[cfg(test)]
        self.continuity_test();

        &mut self.buckets[index].value_of_mut(handle).1
    }

    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.is_empty() {
            return Err(Error::NotFound);
        }

        self.buckets[self.bucket_index(key)]
            .iter()
            .find(|(k, _)| Borrow::<Q>::borrow(k) == key)
            .map(|(_, v)| v)
            .ok_or(Error::NotFound)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.is_empty() {
            return Err(Error::NotFound);
        }

        let index = self.bucket_index(key);
        let bucket = &mut self.buckets[index];
        let handle = bucket
            .handle_where(|(k, _)| Borrow::<Q>::borrow(k) == key)
            .ok_or(Error::NotFound)?;

        Ok(&mut bucket.value_of_mut(handle).1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_ok()
    }

    /// Position of `key`, or the end position if it isn't in the map. Only the
    /// key's own bucket is searched, so this costs one chain walk.
    pub fn find<Q>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.bucket_index(key);
        let node = self.buckets[bucket].position(|(k, _)| Borrow::<Q>::borrow(k) == key);

        if node.is_end() {
            self.end()
        } else {
            Position { bucket, node }
        }
    }

    /// Bust a move, returning whatever was there.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = self.find(key);
        self.remove_at(position)
    }

    /// Removes the entry at `position`. The end position names nothing, so
    /// removing it fails.
    pub fn remove_at(&mut self, position: Position) -> Result<V> {
        let bucket = self.buckets.get_mut(position.bucket).ok_or(Error::NotFound)?;
        let (_, value) = bucket.erase(position.node).map_err(|_| Error::NotFound)?;
        self.len -= 1;

        #[cfg(test)]
        self.continuity_test();

        Ok(value)
    }

    /// Position of the first entry of the first non-empty bucket, or the end
    /// position if the map is empty.
    pub fn begin(&self) -> Position {
        self.first_from(0)
    }

    pub fn end(&self) -> Position {
        Position {
            bucket: self.buckets.len(),
            node: linked_list::Position::END,
        }
    }

    /// Position after `position`: the next entry in the same chain, or else
    /// the head of the next non-empty bucket, or else the end position.
    /// Advancing the end position fails.
    pub fn next(&self, position: Position) -> Result<Position> {
        let bucket = self.buckets.get(position.bucket).ok_or(Error::OutOfRange)?;
        let node = bucket.next(position.node)?;

        if node.is_end() {
            Ok(self.first_from(position.bucket + 1))
        } else {
            Ok(Position {
                bucket: position.bucket,
                node,
            })
        }
    }

    /// Position before `position`: the previous entry in the same chain, or
    /// else the tail of the previous non-empty bucket. Retreating from
    /// [`begin`](Self::begin) fails.
    pub fn prev(&self, position: Position) -> Result<Position> {
        if position == self.end() {
            return self.last_before(self.buckets.len());
        }

        let bucket = self.buckets.get(position.bucket).ok_or(Error::OutOfRange)?;
        bucket.value(position.node)?;

        if position.node == bucket.begin() {
            self.last_before(position.bucket)
        } else {
            Ok(Position {
                bucket: position.bucket,
                node: bucket.prev(position.node)?,
            })
        }
    }

    /// The key and value at `position`.
    pub fn entry(&self, position: Position) -> Result<(&K, &V)> {
        let bucket = self.buckets.get(position.bucket).ok_or(Error::OutOfRange)?;
        let (k, v) = bucket.value(position.node)?;
        Ok((k, v))
    }

    pub fn value_mut(&mut self, position: Position) -> Result<&mut V> {
        let bucket = self
            .buckets
            .get_mut(position.bucket)
            .ok_or(Error::OutOfRange)?;
        let (_, v) = bucket.value_mut(position.node)?;
        Ok(v)
    }

    /// Empties every bucket. The bucket count stays as it was.
    pub fn clear(&mut self) {
        debug!(len = self.len, "clearing chained hash map");

        for bucket in self.buckets.iter_mut() {
            bucket.clear();
        }
        self.len = 0;
    }

    /// Entries in bucket order, and within a bucket from the front of its
    /// chain.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.buckets.iter().flatten(),
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.buckets.iter_mut().flatten(),
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, v)| v)
    }

    fn first_from(&self, start: usize) -> Position {
        self.buckets
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, bucket)| !bucket.is_empty())
            .map(|(bucket, list)| Position {
                bucket,
                node: list.begin(),
            })
            .unwrap_or_else(|| self.end())
    }

    fn last_before(&self, end: usize) -> Result<Position> {
        let bucket = self.buckets[..end]
            .iter()
            .rposition(|bucket| !bucket.is_empty())
            .ok_or(Error::OutOfRange)?;
        let list = &self.buckets[bucket];

        Ok(Position {
            bucket,
            node: list.prev(list.end())?,
        })
    }

    fn bucket_index<Q>(&self, k: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        let mut h = self.hash_builder.build_hasher();
        k.hash(&mut h);
        (h.finish() % self.buckets.len() as u64) as usize
    }

    #[cfg(test)]
    fn continuity_test(&self) {
        let mut count = 0;

        // every entry has to sit in the bucket its key hashes to, and the
        // chains have to add up to the length of the map
        for (index, bucket) in self.buckets.iter().enumerate() {
            for (k, _) in bucket.iter() {
                assert_eq!(index, self.bucket_index(k));
                count += 1;
            }
        }

        assert_eq!(self.len, count);
    }
}

impl<K, V, S> Default for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        ChainedHashMap::with_buckets_and_hasher(DEFAULT_BUCKET_COUNT, S::default())
    }
}

/// Equal when both hold the same pairs, regardless of which bucket or chain
/// order they ended up in.
impl<K, V, S> PartialEq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && other
                .iter()
                .all(|(k, v)| self.get(k).map_or(false, |ours| ours == v))
    }
}

impl<K, V, S> Eq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> fmt::Debug for ChainedHashMap<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ChainedHashMap::default();
        map.extend(iter);
        map
    }
}

/// Later pairs overwrite earlier ones with the same key.
impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.upsert(k, v);
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ChainedHashMap<K, V, RandomState>
where
    K: Eq + Hash,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_iter(pairs)
    }
}

pub struct Iter<'a, K, V> {
    inner: Flatten<slice::Iter<'a, LinkedList<(K, V)>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (k, v) = self.inner.next()?;
        self.remaining -= 1;
        Some((k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let (k, v) = self.inner.next_back()?;
        self.remaining -= 1;
        Some((k, v))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

pub struct IterMut<'a, K, V> {
    inner: Flatten<slice::IterMut<'a, LinkedList<(K, V)>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let (k, v) = self.inner.next()?;
        self.remaining -= 1;
        Some((&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for IterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let (k, v) = self.inner.next_back()?;
        self.remaining -= 1;
        Some((&*k, v))
    }
}

impl<'a, K, V> ExactSizeIterator for IterMut<'a, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::ChainedHashMap;
    use crate::Error;
    use proptest::prelude::*;
    use std::{
        collections::HashMap,
        hash::{BuildHasher, Hasher},
    };

    /// Hashes a u64 to itself, so bucket placement is easy to reason about.
    #[derive(Clone, Default)]
    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            for byte in bytes.iter().rev() {
                self.0 = (self.0 << 8) | *byte as u64;
            }
        }

        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }

        fn finish(&self) -> u64 {
            self.0
        }
    }

    #[derive(Clone, Default)]
    struct BuildIdentityHasher;

    impl BuildHasher for BuildIdentityHasher {
        type Hasher = IdentityHasher;

        fn build_hasher(&self) -> IdentityHasher {
            IdentityHasher(0)
        }
    }

    type IdentityMap<V> = ChainedHashMap<u64, V, BuildIdentityHasher>;

    #[test]
    fn test_chaining_in_two_buckets() {
        let mut map: ChainedHashMap<u32, u32> = ChainedHashMap::with_buckets(2);
        for k in 0..50 {
            *map.get_or_insert_default(k) = k * 10;
        }

        assert_eq!(50, map.len());
        assert_eq!(2, map.bucket_count());
        assert_eq!(Some(50), map.bucket_len(0).zip(map.bucket_len(1)).map(|(a, b)| a + b));

        for k in 0..50 {
            assert!(!map.find(&k).is_end());
            assert_eq!(Ok(&(k * 10)), map.get(&k));
        }
        assert!(map.find(&50).is_end());
    }

    #[test]
    fn test_bucket_placement_and_front_insertion() {
        let mut map: IdentityMap<&str> = ChainedHashMap::with_buckets_and_hasher(4, BuildIdentityHasher);
        map.upsert(1, "one");
        map.upsert(5, "five");
        map.upsert(2, "two");

        // 5 lands in bucket 1 after 1, so it sits at the front of the chain
        assert_eq!(Some(2), map.bucket_len(1));
        assert_eq!(Some(1), map.bucket_len(2));
        assert_eq!(1, map.find(&5).bucket());
        assert_eq!(
            vec![(5, "five"), (1, "one"), (2, "two")],
            map.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_position_walk() {
        let mut map: IdentityMap<u64> = ChainedHashMap::with_buckets_and_hasher(8, BuildIdentityHasher);
        for k in [3, 11, 6, 19] {
            map.upsert(k, k);
        }

        let mut forward = Vec::new();
        let mut pos = map.begin();
        while pos != map.end() {
            forward.push(*map.entry(pos).unwrap().0);
            pos = map.next(pos).unwrap();
        }
        assert_eq!(vec![19, 11, 3, 6], forward);

        let mut backward = Vec::new();
        let mut pos = map.end();
        while pos != map.begin() {
            pos = map.prev(pos).unwrap();
            backward.push(*map.entry(pos).unwrap().0);
        }
        assert_eq!(vec![6, 3, 11, 19], backward);

        assert_eq!(Err(Error::OutOfRange), map.next(map.end()));
        assert_eq!(Err(Error::OutOfRange), map.prev(map.begin()));
        assert_eq!(Err(Error::OutOfRange), map.entry(map.end()));
    }

    #[test]
    fn test_empty_map() {
        let mut map: ChainedHashMap<u32, u32> = ChainedHashMap::with_buckets(16);

        assert!(map.is_empty());
        assert_eq!(map.begin(), map.end());
        assert_eq!(Err(Error::NotFound), map.get(&1));
        assert_eq!(Err(Error::NotFound), map.get_mut(&1));
        assert_eq!(Err(Error::NotFound), map.remove(&1));
        assert_eq!(Err(Error::NotFound), map.remove_at(map.end()));
        assert_eq!(Err(Error::OutOfRange), map.prev(map.begin()));
        assert_eq!(Err(Error::OutOfRange), map.next(map.end()));
    }

    #[test]
    fn test_zero_buckets_is_one() {
        let mut map: ChainedHashMap<&str, u32> = ChainedHashMap::with_buckets(0);
        map.upsert("a", 1);
        map.upsert("b", 2);

        assert_eq!(1, map.bucket_count());
        assert_eq!(Some(2), map.bucket_len(0));
    }

    #[test]
    fn test_remove() {
        let mut map: ChainedHashMap<u32, String> = ChainedHashMap::with_buckets(3);
        for k in 0..10 {
            map.upsert(k, k.to_string());
        }

        assert_eq!(Ok("4".to_string()), map.remove(&4));
        assert!(map.find(&4).is_end());
        assert_eq!(9, map.len());
        assert_eq!(Err(Error::NotFound), map.remove(&4));

        let pos = map.find(&7);
        assert_eq!(Ok("7".to_string()), map.remove_at(pos));
        assert_eq!(Err(Error::NotFound), map.remove_at(pos));
        assert_eq!(8, map.len());

        map.clear();
        assert!(map.is_empty());
        assert_eq!(3, map.bucket_count());
        assert_eq!(map.begin(), map.end());
    }

    #[test]
    fn test_upsert_and_mutation() {
        let mut map: ChainedHashMap<String, u32> = ChainedHashMap::with_buckets(8);
        *map.get_or_insert_default("a".to_string()) += 1;
        *map.get_or_insert_default("a".to_string()) += 1;
        map.upsert("b".to_string(), 10);
        *map.upsert("b".to_string(), 20) += 1;

        assert_eq!(2, map.len());
        assert_eq!(Ok(&2), map.get("a"));
        assert_eq!(Ok(&21), map.get("b"));

        *map.get_mut("a").unwrap() = 5;
        for (_, v) in map.iter_mut() {
            *v *= 2;
        }
        let pos = map.find("b");
        *map.value_mut(pos).unwrap() += 1;

        assert_eq!(Ok(&10), map.get("a"));
        assert_eq!(Ok(&43), map.get("b"));
        assert!(map.contains_key("a"));
        assert!(!map.contains_key("c"));
    }

    #[test]
    fn test_equality_ignores_order_and_buckets() {
        let a: ChainedHashMap<u32, &str> = ChainedHashMap::from([(1, "a"), (2, "b")]);
        let b: ChainedHashMap<u32, &str> = ChainedHashMap::from([(2, "b"), (1, "a")]);

        let mut c: ChainedHashMap<u32, &str> = ChainedHashMap::with_buckets(1);
        c.upsert(2, "b");
        c.upsert(1, "a");

        assert_eq!(a, a);
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_eq!(a, c);

        c.upsert(2, "z");
        assert_ne!(a, c);
        c.upsert(3, "b");
        assert_ne!(a, c);
    }

    #[test]
    fn test_clone_is_deep() {
        let original: ChainedHashMap<u32, String> =
            (0..20).map(|k| (k, k.to_string())).collect();
        let mut copy = original.clone();
        assert_eq!(original, copy);

        copy.upsert(3, "three".to_string());
        copy.remove(&4).unwrap();

        assert_eq!(Ok(&"3".to_string()), original.get(&3));
        assert_eq!(Ok(&"4".to_string()), original.get(&4));
        assert_eq!(20, original.len());
        assert_ne!(original, copy);
    }

    #[test]
    fn test_bulk_load_later_duplicates_win() {
        let map: ChainedHashMap<u32, &str> = ChainedHashMap::from([(1, "z"), (2, "b"), (1, "a")]);
        assert_eq!(2, map.len());
        assert_eq!(Ok(&"a"), map.get(&1));
        assert_eq!(Ok(&"b"), map.get(&2));
        map.continuity_test();

        let mut map: ChainedHashMap<u64, &str> = ChainedHashMap::with_buckets(4);
        map.upsert(1, "one");
        map.extend([(2, "two"), (1, "uno"), (2, "dos")]);
        assert_eq!(2, map.len());
        assert_eq!(Ok(&"uno"), map.get(&1));
        assert_eq!(Ok(&"dos"), map.get(&2));

        let collected: ChainedHashMap<u64, u64> = [(7, 1), (7, 2), (7, 3)].into_iter().collect();
        assert_eq!(1, collected.len());
        assert_eq!(Ok(&3), collected.get(&7));
    }

    #[test]
    fn test_iterators_run_both_ways() {
        let mut map: ChainedHashMap<u64, u64, BuildIdentityHasher> =
            ChainedHashMap::with_buckets_and_hasher(4, BuildIdentityHasher);
        map.extend([(1, 10), (2, 20), (5, 50), (3, 30)]);

        let forward: Vec<u64> = map.keys().copied().collect();
        let mut backward: Vec<u64> = map.keys().rev().copied().collect();
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(4, map.values().len());

        let mut iter = map.iter_mut();
        assert_eq!(4, iter.len());
        let (k, v) = iter.next_back().unwrap();
        *v += *k;
        assert_eq!(3, iter.len());
        let (last, _) = map.iter().next_back().unwrap();
        let last = *last;
        assert_eq!(Ok(&(last * 11)), map.get(&last));
    }

    #[test]
    fn readme_snippet() {
        let mut map: ChainedHashMap<usize, String> = ChainedHashMap::with_buckets(64);

        *map.get_or_insert_default(0) = "Put".to_owned();
        *map.get_or_insert_default(1) = "large".to_owned();
        *map.get_or_insert_default(2) = "things".to_owned();
        map.upsert(2, "buckets".to_owned());

        assert_eq!(3, map.iter().count());
        assert_eq!(Ok(&"buckets".to_owned()), map.get(&2));
    }

    proptest! {
        #[test]
        fn proptest_matches_hash_map(
            buckets in 1usize..8,
            ops in proptest::collection::vec((any::<bool>(), 0u16..64, any::<u32>()), 0..128),
        ) {
            let mut map = ChainedHashMap::with_buckets(buckets);
            let mut model = HashMap::new();

            for (insert, key, value) in ops {
                if insert {
                    map.upsert(key, value);
                    model.insert(key, value);
                } else {
                    prop_assert_eq!(map.remove(&key).ok(), model.remove(&key));
                    prop_assert!(map.find(&key).is_end());
                }
            }

            prop_assert_eq!(map.len(), model.len());
            prop_assert_eq!(map.iter().count(), model.len());
            for (k, v) in model.iter() {
                prop_assert_eq!(map.get(k), Ok(v));
            }
        }
    }
}

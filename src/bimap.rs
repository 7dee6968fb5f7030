//! An ordered bidirectional map built from two cross-linked AVL trees.

use std::borrow::Borrow;
use std::fmt;
use std::iter::FusedIterator;

use tracing::{debug, trace, warn};

use crate::arena::Handle;
use crate::error::{Duplicated, Error, Result};
use crate::tree::{self, Tree};

/// An ordered one-to-one map between keys and values.
///
/// Keys live in one AVL tree and values in another. Each key node refers to the
/// node of its value and vice versa, so either side can be looked up, removed
/// or queried for its extremes in logarithmic time.
///
/// ```
/// use avl_bimap::AvlBiMap;
///
/// let mut map = AvlBiMap::new();
/// map.insert_pair("a", 1).unwrap();
/// map.insert_pair("b", 2).unwrap();
/// assert_eq!(map.find_by_key("a"), Some((&"a", &1)));
/// assert_eq!(map.find_by_value(&2), Some((&"b", &2)));
/// assert!(map.insert_pair("c", 2).is_err());
/// map.delete_by_value(&1).unwrap();
/// assert!(map.find_by_key("a").is_none());
/// ```
#[derive(Clone)]
pub struct AvlBiMap<K, V> {
    keys: Tree<K>,
    values: Tree<V>,
}

/// An iterator over the pairs of a map, in key order.
pub struct Iter<'a, K, V> {
    map: &'a AvlBiMap<K, V>,
    keys: tree::Iter<'a, K>,
}

/// An iterator over the pairs of a map, in value order.
pub struct IterByValue<'a, K, V> {
    map: &'a AvlBiMap<K, V>,
    values: tree::Iter<'a, V>,
}

impl<K, V> AvlBiMap<K, V> {
    /// Creates an empty map.
    /// No memory is allocated until the first pair is inserted.
    pub fn new() -> Self {
        Self {
            keys: Tree::new(),
            values: Tree::new(),
        }
    }

    /// Returns true if the map contains no pairs.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the number of pairs in the map.
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.keys.len(), self.values.len());
        self.keys.len()
    }

    /// Clears the map.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    /// Reserves node storage for at least `additional` more pairs on both sides.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.keys.reserve(additional)?;
        self.values.reserve(additional)
    }

    /// Height of the key tree, `None` when empty.
    pub fn key_height(&self) -> Option<usize> {
        self.keys.height()
    }

    /// Height of the value tree, `None` when empty.
    pub fn value_height(&self) -> Option<usize> {
        self.values.height()
    }

    /// Gets an iterator over the pairs of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            map: self,
            keys: self.keys.iter(),
        }
    }

    /// Gets an iterator over the pairs of the map, sorted by value.
    pub fn iter_by_value(&self) -> IterByValue<'_, K, V> {
        IterByValue {
            map: self,
            values: self.values.iter(),
        }
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.keys.iter().map(|(_, key)| key)
    }

    /// Gets an iterator over the values of the map, in sorted order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.values.iter().map(|(_, value)| value)
    }

    // Resolves a key node to its pair. `None` means the pairing is broken.
    fn pair_of_key(&self, key_ptr: Handle) -> Option<(&K, &V)> {
        let key = self.keys.key(key_ptr)?;
        match self.keys.pair(key_ptr).and_then(|value_ptr| self.values.key(value_ptr)) {
            Some(value) => Some((key, value)),
            None => {
                warn!(?key_ptr, "key node without a live pair");
                None
            }
        }
    }

    // Resolves a value node to its pair. `None` means the pairing is broken.
    fn pair_of_value(&self, value_ptr: Handle) -> Option<(&K, &V)> {
        let value = self.values.key(value_ptr)?;
        match self.values.pair(value_ptr).and_then(|key_ptr| self.keys.key(key_ptr)) {
            Some(key) => Some((key, value)),
            None => {
                warn!(?value_ptr, "value node without a live pair");
                None
            }
        }
    }

    // Returns the counterpart of `key_ptr` if both nodes refer to each other.
    fn live_pair_of_key(&self, key_ptr: Handle) -> Option<Handle> {
        self.keys
            .pair(key_ptr)
            .filter(|value_ptr| self.values.pair(*value_ptr) == Some(key_ptr))
    }

    fn live_pair_of_value(&self, value_ptr: Handle) -> Option<Handle> {
        self.values
            .pair(value_ptr)
            .filter(|key_ptr| self.keys.pair(*key_ptr) == Some(value_ptr))
    }
}

impl<K: Ord, V: Ord> AvlBiMap<K, V> {
    /// Builds a map from pairs, failing on the first pair that cannot be inserted.
    pub fn try_from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::new();
        map.try_extend(pairs)?;
        Ok(map)
    }

    /// Inserts pairs in order. Stops at the first failing pair; the pairs
    /// inserted before it stay in the map.
    pub fn try_extend<I>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            self.insert_pair(key, value)?;
        }
        Ok(())
    }

    /// Inserts a new pair.
    ///
    /// Fails with [`Error::DuplicatePairElement`] if the key or the value is
    /// already mapped, and with [`Error::AllocationFailure`] or
    /// [`Error::CapacityExceeded`] if node storage cannot be obtained. The map
    /// is unchanged on failure.
    pub fn insert_pair(&mut self, key: K, value: V) -> Result<()> {
        let presence = Duplicated::from_presence(self.keys.contains(&key), self.values.contains(&value));
        if let Some(duplicated) = presence {
            debug!(?duplicated, "rejected pair insertion");
            return Err(Error::DuplicatePairElement(duplicated));
        }

        // With room on both sides neither insertion below can fail halfway
        if let Err(err) = self.keys.reserve(1).and_then(|()| self.values.reserve(1)) {
            debug!(%err, "could not reserve node storage");
            return Err(err);
        }

        let key_ptr = self.keys.insert(key, None)?;
        let value_ptr = match self.values.insert(value, Some(key_ptr)) {
            Ok(value_ptr) => value_ptr,
            Err(err) => {
                self.keys.remove_at(key_ptr)?;
                return Err(err);
            }
        };
        self.keys.set_pair(key_ptr, Some(value_ptr))?;
        trace!(len = self.len(), "inserted pair");
        Ok(())
    }

    /// Removes the pair holding `key` and returns it.
    ///
    /// Fails with [`Error::KeyNotFound`] if the key is absent or not properly paired.
    pub fn delete_by_key<Q>(&mut self, key: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(key_ptr) = self.keys.find(key) else {
            debug!("delete by key: key not found");
            return Err(Error::KeyNotFound);
        };
        // Capture the counterpart before either node goes away
        let Some(value_ptr) = self.live_pair_of_key(key_ptr) else {
            warn!(?key_ptr, "delete by key: key node without a live pair");
            return Err(Error::KeyNotFound);
        };

        let (key, _) = self.keys.remove_at(key_ptr)?;
        let (value, _) = self.values.remove_at(value_ptr)?;
        trace!(len = self.len(), "deleted pair by key");
        Ok((key, value))
    }

    /// Removes the pair holding `value` and returns it.
    ///
    /// Fails with [`Error::ValueNotFound`] if the value is absent or not properly paired.
    pub fn delete_by_value<Q>(&mut self, value: &Q) -> Result<(K, V)>
    where
        V: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(value_ptr) = self.values.find(value) else {
            debug!("delete by value: value not found");
            return Err(Error::ValueNotFound);
        };
        let Some(key_ptr) = self.live_pair_of_value(value_ptr) else {
            warn!(?value_ptr, "delete by value: value node without a live pair");
            return Err(Error::ValueNotFound);
        };

        let (value, _) = self.values.remove_at(value_ptr)?;
        let (key, _) = self.keys.remove_at(key_ptr)?;
        trace!(len = self.len(), "deleted pair by value");
        Ok((key, value))
    }

    /// Returns the pair holding `key`.
    pub fn find_by_key<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.keys.find(key).and_then(|key_ptr| self.pair_of_key(key_ptr))
    }

    /// Returns the pair holding `value`.
    pub fn find_by_value<Q>(&self, value: &Q) -> Option<(&K, &V)>
    where
        V: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.values
            .find(value)
            .and_then(|value_ptr| self.pair_of_value(value_ptr))
    }

    /// Returns the value mapped to `key`.
    pub fn get_by_key<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_by_key(key).map(|(_, value)| value)
    }

    /// Returns the key mapped to `value`.
    pub fn get_by_value<Q>(&self, value: &Q) -> Option<&K>
    where
        V: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_by_value(value).map(|(key, _)| key)
    }

    /// Returns true if the map holds `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.keys.contains(key)
    }

    /// Returns true if the map holds `value`.
    pub fn contains_value<Q>(&self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.values.contains(value)
    }

    /// Returns the pair with the smallest key.
    pub fn min_by_key(&self) -> Option<(&K, &V)> {
        self.keys.min().ok().and_then(|key_ptr| self.pair_of_key(key_ptr))
    }

    /// Returns the pair with the largest key.
    pub fn max_by_key(&self) -> Option<(&K, &V)> {
        self.keys.max().ok().and_then(|key_ptr| self.pair_of_key(key_ptr))
    }

    /// Returns the pair with the smallest value.
    pub fn min_by_value(&self) -> Option<(&K, &V)> {
        self.values
            .min()
            .ok()
            .and_then(|value_ptr| self.pair_of_value(value_ptr))
    }

    /// Returns the pair with the largest value.
    pub fn max_by_value(&self) -> Option<(&K, &V)> {
        self.values
            .max()
            .ok()
            .and_then(|value_ptr| self.pair_of_value(value_ptr))
    }

    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        self.keys.check_consistency();
        self.values.check_consistency();
        assert_eq!(self.keys.len(), self.values.len());

        for (key_ptr, _) in &self.keys {
            let value_ptr = self.keys.pair(key_ptr);
            assert!(value_ptr.is_some_and(|value_ptr| self.values.contains_handle(value_ptr)));
            assert_eq!(self.live_pair_of_key(key_ptr), value_ptr);
        }
        for (value_ptr, _) in &self.values {
            let key_ptr = self.values.pair(value_ptr);
            assert!(key_ptr.is_some_and(|key_ptr| self.keys.contains_handle(key_ptr)));
            assert_eq!(self.live_pair_of_value(value_ptr), key_ptr);
        }
    }
}

impl<K, V> Default for AvlBiMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlBiMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for AvlBiMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for AvlBiMap<K, V> {}

impl<'a, K, V> IntoIterator for &'a AvlBiMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let map = self.map;
        let (key_ptr, _) = self.keys.next()?;
        let pair = map.pair_of_key(key_ptr);
        debug_assert!(pair.is_some(), "key node without a live pair");
        pair
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let map = self.map;
        let (key_ptr, _) = self.keys.next_back()?;
        let pair = map.pair_of_key(key_ptr);
        debug_assert!(pair.is_some(), "key node without a live pair");
        pair
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K, V> Iterator for IterByValue<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let map = self.map;
        let (value_ptr, _) = self.values.next()?;
        let pair = map.pair_of_value(value_ptr);
        debug_assert!(pair.is_some(), "value node without a live pair");
        pair
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterByValue<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let map = self.map;
        let (value_ptr, _) = self.values.next_back()?;
        let pair = map.pair_of_value(value_ptr);
        debug_assert!(pair.is_some(), "value node without a live pair");
        pair
    }
}

impl<K, V> ExactSizeIterator for IterByValue<'_, K, V> {}

impl<K, V> FusedIterator for IterByValue<'_, K, V> {}

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for AvlBiMap<K, V>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct AvlBiMapVisitor<K, V> {
    marker: std::marker::PhantomData<(K, V)>,
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for AvlBiMapVisitor<K, V>
where
    K: serde::Deserialize<'de> + Ord,
    V: serde::Deserialize<'de> + Ord,
{
    type Value = AvlBiMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map with unique keys and unique values")
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = AvlBiMap::new();
        while let Some((key, value)) = access.next_entry()? {
            map.insert_pair(key, value).map_err(serde::de::Error::custom)?;
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for AvlBiMap<K, V>
where
    K: serde::Deserialize<'de> + Ord,
    V: serde::Deserialize<'de> + Ord,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(AvlBiMapVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

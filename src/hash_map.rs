//! A separate-chaining hash map.
//!
//! Buckets grow through a fixed table of near-prime capacities and double once the table
//! runs out. The map grows as soon as an insert would take `len / capacity` past the
//! maximum load factor, so that ratio never exceeds it between calls.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;

use ahash::RandomState;
use tracing::trace;

use crate::error::{Error, Result};

/// Load factor used unless another is configured.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.9;

/// Smallest accepted load factor. Below it the bucket count outruns the entries.
pub const MIN_MAX_LOAD_FACTOR: f64 = 0.05;

const PRIME_CAPACITIES: [usize; 26] = [
    53, 97, 193, 389, 769, 1543, 3079, 6151, 12289, 24593, 49157, 98317, 196_613, 393_241, 786_433, 1_572_869,
    3_145_739, 6_291_469, 12_582_917, 25_165_843, 50_331_653, 100_663_319, 201_326_611, 402_653_189, 805_306_457,
    1_610_612_741,
];

/// The capacity that follows `capacity`: the next table entry, or double once past the table.
fn next_capacity(capacity: usize) -> usize {
    PRIME_CAPACITIES
        .iter()
        .copied()
        .find(|&prime| prime > capacity)
        .unwrap_or_else(|| capacity.saturating_mul(2))
}

/// Rejects load factors that are not finite or fall below [`MIN_MAX_LOAD_FACTOR`].
pub(crate) fn check_load_factor(max_load_factor: f64) -> Result<()> {
    if max_load_factor.is_finite() && max_load_factor >= MIN_MAX_LOAD_FACTOR {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "max load factor must be finite and at least {MIN_MAX_LOAD_FACTOR}, got {max_load_factor}"
        )))
    }
}

#[allow(clippy::cast_precision_loss)]
fn exceeds(len: usize, capacity: usize, max_load_factor: f64) -> bool {
    len as f64 > capacity as f64 * max_load_factor
}

/// A hash map implemented with separate chaining.
///
/// Keys are compared with [`Eq`] and hashed with the map's [`BuildHasher`], which defaults
/// to [`ahash::RandomState`]. As with the standard map, lookups accept any borrowed form of
/// the key whose `Hash` and `Eq` agree with the key's.
///
/// # Examples
///
/// ```
/// use wabi_monitor::HashMap;
///
/// let mut cases = HashMap::new();
/// cases.insert("Greece", 2);
/// cases.insert("Germany", 1);
/// assert_eq!(cases.insert("Greece", 3), Some(2));
/// assert_eq!(cases.get("Greece"), Some(&3));
/// assert_eq!(cases.remove("Germany"), Some(1));
/// assert_eq!(cases.len(), 1);
/// ```
#[derive(Clone)]
pub struct HashMap<K, V, S = RandomState> {
    buckets: Vec<Vec<(K, V)>>,
    len: usize,
    max_load_factor: f64,
    hash_builder: S,
}

impl<K, V> HashMap<K, V> {
    /// Creates an empty map. Buckets are allocated on the first insert.
    #[must_use]
    pub fn new() -> Self {
        HashMap::with_hasher(RandomState::new())
    }

    /// Creates an empty map that can hold `capacity` entries without growing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Creates an empty map that grows once `len / capacity` would exceed `max_load_factor`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] unless `max_load_factor` is finite and at least
    /// [`MIN_MAX_LOAD_FACTOR`].
    pub fn with_load_factor(max_load_factor: f64) -> Result<Self> {
        HashMap::with_capacity_and_load_factor(0, max_load_factor)
    }

    /// Combination of [`with_capacity`](Self::with_capacity) and
    /// [`with_load_factor`](Self::with_load_factor).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] unless `max_load_factor` is finite and at least
    /// [`MIN_MAX_LOAD_FACTOR`].
    pub fn with_capacity_and_load_factor(capacity: usize, max_load_factor: f64) -> Result<Self> {
        check_load_factor(max_load_factor)?;
        let mut map = HashMap::with_hasher(RandomState::new());
        map.max_load_factor = max_load_factor;
        map.reserve(capacity);
        Ok(map)
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Creates an empty map hashing keys with `hash_builder`.
    pub fn with_hasher(hash_builder: S) -> Self {
        HashMap {
            buckets: Vec::new(),
            len: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            hash_builder,
        }
    }

    /// Creates an empty map hashing keys with `hash_builder`, with room for `capacity` entries.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let mut map = HashMap::with_hasher(hash_builder);
        map.reserve(capacity);
        map
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of buckets.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the load factor past which the map grows.
    #[must_use]
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// Removes every entry and releases the buckets.
    pub fn clear(&mut self) {
        self.buckets = Vec::new();
        self.len = 0;
    }

    /// An iterator over the entries, in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.buckets.iter().flatten().map(|(k, v)| (k, v))
    }

    /// An iterator over the keys, in bucket order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// An iterator over the values, in bucket order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    // Sizes an empty map for `capacity` entries.
    fn reserve(&mut self, capacity: usize) {
        debug_assert!(self.buckets.is_empty(), "`reserve()` - map already has buckets!");
        if capacity == 0 {
            return;
        }
        let mut buckets = PRIME_CAPACITIES[0];
        while exceeds(capacity, buckets, self.max_load_factor) {
            let next = next_capacity(buckets);
            if next == buckets {
                break;
            }
            buckets = next;
        }
        self.buckets.resize_with(buckets, Vec::new);
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    #[allow(clippy::cast_possible_truncation)]
    fn bucket_of<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        (self.hash_builder.hash_one(key) % self.buckets.len() as u64) as usize
    }

    fn locate<Q>(&self, key: &Q) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.buckets.is_empty() {
            return None;
        }
        let bucket = self.bucket_of(key);
        let index = self.buckets[bucket].iter().position(|(k, _)| k.borrow() == key)?;
        Some((bucket, index))
    }

    /// Rebuilds the table with the next capacity.
    fn grow(&mut self) {
        let from = self.buckets.len();
        let to = next_capacity(from);
        trace!(from, to, len = self.len, "rehashing");

        let old = mem::take(&mut self.buckets);
        self.buckets.resize_with(to, Vec::new);
        for (key, value) in old.into_iter().flatten() {
            let bucket = self.bucket_of(&key);
            self.buckets[bucket].push((key, value));
        }
    }

    // Adds an entry known to be absent. Returns where it landed.
    fn push_new(&mut self, key: K, value: V) -> (usize, usize) {
        while self.buckets.is_empty() || exceeds(self.len + 1, self.buckets.len(), self.max_load_factor) {
            self.grow();
        }
        let bucket = self.bucket_of(&key);
        self.buckets[bucket].push((key, value));
        self.len += 1;
        (bucket, self.buckets[bucket].len() - 1)
    }

    /// Inserts a key-value pair, returning the value previously stored under an equal key.
    ///
    /// On overwrite the stored key is replaced by `key` as well.
    ///
    /// # Complexity
    ///
    /// O(1) on average, O(n) when the insert triggers a rehash.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some((bucket, index)) = self.locate(&key) {
            let (_, old_value) = mem::replace(&mut self.buckets[bucket][index], (key, value));
            return Some(old_value);
        }
        self.push_new(key, value);
        None
    }

    /// Returns the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (bucket, index) = self.locate(key)?;
        let (k, v) = &self.buckets[bucket][index];
        Some((k, v))
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (bucket, index) = self.locate(key)?;
        Some(&mut self.buckets[bucket][index].1)
    }

    /// Returns `true` if an entry with an equal key exists.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.locate(key).is_some()
    }

    /// Returns the value under `key`, inserting `default()` first if the key is absent.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: K, default: F) -> &mut V {
        let (bucket, index) = match self.locate(&key) {
            Some(at) => at,
            None => self.push_new(key, default()),
        };
        &mut self.buckets[bucket][index].1
    }

    /// Removes the entry for `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes the entry for `key`, returning the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (bucket, index) = self.locate(key)?;
        self.len -= 1;
        Some(self.buckets[bucket].swap_remove(index))
    }
}

impl<K, V, S: Default> Default for HashMap<K, V, S> {
    fn default() -> Self {
        HashMap::with_hasher(S::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for HashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HashMap::default();
        map.extend(iter);
        map
    }
}

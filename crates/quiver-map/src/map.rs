//! Typed map facade over [`RawTable`].

#![allow(unsafe_code)]

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem::{ManuallyDrop, MaybeUninit};

use quiver_core::{checked_descriptor, Described, TypeDescriptor};

use crate::config::MapConfig;
use crate::table::{RawIter, RawTable};

/// Summary of probe distances over every occupied slot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProbeStats {
    /// Largest probe distance.
    pub max: usize,
    /// Mean probe distance (0 for an empty map).
    pub mean: f64,
    /// Number of entries summarised.
    pub len: usize,
}

/// A Robin-Hood hash map from `K` to `V`, driven by their
/// [`TypeDescriptor`]s.
///
/// Keys must provide `equal` and `hash`; construction raises a
/// [`ContractViolation`](quiver_core::ContractViolation) otherwise.
/// Iteration order is slot order, not insertion order.
///
/// ```
/// use quiver_map::HashMap;
///
/// let mut ages: HashMap<String, u32> = HashMap::new();
/// ages.insert("ada".to_owned(), 36);
/// assert_eq!(ages.insert("ada".to_owned(), 37), Some(36));
/// assert_eq!(ages.get(&"ada".to_owned()), Some(&37));
/// assert_eq!(ages.capacity(), 8);
/// ```
pub struct HashMap<K: Described, V: Described> {
    raw: RawTable,
    _marker: PhantomData<(K, V)>,
}

fn erase<T>(value: &mut ManuallyDrop<T>) -> *mut u8 {
    (&mut **value as *mut T).cast()
}

fn key_ptr<K>(key: &K) -> *const u8 {
    (key as *const K).cast()
}

impl<K: Described, V: Described> HashMap<K, V> {
    /// Create an empty map without allocating.
    #[track_caller]
    pub fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    /// Create an empty map whose first allocation follows `config`.
    ///
    /// Raises a descriptor mismatch if `K`'s or `V`'s descriptor does not
    /// match the type's size and alignment.
    #[track_caller]
    pub fn with_config(config: MapConfig) -> Self {
        let key = checked_descriptor::<K>("HashMap::new");
        let value = checked_descriptor::<V>("HashMap::new");
        Self {
            raw: RawTable::new(key, value, config),
            _marker: PhantomData,
        }
    }

    /// Create a map with room for `capacity` entries.
    #[track_caller]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut map = Self::new();
        map.reserve(capacity);
        map
    }

    /// Number of entries.
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Number of slots (0 or a power of two).
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Whether the map is empty.
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The type-erased engine.
    pub const fn as_raw(&self) -> &RawTable {
        &self.raw
    }

    /// Insert `value` under `key`, returning the previous value if the key
    /// was present. The previous key is dropped and replaced by `key`.
    #[track_caller]
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut key = ManuallyDrop::new(key);
        let mut value = ManuallyDrop::new(value);
        let mut previous = MaybeUninit::<V>::uninit();
        // SAFETY: `key` and `value` are live and not touched again;
        // `previous` is initialised iff the insert reports a replacement.
        unsafe {
            self.raw
                .insert(erase(&mut key), erase(&mut value), Some(previous.as_mut_ptr().cast()))
                .then(|| previous.assume_init())
        }
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let mut value = MaybeUninit::<V>::uninit();
        // SAFETY: `value` is initialised iff the removal succeeds.
        unsafe {
            self.raw
                .remove(key_ptr(key), None, Some(value.as_mut_ptr().cast()))
                .then(|| value.assume_init())
        }
    }

    /// Remove `key`, returning the stored key and its value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let mut stored = MaybeUninit::<K>::uninit();
        let mut value = MaybeUninit::<V>::uninit();
        // SAFETY: both outputs are initialised iff the removal succeeds.
        unsafe {
            self.raw
                .remove(
                    key_ptr(key),
                    Some(stored.as_mut_ptr().cast()),
                    Some(value.as_mut_ptr().cast()),
                )
                .then(|| (stored.assume_init(), value.assume_init()))
        }
    }

    /// The value stored for `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        // SAFETY: the pointer refers to a live `V` owned by the map.
        unsafe { self.raw.get(key_ptr(key)).map(|v| v.cast::<V>().as_ref()) }
    }

    /// The value stored for `key`, mutably.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        // SAFETY: as for `get`, with unique access through `&mut self`.
        unsafe { self.raw.get(key_ptr(key)).map(|v| v.cast::<V>().as_mut()) }
    }

    /// The stored key and value for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        // SAFETY: both pointers refer to live values owned by the map.
        unsafe {
            self.raw
                .get_entry(key_ptr(key))
                .map(|(k, v)| (k.cast::<K>().as_ref(), v.cast::<V>().as_ref()))
        }
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        // SAFETY: `key` is a live `K`.
        unsafe { self.raw.contains_key(key_ptr(key)) }
    }

    /// Drop every entry, keeping the slot index.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Ensure room for `additional` more entries.
    #[track_caller]
    pub fn reserve(&mut self, additional: usize) {
        self.raw.reserve(additional);
    }

    /// Shrink the index to the next power of two at or above `len`, or
    /// release it when empty.
    pub fn shrink_to_fit(&mut self) {
        self.raw.shrink_to_fit();
    }

    /// Iterate over `(key, value)` pairs in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            raw: self.raw.iter(),
            _marker: PhantomData,
        }
    }

    /// Iterate over `(key, value)` pairs with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            raw: self.raw.iter(),
            _marker: PhantomData,
        }
    }

    /// Iterate over keys in slot order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Iterate over values in slot order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Call `f` on every entry in slot order.
    pub fn for_each(&mut self, mut f: impl FnMut(&K, &mut V)) {
        for (key, value) in self.iter_mut() {
            f(key, value);
        }
    }

    /// Move every entry out, leaving `self` empty with no slot index.
    pub fn take(&mut self) -> Self {
        Self {
            raw: self.raw.take(),
            _marker: PhantomData,
        }
    }

    /// Probe-distance summary over every occupied slot.
    pub fn probe_stats(&self) -> ProbeStats {
        let distances = (0..self.raw.capacity()).filter_map(|i| self.raw.probe_distance(i));
        let (len, total, max) = distances.fold((0, 0, 0), |(len, total, max), d| {
            (len + 1, total + d, max.max(d))
        });
        ProbeStats {
            max,
            mean: if len == 0 { 0.0 } else { total as f64 / len as f64 },
            len,
        }
    }
}

impl<K: Described, V: Described> Default for HashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Described, V: Described> Clone for HashMap<K, V> {
    #[track_caller]
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.duplicate(),
            _marker: PhantomData,
        }
    }
}

impl<K: Described + fmt::Debug, V: Described + fmt::Debug> fmt::Debug for HashMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Described, V: Described> Extend<(K, V)> for HashMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Described, V: Described> FromIterator<(K, V)> for HashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K: Described, V: Described> IntoIterator for &'a HashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K: Described, V: Described> IntoIterator for &'a mut HashMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

// Maps nest inside other containers; they are copyable (when their keys
// and values are) but have no order, equality or hash of their own.
// SAFETY: built for `HashMap<K, V>` itself.
unsafe impl<K: Described, V: Described> Described for HashMap<K, V> {
    const DESCRIPTOR: &'static TypeDescriptor =
        &TypeDescriptor::builder::<HashMap<K, V>>().copy().build();
}

/// Iterator over `(&K, &V)`.
pub struct Iter<'a, K, V> {
    raw: RawIter<'a>,
    _marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the table outlives `'a` and is borrowed shared.
        self.raw
            .next()
            .map(|(k, v)| unsafe { (k.cast::<K>().as_ref(), v.cast::<V>().as_ref()) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)`.
pub struct IterMut<'a, K, V> {
    raw: RawIter<'a>,
    _marker: PhantomData<(&'a K, &'a mut V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the table is borrowed uniquely for `'a` and each entry
        // block is yielded once.
        self.raw
            .next()
            .map(|(k, v)| unsafe { (k.cast::<K>().as_ref(), v.cast::<V>().as_mut()) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Iterator over keys.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over values.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

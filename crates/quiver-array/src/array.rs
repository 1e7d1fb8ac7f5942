//! Typed array facade over [`RawArray`].

#![allow(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem::{ManuallyDrop, MaybeUninit};
use std::ops::{Index, IndexMut};
use std::slice;

use quiver_core::{check_index, checked_descriptor, Described, TypeDescriptor};

use crate::raw::RawArray;

/// A growable array of `T`, stored and managed through `T`'s
/// [`TypeDescriptor`].
///
/// Operations that need a capability the descriptor lacks (for example
/// [`Array::sort`] on a type without `compare`) raise a
/// [`ContractViolation`](quiver_core::ContractViolation) naming the
/// operation, the type and the capability.
///
/// `Array<T>` is `Eq` and `Ord` only when `T` is:
///
/// ```compile_fail
/// fn total<T: Eq>() {}
/// total::<quiver_array::Array<f64>>();
/// ```
pub struct Array<T: Described> {
    raw: RawArray,
    _marker: PhantomData<T>,
}

fn erase<T>(value: &mut ManuallyDrop<T>) -> *mut u8 {
    (&mut **value as *mut T).cast()
}

impl<T: Described> Array<T> {
    /// Create an empty array without allocating.
    ///
    /// Raises [`ContractViolation::DescriptorMismatch`] if `T`'s
    /// descriptor does not match `T`'s size and alignment.
    ///
    /// [`ContractViolation::DescriptorMismatch`]: quiver_core::ContractViolation::DescriptorMismatch
    #[track_caller]
    pub fn new() -> Self {
        Self {
            raw: RawArray::new(checked_descriptor::<T>("Array::new")),
            _marker: PhantomData,
        }
    }

    /// Create an empty array with room for `capacity` values.
    #[track_caller]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            raw: RawArray::with_capacity(
                checked_descriptor::<T>("Array::with_capacity"),
                capacity,
            ),
            _marker: PhantomData,
        }
    }

    /// Move every value of `values` into a new array.
    pub fn from_vec(values: Vec<T>) -> Self {
        let mut array = Self::with_capacity(values.len());
        array.append_range(values);
        array
    }

    /// Number of values.
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Number of values the buffer holds without reallocating.
    pub const fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Whether the array is empty.
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The element descriptor.
    pub const fn descriptor(&self) -> &'static TypeDescriptor {
        self.raw.descriptor()
    }

    /// The type-erased engine.
    pub const fn as_raw(&self) -> &RawArray {
        &self.raw
    }

    /// The values as a slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the buffer holds `len` initialised `T`s and the pointer is
        // aligned (dangling when empty).
        unsafe { slice::from_raw_parts(self.raw.as_mut_ptr().cast::<T>(), self.len()) }
    }

    /// The values as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as for `as_slice`, with unique access through `&mut self`.
        unsafe { slice::from_raw_parts_mut(self.raw.as_mut_ptr().cast::<T>(), self.len()) }
    }

    /// Iterate over the values.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Iterate mutably over the values.
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// The value at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// The value at `index`, mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// The first value.
    pub fn first(&self) -> Option<&T> {
        self.as_slice().first()
    }

    /// The last value.
    pub fn last(&self) -> Option<&T> {
        self.as_slice().last()
    }

    /// Append a value.
    #[track_caller]
    pub fn push(&mut self, value: T) {
        let mut value = ManuallyDrop::new(value);
        // SAFETY: `value` is a live `T` that is not touched again.
        unsafe { self.raw.push(erase(&mut value)) };
    }

    /// Remove and return the last value.
    pub fn pop(&mut self) -> Option<T> {
        let mut out = MaybeUninit::<T>::uninit();
        // SAFETY: `out` is storage for one `T`, initialised iff `pop`
        // reports success.
        unsafe {
            self.raw
                .pop(Some(out.as_mut_ptr().cast()))
                .then(|| out.assume_init())
        }
    }

    /// Insert `value` at `index`, shifting later values right.
    ///
    /// # Panics
    ///
    /// If `index > len`.
    #[track_caller]
    pub fn insert(&mut self, index: usize, value: T) {
        let mut value = ManuallyDrop::new(value);
        // SAFETY: `value` is a live `T` that is not touched again.
        unsafe { self.raw.insert(index, erase(&mut value)) };
    }

    /// Remove and return the value at `index`, shifting later values left.
    ///
    /// # Panics
    ///
    /// If `index >= len`.
    #[track_caller]
    pub fn remove(&mut self, index: usize) -> T {
        let mut out = MaybeUninit::<T>::uninit();
        // SAFETY: `remove` either panics or moves one `T` into `out`.
        unsafe {
            self.raw.remove(index, Some(out.as_mut_ptr().cast()));
            out.assume_init()
        }
    }

    /// Move every value of `values` onto the end.
    #[track_caller]
    pub fn append_range(&mut self, values: Vec<T>) {
        let mut values = ManuallyDrop::new(values);
        let count = values.len();
        // SAFETY: the vector's values are moved out bitwise and its length
        // is zeroed before its buffer is released.
        unsafe {
            self.raw.append_range(values.as_mut_ptr().cast(), count);
            values.set_len(0);
            ManuallyDrop::drop(&mut values);
        }
    }

    /// Move every value of `values` in at `index`.
    ///
    /// # Panics
    ///
    /// If `index > len`.
    #[track_caller]
    pub fn insert_range(&mut self, index: usize, values: Vec<T>) {
        let mut values = ManuallyDrop::new(values);
        let count = values.len();
        // SAFETY: as for `append_range`.
        unsafe {
            self.raw.insert_range(index, values.as_mut_ptr().cast(), count);
            values.set_len(0);
            ManuallyDrop::drop(&mut values);
        }
    }

    /// Remove up to `len` values starting at `index`.
    ///
    /// The first `keep` removed values are returned; any others are
    /// destroyed. `len` is clamped to the end of the array.
    ///
    /// # Panics
    ///
    /// If `len > 0` and `index >= self.len()`.
    #[track_caller]
    pub fn remove_range(&mut self, index: usize, len: usize, keep: usize) -> Vec<T> {
        let out_len = keep.min(len);
        let mut out: Vec<T> = Vec::with_capacity(out_len);
        // SAFETY: `out` has room for `out_len` values and its length is set
        // to exactly the number moved in.
        unsafe {
            let moved = self
                .raw
                .remove_range(index, len, Some(out.as_mut_ptr().cast()), out_len);
            out.set_len(moved);
        }
        out
    }

    /// Destroy every value, keeping the buffer.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Ensure room for `additional` more values (amortised growth).
    #[track_caller]
    pub fn reserve(&mut self, additional: usize) {
        self.raw.reserve(additional);
    }

    /// Ensure room for exactly `additional` more values.
    #[track_caller]
    pub fn reserve_exact(&mut self, additional: usize) {
        self.raw.reserve_exact(additional);
    }

    /// Release unused capacity.
    pub fn shrink_to_fit(&mut self) {
        self.raw.shrink_to_fit();
    }

    /// Shrink capacity to exactly `capacity`. Ignored when `capacity` is
    /// below [`len`](Self::len) or not below the current capacity.
    pub fn shrink_to(&mut self, capacity: usize) {
        self.raw.shrink_to(capacity);
    }

    /// Destroy values past `len`.
    pub fn truncate(&mut self, len: usize) {
        self.raw.truncate(len);
    }

    /// Truncate to `len`, or grow to `len` with copies of `pad`. `pad` is
    /// consumed either way and fills the last slot when growing.
    ///
    /// Growing requires `copy`.
    #[track_caller]
    pub fn resize(&mut self, len: usize, pad: T) {
        let mut pad = ManuallyDrop::new(pad);
        // SAFETY: `pad` is a live `T` consumed by `resize`.
        unsafe { self.raw.resize(len, erase(&mut pad)) };
    }

    /// Whether a value equal to `value` is present. Requires `equal`.
    #[track_caller]
    pub fn contains(&self, value: &T) -> bool {
        // SAFETY: `value` is a live `T`.
        unsafe { self.raw.contains((value as *const T).cast()) }
    }

    /// Index of the first value equal to `value`. Requires `equal`.
    #[track_caller]
    pub fn find(&self, value: &T) -> Option<usize> {
        // SAFETY: `value` is a live `T`.
        unsafe { self.raw.find((value as *const T).cast()) }
    }

    /// Index of the first value satisfying `pred`.
    pub fn find_if(&self, mut pred: impl FnMut(&T) -> bool) -> Option<usize> {
        // SAFETY: the engine only passes live slots.
        self.raw.find_if(|p| pred(unsafe { &*p.cast::<T>() }))
    }

    /// Binary search in an array ordered by `compare`. On ties, returns the
    /// first probed match. Requires `compare`.
    #[track_caller]
    pub fn binary_search(&self, value: &T) -> Option<usize> {
        // SAFETY: `value` is a live `T`.
        unsafe { self.raw.binary_search((value as *const T).cast()) }
    }

    /// Binary search with a probe comparator.
    pub fn binary_search_by(&self, mut f: impl FnMut(&T) -> Ordering) -> Option<usize> {
        // SAFETY: the engine only passes live slots.
        self.raw.binary_search_with(|p| f(unsafe { &*p.cast::<T>() }))
    }

    /// Sort by `compare`. Not stable.
    #[track_caller]
    pub fn sort(&mut self) {
        self.raw.sort();
    }

    /// Sort with a custom comparator. Not stable.
    pub fn sort_by(&mut self, mut cmp: impl FnMut(&T, &T) -> Ordering) {
        // SAFETY: the engine only passes live slots.
        self.raw
            .sort_with(|a, b| unsafe { cmp(&*a.cast::<T>(), &*b.cast::<T>()) });
    }

    /// Call `f` on every value in order.
    pub fn for_each(&mut self, mut f: impl FnMut(&mut T)) {
        // SAFETY: the engine only passes live slots, one at a time.
        self.raw.for_each(|p| f(unsafe { &mut *p.cast::<T>() }));
    }

    /// Move the contents out, leaving `self` empty with no buffer.
    pub fn take(&mut self) -> Self {
        Self {
            raw: self.raw.take(),
            _marker: PhantomData,
        }
    }
}

impl<T: Described> Default for Array<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Described> Clone for Array<T> {
    #[track_caller]
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.duplicate(),
            _marker: PhantomData,
        }
    }
}

impl<T: Described> PartialEq for Array<T> {
    #[track_caller]
    fn eq(&self, other: &Self) -> bool {
        self.raw.equal(&other.raw)
    }
}

impl<T: Described + Eq> Eq for Array<T> {}

impl<T: Described + Ord> PartialOrd for Array<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Described + Ord> Ord for Array<T> {
    #[track_caller]
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.compare(&other.raw)
    }
}

impl<T: Described> Hash for Array<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.raw.hash());
    }
}

impl<T: Described + fmt::Debug> fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Described> Index<usize> for Array<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        check_index("Array::index", index, self.len(), false);
        &self.as_slice()[index]
    }
}

impl<T: Described> IndexMut<usize> for Array<T> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        check_index("Array::index_mut", index, self.len(), false);
        &mut self.as_mut_slice()[index]
    }
}

impl<T: Described> Extend<T> for Array<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for value in iter {
            self.push(value);
        }
    }
}

impl<T: Described> FromIterator<T> for Array<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        array.extend(iter);
        array
    }
}

impl<T: Described> From<Vec<T>> for Array<T> {
    fn from(values: Vec<T>) -> Self {
        Self::from_vec(values)
    }
}

impl<'a, T: Described> IntoIterator for &'a Array<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T: Described> IntoIterator for &'a mut Array<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

unsafe fn compare_arrays<T: Described>(lhs: *const u8, rhs: *const u8) -> Ordering {
    // SAFETY: caller guarantees both pointers hold an `Array<T>`.
    let (lhs, rhs) = unsafe { (&*lhs.cast::<Array<T>>(), &*rhs.cast::<Array<T>>()) };
    lhs.raw.compare(&rhs.raw)
}

// Arrays are values too: an array of arrays carries the nested array's
// descriptor, and the outer container calls into it like any other type.
// Ordering goes through the element descriptor, so it is available even
// when `T` is not `Ord` and raises only if `T` lacks `compare`.
// SAFETY: built for `Array<T>` itself, and `compare_arrays::<T>` reads
// both pointers as `Array<T>`.
unsafe impl<T: Described> Described for Array<T> {
    const DESCRIPTOR: &'static TypeDescriptor = &unsafe {
        TypeDescriptor::builder::<Array<T>>()
            .copy()
            .equal()
            .hash()
            .compare_with(compare_arrays::<T>)
    }
    .build();
}

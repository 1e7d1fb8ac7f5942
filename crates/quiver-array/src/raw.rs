//! Type-erased array engine.
//!
//! [`RawArray`] stores values it knows only through a [`TypeDescriptor`]:
//! it places values with the descriptor's `move`, duplicates them with
//! `copy`, and releases them with `destroy`. Shifting within the buffer
//! and relocation into a grown buffer are plain byte copies, which is
//! sound because every Rust value is trivially relocatable.
//!
//! All methods taking element pointers are `unsafe`: the pointers must
//! refer to values of the descriptor's type.

#![allow(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hasher;
use std::ptr::{self, NonNull};

use log::trace;
use quiver_core::alloc::{allocate, array_layout, deallocate};
use quiver_core::{check_index, ContractViolation, FnvHasher, TypeDescriptor};

/// A growable, contiguous, type-erased sequence.
///
/// Invariants: `len <= capacity`, and `capacity == 0` exactly when no
/// buffer is held. The buffer is aligned to the element alignment.
pub struct RawArray {
    data: Option<NonNull<u8>>,
    len: usize,
    capacity: usize,
    elem: &'static TypeDescriptor,
}

impl RawArray {
    /// Create an empty array without allocating.
    pub const fn new(elem: &'static TypeDescriptor) -> Self {
        Self {
            data: None,
            len: 0,
            capacity: 0,
            elem,
        }
    }

    /// Create an empty array able to hold `capacity` values without
    /// reallocating.
    #[track_caller]
    pub fn with_capacity(elem: &'static TypeDescriptor, capacity: usize) -> Self {
        let mut array = Self::new(elem);
        if capacity > 0 {
            array.set_capacity("Array::with_capacity", capacity);
        }
        array
    }

    /// Create an array by moving `count` contiguous values out of `elems`.
    ///
    /// # Safety
    ///
    /// `elems` must point to `count` initialised values of the element
    /// type. They are logically uninitialised afterwards.
    #[track_caller]
    pub unsafe fn from_moved(elem: &'static TypeDescriptor, elems: *mut u8, count: usize) -> Self {
        let mut array = Self::with_capacity(elem, count);
        // SAFETY: forwarded caller contract.
        unsafe { array.append_range(elems, count) };
        array
    }

    /// Create an array holding copies of `count` contiguous values.
    ///
    /// Requires the `copy` capability.
    ///
    /// # Safety
    ///
    /// `elems` must point to `count` initialised values of the element type.
    #[track_caller]
    pub unsafe fn from_copied(elem: &'static TypeDescriptor, elems: *const u8, count: usize) -> Self {
        // SAFETY: forwarded caller contract.
        unsafe { Self::copied("Array::from_copied", elem, elems, count) }
    }

    #[track_caller]
    unsafe fn copied(
        caller: &'static str,
        elem: &'static TypeDescriptor,
        elems: *const u8,
        count: usize,
    ) -> Self {
        let copy = elem.require_copy(caller);
        let mut array = Self::with_capacity(elem, count);
        for i in 0..count {
            // SAFETY: `i < count <= capacity`; the source is in bounds per
            // the caller contract.
            unsafe { copy(array.slot(i), elems.add(i * elem.size())) };
            array.len = i + 1;
        }
        array
    }

    /// Number of live values.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Number of values the buffer can hold.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether there are no live values.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The element descriptor.
    pub const fn descriptor(&self) -> &'static TypeDescriptor {
        self.elem
    }

    /// The buffer, or `None` when nothing is allocated.
    pub const fn buffer(&self) -> Option<NonNull<u8>> {
        self.data
    }

    /// Pointer to the first slot; dangling but aligned when no buffer is
    /// held.
    pub fn as_mut_ptr(&self) -> *mut u8 {
        match self.data {
            Some(data) => data.as_ptr(),
            None => ptr::without_provenance_mut(self.elem.align()),
        }
    }

    /// Pointer to the value at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<NonNull<u8>> {
        if index < self.len {
            // SAFETY: `index < len`, so the slot lies inside the buffer.
            NonNull::new(unsafe { self.slot(index) })
        } else {
            None
        }
    }

    /// Pointer to the first value.
    pub fn first(&self) -> Option<NonNull<u8>> {
        self.get(0)
    }

    /// Pointer to the last value.
    pub fn last(&self) -> Option<NonNull<u8>> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Append one value, growing the buffer if it is full.
    ///
    /// # Safety
    ///
    /// `elem` must hold an initialised value of the element type; it is
    /// moved from.
    #[track_caller]
    pub unsafe fn push(&mut self, elem: *mut u8) {
        if self.len == self.capacity {
            self.grow("Array::push", 1);
        }
        // SAFETY: `len < capacity` after growth.
        unsafe { self.elem.move_value(self.slot(self.len), elem) };
        self.len += 1;
    }

    /// Remove the last value, moving it into `out` or destroying it when
    /// `out` is `None`. Returns `false` on an empty array.
    ///
    /// # Safety
    ///
    /// `out`, if given, must be valid uninitialised storage for one value.
    pub unsafe fn pop(&mut self, out: Option<*mut u8>) -> bool {
        if self.len == 0 {
            return false;
        }
        self.len -= 1;
        // SAFETY: the slot at the old `len - 1` is initialised and no
        // longer counted as live.
        unsafe { self.extract_one(self.len, out) };
        true
    }

    /// Insert one value at `index`, shifting the tail right.
    /// `index == len` appends.
    ///
    /// # Safety
    ///
    /// As for [`RawArray::push`].
    #[track_caller]
    pub unsafe fn insert(&mut self, index: usize, elem: *mut u8) {
        let len = self.len;
        check_index("Array::insert", index, len, true);
        if len == self.capacity {
            self.grow("Array::insert", 1);
        }
        // SAFETY: `index <= len < capacity`; the tail moves one slot right
        // into spare capacity, then the gap is filled.
        unsafe {
            self.shift(index + 1, index, len - index);
            self.elem.move_value(self.slot(index), elem);
        }
        self.len = len + 1;
    }

    /// Remove the value at `index`, moving it into `out` or destroying it,
    /// and shift the tail left.
    ///
    /// # Safety
    ///
    /// As for [`RawArray::pop`].
    #[track_caller]
    pub unsafe fn remove(&mut self, index: usize, out: Option<*mut u8>) {
        let len = self.len;
        check_index("Array::remove", index, len, false);
        // Values past `index` are leaked rather than double-dropped if the
        // destructor unwinds.
        self.len = index;
        // SAFETY: `index < len`; the slot is initialised and the tail shift
        // stays inside the live range.
        unsafe {
            self.extract_one(index, out);
            self.shift(index, index + 1, len - index - 1);
        }
        self.len = len - 1;
    }

    /// Move `count` contiguous values from `elems` onto the end.
    ///
    /// # Safety
    ///
    /// `elems` must point to `count` initialised values, which are moved
    /// from.
    #[track_caller]
    pub unsafe fn append_range(&mut self, elems: *mut u8, count: usize) {
        if count == 0 {
            return;
        }
        self.grow("Array::append_range", count);
        // SAFETY: capacity covers `len + count`.
        unsafe { self.place_range(self.len, elems, count) };
        self.len += count;
    }

    /// Move `count` contiguous values from `elems` in at `index`.
    ///
    /// # Safety
    ///
    /// As for [`RawArray::append_range`].
    #[track_caller]
    pub unsafe fn insert_range(&mut self, index: usize, elems: *mut u8, count: usize) {
        if count == 0 {
            return;
        }
        let len = self.len;
        check_index("Array::insert_range", index, len, true);
        self.grow("Array::insert_range", count);
        // SAFETY: capacity covers `len + count`; the tail moves into spare
        // capacity before the gap is filled.
        unsafe {
            self.shift(index + count, index, len - index);
            self.place_range(index, elems, count);
        }
        self.len = len + count;
    }

    /// Remove up to `count` values starting at `index`.
    ///
    /// `count` is clamped to the live tail. The first `min(count, out_len)`
    /// removed values are moved into `out`; the rest are destroyed.
    /// Returns how many values were moved out.
    ///
    /// # Safety
    ///
    /// `out`, if given, must be valid uninitialised storage for `out_len`
    /// values.
    #[track_caller]
    pub unsafe fn remove_range(
        &mut self,
        index: usize,
        count: usize,
        out: Option<*mut u8>,
        out_len: usize,
    ) -> usize {
        if count == 0 {
            return 0;
        }
        let len = self.len;
        check_index("Array::remove_range", index, len, false);
        let count = count.min(len - index);
        self.len = index;
        // SAFETY: `[index, index + count)` is live; the tail shift stays in
        // the old live range.
        let moved = unsafe {
            let moved = self.extract_range(index, count, out, out_len);
            self.shift(index, index + count, len - index - count);
            moved
        };
        self.len = len - count;
        moved
    }

    /// Destroy every value, keeping the buffer.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Ensure room for `additional` more values, growing to at least twice
    /// the current capacity when growth is needed.
    #[track_caller]
    pub fn reserve(&mut self, additional: usize) {
        self.grow("Array::reserve", additional);
    }

    /// Ensure room for exactly `additional` more values.
    #[track_caller]
    pub fn reserve_exact(&mut self, additional: usize) {
        let required = self.required("Array::reserve_exact", additional);
        if required > self.capacity {
            self.set_capacity("Array::reserve_exact", required);
        }
    }

    /// Shrink the buffer to the live length.
    pub fn shrink_to_fit(&mut self) {
        if self.capacity > self.len {
            self.set_capacity("Array::shrink_to_fit", self.len);
        }
    }

    /// Shrink the buffer to exactly `capacity` slots.
    ///
    /// Does nothing when `capacity` is below the live length or not below
    /// the current capacity.
    pub fn shrink_to(&mut self, capacity: usize) {
        if capacity < self.len || capacity >= self.capacity {
            return;
        }
        self.set_capacity("Array::shrink_to", capacity);
    }

    /// Destroy values past `len`. No-op if `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let old_len = self.len;
        self.len = len;
        if let Some(destroy) = self.elem.destroy_fn() {
            for i in len..old_len {
                // SAFETY: slots in `[len, old_len)` were live and are no
                // longer counted.
                unsafe { destroy(self.slot(i)) };
            }
        }
    }

    /// Truncate to `len`, or pad up to `len` with copies of `pad` (which
    /// fills the final slot itself). `pad` is consumed either way.
    ///
    /// Padding requires the `copy` capability.
    ///
    /// # Safety
    ///
    /// `pad` must hold an initialised value; it is moved from or destroyed.
    #[track_caller]
    pub unsafe fn resize(&mut self, len: usize, pad: *mut u8) {
        if len <= self.len {
            self.truncate(len);
            // SAFETY: `pad` is initialised and consumed here.
            unsafe { self.elem.destroy_value(pad) };
            return;
        }
        let copy = self.elem.require_copy("Array::resize");
        self.grow("Array::resize", len - self.len);
        for i in self.len..len - 1 {
            // SAFETY: `i < len <= capacity`.
            unsafe { copy(self.slot(i), pad) };
            self.len = i + 1;
        }
        // SAFETY: `len - 1 < capacity`; `pad` is moved into the last slot.
        unsafe { self.elem.move_value(self.slot(len - 1), pad) };
        self.len = len;
    }

    /// Whether a value equal to `elem` is present. Requires `equal`.
    ///
    /// # Safety
    ///
    /// `elem` must hold an initialised value of the element type.
    #[track_caller]
    pub unsafe fn contains(&self, elem: *const u8) -> bool {
        let equal = self.elem.require_equal("Array::contains");
        // SAFETY: forwarded caller contract; every probed slot is live.
        self.find_if(|probe| unsafe { equal(probe, elem) }).is_some()
    }

    /// Index of the first value equal to `elem`. Requires `equal`.
    ///
    /// # Safety
    ///
    /// `elem` must hold an initialised value of the element type.
    #[track_caller]
    pub unsafe fn find(&self, elem: *const u8) -> Option<usize> {
        let equal = self.elem.require_equal("Array::find");
        // SAFETY: forwarded caller contract; every probed slot is live.
        self.find_if(|probe| unsafe { equal(probe, elem) })
    }

    /// Index of the first value for which `pred` holds.
    pub fn find_if(&self, mut pred: impl FnMut(*const u8) -> bool) -> Option<usize> {
        // SAFETY: every index is below `len`.
        (0..self.len).find(|&i| pred(unsafe { self.slot(i) }))
    }

    /// Binary search for `elem` using the descriptor's `compare`.
    ///
    /// The array must already be ordered by `compare`. On ties the first
    /// probed match is returned, which is not necessarily the first equal
    /// value in storage order.
    ///
    /// # Safety
    ///
    /// `elem` must hold an initialised value of the element type.
    #[track_caller]
    pub unsafe fn binary_search(&self, elem: *const u8) -> Option<usize> {
        let compare = self.elem.require_compare("Array::binary_search");
        // SAFETY: forwarded caller contract; probes are live slots.
        self.binary_search_with(|probe| unsafe { compare(probe, elem) })
    }

    /// Binary search with a probe comparator returning how the probed
    /// value orders relative to the target.
    pub fn binary_search_with(&self, mut f: impl FnMut(*const u8) -> Ordering) -> Option<usize> {
        let (mut lo, mut hi) = (0, self.len);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            // SAFETY: `lo <= mid < hi <= len`.
            match f(unsafe { self.slot(mid) }) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Some(mid),
            }
        }
        None
    }

    /// Sort by the descriptor's `compare`. Not stable.
    #[track_caller]
    pub fn sort(&mut self) {
        let compare = self.elem.require_compare("Array::sort");
        // SAFETY: the comparator only sees live slots.
        self.sort_with(|a, b| unsafe { compare(a, b) });
    }

    /// Sort with a custom comparator. Not stable.
    ///
    /// The comparator orders an index permutation first; values are only
    /// moved once it has finished, so a panicking comparator leaves the
    /// array untouched. The permutation is then applied in place, one
    /// cycle at a time, through a single-value scratch buffer.
    pub fn sort_with(&mut self, mut cmp: impl FnMut(*const u8, *const u8) -> Ordering) {
        if self.len < 2 {
            return;
        }
        // `order[dst]` is the slot whose value belongs at `dst`.
        let mut order: Vec<usize> = (0..self.len).collect();
        // SAFETY: every index in `order` is below `len`.
        order.sort_unstable_by(|&a, &b| unsafe { cmp(self.slot(a), self.slot(b)) });

        let size = self.elem.size();
        let mut spare: Vec<u8> = Vec::with_capacity(size);
        let scratch = spare.as_mut_ptr();
        for start in 0..self.len {
            if order[start] == start {
                continue;
            }
            // SAFETY: `start` and every `src` are live slots, and `scratch`
            // holds `size` bytes. Slots are distinct within a cycle, and
            // each value is moved out of its slot before that slot is
            // overwritten.
            unsafe {
                ptr::copy_nonoverlapping(self.slot(start), scratch, size);
                let mut dst = start;
                loop {
                    let src = order[dst];
                    order[dst] = dst;
                    if src == start {
                        ptr::copy_nonoverlapping(scratch, self.slot(dst), size);
                        break;
                    }
                    ptr::copy_nonoverlapping(self.slot(src), self.slot(dst), size);
                    dst = src;
                }
            }
        }
    }

    /// Call `f` on every live value in order.
    pub fn for_each(&mut self, mut f: impl FnMut(*mut u8)) {
        for i in 0..self.len {
            // SAFETY: `i < len`.
            f(unsafe { self.slot(i) });
        }
    }

    /// An independent copy with freshly allocated storage. Requires `copy`.
    #[track_caller]
    pub fn duplicate(&self) -> Self {
        // SAFETY: the buffer holds `len` contiguous live values.
        unsafe { Self::copied("Array::duplicate", self.elem, self.as_mut_ptr(), self.len) }
    }

    /// Transfer ownership of the contents into a new array, leaving `self`
    /// empty with no buffer.
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Self::new(self.elem))
    }

    /// Lexicographic comparison by `compare`, then by length.
    #[track_caller]
    pub fn compare(&self, other: &Self) -> Ordering {
        let compare = self.elem.require_compare("Array::compare");
        for i in 0..self.len.min(other.len) {
            // SAFETY: `i` is live in both arrays.
            match unsafe { compare(self.slot(i), other.slot(i)) } {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.len.cmp(&other.len)
    }

    /// Element-wise equality by `equal`.
    #[track_caller]
    pub fn equal(&self, other: &Self) -> bool {
        let equal = self.elem.require_equal("Array::equal");
        // SAFETY: `i` is live in both arrays when lengths match.
        self.len == other.len && (0..self.len).all(|i| unsafe { equal(self.slot(i), other.slot(i)) })
    }

    /// Combined hash of the length and every value's `hash`.
    #[track_caller]
    pub fn hash(&self) -> u64 {
        let hash = self.elem.require_hash("Array::hash");
        let mut state = FnvHasher::default();
        state.write_usize(self.len);
        for i in 0..self.len {
            // SAFETY: `i < len`.
            state.write_u64(unsafe { hash(self.slot(i)) });
        }
        state.finish()
    }

    /// Pointer to slot `index`.
    ///
    /// # Safety
    ///
    /// `index <= capacity`, and a buffer must be held unless `index == 0`.
    #[inline]
    unsafe fn slot(&self, index: usize) -> *mut u8 {
        debug_assert!(index <= self.capacity);
        // SAFETY: in bounds of the buffer per the caller contract.
        unsafe { self.as_mut_ptr().add(index * self.elem.size()) }
    }

    /// Byte-move `count` slots from `src` to `dst` (regions may overlap).
    unsafe fn shift(&mut self, dst: usize, src: usize, count: usize) {
        if count == 0 {
            return;
        }
        // SAFETY: caller keeps both ranges inside the buffer.
        unsafe { ptr::copy(self.slot(src), self.slot(dst), count * self.elem.size()) };
    }

    unsafe fn place_range(&mut self, index: usize, elems: *mut u8, count: usize) {
        let size = self.elem.size();
        for i in 0..count {
            // SAFETY: caller guarantees capacity and `count` source values.
            unsafe { self.elem.move_value(self.slot(index + i), elems.add(i * size)) };
        }
    }

    unsafe fn extract_one(&mut self, index: usize, out: Option<*mut u8>) {
        // SAFETY: caller guarantees the slot is initialised.
        unsafe {
            let elem = self.slot(index);
            match out {
                Some(dst) => self.elem.move_value(dst, elem),
                None => self.elem.destroy_value(elem),
            }
        }
    }

    unsafe fn extract_range(
        &mut self,
        index: usize,
        count: usize,
        out: Option<*mut u8>,
        out_len: usize,
    ) -> usize {
        let size = self.elem.size();
        let moved = match out {
            Some(_) => count.min(out_len),
            None => 0,
        };
        if let Some(dst) = out {
            for i in 0..moved {
                // SAFETY: caller guarantees `out_len >= moved` slots at `dst`.
                unsafe { self.elem.move_value(dst.add(i * size), self.slot(index + i)) };
            }
        }
        for i in moved..count {
            // SAFETY: remaining removed slots are initialised.
            unsafe { self.elem.destroy_value(self.slot(index + i)) };
        }
        moved
    }

    #[track_caller]
    fn required(&self, operation: &'static str, additional: usize) -> usize {
        match self.len.checked_add(additional) {
            Some(required) => required,
            None => ContractViolation::CapacityOverflow { operation }.raise(),
        }
    }

    /// Amortised growth: at least `len + additional`, at least double.
    #[track_caller]
    fn grow(&mut self, operation: &'static str, additional: usize) {
        let required = self.required(operation, additional);
        if required <= self.capacity {
            return;
        }
        let target = required.max(self.capacity.saturating_mul(2));
        self.set_capacity(operation, target);
    }

    /// Reallocate to exactly `capacity` slots (`capacity >= len`).
    #[track_caller]
    fn set_capacity(&mut self, operation: &'static str, capacity: usize) {
        debug_assert!(capacity >= self.len);
        if capacity == 0 {
            self.release();
            return;
        }
        let layout = array_layout(operation, self.elem, capacity);
        let block = allocate(layout);
        trace!(
            "{operation}: reallocating {} buffer {} -> {} slots",
            self.elem.name(),
            self.capacity,
            capacity
        );
        if let Some(old) = self.data {
            // SAFETY: `len` values fit in both blocks; the blocks are
            // distinct, and the old one was allocated for `self.capacity`.
            unsafe {
                ptr::copy_nonoverlapping(old.as_ptr(), block.as_ptr(), self.len * self.elem.size());
                deallocate(old, array_layout(operation, self.elem, self.capacity));
            }
        }
        self.data = Some(block);
        self.capacity = capacity;
    }

    fn release(&mut self) {
        if let Some(old) = self.data.take() {
            let layout = array_layout("Array::release", self.elem, self.capacity);
            // SAFETY: the buffer was allocated for `capacity` slots.
            unsafe { deallocate(old, layout) };
        }
        self.capacity = 0;
    }
}

impl Drop for RawArray {
    fn drop(&mut self) {
        self.truncate(0);
        self.release();
    }
}

impl fmt::Debug for RawArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawArray")
            .field("elem", &self.elem.name())
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::Described;
    use std::mem::{ManuallyDrop, MaybeUninit};

    fn int_array(values: &[i32]) -> RawArray {
        let mut values = values.to_vec();
        // SAFETY: the vector holds `len` i32 values; i32 has no drop glue.
        unsafe { RawArray::from_moved(i32::DESCRIPTOR, values.as_mut_ptr().cast(), values.len()) }
    }

    fn contents(array: &RawArray) -> Vec<i32> {
        (0..array.len())
            .map(|i| unsafe { *array.get(i).unwrap().as_ptr().cast::<i32>() })
            .collect()
    }

    #[test]
    fn new_array_holds_no_buffer() {
        let array = RawArray::new(i32::DESCRIPTOR);
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
        assert!(array.buffer().is_none());
    }

    #[test]
    fn push_grows_by_doubling() {
        let mut array = RawArray::new(i32::DESCRIPTOR);
        let mut capacities = Vec::new();
        for mut v in 0..9i32 {
            unsafe { array.push((&mut v as *mut i32).cast()) };
            capacities.push(array.capacity());
        }
        assert_eq!(capacities, vec![1, 2, 4, 4, 8, 8, 8, 8, 16]);
        assert_eq!(contents(&array), (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn pop_on_empty_returns_false() {
        let mut array = RawArray::new(i32::DESCRIPTOR);
        let mut out = MaybeUninit::<i32>::uninit();
        assert!(!unsafe { array.pop(Some(out.as_mut_ptr().cast())) });
    }

    #[test]
    fn insert_and_remove_shift_the_tail() {
        let mut array = int_array(&[10, 20, 30, 40, 50]);
        let mut v = 25;
        unsafe { array.insert(2, (&mut v as *mut i32).cast()) };
        assert_eq!(contents(&array), vec![10, 20, 25, 30, 40, 50]);

        let mut out = MaybeUninit::<i32>::uninit();
        unsafe { array.remove(1, Some(out.as_mut_ptr().cast())) };
        assert_eq!(unsafe { out.assume_init() }, 20);
        assert_eq!(contents(&array), vec![10, 25, 30, 40, 50]);
    }

    #[test]
    fn insert_at_len_appends() {
        let mut array = int_array(&[1, 2]);
        let mut v = 3;
        unsafe { array.insert(2, (&mut v as *mut i32).cast()) };
        assert_eq!(contents(&array), vec![1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "Array::insert: index (is 3) must be <= len (is 2)")]
    fn insert_past_len_is_fatal() {
        let mut array = int_array(&[1, 2]);
        let mut v = 3;
        unsafe { array.insert(3, (&mut v as *mut i32).cast()) };
    }

    #[test]
    #[should_panic(expected = "Array::remove: index (is 2) must be < len (is 2)")]
    fn remove_at_len_is_fatal() {
        let mut array = int_array(&[1, 2]);
        unsafe { array.remove(2, None) };
    }

    #[test]
    fn insert_range_in_middle() {
        let mut array = int_array(&[1, 5]);
        let mut extra = ManuallyDrop::new([2, 3, 4]);
        unsafe { array.insert_range(1, extra.as_mut_ptr().cast(), 3) };
        assert_eq!(contents(&array), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn remove_range_with_short_output() {
        let mut array = int_array(&[1, 2, 3, 4, 5, 6]);
        let mut out = [0i32; 2];
        let moved = unsafe { array.remove_range(1, 3, Some(out.as_mut_ptr().cast()), 2) };
        assert_eq!(moved, 2);
        assert_eq!(out, [2, 3]);
        assert_eq!(contents(&array), vec![1, 5, 6]);
    }

    #[test]
    fn remove_range_with_oversized_output_and_clamped_count() {
        let mut array = int_array(&[1, 2, 3, 4]);
        let mut out = [0i32; 8];
        let moved = unsafe { array.remove_range(2, 100, Some(out.as_mut_ptr().cast()), 8) };
        assert_eq!(moved, 2);
        assert_eq!(&out[..2], &[3, 4]);
        assert_eq!(out[2], 0);
        assert_eq!(contents(&array), vec![1, 2]);
    }

    #[test]
    fn reserve_is_amortised_and_exact_is_exact() {
        let mut array = int_array(&[1, 2, 3]);
        array.reserve(1);
        assert_eq!(array.capacity(), 6);
        array.reserve(1);
        assert_eq!(array.capacity(), 6);
        array.reserve_exact(10);
        assert_eq!(array.capacity(), 13);
    }

    #[test]
    #[should_panic(expected = "Array::reserve: capacity overflow")]
    fn reserve_overflow_is_fatal() {
        let mut array = int_array(&[1]);
        array.reserve(usize::MAX);
    }

    #[test]
    #[should_panic(expected = "Array::reserve_exact: capacity overflow")]
    fn reserve_exact_byte_overflow_is_fatal() {
        let mut array = int_array(&[1]);
        array.reserve_exact(usize::MAX / 2);
    }

    #[test]
    fn shrink_never_grows() {
        let mut array = RawArray::with_capacity(i32::DESCRIPTOR, 16);
        let mut v = 7;
        unsafe { array.push((&mut v as *mut i32).cast()) };
        array.shrink_to(32);
        assert_eq!(array.capacity(), 16);
        array.shrink_to(4);
        assert_eq!(array.capacity(), 4);
    }

    #[test]
    fn shrink_below_len_is_ignored() {
        let mut array = int_array(&[1, 2, 3]);
        array.reserve_exact(5);
        assert_eq!(array.capacity(), 8);
        array.shrink_to(2);
        assert_eq!(array.capacity(), 8);
        array.shrink_to(0);
        assert_eq!(array.capacity(), 8);
        array.shrink_to(3);
        assert_eq!(array.capacity(), 3);
        assert_eq!(contents(&array), vec![1, 2, 3]);
        array.clear();
        array.shrink_to(0);
        assert_eq!(array.capacity(), 0);
        assert!(array.buffer().is_none());
    }

    #[test]
    fn shrink_to_fit_releases_an_empty_buffer() {
        let mut array = RawArray::with_capacity(i32::DESCRIPTOR, 16);
        array.clear();
        array.shrink_to_fit();
        assert_eq!(array.capacity(), 0);
        assert!(array.buffer().is_none());
    }

    #[test]
    fn resize_pads_and_truncates() {
        let mut array = int_array(&[1]);
        let mut pad = 9;
        unsafe { array.resize(4, (&mut pad as *mut i32).cast()) };
        assert_eq!(contents(&array), vec![1, 9, 9, 9]);
        let mut pad = 0;
        unsafe { array.resize(2, (&mut pad as *mut i32).cast()) };
        assert_eq!(contents(&array), vec![1, 9]);
    }

    #[test]
    fn sort_and_binary_search() {
        let mut array = int_array(&[5, 3, 9, 1, 7]);
        array.sort();
        assert_eq!(contents(&array), vec![1, 3, 5, 7, 9]);
        let target = 7;
        assert_eq!(unsafe { array.binary_search((&target as *const i32).cast()) }, Some(3));
        let below = 0;
        assert_eq!(unsafe { array.binary_search((&below as *const i32).cast()) }, None);
        let above = 10;
        assert_eq!(unsafe { array.binary_search((&above as *const i32).cast()) }, None);
    }

    #[test]
    fn sort_with_custom_order() {
        let mut array = int_array(&[1, 4, 2, 3]);
        array.sort_with(|a, b| unsafe { (*b.cast::<i32>()).cmp(&*a.cast::<i32>()) });
        assert_eq!(contents(&array), vec![4, 3, 2, 1]);
    }

    #[test]
    fn find_and_contains() {
        let array = int_array(&[4, 8, 15, 16]);
        let present = 15;
        let absent = 42;
        unsafe {
            assert!(array.contains((&present as *const i32).cast()));
            assert!(!array.contains((&absent as *const i32).cast()));
            assert_eq!(array.find((&present as *const i32).cast()), Some(2));
        }
        assert_eq!(array.find_if(|p| unsafe { *p.cast::<i32>() > 8 }), Some(2));
    }

    #[test]
    fn take_leaves_source_without_buffer() {
        let mut src = int_array(&[1, 2, 3]);
        let dst = src.take();
        assert_eq!(contents(&dst), vec![1, 2, 3]);
        assert_eq!(src.len(), 0);
        assert_eq!(src.capacity(), 0);
        assert!(src.buffer().is_none());
    }

    #[test]
    fn duplicate_is_independent() {
        let src = int_array(&[1, 2]);
        let mut dst = src.duplicate();
        let mut v = 3;
        unsafe { dst.push((&mut v as *mut i32).cast()) };
        assert_eq!(src.len(), 2);
        assert_eq!(dst.len(), 3);
    }

    #[test]
    fn value_semantics() {
        let a = int_array(&[1, 2, 3]);
        let b = int_array(&[1, 2, 3]);
        let c = int_array(&[1, 2]);
        assert!(a.equal(&b));
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.compare(&c), Ordering::Greater);
        assert_eq!(c.compare(&a), Ordering::Less);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn capacity_covers_pushes_and_never_shrinks(n in 0usize..200) {
                let mut array = RawArray::new(u64::DESCRIPTOR);
                let mut last = 0;
                for i in 0..n {
                    let mut v = i as u64;
                    unsafe { array.push((&mut v as *mut u64).cast()) };
                    prop_assert!(array.capacity() >= i + 1);
                    prop_assert!(array.capacity() >= last);
                    last = array.capacity();
                }
                array.shrink_to_fit();
                prop_assert_eq!(array.capacity(), array.len());
            }

            #[test]
            fn sort_matches_std(values in proptest::collection::vec(any::<i32>(), 0..64)) {
                let mut array = int_array(&values);
                array.sort();
                let mut expected = values.clone();
                expected.sort_unstable();
                prop_assert_eq!(contents(&array), expected);
            }
        }
    }
}

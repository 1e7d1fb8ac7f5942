//! Type-erased Robin-Hood hash table.
//!
//! # Layout
//!
//! ```text
//! RawTable
//! ├── slots: [Slot; capacity]    capacity is 0 or a power of two
//! │   └── Slot { storage, hash } ─▶ entry block (one allocation per entry)
//! │                                  ├── key    at EntryLayout::key_offset
//! │                                  └── value  at EntryLayout::value_offset
//! └── len                        occupied slots
//! ```
//!
//! # Probing
//!
//! Every key is hashed through its descriptor, then [`scramble`]d. The
//! home slot is `hash & (capacity - 1)`; probing walks forward with
//! wrap-around. Insertion displaces any resident that sits closer to its
//! own home than the incoming entry already is (Robin-Hood), and lands in
//! the first slot that is empty or a tombstone.
//!
//! Lookups skip tombstones and stop at the first empty slot, or after
//! one full cycle. Removal leaves a tombstone; there is no backward-shift
//! compaction, so tombstones persist until the next rehash drops them.
//!
//! # Growth
//!
//! An insert into a table with `len >= capacity` first reserves room for
//! `len` more entries, or for [`MapConfig::initial_capacity`] when empty.
//! Reserving rounds the required slot count up to a power of two and
//! rebuilds the index from the occupied slots.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::mem;
use std::ptr::NonNull;
use std::slice;

use log::{debug, trace};
use quiver_core::alloc::{allocate, deallocate};
use quiver_core::{ContractViolation, EqualFn, HashFn, TypeDescriptor};

use crate::config::MapConfig;
use crate::slot::{EntryLayout, Slot, SlotState, HASH_TAG};

/// Mix a raw key hash so its low bits are usable as an index, and tag it
/// so it can never equal the empty-slot sentinel.
pub const fn scramble(raw: u64) -> u64 {
    let h = raw ^ (raw >> 20) ^ (raw >> 12);
    (h ^ (h >> 7) ^ (h >> 4)) | HASH_TAG
}

/// Forward distance from `home` to `index` in a table of `capacity` slots.
pub const fn probe_distance(home: usize, index: usize, capacity: usize) -> usize {
    if index >= home {
        index - home
    } else {
        index + capacity - home
    }
}

/// Open-addressing table mapping keys to values through their
/// descriptors.
///
/// All methods that take key or value pointers are `unsafe`: the pointers
/// must refer to values of the corresponding descriptor's type.
pub struct RawTable {
    slots: Box<[Slot]>,
    len: usize,
    key: &'static TypeDescriptor,
    value: &'static TypeDescriptor,
    key_equal: EqualFn,
    key_hash: HashFn,
    entry: EntryLayout,
    config: MapConfig,
}

impl RawTable {
    /// Create an empty table without allocating.
    ///
    /// # Panics
    ///
    /// If the key descriptor lacks `equal` or `hash`.
    #[track_caller]
    pub fn new(
        key: &'static TypeDescriptor,
        value: &'static TypeDescriptor,
        config: MapConfig,
    ) -> Self {
        Self {
            slots: Box::default(),
            len: 0,
            key,
            value,
            key_equal: key.require_equal("HashMap::new"),
            key_hash: key.require_hash("HashMap::new"),
            entry: EntryLayout::new(key, value),
            config,
        }
    }

    /// Number of live entries.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Number of slots (0 or a power of two).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no live entries.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The key descriptor.
    pub const fn key_descriptor(&self) -> &'static TypeDescriptor {
        self.key
    }

    /// The value descriptor.
    pub const fn value_descriptor(&self) -> &'static TypeDescriptor {
        self.value
    }

    /// Placement of key and value in each entry block.
    pub const fn entry_layout(&self) -> &EntryLayout {
        &self.entry
    }

    /// The configuration the table was created with.
    pub const fn config(&self) -> MapConfig {
        self.config
    }

    /// The slot index.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of tombstone slots.
    pub fn tombstones(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state() == SlotState::Tombstone)
            .count()
    }

    /// The scrambled hash of `key`.
    ///
    /// # Safety
    ///
    /// `key` must hold an initialised key.
    pub unsafe fn hash_key(&self, key: *const u8) -> u64 {
        // SAFETY: forwarded caller contract.
        scramble(unsafe { (self.key_hash)(key) })
    }

    /// Insert `key` and `value`, moving both in.
    ///
    /// If an equal key is present, its key is destroyed and replaced; its
    /// value is moved into `replaced` when given, destroyed otherwise.
    /// Returns whether an existing entry was overwritten.
    ///
    /// # Safety
    ///
    /// `key` and `value` must hold initialised values; both are moved
    /// from. `replaced`, if given, must be uninitialised storage for one
    /// value.
    #[track_caller]
    pub unsafe fn insert(&mut self, key: *mut u8, value: *mut u8, replaced: Option<*mut u8>) -> bool {
        if self.len >= self.capacity() {
            let request = if self.len == 0 {
                self.config.initial_capacity()
            } else {
                self.len
            };
            self.reserve_for("HashMap::insert", request);
        }

        // SAFETY: `key` is initialised per the caller contract.
        let hash = unsafe { self.hash_key(key) };
        // SAFETY: as above.
        if let Some(index) = unsafe { self.find(key, hash) } {
            if let Some(block) = self.slots[index].storage() {
                // SAFETY: the block holds a live key and value; each is
                // consumed exactly once before the new pair moves in.
                unsafe {
                    let (old_key, old_value) = self.members(block);
                    self.key.destroy_value(old_key);
                    match replaced {
                        Some(out) => self.value.move_value(out, old_value),
                        None => self.value.destroy_value(old_value),
                    }
                    self.key.move_value(old_key, key);
                    self.value.move_value(old_value, value);
                }
            }
            return true;
        }

        let block = allocate(self.entry.layout());
        // SAFETY: the fresh block has room for one key and one value.
        unsafe {
            let (dst_key, dst_value) = self.members(block);
            self.key.move_value(dst_key, key);
            self.value.move_value(dst_value, value);
        }
        self.place(Slot::occupied(block, hash));
        self.len += 1;
        false
    }

    /// Remove the entry for `key`.
    ///
    /// The key and value are moved into `out_key`/`out_value` when given
    /// and destroyed otherwise. Returns `false` if the key is absent.
    ///
    /// # Safety
    ///
    /// `key` must hold an initialised key; `out_key`/`out_value`, if
    /// given, must be uninitialised storage for one key/value.
    pub unsafe fn remove(
        &mut self,
        key: *const u8,
        out_key: Option<*mut u8>,
        out_value: Option<*mut u8>,
    ) -> bool {
        if self.len == 0 {
            return false;
        }
        // SAFETY: forwarded caller contract.
        let index = match unsafe { self.find(key, self.hash_key(key)) } {
            Some(index) => index,
            None => return false,
        };
        let Some(block) = self.slots[index].bury() else {
            return false;
        };
        self.len -= 1;
        // SAFETY: the block held a live entry and is detached from the
        // index; its members are consumed once and the block is released.
        unsafe {
            let (old_key, old_value) = self.members(block);
            match out_key {
                Some(out) => self.key.move_value(out, old_key),
                None => self.key.destroy_value(old_key),
            }
            match out_value {
                Some(out) => self.value.move_value(out, old_value),
                None => self.value.destroy_value(old_value),
            }
            deallocate(block, self.entry.layout());
        }
        true
    }

    /// Pointer to the value stored for `key`.
    ///
    /// # Safety
    ///
    /// `key` must hold an initialised key.
    pub unsafe fn get(&self, key: *const u8) -> Option<NonNull<u8>> {
        // SAFETY: forwarded caller contract.
        unsafe { self.get_entry(key) }.map(|(_, value)| value)
    }

    /// Pointers to the stored key and value for `key`.
    ///
    /// # Safety
    ///
    /// `key` must hold an initialised key.
    pub unsafe fn get_entry(&self, key: *const u8) -> Option<(NonNull<u8>, NonNull<u8>)> {
        if self.len == 0 {
            return None;
        }
        // SAFETY: forwarded caller contract.
        let index = unsafe { self.find(key, self.hash_key(key)) }?;
        let block = self.slots[index].storage()?;
        // SAFETY: occupied slots hold blocks allocated with this layout.
        unsafe { Some((self.entry.key(block), self.entry.value(block))) }
    }

    /// Whether an entry for `key` exists.
    ///
    /// # Safety
    ///
    /// `key` must hold an initialised key.
    pub unsafe fn contains_key(&self, key: *const u8) -> bool {
        // SAFETY: forwarded caller contract.
        unsafe { self.get_entry(key) }.is_some()
    }

    /// Destroy every entry and reset every slot to empty, keeping the
    /// index allocation.
    pub fn clear(&mut self) {
        self.len = 0;
        for index in 0..self.slots.len() {
            let slot = mem::take(&mut self.slots[index]);
            if let Some(block) = slot.storage() {
                // SAFETY: the block held a live entry and is no longer
                // reachable from the index.
                unsafe { self.destroy_entry(block) };
            }
        }
    }

    /// Ensure room for `additional` more entries: the capacity becomes the
    /// next power of two at or above `len + additional` if that is larger.
    #[track_caller]
    pub fn reserve(&mut self, additional: usize) {
        self.reserve_for("HashMap::reserve", additional);
    }

    /// Rebuild at the next power of two at or above `len`, or release the
    /// index entirely when empty.
    pub fn shrink_to_fit(&mut self) {
        if self.len == 0 {
            if !self.slots.is_empty() {
                debug!(
                    "HashMap::shrink_to_fit: releasing empty {} -> {} table of {} slots",
                    self.key.name(),
                    self.value.name(),
                    self.slots.len()
                );
                self.slots = Box::default();
            }
            return;
        }
        let target = self.len.next_power_of_two();
        if target < self.capacity() {
            self.rehash("HashMap::shrink_to_fit", target);
        }
    }

    /// Iterate over occupied slots in index order.
    pub fn iter(&self) -> RawIter<'_> {
        RawIter {
            slots: self.slots.iter(),
            entry: &self.entry,
            remaining: self.len,
        }
    }

    /// An independent copy with freshly allocated entries. Requires `copy`
    /// on both key and value.
    #[track_caller]
    pub fn duplicate(&self) -> Self {
        let copy_key = self.key.require_copy("HashMap::duplicate");
        let copy_value = self.value.require_copy("HashMap::duplicate");
        let mut dst = Self::new(self.key, self.value, self.config);
        if self.len == 0 {
            return dst;
        }
        dst.reserve_for("HashMap::duplicate", self.len);
        for slot in self.slots.iter() {
            let Some(src) = slot.storage() else { continue };
            let block = allocate(self.entry.layout());
            // SAFETY: `src` holds a live entry; `block` is fresh storage
            // with the same layout.
            unsafe {
                let (src_key, src_value) = self.members(src);
                let (dst_key, dst_value) = dst.members(block);
                copy_key(dst_key, src_key);
                copy_value(dst_value, src_value);
            }
            dst.place(Slot::occupied(block, slot.hash()));
            dst.len += 1;
        }
        dst
    }

    /// Transfer ownership of every entry into a new table, leaving `self`
    /// empty with no index allocation.
    pub fn take(&mut self) -> Self {
        Self {
            slots: mem::take(&mut self.slots),
            len: mem::replace(&mut self.len, 0),
            key: self.key,
            value: self.value,
            key_equal: self.key_equal,
            key_hash: self.key_hash,
            entry: self.entry,
            config: self.config,
        }
    }

    /// Probe distance of the entry in slot `index`, or `None` if the slot
    /// is not occupied.
    pub fn probe_distance(&self, index: usize) -> Option<usize> {
        let slot = self.slots.get(index)?;
        if !slot.is_occupied() {
            return None;
        }
        Some(probe_distance(self.home(slot.hash()), index, self.capacity()))
    }

    fn home(&self, hash: u64) -> usize {
        (hash & (self.capacity() as u64 - 1)) as usize
    }

    /// Slot index holding `key`, probing from its home slot.
    unsafe fn find(&self, key: *const u8, hash: u64) -> Option<usize> {
        let capacity = self.capacity();
        if capacity == 0 {
            return None;
        }
        let mask = capacity - 1;
        let start = self.home(hash);
        let mut index = start;
        loop {
            let slot = &self.slots[index];
            match slot.state() {
                SlotState::Empty => return None,
                SlotState::Tombstone => {}
                SlotState::Occupied => {
                    if slot.hash() == hash {
                        if let Some(block) = slot.storage() {
                            // SAFETY: the block holds a live key; `key` is
                            // initialised per the caller contract.
                            let found = unsafe {
                                (self.key_equal)(self.entry.key(block).as_ptr(), key)
                            };
                            if found {
                                return Some(index);
                            }
                        }
                    }
                }
            }
            index = (index + 1) & mask;
            if index == start {
                return None;
            }
        }
    }

    /// Robin-Hood placement of an entry whose key is known to be absent.
    fn place(&mut self, mut incoming: Slot) {
        let capacity = self.capacity();
        let mask = capacity - 1;
        let start = self.home(incoming.hash());
        let mut index = start;
        let mut distance = 0;
        for _ in 0..capacity {
            let resident = &mut self.slots[index];
            if !resident.is_occupied() {
                *resident = incoming;
                return;
            }
            let resident_distance =
                probe_distance((resident.hash() & mask as u64) as usize, index, capacity);
            if distance > resident_distance {
                mem::swap(resident, &mut incoming);
                distance = resident_distance;
            }
            index = (index + 1) & mask;
            distance += 1;
        }
        unreachable!("placement into a table with no free slot");
    }

    #[track_caller]
    fn reserve_for(&mut self, operation: &'static str, additional: usize) {
        let required = match self.len.checked_add(additional) {
            Some(required) => required,
            None => ContractViolation::CapacityOverflow { operation }.raise(),
        };
        if required <= self.capacity() {
            return;
        }
        let capacity = required
            .checked_next_power_of_two()
            .filter(|&capacity| Layout::array::<Slot>(capacity).is_ok());
        let Some(capacity) = capacity else {
            ContractViolation::CapacityOverflow { operation }.raise()
        };
        self.rehash(operation, capacity);
    }

    /// Rebuild the index at `capacity` slots, re-placing occupied entries
    /// and dropping tombstones.
    fn rehash(&mut self, operation: &'static str, capacity: usize) {
        let old = mem::replace(&mut self.slots, vec![Slot::EMPTY; capacity].into_boxed_slice());
        let tombstones = old
            .iter()
            .filter(|slot| slot.state() == SlotState::Tombstone)
            .count();
        for slot in old.iter().filter(|slot| slot.is_occupied()) {
            self.place(*slot);
        }
        trace!(
            "{operation}: rehashed {} -> {} table {} -> {} slots ({} live, {} tombstones dropped)",
            self.key.name(),
            self.value.name(),
            old.len(),
            capacity,
            self.len,
            tombstones
        );
    }

    /// Pointers to the key and value inside `block`.
    unsafe fn members(&self, block: NonNull<u8>) -> (*mut u8, *mut u8) {
        // SAFETY: the caller passes a block allocated with this layout.
        unsafe {
            (
                self.entry.key(block).as_ptr(),
                self.entry.value(block).as_ptr(),
            )
        }
    }

    unsafe fn destroy_entry(&self, block: NonNull<u8>) {
        // SAFETY: the caller passes a detached block holding a live entry.
        unsafe {
            let (key, value) = self.members(block);
            self.key.destroy_value(key);
            self.value.destroy_value(value);
            deallocate(block, self.entry.layout());
        }
    }
}

impl Drop for RawTable {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Lazy, single-pass iterator over the occupied slots of a [`RawTable`],
/// yielding `(key, value)` pointers in index order.
pub struct RawIter<'a> {
    slots: slice::Iter<'a, Slot>,
    entry: &'a EntryLayout,
    remaining: usize,
}

impl Iterator for RawIter<'_> {
    type Item = (NonNull<u8>, NonNull<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.slots.find_map(|slot| slot.storage())?;
        self.remaining -= 1;
        // SAFETY: occupied slots hold blocks allocated with this layout.
        unsafe { Some((self.entry.key(block), self.entry.value(block))) }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for RawIter<'_> {}

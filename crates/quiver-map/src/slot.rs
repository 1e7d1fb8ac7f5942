//! Index slots and packed entry blocks.
//!
//! The table index is a flat array of [`Slot`]s. A slot owns at most one
//! entry block, an individually allocated region holding one key and one
//! value laid out by [`EntryLayout`].

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

use quiver_core::{ContractViolation, TypeDescriptor};

/// Bit forced on in every stored hash, so a live or buried slot never
/// carries the empty sentinel `0`.
pub const HASH_TAG: u64 = 1 << 63;

/// Lifecycle state of a slot.
///
/// ```text
/// Empty ──insert──▶ Occupied ──remove──▶ Tombstone
///                     │  ▲                   │
///                     └──┘ overwrite         └──insert──▶ Occupied
/// ```
///
/// Only a rehash turns a tombstone back into an empty slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Never used since the last rehash; terminates lookups.
    Empty,
    /// Held an entry that was removed; lookups probe past it.
    Tombstone,
    /// Holds an entry block.
    Occupied,
}

/// One index slot: an optional entry block and the scrambled key hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    storage: Option<NonNull<u8>>,
    hash: u64,
}

impl Slot {
    /// A slot that was never used.
    pub const EMPTY: Slot = Slot {
        storage: None,
        hash: 0,
    };

    pub(crate) const fn occupied(storage: NonNull<u8>, hash: u64) -> Self {
        Self {
            storage: Some(storage),
            hash,
        }
    }

    /// The slot's state, derived from its storage and hash.
    pub const fn state(&self) -> SlotState {
        match (self.storage, self.hash) {
            (Some(_), _) => SlotState::Occupied,
            (None, 0) => SlotState::Empty,
            (None, _) => SlotState::Tombstone,
        }
    }

    /// Whether the slot holds an entry block.
    pub const fn is_occupied(&self) -> bool {
        self.storage.is_some()
    }

    /// The stored scrambled hash (`0` only when empty).
    pub const fn hash(&self) -> u64 {
        self.hash
    }

    /// The entry block, if occupied.
    pub const fn storage(&self) -> Option<NonNull<u8>> {
        self.storage
    }

    /// Detach the entry block, leaving a tombstone behind.
    pub(crate) fn bury(&mut self) -> Option<NonNull<u8>> {
        self.storage.take()
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Placement of a key and a value inside one entry block.
///
/// The member with the stricter alignment sits at offset 0 (the value
/// wins ties); the other follows at the next offset aligned for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryLayout {
    layout: Layout,
    key_offset: usize,
    value_offset: usize,
}

impl EntryLayout {
    /// Compute the packed layout for `key` and `value`.
    #[track_caller]
    pub fn new(key: &TypeDescriptor, value: &TypeDescriptor) -> Self {
        let (key_first, first, second) = if key.align() > value.align() {
            (true, key.layout(), value.layout())
        } else {
            (false, value.layout(), key.layout())
        };
        let (layout, second_offset) = match first.extend(second) {
            Ok(packed) => packed,
            Err(_) => ContractViolation::CapacityOverflow {
                operation: "HashMap::new",
            }
            .raise(),
        };
        let (key_offset, value_offset) = if key_first {
            (0, second_offset)
        } else {
            (second_offset, 0)
        };
        Self {
            layout,
            key_offset,
            value_offset,
        }
    }

    /// Layout of a whole entry block.
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// Byte offset of the key within a block.
    pub const fn key_offset(&self) -> usize {
        self.key_offset
    }

    /// Byte offset of the value within a block.
    pub const fn value_offset(&self) -> usize {
        self.value_offset
    }

    /// Pointer to the key inside `block`.
    ///
    /// # Safety
    ///
    /// `block` must have been allocated with [`EntryLayout::layout`].
    pub unsafe fn key(&self, block: NonNull<u8>) -> NonNull<u8> {
        // SAFETY: the offset lies inside the block per the caller contract.
        unsafe { block.add(self.key_offset) }
    }

    /// Pointer to the value inside `block`.
    ///
    /// # Safety
    ///
    /// `block` must have been allocated with [`EntryLayout::layout`].
    pub unsafe fn value(&self, block: NonNull<u8>) -> NonNull<u8> {
        // SAFETY: the offset lies inside the block per the caller contract.
        unsafe { block.add(self.value_offset) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::Described;

    #[test]
    fn slot_states() {
        assert_eq!(Slot::EMPTY.state(), SlotState::Empty);
        let mut byte = 0u8;
        let mut slot = Slot::occupied(NonNull::from(&mut byte), HASH_TAG | 5);
        assert_eq!(slot.state(), SlotState::Occupied);
        assert!(slot.bury().is_some());
        assert_eq!(slot.state(), SlotState::Tombstone);
        assert_eq!(slot.hash(), HASH_TAG | 5);
    }

    #[test]
    fn higher_alignment_goes_first() {
        let entry = EntryLayout::new(u8::DESCRIPTOR, u64::DESCRIPTOR);
        assert_eq!(entry.value_offset(), 0);
        assert_eq!(entry.key_offset(), 8);
        assert_eq!(entry.layout().size(), 9);
        assert_eq!(entry.layout().align(), 8);

        let entry = EntryLayout::new(u64::DESCRIPTOR, u16::DESCRIPTOR);
        assert_eq!(entry.key_offset(), 0);
        assert_eq!(entry.value_offset(), 8);
        assert_eq!(entry.layout().size(), 10);
    }

    #[test]
    fn equal_alignment_puts_value_first() {
        let entry = EntryLayout::new(u32::DESCRIPTOR, i32::DESCRIPTOR);
        assert_eq!(entry.value_offset(), 0);
        assert_eq!(entry.key_offset(), 4);
        assert_eq!(entry.layout().size(), 8);
    }

    #[test]
    fn second_member_is_padded_to_its_alignment() {
        #[repr(C)]
        #[allow(dead_code)]
        struct Odd([u8; 3]);
        const ODD: TypeDescriptor = TypeDescriptor::builder::<Odd>().build();
        let entry = EntryLayout::new(&ODD, u16::DESCRIPTOR);
        assert_eq!(entry.value_offset(), 0);
        assert_eq!(entry.key_offset(), 2);

        let entry = EntryLayout::new(u16::DESCRIPTOR, &ODD);
        assert_eq!(entry.key_offset(), 0);
        assert_eq!(entry.value_offset(), 2);
        assert_eq!(entry.layout().size(), 5);
    }
}

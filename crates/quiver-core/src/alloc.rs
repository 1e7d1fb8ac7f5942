//! Aligned allocation service.
//!
//! Containers never talk to the global allocator directly. Sizes are
//! computed through [`array_layout`], which turns arithmetic overflow into
//! a [`ContractViolation::CapacityOverflow`]; blocks come from
//! [`allocate`], which never hands out zero-byte blocks and aborts the
//! process on exhaustion.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::descriptor::TypeDescriptor;
use crate::error::ContractViolation;

/// Layout of a contiguous block of `count` values described by `elem`.
///
/// # Panics
///
/// Raises [`ContractViolation::CapacityOverflow`] (attributed to
/// `operation`) if the byte size overflows `isize`.
#[track_caller]
pub fn array_layout(operation: &'static str, elem: &TypeDescriptor, count: usize) -> Layout {
    let size = match count.checked_mul(elem.size()) {
        Some(size) => size,
        None => ContractViolation::CapacityOverflow { operation }.raise(),
    };
    match Layout::from_size_align(size, elem.align()) {
        Ok(layout) => layout,
        Err(_) => ContractViolation::CapacityOverflow { operation }.raise(),
    }
}

/// Allocate a block for `layout`.
///
/// `layout` must have a non-zero size. On exhaustion the process aborts
/// through [`std::alloc::handle_alloc_error`].
pub fn allocate(layout: Layout) -> NonNull<u8> {
    assert!(layout.size() > 0, "zero-sized allocation request");
    // SAFETY: the layout has a non-zero size.
    let ptr = unsafe { alloc::alloc(layout) };
    match NonNull::new(ptr) {
        Some(ptr) => ptr,
        None => alloc::handle_alloc_error(layout),
    }
}

/// Release a block obtained from [`allocate`].
///
/// # Safety
///
/// `ptr` must come from [`allocate`] with exactly this `layout` and must
/// not be used afterwards.
pub unsafe fn deallocate(ptr: NonNull<u8>, layout: Layout) {
    // SAFETY: forwarded caller contract.
    unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
}

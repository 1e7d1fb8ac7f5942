//! Static per-type behaviour records.
//!
//! A [`TypeDescriptor`] is the only handle a container has on its element
//! type: size, alignment, and a small set of function pointers over raw
//! byte pointers. `move` is mandatory; everything else is an optional
//! [`Capability`] that only the operations needing it will ask for.
//!
//! Descriptors are built with [`TypeDescriptor::builder`]. Each optional
//! capability method on [`DescriptorBuilder`] is bounded by the matching
//! Rust trait, so a descriptor can only advertise behaviour the type
//! really has. Whether a particular descriptor carries a capability is
//! still a runtime property: a type may live happily in an array (needs
//! only `move`) while being unusable as a sort key. Operations that need
//! a capability fetch it through a `require_*` getter, which raises a
//! [`ContractViolation::MissingCapability`] naming the caller.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem;
use std::ptr;

use crate::error::ContractViolation;
use crate::hash::FnvHasher;

/// Relocate an initialised value from `src` into uninitialised `dst`.
///
/// After the call `src` is logically uninitialised: it must be neither
/// read nor destroyed again.
pub type MoveFn = unsafe fn(dst: *mut u8, src: *mut u8);
/// Construct an independent copy of `src` in uninitialised `dst`.
pub type CopyFn = unsafe fn(dst: *mut u8, src: *const u8);
/// Release everything an initialised value owns (not its own bytes).
pub type DestroyFn = unsafe fn(value: *mut u8);
/// Three-way comparison of two initialised values.
pub type CompareFn = unsafe fn(lhs: *const u8, rhs: *const u8) -> Ordering;
/// Equality of two initialised values.
pub type EqualFn = unsafe fn(lhs: *const u8, rhs: *const u8) -> bool;
/// Raw (unscrambled) hash of an initialised value.
pub type HashFn = unsafe fn(value: *const u8) -> u64;

/// Optional behaviour a descriptor may provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Duplicate a value into fresh storage.
    Copy,
    /// Release owned resources.
    Destroy,
    /// Total ordering.
    Compare,
    /// Equality.
    Equal,
    /// Hashing, consistent with equality.
    Hash,
}

impl Capability {
    /// Every optional capability, in declaration order.
    pub const ALL: [Capability; 5] = [
        Capability::Copy,
        Capability::Destroy,
        Capability::Compare,
        Capability::Equal,
        Capability::Hash,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Copy => "copy",
            Self::Destroy => "destroy",
            Self::Compare => "compare",
            Self::Equal => "equal",
            Self::Hash => "hash",
        };
        f.write_str(name)
    }
}

/// Immutable, process-lifetime behaviour record for one element type.
///
/// Size is always non-zero and alignment always a power of two; both
/// are taken from the Rust type at construction.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    name: fn() -> &'static str,
    size: usize,
    align: usize,
    move_fn: MoveFn,
    copy_fn: Option<CopyFn>,
    destroy_fn: Option<DestroyFn>,
    compare_fn: Option<CompareFn>,
    equal_fn: Option<EqualFn>,
    hash_fn: Option<HashFn>,
}

impl TypeDescriptor {
    /// Start a descriptor for `T` with only the mandatory behaviour.
    ///
    /// `destroy` is filled in automatically when `T` has drop glue.
    ///
    /// # Panics
    ///
    /// Panics (at compile time when used in a `const`) if `T` is
    /// zero-sized.
    pub const fn builder<T>() -> DescriptorBuilder<T> {
        DescriptorBuilder::new()
    }

    /// Type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        (self.name)()
    }

    /// Size of one value in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Alignment of one value in bytes.
    pub const fn align(&self) -> usize {
        self.align
    }

    /// Layout of one value.
    pub const fn layout(&self) -> Layout {
        // SAFETY: size and align come from a real sized Rust type, so align
        // is a non-zero power of two and size does not overflow isize when
        // rounded up to it.
        unsafe { Layout::from_size_align_unchecked(self.size, self.align) }
    }

    /// Whether the optional capability is present.
    pub const fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Copy => self.copy_fn.is_some(),
            Capability::Destroy => self.destroy_fn.is_some(),
            Capability::Compare => self.compare_fn.is_some(),
            Capability::Equal => self.equal_fn.is_some(),
            Capability::Hash => self.hash_fn.is_some(),
        }
    }

    /// The mandatory move function.
    pub const fn move_fn(&self) -> MoveFn {
        self.move_fn
    }

    /// The copy function, if any.
    pub const fn copy_fn(&self) -> Option<CopyFn> {
        self.copy_fn
    }

    /// The destroy function, if the type owns resources.
    pub const fn destroy_fn(&self) -> Option<DestroyFn> {
        self.destroy_fn
    }

    /// The compare function, if any.
    pub const fn compare_fn(&self) -> Option<CompareFn> {
        self.compare_fn
    }

    /// The equal function, if any.
    pub const fn equal_fn(&self) -> Option<EqualFn> {
        self.equal_fn
    }

    /// The hash function, if any.
    pub const fn hash_fn(&self) -> Option<HashFn> {
        self.hash_fn
    }

    /// The copy function, or a [`ContractViolation`] naming `caller`.
    #[track_caller]
    pub fn require_copy(&self, caller: &'static str) -> CopyFn {
        match self.copy_fn {
            Some(f) => f,
            None => self.missing(caller, Capability::Copy),
        }
    }

    /// The destroy function, or a [`ContractViolation`] naming `caller`.
    #[track_caller]
    pub fn require_destroy(&self, caller: &'static str) -> DestroyFn {
        match self.destroy_fn {
            Some(f) => f,
            None => self.missing(caller, Capability::Destroy),
        }
    }

    /// The compare function, or a [`ContractViolation`] naming `caller`.
    #[track_caller]
    pub fn require_compare(&self, caller: &'static str) -> CompareFn {
        match self.compare_fn {
            Some(f) => f,
            None => self.missing(caller, Capability::Compare),
        }
    }

    /// The equal function, or a [`ContractViolation`] naming `caller`.
    #[track_caller]
    pub fn require_equal(&self, caller: &'static str) -> EqualFn {
        match self.equal_fn {
            Some(f) => f,
            None => self.missing(caller, Capability::Equal),
        }
    }

    /// The hash function, or a [`ContractViolation`] naming `caller`.
    #[track_caller]
    pub fn require_hash(&self, caller: &'static str) -> HashFn {
        match self.hash_fn {
            Some(f) => f,
            None => self.missing(caller, Capability::Hash),
        }
    }

    /// Move the value at `src` into `dst`.
    ///
    /// # Safety
    ///
    /// `src` must hold an initialised value of this type and `dst` must be
    /// valid, aligned, uninitialised storage for one. `src` must not be
    /// used again afterwards.
    #[inline]
    pub unsafe fn move_value(&self, dst: *mut u8, src: *mut u8) {
        // SAFETY: forwarded caller contract.
        unsafe { (self.move_fn)(dst, src) }
    }

    /// Destroy the value at `value`; a no-op for types without resources.
    ///
    /// # Safety
    ///
    /// `value` must hold an initialised value of this type, which must not
    /// be used again afterwards.
    #[inline]
    pub unsafe fn destroy_value(&self, value: *mut u8) {
        if let Some(destroy) = self.destroy_fn {
            // SAFETY: forwarded caller contract.
            unsafe { destroy(value) }
        }
    }

    #[cold]
    #[track_caller]
    fn missing(&self, caller: &'static str, capability: Capability) -> ! {
        ContractViolation::MissingCapability {
            caller,
            type_name: self.name(),
            capability,
        }
        .raise()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let capabilities: Vec<Capability> = Capability::ALL
            .into_iter()
            .filter(|c| self.has(*c))
            .collect();
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name())
            .field("size", &self.size)
            .field("align", &self.align)
            .field("capabilities", &capabilities)
            .finish()
    }
}

/// `const` builder for a [`TypeDescriptor`] describing `T`.
pub struct DescriptorBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DescriptorBuilder<T> {
    const fn new() -> Self {
        assert!(
            mem::size_of::<T>() > 0,
            "type descriptors require a non-zero size"
        );
        let destroy_fn: Option<DestroyFn> = if mem::needs_drop::<T>() {
            Some(destroy_raw::<T>)
        } else {
            None
        };
        Self {
            descriptor: TypeDescriptor {
                name: std::any::type_name::<T>,
                size: mem::size_of::<T>(),
                align: mem::align_of::<T>(),
                move_fn: move_raw::<T>,
                copy_fn: None,
                destroy_fn,
                compare_fn: None,
                equal_fn: None,
                hash_fn: None,
            },
            _marker: PhantomData,
        }
    }

    /// Finish the descriptor.
    pub const fn build(self) -> TypeDescriptor {
        self.descriptor
    }

    /// Add the `compare` capability through an explicit function, for
    /// types whose total order is only defined when their contents have
    /// one.
    ///
    /// # Safety
    ///
    /// `compare` must read both pointers as initialised `T`s.
    pub const unsafe fn compare_with(mut self, compare: CompareFn) -> Self {
        self.descriptor.compare_fn = Some(compare);
        self
    }
}

impl<T: Clone> DescriptorBuilder<T> {
    /// Add the `copy` capability through `Clone`.
    pub const fn copy(mut self) -> Self {
        self.descriptor.copy_fn = Some(copy_raw::<T>);
        self
    }
}

impl<T: Ord> DescriptorBuilder<T> {
    /// Add the `compare` capability through `Ord`.
    pub const fn compare(mut self) -> Self {
        self.descriptor.compare_fn = Some(compare_raw::<T>);
        self
    }
}

impl<T: PartialEq> DescriptorBuilder<T> {
    /// Add the `equal` capability through `PartialEq`.
    pub const fn equal(mut self) -> Self {
        self.descriptor.equal_fn = Some(equal_raw::<T>);
        self
    }
}

impl<T: Hash> DescriptorBuilder<T> {
    /// Add the `hash` capability through `Hash`, fed into FNV-1a.
    pub const fn hash(mut self) -> Self {
        self.descriptor.hash_fn = Some(hash_raw::<T>);
        self
    }
}

unsafe fn move_raw<T>(dst: *mut u8, src: *mut u8) {
    // SAFETY: caller guarantees `src` holds a `T` and `dst` is aligned
    // storage for one; the regions belong to distinct slots.
    unsafe { ptr::copy_nonoverlapping(src.cast::<T>().cast_const(), dst.cast::<T>(), 1) }
}

unsafe fn copy_raw<T: Clone>(dst: *mut u8, src: *const u8) {
    // SAFETY: caller guarantees `src` holds a `T` and `dst` is aligned
    // uninitialised storage for one.
    unsafe { ptr::write(dst.cast::<T>(), (*src.cast::<T>()).clone()) }
}

unsafe fn destroy_raw<T>(value: *mut u8) {
    // SAFETY: caller guarantees `value` holds a `T` that is not used again.
    unsafe { ptr::drop_in_place(value.cast::<T>()) }
}

unsafe fn compare_raw<T: Ord>(lhs: *const u8, rhs: *const u8) -> Ordering {
    // SAFETY: caller guarantees both pointers hold a `T`.
    unsafe { (*lhs.cast::<T>()).cmp(&*rhs.cast::<T>()) }
}

unsafe fn equal_raw<T: PartialEq>(lhs: *const u8, rhs: *const u8) -> bool {
    // SAFETY: caller guarantees both pointers hold a `T`.
    unsafe { *lhs.cast::<T>() == *rhs.cast::<T>() }
}

unsafe fn hash_raw<T: Hash>(value: *const u8) -> u64 {
    let mut hasher = FnvHasher::default();
    // SAFETY: caller guarantees `value` holds a `T`.
    unsafe { (*value.cast::<T>()).hash(&mut hasher) };
    hasher.finish()
}

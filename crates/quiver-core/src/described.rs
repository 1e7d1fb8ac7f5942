//! The descriptor accessor convention.
//!
//! Every element type exposes one static, process-lifetime
//! [`TypeDescriptor`]. Containers are generic over [`Described`] types and
//! use that pointer as their only source of per-type behaviour.

#![allow(unsafe_code)]

use std::mem;

use crate::descriptor::TypeDescriptor;
use crate::error::ContractViolation;

/// A type with a static [`TypeDescriptor`].
///
/// Implementations build the descriptor in a `const`, which rejects
/// zero-sized types at compile time:
///
/// ```
/// use quiver_core::{Described, TypeDescriptor};
///
/// #[derive(Clone, PartialEq, Eq, Hash)]
/// struct Token(u32);
///
/// // SAFETY: the descriptor is built for `Token` itself.
/// unsafe impl Described for Token {
///     const DESCRIPTOR: &'static TypeDescriptor =
///         &TypeDescriptor::builder::<Token>().copy().equal().hash().build();
/// }
///
/// assert_eq!(Token::descriptor().size(), 4);
/// ```
///
/// Implementing the trait without `unsafe` is rejected:
///
/// ```compile_fail
/// use quiver_core::{Described, TypeDescriptor};
///
/// struct Token(u32);
///
/// impl Described for Token {
///     const DESCRIPTOR: &'static TypeDescriptor =
///         &TypeDescriptor::builder::<Token>().build();
/// }
/// ```
///
/// # Safety
///
/// `DESCRIPTOR` must be built by `TypeDescriptor::builder::<Self>()`
/// (see [`TypeDescriptor::builder`]), optionally extended with
/// capabilities that read their pointers as `Self`. Containers
/// reinterpret storage laid out and managed by the descriptor as `Self`;
/// a descriptor for any other type lets them read out of bounds or run
/// the wrong destructor.
pub unsafe trait Described: Sized {
    /// The type's descriptor.
    const DESCRIPTOR: &'static TypeDescriptor;

    /// Accessor for [`Described::DESCRIPTOR`].
    fn descriptor() -> &'static TypeDescriptor {
        Self::DESCRIPTOR
    }
}

/// `T`'s descriptor, checked against `T`'s size and alignment.
///
/// Typed containers call this once at construction.
///
/// # Panics
///
/// Raises [`ContractViolation::DescriptorMismatch`] (attributed to
/// `operation`) when the descriptor's layout is not `T`'s.
#[track_caller]
pub fn checked_descriptor<T: Described>(operation: &'static str) -> &'static TypeDescriptor {
    let descriptor = T::DESCRIPTOR;
    if descriptor.size() != mem::size_of::<T>() || descriptor.align() != mem::align_of::<T>() {
        ContractViolation::DescriptorMismatch {
            operation,
            type_name: std::any::type_name::<T>(),
            descriptor: descriptor.name(),
        }
        .raise();
    }
    descriptor
}

macro_rules! described_ordered {
    ($($ty:ty),* $(,)?) => {
        $(
            // SAFETY: built for `$ty` itself.
            unsafe impl Described for $ty {
                const DESCRIPTOR: &'static TypeDescriptor = &TypeDescriptor::builder::<$ty>()
                    .copy()
                    .compare()
                    .equal()
                    .hash()
                    .build();
            }
        )*
    };
}

described_ordered!(
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    bool,
    char,
    String,
    &'static str,
);

// Floats have no total order or hash; equality is IEEE equality.
// SAFETY: built for `f32` itself.
unsafe impl Described for f32 {
    const DESCRIPTOR: &'static TypeDescriptor =
        &TypeDescriptor::builder::<f32>().copy().equal().build();
}

// SAFETY: built for `f64` itself.
unsafe impl Described for f64 {
    const DESCRIPTOR: &'static TypeDescriptor =
        &TypeDescriptor::builder::<f64>().copy().equal().build();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Capability;

    #[test]
    fn integers_have_every_capability_but_destroy() {
        let d = i32::descriptor();
        assert!(d.has(Capability::Copy));
        assert!(d.has(Capability::Compare));
        assert!(d.has(Capability::Equal));
        assert!(d.has(Capability::Hash));
        assert!(!d.has(Capability::Destroy));
    }

    #[test]
    fn strings_need_destroy() {
        assert!(String::descriptor().has(Capability::Destroy));
        assert!(!<&'static str>::descriptor().has(Capability::Destroy));
    }

    #[test]
    fn floats_are_not_hashable() {
        assert!(!f64::descriptor().has(Capability::Hash));
        assert!(!f32::descriptor().has(Capability::Compare));
    }

    #[allow(dead_code)]
    struct Wide([u64; 4]);

    // SAFETY: not `Wide`'s layout. The type only reaches
    // `checked_descriptor`, which rejects it before any storage exists.
    unsafe impl Described for Wide {
        const DESCRIPTOR: &'static TypeDescriptor = &TypeDescriptor::builder::<u8>().build();
    }

    #[test]
    fn checked_descriptor_accepts_matching_layout() {
        let d = checked_descriptor::<String>("test");
        assert_eq!(d.size(), mem::size_of::<String>());
    }

    #[test]
    #[should_panic(expected = "Array::new: descriptor for u8 does not describe")]
    fn checked_descriptor_rejects_foreign_layout() {
        checked_descriptor::<Wide>("Array::new");
    }

    #[test]
    fn accessor_matches_const() {
        assert_eq!(u16::descriptor().size(), u16::DESCRIPTOR.size());
        assert_eq!(u16::descriptor().name(), "u16");
    }
}

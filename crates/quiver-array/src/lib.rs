//! Growable, contiguous, type-erased array for Quiver.
//!
//! The crate has two layers:
//!
//! - [`RawArray`]: the engine. It knows its elements only through a
//!   [`TypeDescriptor`](quiver_core::TypeDescriptor) and works on raw
//!   element pointers. `unsafe` is denied at the crate root and
//!   allowed only in the `raw` and `array` modules; every block states
//!   its invariant.
//! - [`Array<T>`]: a safe typed facade for any [`Described`] `T`.
//!
//! # Growth
//!
//! Appending into a full array doubles its capacity (or grows to exactly
//! what is required, if that is more). Capacity only shrinks on request
//! through [`Array::shrink_to_fit`] or [`Array::shrink_to`].
//!
//! # Capabilities
//!
//! Operations that duplicate, order, compare or hash elements require the
//! matching descriptor capability and raise a
//! [`ContractViolation`](quiver_core::ContractViolation) when it is absent.
//!
//! [`Described`]: quiver_core::Described

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod array;
pub mod raw;

pub use array::Array;
pub use raw::RawArray;

//! Core runtime for Quiver containers.
//!
//! This is the leaf crate of the workspace. It defines the protocol every
//! container element goes through and the primitive services the
//! containers are built on:
//!
//! - [`TypeDescriptor`]: per-type size, alignment and behaviour
//!   (move, copy, destroy, compare, equal, hash) as function pointers.
//! - [`Described`]: the accessor convention giving each type one static
//!   descriptor.
//! - [`alloc`]: overflow-checked layouts and aligned block allocation.
//! - [`ContractViolation`]: the fatal diagnostics raised when a caller
//!   breaks a container contract.
//! - [`hash`]: FNV-1a primitives backing descriptor hashing.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod alloc;
pub mod described;
pub mod descriptor;
pub mod error;
pub mod hash;

pub use described::{checked_descriptor, Described};
pub use descriptor::{
    Capability, CompareFn, CopyFn, DescriptorBuilder, DestroyFn, EqualFn, HashFn, MoveFn,
    TypeDescriptor,
};
pub use error::{check_index, ContractViolation};
pub use hash::{fnv1a32, fnv1a64, FnvBuildHasher, FnvHasher};

//! Instrumented element types and fixtures for Quiver development.
//!
//! The element types here exercise the descriptor protocol from the
//! outside: [`Tracked`] counts destructions, [`Name`] owns heap memory,
//! [`Colliding`] forces every key onto one hash, and [`Opaque`] carries no
//! optional capability at all.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use quiver_core::{Described, TypeDescriptor};

pub use fixtures::{int_array, string_map};

/// Shared destruction counter handing out [`Tracked`] values.
#[derive(Clone, Debug, Default)]
pub struct DropCounter {
    drops: Arc<AtomicUsize>,
}

impl DropCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new value reporting its destruction to this counter.
    pub fn track(&self, id: u32) -> Tracked {
        Tracked {
            id,
            drops: Arc::clone(&self.drops),
        }
    }

    /// How many tracked values have been destroyed so far.
    pub fn drops(&self) -> usize {
        self.drops.load(AtomicOrdering::SeqCst)
    }
}

/// A value that increments its [`DropCounter`] when destroyed.
///
/// Equality, ordering and hashing look at `id` only. Clones report to the
/// same counter.
#[derive(Clone)]
pub struct Tracked {
    pub id: u32,
    drops: Arc<AtomicUsize>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Tracked {}

impl PartialOrd for Tracked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tracked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for Tracked {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tracked({})", self.id)
    }
}

// SAFETY: built for `Tracked` itself.
#[allow(unsafe_code)]
unsafe impl Described for Tracked {
    const DESCRIPTOR: &'static TypeDescriptor = &TypeDescriptor::builder::<Tracked>()
        .copy()
        .compare()
        .equal()
        .hash()
        .build();
}

/// An owned string element, for checking deep copies.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(pub String);

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// SAFETY: built for `Name` itself.
#[allow(unsafe_code)]
unsafe impl Described for Name {
    const DESCRIPTOR: &'static TypeDescriptor = &TypeDescriptor::builder::<Name>()
        .copy()
        .compare()
        .equal()
        .hash()
        .build();
}

/// A key whose hash ignores its value, so every `Colliding` lands in the
/// same probe chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Colliding(pub u32);

impl Hash for Colliding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(0x5eed);
    }
}

// SAFETY: built for `Colliding` itself.
#[allow(unsafe_code)]
unsafe impl Described for Colliding {
    const DESCRIPTOR: &'static TypeDescriptor = &TypeDescriptor::builder::<Colliding>()
        .copy()
        .equal()
        .hash()
        .build();
}

/// A value with only the mandatory `move` capability.
#[derive(Debug, PartialEq, Eq)]
pub struct Opaque(pub u32);

// SAFETY: built for `Opaque` itself.
#[allow(unsafe_code)]
unsafe impl Described for Opaque {
    const DESCRIPTOR: &'static TypeDescriptor = &TypeDescriptor::builder::<Opaque>().build();
}

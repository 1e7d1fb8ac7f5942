//! Quiver: generic containers driven by static type descriptors.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Quiver sub-crates. For most users, adding `quiver` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use quiver::prelude::*;
//!
//! #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
//! struct Label(String);
//!
//! // SAFETY: the descriptor is built for `Label` itself.
//! unsafe impl Described for Label {
//!     const DESCRIPTOR: &'static TypeDescriptor = &TypeDescriptor::builder::<Label>()
//!         .copy()
//!         .compare()
//!         .equal()
//!         .hash()
//!         .build();
//! }
//!
//! let mut labels: Array<Label> = ["b", "a"].iter().map(|s| Label(s.to_string())).collect();
//! labels.sort();
//! assert_eq!(labels[0], Label("a".into()));
//!
//! let mut index: HashMap<Label, Array<u32>> = HashMap::new();
//! index.insert(Label("primes".into()), [2, 3, 5].into_iter().collect());
//! assert_eq!(index.get(&Label("primes".into())).map(|a| a.len()), Some(3));
//! assert!(Label::descriptor().has(Capability::Destroy));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`core_types`] | `quiver-core` | Type descriptors, allocation, diagnostics, FNV hashing |
//! | [`array`] | `quiver-array` | `RawArray` engine and typed `Array<T>` |
//! | [`map`] | `quiver-map` | `RawTable` engine, typed `HashMap<K, V>`, `MapConfig` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Type descriptors and primitive services (`quiver-core`).
///
/// Contains [`core_types::TypeDescriptor`], the unsafe [`core_types::Described`]
/// accessor trait and [`core_types::ContractViolation`].
pub use quiver_core as core_types;

/// Growable type-erased array (`quiver-array`).
pub use quiver_array as array;

/// Robin-Hood hash map (`quiver-map`).
///
/// [`map::HashMap`] for typed use, [`map::RawTable`] for descriptor-level
/// access.
pub use quiver_map as map;

/// Common imports for typical Quiver usage.
///
/// ```rust
/// use quiver::prelude::*;
/// ```
pub mod prelude {
    // Containers
    pub use quiver_array::Array;
    pub use quiver_map::{HashMap, MapConfig};

    // Descriptors
    pub use quiver_core::{Capability, Described, TypeDescriptor};

    // Errors
    pub use quiver_core::ContractViolation;
}

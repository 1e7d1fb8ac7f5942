//! Robin-Hood open-addressing hash map for Quiver.
//!
//! Keys and values are handled through their
//! [`TypeDescriptor`](quiver_core::TypeDescriptor)s. The map keeps a flat
//! index of [`Slot`]s, each pointing at an individually allocated entry
//! block that packs one key and one value ([`EntryLayout`]).
//!
//! - [`RawTable`]: the type-erased engine (probing, displacement,
//!   tombstones, rehashing).
//! - [`HashMap<K, V>`]: the safe typed facade.
//! - [`MapConfig`]: construction-time parameters.
//!
//! `unsafe` is denied at the crate root and allowed only in the `slot`,
//! `table` and `map` modules.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod map;
pub mod slot;
pub mod table;

pub use config::MapConfig;
pub use map::{HashMap, Iter, IterMut, Keys, ProbeStats, Values};
pub use slot::{EntryLayout, Slot, SlotState};
pub use table::{RawIter, RawTable};

//! Contract-violation diagnostics.
//!
//! Quiver containers distinguish two kinds of failure. Expected absence
//! (popping an empty array, looking up a missing key) is reported through
//! `Option`/`bool` return values. Everything else is a caller defect and
//! is described by a [`ContractViolation`], which is never returned to the
//! caller: it is rendered and raised as a panic at the first use site.

use std::error::Error;
use std::fmt;

use crate::descriptor::Capability;

/// A broken caller-side contract.
///
/// Continuing past any of these would let a container read uninitialised
/// or misaligned memory, so they are only ever raised through
/// [`ContractViolation::raise`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractViolation {
    /// An index outside the live range of a container.
    IndexOutOfBounds {
        /// Operation that received the index.
        operation: &'static str,
        /// The offending index.
        index: usize,
        /// The container length at the time of the call.
        bound: usize,
        /// Whether `index == bound` is accepted (insertion points).
        inclusive: bool,
    },
    /// An operation needed an optional descriptor capability the type
    /// does not provide.
    MissingCapability {
        /// Operation that needed the capability.
        caller: &'static str,
        /// Name of the element type.
        type_name: &'static str,
        /// The missing capability.
        capability: Capability,
    },
    /// A typed container was instantiated with a descriptor whose size or
    /// alignment is not its element type's.
    DescriptorMismatch {
        /// Operation that checked the descriptor.
        operation: &'static str,
        /// Name of the element type.
        type_name: &'static str,
        /// Name of the type the descriptor was built for.
        descriptor: &'static str,
    },
    /// A capacity request whose byte size does not fit in `isize`.
    CapacityOverflow {
        /// Operation that computed the size.
        operation: &'static str,
    },
    /// A configuration value rejected at construction.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl ContractViolation {
    /// Panic with the rendered diagnostic.
    ///
    /// The panic location is the caller's (through `#[track_caller]`),
    /// so the message carries file and line of the offending call.
    #[cold]
    #[track_caller]
    pub fn raise(self) -> ! {
        panic!("{self}")
    }
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfBounds {
                operation,
                index,
                bound,
                inclusive,
            } => {
                let relation = if *inclusive { "<=" } else { "<" };
                write!(
                    f,
                    "{operation}: index (is {index}) must be {relation} len (is {bound})"
                )
            }
            Self::MissingCapability {
                caller,
                type_name,
                capability,
            } => {
                write!(f, "{caller}: type {type_name} did not implement {capability}")
            }
            Self::DescriptorMismatch {
                operation,
                type_name,
                descriptor,
            } => {
                write!(
                    f,
                    "{operation}: descriptor for {descriptor} does not describe {type_name}"
                )
            }
            Self::CapacityOverflow { operation } => {
                write!(f, "{operation}: capacity overflow")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid configuration: {reason}")
            }
        }
    }
}

impl Error for ContractViolation {}

/// Raise [`ContractViolation::IndexOutOfBounds`] unless `index < bound`
/// (or `index <= bound` when `inclusive`).
#[inline]
#[track_caller]
pub fn check_index(operation: &'static str, index: usize, bound: usize, inclusive: bool) {
    let in_range = if inclusive {
        index <= bound
    } else {
        index < bound
    };
    if !in_range {
        ContractViolation::IndexOutOfBounds {
            operation,
            index,
            bound,
            inclusive,
        }
        .raise();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_message_names_operation_and_bound() {
        let v = ContractViolation::IndexOutOfBounds {
            operation: "Array::remove",
            index: 7,
            bound: 3,
            inclusive: false,
        };
        assert_eq!(
            v.to_string(),
            "Array::remove: index (is 7) must be < len (is 3)"
        );
    }

    #[test]
    fn inclusive_index_message_uses_le() {
        let v = ContractViolation::IndexOutOfBounds {
            operation: "Array::insert",
            index: 4,
            bound: 3,
            inclusive: true,
        };
        assert!(v.to_string().contains("must be <= len (is 3)"));
    }

    #[test]
    fn missing_capability_message() {
        let v = ContractViolation::MissingCapability {
            caller: "Array::sort",
            type_name: "Opaque",
            capability: Capability::Compare,
        };
        assert_eq!(v.to_string(), "Array::sort: type Opaque did not implement compare");
    }

    #[test]
    fn descriptor_mismatch_message() {
        let v = ContractViolation::DescriptorMismatch {
            operation: "HashMap::new",
            type_name: "Big",
            descriptor: "u8",
        };
        assert_eq!(v.to_string(), "HashMap::new: descriptor for u8 does not describe Big");
    }

    #[test]
    fn check_index_accepts_insertion_point() {
        check_index("insert", 3, 3, true);
        check_index("get", 2, 3, false);
    }

    #[test]
    #[should_panic(expected = "remove: index (is 3) must be < len (is 3)")]
    fn check_index_rejects_len_when_exclusive() {
        check_index("remove", 3, 3, false);
    }

    #[test]
    #[should_panic(expected = "reserve: capacity overflow")]
    fn raise_panics_with_message() {
        ContractViolation::CapacityOverflow {
            operation: "reserve",
        }
        .raise();
    }
}

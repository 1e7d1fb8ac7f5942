//! Map configuration parameters.

use quiver_core::ContractViolation;

/// Construction-time parameters for a [`HashMap`](crate::HashMap).
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapConfig {
    initial_capacity: usize,
}

impl MapConfig {
    /// Default capacity of the first table allocation.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 8;

    /// Create a config whose first insert into an empty map allocates
    /// `initial_capacity` slots.
    ///
    /// `initial_capacity` must be a non-zero power of two.
    pub fn new(initial_capacity: usize) -> Result<Self, ContractViolation> {
        if !initial_capacity.is_power_of_two() {
            return Err(ContractViolation::InvalidConfig {
                reason: format!(
                    "initial_capacity must be a non-zero power of two (is {initial_capacity})"
                ),
            });
        }
        Ok(Self { initial_capacity })
    }

    /// Capacity of the first table allocation.
    pub const fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
        }
    }
}

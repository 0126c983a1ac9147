#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seeded provider of the random scalars that perturb turtle rotations.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};

/// Number of slots held by a [`VarianceTable`].
pub const VARIANCE_CAPACITY: usize = 100;

/// Slot read by each rotating symbol class.
///
/// Every occurrence of a class reads the same slot, so all branch points of a
/// tree share one perturbation per class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarianceSlot {
    /// `*`: positive yaw about world up.
    Yaw = 0,
    /// `/`: negative yaw about world up.
    YawInverse = 1,
    /// `+`: positive roll about the turtle's forward axis.
    Roll = 2,
    /// `-`: negative roll about the turtle's forward axis.
    RollInverse = 3,
}

/// Fixed-capacity table of scalars in `[-1, 1]`.
///
/// Only the four [`VarianceSlot`] indices are read; the remaining capacity is
/// reserved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VarianceTable {
    values: [f32; VARIANCE_CAPACITY],
}

impl VarianceTable {
    /// Table with every slot set to zero.
    pub const ZERO: Self = Self {
        values: [0.0; VARIANCE_CAPACITY],
    };

    /// Creates a table from explicit values.
    #[must_use]
    pub const fn from_values(values: [f32; VARIANCE_CAPACITY]) -> Self {
        Self { values }
    }

    /// Value stored for a symbol class.
    #[must_use]
    pub const fn slot(&self, slot: VarianceSlot) -> f32 {
        self.values[slot as usize]
    }

    /// Every stored value, including the reserved capacity.
    #[must_use]
    pub const fn values(&self) -> &[f32; VARIANCE_CAPACITY] {
        &self.values
    }
}

impl Default for VarianceTable {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Deterministic random source for variance tables and palette picks.
#[derive(Debug, Clone)]
pub struct RandomVarianceProvider {
    rng: ChaCha8Rng,
    unit: Uniform<f32>,
}

impl RandomVarianceProvider {
    /// Creates a provider seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            unit: Uniform::new_inclusive(-1.0, 1.0),
        }
    }

    /// Fills a fresh table with independent uniform draws in `[-1, 1]`.
    pub fn redraw(&mut self) -> VarianceTable {
        let mut values = [0.0; VARIANCE_CAPACITY];
        for value in &mut values {
            *value = self.unit.sample(&mut self.rng);
        }
        VarianceTable { values }
    }

    /// Draws a uniform index below `len`, or `None` when `len` is zero.
    pub fn draw_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.rng.gen_range(0..len))
    }
}

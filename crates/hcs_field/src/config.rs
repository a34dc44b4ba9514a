//! FieldConfig - domain placement and access behavior of a field.

use crate::hcs::Interleave;

/// Behavior of [`Field::at`](crate::Field::at) for keys that do not exist.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum MissingKeyPolicy {
  /// Return [`FieldError::NotFound`](crate::FieldError::NotFound).
  Throw,
  /// Bring the key into existence with `refine_to`, then return it.
  /// Mutates topology and may take O(level).
  Refine,
  /// Fill the scratch cell with the interpolated value and return it.
  /// Writes go to the scratch cell, not the field.
  #[default]
  Interpolate,
  /// Return the scratch cell untouched. Fastest; check `exists` first if the
  /// value matters.
  Default,
}

/// Configuration for a field and its coordinate system.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldConfig<const D: usize> {
  /// Domain center per axis.
  pub center: [f64; D],

  /// Domain half-extent per axis. The domain is `center ± scales`.
  pub scales: [f64; D],

  /// Access behavior for missing keys.
  pub policy: MissingKeyPolicy,

  /// Morton interleave path. Resolved against the CPU at construction.
  pub interleave: Interleave,
}

impl<const D: usize> FieldConfig<D> {
  /// Domain spanning `center ± scales`.
  pub fn new(center: [f64; D], scales: [f64; D]) -> Self {
    Self {
      center,
      scales,
      ..Self::default()
    }
  }

  /// Domain spanning `min..max` on every axis.
  pub fn from_bounds(min: [f64; D], max: [f64; D]) -> Self {
    let mut center = [0.0; D];
    let mut scales = [0.0; D];
    for axis in 0..D {
      debug_assert!(min[axis] <= max[axis], "bounds min must be <= max");
      center[axis] = (min[axis] + max[axis]) * 0.5;
      scales[axis] = (max[axis] - min[axis]) * 0.5;
    }
    Self::new(center, scales)
  }

  /// Replace the missing-key policy.
  pub fn with_policy(mut self, policy: MissingKeyPolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Replace the interleave path.
  pub fn with_interleave(mut self, interleave: Interleave) -> Self {
    self.interleave = interleave;
    self
  }

  /// Minimum corner of the domain.
  pub fn min_corner(&self) -> [f64; D] {
    std::array::from_fn(|axis| self.center[axis] - self.scales[axis])
  }

  /// Maximum corner of the domain.
  pub fn max_corner(&self) -> [f64; D] {
    std::array::from_fn(|axis| self.center[axis] + self.scales[axis])
  }
}

impl<const D: usize> Default for FieldConfig<D> {
  /// Unit box from 0 to 1, interpolating reads.
  fn default() -> Self {
    Self {
      center: [0.5; D],
      scales: [0.5; D],
      policy: MissingKeyPolicy::default(),
      interleave: Interleave::default(),
    }
  }
}

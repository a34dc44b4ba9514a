//! Hypercube interpolation and coefficient expansion.
//!
//! A missing key is reconstructed from the `2^D` corners of the hypercube
//! one level up. The parent (`origin`) is always the nearest corner; the
//! key's own digit picks, per axis, which side the other corners lie on:
//!
//! ```text
//!   2D, digit 0b01 (+X, -Y):
//!
//!     origin ──── +X          weights per axis: near 0.75, far 0.25
//!       │          │          corner weight = product over axes
//!       -Y ───── +X-Y         0.5625  0.1875  0.1875  0.0625
//! ```
//!
//! An axis whose far corner lies outside the domain is quenched to 0.5/0.5
//! and the far side is sourced from the boundary callback. Missing corners
//! recurse, interior corners descend into their children when non-leaf
//! values are not trusted. All weights over the whole recursion sum to 1.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use super::{Field, FieldValue, Keys, TraversalMode};
use crate::constants::{Key, FAR_WEIGHT, NEAR_WEIGHT, QUENCHED_WEIGHT};
use crate::error::{FieldError, Result};
use crate::hcs::{Direction, Hcs};

/// Interpolation stencil: existing or boundary key to cumulative weight.
pub type CoeffMap = BTreeMap<Key, f64>;

/// Receives the weighted leaves of an expansion.
trait Sink<T, const D: usize> {
  /// An existing key whose stored value is used as is.
  fn direct(&mut self, field: &Field<T, D>, key: Key, weight: f64);
  /// A boundary key, resolved through the registry.
  fn boundary(&mut self, field: &Field<T, D>, key: Key, weight: f64);
}

/// Collapses the expansion to a value.
struct ValueSink<T> {
  value: T,
}

impl<T: FieldValue, const D: usize> Sink<T, D> for ValueSink<T> {
  fn direct(&mut self, field: &Field<T, D>, key: Key, weight: f64) {
    self.value += field.data[key as usize].clone() * weight;
  }

  fn boundary(&mut self, field: &Field<T, D>, key: Key, weight: f64) {
    if field.boundary.is_set(Hcs::<D>::boundary_direction(key)) {
      self.value += field.boundary.evaluate(field, key) * weight;
    }
  }
}

/// Records the expansion as a stencil.
struct CoeffSink<'a> {
  coeffs: &'a mut CoeffMap,
}

impl<T, const D: usize> Sink<T, D> for CoeffSink<'_> {
  fn direct(&mut self, _field: &Field<T, D>, key: Key, weight: f64) {
    *self.coeffs.entry(key).or_insert(0.0) += weight;
  }

  fn boundary(&mut self, _field: &Field<T, D>, key: Key, weight: f64) {
    *self.coeffs.entry(key).or_insert(0.0) += weight;
  }
}

impl<T: FieldValue, const D: usize> Field<T, D> {
  /// Value at `key`, trusting stored values of refined keys.
  ///
  /// Shorthand for `get_with(key, true)`.
  pub fn get(&self, key: Key) -> Result<T> {
    self.get_with(key, true)
  }

  /// Value at any key.
  ///
  /// - boundary key: the registered callback for its direction, or
  ///   `T::default()` if none
  /// - existing leaf, or refined key with `use_non_leaf`: the stored value
  /// - refined key otherwise: the average of its children, recursively
  /// - missing key: hypercube interpolation from the level above
  pub fn get_with(&self, key: Key, use_non_leaf: bool) -> Result<T> {
    if Hcs::<D>::is_boundary(key) {
      return Ok(self.boundary.evaluate(self, key));
    }
    self.check_addressable(key)?;
    if self.exists(key) && (use_non_leaf || self.tree[key as usize] == key) {
      return Ok(self.data[key as usize].clone());
    }
    let mut sink = ValueSink { value: T::default() };
    self.expand(key, 1.0, use_non_leaf, 0, &mut sink)?;
    Ok(sink.value)
  }

  /// Accumulate the interpolation stencil of `key` into `coeffs`.
  ///
  /// Weights are added to entries already present, so stencils of several
  /// keys can be merged into one map.
  pub fn get_coeffs(&self, key: Key, coeffs: &mut CoeffMap, use_non_leaf: bool) -> Result<()> {
    if !Hcs::<D>::is_boundary(key) {
      self.check_addressable(key)?;
    }
    self.expand(key, 1.0, use_non_leaf, 0, &mut CoeffSink { coeffs })
  }

  /// Interpolation stencil of `key` in a fresh map.
  pub fn coefficients(&self, key: Key, use_non_leaf: bool) -> Result<CoeffMap> {
    let mut coeffs = CoeffMap::new();
    self.get_coeffs(key, &mut coeffs, use_non_leaf)?;
    Ok(coeffs)
  }

  /// Overwrite every refined key with the average of its children,
  /// deepest level first.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "field::propagate"))]
  pub fn propagate(&mut self) {
    let share = 1.0 / Hcs::<D>::PARTS as f64;
    let tree = &self.tree;
    let data = &mut self.data;
    for level in (0..Hcs::<D>::level(tree.len() as Key - 1)).rev() {
      for key in Keys::<D>::new(tree, TraversalMode::Level(level)) {
        if tree[key as usize] == key {
          continue;
        }
        let mut average = T::default();
        for child in Self::children(key) {
          average += data[child as usize].clone() * share;
        }
        data[key as usize] = average;
      }
    }
  }

  /// Reject key 0, gap keys and keys deeper than the encodable range.
  fn check_addressable(&self, key: Key) -> Result<()> {
    if !Hcs::<D>::is_valid(key) {
      return Err(FieldError::InvalidKey);
    }
    let level = Hcs::<D>::level(key);
    let max_level = self.hcs.max_level();
    if level > max_level {
      return Err(FieldError::LevelLimit { level, max_level });
    }
    Ok(())
  }

  /// Shared traversal behind `get_with` and `get_coeffs`.
  fn expand<S: Sink<T, D>>(
    &self,
    key: Key,
    weight: f64,
    use_non_leaf: bool,
    depth: u32,
    sink: &mut S,
  ) -> Result<()> {
    if Hcs::<D>::is_boundary(key) {
      sink.boundary(self, key, weight);
      return Ok(());
    }
    let max_level = self.hcs.max_level();
    if depth > max_level {
      #[cfg(feature = "tracing")]
      tracing::warn!(key = %self.hcs.describe(key), max_level, "expansion recursion limit reached");
      return Err(FieldError::TopologyOverflow { key, max_level });
    }

    if self.exists(key) {
      if use_non_leaf || self.tree[key as usize] == key {
        sink.direct(self, key, weight);
        return Ok(());
      }
      let share = weight / Hcs::<D>::PARTS as f64;
      for child in Self::children(key) {
        self.expand(child, share, use_non_leaf, depth + 1, sink)?;
      }
      return Ok(());
    }

    let digit = Hcs::<D>::extract(key, 0);
    let origin = Hcs::<D>::reduce_level(key);
    if origin == key {
      return Err(FieldError::InvalidKey);
    }
    let toward = |axis: usize| Direction::new(axis, (digit >> axis) & 1 == 0);
    let quenched: [bool; D] =
      std::array::from_fn(|axis| Hcs::<D>::is_boundary(self.hcs.get_neighbor(origin, toward(axis))));

    for corner in 0..Hcs::<D>::PARTS {
      let mut corner_weight = weight;
      for (axis, &quench) in quenched.iter().enumerate() {
        corner_weight *= if quench {
          QUENCHED_WEIGHT
        } else if (corner >> axis) & 1 == 1 {
          FAR_WEIGHT
        } else {
          NEAR_WEIGHT
        };
      }

      let mut current = origin;
      let mut escapes: SmallVec<[Key; 4]> = SmallVec::new();
      for axis in (0..D).filter(|axis| (corner >> axis) & 1 == 1) {
        let next = self.hcs.get_neighbor(current, toward(axis));
        if Hcs::<D>::is_boundary(next) {
          escapes.push(next);
        } else {
          current = next;
        }
      }

      if escapes.is_empty() {
        self.expand(current, corner_weight, use_non_leaf, depth + 1, sink)?;
      } else {
        let share = corner_weight / escapes.len() as f64;
        for escaped in escapes {
          sink.boundary(self, escaped, share);
        }
      }
    }
    Ok(())
  }
}

#[cfg(test)]
#[path = "interpolate_test.rs"]
mod interpolate_test;

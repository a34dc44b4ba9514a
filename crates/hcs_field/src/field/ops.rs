//! Field arithmetic and functional hooks.
//!
//! Scalar operators act on every stored value, refined keys included, so a
//! propagated field stays consistent. Field-with-field operators read the
//! right-hand side through `get`, which lets the two fields differ in
//! topology.

use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

use super::{Field, FieldValue, TraversalMode};
use crate::constants::Key;
use crate::error::Result;

impl<T: FieldValue, const D: usize> Field<T, D> {
  /// Set every stored value to `value`.
  pub fn fill(&mut self, value: T) {
    for (_, slot) in self.iter_mut(TraversalMode::All) {
      slot.clone_from(&value);
    }
  }

  /// Combine every stored value with `rhs` sampled at the same key.
  pub fn apply_field<U, F>(&mut self, rhs: &Field<U, D>, mut op: F) -> Result<()>
  where
    U: FieldValue,
    F: FnMut(&mut T, U),
  {
    for (key, value) in self.iter_mut(TraversalMode::All) {
      op(value, rhs.get(key)?);
    }
    Ok(())
  }

  /// `self[k] += rhs.get(k)` for every existing key.
  pub fn add_field(&mut self, rhs: &Field<T, D>) -> Result<()> {
    self.apply_field(rhs, |value, other| *value += other)
  }

  /// `self[k] -= rhs.get(k)` for every existing key.
  pub fn sub_field(&mut self, rhs: &Field<T, D>) -> Result<()>
  where
    T: SubAssign,
  {
    self.apply_field(rhs, |value, other| *value -= other)
  }

  /// `self[k] *= rhs.get(k)` for every existing key.
  pub fn mul_field(&mut self, rhs: &Field<T, D>) -> Result<()>
  where
    T: MulAssign,
  {
    self.apply_field(rhs, |value, other| *value *= other)
  }

  /// `self[k] /= rhs.get(k)` for every existing key.
  pub fn div_field(&mut self, rhs: &Field<T, D>) -> Result<()>
  where
    T: DivAssign,
  {
    self.apply_field(rhs, |value, other| *value /= other)
  }

  /// Fill the leaves of this field from `source` through `convert`.
  ///
  /// `convert` receives each leaf key of this field and the source field,
  /// usually sampling it with `get`.
  pub fn convert<U, F>(&mut self, source: &Field<U, D>, mut convert: F) -> Result<()>
  where
    U: FieldValue,
    F: FnMut(Key, &Field<U, D>) -> Result<T>,
  {
    for (key, value) in self.iter_mut(TraversalMode::Top) {
      *value = convert(key, source)?;
    }
    Ok(())
  }

  /// Fill the leaves of this field by combining `a` and `b` at each key.
  pub fn merge<A, B, F>(&mut self, a: &Field<A, D>, b: &Field<B, D>, mut merge: F) -> Result<()>
  where
    A: FieldValue,
    B: FieldValue,
    F: FnMut(Key, A, B) -> T,
  {
    for (key, value) in self.iter_mut(TraversalMode::Top) {
      *value = merge(key, a.get(key)?, b.get(key)?);
    }
    Ok(())
  }

  /// New field of another element type with this field's topology, domain
  /// and policy, filled by `map` at every existing key.
  pub fn map_structure<U, F>(&self, mut map: F) -> Result<Field<U, D>>
  where
    U: FieldValue,
    F: FnMut(Key, &Field<T, D>) -> Result<U>,
  {
    let mut result = Field::<U, D>::with_hcs(self.hcs.clone());
    result.set_policy(self.policy);
    result.take_structure(self);
    for (key, value) in result.iter_mut(TraversalMode::All) {
      *value = map(key, self)?;
    }
    Ok(result)
  }
}

impl<T: FieldValue, const D: usize> AddAssign<T> for Field<T, D> {
  fn add_assign(&mut self, rhs: T) {
    for (_, value) in self.iter_mut(TraversalMode::All) {
      *value += rhs.clone();
    }
  }
}

impl<T: FieldValue + SubAssign, const D: usize> SubAssign<T> for Field<T, D> {
  fn sub_assign(&mut self, rhs: T) {
    for (_, value) in self.iter_mut(TraversalMode::All) {
      *value -= rhs.clone();
    }
  }
}

impl<T: FieldValue, const D: usize> MulAssign<f64> for Field<T, D> {
  fn mul_assign(&mut self, rhs: f64) {
    for (_, value) in self.iter_mut(TraversalMode::All) {
      *value = std::mem::take(value) * rhs;
    }
  }
}

impl<T: FieldValue + DivAssign<f64>, const D: usize> DivAssign<f64> for Field<T, D> {
  fn div_assign(&mut self, rhs: f64) {
    for (_, value) in self.iter_mut(TraversalMode::All) {
      *value /= rhs;
    }
  }
}

#[cfg(test)]
#[path = "ops_test.rs"]
mod ops_test;

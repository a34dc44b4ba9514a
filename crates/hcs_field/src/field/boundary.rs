//! Per-direction boundary callbacks.
//!
//! When interpolation or a direct read reaches a boundary key, the callback
//! registered for the key's escape direction supplies the value. Each
//! direction also carries a propagate flag deciding whether the callback
//! survives `Field::clone`.

use std::fmt;
use std::sync::Arc;

use super::Field;
use crate::constants::Key;
use crate::hcs::{Direction, Hcs};

/// Boundary callback: receives the owning field and the escaped key.
pub type BoundaryFn<T, const D: usize> = Arc<dyn Fn(&Field<T, D>, Key) -> T + Send + Sync>;

/// Callback table, one slot per signed axis direction.
pub struct BoundaryRegistry<T, const D: usize> {
  callbacks: [[Option<BoundaryFn<T, D>>; 2]; D],
  propagate: [[bool; 2]; D],
}

impl<T, const D: usize> BoundaryRegistry<T, D> {
  /// Empty registry; every direction propagates on copy.
  pub fn new() -> Self {
    Self {
      callbacks: std::array::from_fn(|_| [None, None]),
      propagate: [[true; 2]; D],
    }
  }

  #[inline]
  fn slot(direction: Direction) -> (usize, usize) {
    (direction.axis(), direction.is_negative() as usize)
  }

  /// Register `callback` for `direction`, keeping the propagate flag.
  pub fn set<F>(&mut self, direction: Direction, callback: F)
  where
    F: Fn(&Field<T, D>, Key) -> T + Send + Sync + 'static,
  {
    let (axis, side) = Self::slot(direction);
    self.callbacks[axis][side] = Some(Arc::new(callback));
  }

  /// Register `callback` for `direction` and set its propagate flag.
  pub fn set_with_propagation<F>(&mut self, direction: Direction, callback: F, propagate: bool)
  where
    F: Fn(&Field<T, D>, Key) -> T + Send + Sync + 'static,
  {
    self.set(direction, callback);
    self.set_propagate(direction, propagate);
  }

  /// Remove the callback for `direction`, returning it.
  pub fn remove(&mut self, direction: Direction) -> Option<BoundaryFn<T, D>> {
    let (axis, side) = Self::slot(direction);
    self.callbacks[axis][side].take()
  }

  /// Callback registered for `direction`.
  pub fn get(&self, direction: Direction) -> Option<&BoundaryFn<T, D>> {
    let (axis, side) = Self::slot(direction);
    self.callbacks.get(axis)?[side].as_ref()
  }

  #[inline]
  pub fn is_set(&self, direction: Direction) -> bool {
    self.get(direction).is_some()
  }

  /// Whether the callback for `direction` survives a copy of the field.
  pub fn propagates(&self, direction: Direction) -> bool {
    let (axis, side) = Self::slot(direction);
    self.propagate[axis][side]
  }

  pub fn set_propagate(&mut self, direction: Direction, propagate: bool) {
    let (axis, side) = Self::slot(direction);
    self.propagate[axis][side] = propagate;
  }

  /// Value for a boundary key, `T::default()` when nothing is registered.
  pub fn evaluate(&self, field: &Field<T, D>, key: Key) -> T
  where
    T: Default,
  {
    match self.get(Hcs::<D>::boundary_direction(key)) {
      Some(callback) => callback(field, key),
      None => T::default(),
    }
  }

  /// Registry for a copied field: only propagating callbacks are carried.
  pub fn for_copy(&self) -> Self {
    let mut copy = Self::new();
    copy.propagate = self.propagate;
    for axis in 0..D {
      for side in 0..2 {
        if self.propagate[axis][side] {
          copy.callbacks[axis][side].clone_from(&self.callbacks[axis][side]);
        }
      }
    }
    copy
  }
}

impl<T, const D: usize> Default for BoundaryRegistry<T, D> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T, const D: usize> Clone for BoundaryRegistry<T, D> {
  fn clone(&self) -> Self {
    Self {
      callbacks: self.callbacks.clone(),
      propagate: self.propagate,
    }
  }
}

impl<T, const D: usize> fmt::Debug for BoundaryRegistry<T, D> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let registered: Vec<usize> = Direction::all(D)
      .filter(|&direction| self.is_set(direction))
      .map(Direction::index)
      .collect();
    f.debug_struct("BoundaryRegistry")
      .field("registered", &registered)
      .field("propagate", &self.propagate)
      .finish()
  }
}

//! Key-ordered traversal over the topology array.
//!
//! All iterators walk keys in ascending order, which is also level order
//! (every level occupies its own key range). Missing slots are skipped
//! through their ancestor hint. Starting at the hint, the first ancestor
//! `a` on the slot's path that is not refined has no descendants, so with
//! `a` on level `l - n` the whole range up to `(a + 1) << (n * D)` can be
//! jumped.

use std::iter::FusedIterator;
use std::slice;

use super::{Field, FieldValue};
use crate::constants::{self, Key, Level, ROOT};
use crate::error::{FieldError, Result};
use crate::hcs::Hcs;

/// Which existing keys a traversal visits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum TraversalMode {
  /// Every existing key, refined ones included.
  #[default]
  All,
  /// Leaves only.
  Top,
  /// Existing keys of a single level, refined ones included.
  Level(Level),
}

/// Existing keys in ascending order.
#[derive(Clone, Debug)]
pub struct Keys<'a, const D: usize> {
  tree: &'a [Key],
  mode: TraversalMode,
  next: Option<Key>,
}

impl<'a, const D: usize> Keys<'a, D> {
  /// Traverse a topology array in `mode`.
  pub fn new(tree: &'a [Key], mode: TraversalMode) -> Self {
    let start = match mode {
      TraversalMode::All | TraversalMode::Top => Some(ROOT),
      TraversalMode::Level(level) if level <= constants::max_level(D) => {
        Some(Hcs::<D>::create_min_level(level))
      }
      TraversalMode::Level(_) => None,
    };
    let mut keys = Self {
      tree,
      mode,
      next: None,
    };
    keys.next = start.and_then(|start| keys.settle(start));
    keys
  }

  /// Traversal mode.
  pub fn mode(&self) -> TraversalMode {
    self.mode
  }

  /// First key at or after `candidate` accepted by the mode.
  fn settle(&self, mut candidate: Key) -> Option<Key> {
    loop {
      let key = self.seek(candidate)?;
      match self.mode {
        TraversalMode::All => return Some(key),
        TraversalMode::Top => {
          if self.tree[key as usize] == key {
            return Some(key);
          }
          candidate = key + 1;
        }
        TraversalMode::Level(level) => {
          return (Hcs::<D>::level(key) == level).then_some(key);
        }
      }
    }
  }

  /// First existing key at or after `candidate`.
  fn seek(&self, mut candidate: Key) -> Option<Key> {
    loop {
      let index = usize::try_from(candidate)
        .ok()
        .filter(|&index| index < self.tree.len())?;
      let level = Hcs::<D>::level(candidate);
      if candidate > Hcs::<D>::create_max_level(level) {
        candidate = Hcs::<D>::create_min_level(level + 1);
        continue;
      }
      let hint = self.tree[index];
      if hint >= candidate {
        return Some(candidate);
      }
      candidate = self.skip_past(candidate, hint);
    }
  }

  /// Next candidate after a missing key, jumping the hinted subtree.
  fn skip_past(&self, key: Key, hint: Key) -> Key {
    if !Hcs::<D>::is_valid(hint) {
      return key + 1;
    }
    let mut hint_level = Hcs::<D>::level(hint);
    let level = Hcs::<D>::level(key);
    if hint_level >= level || Hcs::<D>::ancestor_at(key, hint_level) != hint {
      return key + 1;
    }
    // Stops at `key` at the latest, which is missing.
    let mut ancestor = hint;
    while self.tree[ancestor as usize] > ancestor {
      hint_level += 1;
      ancestor = Hcs::<D>::ancestor_at(key, hint_level);
    }
    (ancestor + 1) << (D as u32 * (level - hint_level))
  }
}

impl<const D: usize> Iterator for Keys<'_, D> {
  type Item = Key;

  fn next(&mut self) -> Option<Key> {
    let current = self.next?;
    self.next = self.settle(current + 1);
    Some(current)
  }
}

impl<const D: usize> FusedIterator for Keys<'_, D> {}

/// Existing keys with shared access to their values.
pub struct Iter<'a, T, const D: usize> {
  keys: Keys<'a, D>,
  data: &'a [T],
}

impl<'a, T, const D: usize> Iterator for Iter<'a, T, D> {
  type Item = (Key, &'a T);

  fn next(&mut self) -> Option<Self::Item> {
    let key = self.keys.next()?;
    Some((key, &self.data[key as usize]))
  }
}

impl<T, const D: usize> FusedIterator for Iter<'_, T, D> {}

/// Existing keys with exclusive access to their values.
pub struct IterMut<'a, T, const D: usize> {
  keys: Keys<'a, D>,
  data: slice::IterMut<'a, T>,
  position: usize,
}

impl<'a, T, const D: usize> Iterator for IterMut<'a, T, D> {
  type Item = (Key, &'a mut T);

  fn next(&mut self) -> Option<Self::Item> {
    let key = self.keys.next()?;
    let index = key as usize;
    let value = self.data.nth(index - self.position)?;
    self.position = index + 1;
    Some((key, value))
  }
}

impl<T, const D: usize> FusedIterator for IterMut<'_, T, D> {}

/// Lockstep traversal of two fields with identical topology.
pub struct ZipMut<'a, T, U, const D: usize> {
  inner: IterMut<'a, T, D>,
  other: &'a [U],
}

impl<'a, T, U, const D: usize> Iterator for ZipMut<'a, T, U, D> {
  type Item = (Key, &'a mut T, &'a U);

  fn next(&mut self) -> Option<Self::Item> {
    let (key, value) = self.inner.next()?;
    Some((key, value, &self.other[key as usize]))
  }
}

impl<T, U, const D: usize> FusedIterator for ZipMut<'_, T, U, D> {}

impl<T: FieldValue, const D: usize> Field<T, D> {
  /// Existing keys in ascending order.
  pub fn keys(&self, mode: TraversalMode) -> Keys<'_, D> {
    Keys::new(&self.tree, mode)
  }

  /// Existing keys and their stored values.
  pub fn iter(&self, mode: TraversalMode) -> Iter<'_, T, D> {
    Iter {
      keys: self.keys(mode),
      data: &self.data,
    }
  }

  /// Existing keys and mutable access to their stored values.
  pub fn iter_mut(&mut self, mode: TraversalMode) -> IterMut<'_, T, D> {
    IterMut {
      keys: Keys::new(&self.tree, mode),
      data: self.data.iter_mut(),
      position: 0,
    }
  }

  /// Walk this field and `other` together.
  ///
  /// Fails with `StructuralMismatch` unless both have the same topology.
  pub fn zip_mut<'a, U>(
    &'a mut self,
    other: &'a Field<U, D>,
    mode: TraversalMode,
  ) -> Result<ZipMut<'a, T, U, D>> {
    if !self.same_structure(other) {
      return Err(FieldError::StructuralMismatch {
        left: self.n_elements,
        right: other.n_elements,
      });
    }
    Ok(ZipMut {
      inner: self.iter_mut(mode),
      other: &other.data,
    })
  }
}

impl<'a, T: FieldValue, const D: usize> IntoIterator for &'a Field<T, D> {
  type Item = (Key, &'a T);
  type IntoIter = Iter<'a, T, D>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter(TraversalMode::All)
  }
}

#[cfg(test)]
#[path = "iter_test.rs"]
mod iter_test;

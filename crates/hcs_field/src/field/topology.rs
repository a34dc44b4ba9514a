//! Topology mutation: refine, coarsen and bulk level creation.
//!
//! # Array Growth
//!
//! Both arrays always cover complete levels (`len = max_key(level) + 1`).
//! When refinement reaches past the allocated level, the arrays grow and
//! every new slot receives its ancestor at the old deepest level as a hint:
//!
//! ```text
//! before:  [0, 1, 4, 5, 6, 7]                     (root refined, D = 2)
//! after:   [0, 1, 4, 5, 6, 7, 0.., 4,4,4,4, 5,5,5,5, ...]
//!                           gap    level-2 slots hint at level-1 parent
//! ```
//!
//! # Hints
//!
//! A missing slot always holds one of its proper ancestors. Refinement never
//! rewrites hints, so a hint may name a key that has since been refined;
//! the iterator resolves such a hint by walking down the slot's own path to
//! the first ancestor without children. Refining is therefore constant work
//! plus array growth, whatever the depth of the allocation below the key.

use smallvec::{smallvec, SmallVec};

use super::{Field, FieldValue, TraversalMode};
use crate::constants::{Key, Level, INVALID};
use crate::error::{FieldError, Result};
use crate::hcs::Hcs;

/// How `refine_from` fills the values of new children.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum RefineSeed {
  /// Every child starts with the parent's value.
  #[default]
  CopyParent,
  /// Every child starts with `get(child)` evaluated before insertion.
  Interpolate,
}

impl<T: FieldValue, const D: usize> Field<T, D> {
  /// Split an existing leaf into its `2^D` children.
  ///
  /// No-op if `key` is already refined. The parent keeps its stored value.
  pub fn refine_from(&mut self, key: Key, seed: RefineSeed) -> Result<()> {
    if !self.exists(key) {
      return Err(FieldError::NotFound { key });
    }
    let index = key as usize;
    if self.tree[index] != key {
      return Ok(());
    }

    let level = Hcs::<D>::level(key) + 1;
    let max_level = self.hcs.max_level();
    if level > max_level {
      return Err(FieldError::LevelLimit { level, max_level });
    }

    let seeds: SmallVec<[T; 8]> = match seed {
      RefineSeed::CopyParent => smallvec![self.data[index].clone(); Hcs::<D>::PARTS],
      RefineSeed::Interpolate => Self::children(key)
        .map(|child| self.get(child))
        .collect::<Result<_>>()?,
    };

    self.grow_to(level);

    let first = Hcs::<D>::increase_level(key, 0);
    for (child, value) in Self::children(key).zip(seeds) {
      self.tree[child as usize] = child;
      self.data[child as usize] = value;
    }
    self.tree[index] = first;
    self.n_elements += Hcs::<D>::PARTS;
    self.n_top += Hcs::<D>::PARTS - 1;

    #[cfg(feature = "tracing")]
    tracing::trace!(key, level, n_elements = self.n_elements, "refined");

    Ok(())
  }

  /// Make `key` exist by refining every leaf on the path from its deepest
  /// existing ancestor. No-op if it already exists.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "field::refine_to"))]
  pub fn refine_to(&mut self, key: Key, seed: RefineSeed) -> Result<()> {
    if !Hcs::<D>::is_valid(key) {
      return Err(FieldError::InvalidKey);
    }
    let level = Hcs::<D>::level(key);
    let max_level = self.hcs.max_level();
    if level > max_level {
      return Err(FieldError::LevelLimit { level, max_level });
    }

    let mut current = self.existing_ancestor(key).ok_or(FieldError::InvalidKey)?;
    while current != key {
      self.refine_from(current, seed)?;
      current = Hcs::<D>::ancestor_at(key, Hcs::<D>::level(current) + 1);
    }
    Ok(())
  }

  /// Remove every descendant of `key`, turning it back into a leaf.
  ///
  /// No-op on a leaf. The stored value of `key` is left untouched, so
  /// `refine_from` followed by `coarse` restores the field exactly.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "field::coarse"))]
  pub fn coarse(&mut self, key: Key) -> Result<()> {
    if !self.exists(key) {
      return Err(FieldError::NotFound { key });
    }
    if self.tree[key as usize] == key {
      return Ok(());
    }

    let mut removed = 0;
    let mut removed_top = 0;
    let mut stack: SmallVec<[Key; 64]> = Self::children(key).collect();
    while let Some(node) = stack.pop() {
      let index = node as usize;
      if self.tree[index] == node {
        removed_top += 1;
      } else {
        stack.extend(Self::children(node));
      }
      self.tree[index] = key;
      removed += 1;
    }
    self.tree[key as usize] = key;
    self.n_elements -= removed;
    self.n_top = self.n_top + 1 - removed_top;

    #[cfg(feature = "tracing")]
    tracing::debug!(key, removed, n_elements = self.n_elements, "coarsened");

    Ok(())
  }

  /// Replace a root-only field with a uniform tree refined down to `level`.
  ///
  /// Every key of levels `0..level` is refined, every key of `level` is a
  /// leaf. Stored values reset to `T::default()`.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "field::create_entire_level"))]
  pub fn create_entire_level(&mut self, level: Level) -> Result<()> {
    if !self.is_root_only() {
      return Err(FieldError::AlreadyInitialized {
        elements: self.n_elements,
      });
    }
    let max_level = self.hcs.max_level();
    if level > max_level {
      return Err(FieldError::LevelLimit { level, max_level });
    }

    let len = Hcs::<D>::create_max_level(level) as usize + 1;
    self.tree = vec![INVALID; len];
    self.data = vec![T::default(); len];

    let mut n_elements = 0;
    for current in 0..=level {
      let first = Hcs::<D>::create_min_level(current);
      let last = Hcs::<D>::create_max_level(current);
      for key in first..=last {
        self.tree[key as usize] = if current == level {
          key
        } else {
          Hcs::<D>::increase_level(key, 0)
        };
      }
      n_elements += (last - first + 1) as usize;
    }
    self.n_elements = n_elements;
    self.n_top = Hcs::<D>::PARTS.pow(level);

    #[cfg(feature = "tracing")]
    tracing::debug!(level, n_elements, len, "created entire level");

    Ok(())
  }

  /// Deepest level holding a leaf.
  pub fn get_highest_level(&self) -> Level {
    self
      .keys(TraversalMode::Top)
      .map(Hcs::<D>::level)
      .max()
      .unwrap_or(0)
  }

  /// Extend both arrays to cover every key of `level`.
  fn grow_to(&mut self, level: Level) {
    let old_level = self.allocated_level();
    if level <= old_level {
      return;
    }
    let len = Hcs::<D>::create_max_level(level) as usize + 1;
    self.tree.resize(len, INVALID);
    self.data.resize(len, T::default());
    for current in old_level + 1..=level {
      let shift = D as u32 * (current - old_level);
      for key in Hcs::<D>::create_min_level(current)..=Hcs::<D>::create_max_level(current) {
        self.tree[key as usize] = key >> shift;
      }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(from = old_level, to = level, len, "grew field arrays");
  }
}

#[cfg(test)]
#[path = "topology_test.rs"]
mod topology_test;

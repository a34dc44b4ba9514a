//! Sparse multi-resolution field storage on H-coordinates.
//!
//! Two parallel arrays indexed directly by key:
//!
//! ```text
//! tree[k] == k   k exists and is a leaf (top-level coordinate)
//! tree[k] >  k   k exists and is refined; tree[k] is its first child
//! tree[k] <  k   k does not exist; tree[k] is an ancestor hint whose
//!                children do not exist either (used to skip whole subtrees)
//! k >= len       k does not exist
//! ```
//!
//! Only complete "H"s exist: a refined key always has all `2^D` children.
//! Every ancestor of an existing key exists, and the root always exists.
//!
//! # Module Structure
//!
//! - [`topology`]: refine, coarsen, bulk level creation
//! - [`interpolate`]: `get`, coefficient expansion, `propagate`
//! - [`iter`]: key-ordered traversal in three modes, paired traversal
//! - [`boundary`]: per-direction boundary callbacks
//! - [`ops`]: arithmetic, conversion and merge hooks

pub mod boundary;
pub mod interpolate;
pub mod iter;
pub mod ops;
pub mod topology;

use std::fmt;
use std::ops::{AddAssign, Mul};

pub use boundary::{BoundaryFn, BoundaryRegistry};
pub use interpolate::CoeffMap;
pub use iter::{Iter, IterMut, Keys, TraversalMode, ZipMut};
pub use topology::RefineSeed;

use crate::config::{FieldConfig, MissingKeyPolicy};
use crate::constants::{Key, Level, INVALID, ROOT};
use crate::error::{FieldError, Result};
use crate::hcs::{Direction, Hcs};

/// Values a field can hold: anything that can be summed with weights.
///
/// Covers `f64` scalars and glam vectors (`DVec2`, `DVec3`) out of the box.
pub trait FieldValue: Clone + Default + AddAssign + Mul<f64, Output = Self> {}

impl<T> FieldValue for T where T: Clone + Default + AddAssign + Mul<f64, Output = T> {}

/// Sparse field over a `D`-dimensional H-coordinate domain.
pub struct Field<T, const D: usize> {
  hcs: Hcs<D>,
  tree: Vec<Key>,
  data: Vec<T>,
  boundary: BoundaryRegistry<T, D>,
  policy: MissingKeyPolicy,
  /// Returned by `at` for missing keys under `Interpolate`/`Default`.
  scratch: T,
  n_elements: usize,
  n_top: usize,
}

impl<T: FieldValue, const D: usize> Field<T, D> {
  /// Root-only field over the unit box.
  pub fn new() -> Self {
    Self::with_config(FieldConfig::default())
  }

  /// Root-only field with the given configuration.
  pub fn with_config(config: FieldConfig<D>) -> Self {
    let mut field = Self::with_hcs(Hcs::from_config(&config));
    field.policy = config.policy;
    field
  }

  /// Root-only field on an existing coordinate system.
  pub fn with_hcs(hcs: Hcs<D>) -> Self {
    Self {
      hcs,
      tree: vec![INVALID, ROOT],
      data: vec![T::default(); 2],
      boundary: BoundaryRegistry::new(),
      policy: MissingKeyPolicy::default(),
      scratch: T::default(),
      n_elements: 1,
      n_top: 1,
    }
  }

  // ---------------------------------------------------------------------
  // Configuration
  // ---------------------------------------------------------------------

  /// Coordinate system of this field.
  #[inline]
  pub fn hcs(&self) -> &Hcs<D> {
    &self.hcs
  }

  /// Current missing-key policy.
  #[inline]
  pub fn policy(&self) -> MissingKeyPolicy {
    self.policy
  }

  /// Replace the missing-key policy.
  pub fn set_policy(&mut self, policy: MissingKeyPolicy) {
    self.policy = policy;
  }

  /// Boundary callbacks.
  #[inline]
  pub fn boundary(&self) -> &BoundaryRegistry<T, D> {
    &self.boundary
  }

  /// Boundary callbacks, mutable.
  #[inline]
  pub fn boundary_mut(&mut self) -> &mut BoundaryRegistry<T, D> {
    &mut self.boundary
  }

  /// Register a boundary callback that survives copies of this field.
  pub fn set_boundary<F>(&mut self, direction: Direction, callback: F)
  where
    F: Fn(&Field<T, D>, Key) -> T + Send + Sync + 'static,
  {
    self.boundary.set(direction, callback);
  }

  /// Scratch cell handed out by `at` for missing keys.
  #[inline]
  pub fn scratch(&self) -> &T {
    &self.scratch
  }

  /// Scratch cell, mutable. Set it to a sentinel for `MissingKeyPolicy::Default`.
  #[inline]
  pub fn scratch_mut(&mut self) -> &mut T {
    &mut self.scratch
  }

  // ---------------------------------------------------------------------
  // Existence
  // ---------------------------------------------------------------------

  /// Array slot of `key` if it lies inside the allocated range.
  #[inline]
  fn slot(&self, key: Key) -> Option<usize> {
    usize::try_from(key).ok().filter(|&index| index < self.tree.len())
  }

  /// O(1) existence check. Boundary keys and key 0 never exist.
  #[inline]
  pub fn exists(&self, key: Key) -> bool {
    if key == INVALID || Hcs::<D>::is_boundary(key) {
      return false;
    }
    match self.slot(key) {
      Some(index) => self.tree[index] >= key,
      None => false,
    }
  }

  /// True if `key` exists and has not been refined.
  pub fn is_top(&self, key: Key) -> Result<bool> {
    if !self.exists(key) {
      return Err(FieldError::NotFound { key });
    }
    Ok(self.tree[key as usize] == key)
  }

  /// Deepest existing key on the path from the root to `key` (the key
  /// itself if it exists). `None` for key 0 and boundary keys.
  pub fn existing_ancestor(&self, key: Key) -> Option<Key> {
    if !Hcs::<D>::is_valid(key) {
      return None;
    }
    let mut current = key;
    while !self.exists(current) {
      current = Hcs::<D>::reduce_level(current);
    }
    Some(current)
  }

  /// Number of existing keys, leaves and refined keys alike.
  #[inline]
  pub fn n_elements(&self) -> usize {
    self.n_elements
  }

  /// Number of leaves.
  #[inline]
  pub fn n_elements_top(&self) -> usize {
    self.n_top
  }

  /// True if only the root exists.
  #[inline]
  pub fn is_root_only(&self) -> bool {
    self.n_elements == 1
  }

  /// Deepest level the arrays currently cover.
  #[inline]
  pub fn allocated_level(&self) -> Level {
    Hcs::<D>::level(self.tree.len() as Key - 1)
  }

  /// Number of allocated slots (valid or not) in each array.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.tree.len()
  }

  /// Children of `key`, in digit order.
  pub fn children(key: Key) -> impl Iterator<Item = Key> {
    (0..Hcs::<D>::PARTS).map(move |digit| Hcs::<D>::increase_level(key, digit as u8))
  }

  // ---------------------------------------------------------------------
  // Access
  // ---------------------------------------------------------------------

  /// Stored value of an existing key (interior keys included).
  pub fn get_direct(&self, key: Key) -> Result<&T> {
    if !self.exists(key) {
      return Err(FieldError::NotFound { key });
    }
    Ok(&self.data[key as usize])
  }

  /// Stored value of an existing key, mutable.
  pub fn get_direct_mut(&mut self, key: Key) -> Result<&mut T> {
    if !self.exists(key) {
      return Err(FieldError::NotFound { key });
    }
    Ok(&mut self.data[key as usize])
  }

  /// Read-write access governed by the missing-key policy.
  ///
  /// Existing keys are O(1). For missing keys see [`MissingKeyPolicy`];
  /// under `Interpolate` and `Default` the returned reference is the scratch
  /// cell and writes to it are not stored in the field.
  pub fn at(&mut self, key: Key) -> Result<&mut T> {
    if self.exists(key) {
      return Ok(&mut self.data[key as usize]);
    }
    match self.policy {
      MissingKeyPolicy::Throw => Err(FieldError::NotFound { key }),
      MissingKeyPolicy::Refine => {
        self.refine_to(key, RefineSeed::default())?;
        Ok(&mut self.data[key as usize])
      }
      MissingKeyPolicy::Interpolate => {
        self.scratch = self.get(key)?;
        Ok(&mut self.scratch)
      }
      MissingKeyPolicy::Default => Ok(&mut self.scratch),
    }
  }

  // ---------------------------------------------------------------------
  // Structure
  // ---------------------------------------------------------------------

  /// True if both fields have the same set of existing keys and leaves.
  ///
  /// Hints stored for missing keys are ignored, so fields that reached the
  /// same topology through different refine/coarsen histories compare equal.
  pub fn same_structure<U>(&self, other: &Field<U, D>) -> bool {
    let len = self.tree.len().max(other.tree.len());
    (0..len).all(|index| {
      let key = index as Key;
      let left = self.tree.get(index).copied().filter(|&t| t >= key && key != INVALID);
      let right = other.tree.get(index).copied().filter(|&t| t >= key && key != INVALID);
      left == right
    })
  }

  /// Adopt the topology of `other`. Values reset to `T::default()`.
  pub fn take_structure<U>(&mut self, other: &Field<U, D>) {
    self.tree.clone_from(&other.tree);
    self.data.clear();
    self.data.resize(self.tree.len(), T::default());
    self.n_elements = other.n_elements;
    self.n_top = other.n_top;
  }

  /// Copy all values from a field with identical topology.
  pub fn assign(&mut self, other: &Field<T, D>) -> Result<()> {
    if !self.same_structure(other) {
      return Err(FieldError::StructuralMismatch {
        left: self.n_elements,
        right: other.n_elements,
      });
    }
    let Field { tree, data, .. } = self;
    for key in Keys::<D>::new(tree, TraversalMode::All) {
      data[key as usize] = other.data[key as usize].clone();
    }
    Ok(())
  }

  /// Drop everything but the root; the root value resets too.
  pub fn clear(&mut self) {
    self.tree = vec![INVALID, ROOT];
    self.data = vec![T::default(); 2];
    self.n_elements = 1;
    self.n_top = 1;
  }
}

impl<T: FieldValue, const D: usize> Default for Field<T, D> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Clone, const D: usize> Clone for Field<T, D> {
  /// Deep copy of both arrays. Boundary callbacks are kept only for
  /// directions whose propagate flag is set.
  fn clone(&self) -> Self {
    Self {
      hcs: self.hcs.clone(),
      tree: self.tree.clone(),
      data: self.data.clone(),
      boundary: self.boundary.for_copy(),
      policy: self.policy,
      scratch: self.scratch.clone(),
      n_elements: self.n_elements,
      n_top: self.n_top,
    }
  }
}

impl<T, const D: usize> fmt::Debug for Field<T, D> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Field")
      .field("dimensions", &D)
      .field("n_elements", &self.n_elements)
      .field("n_top", &self.n_top)
      .field("capacity", &self.tree.len())
      .field("policy", &self.policy)
      .field("boundary", &self.boundary)
      .finish()
  }
}

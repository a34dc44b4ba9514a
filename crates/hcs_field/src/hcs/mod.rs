//! The H-coordinate system: recursive Morton keys with an embedded level.
//!
//! A key is a path from the root through a sequence of `D`-bit digits, one
//! per level, topped by a level-marker bit. Because the deepest digit sits in
//! the lowest bits and every level occupies a contiguous key range, keys are
//! usable as direct array indices:
//!
//! ```text
//! level 0:  1                       (ROOT)
//! level 1:  2^D      .. 2^(D+1)-1
//! level 2:  2^(2D)   .. 2^(2D+1)-1
//! level L:  2^(L*D)  .. 2^(L*D+1)-1
//! ```
//!
//! Neighbor search runs on the packed key with a carry-confined increment
//! (the Moser-de Bruijn successor trick), so no decode is needed. Stepping
//! outside the domain is not an error: the origin key comes back with the
//! boundary flag and the escape direction burned into its top bits.
//!
//! # Module Structure
//!
//! - [`direction`]: `Direction` - signed axis value type
//! - [`morton`]: PDEP/PEXT primitives, BMI2 fast path + portable loops
//! - [`position`]: Cartesian conversions and human readable rendering

pub mod direction;
pub mod morton;
pub mod position;

pub use direction::Direction;
pub use morton::Interleave;

use crate::config::FieldConfig;
use crate::constants::{self, Key, Level, BOUNDARY_FLAG, KEY_BITS, ROOT};

/// Per-axis unscaled (integer) cell coordinates at a key's level.
pub type Unscaled<const D: usize> = [u64; D];

/// Coordinate system for `D` dimensions.
///
/// Holds only the domain placement (center, half-extent per axis) and masks
/// derived at construction. It does not store field data.
#[derive(Clone, Debug, PartialEq)]
pub struct Hcs<const D: usize> {
  center: [f64; D],
  scales: [f64; D],
  /// Per axis: every digit bit that does NOT belong to the axis.
  fill_masks: [Key; D],
  /// Per axis: every digit bit that belongs to the axis.
  axis_masks: [Key; D],
  max_level: Level,
  interleave: Interleave,
}

impl<const D: usize> Hcs<D> {
  const DIMENSIONS_SUPPORTED: () = assert!(
    D >= 1 && D <= 8,
    "H-coordinate system supports 1 to 8 dimensions"
  );

  /// Digit mask for a single level.
  pub const PART_MASK: Key = (1 << D) - 1;

  /// Children per cell (`2^D`).
  pub const PARTS: usize = constants::parts(D);

  /// Create a coordinate system over the box `center ± scales`.
  pub fn new(center: [f64; D], scales: [f64; D]) -> Self {
    #[allow(clippy::let_unit_value)]
    let () = Self::DIMENSIONS_SUPPORTED;

    let max_level = constants::max_level(D);
    let mut fill_masks = [0; D];
    let mut axis_masks = [0; D];
    for axis in 0..D {
      let single = 1 << axis;
      for level in 0..max_level {
        let shift = D as u32 * level;
        axis_masks[axis] |= single << shift;
        fill_masks[axis] |= (Self::PART_MASK & !single) << shift;
      }
    }

    Self {
      center,
      scales,
      fill_masks,
      axis_masks,
      max_level,
      interleave: Interleave::Detect.resolve(),
    }
  }

  /// Create from a field configuration.
  pub fn from_config(config: &FieldConfig<D>) -> Self {
    Self::new(config.center, config.scales).with_interleave(config.interleave)
  }

  /// Select the interleave path. Unavailable paths fall back to portable.
  pub fn with_interleave(mut self, interleave: Interleave) -> Self {
    self.interleave = interleave.resolve();
    self
  }

  /// Interleave path in use.
  #[inline]
  pub fn interleave(&self) -> Interleave {
    self.interleave
  }

  /// Domain center per axis.
  #[inline]
  pub fn center(&self) -> &[f64; D] {
    &self.center
  }

  /// Domain half-extent per axis.
  #[inline]
  pub fn scales(&self) -> &[f64; D] {
    &self.scales
  }

  /// Move the domain. Keys are unaffected, only their positions change.
  pub fn set_domain(&mut self, center: [f64; D], scales: [f64; D]) {
    self.center = center;
    self.scales = scales;
  }

  /// Deepest encodable level.
  #[inline]
  pub fn max_level(&self) -> Level {
    self.max_level
  }

  /// Number of dimensions.
  #[inline]
  pub const fn dimensions() -> usize {
    D
  }

  // ---------------------------------------------------------------------
  // Boundary keys
  // ---------------------------------------------------------------------

  /// True if the key escaped the domain.
  #[inline]
  pub const fn is_boundary(key: Key) -> bool {
    key & BOUNDARY_FLAG != 0
  }

  /// Escape direction of a boundary key.
  #[inline]
  pub const fn boundary_direction(key: Key) -> Direction {
    Direction::from_index(((key << 1) >> (KEY_BITS - D as u32)) as usize)
  }

  /// The in-domain key that produced a boundary key.
  #[inline]
  pub const fn remove_boundary(key: Key) -> Key {
    (key << (D as u32 + 1)) >> (D as u32 + 1)
  }

  /// Burn the boundary flag and `direction` into `origin`.
  #[inline]
  pub const fn escape(origin: Key, direction: Direction) -> Key {
    origin | BOUNDARY_FLAG | ((direction.index() as Key) << (KEY_BITS - 1 - D as u32))
  }

  // ---------------------------------------------------------------------
  // Levels
  // ---------------------------------------------------------------------

  /// Bit index of the level marker. Zero for key 0.
  #[inline]
  pub const fn level_bit_position(key: Key) -> u32 {
    if key == 0 {
      0
    } else {
      KEY_BITS - 1 - key.leading_zeros()
    }
  }

  /// Level of a key. The boundary flag must be removed first.
  #[inline]
  pub const fn level(key: Key) -> Level {
    Self::level_bit_position(key) / D as u32
  }

  /// Parent key (drop the deepest digit). No-op on boundary keys and the root.
  #[inline]
  pub const fn reduce_level(key: Key) -> Key {
    if Self::is_boundary(key) || key <= ROOT {
      key
    } else {
      key >> D
    }
  }

  /// Child key: append `digit` (0..2^D) as the new deepest level.
  /// No-op on boundary keys.
  #[inline]
  pub const fn increase_level(key: Key, digit: u8) -> Key {
    if Self::is_boundary(key) {
      key
    } else {
      (key << D) | (digit as Key & Self::PART_MASK)
    }
  }

  /// Ancestor of `key` at `level` (which must not exceed the key's level).
  #[inline]
  pub const fn ancestor_at(key: Key, level: Level) -> Key {
    key >> (D as u32 * (Self::level(key) - level))
  }

  /// Read one digit without decoding. `level_from_top = 0` is the deepest.
  #[inline]
  pub const fn extract(key: Key, level_from_top: Level) -> u8 {
    ((key >> (D as u32 * level_from_top)) & Self::PART_MASK) as u8
  }

  /// Smallest key of a level.
  ///
  /// `level` must not exceed the encodable range (`constants::max_level(D)`).
  #[inline]
  pub const fn create_min_level(level: Level) -> Key {
    debug_assert!(level <= constants::max_level(D), "level beyond encodable range");
    1 << (level * D as u32)
  }

  /// Largest key of a level. Same range restriction as `create_min_level`.
  #[inline]
  pub const fn create_max_level(level: Level) -> Key {
    debug_assert!(level <= constants::max_level(D), "level beyond encodable range");
    (1 << (level * D as u32 + 1)) - 1
  }

  /// True for keys that decode to a level (not 0, no boundary flag, marker
  /// on a level boundary).
  #[inline]
  pub const fn is_valid(key: Key) -> bool {
    key != 0 && !Self::is_boundary(key) && Self::level_bit_position(key) % D as u32 == 0
  }

  /// Build a key from its digit path, shallowest first.
  ///
  /// `create_from_list(&[])` is the root.
  pub fn create_from_list(digits: &[u8]) -> Key {
    digits
      .iter()
      .fold(ROOT, |key, &digit| Self::increase_level(key, digit))
  }

  // ---------------------------------------------------------------------
  // Neighbors
  // ---------------------------------------------------------------------

  /// Same-level neighbor along `direction`.
  ///
  /// Masked increment/decrement on the axis bits; the level marker moving
  /// means the step left the domain, in which case the escaped boundary key
  /// is returned instead.
  pub fn get_neighbor(&self, key: Key, direction: Direction) -> Key {
    if Self::is_boundary(key) {
      return key;
    }
    let fill = self.fill_masks[direction.axis()];
    let result = if direction.is_negative() {
      let axis = !fill;
      ((key & axis).wrapping_sub(1) & axis) | (key & fill)
    } else {
      ((key | fill).wrapping_add(1) & !fill) | (key & fill)
    };

    if key.leading_zeros() == result.leading_zeros() {
      result
    } else {
      Self::escape(key, direction)
    }
  }

  /// Same contract as [`get_neighbor`](Self::get_neighbor), computed by
  /// decoding the single axis, stepping and re-encoding.
  pub fn get_neighbor_unscaled(&self, key: Key, direction: Direction) -> Key {
    if Self::is_boundary(key) {
      return key;
    }
    let axis = direction.axis();
    let unscaled = self.get_single_unscaled(key, axis);
    let cells = 1u64 << Self::level(key);
    let stepped = if direction.is_negative() {
      unscaled.checked_sub(1)
    } else {
      Some(unscaled + 1).filter(|&u| u < cells)
    };
    match stepped {
      Some(value) => self.set_single_unscaled(key, axis, value),
      None => Self::escape(key, direction),
    }
  }

  // ---------------------------------------------------------------------
  // Unscaled (integer) coordinates
  // ---------------------------------------------------------------------

  /// Axis bits for the digits of a `level` key.
  #[inline]
  fn level_axis_mask(&self, axis: usize, level: Level) -> Key {
    morton::low_bits(self.axis_masks[axis], level * D as u32)
  }

  /// Interleave per-axis cell indices into a key at `level`.
  pub fn create_from_unscaled(&self, level: Level, unscaled: Unscaled<D>) -> Key {
    let mut result = 0;
    for (axis, &value) in unscaled.iter().enumerate() {
      result |= self
        .interleave
        .deposit(value, self.level_axis_mask(axis, level));
    }
    result | Self::create_min_level(level)
  }

  /// De-interleave a key into per-axis cell indices at its own level.
  pub fn get_unscaled(&self, key: Key) -> Unscaled<D> {
    let digits = morton::low_bits(key, Self::level_bit_position(key));
    let mut result = [0; D];
    for (axis, value) in result.iter_mut().enumerate() {
      *value = self.interleave.extract(digits, self.axis_masks[axis]);
    }
    result
  }

  /// Cell index of a single axis.
  pub fn get_single_unscaled(&self, key: Key, axis: usize) -> u64 {
    let digits = morton::low_bits(key, Self::level_bit_position(key));
    self.interleave.extract(digits, self.axis_masks[axis])
  }

  /// Replace the cell index of a single axis, keeping level and other axes.
  pub fn set_single_unscaled(&self, key: Key, axis: usize, value: u64) -> Key {
    let mask = self.level_axis_mask(axis, Self::level(key));
    (key & !mask) | self.interleave.deposit(value, mask)
  }
}

impl<const D: usize> Default for Hcs<D> {
  /// Unit box from 0 to 1 on every axis.
  fn default() -> Self {
    Self::new([0.5; D], [0.5; D])
  }
}

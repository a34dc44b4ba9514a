//! Direction - signed axis used for neighbor search and boundary lookup.

/// A signed axis direction.
///
/// Index layout: `2 * axis + sign`, sign 0 = positive, 1 = negative:
/// - 0: +X, 1: -X
/// - 2: +Y, 3: -Y
/// - 4: +Z, 5: -Z
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Direction(u8);

impl Direction {
  /// Direction along `axis`, negative if `negative` is set.
  #[inline]
  pub const fn new(axis: usize, negative: bool) -> Self {
    Self((axis as u8) << 1 | negative as u8)
  }

  /// Positive direction along `axis`.
  #[inline]
  pub const fn positive(axis: usize) -> Self {
    Self::new(axis, false)
  }

  /// Negative direction along `axis`.
  #[inline]
  pub const fn negative(axis: usize) -> Self {
    Self::new(axis, true)
  }

  /// Direction from its raw index.
  #[inline]
  pub const fn from_index(index: usize) -> Self {
    Self(index as u8)
  }

  /// Raw index (`2 * axis + sign`).
  #[inline]
  pub const fn index(self) -> usize {
    self.0 as usize
  }

  /// Axis this direction moves along.
  #[inline]
  pub const fn axis(self) -> usize {
    (self.0 >> 1) as usize
  }

  /// True for the negative half of the axis.
  #[inline]
  pub const fn is_negative(self) -> bool {
    self.0 & 1 == 1
  }

  /// Same axis, flipped sign.
  #[inline]
  pub const fn opposite(self) -> Self {
    Self(self.0 ^ 1)
  }

  /// Unit step along this direction (+1 or -1).
  #[inline]
  pub const fn sign(self) -> f64 {
    if self.is_negative() {
      -1.0
    } else {
      1.0
    }
  }

  /// All `2 * dimensions` directions in index order.
  pub fn all(dimensions: usize) -> impl Iterator<Item = Direction> {
    (0..2 * dimensions).map(Direction::from_index)
  }
}

impl From<Direction> for usize {
  fn from(direction: Direction) -> Self {
    direction.index()
  }
}

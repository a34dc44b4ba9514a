//! Cartesian conversions for H-coordinates.
//!
//! "Unscaled" coordinates are integer cell indices for a single level: a
//! level-8 key in 2D lives on a 256 x 256 grid. Scaled positions map that
//! grid onto the box `center ± scales`, with each key standing for the
//! center of its cell.

use std::fmt::Write;

use glam::{DVec2, DVec3};

use super::{Direction, Hcs, Unscaled};
use crate::constants::{Key, Level, INVALID, ROOT};

impl<const D: usize> Hcs<D> {
  /// Cell-center position of a key.
  ///
  /// Boundary keys resolve to the position of the in-domain key that
  /// escaped.
  pub fn get_position(&self, key: Key) -> [f64; D] {
    let key = Self::remove_boundary(key);
    if key <= ROOT {
      return self.center;
    }
    let unscaled = self.get_unscaled(key);
    let cell = 1.0 / (1u64 << Self::level(key)) as f64;
    let mut result = [0.0; D];
    for axis in 0..D {
      let offset = (unscaled[axis] as f64 * 2.0 + 1.0) * cell;
      result[axis] = self.center[axis] - self.scales[axis] + self.scales[axis] * offset;
    }
    result
  }

  /// Key of the `level` cell containing `position`.
  ///
  /// Positions outside the domain are clamped to the nearest edge cell.
  /// `level` must not exceed `max_level()`.
  pub fn create_from_position(&self, level: Level, position: [f64; D]) -> Key {
    debug_assert!(level <= self.max_level, "level beyond encodable range");
    let cells = (1u64 << level) as f64;
    let mut unscaled: Unscaled<D> = [0; D];
    for axis in 0..D {
      let relative = (position[axis] - self.center[axis]) / (self.scales[axis] * 2.0) + 0.5;
      unscaled[axis] = (relative * cells).floor().clamp(0.0, cells - 1.0) as u64;
    }
    self.create_from_unscaled(level, unscaled)
  }

  /// Unit vector along `direction`.
  pub fn direction_normal(&self, direction: Direction) -> [f64; D] {
    let mut result = [0.0; D];
    result[direction.axis()] = direction.sign();
    result
  }

  /// Distance between a key's cell center and its neighbor's along `axis`.
  pub fn cell_width(&self, key: Key, axis: usize) -> f64 {
    let key = Self::remove_boundary(key);
    2.0 * self.scales[axis] / (1u64 << Self::level(key)) as f64
  }

  /// True if `position` lies inside the domain box (edges included).
  pub fn contains(&self, position: [f64; D]) -> bool {
    (0..D).all(|axis| (position[axis] - self.center[axis]).abs() <= self.scales[axis])
  }

  /// Human readable rendering of a key.
  ///
  /// ```text
  /// (SPECIAL)                      key 0
  /// (CENTER)                       root
  /// (BOUNDARY: 1 ORIGIN: ...)      escaped key
  /// (2) [1, 3] (0.75, 0.625)       level, digits shallowest first, position
  /// ```
  pub fn describe(&self, key: Key) -> String {
    if key == INVALID {
      return "(SPECIAL)".to_string();
    }
    if key == ROOT {
      return "(CENTER)".to_string();
    }
    if Self::is_boundary(key) {
      return format!(
        "(BOUNDARY: {} ORIGIN: {})",
        Self::boundary_direction(key).index(),
        self.describe(Self::remove_boundary(key))
      );
    }

    let level = Self::level(key);
    let mut result = String::new();
    let _ = write!(result, "({}) [", level);
    for i in 1..=level {
      let _ = write!(result, "{}", Self::extract(key, level - i));
      result.push_str(if i < level { ", " } else { "]" });
    }
    result.push_str(" (");
    let position = self.get_position(key);
    for (axis, value) in position.iter().enumerate() {
      let _ = write!(result, "{}", value);
      if axis + 1 < D {
        result.push_str(", ");
      }
    }
    result.push(')');
    result
  }
}

impl Hcs<2> {
  /// Cell-center position as a glam vector.
  pub fn get_position_dvec2(&self, key: Key) -> DVec2 {
    DVec2::from_array(self.get_position(key))
  }

  /// Key of the `level` cell containing `position`.
  pub fn create_from_dvec2(&self, level: Level, position: DVec2) -> Key {
    self.create_from_position(level, position.to_array())
  }
}

impl Hcs<3> {
  /// Cell-center position as a glam vector.
  pub fn get_position_dvec3(&self, key: Key) -> DVec3 {
    DVec3::from_array(self.get_position(key))
  }

  /// Key of the `level` cell containing `position`.
  pub fn create_from_dvec3(&self, level: Level, position: DVec3) -> Key {
    self.create_from_position(level, position.to_array())
  }
}

#[cfg(test)]
#[path = "position_test.rs"]
mod position_test;

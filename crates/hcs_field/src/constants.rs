//! Key layout constants for the H-coordinate system.
//!
//! # Key Layout
//!
//! ```text
//! bit 63         62 .. 63-D        63-D-1 .. L*D      L*D        L*D-1 .. 0
//! ┌──────────┬─────────────────┬─────────────────┬──────────┬──────────────────┐
//! │ boundary │ escape direction│   (zero)        │  level   │ D-bit digits,    │
//! │   flag   │ (boundary only) │                 │  marker  │ shallowest first │
//! └──────────┴─────────────────┴─────────────────┴──────────┴──────────────────┘
//! ```
//!
//! The deepest digit occupies the least significant `D` bits, so siblings are
//! adjacent integers and a key can be used directly as an array index.
//!
//! Digit bit `j` selects the positive (1) or negative (0) half along axis `j`:
//!
//! ```text
//!   2D digits:       3D adds bit 2 for Z:
//!
//!     +Y               4 = (-X,-Y,+Z)    5 = (+X,-Y,+Z)
//!   2 │ 3              6 = (-X,+Y,+Z)    7 = (+X,+Y,+Z)
//!   ──┼── +X
//!   0 │ 1
//! ```

/// Packed hierarchical address.
pub type Key = u64;

/// Refinement depth (number of digits below the root).
pub type Level = u32;

/// Bits in a [`Key`].
pub const KEY_BITS: u32 = Key::BITS;

/// Most significant bit: marks a key that escaped the domain.
pub const BOUNDARY_FLAG: Key = 1 << (KEY_BITS - 1);

/// The center of the domain (level 0). Always exists.
pub const ROOT: Key = 1;

/// Reserved, never a valid address.
pub const INVALID: Key = 0;

/// Interpolation weight of the corner on the key's own side of an axis.
pub const NEAR_WEIGHT: f64 = 0.75;

/// Interpolation weight of the corner on the opposite side of an axis.
pub const FAR_WEIGHT: f64 = 0.25;

/// Weight split along an axis whose far corner lies outside the domain.
pub const QUENCHED_WEIGHT: f64 = 0.5;

/// Highest level encodable for `dimensions`, leaving room for the boundary
/// flag, the escape direction and the level marker.
#[inline]
pub const fn max_level(dimensions: usize) -> Level {
  (KEY_BITS - 2 - dimensions as u32) / dimensions as u32
}

/// Number of children of a cell (`2^D`).
#[inline]
pub const fn parts(dimensions: usize) -> usize {
  1 << dimensions
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;

//! hcs_field - Sparse multi-resolution fields on H-coordinates
//!
//! An H-coordinate is a `D`-dimensional hierarchical address (quadtree in
//! 2D, octree in 3D, ...) packed into a single `u64` with an embedded level
//! marker. Keys double as array indices, which gives the field store O(1)
//! existence checks and value access while still supporting adaptive
//! refinement and coarsening.
//!
//! # Features
//!
//! - **Coordinate codec**: Morton interleaving with a BMI2 fast path,
//!   carry-confined neighbor search, boundary-escape keys
//! - **Sparse field store**: refine, coarsen, bulk level creation, four
//!   policies for missing keys
//! - **Interpolation**: D-dimensional hypercube interpolation and explicit
//!   coefficient stencils with boundary blending
//! - **Traversal**: all keys, leaves only, or a single level, in key order
//!
//! # Example
//!
//! ```ignore
//! use hcs_field::{Direction, Field, Hcs, RefineSeed, TraversalMode};
//!
//! let mut field = Field::<f64, 2>::new();
//! field.create_entire_level(3)?;
//! field.set_boundary(Direction::negative(0), |_, _| 1.0);
//!
//! for (key, value) in field.iter_mut(TraversalMode::Top) {
//!     *value = key as f64;
//! }
//!
//! let corner = field.hcs().create_from_unscaled(5, [0, 0]);
//! let interpolated = field.get(corner)?;
//! field.refine_to(corner, RefineSeed::Interpolate)?;
//! ```

pub mod config;
pub mod constants;
pub mod error;

// Coordinate codec
pub mod hcs;
pub use hcs::{Direction, Hcs, Interleave, Unscaled};

// Sparse field store, interpolation, traversal
pub mod field;
pub use field::{
  BoundaryFn, BoundaryRegistry, CoeffMap, Field, FieldValue, Iter, IterMut, Keys, RefineSeed,
  TraversalMode, ZipMut,
};

// Field statistics (feature-gated collection)
pub mod metrics;

pub use config::{FieldConfig, MissingKeyPolicy};
pub use constants::{Key, Level, INVALID, ROOT};
pub use error::{FieldError, Result};

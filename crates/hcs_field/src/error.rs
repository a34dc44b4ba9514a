//! Error type shared by the codec and the field store.

use thiserror::Error;

use crate::constants::{Key, Level};

/// Errors raised by field operations.
///
/// None of these terminate the process; every variant is recoverable by the
/// caller (check `exists` first, start from a fresh field, reconcile
/// structure with `take_structure`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
  /// Direct access to a key that is not allocated.
  #[error("key {key:#x} does not exist")]
  NotFound { key: Key },

  /// `create_entire_level` on a field that already holds more than the root.
  #[error("field already holds {elements} elements, expected a root-only field")]
  AlreadyInitialized { elements: usize },

  /// Assignment or paired traversal between fields of different topology.
  #[error("topology mismatch: {left} vs {right} elements")]
  StructuralMismatch { left: usize, right: usize },

  /// Coefficient expansion recursed deeper than any encodable level.
  ///
  /// Only reachable through an inconsistent topology array.
  #[error("expansion of key {key:#x} exceeded the maximum level {max_level}")]
  TopologyOverflow { key: Key, max_level: Level },

  /// Refinement would produce a level the key layout cannot encode.
  #[error("level {level} exceeds the maximum encodable level {max_level}")]
  LevelLimit { level: Level, max_level: Level },

  /// Key `0` used as an address.
  #[error("key 0 is not a valid address")]
  InvalidKey,
}

/// Result alias used throughout the crate.
pub type Result<T, E = FieldError> = std::result::Result<T, E>;

//! Bit scatter/gather primitives for Morton interleaving.
//!
//! `deposit` scatters the low bits of a value into the set positions of a
//! mask (PDEP), `extract` gathers them back (PEXT). On x86_64 CPUs with BMI2
//! both map to a single instruction; everywhere else a bit-by-bit loop gives
//! identical results.

use crate::constants::Key;

/// Selects how keys are interleaved and de-interleaved.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Interleave {
  /// Bit-by-bit loops. Always available.
  Portable,
  /// BMI2 `pdep`/`pext`. Only used when the CPU supports it.
  Bmi2,
  /// Pick `Bmi2` when supported, `Portable` otherwise.
  #[default]
  Detect,
}

impl Interleave {
  /// True if this path can run on the current CPU.
  pub fn is_available(self) -> bool {
    match self {
      Interleave::Portable | Interleave::Detect => true,
      Interleave::Bmi2 => bmi2_supported(),
    }
  }

  /// Resolve to a concrete path that runs on the current CPU.
  pub fn resolve(self) -> Self {
    match self {
      Interleave::Portable => Interleave::Portable,
      Interleave::Bmi2 | Interleave::Detect => {
        if bmi2_supported() {
          Interleave::Bmi2
        } else {
          Interleave::Portable
        }
      }
    }
  }

  /// Scatter the low bits of `value` into the set bits of `mask`.
  #[inline]
  pub fn deposit(self, value: Key, mask: Key) -> Key {
    match self {
      #[cfg(target_arch = "x86_64")]
      Interleave::Bmi2 if bmi2_supported() => {
        // SAFETY: guarded by the runtime BMI2 check above.
        unsafe { bmi2::deposit(value, mask) }
      }
      _ => deposit_portable(value, mask),
    }
  }

  /// Gather the bits of `value` selected by `mask` into the low bits.
  #[inline]
  pub fn extract(self, value: Key, mask: Key) -> Key {
    match self {
      #[cfg(target_arch = "x86_64")]
      Interleave::Bmi2 if bmi2_supported() => {
        // SAFETY: guarded by the runtime BMI2 check above.
        unsafe { bmi2::extract(value, mask) }
      }
      _ => extract_portable(value, mask),
    }
  }
}

/// True if the CPU offers BMI2.
#[inline]
pub fn bmi2_supported() -> bool {
  #[cfg(target_arch = "x86_64")]
  {
    std::is_x86_feature_detected!("bmi2")
  }
  #[cfg(not(target_arch = "x86_64"))]
  {
    false
  }
}

/// Portable PDEP: walk the mask from its lowest set bit upward.
#[inline]
pub fn deposit_portable(value: Key, mut mask: Key) -> Key {
  let mut result = 0;
  let mut bit: Key = 1;
  while mask != 0 {
    let lowest = mask & mask.wrapping_neg();
    if value & bit != 0 {
      result |= lowest;
    }
    mask ^= lowest;
    bit <<= 1;
  }
  result
}

/// Portable PEXT: inverse of [`deposit_portable`].
#[inline]
pub fn extract_portable(value: Key, mut mask: Key) -> Key {
  let mut result = 0;
  let mut bit: Key = 1;
  while mask != 0 {
    let lowest = mask & mask.wrapping_neg();
    if value & lowest != 0 {
      result |= bit;
    }
    mask ^= lowest;
    bit <<= 1;
  }
  result
}

/// Keep only the lowest `bits` bits (BZHI).
#[inline]
pub fn low_bits(value: Key, bits: u32) -> Key {
  if bits >= Key::BITS {
    value
  } else {
    value & ((1 << bits) - 1)
  }
}

#[cfg(target_arch = "x86_64")]
mod bmi2 {
  use core::arch::x86_64::{_pdep_u64, _pext_u64};

  use crate::constants::Key;

  #[target_feature(enable = "bmi2")]
  pub unsafe fn deposit(value: Key, mask: Key) -> Key {
    _pdep_u64(value, mask)
  }

  #[target_feature(enable = "bmi2")]
  pub unsafe fn extract(value: Key, mask: Key) -> Key {
    _pext_u64(value, mask)
  }
}

#[cfg(test)]
#[path = "morton_test.rs"]
mod morton_test;

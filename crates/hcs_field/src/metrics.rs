//! Field statistics: level distribution, memory, refinement timings.
//!
//! Feature-gated and runtime-toggled so collection costs nothing when off.
//!
//! # Usage
//!
//! ```ignore
//! use hcs_field::metrics::{FieldMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! let started = std::time::Instant::now();
//! field.refine_to(key, RefineSeed::CopyParent)?;
//! metrics.record_refine_timing(started.elapsed().as_micros() as u64);
//! metrics.update_from_field(&field);
//! ```

use std::collections::VecDeque;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

use crate::constants::{Key, KEY_BITS};
use crate::field::{Field, FieldValue, TraversalMode};
use crate::hcs::Hcs;

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Samples kept in the timing history.
const TIMING_HISTORY: usize = 128;

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
  #[cfg(feature = "metrics")]
  {
    COLLECT_METRICS.load(Ordering::Relaxed)
  }
  #[cfg(not(feature = "metrics"))]
  {
    false
  }
}

/// Snapshot of a field's shape plus recent refinement timings.
#[derive(Debug, Clone)]
pub struct FieldMetrics {
  /// Leaf count per level (index = level).
  pub leaves_per_level: [u64; KEY_BITS as usize],
  /// Refined key count per level.
  pub refined_per_level: [u64; KEY_BITS as usize],

  /// Bytes held by the topology array.
  pub tree_memory_bytes: u64,
  /// Bytes held by the value array.
  pub data_memory_bytes: u64,
  /// Allocated slots that are not existing keys.
  pub unused_slots: u64,

  /// Recent refinement timings in microseconds, oldest first.
  pub refine_timings: VecDeque<u64>,
  /// Last refinement time in microseconds.
  pub last_refine_us: u64,
  /// Refinements recorded this session.
  pub total_refinements: u64,
}

impl Default for FieldMetrics {
  fn default() -> Self {
    Self {
      leaves_per_level: [0; KEY_BITS as usize],
      refined_per_level: [0; KEY_BITS as usize],
      tree_memory_bytes: 0,
      data_memory_bytes: 0,
      unused_slots: 0,
      refine_timings: VecDeque::with_capacity(TIMING_HISTORY),
      last_refine_us: 0,
      total_refinements: 0,
    }
  }
}

impl FieldMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reset the snapshot and timings. `total_refinements` is cumulative and kept.
  pub fn reset(&mut self) {
    self.leaves_per_level.fill(0);
    self.refined_per_level.fill(0);
    self.tree_memory_bytes = 0;
    self.data_memory_bytes = 0;
    self.unused_slots = 0;
    self.refine_timings.clear();
    self.last_refine_us = 0;
  }

  /// Recount the level distribution and memory of `field`.
  pub fn update_from_field<T: FieldValue, const D: usize>(&mut self, field: &Field<T, D>) {
    if !is_enabled() {
      return;
    }
    self.leaves_per_level.fill(0);
    self.refined_per_level.fill(0);
    for key in field.keys(TraversalMode::All) {
      let level = Hcs::<D>::level(key) as usize;
      if field.is_top(key).unwrap_or(false) {
        self.leaves_per_level[level] += 1;
      } else {
        self.refined_per_level[level] += 1;
      }
    }
    let capacity = field.capacity() as u64;
    self.tree_memory_bytes = capacity * std::mem::size_of::<Key>() as u64;
    self.data_memory_bytes = capacity * std::mem::size_of::<T>() as u64;
    self.unused_slots = capacity - field.n_elements() as u64;
  }

  /// Record one refinement taking `timing_us` microseconds.
  pub fn record_refine_timing(&mut self, timing_us: u64) {
    if !is_enabled() {
      return;
    }
    if self.refine_timings.len() >= TIMING_HISTORY {
      self.refine_timings.pop_front();
    }
    self.refine_timings.push_back(timing_us);
    self.last_refine_us = timing_us;
    self.total_refinements += 1;
  }

  pub fn total_leaves(&self) -> u64 {
    self.leaves_per_level.iter().sum()
  }

  pub fn total_refined(&self) -> u64 {
    self.refined_per_level.iter().sum()
  }

  /// Deepest level holding a leaf.
  pub fn deepest_level(&self) -> Option<usize> {
    self.leaves_per_level.iter().rposition(|&count| count > 0)
  }

  /// Average refinement timing in microseconds.
  pub fn avg_refine_timing_us(&self) -> f64 {
    if self.refine_timings.is_empty() {
      0.0
    } else {
      self.refine_timings.iter().sum::<u64>() as f64 / self.refine_timings.len() as f64
    }
  }

  /// Field memory (both arrays) in MiB.
  pub fn memory_mb(&self) -> f64 {
    (self.tree_memory_bytes + self.data_memory_bytes) as f64 / 1_048_576.0
  }
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
  use super::*;

  #[test]
  fn test_level_distribution() {
    let mut field = Field::<f64, 2>::new();
    field.create_entire_level(2).unwrap();
    field.refine_from(Hcs::<2>::create_min_level(2), Default::default()).unwrap();

    let mut metrics = FieldMetrics::new();
    metrics.update_from_field(&field);

    assert_eq!(metrics.refined_per_level[0], 1);
    assert_eq!(metrics.refined_per_level[1], 4);
    assert_eq!(metrics.refined_per_level[2], 1);
    assert_eq!(metrics.leaves_per_level[2], 15);
    assert_eq!(metrics.leaves_per_level[3], 4);
    assert_eq!(metrics.total_leaves(), field.n_elements_top() as u64);
    assert_eq!(
      metrics.total_leaves() + metrics.total_refined(),
      field.n_elements() as u64
    );
    assert_eq!(metrics.deepest_level(), Some(3));
  }

  #[test]
  fn test_memory() {
    let mut field = Field::<f64, 3>::new();
    field.create_entire_level(1).unwrap();

    let mut metrics = FieldMetrics::new();
    metrics.update_from_field(&field);

    // 16 slots: key 0, root, 6 gap keys, 8 children
    assert_eq!(metrics.tree_memory_bytes, 16 * 8);
    assert_eq!(metrics.data_memory_bytes, 16 * 8);
    assert_eq!(metrics.unused_slots, 7);
  }

  #[test]
  fn test_timing_recording() {
    let mut metrics = FieldMetrics::new();
    metrics.record_refine_timing(1000);
    metrics.record_refine_timing(2000);
    metrics.record_refine_timing(3000);

    assert_eq!(metrics.refine_timings.len(), 3);
    assert_eq!(metrics.avg_refine_timing_us(), 2000.0);
    assert_eq!(metrics.last_refine_us, 3000);

    for _ in 0..TIMING_HISTORY {
      metrics.record_refine_timing(10);
    }
    assert_eq!(metrics.refine_timings.len(), TIMING_HISTORY);
    assert_eq!(metrics.total_refinements, 3 + TIMING_HISTORY as u64);

    metrics.reset();
    assert!(metrics.refine_timings.is_empty());
    assert_eq!(metrics.total_refinements, 3 + TIMING_HISTORY as u64);
  }
}

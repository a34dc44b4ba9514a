use proptest::prelude::*;

use super::*;
use crate::constants::ROOT;
use crate::hcs::Direction;

type H2 = Hcs<2>;
type H3 = Hcs<3>;

/// Existing keys found by scanning every allocated slot.
fn scan_existing<T: FieldValue, const D: usize>(field: &Field<T, D>) -> Vec<Key> {
  (0..field.capacity() as Key)
    .filter(|&key| field.exists(key))
    .collect()
}

// =========================================================================
// Batch 1: refine_from
// =========================================================================

#[test]
fn test_refine_root() {
  let mut field = Field::<f64, 2>::new();
  field.refine_from(ROOT, RefineSeed::CopyParent).unwrap();

  assert_eq!(field.n_elements(), 5);
  assert_eq!(field.n_elements_top(), 4);
  assert_eq!(field.is_top(ROOT), Ok(false));
  assert_eq!(field.tree[ROOT as usize], 4);
  for child in 4..8 {
    assert_eq!(field.is_top(child), Ok(true));
  }
  assert_eq!(field.allocated_level(), 1);
}

#[test]
fn test_refine_missing_key_fails() {
  let mut field = Field::<f64, 2>::new();
  assert_eq!(
    field.refine_from(5, RefineSeed::CopyParent),
    Err(FieldError::NotFound { key: 5 })
  );
}

#[test]
fn test_refine_refined_key_is_noop() {
  let mut field = Field::<f64, 3>::new();
  field.refine_from(ROOT, RefineSeed::CopyParent).unwrap();
  field.refine_from(ROOT, RefineSeed::CopyParent).unwrap();
  assert_eq!(field.n_elements(), 9);
  assert_eq!(field.n_elements_top(), 8);
}

#[test]
fn test_refine_copies_parent_value() {
  let mut field = Field::<f64, 3>::new();
  *field.get_direct_mut(ROOT).unwrap() = 4.25;
  field.refine_from(ROOT, RefineSeed::CopyParent).unwrap();
  for child in H3::create_min_level(1)..=H3::create_max_level(1) {
    assert_eq!(field.get_direct(child), Ok(&4.25));
  }
  assert_eq!(field.get_direct(ROOT), Ok(&4.25));
}

#[test]
fn test_refine_interpolate_seed_matches_get() {
  let mut field = Field::<f64, 2>::new();
  field.create_entire_level(2).unwrap();
  for (key, value) in field.iter_mut(TraversalMode::Top) {
    *value = key as f64;
  }
  let parent = field.hcs().create_from_unscaled(2, [1, 2]);
  let expected: Vec<f64> = Field::<f64, 2>::children(parent)
    .map(|child| field.get(child).unwrap())
    .collect();

  field.refine_from(parent, RefineSeed::Interpolate).unwrap();
  let seeded: Vec<f64> = Field::<f64, 2>::children(parent)
    .map(|child| *field.get_direct(child).unwrap())
    .collect();
  assert_eq!(seeded, expected);
}

/// Refine the root and its first child, then coarsen everything again.
fn refine_and_coarse_in<const D: usize>() {
  let parts = Hcs::<D>::PARTS;
  let mut field = Field::<f64, D>::new();
  field.refine_from(ROOT, RefineSeed::CopyParent).unwrap();
  assert_eq!(Field::<f64, D>::children(ROOT).count(), parts, "D={}", D);
  assert!(
    Field::<f64, D>::children(ROOT).all(|child| field.is_top(child) == Ok(true)),
    "D={}",
    D
  );
  assert_eq!(field.n_elements(), 1 + parts);
  assert_eq!(field.n_elements_top(), parts);

  let first = Hcs::<D>::increase_level(ROOT, 0);
  field.refine_from(first, RefineSeed::CopyParent).unwrap();
  assert_eq!(field.keys(TraversalMode::All).count(), field.n_elements(), "D={}", D);
  assert_eq!(field.keys(TraversalMode::Top).count(), field.n_elements_top(), "D={}", D);
  assert_eq!(
    field.keys(TraversalMode::Level(2)).collect::<Vec<_>>(),
    Field::<f64, D>::children(first).collect::<Vec<_>>()
  );

  field.coarse(ROOT).unwrap();
  assert!(field.is_root_only(), "D={}", D);
  assert_eq!(field.keys(TraversalMode::All).collect::<Vec<_>>(), vec![ROOT]);
}

#[test]
fn test_refine_and_coarse_every_dimension() {
  refine_and_coarse_in::<1>();
  refine_and_coarse_in::<2>();
  refine_and_coarse_in::<3>();
  refine_and_coarse_in::<4>();
  refine_and_coarse_in::<5>();
  refine_and_coarse_in::<6>();
  refine_and_coarse_in::<7>();
  refine_and_coarse_in::<8>();
}

#[test]
fn test_refine_touches_only_key_and_children() {
  let mut field = Field::<f64, 2>::new();
  field.refine_to(H2::create_from_list(&[3, 3, 3, 3, 3, 3]), RefineSeed::CopyParent).unwrap();
  let before = field.tree.clone();

  field.refine_from(5, RefineSeed::CopyParent).unwrap();

  let changed: Vec<Key> = (0..field.capacity() as Key)
    .filter(|&slot| field.tree[slot as usize] != before[slot as usize])
    .collect();
  assert_eq!(changed, vec![5, 20, 21, 22, 23]);
  assert_eq!(field.keys(TraversalMode::All).collect::<Vec<_>>(), scan_existing(&field));
  assert_eq!(field.keys(TraversalMode::Top).count(), field.n_elements_top());
}

// =========================================================================
// Batch 2: refine_to
// =========================================================================

#[test]
fn test_refine_to_creates_path() {
  let mut field = Field::<f64, 2>::new();
  let key = H2::create_from_list(&[3, 0, 2, 1]);
  field.refine_to(key, RefineSeed::CopyParent).unwrap();

  assert!(field.exists(key));
  assert_eq!(field.is_top(key), Ok(true));
  for level in 0..4 {
    assert_eq!(field.is_top(H2::ancestor_at(key, level)), Ok(false));
  }
  assert_eq!(field.n_elements(), 1 + 4 * 4);
  assert_eq!(field.n_elements_top(), 1 + 3 * 4);
}

#[test]
fn test_refine_to_existing_is_noop() {
  let mut field = Field::<f64, 2>::new();
  field.create_entire_level(1).unwrap();
  field.refine_to(6, RefineSeed::CopyParent).unwrap();
  assert_eq!(field.n_elements(), 5);
}

#[test]
fn test_refine_to_rejects_unaddressable_keys() {
  let mut field = Field::<f64, 3>::new();
  assert_eq!(
    field.refine_to(INVALID, RefineSeed::CopyParent),
    Err(FieldError::InvalidKey)
  );
  let escaped = H3::escape(9, Direction::positive(1));
  assert_eq!(
    field.refine_to(escaped, RefineSeed::CopyParent),
    Err(FieldError::InvalidKey)
  );
  assert_eq!(
    field.refine_to(1 << 60, RefineSeed::CopyParent),
    Err(FieldError::LevelLimit {
      level: 20,
      max_level: 19
    })
  );
}

// =========================================================================
// Batch 3: coarse
// =========================================================================

#[test]
fn test_coarse_missing_key_fails() {
  let mut field = Field::<f64, 2>::new();
  assert_eq!(field.coarse(4), Err(FieldError::NotFound { key: 4 }));
}

#[test]
fn test_coarse_leaf_is_noop() {
  let mut field = Field::<f64, 2>::new();
  field.create_entire_level(1).unwrap();
  field.coarse(5).unwrap();
  assert_eq!(field.n_elements(), 5);
}

#[test]
fn test_coarse_removes_whole_subtree() {
  let mut field = Field::<f64, 2>::new();
  let deep = H2::create_from_list(&[1, 1, 1]);
  field.refine_to(deep, RefineSeed::CopyParent).unwrap();
  field.refine_from(deep, RefineSeed::CopyParent).unwrap();
  assert_eq!(field.n_elements(), 17);

  field.coarse(5).unwrap();
  assert_eq!(field.n_elements(), 5);
  assert_eq!(field.n_elements_top(), 4);
  assert_eq!(field.is_top(5), Ok(true));
  assert!(!field.exists(deep));
  assert_eq!(scan_existing(&field), vec![1, 4, 5, 6, 7]);
}

#[test]
fn test_refine_then_coarse_restores() {
  let mut field = Field::<f64, 2>::new();
  field.create_entire_level(2).unwrap();
  for (key, value) in field.iter_mut(TraversalMode::All) {
    *value = key as f64 * 0.5;
  }
  let snapshot = field.clone();

  let key = field.hcs().create_from_unscaled(2, [3, 0]);
  field.refine_from(key, RefineSeed::Interpolate).unwrap();
  field.coarse(key).unwrap();

  assert!(field.same_structure(&snapshot));
  assert_eq!(field.n_elements(), snapshot.n_elements());
  assert_eq!(field.n_elements_top(), snapshot.n_elements_top());
  for (key, value) in &snapshot {
    assert_eq!(field.get_direct(key), Ok(value));
  }
}

#[test]
fn test_refine_after_coarse_skips_stale_hints() {
  let mut field = Field::<f64, 2>::new();
  field.refine_to(H2::create_from_list(&[0, 0, 0]), RefineSeed::CopyParent).unwrap();
  field.coarse(4).unwrap();
  field.refine_from(4, RefineSeed::CopyParent).unwrap();

  let expected = vec![1, 4, 5, 6, 7, 16, 17, 18, 19];
  assert_eq!(scan_existing(&field), expected);
  assert_eq!(field.keys(TraversalMode::All).collect::<Vec<_>>(), expected);
}

/// Slots under the coarsened root keep hinting at it after it is refined
/// again, so iteration must walk those hints down to a leaf.
#[test]
fn test_hint_naming_refined_key_is_walked_down() {
  let mut field = Field::<f64, 2>::new();
  field.refine_to(H2::create_from_list(&[0, 0, 0]), RefineSeed::CopyParent).unwrap();
  field.coarse(ROOT).unwrap();
  field.refine_from(ROOT, RefineSeed::CopyParent).unwrap();
  field.refine_from(5, RefineSeed::CopyParent).unwrap();
  assert_eq!(field.tree[64], ROOT);

  let expected = vec![1, 4, 5, 6, 7, 20, 21, 22, 23];
  assert_eq!(scan_existing(&field), expected);
  assert_eq!(field.keys(TraversalMode::All).collect::<Vec<_>>(), expected);
  assert_eq!(
    field.keys(TraversalMode::Top).collect::<Vec<_>>(),
    vec![4, 6, 7, 20, 21, 22, 23]
  );
  assert!(field.keys(TraversalMode::Level(3)).next().is_none());
}

// =========================================================================
// Batch 4: create_entire_level
// =========================================================================

#[test]
fn test_create_entire_level_counts() {
  let mut flat = Field::<f64, 2>::new();
  flat.create_entire_level(3).unwrap();
  assert_eq!(flat.n_elements_top(), 64);
  assert_eq!(flat.n_elements(), 1 + 4 + 16 + 64);
  assert!(flat
    .keys(TraversalMode::Top)
    .all(|key| H2::level(key) == 3));

  let mut cube = Field::<f64, 3>::new();
  cube.create_entire_level(2).unwrap();
  assert_eq!(cube.n_elements_top(), 64);
  assert_eq!(cube.n_elements(), 1 + 8 + 64);
}

#[test]
fn test_create_entire_level_zero_keeps_root() {
  let mut field = Field::<f64, 3>::new();
  field.create_entire_level(0).unwrap();
  assert!(field.is_root_only());
  assert_eq!(field.is_top(ROOT), Ok(true));
}

#[test]
fn test_create_entire_level_requires_root_only() {
  let mut field = Field::<f64, 2>::new();
  field.create_entire_level(1).unwrap();
  assert_eq!(
    field.create_entire_level(2),
    Err(FieldError::AlreadyInitialized { elements: 5 })
  );
}

#[test]
fn test_create_entire_level_beyond_max() {
  let mut field = Field::<f64, 3>::new();
  assert_eq!(
    field.create_entire_level(20),
    Err(FieldError::LevelLimit {
      level: 20,
      max_level: 19
    })
  );
}

#[test]
fn test_last_allocated_key() {
  let mut field = Field::<f64, 2>::new();
  field.create_entire_level(2).unwrap();
  let last = H2::create_max_level(2);
  assert!(field.exists(last));
  assert!(!field.exists(last + 1));
  assert_eq!(field.capacity(), last as usize + 1);
}

#[test]
fn test_get_highest_level() {
  let mut field = Field::<f64, 3>::new();
  assert_eq!(field.get_highest_level(), 0);
  field.create_entire_level(1).unwrap();
  field.refine_to(H3::create_from_list(&[7, 7, 7]), RefineSeed::CopyParent).unwrap();
  assert_eq!(field.get_highest_level(), 3);
  field.coarse(H3::create_from_list(&[7])).unwrap();
  assert_eq!(field.get_highest_level(), 1);
}

// =========================================================================
// Batch 5: Properties
// =========================================================================

#[derive(Clone, Debug)]
enum Op {
  Refine(usize),
  Coarse(usize),
}

fn op() -> impl Strategy<Value = Op> {
  prop_oneof![
    3 => any::<usize>().prop_map(Op::Refine),
    1 => any::<usize>().prop_map(Op::Coarse),
  ]
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(64))]

  /// Counters, existence and the topology invariants agree after any
  /// refine/coarsen sequence.
  #[test]
  fn prop_topology_stays_consistent(ops in prop::collection::vec(op(), 1..40)) {
    let mut field = Field::<f64, 2>::new();
    for op in ops {
      match op {
        Op::Refine(pick) => {
          let leaves: Vec<Key> = field
            .keys(TraversalMode::Top)
            .filter(|&key| H2::level(key) < 4)
            .collect();
          if !leaves.is_empty() {
            field.refine_from(leaves[pick % leaves.len()], RefineSeed::CopyParent).unwrap();
          }
        }
        Op::Coarse(pick) => {
          let existing = scan_existing(&field);
          field.coarse(existing[pick % existing.len()]).unwrap();
        }
      }

      let existing = scan_existing(&field);
      prop_assert_eq!(existing.len(), field.n_elements());
      let leaves = existing.iter().filter(|&&key| field.is_top(key) == Ok(true)).count();
      prop_assert_eq!(leaves, field.n_elements_top());
      prop_assert_eq!(field.keys(TraversalMode::All).collect::<Vec<_>>(), existing.clone());

      for &key in &existing {
        if key != ROOT {
          prop_assert!(field.exists(H2::reduce_level(key)), "parent of {} missing", key);
        }
        if field.is_top(key) == Ok(false) {
          let first = field.tree[key as usize];
          prop_assert_eq!(first, H2::increase_level(key, 0));
          for child in Field::<f64, 2>::children(key) {
            prop_assert!(field.exists(child));
          }
        }
      }
    }
  }
}

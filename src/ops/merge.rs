//! Linear co-scan merges over ascending, duplicate-free sequences.
//!
//! Every function expects both inputs sorted ascending without duplicates
//! and returns a sequence with the same property, in O(n + m). Outputs can
//! be fed back in as inputs, so N-way merges fold left to right.

use std::cmp::Ordering;

/// Elements present in both `a` and `b`
pub fn intersect<T: Ord + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i].clone());
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Elements present in `a` or `b`, each emitted once
pub fn union<T: Ord + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    if a.is_empty() {
        return b.to_vec();
    }
    if b.is_empty() {
        return a.to_vec();
    }
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                out.push(a[i].clone());
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j].clone());
                j += 1;
            }
            Ordering::Equal => {
                out.push(a[i].clone());
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Elements of `a` that are not in `b`
pub fn difference<T: Ord + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(a.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() {
        if j == b.len() {
            out.extend_from_slice(&a[i..]);
            break;
        }
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                out.push(a[i].clone());
                i += 1;
            }
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_intersect_keeps_common() {
        assert_eq!(intersect(&[1, 3, 5, 7], &[2, 3, 4, 7, 9]), vec![3, 7]);
    }

    #[test]
    fn test_union_collapses_duplicates() {
        assert_eq!(union(&[1, 3, 5], &[2, 3, 6]), vec![1, 2, 3, 5, 6]);
    }

    #[test]
    fn test_difference() {
        assert_eq!(difference(&[1, 2, 3, 4, 5], &[2, 4, 6]), vec![1, 3, 5]);
        assert_eq!(difference(&[1, 2], &[]), vec![1, 2]);
        assert_eq!(difference::<i32>(&[], &[1]), Vec::<i32>::new());
    }

    #[test]
    fn test_empty_inputs() {
        let s = [1, 2, 3];
        assert_eq!(union(&s, &[]), s.to_vec());
        assert_eq!(union(&[], &s), s.to_vec());
        assert!(intersect(&s, &[]).is_empty());
        assert!(intersect(&[], &s).is_empty());
    }

    fn sorted_set() -> impl Strategy<Value = Vec<u16>> {
        prop::collection::btree_set(0u16..200, 0..40).prop_map(|s| s.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_merges_match_set_semantics(a in sorted_set(), b in sorted_set()) {
            let sa: BTreeSet<_> = a.iter().copied().collect();
            let sb: BTreeSet<_> = b.iter().copied().collect();
            prop_assert_eq!(intersect(&a, &b), sa.intersection(&sb).copied().collect::<Vec<_>>());
            prop_assert_eq!(union(&a, &b), sa.union(&sb).copied().collect::<Vec<_>>());
            prop_assert_eq!(difference(&a, &b), sa.difference(&sb).copied().collect::<Vec<_>>());
        }

        #[test]
        fn prop_merges_commute(a in sorted_set(), b in sorted_set()) {
            prop_assert_eq!(intersect(&a, &b), intersect(&b, &a));
            prop_assert_eq!(union(&a, &b), union(&b, &a));
        }

        #[test]
        fn prop_merges_associate(a in sorted_set(), b in sorted_set(), c in sorted_set()) {
            prop_assert_eq!(intersect(&intersect(&a, &b), &c), intersect(&a, &intersect(&b, &c)));
            prop_assert_eq!(union(&union(&a, &b), &c), union(&a, &union(&b, &c)));
        }
    }
}

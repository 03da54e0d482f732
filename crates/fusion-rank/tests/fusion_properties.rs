//! Property-based tests for union and reciprocal rank fusion.

use std::collections::HashSet;

use fusion_rank::{reciprocal_rank_fusion, unique_union, RankedList, RetrievedItem};
use proptest::prelude::*;

/// Items drawn from a small vocabulary so lists overlap often.
fn item_strategy() -> impl Strategy<Value = RetrievedItem> {
    (0u8..12, prop::option::of(0u8..3)).prop_map(|(doc, source)| {
        let item = RetrievedItem::new(format!("doc-{doc}"));
        match source {
            Some(s) => item.with_metadata("source", format!("src-{s}")),
            None => item,
        }
    })
}

fn lists_strategy() -> impl Strategy<Value = Vec<RankedList>> {
    prop::collection::vec(
        prop::collection::vec(item_strategy(), 0..15).prop_map(RankedList::new),
        0..6,
    )
}

/// A list without repeated documents.
fn distinct_list_strategy() -> impl Strategy<Value = RankedList> {
    prop::collection::vec(0u8..40, 0..20).prop_map(|ids| {
        let mut seen = HashSet::new();
        ids.into_iter()
            .filter(|id| seen.insert(*id))
            .map(|id| RetrievedItem::new(format!("doc-{id}")))
            .collect()
    })
}

fn distinct_keys(lists: &[RankedList]) -> HashSet<String> {
    lists
        .iter()
        .flat_map(RankedList::iter)
        .map(|item| item.key().unwrap().to_hex())
        .collect()
}

/// Property: union size is bounded by the input size and equals the number
/// of distinct identity keys.
#[test]
fn prop_union_size_equals_distinct_keys() {
    proptest!(|(lists in lists_strategy())| {
        let unique = unique_union(&lists).unwrap();
        let total: usize = lists.iter().map(RankedList::len).sum();

        prop_assert!(unique.len() <= total);
        prop_assert_eq!(unique.len(), distinct_keys(&lists).len());
    });
}

/// Property: RRF output is a permutation of the unique documents with
/// non-increasing scores.
#[test]
fn prop_rrf_is_sorted_permutation_of_unique_set() {
    proptest!(|(lists in lists_strategy(), k in 1u32..200)| {
        let fused = reciprocal_rank_fusion(&lists, k as f64).unwrap();

        let fused_keys: Vec<String> = fused
            .items()
            .map(|item| item.key().unwrap().to_hex())
            .collect();
        let fused_set: HashSet<String> = fused_keys.iter().cloned().collect();

        prop_assert_eq!(fused_keys.len(), fused_set.len(), "documents must appear once");
        prop_assert_eq!(fused_set, distinct_keys(&lists));

        for pair in fused.entries().windows(2) {
            prop_assert!(pair[0].fused_score >= pair[1].fused_score);
        }
    });
}

/// Property: fusing one list duplicated N times ranks like fusing it once.
#[test]
fn prop_rrf_duplicated_list_keeps_order() {
    proptest!(|(list in distinct_list_strategy(), copies in 1usize..6, k in 1u32..100)| {
        let once = reciprocal_rank_fusion(std::slice::from_ref(&list), k as f64).unwrap();
        let repeated = reciprocal_rank_fusion(&vec![list.clone(); copies], k as f64).unwrap();

        let once_order: Vec<&str> = once.items().map(|i| i.content.as_str()).collect();
        let repeated_order: Vec<&str> = repeated.items().map(|i| i.content.as_str()).collect();
        prop_assert_eq!(once_order, repeated_order);

        for (a, b) in once.iter().zip(repeated.iter()) {
            let expected = a.fused_score * copies as f64;
            prop_assert!((b.fused_score - expected).abs() < 1e-9);
        }
    });
}

/// Property: identical inputs produce bit-identical results.
#[test]
fn prop_rrf_is_deterministic() {
    proptest!(|(lists in lists_strategy(), k in 1u32..200)| {
        let first = reciprocal_rank_fusion(&lists, k as f64).unwrap();
        let second = reciprocal_rank_fusion(&lists, k as f64).unwrap();

        prop_assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            prop_assert_eq!(&a.item, &b.item);
            prop_assert_eq!(a.fused_score.to_bits(), b.fused_score.to_bits());
        }
    });
}

/// Property: a non-positive k is rejected whatever the input.
#[test]
fn prop_rrf_rejects_non_positive_k() {
    proptest!(|(lists in lists_strategy(), k in -1000.0f64..=0.0)| {
        let err = reciprocal_rank_fusion(&lists, k).unwrap_err();
        prop_assert_eq!(err.error_code(), "INVALID_CONFIG");
    });
}

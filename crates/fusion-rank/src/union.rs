//! Unique-union combiner.

use std::collections::HashSet;

use tracing::debug;

use fusion_core::{DocumentKey, RankedList, Result, RetrievedItem};

/// Flatten ranked lists into one collection of distinct documents.
///
/// The first occurrence of each document is kept. The returned order follows
/// first appearance, but callers that need a ranking should use
/// [`crate::ReciprocalRankFusion`] instead.
pub fn unique_union<'a, I>(lists: I) -> Result<Vec<RetrievedItem>>
where
    I: IntoIterator<Item = &'a RankedList>,
{
    let lists: Vec<&RankedList> = lists.into_iter().collect();
    let total: usize = lists.iter().map(|list| list.len()).sum();
    let mut seen: HashSet<DocumentKey> = HashSet::with_capacity(total);
    let mut unique = Vec::with_capacity(total);

    for item in lists.iter().flat_map(|list| list.iter()) {
        if seen.insert(item.key()?) {
            unique.push(item.clone());
        }
    }

    debug!(
        "Union of {} lists: {} items, {} unique",
        lists.len(),
        total,
        unique.len()
    );

    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(names: &[&str]) -> RankedList {
        names.iter().map(|n| RetrievedItem::new(*n)).collect()
    }

    #[test]
    fn test_union_dedupes_across_lists() {
        let lists = vec![list(&["doc1", "doc2"]), list(&["doc2", "doc3"])];

        let unique = unique_union(&lists).unwrap();

        assert_eq!(unique.len(), 3);
        let contents: HashSet<&str> = unique.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(contents, HashSet::from(["doc1", "doc2", "doc3"]));
    }

    #[test]
    fn test_union_first_occurrence_wins() {
        let lists = vec![
            RankedList::new(vec![RetrievedItem::new("shared").with_score(0.9)]),
            RankedList::new(vec![RetrievedItem::new("shared").with_score(0.1)]),
        ];

        let unique = unique_union(&lists).unwrap();

        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].score, Some(0.9));
    }

    #[test]
    fn test_union_metadata_distinguishes_documents() {
        let lists = vec![RankedList::new(vec![
            RetrievedItem::new("same text").with_metadata("source", "a.md"),
            RetrievedItem::new("same text").with_metadata("source", "b.md"),
        ])];

        assert_eq!(unique_union(&lists).unwrap().len(), 2);
    }

    #[test]
    fn test_union_empty() {
        let none: Vec<RankedList> = Vec::new();
        assert!(unique_union(&none).unwrap().is_empty());
        assert!(unique_union(&[list(&[]), list(&[])]).unwrap().is_empty());
    }

    #[test]
    fn test_union_propagates_identity_errors() {
        let lists = vec![RankedList::new(vec![
            RetrievedItem::new("x").with_metadata("tags", vec!["a", "b"]),
        ])];

        let err = unique_union(&lists).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}

//! Core domain types for retrieval fusion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{FusionError, Result};

/// Metadata attached to a retrieved passage.
///
/// Values are expected to be JSON scalars; see [`crate::identity`].
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// One passage returned by a retrieval call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedItem {
    /// Passage text.
    pub content: String,

    /// Origin identifiers, timestamps and other scalar attributes.
    #[serde(default)]
    pub metadata: Metadata,

    /// Relevance reported by the originating retriever, if any.
    ///
    /// Not part of document identity, and not comparable across lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl RetrievedItem {
    /// Create an item with no metadata and no score.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
            score: None,
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach the retriever's own relevance score.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

/// Items from one retrieval call, index 0 being the most relevant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedList {
    items: Vec<RetrievedItem>,
}

impl RankedList {
    /// Wrap items that are already ordered by relevance.
    pub fn new(items: Vec<RetrievedItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RetrievedItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[RetrievedItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<RetrievedItem> {
        self.items
    }
}

impl From<Vec<RetrievedItem>> for RankedList {
    fn from(items: Vec<RetrievedItem>) -> Self {
        Self::new(items)
    }
}

impl FromIterator<RetrievedItem> for RankedList {
    fn from_iter<I: IntoIterator<Item = RetrievedItem>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RankedList {
    type Item = &'a RetrievedItem;
    type IntoIter = std::slice::Iter<'a, RetrievedItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for RankedList {
    type Item = RetrievedItem;
    type IntoIter = std::vec::IntoIter<RetrievedItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// A document paired with its fused relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    /// The first-seen instance of the document.
    pub item: RetrievedItem,

    /// Aggregate score assigned by fusion (higher is better).
    pub fused_score: f64,
}

/// Consolidated ranking produced by reciprocal rank fusion.
///
/// Entries are ordered by `fused_score` descending and every document
/// appears exactly once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FusionResult {
    entries: Vec<ScoredItem>,
}

impl FusionResult {
    /// Wrap entries that are already sorted and deduplicated.
    pub fn from_sorted(entries: Vec<ScoredItem>) -> Self {
        debug_assert!(entries
            .windows(2)
            .all(|w| w[0].fused_score >= w[1].fused_score));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredItem> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[ScoredItem] {
        &self.entries
    }

    /// Keep only the best `n` entries.
    pub fn truncate(&mut self, n: usize) {
        self.entries.truncate(n);
    }

    /// Documents in fused order, without scores.
    pub fn items(&self) -> impl Iterator<Item = &RetrievedItem> {
        self.entries.iter().map(|e| &e.item)
    }

    pub fn into_entries(self) -> Vec<ScoredItem> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a FusionResult {
    type Item = &'a ScoredItem;
    type IntoIter = std::slice::Iter<'a, ScoredItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Alternative phrasings derived from one original query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVariantSet")]
pub struct QueryVariantSet {
    original: String,
    variants: Vec<String>,
}

#[derive(Deserialize)]
struct RawVariantSet {
    original: String,
    variants: Vec<String>,
}

impl TryFrom<RawVariantSet> for QueryVariantSet {
    type Error = FusionError;

    fn try_from(raw: RawVariantSet) -> Result<Self> {
        Self::new(raw.original, raw.variants)
    }
}

impl QueryVariantSet {
    /// Create a variant set. At least one variant is required.
    pub fn new(original: impl Into<String>, variants: Vec<String>) -> Result<Self> {
        if variants.is_empty() {
            return Err(FusionError::variant_generation(
                "a variant set needs at least one query",
            ));
        }
        Ok(Self {
            original: original.into(),
            variants,
        })
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Never true for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.variants.iter()
    }

    /// Insert the original query at the front unless it is already present.
    pub fn with_original_first(mut self) -> Self {
        if !self.variants.iter().any(|v| v == &self.original) {
            self.variants.insert(0, self.original.clone());
        }
        self
    }
}

/// How ranked lists are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMode {
    /// Deduplicated union; order is not meaningful.
    Union,

    /// Reciprocal rank fusion.
    #[default]
    ReciprocalRank,
}

impl FromStr for FusionMode {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "union" => Ok(Self::Union),
            "reciprocal_rank" | "rrf" => Ok(Self::ReciprocalRank),
            other => Err(FusionError::invalid_config(format!(
                "unknown fusion mode {:?} (expected \"union\" or \"reciprocal_rank\")",
                other
            ))),
        }
    }
}

impl std::fmt::Display for FusionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Union => "union",
            Self::ReciprocalRank => "reciprocal_rank",
        };
        write!(f, "{}", s)
    }
}

/// Output of fusing ranked lists under a [`FusionMode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "results", rename_all = "snake_case")]
pub enum FusionOutput {
    /// Unique documents from a union.
    Union(Vec<RetrievedItem>),

    /// Scored documents from reciprocal rank fusion.
    Ranked(FusionResult),
}

impl FusionOutput {
    pub fn mode(&self) -> FusionMode {
        match self {
            Self::Union(_) => FusionMode::Union,
            Self::Ranked(_) => FusionMode::ReciprocalRank,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Union(items) => items.len(),
            Self::Ranked(result) => result.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Documents without scores.
    pub fn items(&self) -> Vec<&RetrievedItem> {
        match self {
            Self::Union(items) => items.iter().collect(),
            Self::Ranked(result) => result.items().collect(),
        }
    }

    /// Passage texts for a generation step.
    pub fn contents(&self) -> Vec<&str> {
        self.items().into_iter().map(|i| i.content.as_str()).collect()
    }

    /// Passage texts joined by blank lines, ready to drop into a prompt.
    pub fn context(&self) -> String {
        self.contents().join("\n\n")
    }

    /// Keep only the first `n` documents.
    pub fn truncate(&mut self, n: usize) {
        match self {
            Self::Union(items) => items.truncate(n),
            Self::Ranked(result) => result.truncate(n),
        }
    }

    /// The ranked result, if this output came from rank fusion.
    pub fn ranked(&self) -> Option<&FusionResult> {
        match self {
            Self::Ranked(result) => Some(result),
            Self::Union(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_builder() {
        let item = RetrievedItem::new("Task decomposition splits work")
            .with_metadata("source", "blog/agents")
            .with_metadata("page", 3)
            .with_score(0.82);

        assert_eq!(item.metadata.len(), 2);
        assert_eq!(item.metadata["page"], serde_json::json!(3));
        assert_eq!(item.score, Some(0.82));
    }

    #[test]
    fn test_ranked_list_collect() {
        let list: RankedList = ["a", "b", "c"].into_iter().map(RetrievedItem::new).collect();
        assert_eq!(list.len(), 3);
        assert_eq!(list.items()[0].content, "a");
        assert!(!list.is_empty());
    }

    #[test]
    fn test_variant_set_requires_one_variant() {
        let err = QueryVariantSet::new("q", vec![]).unwrap_err();
        assert_eq!(err.error_code(), "VARIANT_GENERATION_ERROR");
    }

    #[test]
    fn test_variant_set_deserialize_requires_one_variant() {
        let set: QueryVariantSet =
            serde_json::from_str(r#"{"original":"q","variants":["a","b"]}"#).unwrap();
        assert_eq!(set.variants(), &["a", "b"]);

        let err = serde_json::from_str::<QueryVariantSet>(r#"{"original":"q","variants":[]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("at least one query"));
    }

    #[test]
    fn test_variant_set_original_first() {
        let set = QueryVariantSet::new("what is rrf", vec!["define rrf".to_string()])
            .unwrap()
            .with_original_first();
        assert_eq!(set.variants(), &["what is rrf", "define rrf"]);

        // Not duplicated when already present
        let set = set.with_original_first();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_fusion_mode_from_str() {
        assert_eq!("union".parse::<FusionMode>().unwrap(), FusionMode::Union);
        assert_eq!(
            "Reciprocal_Rank".parse::<FusionMode>().unwrap(),
            FusionMode::ReciprocalRank
        );
        assert_eq!("rrf".parse::<FusionMode>().unwrap(), FusionMode::ReciprocalRank);

        let err = "borda".parse::<FusionMode>().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_fusion_output_context() {
        let mut output = FusionOutput::Union(vec![
            RetrievedItem::new("first"),
            RetrievedItem::new("second"),
            RetrievedItem::new("third"),
        ]);
        assert_eq!(output.context(), "first\n\nsecond\n\nthird");

        output.truncate(2);
        assert_eq!(output.contents(), vec!["first", "second"]);
        assert_eq!(output.mode(), FusionMode::Union);
        assert!(output.ranked().is_none());
    }

    #[test]
    fn test_fusion_result_serializes_as_list() {
        let result = FusionResult::from_sorted(vec![ScoredItem {
            item: RetrievedItem::new("a"),
            fused_score: 0.5,
        }]);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["fused_score"], serde_json::json!(0.5));
    }
}

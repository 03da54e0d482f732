//! Reciprocal Rank Fusion (RRF) for combining ranked lists.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::debug;

use fusion_core::{
    validate_rrf_k, validate_weights, DocumentKey, FusionError, FusionMode, FusionOutput,
    FusionResult, RankedList, Result, ScoredItem,
};

use crate::union::unique_union;

/// RRF constant (commonly 60).
/// Higher values flatten the influence of rank.
pub const DEFAULT_RRF_K: f64 = 60.0;

/// Reciprocal rank fusion engine.
///
/// RRF score = Σ w_i / (k + rank_i) over every list the document appears in,
/// with zero-based ranks and `w_i = 1` unless weights are given. A document
/// missing from a list gets nothing from it. Ties keep the order in which
/// documents were first seen across the inputs.
#[derive(Debug, Clone, Copy)]
pub struct ReciprocalRankFusion {
    k: f64,
}

impl Default for ReciprocalRankFusion {
    fn default() -> Self {
        Self { k: DEFAULT_RRF_K }
    }
}

impl ReciprocalRankFusion {
    /// Create an engine with smoothing constant `k` (finite, > 0).
    pub fn new(k: f64) -> Result<Self> {
        validate_rrf_k(k)?;
        Ok(Self { k })
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    /// Fuse lists with equal weight.
    pub fn fuse(&self, lists: &[RankedList]) -> Result<FusionResult> {
        self.fuse_iter(lists.iter().map(|list| (list, 1.0)))
    }

    /// Fuse lists, scaling each list's contributions by its weight.
    ///
    /// `weights` must have one finite, non-negative entry per list.
    pub fn fuse_weighted(&self, lists: &[RankedList], weights: &[f64]) -> Result<FusionResult> {
        if lists.len() != weights.len() {
            return Err(FusionError::invalid_config(format!(
                "got {} weights for {} lists",
                weights.len(),
                lists.len()
            )));
        }
        validate_weights(weights)?;
        self.fuse_iter(lists.iter().zip(weights.iter().copied()))
    }

    /// Fuse `(list, weight)` pairs in order.
    ///
    /// Input order matters only for tie-breaking. Weights must be finite and
    /// non-negative.
    pub fn fuse_iter<'a, I>(&self, lists: I) -> Result<FusionResult>
    where
        I: IntoIterator<Item = (&'a RankedList, f64)>,
    {
        // Position of each document in `entries`, which is in first-seen order.
        let mut positions: HashMap<DocumentKey, usize> = HashMap::new();
        let mut entries: Vec<ScoredItem> = Vec::new();
        let mut list_count = 0usize;

        for (list, weight) in lists {
            if !weight.is_finite() || weight < 0.0 {
                return Err(FusionError::invalid_config(format!(
                    "weight for list {} must be finite and >= 0, got {}",
                    list_count, weight
                )));
            }
            list_count += 1;
            for (rank, item) in list.iter().enumerate() {
                let contribution = weight / (rank as f64 + self.k);
                match positions.entry(item.key()?) {
                    Entry::Occupied(slot) => entries[*slot.get()].fused_score += contribution,
                    Entry::Vacant(slot) => {
                        slot.insert(entries.len());
                        entries.push(ScoredItem {
                            item: item.clone(),
                            fused_score: contribution,
                        });
                    }
                }
            }
        }

        // Stable sort: equal scores stay in first-seen order
        entries.sort_by(|a, b| b.fused_score.total_cmp(&a.fused_score));

        debug!(
            "Fused {} lists into {} documents (k = {})",
            list_count,
            entries.len(),
            self.k
        );

        Ok(FusionResult::from_sorted(entries))
    }
}

/// Fuse ranked lists with reciprocal rank fusion.
///
/// # Arguments
/// * `lists` - Ranked lists, each ordered most relevant first
/// * `k` - Smoothing constant, must be > 0
///
/// # Returns
/// Every distinct document once, sorted by fused score descending
pub fn reciprocal_rank_fusion(lists: &[RankedList], k: f64) -> Result<FusionResult> {
    ReciprocalRankFusion::new(k)?.fuse(lists)
}

/// Fuse ranked lists with per-list weights.
pub fn weighted_reciprocal_rank_fusion(
    lists: &[RankedList],
    weights: &[f64],
    k: f64,
) -> Result<FusionResult> {
    ReciprocalRankFusion::new(k)?.fuse_weighted(lists, weights)
}

/// Combine lists with the given mode.
///
/// `k` is validated for both modes so a bad configuration never goes
/// unnoticed.
pub fn fuse(lists: &[RankedList], mode: FusionMode, k: f64) -> Result<FusionOutput> {
    let engine = ReciprocalRankFusion::new(k)?;
    match mode {
        FusionMode::Union => Ok(FusionOutput::Union(unique_union(lists)?)),
        FusionMode::ReciprocalRank => Ok(FusionOutput::Ranked(engine.fuse(lists)?)),
    }
}

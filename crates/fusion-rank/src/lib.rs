//! fusion-rank - Merging ranked retrieval lists
//!
//! This crate merges the ranked lists returned for several query variants
//! into one result. It is synchronous and does no I/O.
//!
//! # Strategies
//!
//! - [`unique_union`]: deduplicated union, first occurrence wins, order is
//!   not meaningful.
//! - [`ReciprocalRankFusion`]: scores each document with the sum of
//!   `1 / (rank + k)` over every list it appears in, optionally weighted per
//!   list, and sorts by that score.
//!
//! # Example
//!
//! ```rust
//! use fusion_rank::{fuse, FusionMode};
//! use fusion_core::{RankedList, RetrievedItem};
//!
//! let lists: Vec<RankedList> = vec![
//!     ["a", "b", "c"].into_iter().map(RetrievedItem::new).collect(),
//!     ["b", "c", "d"].into_iter().map(RetrievedItem::new).collect(),
//! ];
//! let output = fuse(&lists, FusionMode::ReciprocalRank, 60.0).unwrap();
//! assert_eq!(output.contents(), vec!["b", "c", "a", "d"]);
//! ```

mod fusion;
mod union;

pub use fusion::{
    fuse, reciprocal_rank_fusion, weighted_reciprocal_rank_fusion, ReciprocalRankFusion,
    DEFAULT_RRF_K,
};
pub use union::unique_union;

// Re-export types for convenience
pub use fusion_core::{FusionMode, FusionOutput, FusionResult, RankedList, RetrievedItem, ScoredItem};

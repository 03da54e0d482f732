//! fusion-query - Multi-query retrieval orchestration
//!
//! This crate turns one user query into several variants with an external
//! generator, retrieves for each variant concurrently, and fuses the ranked
//! lists into a single result.
//!
//! # Features
//!
//! - Prompt strategies: multi-query, RAG-fusion, decomposition, step-back, HyDE
//! - Tolerant parsing of generator output
//! - Bounded, order-preserving concurrent retrieval with per-call timeouts
//! - Partial failure recovery with a per-call failure report
//! - Unique-union or (weighted) reciprocal rank fusion
//!
//! # Example
//!
//! ```rust,ignore
//! use fusion_query::{FusionConfig, MultiQueryEngine};
//! use std::sync::Arc;
//!
//! let engine = MultiQueryEngine::new(Arc::new(generator), Arc::new(retriever), FusionConfig::default())?;
//! let results = engine.search("What is task decomposition?").await?;
//! let context = results.output.context();
//! ```

mod engine;
pub mod mock;
mod parse;
mod prompts;

pub use engine::{MultiQueryEngine, MultiQueryResults, RetrievalFailure, RetrievalOutcome, VariantList};
pub use parse::parse_variants;
pub use prompts::PromptStrategy;

// Re-export for convenience
pub use fusion_core::{
    FusionConfig, FusionError, FusionMode, FusionOutput, FusionResult, QueryGenerator,
    QueryVariantSet, RankedList, Result, RetrievedItem, Retriever,
};

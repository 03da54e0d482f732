//! Multi-query retrieval engine.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use fusion_core::{
    FusionConfig, FusionError, FusionMode, FusionOutput, QueryGenerator, QueryVariantSet,
    RankedList, Result, Retriever,
};
use fusion_rank::{unique_union, ReciprocalRankFusion};

use crate::parse::parse_variants;
use crate::prompts::PromptStrategy;

/// A ranked list tagged with the variant that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct VariantList {
    /// Position of the variant in the [`QueryVariantSet`].
    pub index: usize,

    /// The variant query.
    pub query: String,

    /// Items returned for it.
    pub list: RankedList,
}

/// A retrieval call that was excluded from fusion.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalFailure {
    /// Position of the variant in the [`QueryVariantSet`].
    pub index: usize,

    /// The variant query.
    pub query: String,

    /// Error code, e.g. `RETRIEVAL_TIMEOUT`.
    pub error_code: &'static str,

    /// Human-readable reason.
    pub message: String,
}

/// Lists gathered for a variant set, in submission order.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalOutcome {
    /// Number of retrieval calls issued.
    pub attempted: usize,

    /// Successful lists, ordered by variant index.
    pub lists: Vec<VariantList>,

    /// Calls that failed or timed out, ordered by variant index.
    pub failures: Vec<RetrievalFailure>,
}

impl RetrievalOutcome {
    pub fn succeeded(&self) -> usize {
        self.lists.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Result of a full multi-query search.
#[derive(Debug, Clone, Serialize)]
pub struct MultiQueryResults {
    /// The original query.
    pub query: String,

    /// Queries that were retrieved.
    pub variants: QueryVariantSet,

    /// Fused documents.
    pub output: FusionOutput,

    /// Retrieval calls issued.
    pub attempted: usize,

    /// Retrieval calls excluded from fusion.
    pub failures: Vec<RetrievalFailure>,

    /// End-to-end latency in milliseconds.
    pub latency_ms: u64,
}

/// Multi-query retrieval engine.
///
/// Generates query variants, retrieves for each one concurrently, and
/// merges the lists by unique union or reciprocal rank fusion.
pub struct MultiQueryEngine<G, R> {
    /// Query variant generator.
    generator: Arc<G>,

    /// Retrieval backend.
    retriever: Arc<R>,

    config: FusionConfig,
}

impl<G, R> MultiQueryEngine<G, R>
where
    G: QueryGenerator,
    R: Retriever,
{
    /// Create a new engine. The configuration is validated up front.
    pub fn new(generator: Arc<G>, retriever: Arc<R>, config: FusionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            generator,
            retriever,
            config,
        })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    fn prompt_template(&self) -> &str {
        self.config
            .variants
            .prompt_template
            .as_deref()
            .unwrap_or_else(|| PromptStrategy::MultiQuery.template())
    }

    /// Ask the generator for `count` variants of `original_query`.
    ///
    /// Fewer variants than requested is accepted; none at all is an error.
    pub async fn generate_variants(
        &self,
        original_query: &str,
        count: usize,
    ) -> Result<QueryVariantSet> {
        if count == 0 {
            return Err(FusionError::invalid_config(
                "variant count must be at least 1",
            ));
        }

        let output = self
            .generator
            .generate(self.prompt_template(), original_query, count)
            .await
            .map_err(|e| match e {
                FusionError::VariantGeneration { .. } => e,
                other => FusionError::variant_generation(format!("generator failed: {}", other)),
            })?;

        let variants = parse_variants(&output, &self.config.variants.delimiter, count)?;
        let set = QueryVariantSet::new(original_query, variants)?;

        let set = if self.config.variants.include_original {
            set.with_original_first()
        } else {
            set
        };

        debug!("Generated {} variants: {:?}", set.len(), set.variants());

        Ok(set)
    }

    /// Retrieve for every variant concurrently.
    ///
    /// Each call gets its own timeout. Failed calls are logged and reported
    /// in the outcome; the remaining lists are kept in variant order. Fails
    /// only when every call fails. Dropping the returned future cancels the
    /// calls still in flight.
    pub async fn retrieve_all(&self, variants: &QueryVariantSet) -> Result<RetrievalOutcome> {
        let retrieval = &self.config.retrieval;
        let timeout = retrieval.timeout();
        let retriever = &self.retriever;

        let calls = variants.iter().enumerate().map(|(index, query)| async move {
            let search = retriever.search(query, retrieval.search_k);
            let result = match tokio::time::timeout(timeout, search).await {
                Ok(result) => result,
                Err(_) => Err(FusionError::Timeout {
                    query: query.clone(),
                    timeout_ms: retrieval.timeout_ms,
                }),
            };
            (index, query, result)
        });

        // `buffered` yields in submission order regardless of completion order;
        // a stalled head call delays new dispatches up to its timeout
        let results: Vec<_> = stream::iter(calls)
            .buffered(retrieval.max_concurrency)
            .collect()
            .await;

        let mut outcome = RetrievalOutcome {
            attempted: results.len(),
            lists: Vec::with_capacity(results.len()),
            failures: Vec::new(),
        };

        for (index, query, result) in results {
            match result {
                Ok(list) => {
                    debug!("Variant {} ({:?}) returned {} items", index, query, list.len());
                    outcome.lists.push(VariantList {
                        index,
                        query: query.clone(),
                        list,
                    });
                }
                Err(err) => {
                    warn!("Retrieval for variant {} ({:?}) failed: {}", index, query, err);
                    outcome.failures.push(RetrievalFailure {
                        index,
                        query: query.clone(),
                        error_code: err.error_code(),
                        message: err.to_string(),
                    });
                }
            }
        }

        if outcome.lists.is_empty() {
            let last_error = outcome
                .failures
                .last()
                .map(|f| f.message.clone())
                .unwrap_or_default();
            return Err(FusionError::RetrievalExhausted {
                attempted: outcome.attempted,
                failed: outcome.failed(),
                last_error,
            });
        }

        Ok(outcome)
    }

    /// Merge tagged lists with the given mode.
    ///
    /// Reciprocal rank fusion applies the configured weight of each list's
    /// variant position.
    pub fn fuse(&self, lists: &[VariantList], mode: FusionMode) -> Result<FusionOutput> {
        let settings = &self.config.fusion;
        match mode {
            FusionMode::Union => Ok(FusionOutput::Union(unique_union(
                lists.iter().map(|v| &v.list),
            )?)),
            FusionMode::ReciprocalRank => {
                let engine = ReciprocalRankFusion::new(settings.rrf_k)?;
                let fused = engine.fuse_iter(
                    lists
                        .iter()
                        .map(|v| (&v.list, settings.weight_for(v.index))),
                )?;
                Ok(FusionOutput::Ranked(fused))
            }
        }
    }

    /// Run the whole pipeline: generate, retrieve, fuse, truncate.
    pub async fn search(&self, query: &str) -> Result<MultiQueryResults> {
        let start = Instant::now();

        info!("Multi-query search for: {:?}", query);

        let variants = self
            .generate_variants(query, self.config.variants.count)
            .await?;

        let outcome = self.retrieve_all(&variants).await?;

        debug!(
            "{} of {} retrieval calls succeeded",
            outcome.succeeded(),
            outcome.attempted
        );

        let mut output = self.fuse(&outcome.lists, self.config.fusion.mode)?;

        if let Some(top_n) = self.config.fusion.top_n {
            output.truncate(top_n);
        }

        let latency_ms = start.elapsed().as_millis() as u64;

        info!(
            "Search completed in {}ms, returned {} results ({} of {} retrieval calls failed)",
            latency_ms,
            output.len(),
            outcome.failed(),
            outcome.attempted
        );

        Ok(MultiQueryResults {
            query: query.to_string(),
            variants,
            output,
            attempted: outcome.attempted,
            failures: outcome.failures,
            latency_ms,
        })
    }
}

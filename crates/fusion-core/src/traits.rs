//! Interfaces to the external collaborators the pipeline calls into.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::RankedList;

/// Vector or keyword search backend.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` items for `query`, most relevant first.
    ///
    /// May return fewer than `k` items when the index is small.
    async fn search(&self, query: &str, k: usize) -> Result<RankedList>;
}

/// Language model that rewrites a query into variants.
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    /// Fill `prompt_template` with the query and requested count, and return
    /// the raw model output. Splitting the output is the caller's job.
    async fn generate(
        &self,
        prompt_template: &str,
        original_query: &str,
        count: usize,
    ) -> Result<String>;
}

#[async_trait]
impl<T: Retriever + ?Sized> Retriever for std::sync::Arc<T> {
    async fn search(&self, query: &str, k: usize) -> Result<RankedList> {
        (**self).search(query, k).await
    }
}

#[async_trait]
impl<T: QueryGenerator + ?Sized> QueryGenerator for std::sync::Arc<T> {
    async fn generate(
        &self,
        prompt_template: &str,
        original_query: &str,
        count: usize,
    ) -> Result<String> {
        (**self).generate(prompt_template, original_query, count).await
    }
}

/// Substitute `{question}` and `{count}` in a prompt template.
pub fn render_prompt(template: &str, question: &str, count: usize) -> String {
    template
        .replace("{count}", &count.to_string())
        .replace("{question}", question)
}

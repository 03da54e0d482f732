//! In-memory collaborators for tests and wiring.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use fusion_core::{render_prompt, FusionError, QueryGenerator, RankedList, Result, Retriever};

/// Generator that returns canned output and records rendered prompts.
pub struct MockGenerator {
    response: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// Always answer with `output`.
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            response: Ok(output.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer with one variant per line.
    pub fn with_lines(lines: &[&str]) -> Self {
        Self::new(lines.join("\n"))
    }

    /// Always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts seen so far, after placeholder substitution.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueryGenerator for MockGenerator {
    async fn generate(
        &self,
        prompt_template: &str,
        original_query: &str,
        count: usize,
    ) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(render_prompt(prompt_template, original_query, count));
        }
        self.response
            .clone()
            .map_err(FusionError::variant_generation)
    }
}

#[derive(Clone)]
enum MockResponse {
    List(RankedList),
    Failure(String),
}

#[derive(Clone)]
struct MockEntry {
    delay: Option<Duration>,
    response: MockResponse,
}

/// Retriever answering from a fixed query → list table.
///
/// Unknown queries return an empty list.
#[derive(Default)]
pub struct MockRetriever {
    entries: HashMap<String, MockEntry>,
    calls: AtomicUsize,
    completed: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Decrements the in-flight count when a search finishes or is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with `list`.
    pub fn with_list(mut self, query: &str, list: RankedList) -> Self {
        self.entries.insert(
            query.to_string(),
            MockEntry {
                delay: None,
                response: MockResponse::List(list),
            },
        );
        self
    }

    /// Answer `query` with `list` after `delay`.
    pub fn with_delayed_list(mut self, query: &str, delay: Duration, list: RankedList) -> Self {
        self.entries.insert(
            query.to_string(),
            MockEntry {
                delay: Some(delay),
                response: MockResponse::List(list),
            },
        );
        self
    }

    /// Fail every search for `query`.
    pub fn with_failure(mut self, query: &str, message: &str) -> Self {
        self.entries.insert(
            query.to_string(),
            MockEntry {
                delay: None,
                response: MockResponse::Failure(message.to_string()),
            },
        );
        self
    }

    /// Number of searches issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of searches that ran to completion.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Searches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of searches ever in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn search(&self, query: &str, k: usize) -> Result<RankedList> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let entry = self.entries.get(query).cloned();

        if let Some(delay) = entry.as_ref().and_then(|e| e.delay) {
            tokio::time::sleep(delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        let Some(entry) = entry else {
            return Ok(RankedList::default());
        };

        match entry.response {
            MockResponse::List(list) => Ok(list.into_iter().take(k).collect()),
            MockResponse::Failure(message) => Err(FusionError::retrieval(query, message)),
        }
    }
}

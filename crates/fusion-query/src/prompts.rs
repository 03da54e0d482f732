//! Built-in query transformation prompts.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use fusion_core::{Delimiter, FusionError, Result, VariantConfig};

const MULTI_QUERY: &str = "You are an AI language model assistant. Your task is to generate {count} \
different versions of the given user question to retrieve relevant documents from a vector \
database. By generating multiple perspectives on the user question, your goal is to help the \
user overcome some of the limitations of distance-based similarity search. Provide these \
alternative questions separated by newlines.
Original question: {question}";

const RAG_FUSION: &str = "You are a helpful assistant that generates multiple search queries \
based on a single input query.
Generate multiple search queries related to: {question}
Output ({count} queries, one per line):";

const DECOMPOSITION: &str = "You are a helpful assistant that generates multiple sub-questions \
related to an input question.
The goal is to break down the input into a set of sub-problems / sub-questions that can be \
answered in isolation.
Generate {count} sub-questions related to: {question}
Output ({count} sub-questions, one per line):";

const STEP_BACK: &str = "You are an expert at world knowledge. Your task is to step back and \
paraphrase a question to a more generic step-back question, which is easier to answer.
Reply with the step-back question only.
Question: {question}
Step-back question:";

const HYDE: &str = "Please write a scientific paper passage to answer the question.
Question: {question}
Passage:";

/// Query transformation technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStrategy {
    /// Several rephrasings of the same question.
    #[default]
    MultiQuery,

    /// Several related search queries, fused with RRF.
    RagFusion,

    /// Sub-questions answerable in isolation.
    Decomposition,

    /// One more generic question, retrieved next to the original.
    StepBack,

    /// A hypothetical answer passage used as the query.
    Hyde,
}

impl PromptStrategy {
    /// Template with `{question}` and `{count}` placeholders.
    pub fn template(&self) -> &'static str {
        match self {
            Self::MultiQuery => MULTI_QUERY,
            Self::RagFusion => RAG_FUSION,
            Self::Decomposition => DECOMPOSITION,
            Self::StepBack => STEP_BACK,
            Self::Hyde => HYDE,
        }
    }

    /// Number of variants this technique asks for.
    pub fn default_count(&self) -> usize {
        match self {
            Self::MultiQuery => 5,
            Self::RagFusion => 4,
            Self::Decomposition => 3,
            Self::StepBack | Self::Hyde => 1,
        }
    }

    /// How the generator output is split.
    pub fn delimiter(&self) -> Delimiter {
        match self {
            Self::Hyde => Delimiter::None,
            _ => Delimiter::Newline,
        }
    }

    /// Whether the unmodified question is retrieved as well.
    pub fn include_original(&self) -> bool {
        matches!(self, Self::StepBack)
    }

    /// Variant settings for this technique.
    pub fn variant_config(&self) -> VariantConfig {
        VariantConfig {
            count: self.default_count(),
            delimiter: self.delimiter(),
            include_original: self.include_original(),
            prompt_template: Some(self.template().to_string()),
        }
    }
}

impl FromStr for PromptStrategy {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "multi_query" => Ok(Self::MultiQuery),
            "rag_fusion" => Ok(Self::RagFusion),
            "decomposition" => Ok(Self::Decomposition),
            "step_back" => Ok(Self::StepBack),
            "hyde" => Ok(Self::Hyde),
            other => Err(FusionError::invalid_config(format!(
                "unknown prompt strategy {:?}",
                other
            ))),
        }
    }
}

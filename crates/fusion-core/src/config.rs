//! Configuration types for the fusion pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{FusionError, Result};
use crate::types::FusionMode;

/// Main configuration for the fusion pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FusionConfig {
    /// How ranked lists are merged.
    #[serde(default)]
    pub fusion: FusionSettings,

    /// Query variant generation.
    #[serde(default)]
    pub variants: VariantConfig,

    /// Retrieval fan-out.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Fusion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionSettings {
    /// Union or reciprocal rank fusion.
    #[serde(default)]
    pub mode: FusionMode,

    /// RRF smoothing constant k. Smaller values favour top ranks.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f64,

    /// Truncate the fused output to this many documents.
    #[serde(default)]
    pub top_n: Option<usize>,

    /// RRF weight per variant position; missing positions weigh 1.0.
    #[serde(default)]
    pub weights: Vec<f64>,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            mode: FusionMode::ReciprocalRank,
            rrf_k: 60.0,
            top_n: None,
            weights: Vec::new(),
        }
    }
}

impl FusionSettings {
    /// Weight applied to the list retrieved for variant `index`.
    pub fn weight_for(&self, index: usize) -> f64 {
        self.weights.get(index).copied().unwrap_or(1.0)
    }
}

/// How generator output is split into variants.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    /// One variant per line.
    #[default]
    Newline,

    /// Variants separated by blank lines.
    DoubleNewline,

    /// The whole output is a single variant.
    None,

    /// Any other separator.
    Custom(String),
}

impl Delimiter {
    /// Separator string, or `None` when output is not split.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Newline => Some("\n"),
            Self::DoubleNewline => Some("\n\n"),
            Self::None => None,
            Self::Custom(s) => Some(s.as_str()),
        }
    }
}

/// Query variant generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantConfig {
    /// Number of variants to request.
    #[serde(default = "default_variant_count")]
    pub count: usize,

    /// Separator between variants in generator output.
    #[serde(default)]
    pub delimiter: Delimiter,

    /// Also retrieve with the unmodified query.
    #[serde(default)]
    pub include_original: bool,

    /// Prompt template with `{question}` and `{count}` placeholders.
    /// Falls back to the built-in multi-query prompt when unset.
    #[serde(default)]
    pub prompt_template: Option<String>,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self {
            count: 4,
            delimiter: Delimiter::Newline,
            include_original: false,
            prompt_template: None,
        }
    }
}

/// Retrieval fan-out configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Items requested from the retriever per variant.
    #[serde(default = "default_search_k")]
    pub search_k: usize,

    /// Per-call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum retrieval calls in flight.
    ///
    /// Results are collected in submission order, so a slow call at the head
    /// of the queue holds back new dispatches until it finishes or times out.
    /// Effective parallelism can briefly drop below this limit.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_k: 10,
            timeout_ms: 10_000,
            max_concurrency: 8,
        }
    }
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Default value functions

fn default_rrf_k() -> f64 {
    60.0
}

fn default_variant_count() -> usize {
    4
}

fn default_search_k() -> usize {
    10
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_concurrency() -> usize {
    8
}

/// Check an RRF constant: finite and strictly positive.
pub fn validate_rrf_k(k: f64) -> Result<()> {
    if !k.is_finite() || k <= 0.0 {
        return Err(FusionError::invalid_config(format!(
            "rrf_k must be a finite number greater than 0, got {}",
            k
        )));
    }
    Ok(())
}

/// Check list weights: finite and non-negative.
pub fn validate_weights(weights: &[f64]) -> Result<()> {
    if let Some((i, w)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(FusionError::invalid_config(format!(
            "weight {} must be finite and >= 0, got {}",
            i, w
        )));
    }
    Ok(())
}

impl FusionConfig {
    /// Load configuration from file and validate it.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| FusionError::Config {
            message: format!("Failed to parse config {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("rag-fusion").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("rag-fusion.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        // Return defaults
        Ok(Self::default())
    }

    /// Reject parameters that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        validate_rrf_k(self.fusion.rrf_k)?;
        validate_weights(&self.fusion.weights)?;

        if self.fusion.top_n == Some(0) {
            return Err(FusionError::invalid_config("top_n must be at least 1"));
        }
        if self.variants.count == 0 {
            return Err(FusionError::invalid_config(
                "variants.count must be at least 1",
            ));
        }
        if let Delimiter::Custom(s) = &self.variants.delimiter {
            if s.is_empty() {
                return Err(FusionError::invalid_config(
                    "custom delimiter must not be empty",
                ));
            }
        }
        if self.retrieval.search_k == 0 {
            return Err(FusionError::invalid_config(
                "retrieval.search_k must be at least 1",
            ));
        }
        if self.retrieval.timeout_ms == 0 {
            return Err(FusionError::invalid_config(
                "retrieval.timeout_ms must be at least 1",
            ));
        }
        if self.retrieval.max_concurrency == 0 {
            return Err(FusionError::invalid_config(
                "retrieval.max_concurrency must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = FusionConfig::default();
        assert_eq!(config.fusion.mode, FusionMode::ReciprocalRank);
        assert_eq!(config.fusion.rrf_k, 60.0);
        assert_eq!(config.variants.count, 4);
        assert_eq!(config.variants.delimiter, Delimiter::Newline);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_k() {
        for k in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut config = FusionConfig::default();
            config.fusion.rrf_k = k;
            let err = config.validate().unwrap_err();
            assert_eq!(err.error_code(), "INVALID_CONFIG", "k = {}", k);
        }
    }

    #[test]
    fn test_rejects_bad_weights() {
        let mut config = FusionConfig::default();
        config.fusion.weights = vec![1.0, -0.5];
        assert!(config.validate().is_err());

        config.fusion.weights = vec![1.0, 0.0, 2.5];
        assert!(config.validate().is_ok());
        assert_eq!(config.fusion.weight_for(2), 2.5);
        assert_eq!(config.fusion.weight_for(7), 1.0);
    }

    #[test]
    fn test_rejects_zero_sizes() {
        let mut config = FusionConfig::default();
        config.variants.count = 0;
        assert!(config.validate().is_err());

        let mut config = FusionConfig::default();
        config.retrieval.max_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = FusionConfig::default();
        config.fusion.top_n = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[fusion]
mode = "union"
rrf_k = 20.0

[variants]
count = 3
delimiter = "double_newline"
include_original = true

[retrieval]
timeout_ms = 500
"#
        )
        .unwrap();

        let config = FusionConfig::load(file.path()).unwrap();
        assert_eq!(config.fusion.mode, FusionMode::Union);
        assert_eq!(config.fusion.rrf_k, 20.0);
        assert_eq!(config.variants.delimiter, Delimiter::DoubleNewline);
        assert!(config.variants.include_original);
        assert_eq!(config.retrieval.timeout(), Duration::from_millis(500));
        // Unspecified fields keep their defaults
        assert_eq!(config.retrieval.search_k, 10);
    }

    #[test]
    fn test_load_custom_delimiter() {
        let config: FusionConfig = toml::from_str(
            r#"
[variants]
delimiter = { custom = ";" }
"#,
        )
        .unwrap();
        assert_eq!(config.variants.delimiter.as_str(), Some(";"));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fusion]\nrrf_k = -5.0").unwrap();
        let err = FusionConfig::load(file.path()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fusion]\nmode = \"borda\"").unwrap();
        let err = FusionConfig::load(file.path()).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }
}

//! Configuration for chunking, scoring and the retrieval pipeline.
//!
//! [`RagConfig::default()`] reproduces the fixed production constants: 600-word
//! chunks with a 100-word overlap, chunks of 50 characters or fewer dropped,
//! BM25 with `k1 = 1.5`, `b = 0.75` against an assumed 400-token average chunk,
//! a 2.0 exact-phrase bonus, a 0.5 bigram bonus and `top_k = 6`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Target words per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 600;
/// Words carried from the end of one chunk into the start of the next.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;
/// Chunks whose trimmed length is at or below this many characters are dropped.
pub const DEFAULT_MIN_CHUNK_CHARS: usize = 50;
/// Number of ranked chunks returned when the caller does not say otherwise.
pub const DEFAULT_TOP_K: usize = 6;

/// BM25 term-saturation and length-normalization parameters.
///
/// There is no corpus-wide statistics pass: the average chunk length is a
/// fixed assumption rather than a measured value, and no IDF factor is applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length normalization strength, `0.0..=1.0`.
    pub b: f64,
    /// Assumed average chunk length in tokens.
    pub avg_chunk_len: f64,
}

impl Bm25Params {
    /// The production parameters.
    pub const DEFAULT: Self = Self { k1: 1.5, b: 0.75, avg_chunk_len: 400.0 };
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Configuration parameters for the retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Target chunk size in words.
    pub chunk_size: usize,
    /// Number of overlapping words between consecutive chunks.
    pub chunk_overlap: usize,
    /// Chunks with a trimmed length at or below this many characters are discarded.
    pub min_chunk_chars: usize,
    /// Number of top results to return from a query.
    pub top_k: usize,
    /// BM25 parameters for the term score.
    pub bm25: Bm25Params,
    /// Flat bonus when a chunk contains the whole query verbatim.
    pub phrase_bonus: f64,
    /// Bonus per adjacent query word pair found verbatim in a chunk.
    pub bigram_bonus: f64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            min_chunk_chars: DEFAULT_MIN_CHUNK_CHARS,
            top_k: DEFAULT_TOP_K,
            bm25: Bm25Params::DEFAULT,
            phrase_bonus: 2.0,
            bigram_bonus: 0.5,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Parse a JSON configuration. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Json`] on malformed input and [`RagError::ConfigError`]
    /// if the resulting values fail validation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the file cannot be read, plus the
    /// errors of [`RagConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RagError::ConfigError(format!("failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `bm25.k1` is negative, `bm25.b` lies outside `0.0..=1.0`, or
    ///   `bm25.avg_chunk_len` is not positive
    /// - either bonus is negative or not finite
    pub fn validate(&self) -> Result<()> {
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        let Bm25Params { k1, b, avg_chunk_len } = self.bm25;
        if !k1.is_finite() || k1 < 0.0 {
            return Err(RagError::ConfigError(format!("bm25.k1 ({k1}) must be non-negative")));
        }
        if !(0.0..=1.0).contains(&b) {
            return Err(RagError::ConfigError(format!("bm25.b ({b}) must be within 0.0..=1.0")));
        }
        if !avg_chunk_len.is_finite() || avg_chunk_len <= 0.0 {
            return Err(RagError::ConfigError(format!(
                "bm25.avg_chunk_len ({avg_chunk_len}) must be positive"
            )));
        }
        let bonuses = [("phrase_bonus", self.phrase_bonus), ("bigram_bonus", self.bigram_bonus)];
        for (name, value) in bonuses {
            if !value.is_finite() || value < 0.0 {
                return Err(RagError::ConfigError(format!(
                    "{name} ({value}) must be a non-negative number"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the target chunk size in words.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in words.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the minimum character length a chunk must exceed to be kept.
    pub fn min_chunk_chars(mut self, chars: usize) -> Self {
        self.config.min_chunk_chars = chars;
        self
    }

    /// Set the number of top results to return from a query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the BM25 parameters.
    pub fn bm25(mut self, params: Bm25Params) -> Self {
        self.config.bm25 = params;
        self
    }

    /// Set the exact-phrase bonus.
    pub fn phrase_bonus(mut self, bonus: f64) -> Self {
        self.config.phrase_bonus = bonus;
        self
    }

    /// Set the per-bigram bonus.
    pub fn bigram_bonus(mut self, bonus: f64) -> Self {
        self.config.bigram_bonus = bonus;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

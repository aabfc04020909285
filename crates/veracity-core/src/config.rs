//! Configuration management for the veracity engine
//!
//! Locates the corpus, the model cache and the tokenizer bundle, and
//! carries the scoring defaults.

use crate::search::{DEFAULT_THRESHOLD, DEFAULT_TOP_N};
use std::path::PathBuf;
use thiserror::Error;

pub const CORPUS_PATH_VAR: &str = "VERACITY_CORPUS_PATH";
pub const CACHE_DIR_VAR: &str = "VERACITY_CACHE_DIR";
pub const TOKENIZER_DIR_VAR: &str = "VERACITY_TOKENIZER_DIR";
pub const THRESHOLD_VAR: &str = "VERACITY_THRESHOLD";
pub const TOP_N_VAR: &str = "VERACITY_TOP_N";

/// Invalid configuration values
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    NotANumber { var: &'static str, value: String },

    #[error("Threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("top_n must be at least 1")]
    ZeroTopN,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// JSON (array or lines) file of reference articles
    pub corpus_path: PathBuf,
    /// Directory holding the cached vectorizer and matrix
    pub cache_dir: PathBuf,
    /// Root of the tokenizer resource bundle
    pub tokenizer_dir: PathBuf,
    pub threshold: f64,
    pub top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("./arabic_news.json"),
            cache_dir: PathBuf::from("."),
            tokenizer_dir: PathBuf::from("./tokenizer_resources"),
            threshold: DEFAULT_THRESHOLD,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl EngineConfig {
    pub fn with_corpus_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.corpus_path = path.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_tokenizer_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tokenizer_dir = dir.into();
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Load configuration from environment variables
    ///
    /// Expected variables (all optional):
    /// - VERACITY_CORPUS_PATH: corpus file (default: "./arabic_news.json")
    /// - VERACITY_CACHE_DIR: model cache directory (default: ".")
    /// - VERACITY_TOKENIZER_DIR: tokenizer bundle (default: "./tokenizer_resources")
    /// - VERACITY_THRESHOLD: similarity threshold in [0, 1] (default: 0.7)
    /// - VERACITY_TOP_N: candidates to rank, at least 1 (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`EngineConfig::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(CORPUS_PATH_VAR) {
            config.corpus_path = path.into();
        }
        if let Some(dir) = lookup(CACHE_DIR_VAR) {
            config.cache_dir = dir.into();
        }
        if let Some(dir) = lookup(TOKENIZER_DIR_VAR) {
            config.tokenizer_dir = dir.into();
        }
        if let Some(value) = lookup(THRESHOLD_VAR) {
            config.threshold = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::NotANumber {
                    var: THRESHOLD_VAR,
                    value: value.clone(),
                })?;
        }
        if let Some(value) = lookup(TOP_N_VAR) {
            config.top_n = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::NotANumber {
                    var: TOP_N_VAR,
                    value: value.clone(),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the scoring parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.threshold));
        }
        if self.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        Ok(())
    }
}

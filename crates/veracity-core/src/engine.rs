//! Engine - the initialized scorer and verifier behind one handle
//!
//! Startup does all the I/O: tokenizer resources, corpus, and the cached
//! (or freshly fitted) vector index. After that the engine is read-only
//! and can be shared across threads behind an `Arc`.

use crate::config::{ConfigError, EngineConfig};
use crate::corpus::{Corpus, CorpusError};
use crate::search::{
    Candidate, ScoreReport, ScorerSettings, ScoringError, SimilarityScorer, VectorIndex, Verdict,
};
use crate::storage::{ModelCache, StorageError};
use crate::tokenizer::{ResourceError, Tokenizer, TokenizerResources};
use crate::verifier::{SourceCheck, SourceVerifier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Fatal startup errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Tokenizer resources unavailable: {0}")]
    Resources(#[from] ResourceError),

    #[error("Corpus unavailable: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Vector index unavailable: {0}")]
    Storage(#[from] StorageError),
}

/// How startup treats existing cache artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Load the artifacts if both exist, otherwise fit and save
    #[default]
    Reuse,
    /// Always fit and overwrite the artifacts
    Refit,
}

/// Combined result of both checks for one snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub prediction: Verdict,
    pub source_check: SourceCheck,
}

/// Initialized veracity engine
#[derive(Debug, Clone)]
pub struct VeracityEngine {
    config: EngineConfig,
    corpus: Arc<Corpus>,
    index: Arc<VectorIndex>,
    scorer: SimilarityScorer,
    verifier: SourceVerifier,
}

impl VeracityEngine {
    /// Load everything named by `config`, reusing cached artifacts
    pub fn initialize(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::initialize_with(config, CachePolicy::Reuse)
    }

    pub fn initialize_with(
        config: &EngineConfig,
        policy: CachePolicy,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let resources = TokenizerResources::ensure(&config.tokenizer_dir)?;
        let tokenizer = Arc::new(Tokenizer::new(&resources));
        info!(
            "Tokenizer rules ({}) loaded from {:?}",
            resources.rules().language,
            resources.root()
        );

        let corpus = Corpus::load(&config.corpus_path)?;

        let cache = ModelCache::new(&config.cache_dir);
        let index = match policy {
            CachePolicy::Reuse => cache.load_or_fit(&corpus, tokenizer)?,
            CachePolicy::Refit => cache.refit(&corpus, tokenizer)?,
        };

        info!(
            "Veracity engine ready: {} articles, {} terms",
            corpus.len(),
            index.vectorizer().len()
        );
        Ok(Self::from_parts(config.clone(), corpus, index))
    }

    /// Assemble an engine from in-memory pieces
    pub fn from_parts(config: EngineConfig, corpus: Corpus, index: VectorIndex) -> Self {
        let corpus = Arc::new(corpus);
        let index = Arc::new(index);
        let scorer = SimilarityScorer::new(index.clone(), corpus.clone()).with_settings(
            ScorerSettings {
                threshold: config.threshold,
                top_n: config.top_n,
            },
        );
        let verifier = SourceVerifier::new(corpus.clone());

        Self {
            config,
            corpus,
            index,
            scorer,
            verifier,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    /// Similarity verdict with the configured threshold and `top_n`
    pub fn score(&self, text: &str) -> Verdict {
        self.scorer.score_default(text)
    }

    pub fn score_with(&self, text: &str, threshold: f64, top_n: usize) -> Verdict {
        self.scorer.score(text, threshold, top_n)
    }

    /// Verdict plus the ranked candidates behind it
    pub fn report(
        &self,
        text: &str,
        threshold: f64,
        top_n: usize,
    ) -> Result<ScoreReport, ScoringError> {
        self.scorer.try_score(text, threshold, top_n)
    }

    pub fn rank(&self, text: &str, top_n: usize) -> Result<Vec<Candidate>, ScoringError> {
        self.scorer.rank(text, top_n)
    }

    pub fn verify(&self, text: &str) -> SourceCheck {
        self.verifier.verify(text)
    }

    /// Run both checks independently
    pub fn check(&self, text: &str) -> Assessment {
        Assessment {
            prediction: self.score(text),
            source_check: self.verify(text),
        }
    }
}

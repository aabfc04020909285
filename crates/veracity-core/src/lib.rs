//! Veracity Core - Similarity scoring and source verification for Arabic news
//!
//! This crate provides:
//! - Arabic tokenization with clitic segmentation
//! - Reference corpus loading
//! - TF-IDF indexing with an on-disk cache
//! - Cosine similarity scoring against the corpus
//! - Cited-source verification
//! - Configuration and the initialized engine handle

pub mod article;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod search;
pub mod storage;
pub mod tokenizer;
pub mod verifier;

// Re-export commonly used types
pub use article::{Article, SourceField};
pub use config::{ConfigError, EngineConfig};
pub use corpus::{Corpus, CorpusError};
pub use engine::{Assessment, CachePolicy, EngineError, VeracityEngine};
pub use search::{Candidate, ScoreReport, SimilarityScorer, VeracityPredictor, Verdict};
pub use storage::{ModelCache, StorageError};
pub use tokenizer::{PreprocessingError, Tokenizer, TokenizerResources};
pub use verifier::{SourceCheck, SourceVerifier, VerificationError};

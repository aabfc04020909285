//! Search module - TF-IDF indexing and similarity scoring
//!
//! This module provides:
//! - The TF-IDF vector space (fit, transform, sparse vectors)
//! - Cosine similarity ranking against the reference corpus
//! - The verdict types shared by every predictor

pub mod similarity;
pub mod vector;

pub use similarity::{ScorerSettings, ScoringError, SimilarityScorer};
pub use vector::{IndexError, SparseVector, TermDocumentMatrix, VectorIndex, Vectorizer};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Similarity at or above which a snippet counts as corroborated
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Number of nearest articles kept as supporting candidates
pub const DEFAULT_TOP_N: usize = 5;

/// Maximum snippet length (in characters) for candidates
pub const SNIPPET_CHARS: usize = 200;

/// Outcome of the similarity path
///
/// Serializes as the fixed strings callers already depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "likely true")]
    LikelyTrue,
    #[serde(rename = "likely false or unverified")]
    LikelyFalse,
    #[serde(rename = "error")]
    Error,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::LikelyTrue => "likely true",
            Verdict::LikelyFalse => "likely false or unverified",
            Verdict::Error => "error",
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Verdict::LikelyTrue)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A corpus article ranked against the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Row in the term-document matrix (= corpus position)
    pub index: usize,
    pub similarity: f64,
    pub source: Option<String>,
    pub title: Option<String>,
    pub snippet: String,
}

/// Full result of a successful scoring pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub verdict: Verdict,
    pub max_similarity: f64,
    pub threshold: f64,
    /// Best candidates, highest similarity first
    pub candidates: Vec<Candidate>,
}

/// A predictor that maps a news snippet to a verdict
///
/// The TF-IDF scorer is one implementation; a supervised classifier
/// would be another behind the same contract.
pub trait VeracityPredictor: Send + Sync {
    /// Classify `text`; never fails, failures map to [`Verdict::Error`]
    fn predict(&self, text: &str) -> Verdict;

    /// Get the name of this predictor
    fn name(&self) -> &str;
}

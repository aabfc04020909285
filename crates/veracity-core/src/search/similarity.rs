//! Nearest-neighbour similarity scoring
//!
//! A query is projected into the fitted TF-IDF space and compared with
//! every corpus row by cosine similarity. The best `top_n` rows are kept
//! as candidates; the verdict depends only on the best one:
//!
//! - max similarity >= threshold: [`Verdict::LikelyTrue`]
//! - otherwise: [`Verdict::LikelyFalse`]
//!
//! Ties are broken by corpus order (earlier article first). Failures are
//! typed inside [`SimilarityScorer::try_score`] and only collapse to
//! [`Verdict::Error`] at [`SimilarityScorer::score`].

use crate::corpus::Corpus;
use crate::search::vector::{IndexError, SparseVector, VectorIndex};
use crate::search::{
    Candidate, ScoreReport, VeracityPredictor, Verdict, DEFAULT_THRESHOLD, DEFAULT_TOP_N,
    SNIPPET_CHARS,
};
use std::cmp::Ordering;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

/// Errors raised while scoring a single request
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Vector projection failed: {0}")]
    Index(#[from] IndexError),

    /// The index has no rows to compare against
    #[error("The term-document matrix is empty")]
    EmptyMatrix,
}

/// Default decision parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorerSettings {
    pub threshold: f64,
    pub top_n: usize,
}

impl Default for ScorerSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Rounding slack below 1.0 that still counts as an identical direction
const UNIT_TOLERANCE: f64 = 1e-9;

/// Cosine similarity of two sparse vectors; 0 when either is zero
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        return 0.0;
    }
    let similarity = a.dot(b) / denom;
    if similarity >= 1.0 - UNIT_TOLERANCE {
        1.0
    } else {
        similarity.max(0.0)
    }
}

/// Scores snippets against the reference corpus
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    index: Arc<VectorIndex>,
    corpus: Arc<Corpus>,
    settings: ScorerSettings,
}

impl SimilarityScorer {
    pub fn new(index: Arc<VectorIndex>, corpus: Arc<Corpus>) -> Self {
        Self {
            index,
            corpus,
            settings: ScorerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ScorerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ScorerSettings {
        &self.settings
    }

    /// Cosine similarity of `query` against every matrix row, in row order
    pub fn similarities(&self, query: &SparseVector) -> Vec<f64> {
        self.index
            .matrix()
            .rows()
            .iter()
            .map(|row| cosine(query, row))
            .collect()
    }

    /// The `top_n` most similar articles, best first
    ///
    /// `top_n` is raised to 1 and capped at the corpus size.
    pub fn rank(&self, text: &str, top_n: usize) -> Result<Vec<Candidate>, ScoringError> {
        let query = self.index.transform(text)?;
        let similarities = self.similarities(&query);
        if similarities.is_empty() {
            return Err(ScoringError::EmptyMatrix);
        }

        let mut order: Vec<usize> = (0..similarities.len()).collect();
        order.sort_by(|&a, &b| {
            similarities[b]
                .partial_cmp(&similarities[a])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });
        order.truncate(top_n.max(1));

        Ok(order
            .into_iter()
            .map(|index| self.candidate(index, similarities[index]))
            .collect())
    }

    fn candidate(&self, index: usize, similarity: f64) -> Candidate {
        // A trusted stale cache can have rows with no matching article
        let article = self.corpus.get(index);
        Candidate {
            index,
            similarity,
            source: article.and_then(|a| a.source().map(str::to_string)),
            title: article.and_then(|a| a.title.clone()),
            snippet: article
                .map(|a| a.content.chars().take(SNIPPET_CHARS).collect())
                .unwrap_or_default(),
        }
    }

    /// Score with typed failures
    pub fn try_score(
        &self,
        text: &str,
        threshold: f64,
        top_n: usize,
    ) -> Result<ScoreReport, ScoringError> {
        let candidates = self.rank(text, top_n)?;
        let max_similarity = candidates
            .first()
            .map(|c| c.similarity)
            .ok_or(ScoringError::EmptyMatrix)?;

        let verdict = if max_similarity >= threshold {
            Verdict::LikelyTrue
        } else {
            Verdict::LikelyFalse
        };

        debug!(
            "Max similarity {:.4} against threshold {:.2}: {}",
            max_similarity, threshold, verdict
        );

        Ok(ScoreReport {
            verdict,
            max_similarity,
            threshold,
            candidates,
        })
    }

    /// Score `text`; any failure becomes [`Verdict::Error`]
    pub fn score(&self, text: &str, threshold: f64, top_n: usize) -> Verdict {
        match self.try_score(text, threshold, top_n) {
            Ok(report) => report.verdict,
            Err(e) => {
                error!("Error in similarity scoring: {}", e);
                Verdict::Error
            }
        }
    }

    /// Score with the configured settings
    pub fn score_default(&self, text: &str) -> Verdict {
        self.score(text, self.settings.threshold, self.settings.top_n)
    }
}

impl VeracityPredictor for SimilarityScorer {
    fn predict(&self, text: &str) -> Verdict {
        self.score_default(text)
    }

    fn name(&self) -> &str {
        "tfidf-similarity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Article;
    use crate::search::vector::TermDocumentMatrix;
    use crate::tokenizer::Tokenizer;
    use pretty_assertions::assert_eq;

    const ECONOMY: &str = "أعلنت الحكومة عن خطة اقتصادية جديدة لدعم الصناعة المحلية";
    const FOOTBALL: &str = "فاز المنتخب الوطني في مباراة كرة القدم أمس";
    const WEATHER: &str = "تتوقع الأرصاد الجوية أمطارا غزيرة في المناطق الشمالية";

    fn scorer_for(articles: Vec<Article>) -> SimilarityScorer {
        let corpus = Arc::new(Corpus::from_articles(articles));
        let index = VectorIndex::fit(&corpus, Arc::new(Tokenizer::arabic())).unwrap();
        SimilarityScorer::new(Arc::new(index), corpus)
    }

    fn scorer() -> SimilarityScorer {
        scorer_for(vec![
            Article::new("aljazeera.net", ECONOMY).with_title("خطة اقتصادية"),
            Article::new("bbc.com/arabic", FOOTBALL),
            Article::new("echoroukonline.com", WEATHER),
        ])
    }

    #[test]
    fn test_exact_copy_is_likely_true() {
        let scorer = scorer();
        let report = scorer.try_score(FOOTBALL, 0.7, 5).unwrap();
        assert_eq!(report.verdict, Verdict::LikelyTrue);
        assert!((report.max_similarity - 1.0).abs() < 1e-9);
        assert_eq!(report.candidates[0].index, 1);
        assert_eq!(report.candidates[0].source.as_deref(), Some("bbc.com/arabic"));
    }

    #[test]
    fn test_unrelated_text_is_likely_false() {
        let scorer = scorer();
        assert_eq!(
            scorer.score("اكتشف العلماء نوعا جديدا من الطيور", 0.7, 5),
            Verdict::LikelyFalse
        );
    }

    #[test]
    fn test_partial_overlap_depends_on_threshold() {
        let scorer = scorer();
        let text = "الحكومة تعلن خطة";
        let report = scorer.try_score(text, 0.7, 5).unwrap();
        assert!(report.max_similarity > 0.0);
        assert!(report.max_similarity < 1.0);

        assert_eq!(scorer.score(text, 0.0, 5), Verdict::LikelyTrue);
        assert_eq!(scorer.score(text, 1.0, 5), Verdict::LikelyFalse);
    }

    #[test]
    fn test_empty_text_is_negative() {
        let scorer = scorer();
        let report = scorer.try_score("", 0.7, 5).unwrap();
        assert_eq!(report.verdict, Verdict::LikelyFalse);
        assert_eq!(report.max_similarity, 0.0);
        assert_eq!(scorer.score("", 0.01, 5), Verdict::LikelyFalse);
    }

    #[test]
    fn test_top_n_larger_than_corpus() {
        let scorer = scorer();
        let candidates = scorer.rank(ECONOMY, 50).unwrap();
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn test_top_n_zero_keeps_one_candidate() {
        let scorer = scorer();
        let report = scorer.try_score(WEATHER, 0.7, 0).unwrap();
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.verdict, Verdict::LikelyTrue);
    }

    #[test]
    fn test_ties_follow_corpus_order() {
        let scorer = scorer();
        // No shared terms: every row ties at 0
        let candidates = scorer.rank("كلمات غير موجودة", 3).unwrap();
        let order: Vec<usize> = candidates.iter().map(|c| c.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_candidates_sorted_descending() {
        let scorer = scorer();
        let candidates = scorer.rank(ECONOMY, 3).unwrap();
        assert!(candidates
            .windows(2)
            .all(|w| w[0].similarity >= w[1].similarity));
        assert_eq!(candidates[0].title.as_deref(), Some("خطة اقتصادية"));
        assert!(candidates[0].snippet.starts_with("أعلنت"));
    }

    #[test]
    fn test_garbled_text_is_error_verdict() {
        let scorer = scorer();
        assert_eq!(scorer.score("خبر \u{FFFD}", 0.7, 5), Verdict::Error);
        assert!(matches!(
            scorer.try_score("خبر \u{FFFD}", 0.7, 5),
            Err(ScoringError::Index(IndexError::Preprocessing(_)))
        ));
    }

    #[test]
    fn test_empty_matrix_is_error_verdict() {
        let fitted = scorer();
        let empty = VectorIndex::from_parts(
            fitted.index.vectorizer().clone(),
            TermDocumentMatrix::new(fitted.index.vectorizer().len(), vec![]).unwrap(),
            Arc::clone(fitted.index.tokenizer()),
        )
        .unwrap();
        let scorer = SimilarityScorer::new(Arc::new(empty), Arc::new(Corpus::default()));

        assert!(matches!(
            scorer.try_score(ECONOMY, 0.7, 5),
            Err(ScoringError::EmptyMatrix)
        ));
        assert_eq!(scorer.score(ECONOMY, 0.7, 5), Verdict::Error);
    }

    #[test]
    fn test_rows_without_articles_still_rank() {
        let fitted = scorer();
        let scorer = SimilarityScorer::new(
            Arc::clone(&fitted.index),
            Arc::new(Corpus::from_articles(vec![Article::new("a", ECONOMY)])),
        );
        let candidates = scorer.rank(WEATHER, 3).unwrap();
        assert_eq!(candidates[0].index, 2);
        assert_eq!(candidates[0].source, None);
        assert_eq!(candidates[0].snippet, "");
    }

    #[test]
    fn test_predictor_uses_settings() {
        let scorer = scorer().with_settings(ScorerSettings {
            threshold: 1.0,
            top_n: 1,
        });
        assert_eq!(scorer.name(), "tfidf-similarity");
        assert_eq!(scorer.predict("الحكومة تعلن خطة"), Verdict::LikelyFalse);
        assert_eq!(scorer.predict(WEATHER), Verdict::LikelyTrue);
    }

    #[test]
    fn test_cosine_bounds() {
        let a = SparseVector::from_parts(vec![0, 1], vec![3.0, 4.0]).unwrap();
        let b = SparseVector::from_parts(vec![1], vec![2.0]).unwrap();
        assert!((cosine(&a, &b) - 0.8).abs() < 1e-12);
        assert_eq!(cosine(&a, &SparseVector::zero()), 0.0);
        assert_eq!(cosine(&a, &a), 1.0);
    }
}

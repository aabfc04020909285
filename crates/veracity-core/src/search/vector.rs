//! TF-IDF vector space over the reference corpus
//!
//! Fitting tokenizes every article, builds a sorted vocabulary, computes a
//! smoothed inverse document frequency per term, and stores one
//! L2-normalised sparse row per article, aligned with corpus order.
//!
//! ```text
//! idf(t)   = ln((1 + n) / (1 + df(t))) + 1
//! w(t, d)  = count(t, d) * idf(t), then L2-normalised per document
//! ```
//!
//! The vocabulary and weights are frozen after fitting. `transform`
//! projects new text into the same space; terms outside the vocabulary
//! are dropped.

use crate::corpus::Corpus;
use crate::tokenizer::{PreprocessingError, Tokenizer};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Terms are runs of two or more word characters in the normalized text
pub const TERM_PATTERN: &str = r"\b\w\w+\b";

lazy_static! {
    static ref TERM_REGEX: Regex = Regex::new(TERM_PATTERN).unwrap();
}

/// Errors raised while fitting or projecting
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Preprocessing failed: {0}")]
    Preprocessing(#[from] PreprocessingError),

    /// No article produced a single term
    #[error("Empty vocabulary: the corpus contains no indexable terms")]
    EmptyVocabulary,

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Malformed index data: {0}")]
    Malformed(String),
}

/// Sparse vector with strictly increasing column indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// The all-zero vector
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from parallel index/value lists; indices must be strictly
    /// increasing
    pub fn from_parts(indices: Vec<usize>, values: Vec<f64>) -> Result<Self, IndexError> {
        if indices.len() != values.len() {
            return Err(IndexError::DimensionMismatch {
                expected: indices.len(),
                found: values.len(),
            });
        }
        if indices.windows(2).any(|w| w[0] >= w[1]) {
            return Err(IndexError::Malformed(
                "sparse indices are not strictly increasing".to_string(),
            ));
        }
        Ok(Self { indices, values })
    }

    fn from_weights(weights: BTreeMap<usize, f64>) -> Self {
        let (indices, values): (Vec<usize>, Vec<f64>) = weights.into_iter().unzip();
        Self { indices, values }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    /// Largest column index plus one, or zero for the empty vector
    pub fn min_dimension(&self) -> usize {
        self.indices.last().map(|i| i + 1).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Dot product via a merge over both index lists
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    fn l2_normalize(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
        self
    }
}

/// Extract vocabulary terms from raw text
pub fn analyze(tokenizer: &Tokenizer, text: &str) -> Result<Vec<String>, PreprocessingError> {
    let normalized = tokenizer.normalize(text)?;
    Ok(TERM_REGEX
        .find_iter(&normalized)
        .map(|m| m.as_str().to_string())
        .collect())
}

/// Frozen vocabulary and IDF weights
#[derive(Debug, Clone, PartialEq)]
pub struct Vectorizer {
    terms: Vec<String>,
    idf: Vec<f64>,
    lookup: HashMap<String, usize>,
}

impl Vectorizer {
    /// Rebuild a vectorizer from a sorted term list and matching IDF weights
    pub fn from_parts(terms: Vec<String>, idf: Vec<f64>) -> Result<Self, IndexError> {
        if terms.len() != idf.len() {
            return Err(IndexError::DimensionMismatch {
                expected: terms.len(),
                found: idf.len(),
            });
        }
        if terms.windows(2).any(|w| w[0] >= w[1]) {
            return Err(IndexError::Malformed(
                "terms must be sorted and unique".to_string(),
            ));
        }

        let lookup = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();

        Ok(Self { terms, idf, lookup })
    }

    /// Fit vocabulary and smoothed IDF on analyzed documents
    fn fit(documents: &[Vec<String>]) -> Result<Self, IndexError> {
        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in documents {
            let unique: BTreeSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(IndexError::EmptyVocabulary);
        }

        let n = documents.len() as f64;
        let (terms, idf): (Vec<String>, Vec<f64>) = document_frequency
            .into_iter()
            .map(|(term, df)| (term.to_string(), ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0))
            .unzip();

        Self::from_parts(terms, idf)
    }

    /// Vocabulary size
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn column(&self, term: &str) -> Option<usize> {
        self.lookup.get(term).copied()
    }

    /// Count × IDF over in-vocabulary terms, L2-normalised
    pub fn weigh<'a>(&self, terms: impl IntoIterator<Item = &'a str>) -> SparseVector {
        let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
        for term in terms {
            if let Some(col) = self.column(term) {
                *weights.entry(col).or_insert(0.0) += 1.0;
            }
        }
        for (col, weight) in weights.iter_mut() {
            *weight *= self.idf[*col];
        }
        SparseVector::from_weights(weights).l2_normalize()
    }
}

/// One row per article, aligned with corpus order
#[derive(Debug, Clone, PartialEq)]
pub struct TermDocumentMatrix {
    n_terms: usize,
    rows: Vec<SparseVector>,
}

impl TermDocumentMatrix {
    pub fn new(n_terms: usize, rows: Vec<SparseVector>) -> Result<Self, IndexError> {
        if let Some(row) = rows.iter().find(|r| r.min_dimension() > n_terms) {
            return Err(IndexError::DimensionMismatch {
                expected: n_terms,
                found: row.min_dimension(),
            });
        }
        Ok(Self { n_terms, rows })
    }

    pub fn n_terms(&self) -> usize {
        self.n_terms
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&SparseVector> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }
}

/// Fitted TF-IDF index bound to the tokenizer it was built with
#[derive(Debug, Clone)]
pub struct VectorIndex {
    vectorizer: Vectorizer,
    matrix: TermDocumentMatrix,
    tokenizer: Arc<Tokenizer>,
}

impl VectorIndex {
    /// Tokenize every article and fit the vector space
    ///
    /// # Errors
    ///
    /// - [`IndexError::Preprocessing`] if an article cannot be tokenized
    /// - [`IndexError::EmptyVocabulary`] if no article yields a term
    pub fn fit(corpus: &Corpus, tokenizer: Arc<Tokenizer>) -> Result<Self, IndexError> {
        info!("Fitting TF-IDF index over {} articles", corpus.len());

        let documents = corpus
            .iter()
            .map(|article| analyze(&tokenizer, &article.content))
            .collect::<Result<Vec<_>, _>>()?;

        let vectorizer = Vectorizer::fit(&documents)?;
        let rows = documents
            .iter()
            .map(|doc| vectorizer.weigh(doc.iter().map(String::as_str)))
            .collect();
        let matrix = TermDocumentMatrix::new(vectorizer.len(), rows)?;

        info!(
            "Fitted TF-IDF index: {} terms, {} rows",
            vectorizer.len(),
            matrix.n_rows()
        );

        Ok(Self {
            vectorizer,
            matrix,
            tokenizer,
        })
    }

    /// Reassemble an index from previously fitted parts
    pub fn from_parts(
        vectorizer: Vectorizer,
        matrix: TermDocumentMatrix,
        tokenizer: Arc<Tokenizer>,
    ) -> Result<Self, IndexError> {
        if matrix.n_terms() != vectorizer.len() {
            return Err(IndexError::DimensionMismatch {
                expected: vectorizer.len(),
                found: matrix.n_terms(),
            });
        }
        Ok(Self {
            vectorizer,
            matrix,
            tokenizer,
        })
    }

    /// Project `text` into the fitted space
    ///
    /// Out-of-vocabulary terms are dropped; text with no known terms gives
    /// the zero vector.
    pub fn transform(&self, text: &str) -> Result<SparseVector, IndexError> {
        let terms = analyze(&self.tokenizer, text)?;
        let vector = self.vectorizer.weigh(terms.iter().map(String::as_str));
        debug!(
            "Projected query: {} terms, {} in vocabulary",
            terms.len(),
            vector.nnz()
        );
        Ok(vector)
    }

    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    pub fn matrix(&self) -> &TermDocumentMatrix {
        &self.matrix
    }

    pub fn tokenizer(&self) -> &Arc<Tokenizer> {
        &self.tokenizer
    }

    pub fn n_rows(&self) -> usize {
        self.matrix.n_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Article;
    use pretty_assertions::assert_eq;

    fn corpus() -> Corpus {
        Corpus::from_articles(vec![
            Article::new("a", "الحكومة تعلن خطة جديدة للاقتصاد"),
            Article::new("b", "الحكومة تنفي الشائعات حول الاقتصاد"),
            Article::new("c", "فريق كرة القدم يفوز بالبطولة"),
        ])
    }

    fn fit() -> VectorIndex {
        VectorIndex::fit(&corpus(), Arc::new(Tokenizer::arabic())).unwrap()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_vocabulary_is_sorted_and_excludes_single_chars() {
        let index = fit();
        let terms = index.vectorizer().terms();

        let mut sorted = terms.to_vec();
        sorted.sort();
        assert_eq!(terms, sorted.as_slice());

        // ل and ب are split off as clitics and are too short to be terms
        assert!(index.vectorizer().column("ل").is_none());
        assert!(index.vectorizer().column("ب").is_none());
        assert!(index.vectorizer().column("الاقتصاد").is_some());
        assert!(index.vectorizer().column("البطولة").is_some());
    }

    #[test]
    fn test_smoothed_idf() {
        let index = fit();
        let v = index.vectorizer();

        // "الحكومة" appears in 2 of 3 documents
        let shared = v.idf()[v.column("الحكومة").unwrap()];
        assert_close(shared, (4.0f64 / 3.0).ln() + 1.0);

        // "كرة" appears in 1 of 3 documents
        let rare = v.idf()[v.column("كرة").unwrap()];
        assert_close(rare, (4.0f64 / 2.0).ln() + 1.0);
        assert!(rare > shared);
    }

    #[test]
    fn test_rows_are_unit_length_and_aligned() {
        let index = fit();
        assert_eq!(index.n_rows(), 3);
        for row in index.matrix().rows() {
            assert_close(row.norm(), 1.0);
            assert!(row.values().iter().all(|w| *w >= 0.0));
        }

        let col = index.vectorizer().column("البطولة").unwrap();
        assert!(!index.matrix().row(0).unwrap().indices().contains(&col));
        assert!(index
            .matrix()
            .row(2)
            .unwrap()
            .iter()
            .any(|(c, w)| c == col && w > 0.0));
    }

    #[test]
    fn test_transform_matches_fitted_row() {
        let index = fit();
        let projected = index.transform(&corpus().get(1).unwrap().content).unwrap();
        let row = index.matrix().row(1).unwrap();
        assert_eq!(projected.indices(), row.indices());
        for (a, b) in projected.values().iter().zip(row.values()) {
            assert_close(*a, *b);
        }
    }

    #[test]
    fn test_transform_drops_oov_terms() {
        let index = fit();
        let vector = index.transform("مطار جديد في المدينة").unwrap();
        assert!(vector.is_zero());
        assert_eq!(vector.nnz(), 0);

        let partial = index.transform("الحكومة والمطار").unwrap();
        assert_eq!(partial.nnz(), 1);
        assert_close(partial.norm(), 1.0);
    }

    #[test]
    fn test_transform_empty_text() {
        let index = fit();
        assert!(index.transform("").unwrap().is_zero());
    }

    #[test]
    fn test_transform_garbled_text_fails() {
        let index = fit();
        let err = index.transform("\u{FFFD}").unwrap_err();
        assert!(matches!(err, IndexError::Preprocessing(_)));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let a = fit();
        let b = fit();
        assert_eq!(a.vectorizer(), b.vectorizer());
        assert_eq!(a.matrix(), b.matrix());
    }

    #[test]
    fn test_empty_vocabulary() {
        let corpus = Corpus::from_articles(vec![Article::new("a", "و . ،")]);
        let err = VectorIndex::fit(&corpus, Arc::new(Tokenizer::arabic())).unwrap_err();
        assert!(matches!(err, IndexError::EmptyVocabulary));

        let err = VectorIndex::fit(&Corpus::default(), Arc::new(Tokenizer::arabic())).unwrap_err();
        assert!(matches!(err, IndexError::EmptyVocabulary));
    }

    #[test]
    fn test_sparse_dot() {
        let a = SparseVector::from_parts(vec![0, 2, 5], vec![1.0, 2.0, 3.0]).unwrap();
        let b = SparseVector::from_parts(vec![2, 3, 5], vec![4.0, 1.0, 1.0]).unwrap();
        assert_close(a.dot(&b), 11.0);
        assert_close(a.dot(&SparseVector::zero()), 0.0);
        assert_eq!(a.min_dimension(), 6);
    }

    #[test]
    fn test_sparse_rejects_unsorted_indices() {
        assert!(SparseVector::from_parts(vec![2, 1], vec![1.0, 1.0]).is_err());
        assert!(SparseVector::from_parts(vec![1], vec![]).is_err());
    }

    #[test]
    fn test_from_parts_checks_dimensions() {
        let index = fit();
        let small = TermDocumentMatrix::new(1, vec![]).unwrap();
        let err = VectorIndex::from_parts(
            index.vectorizer().clone(),
            small,
            Arc::clone(index.tokenizer()),
        )
        .unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
    }
}

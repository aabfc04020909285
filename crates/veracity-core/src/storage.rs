//! On-disk cache for the fitted vector space
//!
//! Two JSON artifacts live side by side in the cache directory:
//! - `tfidf_vectorizer.json`: vocabulary, IDF weights, term pattern
//! - `tfidf_matrix.json`: the term-document matrix, one row per article
//!
//! The cache is keyed only by the presence of both files. If they exist
//! they are trusted as-is, even when the corpus file has changed since
//! they were written; refitting requires deleting them or `refit`.

use crate::corpus::Corpus;
use crate::search::vector::{
    IndexError, SparseVector, TermDocumentMatrix, VectorIndex, Vectorizer, TERM_PATTERN,
};
use crate::tokenizer::Tokenizer;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const VECTORIZER_FILE: &str = "tfidf_vectorizer.json";
pub const MATRIX_FILE: &str = "tfidf_matrix.json";

/// Bumped whenever the artifact layout changes
const FORMAT_VERSION: u32 = 1;

/// Errors raised while reading or writing cached artifacts
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access cache artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize cache artifact {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported cache artifact {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },

    #[error(transparent)]
    Index(#[from] IndexError),
}

#[derive(Debug, Serialize, Deserialize)]
struct VectorizerArtifact {
    format_version: u32,
    term_pattern: String,
    terms: Vec<String>,
    idf: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SparseRow {
    indices: Vec<usize>,
    values: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MatrixArtifact {
    format_version: u32,
    n_terms: usize,
    rows: Vec<SparseRow>,
}

/// Cached artifacts at a fixed location
#[derive(Debug, Clone)]
pub struct ModelCache {
    dir: PathBuf,
}

impl ModelCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.dir.join(VECTORIZER_FILE)
    }

    pub fn matrix_path(&self) -> PathBuf {
        self.dir.join(MATRIX_FILE)
    }

    /// Both artifacts are present
    ///
    /// This is a plain existence check, not an atomic guard: only one
    /// process should initialise a given cache directory at a time.
    pub fn exists(&self) -> bool {
        self.vectorizer_path().exists() && self.matrix_path().exists()
    }

    /// Reuse the cached index if present, otherwise fit and save
    ///
    /// A cached matrix whose row count differs from the corpus is still
    /// used; the mismatch is logged.
    pub fn load_or_fit(
        &self,
        corpus: &Corpus,
        tokenizer: Arc<Tokenizer>,
    ) -> Result<VectorIndex, StorageError> {
        if self.exists() {
            info!("Loading existing TF-IDF vectorizer and matrix from {:?}", self.dir);
            let index = self.load(tokenizer)?;
            if index.n_rows() != corpus.len() {
                warn!(
                    "Cached matrix has {} rows but the corpus has {} articles; \
                     delete {:?} to refit",
                    index.n_rows(),
                    corpus.len(),
                    self.dir
                );
            }
            return Ok(index);
        }

        info!("No cached TF-IDF model in {:?}; fitting and saving", self.dir);
        self.refit(corpus, tokenizer)
    }

    /// Fit from scratch and overwrite any cached artifacts
    pub fn refit(
        &self,
        corpus: &Corpus,
        tokenizer: Arc<Tokenizer>,
    ) -> Result<VectorIndex, StorageError> {
        let index = VectorIndex::fit(corpus, tokenizer)?;
        self.save(&index)?;
        Ok(index)
    }

    /// Write both artifacts
    pub fn save(&self, index: &VectorIndex) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let vectorizer = VectorizerArtifact {
            format_version: FORMAT_VERSION,
            term_pattern: TERM_PATTERN.to_string(),
            terms: index.vectorizer().terms().to_vec(),
            idf: index.vectorizer().idf().to_vec(),
        };
        let matrix = MatrixArtifact {
            format_version: FORMAT_VERSION,
            n_terms: index.matrix().n_terms(),
            rows: index
                .matrix()
                .rows()
                .iter()
                .map(|row| SparseRow {
                    indices: row.indices().to_vec(),
                    values: row.values().to_vec(),
                })
                .collect(),
        };

        write_json(&self.vectorizer_path(), &vectorizer)?;
        write_json(&self.matrix_path(), &matrix)?;

        info!(
            "Saved TF-IDF artifacts ({} terms, {} rows) to {:?}",
            index.vectorizer().len(),
            index.n_rows(),
            self.dir
        );
        Ok(())
    }

    /// Read both artifacts and bind them to `tokenizer`
    pub fn load(&self, tokenizer: Arc<Tokenizer>) -> Result<VectorIndex, StorageError> {
        let vectorizer_path = self.vectorizer_path();
        let artifact: VectorizerArtifact = read_json(&vectorizer_path)?;
        check_version(&vectorizer_path, artifact.format_version)?;
        if artifact.term_pattern != TERM_PATTERN {
            return Err(StorageError::Unsupported {
                path: vectorizer_path,
                reason: format!(
                    "term pattern {:?} differs from {:?}",
                    artifact.term_pattern, TERM_PATTERN
                ),
            });
        }
        let vectorizer = Vectorizer::from_parts(artifact.terms, artifact.idf)?;

        let matrix_path = self.matrix_path();
        let artifact: MatrixArtifact = read_json(&matrix_path)?;
        check_version(&matrix_path, artifact.format_version)?;
        let rows = artifact
            .rows
            .into_iter()
            .map(|row| SparseVector::from_parts(row.indices, row.values))
            .collect::<Result<Vec<_>, _>>()?;
        let matrix = TermDocumentMatrix::new(artifact.n_terms, rows)?;

        Ok(VectorIndex::from_parts(vectorizer, matrix, tokenizer)?)
    }
}

fn check_version(path: &Path, found: u32) -> Result<(), StorageError> {
    if found != FORMAT_VERSION {
        return Err(StorageError::Unsupported {
            path: path.to_path_buf(),
            reason: format!("format version {} (expected {})", found, FORMAT_VERSION),
        });
    }
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let body = serde_json::to_vec(value).map_err(|source| StorageError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, body).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let body = std::fs::read(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&body).map_err(|source| StorageError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

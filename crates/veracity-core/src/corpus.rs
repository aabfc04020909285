//! Reference corpus store
//!
//! The corpus is read once at startup and never changes afterwards. Its
//! order is significant: similarity scores are aligned to articles by
//! position, and source verification returns the first match in this order.

use crate::article::{Article, SourceField};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors raised while loading the corpus file
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The corpus file does not exist; nothing can be served without it
    #[error("Corpus file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read corpus file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse corpus file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A record lacks the fields every article needs
    #[error("Malformed corpus record {index}: {reason}")]
    Malformed { index: usize, reason: String },
}

/// Record shape as written by the crawler; unknown fields are ignored
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    source: Option<SourceField>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl RawRecord {
    fn into_article(self, index: usize) -> Result<Article, CorpusError> {
        let content = self.content.ok_or_else(|| CorpusError::Malformed {
            index,
            reason: "missing `content` field".to_string(),
        })?;

        Ok(Article {
            source: self.source,
            content,
            title: self.title,
            url: self.url,
        })
    }
}

/// Ordered, read-only collection of reference articles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    articles: Vec<Article>,
}

impl Corpus {
    /// Load the whole corpus file into memory
    ///
    /// Accepts a JSON array of records or JSON Lines (one record per
    /// line). Files ending in `.jsonl` are always read as JSON Lines;
    /// otherwise the first non-blank character decides.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        if !path.exists() {
            return Err(CorpusError::NotFound(path.to_path_buf()));
        }

        let raw = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_jsonl = path.extension().map(|ext| ext == "jsonl").unwrap_or(false)
            || !raw.trim_start().starts_with('[');

        let records = if is_jsonl {
            Self::parse_json_lines(&raw, path)?
        } else {
            serde_json::from_str::<Vec<RawRecord>>(&raw).map_err(|source| CorpusError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        };

        let articles = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_article(index))
            .collect::<Result<Vec<_>, _>>()?;

        info!("Loaded {} reference articles from {:?}", articles.len(), path);
        Ok(Self { articles })
    }

    fn parse_json_lines(raw: &str, path: &Path) -> Result<Vec<RawRecord>, CorpusError> {
        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|source| CorpusError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
            })
            .collect()
    }

    /// Build a corpus from in-memory articles (fixtures, tests)
    pub fn from_articles(articles: Vec<Article>) -> Self {
        Self { articles }
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Article> {
        self.articles.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Article> {
        self.articles.iter()
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Article;
    type IntoIter = std::slice::Iter<'a, Article>;

    fn into_iter(self) -> Self::IntoIter {
        self.articles.iter()
    }
}

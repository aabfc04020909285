//! Tokenizer resource bundle
//!
//! The segmentation rules live in a small on-disk bundle
//! (`<dir>/ar/tokenizer.json`). The first start installs the bundled
//! defaults into the directory; later starts load whatever is on disk,
//! so an operator can tune the clitic inventories without a rebuild.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Default Arabic rules shipped with the crate
const BUNDLED_ARABIC_RULES: &str = include_str!("../../resources/ar/tokenizer.json");

/// Language sub-directory and file name inside the bundle
const LANGUAGE_DIR: &str = "ar";
const RULES_FILE: &str = "tokenizer.json";

/// Errors raised while installing or reading the resource bundle
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Failed to access tokenizer resources at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid tokenizer resources at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Clitic inventories and segmentation settings for one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationRules {
    pub language: String,
    /// Definite article that licenses a preposition split (ال)
    pub definite_article: String,
    /// Conjunction proclitics (و, ف)
    pub conjunctions: Vec<String>,
    /// Preposition proclitics (ب, ك, ل)
    pub prepositions: Vec<String>,
    /// Pronoun enclitics, longest first
    #[serde(default)]
    pub enclitics: Vec<String>,
    #[serde(default)]
    pub split_enclitics: bool,
    /// Minimum number of letters a stem must keep after a split
    pub min_stem_chars: usize,
    /// Words that are never split
    #[serde(default)]
    pub protected: Vec<String>,
}

impl SegmentationRules {
    /// Rules bundled with the crate
    pub fn arabic() -> Self {
        serde_json::from_str(BUNDLED_ARABIC_RULES).unwrap_or_else(|e| {
            warn!(
                "Bundled Arabic tokenizer rules are invalid ({}); using built-in minimum",
                e
            );
            Self::minimal_arabic()
        })
    }

    fn minimal_arabic() -> Self {
        Self {
            language: LANGUAGE_DIR.to_string(),
            definite_article: "ال".to_string(),
            conjunctions: vec!["و".to_string(), "ف".to_string()],
            prepositions: vec!["ب".to_string(), "ك".to_string(), "ل".to_string()],
            enclitics: Vec::new(),
            split_enclitics: false,
            min_stem_chars: 2,
            protected: Vec::new(),
        }
    }
}

/// A loaded resource bundle
#[derive(Debug, Clone)]
pub struct TokenizerResources {
    root: PathBuf,
    rules: SegmentationRules,
}

impl TokenizerResources {
    /// Load the bundle from `dir`, installing the bundled defaults first if
    /// the rules file is absent
    pub fn ensure(dir: &Path) -> Result<Self, ResourceError> {
        let path = Self::rules_path(dir);

        if !path.exists() {
            info!("Installing Arabic tokenizer resources into {:?} (first run)", dir);
            let lang_dir = dir.join(LANGUAGE_DIR);
            std::fs::create_dir_all(&lang_dir).map_err(|source| ResourceError::Io {
                path: lang_dir.clone(),
                source,
            })?;
            std::fs::write(&path, BUNDLED_ARABIC_RULES).map_err(|source| ResourceError::Io {
                path: path.clone(),
                source,
            })?;
        } else {
            info!("Loading existing tokenizer resources from {:?}", path);
        }

        Self::load(dir)
    }

    /// Load an existing bundle without installing anything
    pub fn load(dir: &Path) -> Result<Self, ResourceError> {
        let path = Self::rules_path(dir);
        let raw = std::fs::read_to_string(&path).map_err(|source| ResourceError::Io {
            path: path.clone(),
            source,
        })?;
        let rules = serde_json::from_str(&raw).map_err(|source| ResourceError::Parse {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            root: dir.to_path_buf(),
            rules,
        })
    }

    /// In-memory bundle with the default rules (for tests and fixtures)
    pub fn bundled() -> Self {
        Self {
            root: PathBuf::new(),
            rules: SegmentationRules::arabic(),
        }
    }

    pub fn rules(&self) -> &SegmentationRules {
        &self.rules
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn rules_path(dir: &Path) -> PathBuf {
        dir.join(LANGUAGE_DIR).join(RULES_FILE)
    }
}

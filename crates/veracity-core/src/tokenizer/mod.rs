//! Language-aware tokenization for Arabic news text
//!
//! Pipeline:
//! 1. Reject garbled input (lossy-decoding markers, NUL)
//! 2. UAX #29 sentence boundaries
//! 3. UAX #29 word boundaries within each sentence
//! 4. Arabic clitic segmentation (و/ف + article forms, ب/ك/ل + article)
//!
//! Text is never lowercased, stemmed, or stripped of diacritics.
//! Punctuation segments are kept as tokens of their own.

mod clitics;
pub mod resources;

pub use resources::{ResourceError, SegmentationRules, TokenizerResources};

use clitics::CliticSplitter;
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// Errors raised while preparing input text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreprocessingError {
    /// Raw bytes are not UTF-8
    #[error("Input is not valid UTF-8 (valid up to byte {0})")]
    InvalidUtf8(usize),

    /// U+FFFD left behind by a lossy decode upstream
    #[error("Garbled input: replacement character at byte {0}")]
    ReplacementCharacter(usize),

    #[error("Garbled input: NUL character at byte {0}")]
    NulCharacter(usize),
}

/// Arabic word tokenizer
///
/// Built once from a [`TokenizerResources`] bundle and shared behind an
/// `Arc`; tokenization itself is pure and holds no mutable state.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    rules: SegmentationRules,
}

impl Tokenizer {
    /// Create a tokenizer from a loaded resource bundle
    pub fn new(resources: &TokenizerResources) -> Self {
        Self::from_rules(resources.rules().clone())
    }

    pub fn from_rules(rules: SegmentationRules) -> Self {
        Self { rules }
    }

    /// Tokenizer with the bundled Arabic rules
    pub fn arabic() -> Self {
        Self::from_rules(SegmentationRules::arabic())
    }

    pub fn rules(&self) -> &SegmentationRules {
        &self.rules
    }

    /// Split `text` into ordered word and punctuation tokens
    ///
    /// # Example
    ///
    /// ```
    /// use veracity_core::tokenizer::Tokenizer;
    ///
    /// let tokens = Tokenizer::arabic().tokenize("والكتاب على الطاولة.").unwrap();
    /// assert_eq!(tokens, vec!["و", "الكتاب", "على", "الطاولة", "."]);
    /// ```
    pub fn tokenize(&self, text: &str) -> Result<Vec<String>, PreprocessingError> {
        check_encoding(text)?;

        let splitter = CliticSplitter::new(&self.rules);
        let mut tokens = Vec::new();

        for sentence in text.split_sentence_bounds() {
            for segment in sentence.split_word_bounds() {
                for piece in segment.split_whitespace() {
                    if piece.chars().any(char::is_alphanumeric) {
                        tokens.extend(splitter.split(piece));
                    } else if !piece.chars().all(char::is_control) {
                        tokens.push(piece.to_string());
                    }
                }
            }
        }

        Ok(tokens)
    }

    /// Tokens joined by single spaces
    pub fn normalize(&self, text: &str) -> Result<String, PreprocessingError> {
        Ok(self.tokenize(text)?.join(" "))
    }

    /// Like [`Tokenizer::normalize`] for raw bytes of unknown quality
    pub fn normalize_bytes(&self, bytes: &[u8]) -> Result<String, PreprocessingError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| PreprocessingError::InvalidUtf8(e.valid_up_to()))?;
        self.normalize(text)
    }
}

fn check_encoding(text: &str) -> Result<(), PreprocessingError> {
    for (idx, ch) in text.char_indices() {
        match ch {
            '\u{FFFD}' => return Err(PreprocessingError::ReplacementCharacter(idx)),
            '\0' => return Err(PreprocessingError::NulCharacter(idx)),
            _ => {}
        }
    }
    Ok(())
}

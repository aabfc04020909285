//! Source verification
//!
//! Checks whether an outlet known to the corpus is cited in the input.
//! The corpus is scanned in stored order and the first article whose
//! `source` occurs verbatim (case-sensitive) in the text wins, so when
//! several sources appear, the one listed earliest in the corpus is
//! reported.

use crate::article::Article;
use crate::corpus::Corpus;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

/// Payload returned when no corpus source occurs in the text
pub const SOURCE_NOT_FOUND: &str = "Source not found in dataset";

/// Payload returned when the scan fails
pub const VERIFICATION_FAILED: &str = "Error during source verification";

/// Errors that can occur during source verification
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// A corpus entry without a string source was reached during the scan
    #[error("Malformed corpus entry {index}: `source` is missing or not a string")]
    MalformedEntry { index: usize },
}

/// Result of the source-verification path
///
/// Serializes as `[matched, payload]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(bool, String)", into = "(bool, String)")]
pub struct SourceCheck {
    pub matched: bool,
    /// Matched article body, or one of the fixed diagnostic messages
    pub payload: String,
}

impl SourceCheck {
    pub fn matched(content: impl Into<String>) -> Self {
        Self {
            matched: true,
            payload: content.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            matched: false,
            payload: SOURCE_NOT_FOUND.to_string(),
        }
    }

    pub fn failed() -> Self {
        Self {
            matched: false,
            payload: VERIFICATION_FAILED.to_string(),
        }
    }
}

impl From<(bool, String)> for SourceCheck {
    fn from((matched, payload): (bool, String)) -> Self {
        Self { matched, payload }
    }
}

impl From<SourceCheck> for (bool, String) {
    fn from(check: SourceCheck) -> Self {
        (check.matched, check.payload)
    }
}

/// Verifies cited sources against the reference corpus
#[derive(Debug, Clone)]
pub struct SourceVerifier {
    corpus: Arc<Corpus>,
}

impl SourceVerifier {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self { corpus }
    }

    /// First article, in corpus order, whose source occurs in `text`
    ///
    /// Entries after the first match are never inspected, so a malformed
    /// entry only fails the scan if it is reached before a match. An empty
    /// source occurs in every text and therefore always matches.
    pub fn try_verify<'a>(
        &'a self,
        text: &str,
    ) -> Result<Option<(usize, &'a Article)>, VerificationError> {
        for (index, article) in self.corpus.iter().enumerate() {
            let source = article
                .source()
                .ok_or(VerificationError::MalformedEntry { index })?;
            if text.contains(source) {
                debug!("Source {:?} matched corpus entry {}", source, index);
                return Ok(Some((index, article)));
            }
        }
        Ok(None)
    }

    /// Verify `text`; failures become `(false, VERIFICATION_FAILED)`
    pub fn verify(&self, text: &str) -> SourceCheck {
        match self.try_verify(text) {
            Ok(Some((_, article))) => SourceCheck::matched(article.content.clone()),
            Ok(None) => SourceCheck::not_found(),
            Err(e) => {
                error!("Error in source verification: {}", e);
                SourceCheck::failed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::SourceField;
    use pretty_assertions::assert_eq;

    fn verifier(articles: Vec<Article>) -> SourceVerifier {
        SourceVerifier::new(Arc::new(Corpus::from_articles(articles)))
    }

    #[test]
    fn test_first_match_wins() {
        let v = verifier(vec![Article::new("A", "X"), Article::new("B", "Y")]);
        assert_eq!(v.verify("see A and B"), SourceCheck::matched("X"));
        assert_eq!(v.verify("see B and A"), SourceCheck::matched("X"));
        assert_eq!(v.verify("only B here"), SourceCheck::matched("Y"));
    }

    #[test]
    fn test_no_match() {
        let v = verifier(vec![Article::new("aljazeera.net", "X")]);
        let check = v.verify("unrelated text");
        assert!(!check.matched);
        assert_eq!(check.payload, "Source not found in dataset");
    }

    #[test]
    fn test_case_sensitive() {
        let v = verifier(vec![Article::new("aljazeera.net", "X")]);
        assert!(!v.verify("AlJazeera.net reported").matched);
        assert!(v.verify("نقلا عن aljazeera.net").matched);
    }

    #[test]
    fn test_arabic_source_name() {
        let v = verifier(vec![
            Article::new("الجزيرة", "خبر الجزيرة"),
            Article::new("الشروق", "خبر الشروق"),
        ]);
        let check = v.verify("ذكرت صحيفة الشروق أن");
        assert_eq!(check, SourceCheck::matched("خبر الشروق"));
    }

    #[test]
    fn test_missing_source_before_match_fails() {
        let mut broken = Article::new("", "X");
        broken.source = None;
        let v = verifier(vec![broken, Article::new("B", "Y")]);

        assert_eq!(
            v.try_verify("B").unwrap_err(),
            VerificationError::MalformedEntry { index: 0 }
        );
        let check = v.verify("B");
        assert!(!check.matched);
        assert_eq!(check.payload, "Error during source verification");
    }

    #[test]
    fn test_non_string_source_before_match_fails() {
        let mut broken = Article::new("", "X");
        broken.source = Some(SourceField::Invalid(serde_json::json!(42)));
        let v = verifier(vec![Article::new("A", "W"), broken, Article::new("B", "Y")]);

        assert_eq!(v.verify("see A"), SourceCheck::matched("W"));
        assert_eq!(
            v.try_verify("see B").unwrap_err(),
            VerificationError::MalformedEntry { index: 1 }
        );
        assert_eq!(v.verify("see B"), SourceCheck::failed());
    }

    #[test]
    fn test_malformed_entry_after_match_is_not_reached() {
        let mut broken = Article::new("", "Y");
        broken.source = None;
        let v = verifier(vec![Article::new("A", "X"), broken]);
        assert_eq!(v.verify("A"), SourceCheck::matched("X"));
        assert_eq!(v.verify("nothing"), SourceCheck::failed());
    }

    #[test]
    fn test_empty_source_matches_any_text() {
        let v = verifier(vec![Article::new("", "X"), Article::new("B", "Y")]);
        assert_eq!(v.verify("see B"), SourceCheck::matched("X"));
        assert_eq!(v.verify(""), SourceCheck::matched("X"));
    }

    #[test]
    fn test_empty_corpus() {
        let v = verifier(vec![]);
        assert_eq!(v.verify("anything"), SourceCheck::not_found());
    }

    #[test]
    fn test_try_verify_returns_position() {
        let v = verifier(vec![Article::new("A", "X"), Article::new("B", "Y")]);
        let (index, article) = v.try_verify("B").unwrap().unwrap();
        assert_eq!(index, 1);
        assert_eq!(article.content, "Y");
    }

    #[test]
    fn test_serializes_as_pair() {
        let json = serde_json::to_string(&SourceCheck::not_found()).unwrap();
        assert_eq!(json, r#"[false,"Source not found in dataset"]"#);

        let parsed: SourceCheck = serde_json::from_str(r#"[true,"X"]"#).unwrap();
        assert_eq!(parsed, SourceCheck::matched("X"));
    }
}

use serde::{Deserialize, Serialize};

/// The `source` field as stored in the corpus file
///
/// Crawled records occasionally carry a non-string value here. Those are
/// kept as [`SourceField::Invalid`] so the corpus still loads; only the
/// source scan treats them as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceField {
    Name(String),
    Invalid(serde_json::Value),
}

/// One reference article from the trusted corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Outlet or domain identifier, e.g. "aljazeera.net"
    #[serde(default)]
    pub source: Option<SourceField>,
    /// Raw body text as crawled
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Article {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: Some(SourceField::Name(source.into())),
            content: content.into(),
            title: None,
            url: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The source identifier, if the record carries a string one
    ///
    /// An empty string is a valid identifier.
    pub fn source(&self) -> Option<&str> {
        match &self.source {
            Some(SourceField::Name(name)) => Some(name),
            _ => None,
        }
    }
}

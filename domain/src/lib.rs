use chrono::{DateTime, Utc}; // Creation timestamps
use serde::{Deserialize, Serialize}; // Wire shape of documents
use std::fmt;
use thiserror::Error; // For domain-specific errors

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Invalid document id: {0:?}")]
    InvalidId(String),
}

// --- Document ID ---
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Parses a caller-supplied id, rejecting blank input.
    pub fn parse(id: &str) -> Result<Self, DomainError> {
        let id = Self(id.to_string());
        if id.is_blank() {
            return Err(DomainError::InvalidId(id.0));
        }
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace-only ids are the "no id yet" sentinel; `parse`
    /// rejects exactly the same strings.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id.to_string())
    }
}

impl From<DocumentId> for String {
    fn from(doc_id: DocumentId) -> Self {
        doc_id.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Author ---

/// Identity reference embedded in a document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Author {
    pub id: String,
    pub name: String,
}

impl Author {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// --- Document ---

/// A stored record. Every field is optional; `id` stays absent until the
/// document is first saved, and `created` is fixed by the first save.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_author(mut self, author: Author) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// The id if one is set and not blank.
    pub fn assigned_id(&self) -> Option<&DocumentId> {
        self.id.as_ref().filter(|id| !id.is_blank())
    }

    /// The author's id, if the document has an author.
    pub fn author_id(&self) -> Option<&str> {
        self.author.as_ref().map(|author| author.id.as_str())
    }
}

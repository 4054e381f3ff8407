#[cfg(test)]
mod tests;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Kind of content a record holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Webpage,
    Pdf,
    Image,
    Note,
    Bookmark,
    History,
}

impl ContentKind {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Webpage => "webpage",
            ContentKind::Pdf => "pdf",
            ContentKind::Image => "image",
            ContentKind::Note => "note",
            ContentKind::Bookmark => "bookmark",
            ContentKind::History => "history",
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webpage" => Ok(ContentKind::Webpage),
            "pdf" => Ok(ContentKind::Pdf),
            "image" => Ok(ContentKind::Image),
            "note" => Ok(ContentKind::Note),
            "bookmark" => Ok(ContentKind::Bookmark),
            "history" => Ok(ContentKind::History),
            other => Err(format!(
                "unknown content kind '{}' (expected webpage, pdf, image, note, bookmark, or history)",
                other
            )),
        }
    }
}

impl std::fmt::Display for ContentKind {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a record entered the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Manual,
    Extension,
    Api,
}

impl Origin {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Manual => "manual",
            Origin::Extension => "extension",
            Origin::Api => "api",
        }
    }
}

impl std::str::FromStr for Origin {
    type Err = String;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manual" => Ok(Origin::Manual),
            "extension" => Ok(Origin::Extension),
            "api" => Ok(Origin::Api),
            other => Err(format!(
                "unknown origin '{}' (expected manual, extension, or api)",
                other
            )),
        }
    }
}

impl std::fmt::Display for Origin {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_CATEGORY: &str = "General";

/// Canonical content record, the system of record for everything the user
/// has saved. `vector_id` stays empty and `is_indexed` false until the
/// record has been embedded into the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub content_kind: ContentKind,
    pub url: String,
    pub domain: String,
    pub keywords: Vec<String>,
    pub category: String,
    pub origin: Origin,
    pub word_count: i64,
    pub page_count: i64,
    pub vector_id: String,
    pub is_indexed: bool,
    pub date_added: NaiveDateTime,
    pub created_date: NaiveDateTime,
}

/// Fields supplied when creating a record; identifiers, timestamps, and
/// indexing state are filled in by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContentRecord {
    pub title: String,
    pub description: String,
    pub body: String,
    pub content_kind: ContentKind,
    pub url: String,
    pub domain: String,
    pub keywords: Vec<String>,
    pub category: String,
    pub origin: Origin,
    pub word_count: i64,
    pub page_count: i64,
    /// Overrides the addition timestamp, e.g. when importing browser history
    pub date_added: Option<NaiveDateTime>,
}

impl Default for NewContentRecord {
    #[inline]
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            body: String::new(),
            content_kind: ContentKind::Note,
            url: String::new(),
            domain: String::new(),
            keywords: Vec::new(),
            category: DEFAULT_CATEGORY.to_string(),
            origin: Origin::Manual,
            word_count: 0,
            page_count: 0,
            date_added: None,
        }
    }
}

/// Structured filters for the keyword-match query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordFilters {
    pub content_kind: Option<ContentKind>,
    pub category: Option<String>,
}

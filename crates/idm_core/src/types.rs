use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Lifecycle state of an [`Article`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "fetching")]
    Fetching,
    #[serde(rename = "fetched")]
    Fetched,
    #[serde(rename = "fetching failed")]
    FetchingFailed,
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "processed")]
    Processed,
    #[serde(rename = "processing failed")]
    ProcessingFailed,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::New,
        Status::Fetching,
        Status::Fetched,
        Status::FetchingFailed,
        Status::Processing,
        Status::Processed,
        Status::ProcessingFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New => "new",
            Status::Fetching => "fetching",
            Status::Fetched => "fetched",
            Status::FetchingFailed => "fetching failed",
            Status::Processing => "processing",
            Status::Processed => "processed",
            Status::ProcessingFailed => "processing failed",
        }
    }

    /// Whether a record in this state may be fetched (again).
    ///
    /// Only records that were never attempted or whose last attempt failed
    /// are eligible; anything else has already been handled.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Status::New | Status::FetchingFailed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| Error::Storage(format!("Unknown article status: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Pdf,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ContentType::Text),
            "pdf" => Ok(ContentType::Pdf),
            other => Err(Error::Storage(format!("Unknown content type: {}", other))),
        }
    }
}

/// Extracted body of an article together with retrieval metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub retrieval_date: DateTime<Utc>,
    pub content: String,
    pub content_type: ContentType,
}

/// The persistent record of one URL's scrape attempt and outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub status: Status,
    pub domain: Option<String>,
    pub title: Option<String>,
    pub publication_date: Option<NaiveDateTime>,
    pub authors: Vec<String>,
    pub content: Option<Content>,
}

impl Article {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: Status::New,
            domain: None,
            title: None,
            publication_date: None,
            authors: Vec::new(),
            content: None,
        }
    }

    /// Placeholder returned when a PDF could not be retrieved at all.
    pub fn retrieval_failed(url: impl Into<String>) -> Self {
        Self {
            status: Status::FetchingFailed,
            ..Self::new(url)
        }
    }
}

/// Result of the PDF/HTML classification step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A PDF document; `url` is the effective document URL, which can be
    /// the source of an embedding iframe rather than the requested page.
    Pdf { url: String },
    Html { url: String },
}

impl Classification {
    pub fn url(&self) -> &str {
        match self {
            Classification::Pdf { url } | Classification::Html { url } => url,
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Classification::Pdf { .. })
    }
}

/// What a single scrape call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    Scraped(Article),
    /// The URL resolved to a PDF but PDF scraping was disabled.
    Skipped { url: String, pdf_url: String },
}

impl ScrapeOutcome {
    pub fn article(&self) -> Option<&Article> {
        match self {
            ScrapeOutcome::Scraped(article) => Some(article),
            ScrapeOutcome::Skipped { .. } => None,
        }
    }

    pub fn into_article(self) -> Option<Article> {
        match self {
            ScrapeOutcome::Scraped(article) => Some(article),
            ScrapeOutcome::Skipped { .. } => None,
        }
    }
}

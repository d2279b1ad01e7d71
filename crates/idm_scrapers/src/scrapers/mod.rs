use async_trait::async_trait;
use chrono::NaiveDateTime;
use idm_core::Result;

pub mod html;
pub mod jsonld;
pub mod pdf;

pub use html::HtmlExtractor;
pub use pdf::{PdfExtract, PdfTextExtractor};

/// What a content extractor pulled out of one URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    /// False when the download did not succeed; the other fields are then empty.
    pub downloaded: bool,
    pub domain: Option<String>,
    pub title: Option<String>,
    pub publish_date: Option<NaiveDateTime>,
    pub authors: Vec<String>,
    pub text: String,
}

impl Extracted {
    pub fn not_downloaded() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Download a page and extract its article content
    async fn extract(&self, url: &str) -> Result<Extracted>;
}

/// Common utilities for extractors
pub(crate) mod utils {
    use idm_core::{Error, Result};
    use scraper::{ElementRef, Html, Selector};
    use url::Url;

    pub fn parse_url(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))
    }

    /// `scheme://host[:port]` of a URL, the way news sites name their source.
    pub fn source_url(url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        parsed.host_str()?;
        Some(parsed.origin().ascii_serialization())
    }

    pub fn hostname(url: &str) -> Option<String> {
        Url::parse(url).ok()?.host_str().map(str::to_string)
    }

    pub fn selector(css: &str) -> Result<Selector> {
        Selector::parse(css).map_err(|e| Error::Scraping(format!("Invalid selector {}: {}", css, e)))
    }

    pub fn element_text(element: ElementRef<'_>) -> String {
        element.text().collect::<String>().trim().to_string()
    }

    /// Text of the first element matching `css`, if it is non-empty.
    pub fn extract_text(document: &Html, css: &str) -> Result<Option<String>> {
        let selector = selector(css)?;
        Ok(document
            .select(&selector)
            .map(element_text)
            .find(|text| !text.is_empty()))
    }

    pub fn extract_texts(document: &Html, css: &str) -> Result<Vec<String>> {
        let selector = selector(css)?;
        Ok(document
            .select(&selector)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect())
    }

    /// `attr` of the first matching element, if non-empty.
    pub fn extract_attr(document: &Html, css: &str, attr: &str) -> Result<Option<String>> {
        let selector = selector(css)?;
        Ok(document
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty()))
    }

    pub fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        values
            .into_iter()
            .filter(|value| seen.insert(value.to_lowercase()))
            .collect()
    }
}

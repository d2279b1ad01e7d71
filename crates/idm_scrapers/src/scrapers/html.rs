use async_trait::async_trait;
use chrono::NaiveDateTime;
use idm_core::Result;
use scraper::Html;
use std::sync::Arc;
use tracing::debug;

use super::{jsonld, utils, ContentExtractor, Extracted};
use crate::http::HttpClient;
use crate::text::parse_published_date;

const TITLE_SELECTORS: &[(&str, Option<&str>)] = &[
    ("meta[property='og:title']", Some("content")),
    ("title", None),
    ("h1", None),
];

const DATE_SELECTORS: &[&str] = &[
    "meta[property='article:published_time']",
    "meta[name='pubdate']",
    "meta[itemprop='datePublished']",
];

/// Generic news-page extractor built on `scraper` selectors and JSON-LD.
pub struct HtmlExtractor {
    client: Arc<dyn HttpClient>,
}

impl HtmlExtractor {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentExtractor for HtmlExtractor {
    async fn extract(&self, url: &str) -> Result<Extracted> {
        let response = self.client.fetch(url).await?;
        if !response.is_success() {
            debug!(%url, status = response.status, "Page not downloaded");
            return Ok(Extracted::not_downloaded());
        }

        let page_url = if response.url.is_empty() {
            url
        } else {
            response.url.as_str()
        };
        parse_article(page_url, &response.text())
    }
}

/// Pull article metadata and body text out of a downloaded page.
pub fn parse_article(url: &str, html: &str) -> Result<Extracted> {
    let document = Html::parse_document(html);

    Ok(Extracted {
        downloaded: true,
        domain: utils::source_url(url),
        title: extract_title(&document)?,
        publish_date: extract_publish_date(&document)?,
        authors: extract_authors(&document)?,
        text: extract_body(&document)?,
    })
}

fn extract_title(document: &Html) -> Result<Option<String>> {
    for (css, attr) in TITLE_SELECTORS {
        let found = match attr {
            Some(attr) => utils::extract_attr(document, css, attr)?,
            None => utils::extract_text(document, css)?,
        };
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

fn extract_authors(document: &Html) -> Result<Vec<String>> {
    let mut authors = jsonld::extract_authors(document);

    if authors.is_empty() {
        authors = utils::extract_attr(document, "meta[name='author']", "content")?
            .map(|author| vec![author])
            .unwrap_or_default();
    }
    if authors.is_empty() {
        authors = utils::extract_texts(document, "[rel='author']")?;
    }

    Ok(utils::dedup_preserving_order(authors))
}

fn extract_publish_date(document: &Html) -> Result<Option<NaiveDateTime>> {
    if let Some(date) = jsonld::extract_date_published(document).and_then(|d| parse_published_date(&d)) {
        return Ok(Some(date));
    }

    for css in DATE_SELECTORS {
        if let Some(raw) = utils::extract_attr(document, css, "content")? {
            if let Some(date) = parse_published_date(&raw) {
                return Ok(Some(date));
            }
        }
    }
    Ok(None)
}

fn extract_body(document: &Html) -> Result<String> {
    let mut paragraphs = utils::extract_texts(document, "article p")?;
    if paragraphs.is_empty() {
        paragraphs = utils::extract_texts(document, "body p")?;
    }
    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use chrono::NaiveDate;
    use idm_core::Error;
    use std::collections::HashMap;

    const PAGE: &str = r#"
        <html>
        <head>
            <title>Fallback title</title>
            <meta property="og:title" content="Floods displace thousands">
            <meta name="author" content="Meta Author">
            <script type="application/ld+json">
                {"@type": "NewsArticle",
                 "author": [{"name": "Jane Doe"}, {"name": "jane doe"}, {"name": "John Roe"}],
                 "datePublished": "2024-03-05T10:30:00Z"}
            </script>
        </head>
        <body>
            <p>Subscribe to our newsletter</p>
            <article>
                <h1>Floods displace thousands</h1>
                <p>First paragraph.</p>
                <p>Second&nbsp;paragraph.</p>
            </article>
        </body>
        </html>
    "#;

    struct StaticClient {
        response: HttpResponse,
    }

    #[async_trait]
    impl HttpClient for StaticClient {
        async fn fetch(&self, _url: &str) -> Result<HttpResponse> {
            Ok(self.response.clone())
        }
    }

    struct FailingClient;

    #[async_trait]
    impl HttpClient for FailingClient {
        async fn fetch(&self, url: &str) -> Result<HttpResponse> {
            Err(Error::Scraping(format!("connection refused: {}", url)))
        }
    }

    #[test]
    fn test_parse_article() {
        let extracted = parse_article("https://news.example.com/2024/03/floods", PAGE).unwrap();

        assert!(extracted.downloaded);
        assert_eq!(extracted.domain.as_deref(), Some("https://news.example.com"));
        assert_eq!(extracted.title.as_deref(), Some("Floods displace thousands"));
        assert_eq!(extracted.authors, vec!["Jane Doe", "John Roe"]);
        assert_eq!(
            extracted.publish_date,
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(10, 30, 0)
        );
        assert_eq!(extracted.text, "First paragraph.\nSecond\u{a0}paragraph.");
    }

    #[test]
    fn test_parse_article_fallbacks() {
        let page = r#"
            <html>
            <head>
                <title> Plain title </title>
                <meta name="pubdate" content="2023-11-20">
            </head>
            <body>
                <a rel="author" href="/staff/ann">Ann Poe</a>
                <p>Only paragraph.</p>
            </body>
            </html>
        "#;
        let extracted = parse_article("http://example.org/story", page).unwrap();

        assert_eq!(extracted.title.as_deref(), Some("Plain title"));
        assert_eq!(extracted.authors, vec!["Ann Poe"]);
        assert_eq!(
            extracted.publish_date,
            NaiveDate::from_ymd_opt(2023, 11, 20).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(extracted.text, "Only paragraph.");
    }

    #[test]
    fn test_parse_article_meta_author() {
        let page = r#"<html><head><meta name="author" content="Meta Author"></head><body></body></html>"#;
        let extracted = parse_article("http://example.org/", page).unwrap();

        assert_eq!(extracted.authors, vec!["Meta Author"]);
        assert_eq!(extracted.title, None);
        assert_eq!(extracted.publish_date, None);
        assert!(extracted.text.is_empty());
    }

    #[tokio::test]
    async fn test_extract_uses_final_url() {
        let extractor = HtmlExtractor::new(Arc::new(StaticClient {
            response: HttpResponse {
                status: 200,
                url: "https://www.example.com/final".to_string(),
                headers: HashMap::new(),
                body: PAGE.as_bytes().to_vec(),
            },
        }));

        let extracted = extractor.extract("http://short.link/abc").await.unwrap();
        assert!(extracted.downloaded);
        assert_eq!(extracted.domain.as_deref(), Some("https://www.example.com"));
    }

    #[tokio::test]
    async fn test_extract_not_downloaded_on_error_status() {
        let extractor = HtmlExtractor::new(Arc::new(StaticClient {
            response: HttpResponse {
                status: 404,
                url: "https://example.com/missing".to_string(),
                headers: HashMap::new(),
                body: b"<p>Not found</p>".to_vec(),
            },
        }));

        let extracted = extractor.extract("https://example.com/missing").await.unwrap();
        assert_eq!(extracted, Extracted::not_downloaded());
    }

    #[tokio::test]
    async fn test_extract_propagates_network_errors() {
        let extractor = HtmlExtractor::new(Arc::new(FailingClient));
        assert!(extractor.extract("https://example.com/").await.is_err());
    }
}

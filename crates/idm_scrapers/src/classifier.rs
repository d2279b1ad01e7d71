use idm_core::{Classification, Error, Result};
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ProbeFailurePolicy;
use crate::http::HttpClient;
use crate::scrapers::utils;

pub fn has_pdf_extension(url: &str) -> bool {
    url.ends_with(".pdf")
}

/// `src` of every iframe on the page that points at an absolute http(s) URL.
pub fn iframe_sources(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = utils::selector("iframe[src]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .filter(|src| src.contains("http"))
        .map(str::to_string)
        .collect()
}

/// Decides whether a URL points at a PDF document or an HTML page.
pub struct Classifier {
    client: Arc<dyn HttpClient>,
    policy: ProbeFailurePolicy,
}

impl Classifier {
    pub fn new(client: Arc<dyn HttpClient>, policy: ProbeFailurePolicy) -> Self {
        Self { client, policy }
    }

    pub async fn classify(&self, url: &str) -> Result<Classification> {
        if has_pdf_extension(url) {
            debug!(%url, "PDF by extension");
            return Ok(Classification::Pdf { url: url.to_string() });
        }

        let response = match self.client.probe(url).await {
            Ok(response) => response,
            Err(e) => return self.probe_failed(url, e),
        };
        if response.is_pdf() {
            debug!(%url, "PDF by content type");
            return Ok(Classification::Pdf { url: url.to_string() });
        }

        for src in iframe_sources(&response.text()) {
            match self.is_pdf(&src).await {
                Ok(true) => {
                    debug!(%url, iframe = %src, "PDF embedded in iframe");
                    return Ok(Classification::Pdf { url: src });
                }
                Ok(false) => {}
                Err(e) => match self.policy {
                    ProbeFailurePolicy::FailOpen => {
                        warn!(%url, iframe = %src, error = %e, "Skipping iframe that could not be probed");
                    }
                    ProbeFailurePolicy::FailClosed => {
                        return Err(Error::Classification(format!("{}: iframe {}: {}", url, src, e)));
                    }
                },
            }
        }

        Ok(Classification::Html { url: url.to_string() })
    }

    async fn is_pdf(&self, url: &str) -> Result<bool> {
        if has_pdf_extension(url) {
            return Ok(true);
        }
        Ok(self.client.probe(url).await?.is_pdf())
    }

    fn probe_failed(&self, url: &str, error: Error) -> Result<Classification> {
        match self.policy {
            ProbeFailurePolicy::FailOpen => {
                warn!(%url, %error, "Probe failed, treating as HTML");
                Ok(Classification::Html { url: url.to_string() })
            }
            ProbeFailurePolicy::FailClosed => Err(Error::Classification(format!("{}: {}", url, error))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockHttp {
        responses: HashMap<String, HttpResponse>,
        calls: Mutex<Vec<String>>,
    }

    impl MockHttp {
        fn with_page(mut self, url: &str, content_type: &str, body: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                HttpResponse {
                    status: 200,
                    url: url.to_string(),
                    headers: HashMap::from([("content-type".to_string(), content_type.to_string())]),
                    body: body.as_bytes().to_vec(),
                },
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttp {
        async fn fetch(&self, url: &str) -> Result<HttpResponse> {
            self.calls.lock().unwrap().push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Scraping(format!("connection refused: {}", url)))
        }
    }

    fn classifier(http: Arc<MockHttp>, policy: ProbeFailurePolicy) -> Classifier {
        Classifier::new(http, policy)
    }

    #[test]
    fn test_has_pdf_extension() {
        assert!(has_pdf_extension("http://example.com/report.pdf"));
        assert!(!has_pdf_extension("http://example.com/report.PDF"));
        assert!(!has_pdf_extension("http://example.com/report.pdf?download=1"));
    }

    #[test]
    fn test_iframe_sources() {
        let html = r#"
            <iframe src="/relative/embed"></iframe>
            <iframe src="https://docs.example.com/viewer?file=a"></iframe>
            <iframe></iframe>
        "#;
        assert_eq!(iframe_sources(html), vec!["https://docs.example.com/viewer?file=a"]);
    }

    #[tokio::test]
    async fn test_pdf_extension_needs_no_network() {
        let http = Arc::new(MockHttp::default());
        let result = classifier(http.clone(), ProbeFailurePolicy::FailOpen)
            .classify("http://example.com/report.pdf")
            .await
            .unwrap();

        assert_eq!(
            result,
            Classification::Pdf { url: "http://example.com/report.pdf".to_string() }
        );
        assert!(http.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pdf_by_content_type() {
        let http = Arc::new(MockHttp::default().with_page(
            "http://example.com/download?id=7",
            "application/pdf",
            "%PDF-1.4",
        ));
        let result = classifier(http, ProbeFailurePolicy::FailOpen)
            .classify("http://example.com/download?id=7")
            .await
            .unwrap();

        assert!(result.is_pdf());
        assert_eq!(result.url(), "http://example.com/download?id=7");
    }

    /// Serves PDF headers without a body from `probe`; full downloads fail.
    struct HeadersOnly;

    #[async_trait]
    impl HttpClient for HeadersOnly {
        async fn fetch(&self, url: &str) -> Result<HttpResponse> {
            Err(Error::Scraping(format!("body download not expected: {}", url)))
        }

        async fn probe(&self, url: &str) -> Result<HttpResponse> {
            Ok(HttpResponse {
                status: 200,
                url: url.to_string(),
                headers: HashMap::from([("content-type".to_string(), "application/pdf".to_string())]),
                body: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_content_type_check_does_not_download_body() {
        let result = Classifier::new(Arc::new(HeadersOnly), ProbeFailurePolicy::FailClosed)
            .classify("http://example.com/download?id=7")
            .await
            .unwrap();

        assert_eq!(
            result,
            Classification::Pdf { url: "http://example.com/download?id=7".to_string() }
        );
    }

    #[tokio::test]
    async fn test_pdf_inside_iframe() {
        let http = Arc::new(MockHttp::default().with_page(
            "http://example.com/page",
            "text/html",
            r#"<html><body><iframe src="http://x/doc.pdf"></iframe></body></html>"#,
        ));
        let result = classifier(http.clone(), ProbeFailurePolicy::FailOpen)
            .classify("http://example.com/page")
            .await
            .unwrap();

        assert_eq!(result, Classification::Pdf { url: "http://x/doc.pdf".to_string() });
        assert_eq!(http.calls(), vec!["http://example.com/page"]);
    }

    #[tokio::test]
    async fn test_iframe_probed_by_content_type() {
        let http = Arc::new(
            MockHttp::default()
                .with_page(
                    "http://example.com/page",
                    "text/html",
                    r#"<iframe src="http://example.com/ad"></iframe><iframe src="http://example.com/embed?doc=1"></iframe>"#,
                )
                .with_page("http://example.com/ad", "text/html", "<p>ad</p>")
                .with_page("http://example.com/embed?doc=1", "application/pdf", "%PDF"),
        );
        let result = classifier(http, ProbeFailurePolicy::FailOpen)
            .classify("http://example.com/page")
            .await
            .unwrap();

        assert_eq!(
            result,
            Classification::Pdf { url: "http://example.com/embed?doc=1".to_string() }
        );
    }

    #[tokio::test]
    async fn test_plain_page_is_html() {
        let http = Arc::new(MockHttp::default().with_page(
            "http://example.com/news",
            "text/html; charset=utf-8",
            "<p>Hello</p>",
        ));
        let result = classifier(http, ProbeFailurePolicy::FailOpen)
            .classify("http://example.com/news")
            .await
            .unwrap();

        assert_eq!(result, Classification::Html { url: "http://example.com/news".to_string() });
    }

    #[tokio::test]
    async fn test_probe_failure_policies() {
        let http = Arc::new(MockHttp::default());

        let open = classifier(http.clone(), ProbeFailurePolicy::FailOpen)
            .classify("http://unreachable.example/")
            .await
            .unwrap();
        assert_eq!(open, Classification::Html { url: "http://unreachable.example/".to_string() });

        let closed = classifier(http, ProbeFailurePolicy::FailClosed)
            .classify("http://unreachable.example/")
            .await;
        assert!(matches!(closed, Err(Error::Classification(_))));
    }

    #[tokio::test]
    async fn test_failing_iframe_probe() {
        let page = || {
            MockHttp::default().with_page(
                "http://example.com/page",
                "text/html",
                r#"<iframe src="http://gone.example/embed"></iframe>"#,
            )
        };

        let open = classifier(Arc::new(page()), ProbeFailurePolicy::FailOpen)
            .classify("http://example.com/page")
            .await
            .unwrap();
        assert_eq!(open, Classification::Html { url: "http://example.com/page".to_string() });

        let closed = classifier(Arc::new(page()), ProbeFailurePolicy::FailClosed)
            .classify("http://example.com/page")
            .await;
        assert!(matches!(closed, Err(Error::Classification(_))));
    }
}

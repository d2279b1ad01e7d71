use async_trait::async_trait;
use idm_core::Result;
use std::collections::HashMap;
use tracing::debug;

use crate::config::ScraperConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// URL the response was served from, after redirects.
    pub url: String,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Content type is exactly `application/pdf`.
    pub fn is_pdf(&self) -> bool {
        self.header("content-type") == Some(PDF_CONTENT_TYPE)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// MIME type that marks a response as a PDF document.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL. Non-2xx statuses are returned, not raised.
    async fn fetch(&self, url: &str) -> Result<HttpResponse>;

    /// GET a URL to find out what it serves. The body of a PDF response may
    /// be left unread, so callers must not rely on it.
    async fn probe(&self, url: &str) -> Result<HttpResponse> {
        self.fetch(url).await
    }
}

pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl ReqwestClient {
    async fn get(&self, url: &str, read_pdf_body: bool) -> Result<HttpResponse> {
        let response = self.client.get(url).send().await?;
        let mut head = HttpResponse {
            status: response.status().as_u16(),
            url: response.url().to_string(),
            headers: response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
                })
                .collect(),
            body: Vec::new(),
        };

        if !read_pdf_body && head.is_pdf() {
            debug!(%url, status = head.status, "PDF response, body not read");
            return Ok(head);
        }
        head.body = response.bytes().await?.to_vec();
        debug!(%url, status = head.status, bytes = head.body.len(), "Fetched");
        Ok(head)
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn fetch(&self, url: &str) -> Result<HttpResponse> {
        self.get(url, true).await
    }

    async fn probe(&self, url: &str) -> Result<HttpResponse> {
        self.get(url, false).await
    }
}

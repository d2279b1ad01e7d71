use chrono::Utc;
use idm_core::{
    Article, ArticleStore, Classification, Content, ContentType, Error, Result, ScrapeOutcome, Status,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, info, instrument, warn};

use crate::classifier::Classifier;
use crate::config::ScraperConfig;
use crate::http::{HttpClient, ReqwestClient};
use crate::scrapers::pdf::download_pdf;
use crate::scrapers::{utils, ContentExtractor, HtmlExtractor, PdfExtract, PdfTextExtractor};
use crate::text::{parse_http_date, remove_newline};

/// Ties classification, extraction and record keeping together, one URL at a time.
pub struct ScraperManager {
    storage: Arc<dyn ArticleStore>,
    client: Arc<dyn HttpClient>,
    extractor: Arc<dyn ContentExtractor>,
    pdf_extractor: Arc<dyn PdfTextExtractor>,
    classifier: Classifier,
    config: ScraperConfig,
    url_locks: StdMutex<HashMap<String, Arc<TokioMutex<()>>>>,
}

impl ScraperManager {
    pub fn new(storage: Arc<dyn ArticleStore>, config: ScraperConfig) -> Result<Self> {
        let client: Arc<dyn HttpClient> = Arc::new(ReqwestClient::new(&config)?);
        let extractor = Arc::new(HtmlExtractor::new(client.clone()));
        Ok(Self::with_collaborators(
            storage,
            client,
            extractor,
            Arc::new(PdfExtract),
            config,
        ))
    }

    pub fn with_collaborators(
        storage: Arc<dyn ArticleStore>,
        client: Arc<dyn HttpClient>,
        extractor: Arc<dyn ContentExtractor>,
        pdf_extractor: Arc<dyn PdfTextExtractor>,
        config: ScraperConfig,
    ) -> Self {
        let classifier = Classifier::new(client.clone(), config.probe_failures);
        Self {
            storage,
            client,
            extractor,
            pdf_extractor,
            classifier,
            config,
            url_locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn storage(&self) -> &Arc<dyn ArticleStore> {
        &self.storage
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Scrape one URL, dispatching to the PDF or HTML path.
    #[instrument(skip(self))]
    pub async fn scrape(&self, url: &str, scrape_pdfs: bool) -> Result<ScrapeOutcome> {
        utils::parse_url(url)?;

        let lock = self.url_lock(url);
        let outcome = {
            let _guard = lock.lock().await;
            self.scrape_exclusive(url, scrape_pdfs).await
        };
        self.release_url_lock(url, &lock);
        outcome
    }

    async fn scrape_exclusive(&self, url: &str, scrape_pdfs: bool) -> Result<ScrapeOutcome> {
        if let Some(existing) = self.storage.find_by_url(url).await? {
            if !existing.status.is_retryable() {
                debug!(%url, status = %existing.status, "Already handled, not fetching again");
                return Ok(ScrapeOutcome::Scraped(existing));
            }
        }

        match self.classifier.classify(url).await? {
            Classification::Pdf { url: pdf_url } if scrape_pdfs => {
                Ok(ScrapeOutcome::Scraped(self.extract_pdf(&pdf_url).await?))
            }
            Classification::Pdf { url: pdf_url } => {
                info!(%url, %pdf_url, "Skipping PDF, PDF scraping is disabled");
                Ok(ScrapeOutcome::Skipped {
                    url: url.to_string(),
                    pdf_url,
                })
            }
            Classification::Html { url } => Ok(ScrapeOutcome::Scraped(self.extract_html(&url).await?)),
        }
    }

    /// Scrape each URL in turn. Failures are logged and returned alongside
    /// the URL; they never stop the loop.
    pub async fn scrape_many(
        &self,
        urls: &[String],
        scrape_pdfs: bool,
    ) -> Vec<(String, Result<ScrapeOutcome>)> {
        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            let result = self.scrape(url, scrape_pdfs).await;
            if let Err(e) = &result {
                warn!(%url, error = %e, "Scrape failed");
            }
            results.push((url.clone(), result));
        }
        results
    }

    /// Re-scrape every stored article whose last attempt failed.
    #[instrument(skip(self))]
    pub async fn retry_failed(
        &self,
        scrape_pdfs: bool,
    ) -> Result<Vec<(String, Result<ScrapeOutcome>)>> {
        let urls: Vec<String> = self
            .storage
            .get_by_status(Status::FetchingFailed)
            .await?
            .into_iter()
            .map(|article| article.url)
            .collect();
        info!(count = urls.len(), "Retrying failed articles");
        Ok(self.scrape_many(&urls, scrape_pdfs).await)
    }

    /// HTML path: drives the stored record through Fetching to Fetched or
    /// FetchingFailed.
    #[instrument(skip(self))]
    pub async fn extract_html(&self, url: &str) -> Result<Article> {
        let mut article = match self.storage.find_by_url(url).await? {
            Some(existing) if !existing.status.is_retryable() => {
                debug!(%url, status = %existing.status, "Already handled, not fetching again");
                return Ok(existing);
            }
            Some(existing) => existing,
            None => {
                let article = Article::new(url);
                self.storage.insert(&article).await?;
                article
            }
        };

        article.status = Status::Fetching;
        self.storage.insert(&article).await?;
        self.storage.commit().await?;

        match self.attempt_fetch(&article).await {
            Ok(fetched) => Ok(fetched),
            Err(e) => {
                warn!(%url, error = %e, "Fetching failed");
                self.storage.rollback().await?;
                article.status = Status::FetchingFailed;
                self.storage.insert(&article).await?;
                self.storage.commit().await?;
                Ok(article)
            }
        }
    }

    async fn attempt_fetch(&self, article: &Article) -> Result<Article> {
        let extracted = self.extractor.extract(&article.url).await?;
        let mut article = article.clone();

        if extracted.downloaded {
            article.domain = extracted.domain;
            article.title = extracted.title;
            article.publication_date = extracted.publish_date;
            article.authors = extracted.authors;
            article.content = Some(Content {
                retrieval_date: Utc::now(),
                content: remove_newline(&extracted.text),
                content_type: ContentType::Text,
            });
            article.status = Status::Fetched;
            info!(url = %article.url, "Fetched");
        } else {
            info!(url = %article.url, "Page could not be downloaded");
            article.status = Status::FetchingFailed;
        }

        self.storage.insert(&article).await?;
        self.storage.commit().await?;
        Ok(article)
    }

    /// PDF path: download and convert. Never touches the store; any failure
    /// yields a `FetchingFailed` placeholder.
    #[instrument(skip(self))]
    pub async fn extract_pdf(&self, url: &str) -> Result<Article> {
        let download = match download_pdf(self.client.as_ref(), url, &self.config.scratch_dir).await {
            Ok(Some(download)) => download,
            Ok(None) => return Ok(Article::retrieval_failed(url)),
            Err(e) => {
                warn!(%url, error = %e, "Could not store PDF");
                return Ok(Article::retrieval_failed(url));
            }
        };

        let extractor = Arc::clone(&self.pdf_extractor);
        let path = download.path().to_path_buf();
        let converted = tokio::task::spawn_blocking(move || extractor.extract_text(&path))
            .await
            .map_err(|e| Error::Pdf(format!("conversion task failed: {}", e)))
            .and_then(|result| result);

        let text = match converted {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!(%url, "PDF contains no text");
                return Ok(Article::retrieval_failed(url));
            }
            Err(e) => {
                warn!(%url, error = %e, "PDF conversion failed");
                return Ok(Article::retrieval_failed(url));
            }
        };

        let publication_date = download.last_modified.as_deref().and_then(parse_http_date);
        drop(download);
        info!(%url, chars = text.len(), "Fetched PDF");

        Ok(Article {
            url: url.to_string(),
            status: Status::Fetched,
            domain: utils::hostname(url),
            title: None,
            publication_date,
            authors: Vec::new(),
            content: Some(Content {
                retrieval_date: Utc::now(),
                content: remove_newline(&text),
                content_type: ContentType::Pdf,
            }),
        })
    }

    fn url_lock(&self, url: &str) -> Arc<TokioMutex<()>> {
        let mut locks = self.url_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(url.to_string()).or_default().clone()
    }

    fn release_url_lock(&self, url: &str, lock: &Arc<TokioMutex<()>>) {
        let mut locks = self.url_locks.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map and this caller still hold it.
        if Arc::strong_count(lock) == 2 {
            locks.remove(url);
        }
    }
}

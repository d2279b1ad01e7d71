pub mod classifier;
pub mod cli;
pub mod config;
pub mod http;
pub mod logging;
pub mod manager;
pub mod scrapers;
pub mod text;

pub use classifier::Classifier;
pub use cli::{handle_command, ScraperArgs, ScraperCommands};
pub use config::{ProbeFailurePolicy, ScraperConfig};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use manager::ScraperManager;
pub use scrapers::{ContentExtractor, Extracted, HtmlExtractor, PdfExtract, PdfTextExtractor};

pub mod prelude {
    pub use super::manager::ScraperManager;
    pub use super::scrapers::ContentExtractor;
    pub use idm_core::{Article, Error, Result, ScrapeOutcome, Status};
}

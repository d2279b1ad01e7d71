use clap::{Args, Subcommand};
use idm_core::{Article, Error, Result, ScrapeOutcome, Status};

use crate::manager::ScraperManager;

#[derive(Args, Debug)]
pub struct ScraperArgs {
    #[command(subcommand)]
    pub command: ScraperCommands,
}

#[derive(Subcommand, Debug)]
pub enum ScraperCommands {
    /// Scrape one or more URLs
    Scrape {
        /// URLs of pages or PDF documents
        #[arg(required = true)]
        urls: Vec<String>,
        /// Skip URLs that resolve to a PDF
        #[arg(long)]
        no_pdfs: bool,
    },
    /// Print the stored record for a URL as JSON
    Show {
        url: String,
    },
    /// List stored records
    List {
        /// Only records in this state (e.g. "fetched", "fetching-failed")
        #[arg(long)]
        status: Option<String>,
    },
    /// Scrape again every record whose last attempt failed
    Retry {
        #[arg(long)]
        no_pdfs: bool,
    },
}

pub async fn handle_command(args: ScraperArgs, manager: &ScraperManager) -> Result<()> {
    match args.command {
        ScraperCommands::Scrape { urls, no_pdfs } => {
            let results = manager.scrape_many(&urls, !no_pdfs).await;
            print_results(&results);
        }
        ScraperCommands::Show { url } => {
            let article = manager
                .storage()
                .find_by_url(&url)
                .await?
                .ok_or_else(|| Error::Storage(format!("No article stored for {}", url)))?;
            println!("{}", serde_json::to_string_pretty(&article)?);
        }
        ScraperCommands::List { status } => {
            let statuses = match status {
                Some(status) => vec![status.parse::<Status>()?],
                None => Status::ALL.to_vec(),
            };
            let mut count = 0;
            for status in statuses {
                for article in manager.storage().get_by_status(status).await? {
                    println!("{}", article_line(&article));
                    count += 1;
                }
            }
            println!("{} article(s)", count);
        }
        ScraperCommands::Retry { no_pdfs } => {
            let results = manager.retry_failed(!no_pdfs).await?;
            if results.is_empty() {
                println!("Nothing to retry");
            }
            print_results(&results);
        }
    }
    Ok(())
}

fn print_results(results: &[(String, Result<ScrapeOutcome>)]) {
    for (url, result) in results {
        match result {
            Ok(outcome) => println!("{}", outcome_line(outcome)),
            Err(e) => eprintln!("error  {}  {}", url, e),
        }
    }
}

fn article_line(article: &Article) -> String {
    format!(
        "{}  {}  {}",
        article.status,
        article.url,
        article.title.as_deref().unwrap_or("-")
    )
}

fn outcome_line(outcome: &ScrapeOutcome) -> String {
    match outcome {
        ScrapeOutcome::Scraped(article) => article_line(article),
        ScrapeOutcome::Skipped { url, pdf_url } => format!("skipped  {}  {}", url, pdf_url),
    }
}

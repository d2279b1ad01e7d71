use idm_core::{Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::http::HttpClient;

/// Converts a PDF file on disk to plain text. Implementations may block.
pub trait PdfTextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Thin wrapper over the `pdf-extract` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtract;

impl PdfTextExtractor for PdfExtract {
    fn extract_text(&self, path: &Path) -> Result<String> {
        pdf_extract::extract_text(path)
            .map_err(|e| Error::Pdf(format!("{}: {}", path.display(), e)))
    }
}

/// A downloaded PDF. The scratch file is removed when this is dropped.
#[derive(Debug)]
pub struct PdfDownload {
    file: NamedTempFile,
    pub last_modified: Option<String>,
}

impl PdfDownload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Download `url` into a fresh scratch file under `scratch_dir`.
///
/// Returns `Ok(None)` when the request fails or the server answers with a
/// non-2xx status; only local file errors are returned as `Err`.
pub async fn download_pdf(
    client: &dyn HttpClient,
    url: &str,
    scratch_dir: &Path,
) -> Result<Option<PdfDownload>> {
    let response = match client.fetch(url).await {
        Ok(response) => response,
        Err(e) => {
            warn!(%url, error = %e, "PDF download failed");
            return Ok(None);
        }
    };
    if !response.is_success() {
        warn!(%url, status = response.status, "PDF download returned an error status");
        return Ok(None);
    }

    std::fs::create_dir_all(scratch_dir)?;
    let mut file = tempfile::Builder::new()
        .prefix("idm-")
        .suffix(".pdf")
        .tempfile_in(scratch_dir)?;
    file.write_all(&response.body)?;
    file.flush()?;
    debug!(%url, path = %file.path().display(), bytes = response.body.len(), "PDF saved");

    Ok(Some(PdfDownload {
        file,
        last_modified: response.header("last-modified").map(str::to_string),
    }))
}

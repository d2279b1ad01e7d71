use idm_core::{ArticleStore, Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub mod backends;

pub use backends::*;

/// Database file used by the SQLite backend when no location is given.
pub const DEFAULT_DATABASE: &str = "articles.db";

/// Names accepted by [`create_store`].
pub fn available_backends() -> Vec<&'static str> {
    let mut backends = vec!["memory"];
    if cfg!(feature = "sqlite") {
        backends.push("sqlite");
    }
    backends
}

/// Build the article store selected on the command line.
///
/// `location` is only meaningful for file-backed stores; SQLite falls back
/// to [`DEFAULT_DATABASE`] when it is `None`.
pub async fn create_store(kind: &str, location: Option<&Path>) -> Result<Arc<dyn ArticleStore>> {
    match kind {
        "memory" => {
            if let Some(path) = location {
                debug!(path = %path.display(), "Memory store ignores the storage location");
            }
            Ok(Arc::new(InMemoryStorage::new()))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = location.unwrap_or_else(|| Path::new(DEFAULT_DATABASE));
            Ok(Arc::new(SQLiteStorage::new_with_path(path).await?))
        }
        other => Err(Error::Storage(format!(
            "Unknown storage backend '{}' (available: {})",
            other,
            available_backends().join(", ")
        ))),
    }
}

pub mod prelude {
    pub use super::{available_backends, create_store, DEFAULT_DATABASE};
    pub use super::backends::*;
}

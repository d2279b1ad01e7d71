use async_trait::async_trait;
use crate::types::{Article, Status};
use crate::Result;

/// Session-style access to the article records.
///
/// `insert` only stages a change; nothing is visible to other sessions
/// until `commit`. `rollback` discards whatever was staged since the last
/// commit. Lookups see staged changes first.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Find the article recorded for a URL
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>>;

    /// Stage an insert or update of an article, keyed by its URL
    async fn insert(&self, article: &Article) -> Result<()>;

    /// Persist everything staged
    async fn commit(&self) -> Result<()>;

    /// Drop everything staged
    async fn rollback(&self) -> Result<()>;

    /// Get all committed articles in a given state
    async fn get_by_status(&self, status: Status) -> Result<Vec<Article>>;
}

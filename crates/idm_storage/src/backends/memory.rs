use async_trait::async_trait;
use idm_core::{Article, ArticleStore, Result, Status};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: HashMap<String, Article>,
    committed_order: Vec<String>,
    staged: HashMap<String, Article>,
}

impl MemoryStore {
    pub fn find_by_url(&self, url: &str) -> Option<Article> {
        self.staged
            .get(url)
            .or_else(|| self.committed.get(url))
            .cloned()
    }

    pub fn stage(&mut self, article: &Article) {
        self.staged.insert(article.url.clone(), article.clone());
    }

    pub fn commit(&mut self) {
        for (url, article) in self.staged.drain() {
            if !self.committed.contains_key(&url) {
                self.committed_order.push(url.clone());
            }
            self.committed.insert(url, article);
        }
    }

    pub fn rollback(&mut self) {
        self.staged.clear();
    }

    pub fn get_by_status(&self, status: Status) -> Vec<Article> {
        self.committed_order
            .iter()
            .filter_map(|url| self.committed.get(url))
            .filter(|article| article.status == status)
            .cloned()
            .collect()
    }
}

/// Process-local article store, lost on exit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for InMemoryStorage {
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.find_by_url(url))
    }

    async fn insert(&self, article: &Article) -> Result<()> {
        let mut store = self.store.write().await;
        store.stage(article);
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let mut store = self.store.write().await;
        store.commit();
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut store = self.store.write().await;
        store.rollback();
        Ok(())
    }

    async fn get_by_status(&self, status: Status) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.get_by_status(status))
    }
}

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use idm_core::{Article, ArticleStore, Content, ContentType, Error, Result, Status};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY,
        url TEXT NOT NULL UNIQUE,
        status TEXT NOT NULL,
        domain TEXT,
        title TEXT,
        publication_date TEXT,
        authors TEXT NOT NULL DEFAULT '[]'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS content (
        id INTEGER PRIMARY KEY,
        article_url TEXT NOT NULL UNIQUE REFERENCES articles(url) ON DELETE CASCADE,
        retrieval_date TEXT NOT NULL,
        content TEXT NOT NULL,
        content_type TEXT NOT NULL CHECK(content_type IN ('text', 'pdf'))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_status ON articles(status)",
];

const SELECT_ARTICLES: &str = r#"
    SELECT a.url, a.status, a.domain, a.title, a.publication_date, a.authors,
           c.retrieval_date, c.content, c.content_type
    FROM articles a
    LEFT JOIN content c ON c.article_url = a.url
"#;

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    staged: Mutex<HashMap<String, Article>>,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }
        debug!(path = %db_path.display(), "SQLite article store ready");

        Ok(Self {
            pool: Arc::new(pool),
            staged: Mutex::new(HashMap::new()),
        })
    }

    async fn write_article(
        conn: &mut sqlx::SqliteConnection,
        article: &Article,
        authors: String,
    ) -> std::result::Result<(), sqlx::Error> {
        let publication_date = article
            .publication_date
            .map(|date| date.format(DATE_FORMAT).to_string());

        sqlx::query(
            r#"
            INSERT INTO articles (url, status, domain, title, publication_date, authors)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                status = excluded.status,
                domain = excluded.domain,
                title = excluded.title,
                publication_date = excluded.publication_date,
                authors = excluded.authors
            "#,
        )
        .bind(&article.url)
        .bind(article.status.as_str())
        .bind(article.domain.as_deref())
        .bind(article.title.as_deref())
        .bind(publication_date)
        .bind(authors)
        .execute(&mut *conn)
        .await?;

        match &article.content {
            Some(content) => {
                sqlx::query(
                    r#"
                    INSERT INTO content (article_url, retrieval_date, content, content_type)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT(article_url) DO UPDATE SET
                        retrieval_date = excluded.retrieval_date,
                        content = excluded.content,
                        content_type = excluded.content_type
                    "#,
                )
                .bind(&article.url)
                .bind(content.retrieval_date.to_rfc3339())
                .bind(&content.content)
                .bind(content.content_type.as_str())
                .execute(&mut *conn)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM content WHERE article_url = ?")
                    .bind(&article.url)
                    .execute(&mut *conn)
                    .await?;
            }
        }

        Ok(())
    }
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let get_err = |e: sqlx::Error| Error::Database(format!("Failed to read article row: {}", e));

    let status: String = row.try_get("status").map_err(get_err)?;
    let authors: String = row.try_get("authors").map_err(get_err)?;
    let publication_date: Option<String> = row.try_get("publication_date").map_err(get_err)?;

    let content = match row.try_get::<Option<String>, _>("content").map_err(get_err)? {
        Some(text) => {
            let retrieval_date: String = row.try_get("retrieval_date").map_err(get_err)?;
            let content_type: String = row.try_get("content_type").map_err(get_err)?;
            Some(Content {
                retrieval_date: DateTime::parse_from_rfc3339(&retrieval_date)
                    .map_err(|e| Error::Database(format!("Failed to parse date: {}", e)))?
                    .with_timezone(&Utc),
                content: text,
                content_type: content_type.parse::<ContentType>()?,
            })
        }
        None => None,
    };

    Ok(Article {
        url: row.try_get("url").map_err(get_err)?,
        status: status.parse::<Status>()?,
        domain: row.try_get("domain").map_err(get_err)?,
        title: row.try_get("title").map_err(get_err)?,
        publication_date: publication_date
            .map(|date| NaiveDateTime::parse_from_str(&date, DATE_FORMAT))
            .transpose()
            .map_err(|e| Error::Database(format!("Failed to parse date: {}", e)))?,
        authors: serde_json::from_str(&authors)?,
        content,
    })
}

#[async_trait]
impl ArticleStore for SQLiteStorage {
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        if let Some(article) = self.staged.lock().await.get(url) {
            return Ok(Some(article.clone()));
        }

        let row = sqlx::query(&format!("{} WHERE a.url = ?", SELECT_ARTICLES))
            .bind(url)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to find article: {}", e)))?;

        row.as_ref().map(row_to_article).transpose()
    }

    async fn insert(&self, article: &Article) -> Result<()> {
        self.staged.lock().await.insert(article.url.clone(), article.clone());
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let mut staged = self.staged.lock().await;
        if staged.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))?;
        for article in staged.values() {
            let authors = serde_json::to_string(&article.authors)?;
            Self::write_article(&mut *tx, article, authors)
                .await
                .map_err(|e| Error::Database(format!("Failed to store article {}: {}", article.url, e)))?;
        }
        tx.commit()
            .await
            .map_err(|e| Error::Database(format!("Failed to commit transaction: {}", e)))?;

        debug!(count = staged.len(), "Committed staged articles");
        staged.clear();
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.staged.lock().await.clear();
        Ok(())
    }

    async fn get_by_status(&self, status: Status) -> Result<Vec<Article>> {
        let rows = sqlx::query(&format!("{} WHERE a.status = ? ORDER BY a.id", SELECT_ARTICLES))
            .bind(status.as_str())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to get articles by status: {}", e)))?;

        rows.iter().map(row_to_article).collect()
    }
}

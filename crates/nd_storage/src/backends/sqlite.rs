use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use nd_core::config::StorageConfig;
use nd_core::{
    Article, ArticlePatch, ArticleStorage, Category, Comment, CommentStorage, Error, NewArticle,
    NewComment, Result,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite};

use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        source TEXT NOT NULL,
        category TEXT NOT NULL,
        summary TEXT NOT NULL,
        extended_summary TEXT NOT NULL DEFAULT '',
        published_at TEXT NOT NULL,
        created_at TEXT NOT NULL,
        author TEXT,
        image TEXT,
        country TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_category ON articles (category)",
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        article_id INTEGER NOT NULL REFERENCES articles (id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        username TEXT NOT NULL DEFAULT 'Anonymous',
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_comments_article ON comments (article_id)",
    // Add future migrations here
];

const ARTICLE_COLUMNS: &str = "id, title, url, source, category, summary, extended_summary, \
     published_at, created_at, author, image, country";

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn name() -> &'static str {
        "sqlite"
    }

    fn get_error_message() -> &'static str {
        "SQLite database path should be writable (storage.path)"
    }

    async fn open(config: &StorageConfig) -> Result<Self> {
        Self::new_with_path(&config.path).await
    }
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
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| db_err("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| db_err(&format!("Failed to run migration {}", i), e))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

fn db_err(context: &str, e: sqlx::Error) -> Error {
    Error::Database(format!("{}: {}", context, e))
}

/// Fixed-width UTC timestamps so that text ordering is time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("Failed to parse date '{}': {}", raw, e)))
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| db_err(&format!("Failed to read column {}", name), e))
}

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    let category: String = column(row, "category")?;
    let published_at: String = column(row, "published_at")?;
    let created_at: String = column(row, "created_at")?;

    Ok(Article {
        id: column(row, "id")?,
        title: column(row, "title")?,
        url: column(row, "url")?,
        source: column(row, "source")?,
        category: category.parse::<Category>()?,
        summary: column(row, "summary")?,
        extended_summary: column(row, "extended_summary")?,
        published_at: parse_timestamp(&published_at)?,
        created_at: parse_timestamp(&created_at)?,
        author: column(row, "author")?,
        image: column(row, "image")?,
        country: column(row, "country")?,
    })
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment> {
    let created_at: String = column(row, "created_at")?;
    Ok(Comment {
        id: column(row, "id")?,
        article_id: column(row, "article_id")?,
        content: column(row, "content")?,
        username: column(row, "username")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn insert_article(&self, article: &NewArticle) -> Result<Article> {
        let created_at = Utc::now().trunc_subsecs(6);
        let result = sqlx::query(
            r#"
            INSERT INTO articles
            (title, url, source, category, summary, extended_summary,
             published_at, created_at, author, image, country)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.title)
        .bind(&article.url)
        .bind(&article.source)
        .bind(article.category.as_str())
        .bind(&article.summary)
        .bind(&article.extended_summary)
        .bind(format_timestamp(&article.published_at))
        .bind(format_timestamp(&created_at))
        .bind(article.author.as_deref())
        .bind(article.image.as_deref())
        .bind(article.country.as_deref())
        .execute(&*self.pool)
        .await;

        match result {
            Ok(done) => {
                let mut stored =
                    Article::from_new(done.last_insert_rowid(), article.clone(), created_at);
                // Match what a later read returns.
                stored.published_at = stored.published_at.trunc_subsecs(6);
                Ok(stored)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(Error::Duplicate(article.url.clone()))
            }
            Err(e) => Err(db_err("Failed to store article", e)),
        }
    }

    async fn article_exists(&self, url: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM articles WHERE url = ? LIMIT 1")
            .bind(url)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_err("Failed to look up article", e))?;
        Ok(row.is_some())
    }

    async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let row = sqlx::query(&format!("SELECT {} FROM articles WHERE id = ?", ARTICLE_COLUMNS))
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_err("Failed to get article", e))?;
        row.as_ref().map(article_from_row).transpose()
    }

    async fn list_articles(&self, category: Option<Category>) -> Result<Vec<Article>> {
        let rows = match category {
            Some(category) => {
                sqlx::query(&format!(
                    "SELECT {} FROM articles WHERE category = ? \
                     ORDER BY published_at DESC, id DESC",
                    ARTICLE_COLUMNS
                ))
                .bind(category.as_str())
                .fetch_all(&*self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM articles ORDER BY published_at DESC, id DESC",
                    ARTICLE_COLUMNS
                ))
                .fetch_all(&*self.pool)
                .await
            }
        }
        .map_err(|e| db_err("Failed to list articles", e))?;

        rows.iter().map(article_from_row).collect()
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT DISTINCT category FROM articles")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| db_err("Failed to list categories", e))?;

        let mut categories = rows
            .iter()
            .map(|row| column::<String>(row, "category")?.parse::<Category>())
            .collect::<Result<Vec<_>>>()?;
        categories.sort();
        Ok(categories)
    }

    async fn articles_missing_extended_summary(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM articles WHERE extended_summary = '' ORDER BY id",
            ARTICLE_COLUMNS
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| db_err("Failed to list articles without extended summary", e))?;

        rows.iter().map(article_from_row).collect()
    }

    async fn update_article(&self, id: i64, patch: &ArticlePatch) -> Result<Article> {
        let mut article = self
            .get_article(id)
            .await?
            .ok_or_else(|| Error::NotFound("Article not found".to_string()))?;
        patch.apply(&mut article);

        sqlx::query(
            r#"
            UPDATE articles
            SET title = ?, source = ?, category = ?, summary = ?, extended_summary = ?,
                author = ?, image = ?, country = ?
            WHERE id = ?
            "#,
        )
        .bind(&article.title)
        .bind(&article.source)
        .bind(article.category.as_str())
        .bind(&article.summary)
        .bind(&article.extended_summary)
        .bind(article.author.as_deref())
        .bind(article.image.as_deref())
        .bind(article.country.as_deref())
        .bind(id)
        .execute(&*self.pool)
        .await
        .map_err(|e| db_err("Failed to update article", e))?;

        Ok(article)
    }

    async fn delete_article(&self, id: i64) -> Result<bool> {
        let done = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(|e| db_err("Failed to delete article", e))?;
        Ok(done.rows_affected() > 0)
    }
}

#[async_trait]
impl CommentStorage for SQLiteStorage {
    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment> {
        if self.get_article(comment.article_id).await?.is_none() {
            return Err(Error::NotFound("Article not found".to_string()));
        }

        let created_at = Utc::now().trunc_subsecs(6);
        let result = sqlx::query(
            "INSERT INTO comments (article_id, content, username, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(comment.article_id)
        .bind(&comment.content)
        .bind(&comment.username)
        .bind(format_timestamp(&created_at))
        .execute(&*self.pool)
        .await;

        match result {
            Ok(done) => Ok(Comment {
                id: done.last_insert_rowid(),
                article_id: comment.article_id,
                content: comment.content.clone(),
                username: comment.username.clone(),
                created_at,
            }),
            // The article was deleted between the check and the insert.
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(Error::NotFound("Article not found".to_string()))
            }
            Err(e) => Err(db_err("Failed to store comment", e)),
        }
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, article_id, content, username, created_at FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| db_err("Failed to get comment", e))?;
        row.as_ref().map(comment_from_row).transpose()
    }

    async fn list_comments(&self, article_id: Option<i64>) -> Result<Vec<Comment>> {
        let rows = match article_id {
            Some(article_id) => {
                sqlx::query(
                    "SELECT id, article_id, content, username, created_at FROM comments \
                     WHERE article_id = ? ORDER BY created_at DESC, id DESC",
                )
                .bind(article_id)
                .fetch_all(&*self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, article_id, content, username, created_at FROM comments \
                     ORDER BY created_at DESC, id DESC",
                )
                .fetch_all(&*self.pool)
                .await
            }
        }
        .map_err(|e| db_err("Failed to list comments", e))?;

        rows.iter().map(comment_from_row).collect()
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        let done = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(|e| db_err("Failed to delete comment", e))?;
        Ok(done.rows_affected() > 0)
    }
}

use async_trait::async_trait;

use crate::types::{Article, ArticlePatch, Category, Comment, NewArticle, NewComment};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Store a new article. Fails with `Error::Duplicate` if the url is already stored.
    async fn insert_article(&self, article: &NewArticle) -> Result<Article>;

    /// True if an article with this url is stored
    async fn article_exists(&self, url: &str) -> Result<bool>;

    async fn get_article(&self, id: i64) -> Result<Option<Article>>;

    /// Articles newest first, optionally restricted to one category
    async fn list_articles(&self, category: Option<Category>) -> Result<Vec<Article>>;

    /// Distinct categories present in storage
    async fn categories(&self) -> Result<Vec<Category>>;

    /// Articles whose extended summary is still empty
    async fn articles_missing_extended_summary(&self) -> Result<Vec<Article>>;

    /// Apply a partial update. Fails with `Error::NotFound` for unknown ids.
    async fn update_article(&self, id: i64, patch: &ArticlePatch) -> Result<Article>;

    /// Delete an article and its comments. Returns false if nothing was deleted.
    async fn delete_article(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait CommentStorage: Send + Sync {
    /// Store a comment. Fails with `Error::NotFound` when the article does not exist.
    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment>;

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments newest first, optionally restricted to one article
    async fn list_comments(&self, article_id: Option<i64>) -> Result<Vec<Comment>>;

    async fn delete_comment(&self, id: i64) -> Result<bool>;
}

/// Everything the web layer and jobs need from a backend.
pub trait NewsStorage: ArticleStorage + CommentStorage {}

impl<T: ArticleStorage + CommentStorage> NewsStorage for T {}

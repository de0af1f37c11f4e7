use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use nd_core::config::StorageConfig;
use nd_core::{
    Article, ArticlePatch, ArticleStorage, Category, Comment, CommentStorage, Error, NewArticle,
    NewComment, Result,
};
use tokio::sync::RwLock;

use crate::StorageBackend;

#[derive(Debug, Default)]
struct MemoryStore {
    articles: Vec<Article>,
    comments: Vec<Comment>,
    last_article_id: i64,
    last_comment_id: i64,
}

impl MemoryStore {
    fn insert_article(&mut self, article: &NewArticle) -> Result<Article> {
        if self.articles.iter().any(|a| a.url == article.url) {
            return Err(Error::Duplicate(article.url.clone()));
        }
        self.last_article_id += 1;
        let stored = Article::from_new(self.last_article_id, article.clone(), Utc::now());
        self.articles.push(stored.clone());
        Ok(stored)
    }

    fn insert_comment(&mut self, comment: &NewComment) -> Result<Comment> {
        if !self.articles.iter().any(|a| a.id == comment.article_id) {
            return Err(Error::NotFound("Article not found".to_string()));
        }
        self.last_comment_id += 1;
        let stored = Comment {
            id: self.last_comment_id,
            article_id: comment.article_id,
            content: comment.content.clone(),
            username: comment.username.clone(),
            created_at: Utc::now(),
        };
        self.comments.push(stored.clone());
        Ok(stored)
    }

    fn newest_first(mut articles: Vec<Article>) -> Vec<Article> {
        articles.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        articles
    }
}

/// Process-local storage; everything is lost on exit.
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
impl StorageBackend for InMemoryStorage {
    fn name() -> &'static str {
        "memory"
    }

    fn get_error_message() -> &'static str {
        "Memory storage should always be available"
    }

    async fn open(_config: &StorageConfig) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn insert_article(&self, article: &NewArticle) -> Result<Article> {
        let mut store = self.store.write().await;
        store.insert_article(article)
    }

    async fn article_exists(&self, url: &str) -> Result<bool> {
        let store = self.store.read().await;
        Ok(store.articles.iter().any(|a| a.url == url))
    }

    async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn list_articles(&self, category: Option<Category>) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        let articles = store
            .articles
            .iter()
            .filter(|a| category.map_or(true, |c| a.category == c))
            .cloned()
            .collect();
        Ok(MemoryStore::newest_first(articles))
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let store = self.store.read().await;
        let mut categories: Vec<Category> = store.articles.iter().map(|a| a.category).collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn articles_missing_extended_summary(&self) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        let mut articles: Vec<Article> = store
            .articles
            .iter()
            .filter(|a| a.needs_extended_summary())
            .cloned()
            .collect();
        articles.sort_by_key(|a| a.id);
        Ok(articles)
    }

    async fn update_article(&self, id: i64, patch: &ArticlePatch) -> Result<Article> {
        let mut store = self.store.write().await;
        let article = store
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound("Article not found".to_string()))?;
        patch.apply(article);
        Ok(article.clone())
    }

    async fn delete_article(&self, id: i64) -> Result<bool> {
        let mut store = self.store.write().await;
        let before = store.articles.len();
        store.articles.retain(|a| a.id != id);
        let deleted = store.articles.len() != before;
        if deleted {
            store.comments.retain(|c| c.article_id != id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl CommentStorage for InMemoryStorage {
    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment> {
        let mut store = self.store.write().await;
        store.insert_comment(comment)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let store = self.store.read().await;
        Ok(store.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_comments(&self, article_id: Option<i64>) -> Result<Vec<Comment>> {
        let store = self.store.read().await;
        let mut comments: Vec<Comment> = store
            .comments
            .iter()
            .filter(|c| article_id.map_or(true, |id| c.article_id == id))
            .cloned()
            .collect();
        comments.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(comments)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        let mut store = self.store.write().await;
        let before = store.comments.len();
        store.comments.retain(|c| c.id != id);
        Ok(store.comments.len() != before)
    }
}

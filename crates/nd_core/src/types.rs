use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Username stored when a comment is posted without one.
pub const ANONYMOUS_USERNAME: &str = "Anonymous";

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_SOURCE_CHARS: usize = 100;
const MAX_USERNAME_CHARS: usize = 50;
const MAX_COUNTRY_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    General,
    Business,
    Technology,
    Science,
    Health,
    Sports,
    Entertainment,
}

impl Category {
    /// Every category the upstream API knows about, in ingestion order.
    pub const ALL: [Category; 7] = [
        Category::General,
        Category::Business,
        Category::Technology,
        Category::Science,
        Category::Health,
        Category::Sports,
        Category::Entertainment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Business => "business",
            Category::Technology => "technology",
            Category::Science => "science",
            Category::Health => "health",
            Category::Sports => "sports",
            Category::Entertainment => "entertainment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| Error::Validation(format!("Unknown category: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub source: String,
    pub category: Category,
    pub summary: String,
    pub extended_summary: String,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub author: Option<String>,
    pub image: Option<String>,
    pub country: Option<String>,
}

impl Article {
    pub fn from_new(id: i64, article: NewArticle, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: article.title,
            url: article.url,
            source: article.source,
            category: article.category,
            summary: article.summary,
            extended_summary: article.extended_summary,
            published_at: article.published_at,
            created_at,
            author: article.author,
            image: article.image,
            country: article.country,
        }
    }

    pub fn needs_extended_summary(&self) -> bool {
        self.extended_summary.is_empty()
    }
}

/// An article that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub category: Category,
    pub summary: String,
    #[serde(default)]
    pub extended_summary: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl NewArticle {
    pub fn validate(&self) -> Result<()> {
        validate_url("url", &self.url)?;
        validate_len("title", &self.title, MAX_TITLE_CHARS)?;
        validate_len("source", &self.source, MAX_SOURCE_CHARS)?;
        if let Some(image) = &self.image {
            validate_url("image", image)?;
        }
        if let Some(country) = &self.country {
            validate_len("country", country, MAX_COUNTRY_CHARS)?;
        }
        Ok(())
    }
}

/// Partial update of an article. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub source: Option<String>,
    pub category: Option<Category>,
    pub summary: Option<String>,
    pub extended_summary: Option<String>,
    pub author: Option<String>,
    pub image: Option<String>,
    pub country: Option<String>,
}

impl ArticlePatch {
    pub fn extended_summary(text: impl Into<String>) -> Self {
        Self {
            extended_summary: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_len("title", title, MAX_TITLE_CHARS)?;
        }
        if let Some(source) = &self.source {
            validate_len("source", source, MAX_SOURCE_CHARS)?;
        }
        if let Some(image) = &self.image {
            validate_url("image", image)?;
        }
        if let Some(country) = &self.country {
            validate_len("country", country, MAX_COUNTRY_CHARS)?;
        }
        Ok(())
    }

    pub fn apply(&self, article: &mut Article) {
        if let Some(title) = &self.title {
            article.title = title.clone();
        }
        if let Some(source) = &self.source {
            article.source = source.clone();
        }
        if let Some(category) = self.category {
            article.category = category;
        }
        if let Some(summary) = &self.summary {
            article.summary = summary.clone();
        }
        if let Some(extended_summary) = &self.extended_summary {
            article.extended_summary = extended_summary.clone();
        }
        if let Some(author) = &self.author {
            article.author = Some(author.clone());
        }
        if let Some(image) = &self.image {
            article.image = Some(image.clone());
        }
        if let Some(country) = &self.country {
            article.country = Some(country.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub article_id: i64,
    pub content: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A validated comment: content trimmed and non-empty, username defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub article_id: i64,
    pub content: String,
    pub username: String,
}

impl NewComment {
    pub fn new(article_id: i64, content: &str, username: Option<&str>) -> Result<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Validation("Comment content is required".to_string()));
        }

        let username = match username.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => ANONYMOUS_USERNAME,
        };
        validate_len("username", username, MAX_USERNAME_CHARS)?;

        Ok(Self {
            article_id,
            content: content.to_string(),
            username: username.to_string(),
        })
    }
}

fn validate_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let parsed = Url::parse(value.trim())
        .map_err(|e| Error::InvalidUrl(format!("{} '{}': {}", field, value, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::InvalidUrl(format!(
            "{} '{}': unsupported scheme {}",
            field, value, scheme
        ))),
    }
}

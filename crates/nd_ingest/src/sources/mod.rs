use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nd_core::types::{MAX_SOURCE_CHARS, MAX_TITLE_CHARS};
use nd_core::{Category, Error, NewArticle, Result, SummaryInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod mediastack;

/// Somewhere articles can be pulled from, one category at a time.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Returns the name of the news source
    fn name(&self) -> &str;

    /// Fetches the latest raw items for a single category.
    ///
    /// An error here means the whole category could not be read. Items are
    /// returned undecoded so one malformed entry cannot sink the rest; see
    /// [`ApiArticle::from_value`].
    async fn fetch_category(&self, category: Category) -> Result<Vec<Value>>;
}

/// One item as the upstream API returns it. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiArticle {
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

impl ApiArticle {
    /// Decodes one raw item. Wrongly typed fields are an error for this item only.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::Validation(format!("malformed article: {}", e)))
    }

    /// The trimmed url, if there is one.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// A fetched item that passed validation and is ready to be summarized and
/// stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleCandidate {
    pub title: String,
    pub url: String,
    pub source: String,
    pub category: Category,
    pub description: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub author: Option<String>,
    pub image: Option<String>,
    pub country: Option<String>,
}

impl ArticleCandidate {
    /// Maps a raw item onto the article shape.
    ///
    /// The url and publication date are required. Missing text fields fall
    /// back to empty strings, a missing source to "Unknown". Over-long titles
    /// and sources are cut rather than rejected.
    pub fn from_api(item: ApiArticle, category: Category) -> Result<Self> {
        let url = item
            .url()
            .ok_or_else(|| Error::Validation("item has no url".to_string()))?
            .to_string();
        let published_at = match non_blank(item.published_at) {
            Some(raw) => parse_published_at(&raw)?,
            None => {
                return Err(Error::Validation(format!("{} has no published_at", url)));
            }
        };

        let candidate = Self {
            title: truncate_chars(item.title.unwrap_or_default().trim(), MAX_TITLE_CHARS),
            source: truncate_chars(
                non_blank(item.source).as_deref().unwrap_or("Unknown"),
                MAX_SOURCE_CHARS,
            ),
            category,
            description: item.description.unwrap_or_default(),
            content: item.content.unwrap_or_default(),
            published_at,
            author: non_blank(item.author),
            image: non_blank(item.image),
            country: non_blank(item.country).map(|c| c.to_lowercase()),
            url,
        };
        candidate.to_new_article(String::new()).validate()?;
        Ok(candidate)
    }

    pub fn summary_input(&self) -> SummaryInput {
        SummaryInput::new(self.description.clone(), self.content.clone())
    }

    pub fn to_new_article(&self, extended_summary: String) -> NewArticle {
        NewArticle {
            title: self.title.clone(),
            url: self.url.clone(),
            source: self.source.clone(),
            category: self.category,
            summary: self.description.clone(),
            extended_summary,
            published_at: self.published_at,
            author: self.author.clone(),
            image: self.image.clone(),
            country: self.country.clone(),
        }
    }
}

/// Accepts RFC 3339 as well as the `+0000` offset form Mediastack sends.
pub fn parse_published_at(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Validation(format!("invalid published_at '{}': {}", raw, e)))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item() -> ApiArticle {
        ApiArticle {
            title: Some("Frogs found".to_string()),
            url: Some(" https://news.test/frogs ".to_string()),
            description: Some("A new frog.".to_string()),
            published_at: Some("2024-11-06T10:58:00+00:00".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_published_at_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 11, 6, 10, 58, 0).unwrap();
        assert_eq!(parse_published_at("2024-11-06T10:58:00+00:00").unwrap(), expected);
        assert_eq!(parse_published_at("2024-11-06T10:58:00+0000").unwrap(), expected);
        assert_eq!(parse_published_at("2024-11-06T12:58:00+02:00").unwrap(), expected);
        assert!(parse_published_at("yesterday").is_err());
    }

    #[test]
    fn test_candidate_defaults() {
        let candidate = ArticleCandidate::from_api(item(), Category::Science).unwrap();
        assert_eq!(candidate.url, "https://news.test/frogs");
        assert_eq!(candidate.source, "Unknown");
        assert_eq!(candidate.content, "");
        assert_eq!(candidate.author, None);

        let article = candidate.to_new_article("Extended.".to_string());
        assert_eq!(article.summary, "A new frog.");
        assert_eq!(article.extended_summary, "Extended.");
        assert_eq!(article.category, Category::Science);
    }

    #[test]
    fn test_candidate_rejects_missing_fields() {
        let mut no_url = item();
        no_url.url = Some("  ".to_string());
        assert!(ArticleCandidate::from_api(no_url, Category::General).is_err());

        let mut no_date = item();
        no_date.published_at = None;
        assert!(ArticleCandidate::from_api(no_date, Category::General).is_err());

        let mut bad_url = item();
        bad_url.url = Some("ftp://news.test/frogs".to_string());
        assert!(ArticleCandidate::from_api(bad_url, Category::General).is_err());
    }

    #[test]
    fn test_long_title_is_cut() {
        let mut long = item();
        long.title = Some("é".repeat(250));
        let candidate = ArticleCandidate::from_api(long, Category::General).unwrap();
        assert_eq!(candidate.title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_deserialize_with_nulls() {
        let raw = r#"{"author":null,"title":"T","url":"https://x.test/a","source":null,
                      "published_at":"2024-11-06T10:58:00+00:00","extra":1}"#;
        let parsed: ApiArticle = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.author, None);
        assert_eq!(parsed.url(), Some("https://x.test/a"));
    }

    #[test]
    fn test_from_value_rejects_wrong_types() {
        let err = ApiArticle::from_value(serde_json::json!({
            "url": "https://x.test/b",
            "published_at": 1730890680
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("malformed article"));

        let ok = ApiArticle::from_value(serde_json::json!({"title": "T"})).unwrap();
        assert_eq!(ok.title.as_deref(), Some("T"));
    }
}

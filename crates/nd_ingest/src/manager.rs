use std::sync::Arc;

use nd_core::{ArticleStorage, Category, Logger, NewsStorage, Result, Summarizer};
use serde::Serialize;
use serde_json::Value;

use crate::sources::{ApiArticle, ArticleCandidate, NewsSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryError {
    pub category: Category,
    pub message: String,
}

/// What a single ingestion cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub created: usize,
    /// Items whose url was already stored.
    pub skipped: usize,
    /// Items that could not be mapped or stored.
    pub failed: usize,
    /// Created items whose extended summary is the plain description.
    pub fallbacks: usize,
    pub category_errors: Vec<CategoryError>,
}

impl IngestReport {
    pub fn merge(&mut self, other: IngestReport) {
        self.created += other.created;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.fallbacks += other.fallbacks;
        self.category_errors.extend(other.category_errors);
    }

    /// True when every one of `attempted` categories failed to fetch.
    pub fn all_categories_failed(&self, attempted: usize) -> bool {
        attempted > 0 && self.category_errors.len() >= attempted
    }
}

enum ItemStatus {
    Created { fallback: bool },
    Skipped,
}

/// Pulls articles from a [`NewsSource`], attaches extended summaries and
/// stores the ones not seen before.
pub struct IngestManager {
    storage: Arc<dyn NewsStorage>,
    summarizer: Arc<dyn Summarizer>,
    source: Arc<dyn NewsSource>,
    categories: Vec<Category>,
    logger: Logger,
}

impl IngestManager {
    pub fn new(
        storage: Arc<dyn NewsStorage>,
        summarizer: Arc<dyn Summarizer>,
        source: Arc<dyn NewsSource>,
        logger: Logger,
    ) -> Self {
        Self {
            storage,
            summarizer,
            source,
            categories: Category::ALL.to_vec(),
            logger: logger.with_prefix("[ingest]"),
        }
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Runs one cycle over the configured categories.
    pub async fn run_cycle(&self) -> IngestReport {
        self.run_categories(&self.categories).await
    }

    /// Runs one cycle over `categories`. A category that cannot be fetched is
    /// recorded in the report and the rest still run.
    pub async fn run_categories(&self, categories: &[Category]) -> IngestReport {
        let mut report = IngestReport::default();
        for &category in categories {
            match self.source.fetch_category(category).await {
                Ok(items) => {
                    let category_report = self.ingest_items(category, items).await;
                    self.logger.info(&format!(
                        "{}: {} created, {} skipped, {} failed",
                        category,
                        category_report.created,
                        category_report.skipped,
                        category_report.failed
                    ));
                    report.merge(category_report);
                }
                Err(e) => {
                    self.logger
                        .error(&format!("Error fetching {} news: {}", category, e));
                    report.category_errors.push(CategoryError {
                        category,
                        message: e.to_string(),
                    });
                }
            }
        }
        report
    }

    async fn ingest_items(&self, category: Category, items: Vec<Value>) -> IngestReport {
        let mut report = IngestReport::default();
        for item in items {
            let label = item
                .get("url")
                .and_then(Value::as_str)
                .unwrap_or("<no url>")
                .to_string();
            match self.ingest_item(category, item).await {
                Ok(ItemStatus::Created { fallback }) => {
                    report.created += 1;
                    if fallback {
                        report.fallbacks += 1;
                    }
                }
                Ok(ItemStatus::Skipped) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    self.logger
                        .warn(&format!("Error creating article {}: {}", label, e));
                }
            }
        }
        report
    }

    async fn ingest_item(&self, category: Category, item: Value) -> Result<ItemStatus> {
        let item = ApiArticle::from_value(item)?;
        if let Some(url) = item.url() {
            if self.storage.article_exists(url).await? {
                return Ok(ItemStatus::Skipped);
            }
        }

        let candidate = ArticleCandidate::from_api(item, category)?;
        let outcome = self.summarizer.summarize(&candidate.summary_input());
        let fallback = outcome.is_fallback();
        let stored = self
            .storage
            .insert_article(&candidate.to_new_article(outcome.into_text()))
            .await?;
        self.logger.debug(&format!("stored article {} ({})", stored.id, stored.url));
        Ok(ItemStatus::Created { fallback })
    }
}

use std::io::Write;
use std::sync::Arc;

use clap::Subcommand;
use nd_core::config::MediastackConfig;
use nd_core::{ArticleStorage, Category, Error, Logger, NewsStorage, Result, Summarizer};

use crate::backfill::backfill_extended_summaries;
use crate::manager::IngestManager;
use crate::sources::mediastack::MediastackClient;

#[derive(Subcommand, Debug, Clone)]
pub enum IngestCommands {
    /// Fetch the latest articles from Mediastack
    Fetch {
        /// Only fetch these categories (repeatable); defaults to the configured list
        #[arg(long = "category", value_name = "CATEGORY")]
        categories: Vec<Category>,
    },
    /// Generate extended summaries for stored articles that have none
    Backfill,
    /// List the categories and how many articles each one holds
    Categories,
}

/// Everything an ingest command may need.
pub struct IngestContext {
    pub storage: Arc<dyn NewsStorage>,
    pub summarizer: Arc<dyn Summarizer>,
    pub mediastack: MediastackConfig,
    pub logger: Logger,
}

impl IngestContext {
    /// Builds the Mediastack-backed manager; fails when no access key is set.
    pub fn manager(&self) -> Result<IngestManager> {
        let client = MediastackClient::new(&self.mediastack)?;
        Ok(IngestManager::new(
            self.storage.clone(),
            self.summarizer.clone(),
            Arc::new(client),
            self.logger.clone(),
        )
        .with_categories(self.mediastack.categories.clone()))
    }
}

pub async fn handle_command<W: Write + Send>(
    command: &IngestCommands,
    ctx: &IngestContext,
    out: &mut W,
) -> Result<()> {
    match command {
        IngestCommands::Fetch { categories } => {
            let manager = ctx.manager()?;
            let categories = if categories.is_empty() {
                manager.categories().to_vec()
            } else {
                categories.clone()
            };

            let report = manager.run_categories(&categories).await;
            writeln!(
                out,
                "🆕 {} created  ⏭️ {} skipped  ❌ {} failed  ↩️ {} fallbacks",
                report.created, report.skipped, report.failed, report.fallbacks
            )?;
            for error in &report.category_errors {
                writeln!(out, "Error fetching {} news: {}", error.category, error.message)?;
            }
            if report.all_categories_failed(categories.len()) {
                return Err(Error::Upstream(format!(
                    "all {} categories failed to fetch",
                    categories.len()
                )));
            }
        }
        IngestCommands::Backfill => {
            let report = backfill_extended_summaries(
                ctx.storage.as_ref(),
                ctx.summarizer.as_ref(),
                &ctx.logger,
                out,
            )
            .await?;
            if report.failed > 0 {
                ctx.logger.warn(&format!(
                    "{} of {} articles could not be updated",
                    report.failed, report.total
                ));
            }
        }
        IngestCommands::Categories => {
            for category in Category::ALL {
                let count = ctx.storage.list_articles(Some(category)).await?.len();
                let marker = if ctx.mediastack.categories.contains(&category) {
                    "*"
                } else {
                    " "
                };
                writeln!(out, "{} {:<14} {}", marker, category.as_str(), count)?;
            }
        }
    }
    Ok(())
}

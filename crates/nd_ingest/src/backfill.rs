use std::io::Write;

use nd_core::{ArticlePatch, ArticleStorage, Logger, NewsStorage, Result, Summarizer, SummaryInput};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    pub fallbacks: usize,
}

/// Fills in `extended_summary` for every stored article that has none,
/// working from the stored description alone.
///
/// Progress goes to `out`. A failing article is reported and skipped; only
/// failing to list the articles aborts the run.
pub async fn backfill_extended_summaries<W: Write + Send>(
    storage: &dyn NewsStorage,
    summarizer: &dyn Summarizer,
    logger: &Logger,
    out: &mut W,
) -> Result<BackfillReport> {
    let logger = logger.with_prefix("[backfill]");
    let articles = storage.articles_missing_extended_summary().await?;
    let mut report = BackfillReport {
        total: articles.len(),
        ..Default::default()
    };

    writeln!(
        out,
        "Generating extended summaries for {} articles...",
        report.total
    )?;

    for (i, article) in articles.iter().enumerate() {
        let input = SummaryInput::description_only(article.summary.clone());
        let outcome = summarizer.summarize(&input);
        let fallback = outcome.is_fallback();
        let patch = ArticlePatch::extended_summary(outcome.into_text());

        match storage.update_article(article.id, &patch).await {
            Ok(_) => {
                report.processed += 1;
                if fallback {
                    report.fallbacks += 1;
                }
                writeln!(out, "Processed {}/{} articles", i + 1, report.total)?;
            }
            Err(e) => {
                report.failed += 1;
                logger.error(&format!("article {}: {}", article.id, e));
                writeln!(out, "Error processing article {}: {}", article.id, e)?;
            }
        }
    }

    writeln!(out, "Successfully generated extended summaries")?;
    Ok(report)
}

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use nd_core::config::SummaryConfig;
use nd_core::{Logger, Summarizer, SummaryInput, SummaryOutcome};

use crate::segment::{SegmentError, SentenceSplitter, UnicodeSentenceSplitter};

/// Number of whitespace-delimited tokens.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Builds extended summaries out of whole sentences.
///
/// Sentences of `description + " " + content` are taken in order. A sentence
/// is kept when it still fits under `max_words`, otherwise skipped, and the
/// walk stops as soon as `min_words` is reached. The result is the first
/// order-preserving selection under that rule, not the best-fitting one; a
/// short late sentence can be kept after a long earlier one was skipped.
#[derive(Debug, Clone)]
pub struct SummaryGenerator {
    splitter: Arc<dyn SentenceSplitter>,
    config: SummaryConfig,
    logger: Logger,
}

impl Default for SummaryGenerator {
    fn default() -> Self {
        Self::new(SummaryConfig::default(), Logger::new())
    }
}

impl SummaryGenerator {
    pub fn new(config: SummaryConfig, logger: Logger) -> Self {
        Self {
            splitter: Arc::new(UnicodeSentenceSplitter::default()),
            config,
            logger: logger.with_prefix("[summary]"),
        }
    }

    pub fn with_splitter(mut self, splitter: Arc<dyn SentenceSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn config(&self) -> SummaryConfig {
        self.config
    }

    pub fn generate(&self, input: &SummaryInput) -> SummaryOutcome {
        match self.assemble(&input.full_text()) {
            Ok(text) => SummaryOutcome::Generated(text),
            Err(e) => {
                self.logger.warn(&format!(
                    "falling back to the original description: {}",
                    e
                ));
                SummaryOutcome::Fallback {
                    description: input.description.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }

    fn assemble(&self, full_text: &str) -> Result<String, SegmentError> {
        let sentences = panic::catch_unwind(AssertUnwindSafe(|| self.splitter.split(full_text)))
            .map_err(|payload| SegmentError::Failed(panic_message(payload.as_ref())))??;

        let mut word_count = 0usize;
        let mut included: Vec<&str> = Vec::new();
        for sentence in &sentences {
            let sentence_words = count_words(sentence);
            if word_count + sentence_words > self.config.max_words {
                continue;
            }
            included.push(sentence);
            word_count += sentence_words;
            if word_count >= self.config.min_words {
                break;
            }
        }

        tracing::debug!(
            sentences = sentences.len(),
            kept = included.len(),
            words = word_count,
            "assembled extended summary"
        );
        Ok(included.join(" "))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("splitter panicked: {}", detail)
}

impl Summarizer for SummaryGenerator {
    fn name(&self) -> &str {
        "extractive"
    }

    fn summarize(&self, input: &SummaryInput) -> SummaryOutcome {
        self.generate(input)
    }
}

/// Extended summary with the default 300..=500 word window.
///
/// Returns the description unchanged if assembly fails, and an empty string
/// if no sentence fits.
pub fn generate_extended_summary(description: &str, content: &str) -> String {
    SummaryGenerator::default()
        .generate(&SummaryInput::new(description, content))
        .into_text()
}

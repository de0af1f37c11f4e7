use std::fmt;

use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("sentence segmentation failed: {0}")]
    Failed(String),
}

/// Splits text into sentences, in order.
///
/// Implementations report failure through [`SegmentError`]. A panic is
/// caught by [`SummaryGenerator`](crate::SummaryGenerator) and treated the
/// same way.
pub trait SentenceSplitter: Send + Sync + fmt::Debug {
    /// Returned sentences are trimmed and non-empty.
    fn split(&self, text: &str) -> Result<Vec<String>, SegmentError>;
}

/// Multi-letter abbreviations that end in a period without ending a sentence.
/// Dotted forms made of single letters (`U.S.`, `e.g.`, `J.`) are handled
/// separately.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "ft", "vs", "inc", "ltd", "co",
    "corp", "dept", "univ", "gov", "gen", "col", "lt", "sgt", "capt", "cmdr", "adm", "sen",
    "rep", "rev", "hon", "pres", "vol", "fig", "approx", "est", "jan", "feb", "mar",
    "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec", "tue", "wed", "thu", "fri",
    "ave", "blvd", "rd",
];

/// UAX #29 sentence boundaries, with splits after abbreviations re-joined.
///
/// UAX #29 already keeps decimals (`3.14`), closing quotes and brackets, and
/// lowercase continuations (`e.g. the`) inside a sentence. What it cannot
/// know is that `Dr. Smith` is not two sentences; that is the abbreviation
/// pass.
#[derive(Debug, Clone)]
pub struct UnicodeSentenceSplitter {
    abbreviations: Vec<String>,
}

impl Default for UnicodeSentenceSplitter {
    fn default() -> Self {
        Self {
            abbreviations: ABBREVIATIONS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl UnicodeSentenceSplitter {
    /// Add extra abbreviations, given without their trailing period.
    pub fn with_abbreviations<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.abbreviations
            .extend(extra.into_iter().map(|a| a.as_ref().trim_end_matches('.').to_lowercase()));
        self
    }

    fn ends_with_abbreviation(&self, text: &str) -> bool {
        let Some(token) = text.split_whitespace().last() else {
            return false;
        };
        let token = token.trim_start_matches(|c: char| !c.is_alphanumeric());
        let Some(stem) = token.strip_suffix('.') else {
            return false;
        };
        if stem.is_empty() {
            return false;
        }

        let dotted_letters = stem.split('.').all(|part| {
            let mut chars = part.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
        });
        // A lone "I" or "A" usually ends a sentence rather than an initial.
        if dotted_letters {
            return stem.contains('.') || !matches!(stem, "I" | "A");
        }

        let stem = stem.to_lowercase();
        self.abbreviations.iter().any(|a| *a == stem)
    }
}

impl SentenceSplitter for UnicodeSentenceSplitter {
    fn split(&self, text: &str) -> Result<Vec<String>, SegmentError> {
        let mut sentences: Vec<String> = Vec::new();
        let mut pending = String::new();

        for segment in text.split_sentence_bounds() {
            // Stray punctuation ("...", "--") belongs to the sentence before it.
            // With nothing before it, it stands as a sentence of its own.
            if pending.is_empty() && !segment.chars().any(char::is_alphanumeric) {
                let stray = segment.trim();
                if let (false, Some(last)) = (stray.is_empty(), sentences.last_mut()) {
                    last.push(' ');
                    last.push_str(stray);
                    continue;
                }
                if stray.is_empty() {
                    continue;
                }
            }

            pending.push_str(segment);
            if self.ends_with_abbreviation(&pending) {
                continue;
            }
            sentences.push(pending.trim().to_string());
            pending.clear();
        }

        let rest = pending.trim();
        if !rest.is_empty() {
            sentences.push(rest.to_string());
        }

        Ok(sentences)
    }
}

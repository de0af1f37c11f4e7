//! Extended-summary generation.
//!
//! [`segment`] splits text into sentences; [`generator`] walks those sentences
//! and keeps whole ones until the summary is long enough.

pub mod generator;
pub mod segment;

pub use generator::{count_words, generate_extended_summary, SummaryGenerator};
pub use segment::{SegmentError, SentenceSplitter, UnicodeSentenceSplitter};

pub mod prelude {
    pub use super::generator::SummaryGenerator;
    pub use super::segment::{SentenceSplitter, UnicodeSentenceSplitter};
    pub use nd_core::{Summarizer, SummaryInput, SummaryOutcome};
}

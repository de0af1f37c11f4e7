use std::fmt;

use serde::{Deserialize, Serialize};

/// Text handed to a summarizer. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryInput {
    pub description: String,
    #[serde(default)]
    pub content: String,
}

impl SummaryInput {
    pub fn new(description: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            content: content.into(),
        }
    }

    /// Input for rows that only ever had a description.
    pub fn description_only(description: impl Into<String>) -> Self {
        Self::new(description, String::new())
    }

    /// Description and content joined by a single space.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.description, self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// Assembled from whole sentences. May be empty when no sentence fit.
    Generated(String),
    /// Assembly failed; carries the untouched description.
    Fallback { description: String, reason: String },
}

impl SummaryOutcome {
    pub fn text(&self) -> &str {
        match self {
            SummaryOutcome::Generated(text) => text,
            SummaryOutcome::Fallback { description, .. } => description,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            SummaryOutcome::Generated(text) => text,
            SummaryOutcome::Fallback { description, .. } => description,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SummaryOutcome::Fallback { .. })
    }
}

pub trait Summarizer: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Produce an extended summary. Never fails: internal errors surface as
    /// `SummaryOutcome::Fallback`.
    fn summarize(&self, input: &SummaryInput) -> SummaryOutcome;
}

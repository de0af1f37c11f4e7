pub mod backfill;
pub mod cli;
pub mod manager;
pub mod sources;

pub use backfill::{backfill_extended_summaries, BackfillReport};
pub use cli::{handle_command, IngestCommands, IngestContext};
pub use manager::{CategoryError, IngestManager, IngestReport};
pub use sources::mediastack::MediastackClient;
pub use sources::{ApiArticle, ArticleCandidate, NewsSource};

pub mod prelude {
    pub use super::sources::NewsSource;
    pub use super::{IngestManager, IngestReport};
    pub use nd_core::{Article, Error, Result};
}

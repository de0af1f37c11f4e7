use std::sync::Arc;

use nd_core::{Logger, NewsStorage, Summarizer};
use nd_ingest::IngestManager;

/// Shared by every handler.
pub struct AppState {
    pub storage: Arc<dyn NewsStorage>,
    pub summarizer: Arc<dyn Summarizer>,
    /// `None` when no Mediastack access key is configured.
    pub ingest: Option<Arc<IngestManager>>,
    pub logger: Logger,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn NewsStorage>,
        summarizer: Arc<dyn Summarizer>,
        logger: Logger,
    ) -> Self {
        Self {
            storage,
            summarizer,
            ingest: None,
            logger: logger.with_prefix("[web]"),
        }
    }

    pub fn with_ingest(mut self, manager: IngestManager) -> Self {
        self.ingest = Some(Arc::new(manager));
        self
    }
}

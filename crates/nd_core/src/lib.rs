pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod summary;
pub mod types;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub use logging::Logger;
pub use storage::{ArticleStorage, CommentStorage, NewsStorage};
pub use summary::{Summarizer, SummaryInput, SummaryOutcome};
pub use types::{
    Article, ArticlePatch, Category, Comment, NewArticle, NewComment, ANONYMOUS_USERNAME,
};

pub mod prelude {
    pub use crate::{Article, Category, Comment, Error, Result};
    pub use crate::{NewsStorage, Summarizer, SummaryInput, SummaryOutcome};
}

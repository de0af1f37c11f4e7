use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod state;
pub mod views;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/", get(views::news_list))
        .route("/articles/:id", get(views::article_page))
        .route("/health", get(handlers::health))
        .route(
            "/api/articles",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route(
            "/api/articles/:id",
            get(handlers::get_article)
                .patch(handlers::update_article)
                .delete(handlers::delete_article),
        )
        .route(
            "/api/articles/:id/comments",
            get(handlers::list_article_comments).post(handlers::create_article_comment),
        )
        .route(
            "/api/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route(
            "/api/comments/:id",
            get(handlers::get_comment).delete(handlers::delete_comment),
        )
        .route(
            "/api/fetch-news",
            post(handlers::fetch_news).get(handlers::fetch_news_redirect),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Serves the app until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> nd_core::Result<()> {
    let logger = state.logger.clone();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    logger.info(&format!("🌐 listening on http://{}", listener.local_addr()?));
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use nd_core::{Article, Error, Result};
}

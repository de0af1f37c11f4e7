use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use nd_core::{
    Article, ArticlePatch, ArticleStorage, Category, Comment, CommentStorage, NewArticle,
    NewComment, SummaryInput,
};
use nd_ingest::IngestReport;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

type Shared = State<Arc<AppState>>;

/// How a `?category=` value narrows a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(Category),
    /// Names no category; matches nothing.
    Unknown,
}

impl CategoryFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => CategoryFilter::All,
            Some(name) => name
                .parse()
                .map(CategoryFilter::Only)
                .unwrap_or(CategoryFilter::Unknown),
        }
    }

    pub fn selected(&self) -> Option<Category> {
        match self {
            CategoryFilter::Only(category) => Some(*category),
            _ => None,
        }
    }
}

pub(crate) async fn filtered_articles(
    state: &AppState,
    filter: CategoryFilter,
) -> nd_core::Result<Vec<Article>> {
    match filter {
        CategoryFilter::All => state.storage.list_articles(None).await,
        CategoryFilter::Only(category) => state.storage.list_articles(Some(category)).await,
        CategoryFilter::Unknown => Ok(Vec::new()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ArticleQuery {
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentQuery {
    pub article_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateArticle {
    #[serde(flatten)]
    pub article: NewArticle,
    /// Full text used for the extended summary; not stored.
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub article_id: Option<i64>,
    #[serde(default)]
    pub content: String,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    #[serde(default)]
    pub content: String,
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub report: IngestReport,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_articles(
    State(state): Shared,
    query: Result<Query<ArticleQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Article>>> {
    let Query(query) = query?;
    let filter = CategoryFilter::parse(query.category.as_deref());
    Ok(Json(filtered_articles(&state, filter).await?))
}

pub async fn create_article(
    State(state): Shared,
    body: Result<Json<CreateArticle>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    let Json(CreateArticle {
        mut article,
        content,
    }) = body?;
    article.validate()?;

    if article.extended_summary.trim().is_empty() {
        let input = SummaryInput::new(article.summary.clone(), content);
        article.extended_summary = state.summarizer.summarize(&input).into_text();
    }
    let stored = state.storage.insert_article(&article).await?;
    state
        .logger
        .info(&format!("created article {} ({})", stored.id, stored.url));
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn get_article(
    State(state): Shared,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<ArticleDetail>> {
    let Path(id) = id?;
    let article = find_article(&state, id).await?;
    let comments = state.storage.list_comments(Some(id)).await?;
    Ok(Json(ArticleDetail { article, comments }))
}

pub async fn update_article(
    State(state): Shared,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<ArticlePatch>, JsonRejection>,
) -> ApiResult<Json<Article>> {
    let Path(id) = id?;
    let Json(patch) = body?;
    patch.validate()?;
    Ok(Json(state.storage.update_article(id, &patch).await?))
}

pub async fn delete_article(
    State(state): Shared,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    if state.storage.delete_article(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Article not found"))
    }
}

pub async fn list_article_comments(
    State(state): Shared,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<Comment>>> {
    let Path(id) = id?;
    find_article(&state, id).await?;
    Ok(Json(state.storage.list_comments(Some(id)).await?))
}

pub async fn create_article_comment(
    State(state): Shared,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<CommentBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let Path(id) = id?;
    let Json(body) = body?;
    let comment = add_comment(&state, Some(id), &body.content, body.username.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_comments(
    State(state): Shared,
    query: Result<Query<CommentQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Comment>>> {
    let Query(query) = query?;
    Ok(Json(state.storage.list_comments(query.article_id).await?))
}

pub async fn create_comment(
    State(state): Shared,
    body: Result<Json<CreateComment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let Json(body) = body?;
    let comment = add_comment(
        &state,
        body.article_id,
        &body.content,
        body.username.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_comment(
    State(state): Shared,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Comment>> {
    let Path(id) = id?;
    state
        .storage
        .get_comment(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Comment not found"))
}

pub async fn delete_comment(
    State(state): Shared,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    if state.storage.delete_comment(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Comment not found"))
    }
}

/// Runs one ingestion cycle and reports what it did.
pub async fn fetch_news(State(state): Shared) -> ApiResult<Response> {
    let Some(manager) = state.ingest.clone() else {
        return Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Configuration error: Mediastack access key is not set",
        ));
    };

    let report = manager.run_cycle().await;
    state.logger.info(&format!(
        "fetch-news: {} created, {} skipped, {} failed",
        report.created, report.skipped, report.failed
    ));

    if report.all_categories_failed(manager.categories().len()) {
        let body = FetchResponse {
            status: "error",
            error: Some("Every category failed to fetch".to_string()),
            report,
        };
        return Ok((StatusCode::BAD_GATEWAY, Json(body)).into_response());
    }

    let body = FetchResponse {
        status: "ok",
        error: None,
        report,
    };
    Ok(Json(body).into_response())
}

pub async fn fetch_news_redirect() -> Redirect {
    Redirect::to("/")
}

async fn find_article(state: &AppState, id: i64) -> ApiResult<Article> {
    state
        .storage
        .get_article(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))
}

async fn add_comment(
    state: &AppState,
    article_id: Option<i64>,
    content: &str,
    username: Option<&str>,
) -> ApiResult<Comment> {
    // Content is checked before the article, so the id placeholder never reaches storage.
    let comment = NewComment::new(article_id.unwrap_or_default(), content, username)?;
    let article_id = article_id.ok_or_else(|| ApiError::not_found("Article not found"))?;
    find_article(state, article_id).await?;
    Ok(state.storage.insert_comment(&comment).await?)
}

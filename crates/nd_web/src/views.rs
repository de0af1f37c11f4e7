use std::fmt::Write;
use std::sync::Arc;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Html;
use nd_core::{Article, ArticleStorage, Category, Comment, CommentStorage};

use crate::error::{ApiError, ApiResult};
use crate::handlers::{filtered_articles, ArticleQuery, CategoryFilter};
use crate::AppState;

/// Escapes text for use in HTML bodies and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        body
    ))
}

pub async fn news_list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ArticleQuery>, QueryRejection>,
) -> ApiResult<Html<String>> {
    let Query(query) = query?;
    let filter = CategoryFilter::parse(query.category.as_deref());
    let articles = filtered_articles(&state, filter).await?;
    let categories = state.storage.categories().await?;
    Ok(render_list(&articles, &categories, filter.selected()))
}

pub async fn article_page(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Html<String>> {
    let Path(id) = id?;
    let article = state
        .storage
        .get_article(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;
    let comments = state.storage.list_comments(Some(id)).await?;
    Ok(render_detail(&article, &comments))
}

fn render_list(articles: &[Article], categories: &[Category], selected: Option<Category>) -> Html<String> {
    let mut body = String::from("<h1>Latest news</h1>\n<nav>\n");
    let all_class = if selected.is_none() { " class=\"selected\"" } else { "" };
    let _ = writeln!(body, "<a href=\"/\"{}>All</a>", all_class);
    for category in categories {
        let class = if selected == Some(*category) { " class=\"selected\"" } else { "" };
        let _ = writeln!(
            body,
            "<a href=\"/?category={0}\"{1}>{0}</a>",
            category.as_str(),
            class
        );
    }
    body.push_str("</nav>\n");

    if articles.is_empty() {
        body.push_str("<p>No articles yet.</p>\n");
    }
    for article in articles {
        let _ = write!(
            body,
            "<article>\n<h2><a href=\"/articles/{}\">{}</a></h2>\n\
             <p class=\"meta\">{} &middot; {} &middot; {}</p>\n<p>{}</p>\n</article>\n",
            article.id,
            escape(&article.title),
            escape(&article.source),
            article.category,
            article.published_at.format("%Y-%m-%d %H:%M"),
            escape(&article.summary),
        );
    }
    page("Latest news", &body)
}

fn render_detail(article: &Article, comments: &[Comment]) -> Html<String> {
    let mut body = String::new();
    let _ = writeln!(body, "<p><a href=\"/\">&larr; All news</a></p>");
    let _ = writeln!(body, "<h1>{}</h1>", escape(&article.title));
    let _ = write!(
        body,
        "<p class=\"meta\">{} &middot; {}",
        escape(&article.source),
        article.published_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(author) = &article.author {
        let _ = write!(body, " &middot; {}", escape(author));
    }
    body.push_str("</p>\n");
    if let Some(image) = &article.image {
        let _ = writeln!(body, "<img src=\"{}\" alt=\"\">", escape(image));
    }

    let text = if article.extended_summary.is_empty() {
        &article.summary
    } else {
        &article.extended_summary
    };
    let _ = writeln!(body, "<p>{}</p>", escape(text));
    let _ = writeln!(
        body,
        "<p><a href=\"{}\">Read the original article</a></p>",
        escape(&article.url)
    );

    let _ = writeln!(body, "<h2>Comments ({})</h2>", comments.len());
    for comment in comments {
        let _ = writeln!(
            body,
            "<div class=\"comment\"><strong>{}</strong> <span>{}</span><p>{}</p></div>",
            escape(&comment.username),
            comment.created_at.format("%Y-%m-%d %H:%M"),
            escape(&comment.content)
        );
    }
    page(&article.title, &body)
}

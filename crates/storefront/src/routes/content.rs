//! Articles, blog posts and FAQ.
//!
//! Only published articles are served. Detail endpoints render the markdown
//! body to HTML and count a view for articles.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use crate::db::ContentRepository;
use crate::error::{AppError, Result};
use crate::models::content::{Article, ArticleFilter, BlogPost, Faq, FaqCategoryQuery, Rendered};
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(filter): Query<ArticleFilter>,
) -> Result<Json<Vec<Article>>> {
    let articles = ContentRepository::new(state.pool())
        .list_articles(&filter)
        .await?;
    Ok(Json(articles))
}

/// Article detail. Each read increments the view counter.
#[instrument(skip(state))]
pub async fn show_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Rendered<Article>>> {
    let article = ContentRepository::new(state.pool())
        .read_article(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;

    let body = article.content.clone();
    Ok(Json(Rendered::new(article, &body)))
}

#[instrument(skip(state))]
pub async fn list_blog_posts(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>> {
    let posts = ContentRepository::new(state.pool()).list_blog_posts().await?;
    Ok(Json(posts))
}

#[instrument(skip(state))]
pub async fn show_blog_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Rendered<BlogPost>>> {
    let post = ContentRepository::new(state.pool())
        .get_blog_post(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog post not found".to_string()))?;

    let body = post.content.clone();
    Ok(Json(Rendered::new(post, &body)))
}

/// Active FAQ entries in display order.
#[instrument(skip(state))]
pub async fn list_faqs(State(state): State<AppState>) -> Result<Json<Vec<Faq>>> {
    let faqs = ContentRepository::new(state.pool()).list_faqs(None).await?;
    Ok(Json(faqs))
}

/// FAQ entries for one category. The category is required.
#[instrument(skip(state))]
pub async fn faqs_by_category(
    State(state): State<AppState>,
    Query(query): Query<FaqCategoryQuery>,
) -> Result<Json<Vec<Faq>>> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("category parameter is required".to_string()))?;

    let faqs = ContentRepository::new(state.pool())
        .list_faqs(Some(category))
        .await?;
    Ok(Json(faqs))
}

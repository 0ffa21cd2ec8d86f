//! Articles, blog posts and FAQ entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ojasritu_core::{ArticleId, BlogPostId, FaqId, UserId};

/// A published article. `content` is markdown.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub hindi_title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image_url: Option<String>,
    pub category: String,
    #[sqlx(rename = "author_id")]
    pub author: Option<UserId>,
    pub author_name: Option<String>,
    pub views: i32,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

/// A blog post. `content` is markdown.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub image_url: Option<String>,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub is_featured: bool,
}

/// Markdown document with its rendered HTML, used by detail endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Rendered<T> {
    #[serde(flatten)]
    pub item: T,
    pub content_html: String,
    pub reading_time_minutes: u32,
}

impl<T> Rendered<T> {
    /// Render `markdown` alongside `item`.
    pub fn new(item: T, markdown: &str) -> Self {
        Self {
            content_html: crate::services::markdown::render(markdown),
            reading_time_minutes: crate::services::markdown::reading_time_minutes(markdown),
            item,
        }
    }
}

/// An FAQ entry in both languages.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Faq {
    pub id: FaqId,
    pub question_en: String,
    pub question_hi: String,
    pub answer_en: String,
    pub answer_hi: String,
    pub category: String,
    pub sort_order: i32,
}

/// Query string of `GET /api/articles`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
}

/// Query string of `GET /api/faqs/by_category`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaqCategoryQuery {
    pub category: Option<String>,
}

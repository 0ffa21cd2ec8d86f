//! Articles, blog posts and FAQ entries.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::content::{Article, ArticleFilter, BlogPost, Faq};

const ARTICLE_COLUMNS: &str = "a.id, a.title, a.hindi_title, a.slug, a.content, a.excerpt, \
     a.featured_image_url, a.category, a.author_id, \
     NULLIF(TRIM(COALESCE(u.first_name, '') || ' ' || COALESCE(u.last_name, '')), '') AS author_name, \
     a.views, a.is_featured, a.created_at";

const BLOG_COLUMNS: &str =
    "id, title, slug, content, excerpt, image_url, author, published_at, is_featured";

const FAQ_COLUMNS: &str =
    "id, question_en, question_hi, answer_en, answer_hi, category, sort_order";

pub struct ContentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Published articles, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>, RepositoryError> {
        let articles = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} \
             FROM shop.articles a LEFT JOIN shop.users u ON u.id = a.author_id \
             WHERE a.is_published \
               AND ($1::text IS NULL OR a.category = $1) \
               AND ($2::boolean IS NULL OR a.is_featured = $2) \
             ORDER BY a.created_at DESC, a.id DESC"
        ))
        .bind(filter.category.as_deref())
        .bind(filter.featured)
        .fetch_all(self.pool)
        .await?;
        Ok(articles)
    }

    /// A published article, counting the read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn read_article(&self, slug: &str) -> Result<Option<Article>, RepositoryError> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "WITH bumped AS ( \
                 UPDATE shop.articles SET views = views + 1 \
                 WHERE slug = $1 AND is_published \
                 RETURNING * \
             ) \
             SELECT {ARTICLE_COLUMNS} FROM bumped a LEFT JOIN shop.users u ON u.id = a.author_id"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(article)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_blog_posts(&self) -> Result<Vec<BlogPost>, RepositoryError> {
        let posts = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {BLOG_COLUMNS} FROM shop.blog_posts ORDER BY published_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(posts)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_blog_post(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError> {
        let post = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {BLOG_COLUMNS} FROM shop.blog_posts WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(post)
    }

    /// Active FAQ entries, optionally limited to one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_faqs(&self, category: Option<&str>) -> Result<Vec<Faq>, RepositoryError> {
        let faqs = sqlx::query_as::<_, Faq>(&format!(
            "SELECT {FAQ_COLUMNS} FROM shop.faqs \
             WHERE is_active AND ($1::text IS NULL OR category = $1) \
             ORDER BY sort_order, id"
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;
        Ok(faqs)
    }
}

//! Categories and products.

use sqlx::PgPool;

use ojasritu_core::slug::default_sku;
use ojasritu_core::{CategoryId, ProductId, ProductPricing, slugify};

use super::RepositoryError;
use crate::models::catalog::{Category, NewCategory, NewProduct, Product, ProductFilter, ProductUpdate};

/// Product columns joined with the category name. Expects aliases `p` and `c`.
pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.name, p.hindi_name, p.slug, p.description, \
     p.benefits, p.ingredients, p.usage_instructions, p.price, p.discount_price, p.category_id, \
     c.name AS category_name, p.image_url, p.dosha_type, p.quantity_in_stock, p.sku, p.status, \
     p.is_bestseller, p.is_featured, p.rating, p.total_reviews, p.created_at, p.updated_at";

const CATEGORY_COLUMNS: &str = "id, name, hindi_name, slug, description";

/// Repository for the catalog.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.categories ORDER BY name"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop.categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(category)
    }

    /// Create a category. A blank slug is derived from the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let slug = non_blank(new.slug.as_deref()).map_or_else(|| slugify(&new.name), str::to_owned);

        sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO shop.categories (name, hindi_name, slug, description) \
             VALUES ($1, $2, $3, $4) RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.hindi_name)
        .bind(&slug)
        .bind(&new.description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "category"))
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Active products matching every given filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} \
             FROM shop.products p LEFT JOIN shop.categories c ON c.id = p.category_id \
             WHERE p.status = 'active' \
               AND ($1::text IS NULL OR c.slug = $1) \
               AND ($2::shop.product_dosha IS NULL OR p.dosha_type = $2) \
               AND ($3::boolean IS NULL OR p.is_bestseller = $3) \
               AND ($4::boolean IS NULL OR p.is_featured = $4) \
               AND ($5::text IS NULL \
                    OR POSITION(LOWER($5) IN LOWER(p.name)) > 0 \
                    OR POSITION(LOWER($5) IN LOWER(p.hindi_name)) > 0 \
                    OR POSITION(LOWER($5) IN LOWER(p.description)) > 0) \
             ORDER BY p.created_at DESC, p.id DESC"
        ))
        .bind(filter.category.as_deref())
        .bind(filter.dosha)
        .bind(filter.bestseller)
        .bind(filter.featured)
        .bind(search)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Product by slug, in any status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} \
             FROM shop.products p LEFT JOIN shop.categories c ON c.id = p.category_id \
             WHERE p.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Active product by id. Inactive and missing products both give `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} \
             FROM shop.products p LEFT JOIN shop.categories c ON c.id = p.category_id \
             WHERE p.id = $1 AND p.status = 'active'"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Create a product. Blank slug and SKU are generated from the name and
    /// the id reserved for the row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the prices are inconsistent.
    /// Returns `RepositoryError::Conflict` if the slug or SKU is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        ProductPricing::new(new.price, new.discount_price)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let id: i32 =
            sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('shop.products', 'id'))::int4")
                .fetch_one(&mut *tx)
                .await?;

        let slug = non_blank(new.slug.as_deref()).map_or_else(|| slugify(&new.name), str::to_owned);
        let sku = non_blank(new.sku.as_deref()).map_or_else(|| default_sku(&new.name, id), str::to_owned);

        sqlx::query(
            "INSERT INTO shop.products \
                 (id, name, hindi_name, slug, description, benefits, ingredients, \
                  usage_instructions, price, discount_price, category_id, image_url, dosha_type, \
                  quantity_in_stock, sku, status, is_bestseller, is_featured) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        )
        .bind(id)
        .bind(&new.name)
        .bind(&new.hindi_name)
        .bind(&slug)
        .bind(&new.description)
        .bind(&new.benefits)
        .bind(&new.ingredients)
        .bind(&new.usage_instructions)
        .bind(new.price)
        .bind(new.discount_price)
        .bind(new.category)
        .bind(new.image_url.as_deref())
        .bind(new.dosha_type)
        .bind(new.quantity_in_stock)
        .bind(&sku)
        .bind(new.status)
        .bind(new.is_bestseller)
        .bind(new.is_featured)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "product"))?;

        tx.commit().await?;

        self.get_product(&slug).await?.ok_or(RepositoryError::NotFound)
    }

    /// Apply a partial update to the product with this slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has the slug.
    /// Returns `RepositoryError::DataCorruption` if the result breaks the
    /// discount rule.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_product(
        &self,
        slug: &str,
        update: ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let current = self.get_product(slug).await?.ok_or(RepositoryError::NotFound)?;
        let next = update.apply(current);
        next.pricing()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        sqlx::query(
            "UPDATE shop.products SET \
                 name = $2, hindi_name = $3, description = $4, benefits = $5, ingredients = $6, \
                 usage_instructions = $7, price = $8, discount_price = $9, category_id = $10, \
                 image_url = $11, dosha_type = $12, quantity_in_stock = $13, status = $14, \
                 is_bestseller = $15, is_featured = $16, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(next.id)
        .bind(&next.name)
        .bind(&next.hindi_name)
        .bind(&next.description)
        .bind(&next.benefits)
        .bind(&next.ingredients)
        .bind(&next.usage_instructions)
        .bind(next.price)
        .bind(next.discount_price)
        .bind(next.category)
        .bind(next.image_url.as_deref())
        .bind(next.dosha_type)
        .bind(next.quantity_in_stock)
        .bind(next.status)
        .bind(next.is_bestseller)
        .bind(next.is_featured)
        .execute(self.pool)
        .await?;

        self.get_product(slug).await?.ok_or(RepositoryError::NotFound)
    }

    /// Category id for a slug, used by the seeder.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_id(&self, slug: &str) -> Result<Option<CategoryId>, RepositoryError> {
        let id = sqlx::query_scalar("SELECT id FROM shop.categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;
        Ok(id)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

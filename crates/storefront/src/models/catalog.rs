//! Catalog types: categories, products and reviews.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ojasritu_core::{
    CategoryId, PricingError, ProductDosha, ProductId, ProductPricing, ProductStatus, ReviewId,
};

/// A product category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub hindi_name: String,
    pub slug: String,
    pub description: String,
}

/// A catalog product, joined with its category name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub hindi_name: String,
    pub slug: String,
    pub description: String,
    pub benefits: String,
    pub ingredients: String,
    pub usage_instructions: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    #[sqlx(rename = "category_id")]
    pub category: Option<CategoryId>,
    pub category_name: Option<String>,
    #[serde(rename = "image")]
    pub image_url: Option<String>,
    pub dosha_type: ProductDosha,
    pub quantity_in_stock: i32,
    pub sku: String,
    pub status: ProductStatus,
    pub is_bestseller: bool,
    pub is_featured: bool,
    pub rating: Decimal,
    pub total_reviews: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Validated price pair.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError`] if the stored prices are inconsistent. The
    /// database `CHECK` makes that a corruption case.
    pub fn pricing(&self) -> Result<ProductPricing, PricingError> {
        ProductPricing::new(self.price, self.discount_price)
    }

    /// Price the customer pays per unit.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.price)
    }
}

/// A product as returned by the API, with derived fields.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub discount_percentage: u32,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let discount_percentage = product
            .pricing()
            .map(|p| p.discount_percentage())
            .unwrap_or_default();
        Self {
            product,
            discount_percentage,
        }
    }
}

/// Product detail with its latest reviews.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductView,
    pub reviews: Vec<Review>,
}

/// A product review with the reviewer's username.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    #[sqlx(rename = "product_id")]
    pub product: ProductId,
    pub customer_name: String,
    pub rating: i16,
    pub title: String,
    pub comment: String,
    pub verified_purchase: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub hindi_name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Fields for creating a product. Blank `slug`/`sku` are generated.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub hindi_name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub benefits: String,
    #[serde(default)]
    pub ingredients: String,
    #[serde(default)]
    pub usage_instructions: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub category: Option<CategoryId>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub dosha_type: ProductDosha,
    #[serde(default)]
    pub quantity_in_stock: i32,
    pub sku: Option<String>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub is_bestseller: bool,
    #[serde(default)]
    pub is_featured: bool,
}

/// Partial product update; absent fields keep their value.
///
/// `discount_price: null` clears the discount, an absent key keeps it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub hindi_name: Option<String>,
    pub description: Option<String>,
    pub benefits: Option<String>,
    pub ingredients: Option<String>,
    pub usage_instructions: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub discount_price: Option<Option<Decimal>>,
    pub category: Option<CategoryId>,
    pub image_url: Option<String>,
    pub dosha_type: Option<ProductDosha>,
    pub quantity_in_stock: Option<i32>,
    pub status: Option<ProductStatus>,
    pub is_bestseller: Option<bool>,
    pub is_featured: Option<bool>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<Decimal>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Decimal>::deserialize(deserializer).map(Some)
}

impl ProductUpdate {
    /// Apply this update on top of an existing product.
    #[must_use]
    pub fn apply(self, mut product: Product) -> Product {
        if let Some(v) = self.name {
            product.name = v;
        }
        if let Some(v) = self.hindi_name {
            product.hindi_name = v;
        }
        if let Some(v) = self.description {
            product.description = v;
        }
        if let Some(v) = self.benefits {
            product.benefits = v;
        }
        if let Some(v) = self.ingredients {
            product.ingredients = v;
        }
        if let Some(v) = self.usage_instructions {
            product.usage_instructions = v;
        }
        if let Some(v) = self.price {
            product.price = v;
        }
        if let Some(v) = self.discount_price {
            product.discount_price = v;
        }
        if let Some(v) = self.category {
            product.category = Some(v);
        }
        if let Some(v) = self.image_url {
            product.image_url = Some(v);
        }
        if let Some(v) = self.dosha_type {
            product.dosha_type = v;
        }
        if let Some(v) = self.quantity_in_stock {
            product.quantity_in_stock = v;
        }
        if let Some(v) = self.status {
            product.status = v;
        }
        if let Some(v) = self.is_bestseller {
            product.is_bestseller = v;
        }
        if let Some(v) = self.is_featured {
            product.is_featured = v;
        }
        product
    }
}

/// Query filters for the product listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    pub dosha: Option<ProductDosha>,
    pub bestseller: Option<bool>,
    pub featured: Option<bool>,
    /// Free-text search on name, Hindi name and description.
    pub search: Option<String>,
}

//! Load the sample catalog.
//!
//! Existing slugs are left alone, so the command can be re-run after
//! partial failures or on a database that already has real products.

use rust_decimal::Decimal;
use tracing::info;

use ojasritu_core::{ProductDosha, ProductStatus};
use ojasritu_storefront::db::CatalogRepository;
use ojasritu_storefront::models::catalog::{NewCategory, NewProduct};

use super::{CommandError, connect};

/// Seed the sample categories and products.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert fails.
pub async fn catalog() -> Result<(), CommandError> {
    let pool = connect().await?;
    let repo = CatalogRepository::new(&pool);

    for category in sample_categories() {
        let slug = category.slug.clone().unwrap_or_default();
        if repo.get_category(&slug).await?.is_some() {
            info!(slug = %slug, "Category exists");
            continue;
        }
        let created = repo.create_category(&category).await?;
        info!(slug = %created.slug, "Created category");
    }

    for (category_slug, mut product) in sample_products() {
        let slug = product.slug.clone().unwrap_or_default();
        if repo.get_product(&slug).await?.is_some() {
            info!(slug = %slug, "Product exists");
            continue;
        }
        product.category = repo.category_id(category_slug).await?;
        let created = repo.create_product(&product).await?;
        info!(slug = %created.slug, sku = %created.sku, "Created product");
    }

    info!("Catalog seeding complete");
    Ok(())
}

fn category(name: &str, hindi_name: &str, slug: &str) -> NewCategory {
    NewCategory {
        name: name.to_string(),
        hindi_name: hindi_name.to_string(),
        slug: Some(slug.to_string()),
        description: String::new(),
    }
}

fn sample_categories() -> Vec<NewCategory> {
    vec![
        category("Wellness Capsules", "कल्याण कैप्सूल", "wellness-capsules"),
        category("Herbal Oils", "हर्बल तेल", "herbal-oils"),
        category("Ayurvedic Powders", "आयुर्वेदिक चूर्ण", "ayurvedic-powders"),
    ]
}

/// Sample products paired with the slug of their category.
fn sample_products() -> Vec<(&'static str, NewProduct)> {
    vec![
        (
            "wellness-capsules",
            NewProduct {
                name: "Anti-Aging Wellness Capsule".to_string(),
                hindi_name: "बुढ़ापा रोधी कैप्सूल".to_string(),
                slug: Some("anti-aging-capsule".to_string()),
                description: "Premium Ayurvedic formula for youthful vitality and longevity"
                    .to_string(),
                benefits: "त्वचा में चमक, ऊर्जा वृद्धि, प्रतिरक्षा सुधार".to_string(),
                ingredients: "Ashwagandha, Shatavari, Amla, Guduchi, Brahmi".to_string(),
                usage_instructions: "दिन में दो बार भोजन के बाद एक कैप्सूल लें".to_string(),
                price: Decimal::new(799, 0),
                discount_price: Some(Decimal::new(649, 0)),
                category: None,
                image_url: None,
                dosha_type: ProductDosha::Tridosha,
                quantity_in_stock: 50,
                sku: Some("AAC-001".to_string()),
                status: ProductStatus::Active,
                is_bestseller: true,
                is_featured: true,
            },
        ),
        (
            "wellness-capsules",
            NewProduct {
                name: "Jeeva Asthi Joint Care".to_string(),
                hindi_name: "जीवाष्ठि जोड़ों की देखभाल".to_string(),
                slug: Some("jeeva-asthi".to_string()),
                description: "Natural joint and bone strength formula".to_string(),
                benefits: "जोड़ों का दर्द कम करे, हड्डियों को मजबूत बनाए".to_string(),
                ingredients: "Guggulu, Shallaki, Ashwagandha, Nirgundi".to_string(),
                usage_instructions: "सुबह-शाम एक कैप्सूल गुनगुने पानी के साथ".to_string(),
                price: Decimal::new(899, 0),
                discount_price: Some(Decimal::new(749, 0)),
                category: None,
                image_url: None,
                dosha_type: ProductDosha::Vata,
                quantity_in_stock: 30,
                sku: Some("JAC-002".to_string()),
                status: ProductStatus::Active,
                is_bestseller: false,
                is_featured: true,
            },
        ),
        (
            "ayurvedic-powders",
            NewProduct {
                name: "Triphala Churna".to_string(),
                hindi_name: "त्रिफला चूर्ण".to_string(),
                slug: Some("triphala-churna".to_string()),
                description: "Traditional Ayurvedic powder for digestive health".to_string(),
                benefits: "पाचन सुधार, शरीर शुद्धि".to_string(),
                ingredients: "Amla, Haritaki, Bibhitaki".to_string(),
                usage_instructions: "रात को सोने से पहले गुनगुने पानी के साथ".to_string(),
                price: Decimal::new(349, 0),
                discount_price: None,
                category: None,
                image_url: None,
                dosha_type: ProductDosha::Tridosha,
                quantity_in_stock: 100,
                sku: Some("TPC-003".to_string()),
                status: ProductStatus::Active,
                is_bestseller: true,
                is_featured: false,
            },
        ),
    ]
}

//! Request and response shapes for the REST surface.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::{Category, Product, ProductImage, SiteSettings};
use crate::whatsapp;

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub icon: Option<String>,
    pub icon_file: Option<String>,
    pub parent: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub icon_file: Option<String>,
    pub parent: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub brand: String,
    pub image: Option<String>,
    pub category: i32,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub featured: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub category: Option<i32>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub whatsapp_number: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_address: Option<String>,
    pub company_name: Option<String>,
    pub company_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubcategoryResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub icon: Option<String>,
    pub icon_file: Option<String>,
    pub product_count: i64,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub icon: Option<String>,
    pub icon_file: Option<String>,
    pub parent: Option<i32>,
    pub subcategories: Vec<SubcategoryResponse>,
    pub product_count: i64,
    pub is_main_category: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl CategoryResponse {
    /// Assembles the response with its direct children nested, the way the
    /// public API presents the two-level hierarchy.
    pub fn build(
        category: &Category,
        all: &[Category],
        product_counts: &HashMap<i32, i64>,
    ) -> Self {
        let mut children: Vec<&Category> = all
            .iter()
            .filter(|c| c.parent_id == Some(category.id))
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        let subcategories = children
            .into_iter()
            .map(|c| SubcategoryResponse {
                id: c.id,
                name: c.name.clone(),
                slug: c.slug.clone(),
                icon: c.icon.clone(),
                icon_file: c.icon_file.clone(),
                product_count: product_counts.get(&c.id).copied().unwrap_or(0),
            })
            .collect();
        CategoryResponse {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            icon: category.icon.clone(),
            icon_file: category.icon_file.clone(),
            parent: category.parent_id,
            subcategories,
            product_count: product_counts.get(&category.id).copied().unwrap_or(0),
            is_main_category: category.is_main_category(),
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GalleryImageResponse {
    pub id: i32,
    pub image: String,
}

/// Full product representation, used for detail views and writes.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: BigDecimal,
    pub display_price: String,
    pub brand: String,
    pub image: String,
    pub category: i32,
    pub category_name: String,
    pub in_stock: bool,
    pub featured: bool,
    pub whatsapp_link: String,
    pub gallery: Vec<GalleryImageResponse>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProductResponse {
    pub fn build(
        product: &Product,
        category_name: String,
        gallery: Vec<ProductImage>,
        settings: &SiteSettings,
        now: DateTime<Utc>,
    ) -> Self {
        ProductResponse {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            price: product.price.clone(),
            display_price: whatsapp::display_price(&product.price),
            brand: product.brand.clone(),
            image: whatsapp::image_url(product.image.as_deref()),
            category: product.category_id,
            category_name,
            in_stock: product.in_stock,
            featured: product.featured,
            whatsapp_link: whatsapp::build_link(product, settings, now),
            gallery: gallery
                .into_iter()
                .map(|g| GalleryImageResponse {
                    id: g.id,
                    image: whatsapp::image_url(Some(&g.image)),
                })
                .collect(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Trimmed-down representation for list endpoints.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub price: BigDecimal,
    pub display_price: String,
    pub brand: String,
    pub image: String,
    pub category_name: String,
    pub in_stock: bool,
    pub featured: bool,
    pub whatsapp_link: String,
    pub created_at: NaiveDateTime,
}

impl ProductListResponse {
    pub fn build(
        product: &Product,
        category_names: &HashMap<i32, String>,
        settings: &SiteSettings,
        now: DateTime<Utc>,
    ) -> Self {
        ProductListResponse {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price.clone(),
            display_price: whatsapp::display_price(&product.price),
            brand: product.brand.clone(),
            image: whatsapp::image_url(product.image.as_deref()),
            category_name: category_names
                .get(&product.category_id)
                .cloned()
                .unwrap_or_default(),
            in_stock: product.in_stock,
            featured: product.featured,
            whatsapp_link: whatsapp::build_link(product, settings, now),
            created_at: product.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub whatsapp_number: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub contact_address: String,
    pub company_name: String,
    pub company_description: String,
    pub updated_at: NaiveDateTime,
}

impl From<SiteSettings> for SettingsResponse {
    fn from(s: SiteSettings) -> Self {
        SettingsResponse {
            whatsapp_number: s.whatsapp_number,
            contact_email: s.contact_email,
            contact_phone: s.contact_phone,
            contact_address: s.contact_address,
            company_name: s.company_name,
            company_description: s.company_description,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct ProductStatsResponse {
    pub total_products: i64,
    pub in_stock: i64,
    pub out_of_stock: i64,
    pub featured: i64,
    pub by_category: Vec<CategoryCount>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository;
    use std::str::FromStr;

    fn category(id: i32, parent_id: Option<i32>, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            slug: crate::slugs::slugify(name),
            icon: Some("laptop".to_string()),
            icon_file: None,
            parent_id,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn category_response_nests_direct_children_with_counts() {
        let all = vec![
            category(1, None, "Ordinateurs"),
            category(2, Some(1), "Portables"),
            category(3, Some(1), "Bureau"),
            category(4, Some(2), "Gaming"),
        ];
        let mut counts = HashMap::new();
        counts.insert(1, 2i64);
        counts.insert(2, 5i64);

        let resp = CategoryResponse::build(&all[0], &all, &counts);
        assert!(resp.is_main_category);
        assert_eq!(resp.product_count, 2);
        // Direct children only, name-ordered; the grandchild stays out.
        assert_eq!(resp.subcategories.len(), 2);
        assert_eq!(resp.subcategories[0].name, "Bureau");
        assert_eq!(resp.subcategories[1].product_count, 5);
    }

    #[test]
    fn product_responses_carry_derived_fields() {
        let settings = SiteSettings {
            id: repository::SITE_SETTINGS_ID,
            whatsapp_number: "22900000000".to_string(),
            contact_email: String::new(),
            contact_phone: String::new(),
            contact_address: String::new(),
            company_name: "NIASOTAC".to_string(),
            company_description: String::new(),
            updated_at: Utc::now().naive_utc(),
            updated_by: None,
        };
        let product = Product {
            id: 7,
            name: "AirPods Pro".to_string(),
            slug: "airpods-pro-apple".to_string(),
            description: String::new(),
            price: BigDecimal::from_str("299.99").unwrap(),
            brand: "Apple".to_string(),
            image: None,
            category_id: 3,
            in_stock: true,
            featured: true,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        };
        let mut names = HashMap::new();
        names.insert(3, "Audio".to_string());

        let resp = ProductListResponse::build(&product, &names, &settings, Utc::now());
        assert_eq!(resp.display_price, "300 FCFA");
        assert_eq!(resp.category_name, "Audio");
        assert!(resp
            .whatsapp_link
            .starts_with("https://wa.me/22900000000?text="));
        assert_eq!(resp.image, crate::whatsapp::DEFAULT_PRODUCT_IMAGE);

        let detail = ProductResponse::build(
            &product,
            "Audio".to_string(),
            Vec::new(),
            &settings,
            Utc::now(),
        );
        assert!(detail.gallery.is_empty());
        assert_eq!(detail.category_name, "Audio");
    }
}

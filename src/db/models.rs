use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::schema::{categories, product_images, products, site_settings, users};

#[derive(Queryable, Identifiable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub icon: Option<String>,
    pub icon_file: Option<String>,
    pub parent_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Category {
    /// A category without a parent is a main category.
    pub fn is_main_category(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub icon: Option<String>,
    pub icon_file: Option<String>,
    pub parent_id: Option<i32>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = categories)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub icon_file: Option<String>,
    pub parent_id: Option<i32>,
}

#[derive(Queryable, Identifiable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = products)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: BigDecimal,
    pub brand: String,
    pub image: Option<String>,
    pub category_id: i32,
    pub in_stock: bool,
    pub featured: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: BigDecimal,
    pub brand: String,
    pub image: Option<String>,
    pub category_id: i32,
    pub in_stock: bool,
    pub featured: bool,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = products)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub category_id: Option<i32>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
}

#[derive(Queryable, Identifiable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = product_images)]
pub struct ProductImage {
    pub id: i32,
    pub product_id: i32,
    pub image: String,
    pub uploaded_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = product_images)]
pub struct NewProductImage {
    pub product_id: i32,
    pub image: String,
}

#[derive(Queryable, Identifiable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = site_settings)]
pub struct SiteSettings {
    pub id: i32,
    pub whatsapp_number: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub contact_address: String,
    pub company_name: String,
    pub company_description: String,
    pub updated_at: NaiveDateTime,
    pub updated_by: Option<i32>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = site_settings)]
pub struct UpdateSiteSettings {
    pub whatsapp_number: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_address: Option<String>,
    pub company_name: Option<String>,
    pub company_description: Option<String>,
}

#[derive(Queryable, Identifiable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password: String, // plain text (demo only)
    pub role: String,     // 'User' or 'Admin'
}

#[derive(Insertable, Deserialize)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: String,
}

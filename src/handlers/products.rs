use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::PgConnection;
use futures::TryStreamExt;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::models::{Product, UpdateProduct};
use crate::db::repository::{self, ProductFilter};
use crate::error::ApiError;
use crate::models::{
    CategoryCount, CreateProductRequest, GalleryImageResponse, ProductListResponse, ProductQuery,
    ProductResponse, ProductStatsResponse, UpdateProductRequest,
};
use crate::AppState;

/// Upload ceiling for a single image file.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;
const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Serializes products for list endpoints: resolves category names and
/// computes the derived fields (display price, WhatsApp link) per product.
pub fn product_list_payload(
    conn: &mut PgConnection,
    products: &[Product],
) -> Result<Vec<ProductListResponse>, ApiError> {
    let settings = repository::load_site_settings(conn)?;
    let category_names: HashMap<i32, String> = repository::get_all_categories(conn)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let now = Utc::now();
    Ok(products
        .iter()
        .map(|p| ProductListResponse::build(p, &category_names, &settings, now))
        .collect())
}

fn detail_payload(conn: &mut PgConnection, product: &Product) -> Result<ProductResponse, ApiError> {
    let settings = repository::load_site_settings(conn)?;
    let category_name = repository::get_all_categories(conn)?
        .into_iter()
        .find(|c| c.id == product.category_id)
        .map(|c| c.name)
        .unwrap_or_default();
    let gallery = repository::gallery_for_product(conn, product.id)?;
    Ok(ProductResponse::build(
        product,
        category_name,
        gallery,
        &settings,
        Utc::now(),
    ))
}

fn price_bound(value: f64) -> Result<BigDecimal, ApiError> {
    BigDecimal::try_from(value).map_err(|_| ApiError::Validation("Invalid price bound".into()))
}

pub async fn list_products(
    data: web::Data<AppState>,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    let query = query.into_inner();
    let filter = ProductFilter {
        category: query.category,
        brand: query.brand,
        in_stock: query.in_stock,
        featured: query.featured,
        price_min: query.price_min.map(price_bound).transpose()?,
        price_max: query.price_max.map(price_bound).transpose()?,
        search: query.search,
        ordering: query.ordering,
    };
    let products = repository::list_products(conn, &filter)?;
    Ok(HttpResponse::Ok().json(product_list_payload(conn, &products)?))
}

pub async fn featured(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    let products = repository::featured_products(conn)?;
    Ok(HttpResponse::Ok().json(product_list_payload(conn, &products)?))
}

pub async fn recent(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    let products = repository::recent_products(conn)?;
    Ok(HttpResponse::Ok().json(product_list_payload(conn, &products)?))
}

pub async fn brands(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    Ok(HttpResponse::Ok().json(repository::distinct_brands(conn)?))
}

pub async fn stats(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    let counts = repository::product_stats(conn)?;
    Ok(HttpResponse::Ok().json(ProductStatsResponse {
        total_products: counts.total,
        in_stock: counts.in_stock,
        out_of_stock: counts.out_of_stock,
        featured: counts.featured,
        by_category: counts
            .by_category
            .into_iter()
            .map(|(name, count)| CategoryCount { name, count })
            .collect(),
    }))
}

pub async fn get_product(
    data: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    let product = repository::find_product_by_slug(conn, &slug)?;
    Ok(HttpResponse::Ok().json(detail_payload(conn, &product)?))
}

fn validate_product_fields(name: &str, description: &str, price: &BigDecimal) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("Product name cannot be empty".into()));
    }
    if description.trim().is_empty() {
        return Err(ApiError::Validation(
            "Product description cannot be empty".into(),
        ));
    }
    if price < &BigDecimal::from(0) {
        return Err(ApiError::Validation(
            "Product price cannot be negative".into(),
        ));
    }
    Ok(())
}

fn ensure_category_exists(conn: &mut PgConnection, id: i32) -> Result<(), ApiError> {
    if repository::get_all_categories(conn)?.iter().all(|c| c.id != id) {
        return Err(ApiError::Validation("Category does not exist".into()));
    }
    Ok(())
}

pub async fn create_product(
    data: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    repository::require_admin(conn, auth.user_id)?;

    let req = req.into_inner();
    validate_product_fields(&req.name, &req.description, &req.price)?;
    ensure_category_exists(conn, req.category)?;

    let product = repository::create_product(
        conn,
        repository::NewProductData {
            name: req.name,
            description: req.description,
            price: req.price,
            brand: req.brand,
            image: req.image,
            category_id: req.category,
            in_stock: req.in_stock,
            featured: req.featured,
        },
    )?;
    log::info!("product {} created (slug {})", product.id, product.slug);
    Ok(HttpResponse::Created().json(detail_payload(conn, &product)?))
}

pub async fn update_product(
    data: web::Data<AppState>,
    auth: AuthUser,
    slug: web::Path<String>,
    req: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    repository::require_admin(conn, auth.user_id)?;

    let product = repository::find_product_by_slug(conn, &slug)?;
    let req = req.into_inner();
    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("Product name cannot be empty".into()));
        }
    }
    if let Some(price) = &req.price {
        if price < &BigDecimal::from(0) {
            return Err(ApiError::Validation(
                "Product price cannot be negative".into(),
            ));
        }
    }
    if let Some(category) = req.category {
        ensure_category_exists(conn, category)?;
    }

    let updated = repository::update_product(
        conn,
        product.id,
        UpdateProduct {
            name: req.name,
            description: req.description,
            price: req.price,
            brand: req.brand,
            image: req.image,
            category_id: req.category,
            in_stock: req.in_stock,
            featured: req.featured,
        },
    )?;
    Ok(HttpResponse::Ok().json(detail_payload(conn, &updated)?))
}

pub async fn delete_product(
    data: web::Data<AppState>,
    auth: AuthUser,
    slug: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    repository::require_admin(conn, auth.user_id)?;

    let product = repository::find_product_by_slug(conn, &slug)?;
    repository::delete_product(conn, product.id)?;
    log::info!("product {} deleted", product.id);
    Ok(HttpResponse::NoContent().finish())
}

/// Accepts a single multipart `image` field, validates extension and size,
/// stores the file under the media root and records the gallery row. The
/// ten-image cap is enforced inside the insert transaction.
pub async fn upload_gallery_image(
    data: web::Data<AppState>,
    auth: AuthUser,
    slug: web::Path<String>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let product = {
        let conn = &mut data.pool.get()?;
        repository::require_admin(conn, auth.user_id)?;
        repository::find_product_by_slug(conn, &slug)?
    };

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(mut field) = payload.try_next().await? {
        if field.name() != "image" {
            continue;
        }
        let filename = field
            .content_disposition()
            .get_filename()
            .map(str::to_string)
            .ok_or_else(|| ApiError::Validation("Upload is missing a file name".into()))?;
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        if !ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApiError::Validation(format!(
                "Format non supporté. Utilisez: {}",
                ALLOWED_IMAGE_EXTENSIONS.join(", ")
            )));
        }

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
                return Err(ApiError::Validation(
                    "La taille maximale du fichier est 2MB".into(),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        upload = Some((extension, bytes));
        break;
    }
    let (extension, bytes) =
        upload.ok_or_else(|| ApiError::Validation("No image field in upload".into()))?;

    let relative_path = format!("products/gallery/{}.{}", Uuid::new_v4(), extension);
    let absolute_path = std::path::Path::new(&data.media_root).join(&relative_path);
    let write_path = absolute_path.clone();
    web::block(move || {
        if let Some(dir) = write_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&write_path, bytes)
    })
    .await
    .map_err(|e| ApiError::Upload(e.to_string()))?
    .map_err(|e| ApiError::Upload(e.to_string()))?;

    let conn = &mut data.pool.get()?;
    let image = match repository::add_product_image(conn, product.id, relative_path) {
        Ok(image) => image,
        Err(e) => {
            // The row was rejected; don't leave the file behind.
            if let Err(io_err) = std::fs::remove_file(&absolute_path) {
                log::warn!(
                    "could not remove rejected upload {}: {}",
                    absolute_path.display(),
                    io_err
                );
            }
            return Err(e);
        }
    };
    log::info!("gallery image {} added to product {}", image.id, product.id);
    Ok(HttpResponse::Created().json(GalleryImageResponse {
        id: image.id,
        image: crate::whatsapp::image_url(Some(&image.image)),
    }))
}

pub async fn delete_gallery_image(
    data: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<(String, i32)>,
) -> Result<HttpResponse, ApiError> {
    let (slug, image_id) = path.into_inner();
    let conn = &mut data.pool.get()?;
    repository::require_admin(conn, auth.user_id)?;

    let product = repository::find_product_by_slug(conn, &slug)?;
    let deleted = repository::delete_product_image(conn, product.id, image_id)?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(HttpResponse::NoContent().finish())
}

use actix_web::{web, HttpResponse};

use crate::auth::AuthUser;
use crate::db::models::UpdateCategory;
use crate::db::repository;
use crate::error::ApiError;
use crate::handlers::products::product_list_payload;
use crate::models::{CategoryQuery, CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest};
use crate::AppState;

pub async fn list_categories(
    data: web::Data<AppState>,
    query: web::Query<CategoryQuery>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    let matched = repository::search_categories(
        conn,
        query.search.as_deref(),
        query.ordering.as_deref(),
    )?;
    let all = repository::get_all_categories(conn)?;
    let counts = repository::product_counts(conn)?;
    let payload: Vec<CategoryResponse> = matched
        .iter()
        .map(|c| CategoryResponse::build(c, &all, &counts))
        .collect();
    Ok(HttpResponse::Ok().json(payload))
}

/// Main categories with their subcategories nested, for the storefront menu.
pub async fn main_categories(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    let all = repository::get_all_categories(conn)?;
    let counts = repository::product_counts(conn)?;
    let payload: Vec<CategoryResponse> = all
        .iter()
        .filter(|c| c.is_main_category())
        .map(|c| CategoryResponse::build(c, &all, &counts))
        .collect();
    Ok(HttpResponse::Ok().json(payload))
}

pub async fn get_category(
    data: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    let category = repository::find_category_by_slug(conn, &slug)?;
    let all = repository::get_all_categories(conn)?;
    let counts = repository::product_counts(conn)?;
    Ok(HttpResponse::Ok().json(CategoryResponse::build(&category, &all, &counts)))
}

/// Products of the category and every descendant. Unknown slugs are a 404
/// here, unlike the lenient product-list filter.
pub async fn category_products(
    data: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    let category = repository::find_category_by_slug(conn, &slug)?;
    let products = repository::products_in_subtree(conn, category.id)?;
    let payload = product_list_payload(conn, &products)?;
    Ok(HttpResponse::Ok().json(payload))
}

pub async fn create_category(
    data: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    repository::require_admin(conn, auth.user_id)?;

    let req = req.into_inner();
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Category name cannot be empty".into()));
    }
    if let Some(parent) = req.parent {
        if repository::get_all_categories(conn)?
            .iter()
            .all(|c| c.id != parent)
        {
            return Err(ApiError::Validation("Parent category does not exist".into()));
        }
    }

    let category =
        repository::create_category(conn, req.name, req.icon, req.icon_file, req.parent)?;
    log::info!("category {} created (slug {})", category.id, category.slug);
    let all = repository::get_all_categories(conn)?;
    let counts = repository::product_counts(conn)?;
    Ok(HttpResponse::Created().json(CategoryResponse::build(&category, &all, &counts)))
}

pub async fn update_category(
    data: web::Data<AppState>,
    auth: AuthUser,
    slug: web::Path<String>,
    req: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    repository::require_admin(conn, auth.user_id)?;

    let category = repository::find_category_by_slug(conn, &slug)?;
    let req = req.into_inner();
    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("Category name cannot be empty".into()));
        }
    }
    if let Some(parent) = req.parent {
        let all = repository::get_all_categories(conn)?;
        if all.iter().all(|c| c.id != parent) {
            return Err(ApiError::Validation("Parent category does not exist".into()));
        }
        if repository::would_create_cycle(&all, category.id, parent) {
            return Err(ApiError::Validation(
                "A category cannot be its own ancestor".into(),
            ));
        }
    }

    let updated = repository::update_category(
        conn,
        category.id,
        UpdateCategory {
            name: req.name,
            icon: req.icon,
            icon_file: req.icon_file,
            parent_id: req.parent,
        },
    )?;
    let all = repository::get_all_categories(conn)?;
    let counts = repository::product_counts(conn)?;
    Ok(HttpResponse::Ok().json(CategoryResponse::build(&updated, &all, &counts)))
}

pub async fn delete_category(
    data: web::Data<AppState>,
    auth: AuthUser,
    slug: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    repository::require_admin(conn, auth.user_id)?;

    let category = repository::find_category_by_slug(conn, &slug)?;
    repository::delete_category(conn, category.id)?;
    log::info!(
        "category {} deleted (cascades to subtree and products)",
        category.id
    );
    Ok(HttpResponse::NoContent().finish())
}

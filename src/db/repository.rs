use std::collections::{HashMap, HashSet};

use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;

use crate::db::models::*;
use crate::db::schema::{categories, product_images, products, site_settings, users};
use crate::error::ApiError;
use crate::slugs;

/// The settings table holds exactly one row, always under this id.
pub const SITE_SETTINGS_ID: i32 = 1;

/// Hard cap on gallery images per product.
pub const MAX_GALLERY_IMAGES: i64 = 10;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub fn get_all_categories(conn: &mut PgConnection) -> QueryResult<Vec<Category>> {
    categories::table.order(categories::name.asc()).load(conn)
}

pub fn search_categories(
    conn: &mut PgConnection,
    search: Option<&str>,
    ordering: Option<&str>,
) -> QueryResult<Vec<Category>> {
    let mut query = categories::table.into_boxed();
    if let Some(term) = search {
        query = query.filter(categories::name.ilike(format!("%{}%", term)));
    }
    query = match ordering.unwrap_or("name") {
        "name" => query.order(categories::name.asc()),
        "-name" => query.order(categories::name.desc()),
        "created_at" => query.order(categories::created_at.asc()),
        "-created_at" => query.order(categories::created_at.desc()),
        _ => query.order(categories::name.asc()),
    };
    query.load(conn)
}

pub fn find_category_by_slug(conn: &mut PgConnection, slug: &str) -> QueryResult<Category> {
    categories::table
        .filter(categories::slug.eq(slug))
        .first(conn)
}

pub fn create_category(
    conn: &mut PgConnection,
    name: String,
    icon: Option<String>,
    icon_file: Option<String>,
    parent_id: Option<i32>,
) -> QueryResult<Category> {
    let slug = unique_slug(conn, categories::table, &slugs::slugify(&name))?;
    let new_category = NewCategory {
        name,
        slug,
        icon,
        icon_file,
        parent_id,
    };
    diesel::insert_into(categories::table)
        .values(&new_category)
        .get_result(conn)
}

pub fn update_category(
    conn: &mut PgConnection,
    id: i32,
    changes: UpdateCategory,
) -> QueryResult<Category> {
    diesel::update(categories::table.find(id))
        .set((changes, categories::updated_at.eq(Utc::now().naive_utc())))
        .get_result(conn)
}

/// Cascades to descendant categories and their products via the FK
/// `ON DELETE CASCADE` constraints.
pub fn delete_category(conn: &mut PgConnection, id: i32) -> QueryResult<usize> {
    diesel::delete(categories::table.find(id)).execute(conn)
}

/// Direct product counts keyed by category id.
pub fn product_counts(conn: &mut PgConnection) -> QueryResult<HashMap<i32, i64>> {
    let rows: Vec<(i32, i64)> = products::table
        .group_by(products::category_id)
        .select((products::category_id, count_star()))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}

/// All categories below `root_id`, depth first, excluding the root itself.
///
/// Children are visited in ascending name order so the result is
/// deterministic (the backing store gives no inherent order). The walk uses
/// an explicit stack and a visited set, so deep trees cannot overflow the
/// call stack and an accidental cycle cannot hang the traversal.
pub fn descendants(all: &[Category], root_id: i32) -> Vec<Category> {
    let mut by_parent: HashMap<i32, Vec<&Category>> = HashMap::new();
    for cat in all {
        if let Some(parent) = cat.parent_id {
            by_parent.entry(parent).or_default().push(cat);
        }
    }
    for children in by_parent.values_mut() {
        children.sort_by(|a, b| a.name.cmp(&b.name));
    }

    let mut result = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(root_id);
    let mut stack: Vec<&Category> = Vec::new();
    if let Some(children) = by_parent.get(&root_id) {
        for &child in children.iter().rev() {
            stack.push(child);
        }
    }
    while let Some(cat) = stack.pop() {
        if !visited.insert(cat.id) {
            continue;
        }
        result.push(cat.clone());
        if let Some(children) = by_parent.get(&cat.id) {
            for &child in children.iter().rev() {
                stack.push(child);
            }
        }
    }
    result
}

/// The category itself plus all of its descendants, as ids.
pub fn subtree_ids(all: &[Category], root_id: i32) -> Vec<i32> {
    let mut ids = vec![root_id];
    ids.extend(descendants(all, root_id).iter().map(|c| c.id));
    ids
}

/// True when re-parenting `category_id` under `new_parent_id` would make the
/// category its own ancestor.
pub fn would_create_cycle(all: &[Category], category_id: i32, new_parent_id: i32) -> bool {
    new_parent_id == category_id
        || descendants(all, category_id)
            .iter()
            .any(|c| c.id == new_parent_id)
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

pub struct ProductFilter {
    /// Category slug; the filter expands to the whole subtree. An unknown
    /// slug yields an empty result set rather than an error.
    pub category: Option<String>,
    pub brand: Option<String>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    pub price_min: Option<BigDecimal>,
    pub price_max: Option<BigDecimal>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

pub fn list_products(conn: &mut PgConnection, filter: &ProductFilter) -> QueryResult<Vec<Product>> {
    let category_ids = match &filter.category {
        Some(slug) => match find_category_by_slug(conn, slug) {
            Ok(cat) => {
                let all = get_all_categories(conn)?;
                Some(subtree_ids(&all, cat.id))
            }
            // Lenient by design: an unknown slug in a filter means "no
            // matching results", not an error.
            Err(diesel::result::Error::NotFound) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        },
        None => None,
    };

    let mut query = products::table.into_boxed();

    if let Some(ids) = category_ids {
        query = query.filter(products::category_id.eq_any(ids));
    }
    if let Some(brand) = &filter.brand {
        query = query.filter(products::brand.eq(brand.clone()));
    }
    if let Some(in_stock) = filter.in_stock {
        query = query.filter(products::in_stock.eq(in_stock));
    }
    if let Some(featured) = filter.featured {
        query = query.filter(products::featured.eq(featured));
    }
    if let Some(min) = &filter.price_min {
        query = query.filter(products::price.ge(min.clone()));
    }
    if let Some(max) = &filter.price_max {
        query = query.filter(products::price.le(max.clone()));
    }
    if let Some(term) = &filter.search {
        let pattern = format!("%{}%", term);
        query = query.filter(
            products::name
                .ilike(pattern.clone())
                .or(products::brand.ilike(pattern.clone()))
                .or(products::description.ilike(pattern)),
        );
    }

    query = match filter.ordering.as_deref() {
        Some("name") => query.order(products::name.asc()),
        Some("-name") => query.order(products::name.desc()),
        Some("price") => query.order(products::price.asc()),
        Some("-price") => query.order(products::price.desc()),
        Some("created_at") => query.order(products::created_at.asc()),
        _ => query.order(products::created_at.desc()),
    };

    query.load(conn)
}

/// All products attached to the category or any of its descendants.
pub fn products_in_subtree(conn: &mut PgConnection, category_id: i32) -> QueryResult<Vec<Product>> {
    let all = get_all_categories(conn)?;
    let ids = subtree_ids(&all, category_id);
    products::table
        .filter(products::category_id.eq_any(ids))
        .order(products::created_at.desc())
        .load(conn)
}

pub fn find_product_by_slug(conn: &mut PgConnection, slug: &str) -> QueryResult<Product> {
    products::table.filter(products::slug.eq(slug)).first(conn)
}

pub struct NewProductData {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub brand: String,
    pub image: Option<String>,
    pub category_id: i32,
    pub in_stock: bool,
    pub featured: bool,
}

pub fn create_product(conn: &mut PgConnection, data: NewProductData) -> QueryResult<Product> {
    let base = slugs::slugify(&format!("{}-{}", data.name, data.brand));
    let slug = unique_slug(conn, products::table, &base)?;
    let new_product = NewProduct {
        name: data.name,
        slug,
        description: data.description,
        price: data.price,
        brand: data.brand,
        image: data.image,
        category_id: data.category_id,
        in_stock: data.in_stock,
        featured: data.featured,
    };
    diesel::insert_into(products::table)
        .values(&new_product)
        .get_result(conn)
}

pub fn update_product(
    conn: &mut PgConnection,
    id: i32,
    changes: UpdateProduct,
) -> QueryResult<Product> {
    diesel::update(products::table.find(id))
        .set((changes, products::updated_at.eq(Utc::now().naive_utc())))
        .get_result(conn)
}

pub fn delete_product(conn: &mut PgConnection, id: i32) -> QueryResult<usize> {
    diesel::delete(products::table.find(id)).execute(conn)
}

pub fn featured_products(conn: &mut PgConnection) -> QueryResult<Vec<Product>> {
    products::table
        .filter(products::featured.eq(true))
        .order(products::created_at.desc())
        .limit(8)
        .load(conn)
}

pub fn recent_products(conn: &mut PgConnection) -> QueryResult<Vec<Product>> {
    products::table
        .order(products::created_at.desc())
        .limit(10)
        .load(conn)
}

pub fn distinct_brands(conn: &mut PgConnection) -> QueryResult<Vec<String>> {
    products::table
        .select(products::brand)
        .distinct()
        .order(products::brand.asc())
        .load(conn)
}

pub struct ProductCounts {
    pub total: i64,
    pub in_stock: i64,
    pub out_of_stock: i64,
    pub featured: i64,
    /// Main categories with their direct product counts, name-ordered.
    pub by_category: Vec<(String, i64)>,
}

pub fn product_stats(conn: &mut PgConnection) -> QueryResult<ProductCounts> {
    let total: i64 = products::table.count().get_result(conn)?;
    let in_stock: i64 = products::table
        .filter(products::in_stock.eq(true))
        .count()
        .get_result(conn)?;
    let featured: i64 = products::table
        .filter(products::featured.eq(true))
        .count()
        .get_result(conn)?;

    let counts = product_counts(conn)?;
    let main_cats: Vec<Category> = categories::table
        .filter(categories::parent_id.is_null())
        .order(categories::name.asc())
        .load(conn)?;
    let by_category = main_cats
        .into_iter()
        .map(|c| {
            let count = counts.get(&c.id).copied().unwrap_or(0);
            (c.name, count)
        })
        .collect();

    Ok(ProductCounts {
        total,
        in_stock,
        out_of_stock: total - in_stock,
        featured,
        by_category,
    })
}

// ---------------------------------------------------------------------------
// Gallery images
// ---------------------------------------------------------------------------

pub fn gallery_for_product(
    conn: &mut PgConnection,
    product_id: i32,
) -> QueryResult<Vec<ProductImage>> {
    product_images::table
        .filter(product_images::product_id.eq(product_id))
        .order(product_images::uploaded_at.asc())
        .load(conn)
}

/// Inserts a gallery image, enforcing the per-product cap.
///
/// The owning product row is locked for the duration of the transaction so
/// two concurrent uploads cannot both observe nine images and insert an
/// eleventh.
pub fn add_product_image(
    conn: &mut PgConnection,
    product_id: i32,
    image_path: String,
) -> Result<ProductImage, ApiError> {
    conn.transaction::<_, ApiError, _>(|conn| {
        let _product: Product = products::table.find(product_id).for_update().first(conn)?;
        let count: i64 = product_images::table
            .filter(product_images::product_id.eq(product_id))
            .count()
            .get_result(conn)?;
        if count >= MAX_GALLERY_IMAGES {
            return Err(ApiError::Validation(format!(
                "Maximum {} images par produit.",
                MAX_GALLERY_IMAGES
            )));
        }
        let image = diesel::insert_into(product_images::table)
            .values(&NewProductImage {
                product_id,
                image: image_path,
            })
            .get_result(conn)?;
        Ok(image)
    })
}

pub fn delete_product_image(
    conn: &mut PgConnection,
    product_id: i32,
    image_id: i32,
) -> QueryResult<usize> {
    diesel::delete(
        product_images::table
            .filter(product_images::id.eq(image_id))
            .filter(product_images::product_id.eq(product_id)),
    )
    .execute(conn)
}

// ---------------------------------------------------------------------------
// Site settings singleton
// ---------------------------------------------------------------------------

pub const DEFAULT_WHATSAPP_NUMBER: &str = "237XXXXXXXXX";
pub const DEFAULT_CONTACT_EMAIL: &str = "contact@niasotac.com";
pub const DEFAULT_CONTACT_PHONE: &str = "+229 00 00 00 00";
pub const DEFAULT_CONTACT_ADDRESS: &str = "Cotonou, Bénin";
pub const DEFAULT_COMPANY_NAME: &str = "NIASOTAC TECHNOLOGIE";
pub const DEFAULT_COMPANY_DESCRIPTION: &str =
    "Votre revendeur tech de confiance au Bénin. Produits de qualité à prix compétitifs.";

/// Get-or-create for the singleton row. The conditional insert makes
/// concurrent first-loads race-free: the primary key constraint picks one
/// winner and everyone reads the same row afterwards.
pub fn load_site_settings(conn: &mut PgConnection) -> QueryResult<SiteSettings> {
    diesel::insert_into(site_settings::table)
        .values((
            site_settings::id.eq(SITE_SETTINGS_ID),
            site_settings::whatsapp_number.eq(DEFAULT_WHATSAPP_NUMBER),
            site_settings::contact_email.eq(DEFAULT_CONTACT_EMAIL),
            site_settings::contact_phone.eq(DEFAULT_CONTACT_PHONE),
            site_settings::contact_address.eq(DEFAULT_CONTACT_ADDRESS),
            site_settings::company_name.eq(DEFAULT_COMPANY_NAME),
            site_settings::company_description.eq(DEFAULT_COMPANY_DESCRIPTION),
        ))
        .on_conflict(site_settings::id)
        .do_nothing()
        .execute(conn)?;
    site_settings::table.find(SITE_SETTINGS_ID).first(conn)
}

/// Updates the singleton row, stamping the acting administrator. The fixed
/// id is used regardless of what the caller might think the id is.
pub fn save_site_settings(
    conn: &mut PgConnection,
    changes: UpdateSiteSettings,
    admin_id: i32,
) -> QueryResult<SiteSettings> {
    // Make sure the row exists before updating it.
    load_site_settings(conn)?;
    diesel::update(site_settings::table.find(SITE_SETTINGS_ID))
        .set((
            changes,
            site_settings::updated_at.eq(Utc::now().naive_utc()),
            site_settings::updated_by.eq(Some(admin_id)),
        ))
        .get_result(conn)
}

/// The singleton cannot be removed; deleting it is a no-op by contract.
pub fn delete_site_settings(_conn: &mut PgConnection) -> QueryResult<usize> {
    Ok(0)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub fn find_user(conn: &mut PgConnection, id: i32) -> QueryResult<User> {
    users::table.find(id).first(conn)
}

/// Resolves the bearer identity and checks the staff role. Unknown user ids
/// count as invalid credentials, not as missing resources.
pub fn require_admin(conn: &mut PgConnection, user_id: i32) -> Result<User, ApiError> {
    let user = match find_user(conn, user_id) {
        Ok(user) => user,
        Err(diesel::result::Error::NotFound) => return Err(ApiError::Unauthorized),
        Err(e) => return Err(e.into()),
    };
    if user.role != "Admin" {
        return Err(ApiError::Forbidden);
    }
    Ok(user)
}

pub fn create_user(conn: &mut PgConnection, new_user: NewUser) -> QueryResult<User> {
    diesel::insert_into(users::table)
        .values(&new_user)
        .get_result(conn)
}

// ---------------------------------------------------------------------------
// Slug helpers
// ---------------------------------------------------------------------------

/// Loads the slugs already colliding with `base` and picks a free one.
fn unique_slug<T>(conn: &mut PgConnection, _table: T, base: &str) -> QueryResult<String>
where
    T: SlugTable,
{
    let taken = T::slugs_like(conn, &format!("{}%", base))?;
    Ok(slugs::disambiguate(base, &taken.into_iter().collect()))
}

/// Tables that carry a unique slug column.
trait SlugTable {
    fn slugs_like(conn: &mut PgConnection, pattern: &str) -> QueryResult<Vec<String>>;
}

impl SlugTable for categories::table {
    fn slugs_like(conn: &mut PgConnection, pattern: &str) -> QueryResult<Vec<String>> {
        categories::table
            .select(categories::slug)
            .filter(categories::slug.like(pattern.to_string()))
            .load(conn)
    }
}

impl SlugTable for products::table {
    fn slugs_like(conn: &mut PgConnection, pattern: &str) -> QueryResult<Vec<String>> {
        products::table
            .select(products::slug)
            .filter(products::slug.like(pattern.to_string()))
            .load(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn cat(id: i32, parent_id: Option<i32>, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            slug: slugs::slugify(name),
            icon: None,
            icon_file: None,
            parent_id,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    fn sample_tree() -> Vec<Category> {
        vec![
            cat(1, None, "Ordinateurs"),
            cat(2, Some(1), "Portables"),
            cat(3, Some(1), "Bureau"),
            cat(4, Some(2), "Gaming"),
            cat(5, None, "Imprimantes"),
            cat(6, Some(5), "Laser"),
        ]
    }

    #[test]
    fn descendants_excludes_root_and_unrelated() {
        let all = sample_tree();
        let found = descendants(&all, 1);
        let ids: Vec<i32> = found.iter().map(|c| c.id).collect();
        assert_eq!(found.len(), 3);
        assert!(!ids.contains(&1));
        assert!(!ids.contains(&5));
        assert!(!ids.contains(&6));
    }

    #[test]
    fn descendants_walks_depth_first_by_name() {
        let all = sample_tree();
        let ids: Vec<i32> = descendants(&all, 1).iter().map(|c| c.id).collect();
        // "Bureau" sorts before "Portables"; "Gaming" follows its parent.
        assert_eq!(ids, vec![3, 2, 4]);
    }

    #[test]
    fn descendants_of_leaf_is_empty() {
        let all = sample_tree();
        assert!(descendants(&all, 4).is_empty());
    }

    #[test]
    fn descendants_survives_accidental_cycle() {
        let mut all = sample_tree();
        // Corrupt the data: 1 -> 2 -> 4 -> 1.
        all[0].parent_id = Some(4);
        let ids: Vec<i32> = descendants(&all, 1).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 2, 4]);
    }

    #[test]
    fn subtree_includes_the_root() {
        let all = sample_tree();
        let ids = subtree_ids(&all, 5);
        assert_eq!(ids, vec![5, 6]);
    }

    #[test]
    fn reparenting_under_a_descendant_is_a_cycle() {
        let all = sample_tree();
        assert!(would_create_cycle(&all, 1, 1));
        assert!(would_create_cycle(&all, 1, 4));
        assert!(!would_create_cycle(&all, 2, 5));
    }
}

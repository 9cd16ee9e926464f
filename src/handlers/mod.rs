use actix_web::web;

pub mod categories;
pub mod products;
pub mod settings;

/// Wires the REST surface. Reads are public; writes go through the bearer
/// extractor plus the staff-role check.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/categories")
                    .route(
                        "/main_categories",
                        web::get().to(categories::main_categories),
                    )
                    .route("", web::get().to(categories::list_categories))
                    .route("", web::post().to(categories::create_category))
                    .route(
                        "/{slug}/products",
                        web::get().to(categories::category_products),
                    )
                    .route("/{slug}", web::get().to(categories::get_category))
                    .route("/{slug}", web::put().to(categories::update_category))
                    .route("/{slug}", web::delete().to(categories::delete_category)),
            )
            .service(
                web::scope("/products")
                    .route("/featured", web::get().to(products::featured))
                    .route("/recent", web::get().to(products::recent))
                    .route("/brands", web::get().to(products::brands))
                    .route("/stats", web::get().to(products::stats))
                    .route("", web::get().to(products::list_products))
                    .route("", web::post().to(products::create_product))
                    .route(
                        "/{slug}/images",
                        web::post().to(products::upload_gallery_image),
                    )
                    .route(
                        "/{slug}/images/{image_id}",
                        web::delete().to(products::delete_gallery_image),
                    )
                    .route("/{slug}", web::get().to(products::get_product))
                    .route("/{slug}", web::put().to(products::update_product))
                    .route("/{slug}", web::delete().to(products::delete_product)),
            )
            .service(
                web::scope("/settings")
                    .route("", web::get().to(settings::get_settings))
                    .route("", web::put().to(settings::update_settings)),
            ),
    );
}

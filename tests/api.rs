//! End-to-end API tests. They need a running Postgres (see appsettings.toml
//! or DATABASE_URL), so they are ignored by default:
//!
//!     cargo test -- --ignored

use actix_web::{test, web, App};
use serde_json::Value;

use vitrine::db::connection::init_pool;
use vitrine::{handlers, AppState};

fn app_state() -> web::Data<AppState> {
    dotenv::dotenv().ok();
    web::Data::new(AppState {
        pool: init_pool(),
        media_root: "media".to_string(),
    })
}

#[actix_web::test]
#[ignore = "requires a running Postgres"]
async fn settings_endpoint_lazily_creates_the_singleton() {
    let app = test::init_service(
        App::new()
            .app_data(app_state())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/settings").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("whatsapp_number").is_some());
    assert!(body.get("company_name").is_some());
}

#[actix_web::test]
#[ignore = "requires a running Postgres"]
async fn unknown_category_filter_yields_empty_results() {
    let app = test::init_service(
        App::new()
            .app_data(app_state())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/products?category=does-not-exist")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, serde_json::json!([]));
}

#[actix_web::test]
#[ignore = "requires a running Postgres"]
async fn unknown_product_slug_is_a_404() {
    let app = test::init_service(
        App::new()
            .app_data(app_state())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/products/does-not-exist")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[core::prelude::v1::test]
#[ignore = "requires a running Postgres"]
fn gallery_cap_and_category_cascade() {
    use vitrine::db::repository;
    use vitrine::error::ApiError;

    dotenv::dotenv().ok();
    let pool = init_pool();
    let conn = &mut pool.get().unwrap();

    let category = repository::create_category(
        conn,
        format!("Test cascade {}", uuid::Uuid::new_v4()),
        None,
        None,
        None,
    )
    .unwrap();
    let product = repository::create_product(
        conn,
        repository::NewProductData {
            name: format!("Test product {}", uuid::Uuid::new_v4()),
            description: "test".to_string(),
            price: 1000.into(),
            brand: "Acme".to_string(),
            image: None,
            category_id: category.id,
            in_stock: true,
            featured: false,
        },
    )
    .unwrap();

    for i in 0..10 {
        repository::add_product_image(conn, product.id, format!("gallery/{}.jpg", i)).unwrap();
    }
    let eleventh = repository::add_product_image(conn, product.id, "gallery/10.jpg".to_string());
    assert!(matches!(eleventh, Err(ApiError::Validation(_))));
    assert_eq!(
        repository::gallery_for_product(conn, product.id)
            .unwrap()
            .len(),
        10
    );

    // Deleting the category takes the product and its gallery with it.
    repository::delete_category(conn, category.id).unwrap();
    assert!(matches!(
        repository::find_product_by_slug(conn, &product.slug),
        Err(diesel::result::Error::NotFound)
    ));
    assert!(repository::gallery_for_product(conn, product.id)
        .unwrap()
        .is_empty());
}

#[actix_web::test]
#[ignore = "requires a running Postgres"]
async fn rejected_upload_leaves_no_file_behind() {
    use vitrine::db::models::NewUser;
    use vitrine::db::repository;

    dotenv::dotenv().ok();
    let pool = init_pool();
    let media_root = std::env::temp_dir().join(format!("vitrine-test-{}", uuid::Uuid::new_v4()));
    let media_root_str = media_root.to_str().unwrap().to_string();

    let (product, admin) = {
        let conn = &mut pool.get().unwrap();
        let category = repository::create_category(
            conn,
            format!("Test uploads {}", uuid::Uuid::new_v4()),
            None,
            None,
            None,
        )
        .unwrap();
        let product = repository::create_product(
            conn,
            repository::NewProductData {
                name: format!("Test product {}", uuid::Uuid::new_v4()),
                description: "test".to_string(),
                price: 1000.into(),
                brand: "Acme".to_string(),
                image: None,
                category_id: category.id,
                in_stock: true,
                featured: false,
            },
        )
        .unwrap();
        for i in 0..10 {
            repository::add_product_image(conn, product.id, format!("gallery/{}.jpg", i)).unwrap();
        }
        let admin = repository::create_user(
            conn,
            NewUser {
                username: format!("admin-{}", uuid::Uuid::new_v4()),
                password: "admin".to_string(),
                role: "Admin".to_string(),
            },
        )
        .unwrap();
        (product, admin)
    };

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState {
                pool: pool.clone(),
                media_root: media_root_str,
            }))
            .configure(handlers::configure),
    )
    .await;

    let boundary = "------------------------abcdef0123456789";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"image\"; filename=\"photo.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\
         not-really-a-jpeg\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let req = test::TestRequest::post()
        .uri(&format!("/api/products/{}/images", product.slug))
        .insert_header(("Authorization", format!("Bearer {}", admin.id)))
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    // The product already carries ten images, so the upload is rejected
    // and the file written under the media root must be cleaned up.
    assert_eq!(resp.status().as_u16(), 400);
    let gallery_dir = media_root.join("products/gallery");
    let leftovers = std::fs::read_dir(&gallery_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[core::prelude::v1::test]
#[ignore = "requires a running Postgres"]
fn concurrent_settings_loads_agree_on_one_row() {
    use vitrine::db::repository;

    dotenv::dotenv().ok();
    let pool = init_pool();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            std::thread::spawn(move || {
                let conn = &mut pool.get().unwrap();
                repository::load_site_settings(conn).unwrap()
            })
        })
        .collect();
    let rows: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for row in &rows {
        assert_eq!(row.id, repository::SITE_SETTINGS_ID);
        assert_eq!(row.whatsapp_number, rows[0].whatsapp_number);
    }
}

#[actix_web::test]
#[ignore = "requires a running Postgres"]
async fn writes_without_credentials_are_rejected() {
    let app = test::init_service(
        App::new()
            .app_data(app_state())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .set_json(serde_json::json!({ "name": "Audio" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
}

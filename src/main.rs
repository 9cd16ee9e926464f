use actix_cors::Cors;
use actix_files::Files;
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{web, App, HttpServer};
use config::Config;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use vitrine::db::connection::init_pool;
use vitrine::{handlers, AppState};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Config::builder()
        .add_source(config::File::with_name("appsettings"))
        .build()
        .expect("Failed to load configuration");
    let host = settings
        .get_string("server.host")
        .unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = settings.get_int("server.port").unwrap_or(3001) as u16;
    let media_root = settings
        .get_string("server.media_root")
        .unwrap_or_else(|_| "media".to_string());

    let pool = init_pool();
    {
        let mut conn = pool.get().expect("Failed to get connection from pool");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Failed to run migrations");
    }
    std::fs::create_dir_all(&media_root)?;

    let app_state = web::Data::new(AppState {
        pool,
        media_root: media_root.clone(),
    });

    log::info!("starting HTTP server on http://{}:{}", host, port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(NormalizePath::trim())
            .app_data(app_state.clone())
            .configure(handlers::configure)
            .service(Files::new("/media", media_root.clone()))
    })
    .bind((host, port))?
    .run()
    .await
}

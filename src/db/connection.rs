use config::Config;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};

pub type PgPool = Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Builds the connection pool from `appsettings.toml`, with `DATABASE_URL`
/// taking precedence when set.
pub fn init_pool() -> PgPool {
    let settings = Config::builder()
        .add_source(config::File::with_name("appsettings"))
        .build()
        .expect("Failed to load configuration");

    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| settings.get_string("database.url"))
        .expect("Database URL not found");
    let pool_size = settings.get_int("database.pool_size").unwrap_or(10) as u32;
    let timeout = settings.get_int("database.timeout_seconds").unwrap_or(30) as u64;

    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(pool_size)
        .connection_timeout(std::time::Duration::from_secs(timeout))
        .build(manager)
        .expect("Failed to create pool")
}

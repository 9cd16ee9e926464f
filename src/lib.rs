pub mod auth;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod slugs;
pub mod whatsapp;

use db::connection::PgPool;

/// Shared application state handed to every handler.
pub struct AppState {
    pub pool: PgPool,
    /// Directory uploaded media files are written to and served from.
    pub media_root: String,
}

use actix_web::{web, HttpResponse};

use crate::auth::AuthUser;
use crate::db::models::UpdateSiteSettings;
use crate::db::repository;
use crate::error::ApiError;
use crate::models::{SettingsResponse, UpdateSettingsRequest};
use crate::AppState;

/// Public read of the settings singleton; creates it lazily on first access.
pub async fn get_settings(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    let settings = repository::load_site_settings(conn)?;
    Ok(HttpResponse::Ok().json(SettingsResponse::from(settings)))
}

pub async fn update_settings(
    data: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<UpdateSettingsRequest>,
) -> Result<HttpResponse, ApiError> {
    let conn = &mut data.pool.get()?;
    let admin = repository::require_admin(conn, auth.user_id)?;

    let req = req.into_inner();
    let settings = repository::save_site_settings(
        conn,
        UpdateSiteSettings {
            whatsapp_number: req.whatsapp_number,
            contact_email: req.contact_email,
            contact_phone: req.contact_phone,
            contact_address: req.contact_address,
            company_name: req.company_name,
            company_description: req.company_description,
        },
        admin.id,
    )?;
    log::info!("site settings updated by {}", admin.username);
    Ok(HttpResponse::Ok().json(SettingsResponse::from(settings)))
}

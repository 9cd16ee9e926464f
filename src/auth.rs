use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures::future::{ready, Ready};

use crate::error::ApiError;

/// Identity extracted from `Authorization: Bearer <user id>`.
///
/// Demo-grade token scheme: the bearer token is the user's id and the role
/// check happens against the `users` table in the handler. Reads never use
/// this extractor, so they stay public.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i32,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(auth_header) = req.headers().get("Authorization") {
            if let Ok(auth_str) = auth_header.to_str() {
                if let Some(token) = auth_str.strip_prefix("Bearer ") {
                    if let Ok(user_id) = token.trim().parse::<i32>() {
                        return ready(Ok(AuthUser { user_id }));
                    }
                }
            }
        }
        ready(Err(ApiError::Unauthorized))
    }
}

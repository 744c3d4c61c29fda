use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest};

use crate::error::BookingError;
use crate::models::user::{Principal, Role};

// Set by the upstream auth layer once it has verified the caller's token.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLE_HEADER: &str = "x-user-role";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, BookingError> {
    let not_authenticated = || BookingError::Unauthorized("Not authenticated".to_string());

    let id = header(headers, USER_ID_HEADER).ok_or_else(not_authenticated)?;
    let email = header(headers, USER_EMAIL_HEADER).ok_or_else(not_authenticated)?;
    let role = match header(headers, USER_ROLE_HEADER) {
        Some(role) => role.parse::<Role>().map_err(BookingError::BadRequest)?,
        None => Role::User,
    };

    Ok(Principal {
        id: id.to_string(),
        email: email.to_string(),
        role,
    })
}

impl FromRequest for Principal {
    type Error = BookingError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(principal_from_headers(req.headers()))
    }
}

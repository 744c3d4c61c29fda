use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::BookingError;
use crate::models::booking::CreateBooking;
use crate::models::user::Principal;
use crate::services::bookings::BookingManager;

#[derive(Deserialize)]
pub struct BookingListQuery {
    pub user_id: Option<String>,
}

pub async fn create_booking(
    manager: web::Data<BookingManager>,
    principal: Principal,
    body: web::Json<CreateBooking>,
) -> Result<HttpResponse, BookingError> {
    let booking = manager
        .create_booking(&principal, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(booking))
}

pub async fn list_bookings(
    manager: web::Data<BookingManager>,
    principal: Principal,
    query: web::Query<BookingListQuery>,
) -> Result<HttpResponse, BookingError> {
    let bookings = manager
        .list_bookings_for_user(&principal, query.user_id.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(bookings))
}

pub async fn get_booking(
    manager: web::Data<BookingManager>,
    principal: Principal,
    path: web::Path<String>,
) -> Result<HttpResponse, BookingError> {
    let booking = manager.get_booking(&principal, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(booking))
}

pub async fn cancel_booking(
    manager: web::Data<BookingManager>,
    principal: Principal,
    path: web::Path<String>,
) -> Result<HttpResponse, BookingError> {
    let booking = manager
        .cancel_booking(&principal, &path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(booking))
}

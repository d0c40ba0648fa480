use actix_web::{HttpRequest, HttpResponse, get, post, web};
use uuid::Uuid;

use sapphire_trails::common::GENERIC_FAILURE;
use sapphire_trails::log_err;
use sapphire_trails::models::BookingStatus;

use crate::web::forms::{BookingStatusForm, BookingsQuery};
use crate::web::helpers::{chrome, render, require_admin, toast_redirect};
use crate::web::session::ToastKind;
use crate::web::state::AppState;
use crate::web::templates::AdminBookingsTemplate;

const LIST: &str = "/admin/bookings";

#[get("/admin/bookings")]
pub async fn list(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<BookingsQuery>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }

    let filter = query
        .status
        .as_deref()
        .and_then(|s| s.parse::<BookingStatus>().ok());
    let mut bookings = state.db.list_bookings().await.unwrap_or_else(|e| {
        log_err!(e, serde_json::json!({ "key": "bookings" }));
        Vec::new()
    });
    bookings.retain(|b| filter.is_none_or(|status| b.status == status));
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    render(AdminBookingsTemplate {
        chrome: chrome(&state, &req).await,
        bookings,
        filter: filter.map(|s| s.as_str().to_string()).unwrap_or_default(),
    })
}

#[post("/admin/bookings/{id}/status")]
pub async fn set_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    form: web::Form<BookingStatusForm>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let id = path.into_inner();

    let status = match form.status.parse::<BookingStatus>() {
        Ok(status) if status != BookingStatus::Pending => status,
        _ => {
            return toast_redirect(&state, &req, ToastKind::Error, "Unknown booking status", LIST);
        }
    };

    match state.db.set_booking_status(id, status).await {
        Ok(true) => toast_redirect(
            &state,
            &req,
            ToastKind::Success,
            format!("Booking {status}"),
            LIST,
        ),
        Ok(false) => toast_redirect(&state, &req, ToastKind::Error, "Booking not found", LIST),
        Err(e) => {
            log_err!(e, serde_json::json!({ "booking_id": id, "status": status.as_str() }));
            toast_redirect(&state, &req, ToastKind::Error, GENERIC_FAILURE, LIST)
        }
    }
}

#[post("/admin/bookings/{id}/delete")]
pub async fn delete(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let id = path.into_inner();

    match state.db.delete_booking(id).await {
        Ok(true) => toast_redirect(&state, &req, ToastKind::Success, "Booking deleted", LIST),
        Ok(false) => toast_redirect(&state, &req, ToastKind::Error, "Booking not found", LIST),
        Err(e) => {
            log_err!(e, serde_json::json!({ "booking_id": id }));
            toast_redirect(&state, &req, ToastKind::Error, GENERIC_FAILURE, LIST)
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list).service(set_status).service(delete);
}

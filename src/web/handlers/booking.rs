use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use chrono::Local;
use uuid::Uuid;

use sapphire_trails::log_err;
use sapphire_trails::models::{SessionUser, TourPackage};
use sapphire_trails::services::pricing::format_amount;
use sapphire_trails::services::{BookingForm, MAX_GUESTS, UserAuth, submit_booking};

use crate::web::forms::BookingQuery;
use crate::web::helpers::{chrome, not_found, or_empty, render, session_id, toast, toast_redirect};
use crate::web::session::ToastKind;
use crate::web::state::AppState;
use crate::web::templates::{
    BookingSummaryTemplate, BookingTemplate, ErrorView, EstimateTemplate, TourOption,
};

const BOOKING_ACTION: &str = "booking";

fn estimate_text(amount: Option<f64>) -> String {
    amount
        .map(|total| format!("${}", format_amount(total)))
        .unwrap_or_default()
}

fn tour_options(tours: &[TourPackage], form: &BookingForm) -> Vec<TourOption> {
    let selected = form.tour_id();
    tours
        .iter()
        .filter_map(|tour| {
            let id = tour.id?;
            Some(TourOption {
                id,
                title: tour.display_title().to_string(),
                price: tour.display_price(),
                selected: selected == Some(id),
            })
        })
        .collect()
}

async fn current_user(state: &AppState, req: &HttpRequest) -> Option<SessionUser> {
    UserAuth::new(state.api.as_ref(), &state.db)
        .current_user(session_id(req))
        .await
        .unwrap_or_else(|e| {
            log_err!(e, serde_json::json!({ "path": req.path() }));
            None
        })
}

async fn booking_page(
    state: &AppState,
    req: &HttpRequest,
    form: BookingForm,
    tours: &[TourPackage],
    errors: ErrorView,
) -> HttpResponse {
    render(BookingTemplate {
        chrome: chrome(state, req).await,
        tours: tour_options(tours, &form),
        estimate: estimate_text(form.estimate(tours)),
        form,
        errors,
        max_guests: MAX_GUESTS,
        min_date: Local::now().date_naive().format("%Y-%m-%d").to_string(),
    })
}

#[get("/booking")]
pub async fn booking_form(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<BookingQuery>,
) -> impl Responder {
    let tours = or_empty(state.api.list_tours().await, "tours");
    let user = current_user(&state, &req).await;

    let mut form = BookingForm::for_user(user.as_ref());
    if let Some(tour) = query.tour.as_deref() {
        form.tour_package_id = tour.trim().to_string();
    }
    form.guests = "1".to_string();

    booking_page(&state, &req, form, &tours, ErrorView::default()).await
}

#[post("/booking")]
pub async fn booking_submit(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<BookingForm>,
) -> HttpResponse {
    let sid = session_id(&req);
    let Some(running) = state.sessions.try_begin(sid, BOOKING_ACTION) else {
        return toast_redirect(
            &state,
            &req,
            ToastKind::Warning,
            "Your booking is already being sent",
            "/booking",
        );
    };

    let form = form.into_inner();
    let tours = or_empty(state.api.list_tours().await, "tours");
    let user = current_user(&state, &req).await;
    let today = Local::now().date_naive();

    let result = submit_booking(
        state.api.as_ref(),
        &state.db,
        &form,
        &tours,
        user.as_ref(),
        today,
    )
    .await;
    drop(running);

    match result {
        Ok(booking) => toast_redirect(
            &state,
            &req,
            ToastKind::Success,
            "Booking request sent! We will confirm by email shortly.",
            &format!("/booking/summary/{}", booking.id),
        ),
        Err(err) => {
            let errors = match err.field_errors() {
                Some(errors) => errors.clone().into(),
                None => {
                    log::warn!("Booking failed: {}", err);
                    toast(&state, &req, ToastKind::Error, err.user_message());
                    ErrorView::default()
                }
            };
            booking_page(&state, &req, form, &tours, errors).await
        }
    }
}

/// Fragment swapped in by htmx whenever the tour or guest count changes.
#[post("/booking/estimate")]
pub async fn booking_estimate(
    state: web::Data<AppState>,
    form: web::Form<BookingForm>,
) -> impl Responder {
    let tours = or_empty(state.api.list_tours().await, "tours");
    render(EstimateTemplate {
        estimate: estimate_text(form.estimate(&tours)),
    })
}

#[get("/booking/summary/{id}")]
pub async fn booking_summary(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let Ok(id) = Uuid::parse_str(path.trim()) else {
        return not_found(&state, &req).await;
    };

    match state.db.find_booking(id).await {
        Ok(Some(booking)) => render(BookingSummaryTemplate {
            chrome: chrome(&state, &req).await,
            total: estimate_text(booking.estimated_total),
            booking,
        }),
        Ok(None) => not_found(&state, &req).await,
        Err(e) => {
            log_err!(e, serde_json::json!({ "booking_id": id }));
            HttpResponse::InternalServerError().body("Internal server error")
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(booking_form)
        .service(booking_submit)
        .service(booking_estimate)
        .service(booking_summary);
}

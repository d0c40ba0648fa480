use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};

use sapphire_trails::common::{ApiError, AuthError};
use sapphire_trails::log_err;
use sapphire_trails::services::AdminAuth;

use crate::web::forms::AdminLoginForm;
use crate::web::helpers::{
    chrome, redirect, render, require_admin, session_id, toast_redirect,
};
use crate::web::session::ToastKind;
use crate::web::state::AppState;
use crate::web::templates::{AdminDashboardTemplate, AdminLoginTemplate};

#[get("/admin/login")]
pub async fn login_form(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    render(AdminLoginTemplate {
        chrome: chrome(&state, &req).await,
        username: String::new(),
        error: String::new(),
    })
}

#[post("/admin/login")]
pub async fn login_submit(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<AdminLoginForm>,
) -> HttpResponse {
    let username = form.username.trim().to_string();

    let result = if state.rate_limiter.allow_login("admin-login", &req) {
        AdminAuth::new(&state.db)
            .login(session_id(&req), &username, &form.password)
            .await
    } else {
        Err(AuthError::RateLimited)
    };

    match result {
        Ok(admin) => toast_redirect(
            &state,
            &req,
            ToastKind::Success,
            format!("Signed in as {}", admin.username),
            "/admin",
        ),
        Err(err) => {
            if matches!(err, AuthError::Store(_)) {
                log_err!(err, serde_json::json!({ "username": username }));
            }
            render(AdminLoginTemplate {
                chrome: chrome(&state, &req).await,
                username,
                error: err.user_message(),
            })
        }
    }
}

#[post("/admin/logout")]
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let sid = session_id(&req);
    if let Err(e) = AdminAuth::new(&state.db).logout(sid).await {
        log_err!(e, serde_json::json!({ "session": sid.to_string() }));
    }
    toast_redirect(&state, &req, ToastKind::Success, "Signed out", "/admin/login")
}

#[get("/admin")]
pub async fn dashboard(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }

    let (locations, tours) =
        futures_util::join!(state.api.list_locations(), state.api.list_tours());
    let mut error = String::new();
    let mut count = |result: Result<usize, ApiError>, what: &str| match result {
        Ok(n) => n,
        Err(e) => {
            log_err!(e, serde_json::json!({ "fetch": what }));
            error = e.user_message();
            0
        }
    };
    let location_count = count(locations.map(|l| l.len()), "locations");
    let package_count = count(tours.map(|t| t.len()), "tours");

    let mut bookings = state.db.list_bookings().await.unwrap_or_else(|e| {
        log_err!(e, serde_json::json!({ "key": "bookings" }));
        Vec::new()
    });
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let pending_count = bookings.iter().filter(|b| b.is_pending()).count();
    let booking_count = bookings.len();
    bookings.truncate(5);

    render(AdminDashboardTemplate {
        chrome: chrome(&state, &req).await,
        location_count,
        package_count,
        booking_count,
        pending_count,
        recent: bookings,
        error,
    })
}

/// `/admin/` with a trailing slash lands on the dashboard too.
#[get("/admin/")]
pub async fn dashboard_slash(req: HttpRequest) -> HttpResponse {
    redirect(&req, "/admin")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login_form)
        .service(login_submit)
        .service(logout)
        .service(dashboard)
        .service(dashboard_slash);
}

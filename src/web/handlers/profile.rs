use actix_web::{HttpRequest, HttpResponse, get, post, web};

use sapphire_trails::log_err;
use sapphire_trails::models::SessionUser;
use sapphire_trails::services::UserAuth;

use crate::web::forms::ProfileForm;
use crate::web::helpers::{
    chrome, redirect, render, require_user, session_id, toast, toast_redirect,
};
use crate::web::session::ToastKind;
use crate::web::state::AppState;
use crate::web::templates::ProfileTemplate;

/// The server's copy of the user wins over the session copy when it can be
/// fetched.
async fn refreshed(state: &AppState, user: SessionUser) -> (SessionUser, String) {
    match state.api.get_user(&user.id).await {
        Ok(remote) => {
            let mut user = user;
            for (field, value) in [
                (&mut user.name, remote.name),
                (&mut user.phone, remote.phone),
                (&mut user.email, remote.email),
            ] {
                if !value.trim().is_empty() {
                    *field = value;
                }
            }
            (user, String::new())
        }
        Err(e) => {
            log_err!(e, serde_json::json!({ "user_id": user.id }));
            (user, "Showing saved details; the profile server is unavailable.".to_string())
        }
    }
}

#[get("/profile")]
pub async fn profile(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let user = match require_user(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let (user, error) = refreshed(&state, user).await;
    let mut bookings = state.db.bookings_for_email(&user.email).await.unwrap_or_else(|e| {
        log_err!(e, serde_json::json!({ "user_id": user.id }));
        Vec::new()
    });
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    render(ProfileTemplate {
        chrome: chrome(&state, &req).await,
        user,
        bookings,
        error,
    })
}

#[post("/profile")]
pub async fn profile_update(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<ProfileForm>,
) -> HttpResponse {
    let user = match require_user(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let update = form.changes(&user.name, &user.phone);
    if update.is_empty() {
        return toast_redirect(&state, &req, ToastKind::Warning, "Nothing to update", "/profile");
    }

    let auth = UserAuth::new(state.api.as_ref(), &state.db);
    match auth.update_profile(session_id(&req), &user, update).await {
        Ok(_) => toast(&state, &req, ToastKind::Success, "Profile updated"),
        Err(err) => {
            log::warn!("Profile update for {} failed: {}", user.id, err);
            toast(&state, &req, ToastKind::Error, err.user_message());
        }
    }
    redirect(&req, "/profile")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(profile).service(profile_update);
}

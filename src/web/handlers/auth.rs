use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};

use sapphire_trails::common::{AuthError, FieldErrors};
use sapphire_trails::log_err;
use sapphire_trails::services::{SignupForm, UserAuth};

use crate::web::forms::{AuthQuery, LoginForm, LogoutForm};
use crate::web::helpers::{chrome, redirect, render, safe_next, session_id, toast_redirect};
use crate::web::session::ToastKind;
use crate::web::state::AppState;
use crate::web::templates::{ErrorView, LoginTemplate, SignupTemplate};

async fn login_page(
    state: &AppState,
    req: &HttpRequest,
    email: String,
    next: String,
    error: String,
) -> HttpResponse {
    render(LoginTemplate {
        chrome: chrome(state, req).await,
        email,
        next,
        error,
    })
}

#[get("/login")]
pub async fn login_form(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<AuthQuery>,
) -> impl Responder {
    let next = safe_next(query.next.as_deref()).to_string();
    login_page(&state, &req, String::new(), next, String::new()).await
}

#[post("/login")]
pub async fn login_submit(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<LoginForm>,
) -> HttpResponse {
    let next = safe_next(form.next.as_deref()).to_string();
    let email = form.email.trim().to_string();

    if !state.rate_limiter.allow_login("login", &req) {
        let error = AuthError::RateLimited.user_message();
        return login_page(&state, &req, email, next, error).await;
    }

    let auth = UserAuth::new(state.api.as_ref(), &state.db);
    match auth.login(session_id(&req), &email, &form.password).await {
        Ok(user) => toast_redirect(
            &state,
            &req,
            ToastKind::Success,
            format!("Welcome back, {}!", user.display_name()),
            &next,
        ),
        Err(err) => {
            if matches!(err, AuthError::Store(_)) {
                log_err!(err, serde_json::json!({ "email": email }));
            }
            login_page(&state, &req, email, next, err.user_message()).await
        }
    }
}

#[get("/signup")]
pub async fn signup_form(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    render(SignupTemplate {
        chrome: chrome(&state, &req).await,
        form: SignupForm::default(),
        errors: ErrorView::default(),
    })
}

#[post("/signup")]
pub async fn signup_submit(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<SignupForm>,
) -> HttpResponse {
    let mut form = form.into_inner();
    if let Err(errors) = form.validate() {
        form.password.clear();
        form.confirm_password.clear();
        return render(SignupTemplate {
            chrome: chrome(&state, &req).await,
            form,
            errors: errors.into(),
        });
    }

    let auth = UserAuth::new(state.api.as_ref(), &state.db);
    match auth.signup(session_id(&req), &form).await {
        Ok(user) => toast_redirect(
            &state,
            &req,
            ToastKind::Success,
            format!("Welcome to Sapphire Trails, {}!", user.display_name()),
            "/",
        ),
        Err(err) => {
            log::warn!("Signup for {} failed: {}", form.email.trim(), err);
            form.password.clear();
            form.confirm_password.clear();
            let errors = FieldErrors::single("form", err.user_message());
            render(SignupTemplate {
                chrome: chrome(&state, &req).await,
                form,
                errors: errors.into(),
            })
        }
    }
}

#[post("/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<LogoutForm>,
) -> HttpResponse {
    let sid = session_id(&req);
    let auth = UserAuth::new(state.api.as_ref(), &state.db);
    let target = match auth.logout(sid, &form.from).await {
        Ok(target) => target.to_string(),
        Err(e) => {
            log_err!(e, serde_json::json!({ "session": sid.to_string() }));
            "/".to_string()
        }
    };
    state.sessions.forget(sid);
    state
        .sessions
        .push_toast(sid, ToastKind::Success, "You have been logged out");
    redirect(&req, &target)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login_form)
        .service(login_submit)
        .service(signup_form)
        .service(signup_submit)
        .service(logout);
}

use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use askama::Template;

use sapphire_trails::common::ApiError;
use sapphire_trails::db::SessionId;
use sapphire_trails::log_err;
use sapphire_trails::models::{AdminSession, SessionUser};
use sapphire_trails::services::{AdminAuth, UserAuth};

use crate::web::session::ToastKind;
use crate::web::state::AppState;
use crate::web::templates::{Chrome, NotFoundTemplate};

pub fn is_htmx(req: &HttpRequest) -> bool {
    req.headers()
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|s| s.eq_ignore_ascii_case("true"))
}

/// Session id set by the cookie middleware. Requests that bypassed it get a
/// throwaway id, so nothing they store survives.
pub fn session_id(req: &HttpRequest) -> SessionId {
    req.extensions()
        .get::<SessionId>()
        .copied()
        .unwrap_or_else(|| {
            log::warn!("No session id on request to {}", req.path());
            SessionId::generate()
        })
}

pub fn render<T: Template>(t: T) -> HttpResponse {
    match t.render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(e) => HttpResponse::InternalServerError()
            .content_type("text/plain; charset=utf-8")
            .body(format!("Template error: {e}")),
    }
}

/// 303 to `location`, or an `HX-Redirect` when htmx made the request.
pub fn redirect(req: &HttpRequest, location: &str) -> HttpResponse {
    if is_htmx(req) {
        HttpResponse::Ok()
            .insert_header(("HX-Redirect", location))
            .finish()
    } else {
        HttpResponse::SeeOther()
            .insert_header(("Location", location))
            .finish()
    }
}

pub fn toast(state: &AppState, req: &HttpRequest, kind: ToastKind, message: impl Into<String>) {
    state.sessions.push_toast(session_id(req), kind, message);
}

/// Toast plus redirect, the usual end of a POST handler.
pub fn toast_redirect(
    state: &AppState,
    req: &HttpRequest,
    kind: ToastKind,
    message: impl Into<String>,
    location: &str,
) -> HttpResponse {
    toast(state, req, kind, message);
    redirect(req, location)
}

/// Pages degrade to empty lists when the REST server is unreachable.
pub fn or_empty<T: Default>(result: Result<T, ApiError>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        log_err!(e, serde_json::json!({ "fetch": what }));
        T::default()
    })
}

/// Only same-site paths are followed after login. Browsers read `\` as
/// `/`, so `/\host` would leave the site.
pub fn safe_next(next: Option<&str>) -> &str {
    match next.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

/// Shared page frame: pending toasts, who is signed in, footer copy.
pub async fn chrome(state: &AppState, req: &HttpRequest) -> Chrome {
    let sid = session_id(req);

    let user = UserAuth::new(state.api.as_ref(), &state.db)
        .current_user(sid)
        .await
        .unwrap_or_else(|e| {
            log_err!(e, serde_json::json!({ "session": sid.to_string() }));
            None
        });
    let admin = AdminAuth::new(&state.db)
        .current(sid)
        .await
        .unwrap_or_else(|e| {
            log_err!(e, serde_json::json!({ "session": sid.to_string() }));
            None
        });
    let footer = match state.db.cms_content().await {
        Ok(content) => content.footer,
        Err(e) => {
            log_err!(e, serde_json::json!({ "key": "sapphire-cms-data" }));
            Default::default()
        }
    };

    Chrome {
        path: req.path().to_string(),
        toasts: state.sessions.take_toasts(sid),
        user_name: user
            .as_ref()
            .map(|u| u.display_name().to_string())
            .unwrap_or_default(),
        admin_name: admin.as_ref().map(|a| a.username.clone()).unwrap_or_default(),
        is_superadmin: admin.as_ref().is_some_and(AdminSession::is_superadmin),
        footer,
    }
}

pub async fn require_user(state: &AppState, req: &HttpRequest) -> Result<SessionUser, HttpResponse> {
    let sid = session_id(req);
    match UserAuth::new(state.api.as_ref(), &state.db).current_user(sid).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            let next = urlencoding::encode(req.path()).into_owned();
            Err(redirect(req, &format!("/login?next={next}")))
        }
        Err(e) => {
            log_err!(e, serde_json::json!({ "path": req.path() }));
            Err(HttpResponse::InternalServerError().body("Internal server error"))
        }
    }
}

pub async fn require_admin(state: &AppState, req: &HttpRequest) -> Result<AdminSession, HttpResponse> {
    let sid = session_id(req);
    match AdminAuth::new(&state.db).current(sid).await {
        Ok(Some(admin)) => Ok(admin),
        Ok(None) => Err(redirect(req, "/admin/login")),
        Err(e) => {
            log_err!(e, serde_json::json!({ "path": req.path() }));
            Err(HttpResponse::InternalServerError().body("Internal server error"))
        }
    }
}

pub async fn not_found(state: &AppState, req: &HttpRequest) -> HttpResponse {
    let chrome = chrome(state, req).await;
    match (NotFoundTemplate { chrome }).render() {
        Ok(body) => HttpResponse::NotFound()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(e) => HttpResponse::NotFound().body(format!("Not found ({e})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn htmx_header_is_detected() {
        let req = TestRequest::default()
            .insert_header(("HX-Request", "true"))
            .to_http_request();
        assert!(is_htmx(&req));
        assert!(!is_htmx(&TestRequest::default().to_http_request()));
    }

    #[test]
    fn redirects_follow_the_request_kind() {
        let plain = TestRequest::default().to_http_request();
        let resp = redirect(&plain, "/tours");
        assert_eq!(resp.status(), actix_web::http::StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get("Location").unwrap(), "/tours");

        let htmx = TestRequest::default()
            .insert_header(("HX-Request", "true"))
            .to_http_request();
        let resp = redirect(&htmx, "/tours");
        assert_eq!(resp.headers().get("HX-Redirect").unwrap(), "/tours");
    }

    #[test]
    fn next_paths_stay_on_site() {
        assert_eq!(safe_next(Some("/booking")), "/booking");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(Some("/\\/evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn session_id_comes_from_extensions() {
        let req = TestRequest::default().to_http_request();
        let sid = SessionId::generate();
        req.extensions_mut().insert(sid);
        assert_eq!(session_id(&req), sid);
    }
}

use actix_web::{HttpRequest, HttpResponse, get, post, web};

use sapphire_trails::common::GENERIC_FAILURE;
use sapphire_trails::log_err;

use crate::web::forms::CmsForm;
use crate::web::helpers::{chrome, render, require_admin, toast_redirect};
use crate::web::session::ToastKind;
use crate::web::state::AppState;
use crate::web::templates::{AdminCmsTemplate, ErrorView};

const PAGE: &str = "/admin/cms";

#[get("/admin/cms")]
pub async fn cms_form(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let content = state.db.cms_content().await.unwrap_or_else(|e| {
        log_err!(e, serde_json::json!({ "key": "sapphire-cms-data" }));
        Default::default()
    });

    render(AdminCmsTemplate {
        chrome: chrome(&state, &req).await,
        content,
        errors: ErrorView::default(),
    })
}

#[post("/admin/cms")]
pub async fn cms_save(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<CmsForm>,
) -> HttpResponse {
    let admin = match require_admin(&state, &req).await {
        Ok(admin) => admin,
        Err(resp) => return resp,
    };

    let content = form.into_inner().into_content();
    if let Err(errors) = content.validate() {
        return render(AdminCmsTemplate {
            chrome: chrome(&state, &req).await,
            content,
            errors: errors.into(),
        });
    }

    match state.db.save_cms_content(&content).await {
        Ok(()) => {
            log::info!("Site content updated by '{}'", admin.username);
            toast_redirect(&state, &req, ToastKind::Success, "Site content saved", PAGE)
        }
        Err(e) => {
            log_err!(e, serde_json::json!({ "key": "sapphire-cms-data" }));
            toast_redirect(&state, &req, ToastKind::Error, GENERIC_FAILURE, PAGE)
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(cms_form).service(cms_save);
}

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, get, post, web};

use sapphire_trails::log_err;
use sapphire_trails::services::location_form::{
    LOCATION_STEPS, form_from_location, location_schema, submit_create, submit_update,
};
use sapphire_trails::services::slug::SlugTracker;
use sapphire_trails::services::{FormState, WizardController};

use crate::web::forms::WizardQuery;
use crate::web::helpers::{chrome, render, require_admin, session_id, toast_redirect};
use crate::web::session::{Draft, ToastKind, WizardKind};
use crate::web::state::AppState;
use crate::web::templates::{AdminLocationsTemplate, WizardTemplate};
use crate::web::uploads::read_form;
use crate::web::wizard::{WizardPage, advance, finish_submit, step_response, wizard_view};

const LIST: &str = "/admin/locations";
const NEW: &str = "/admin/locations/new";
const NEW_RESUME: &str = "/admin/locations/new?resume=1";

fn edit_page(slug: &str) -> String {
    format!("/admin/locations/{}/edit", urlencoding::encode(slug))
}

async fn render_wizard(state: &AppState, req: &HttpRequest, draft: &Draft, heading: String, action: String) -> HttpResponse {
    let wizard = wizard_view(
        draft,
        &location_schema(),
        WizardPage {
            heading,
            action,
            cancel: LIST,
            gallery_base: None,
        },
    );
    render(WizardTemplate {
        chrome: chrome(state, req).await,
        wizard,
    })
}

#[get("/admin/locations")]
pub async fn list(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let sid = session_id(&req);
    state.sessions.remove_draft(sid, WizardKind::LocationCreate);
    state.sessions.remove_draft(sid, WizardKind::LocationEdit);

    let (mut locations, error) = match state.api.list_locations().await {
        Ok(locations) => (locations, String::new()),
        Err(e) => {
            log_err!(e, serde_json::json!({ "fetch": "locations" }));
            (Vec::new(), e.user_message())
        }
    };
    locations.sort_by(|a, b| a.title.cmp(&b.title));

    render(AdminLocationsTemplate {
        chrome: chrome(&state, &req).await,
        locations,
        error,
    })
}

#[get("/admin/locations/new")]
pub async fn new_form(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<WizardQuery>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let sid = session_id(&req);
    let kind = WizardKind::LocationCreate;

    let draft = match state.sessions.draft(sid, kind).filter(|_| query.resumes()) {
        Some(draft) => draft,
        None => {
            let draft = Draft::new(
                WizardController::new(LOCATION_STEPS),
                FormState::new(),
                SlugTracker::new(),
            );
            state.sessions.put_draft(sid, kind, draft.clone());
            draft
        }
    };

    render_wizard(&state, &req, &draft, "New location".to_string(), NEW.to_string()).await
}

#[post("/admin/locations/new")]
pub async fn new_step(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: Multipart,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let form = match read_form(payload).await {
        Ok(form) => form,
        Err(e) => return toast_redirect(&state, &req, ToastKind::Error, e.to_string(), NEW_RESUME),
    };

    let sid = session_id(&req);
    let kind = WizardKind::LocationCreate;
    let schema = location_schema();
    let outcome = state
        .sessions
        .update_draft(sid, kind, |draft| advance(draft, &schema, "title", form));
    let (snapshot, submit) = match step_response(&state, &req, kind, outcome, NEW_RESUME, NEW) {
        Ok(held) => held,
        Err(resp) => return resp,
    };

    let result = submit_create(state.api.as_ref(), &snapshot.state).await;
    finish_submit(&state, &req, kind, submit, result, NEW_RESUME, LIST)
}

#[get("/admin/locations/{slug}/edit")]
pub async fn edit_form(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<WizardQuery>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let slug = path.into_inner();
    let sid = session_id(&req);
    let kind = WizardKind::LocationEdit;

    let resumed = state
        .sessions
        .draft(sid, kind)
        .filter(|draft| query.resumes() && draft.targets(Some(&slug)));
    let draft = match resumed {
        Some(draft) => draft,
        None => match state.api.get_location(&slug).await {
            Ok(location) => {
                let mut draft = Draft::new(
                    WizardController::new(LOCATION_STEPS),
                    form_from_location(&location),
                    SlugTracker::from_existing(&location.slug),
                );
                draft.target = Some(slug.clone());
                state.sessions.put_draft(sid, kind, draft.clone());
                draft
            }
            Err(e) => {
                log_err!(e, serde_json::json!({ "location": slug }));
                return toast_redirect(&state, &req, ToastKind::Error, e.user_message(), LIST);
            }
        },
    };

    let heading = format!("Edit {}", draft.state.value("title"));
    render_wizard(&state, &req, &draft, heading, edit_page(&slug)).await
}

#[post("/admin/locations/{slug}/edit")]
pub async fn edit_step(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    payload: Multipart,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let slug = path.into_inner();
    let page = edit_page(&slug);
    let resume = format!("{page}?resume=1");

    let form = match read_form(payload).await {
        Ok(form) => form,
        Err(e) => return toast_redirect(&state, &req, ToastKind::Error, e.to_string(), &resume),
    };

    let sid = session_id(&req);
    let kind = WizardKind::LocationEdit;
    let schema = location_schema();
    let outcome = state
        .sessions
        .update_draft(sid, kind, |draft| {
            draft
                .targets(Some(&slug))
                .then(|| advance(draft, &schema, "title", form))
        })
        .flatten();
    let (snapshot, submit) = match step_response(&state, &req, kind, outcome, &resume, &page) {
        Ok(held) => held,
        Err(resp) => return resp,
    };

    let result = submit_update(state.api.as_ref(), &slug, &snapshot.state).await;
    finish_submit(&state, &req, kind, submit, result, &resume, LIST)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(new_form)
        .service(new_step)
        .service(edit_form)
        .service(edit_step);
}

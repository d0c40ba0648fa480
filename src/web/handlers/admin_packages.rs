use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, get, post, web};

use sapphire_trails::common::ApiError;
use sapphire_trails::db::SessionId;
use sapphire_trails::log_err;
use sapphire_trails::services::package_form::{
    PACKAGE_CREATE_STEPS, PACKAGE_EDIT_STEPS, form_from_tour, package_schema, submit_create,
    submit_update,
};
use sapphire_trails::services::slug::SlugTracker;
use sapphire_trails::services::{
    FormState, GalleryEditor, GallerySlot, ItemSave, Removal, WizardController, delete_item,
    save_item,
};

use crate::web::forms::WizardQuery;
use crate::web::helpers::{chrome, redirect, render, require_admin, session_id, toast, toast_redirect};
use crate::web::session::{Draft, SessionRegistry, ToastKind, WizardKind};
use crate::web::state::AppState;
use crate::web::templates::{AdminPackagesTemplate, WizardTemplate};
use crate::web::uploads::read_form;
use crate::web::wizard::{
    WizardPage, advance, expired, finish_submit, step_response, wizard_view,
};

const LIST: &str = "/admin/packages";
const NEW: &str = "/admin/packages/new";
const NEW_RESUME: &str = "/admin/packages/new?resume=1";
const TITLE_FIELD: &str = "homepage_title";

fn edit_page(id: i64) -> String {
    format!("/admin/packages/{id}/edit")
}

fn edit_resume(id: i64) -> String {
    format!("/admin/packages/{id}/edit?resume=1")
}

#[get("/admin/packages")]
pub async fn list(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let sid = session_id(&req);
    state.sessions.remove_draft(sid, WizardKind::PackageCreate);
    state.sessions.remove_draft(sid, WizardKind::PackageEdit);

    let (tours, error) = match state.api.list_tours().await {
        Ok(tours) => (tours, String::new()),
        Err(e) => {
            log_err!(e, serde_json::json!({ "fetch": "tours" }));
            (Vec::new(), e.user_message())
        }
    };

    render(AdminPackagesTemplate {
        chrome: chrome(&state, &req).await,
        tours,
        error,
    })
}

#[get("/admin/packages/new")]
pub async fn new_form(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<WizardQuery>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let sid = session_id(&req);
    let kind = WizardKind::PackageCreate;

    let draft = match state.sessions.draft(sid, kind).filter(|_| query.resumes()) {
        Some(draft) => draft,
        None => {
            let draft = Draft::new(
                WizardController::new(PACKAGE_CREATE_STEPS),
                FormState::new(),
                SlugTracker::new(),
            );
            state.sessions.put_draft(sid, kind, draft.clone());
            draft
        }
    };

    let wizard = wizard_view(
        &draft,
        &package_schema(true),
        WizardPage {
            heading: "New tour package".to_string(),
            action: NEW.to_string(),
            cancel: LIST,
            gallery_base: None,
        },
    );
    render(WizardTemplate {
        chrome: chrome(&state, &req).await,
        wizard,
    })
}

#[post("/admin/packages/new")]
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
    let kind = WizardKind::PackageCreate;
    let schema = package_schema(true);
    let outcome = state
        .sessions
        .update_draft(sid, kind, |draft| advance(draft, &schema, TITLE_FIELD, form));
    let (snapshot, submit) = match step_response(&state, &req, kind, outcome, NEW_RESUME, NEW) {
        Ok(held) => held,
        Err(resp) => return resp,
    };

    let result = submit_create(state.api.as_ref(), &snapshot.state).await;
    finish_submit(&state, &req, kind, submit, result, NEW_RESUME, LIST)
}

#[get("/admin/packages/{id}/edit")]
pub async fn edit_form(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<WizardQuery>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let id = path.into_inner();
    let target = id.to_string();
    let sid = session_id(&req);
    let kind = WizardKind::PackageEdit;

    let resumed = state
        .sessions
        .draft(sid, kind)
        .filter(|draft| query.resumes() && draft.targets(Some(&target)));
    let draft = match resumed {
        Some(draft) => draft,
        None => match state.api.get_tour(id).await {
            Ok(tour) => {
                let (form_state, gallery) = form_from_tour(&tour);
                let mut draft = Draft::new(
                    WizardController::new(PACKAGE_EDIT_STEPS),
                    form_state,
                    SlugTracker::from_existing(&tour.slug),
                );
                draft.gallery = gallery;
                draft.target = Some(target);
                state.sessions.put_draft(sid, kind, draft.clone());
                draft
            }
            Err(e) => {
                log_err!(e, serde_json::json!({ "tour_id": id }));
                return toast_redirect(&state, &req, ToastKind::Error, e.user_message(), LIST);
            }
        },
    };

    let wizard = wizard_view(
        &draft,
        &package_schema(false),
        WizardPage {
            heading: format!("Edit {}", draft.state.value(TITLE_FIELD)),
            action: edit_page(id),
            cancel: LIST,
            gallery_base: Some(format!("/admin/packages/{id}/gallery")),
        },
    );
    render(WizardTemplate {
        chrome: chrome(&state, &req).await,
        wizard,
    })
}

#[post("/admin/packages/{id}/edit")]
pub async fn edit_step(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: Multipart,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let id = path.into_inner();
    let target = id.to_string();
    let resume = edit_resume(id);

    let form = match read_form(payload).await {
        Ok(form) => form,
        Err(e) => return toast_redirect(&state, &req, ToastKind::Error, e.to_string(), &resume),
    };

    let sid = session_id(&req);
    let kind = WizardKind::PackageEdit;
    let schema = package_schema(false);
    let outcome = state
        .sessions
        .update_draft(sid, kind, |draft| {
            draft
                .targets(Some(&target))
                .then(|| advance(draft, &schema, TITLE_FIELD, form))
        })
        .flatten();
    let (snapshot, submit) = match step_response(&state, &req, kind, outcome, &resume, &edit_page(id)) {
        Ok(held) => held,
        Err(resp) => return resp,
    };

    let Draft {
        state: form_state,
        mut gallery,
        ..
    } = *snapshot;
    let result = submit_update(state.api.as_ref(), id, &form_state, &mut gallery).await;
    state
        .sessions
        .update_draft(sid, kind, |draft| draft.gallery = gallery);
    finish_submit(&state, &req, kind, submit, result, &resume, LIST)
}

/// Gallery of the package edit draft, when that draft is for `target`.
struct DraftGallery<'a> {
    sessions: &'a SessionRegistry,
    sid: SessionId,
    target: String,
}

impl<'a> DraftGallery<'a> {
    fn new(state: &'a AppState, req: &HttpRequest, id: i64) -> Self {
        Self {
            sessions: &state.sessions,
            sid: session_id(req),
            target: id.to_string(),
        }
    }
}

impl GallerySlot for DraftGallery<'_> {
    fn update<R>(&self, f: impl FnOnce(&mut GalleryEditor) -> R) -> Option<R> {
        self.sessions
            .update_draft(self.sid, WizardKind::PackageEdit, |draft| {
                draft
                    .targets(Some(&self.target))
                    .then(|| f(&mut draft.gallery))
            })
            .flatten()
    }
}

#[post("/admin/packages/{id}/gallery/add")]
pub async fn gallery_add(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: Multipart,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let id = path.into_inner();
    let resume = edit_resume(id);

    let mut form = match read_form(payload).await {
        Ok(form) => form,
        Err(e) => return toast_redirect(&state, &req, ToastKind::Error, e.to_string(), &resume),
    };
    let Some(upload) = form.uploads.remove("image") else {
        return toast_redirect(&state, &req, ToastKind::Error, "Choose an image to add", &resume);
    };

    let slot = DraftGallery::new(&state, &req, id);
    let added = slot.update(|gallery| gallery.add_new(upload, form.value("alt_text"), form.value("hint")));
    let Some(index) = added else {
        return expired(&state, &req, &edit_page(id));
    };
    toast_redirect(
        &state,
        &req,
        ToastKind::Success,
        format!("Image {} added; it uploads when the package is saved", index + 1),
        &resume,
    )
}

#[post("/admin/packages/{id}/gallery/{index}/save")]
pub async fn gallery_save(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(i64, usize)>,
    payload: Multipart,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let (id, index) = path.into_inner();
    let resume = edit_resume(id);

    let mut form = match read_form(payload).await {
        Ok(form) => form,
        Err(e) => return toast_redirect(&state, &req, ToastKind::Error, e.to_string(), &resume),
    };
    let upload = form.uploads.remove("image");

    let slot = DraftGallery::new(&state, &req, id);
    let saved = save_item(
        &slot,
        state.api.as_ref(),
        index,
        form.value("alt_text"),
        form.value("hint"),
        upload,
    )
    .await;
    match saved {
        Ok(None) => return expired(&state, &req, &edit_page(id)),
        Ok(Some(ItemSave::Sent(reply))) => toast(
            &state,
            &req,
            ToastKind::Success,
            reply.message.unwrap_or_else(|| "Gallery image updated".to_string()),
        ),
        Ok(Some(ItemSave::Queued)) => toast(
            &state,
            &req,
            ToastKind::Success,
            "Image details updated; it uploads when the package is saved",
        ),
        Err(ApiError::InvalidRequest(_)) => {
            toast(&state, &req, ToastKind::Error, "That image no longer exists")
        }
        Err(e) => {
            log_err!(e, serde_json::json!({ "tour_id": id, "index": index }));
            toast(&state, &req, ToastKind::Error, e.user_message());
        }
    }
    redirect(&req, &resume)
}

#[post("/admin/packages/{id}/gallery/{index}/delete")]
pub async fn gallery_delete(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(i64, usize)>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let (id, index) = path.into_inner();
    let resume = edit_resume(id);

    let slot = DraftGallery::new(&state, &req, id);
    match delete_item(&slot, state.api.as_ref(), index).await {
        Ok(None) => expired(&state, &req, &edit_page(id)),
        Ok(Some(removal)) => {
            let message = match removal {
                Removal::Remote(_) => "Gallery image deleted",
                Removal::Local => "Gallery image removed",
            };
            toast_redirect(&state, &req, ToastKind::Success, message, &resume)
        }
        Err(ApiError::InvalidRequest(_)) => toast_redirect(
            &state,
            &req,
            ToastKind::Error,
            "That image no longer exists",
            &resume,
        ),
        Err(e) => {
            log_err!(e, serde_json::json!({ "tour_id": id, "index": index }));
            toast_redirect(&state, &req, ToastKind::Error, e.user_message(), &resume)
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(new_form)
        .service(new_step)
        .service(edit_form)
        .service(edit_step)
        .service(gallery_add)
        .service(gallery_save)
        .service(gallery_delete);
}

//! Step handling shared by the location and package wizards.
//!
//! Each step is a multipart POST carrying the step's inputs plus an
//! `_action` of `prev`, `next` or `submit`. The draft lives in the session
//! registry; the handler redirects back to the wizard page afterwards.

use actix_web::{HttpRequest, HttpResponse};

use sapphire_trails::common::SubmitError;
use sapphire_trails::models::Icon;
use sapphire_trails::services::{InputKind, Schema, SubmitOutcome};

use crate::web::helpers::{redirect, session_id, toast};
use crate::web::session::{Draft, InFlight, ToastKind, WizardKind};
use crate::web::state::AppState;
use crate::web::templates::{FieldView, GalleryItemView, IconOption, StepView, WizardView};
use crate::web::uploads::PostedForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Prev,
    Next,
    Submit,
}

impl StepAction {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "prev" => Self::Prev,
            "submit" => Self::Submit,
            _ => Self::Next,
        }
    }
}

#[derive(Debug)]
pub enum StepOutcome {
    Moved,
    /// Validation failed; the draft now shows the offending step.
    Invalid(usize),
    /// Full validation passed and the draft is marked as submitting. Holds
    /// the snapshot to send.
    Submit(Box<Draft>),
    /// A submit for this draft is already running.
    Busy,
}

/// Merges one posted step into the draft and moves the wizard. Runs under
/// the registry lock, so two racing submits cannot both get through.
pub fn advance(draft: &mut Draft, schema: &Schema, title_field: &str, form: PostedForm) -> StepOutcome {
    let action = StepAction::parse(form.value("_action"));
    let step = draft.controller.current();

    schema.merge_step(step, &mut draft.state, &form.values, form.uploads);
    if step.owns(title_field) {
        let title = draft.state.value(title_field).to_string();
        let posted_slug = draft.state.value("slug").to_string();
        let slug = draft.slug.apply(&title, &posted_slug).to_string();
        draft.state.set("slug", slug);
    }

    match action {
        StepAction::Prev => {
            draft.errors = Default::default();
            draft.controller.go_prev();
            StepOutcome::Moved
        }
        StepAction::Next => match draft.controller.go_next(schema, &draft.state) {
            Ok(_) => {
                draft.errors = Default::default();
                StepOutcome::Moved
            }
            Err(errors) => {
                let count = errors.len();
                draft.errors = errors;
                StepOutcome::Invalid(count)
            }
        },
        StepAction::Submit => {
            if draft.submitting {
                return StepOutcome::Busy;
            }
            match draft.controller.validate_all(schema, &draft.state) {
                Ok(()) => {
                    draft.errors = Default::default();
                    draft.submitting = true;
                    StepOutcome::Submit(Box::new(draft.clone()))
                }
                Err(errors) => {
                    let count = errors.len();
                    draft.errors = errors;
                    StepOutcome::Invalid(count)
                }
            }
        }
    }
}

/// Toasts for a step that did not lead to a submit. On `Ok` the caller sends
/// the snapshot while holding the guard, which keeps the draft busy.
pub fn step_response<'a>(
    state: &'a AppState,
    req: &HttpRequest,
    kind: WizardKind,
    outcome: Option<StepOutcome>,
    page: &str,
    start_page: &str,
) -> Result<(Box<Draft>, InFlight<'a>), HttpResponse> {
    match outcome {
        None => Err(expired(state, req, start_page)),
        Some(StepOutcome::Submit(snapshot)) => {
            let submit = state.sessions.hold_submit(session_id(req), kind);
            Ok((snapshot, submit))
        }
        Some(StepOutcome::Moved) => Err(redirect(req, page)),
        Some(StepOutcome::Invalid(count)) => {
            let noun = if count == 1 { "field needs" } else { "fields need" };
            toast(state, req, ToastKind::Error, format!("{count} {noun} attention"));
            Err(redirect(req, page))
        }
        Some(StepOutcome::Busy) => {
            toast(
                state,
                req,
                ToastKind::Warning,
                "This form is already being submitted",
            );
            Err(redirect(req, page))
        }
    }
}

pub fn expired(state: &AppState, req: &HttpRequest, start_page: &str) -> HttpResponse {
    toast(
        state,
        req,
        ToastKind::Warning,
        "The form expired. Please start again.",
    );
    redirect(req, start_page)
}

/// Releases the draft and turns the result into toasts. Success drops the
/// draft and goes to `done_page`; failure returns to the wizard.
pub fn finish_submit(
    state: &AppState,
    req: &HttpRequest,
    kind: WizardKind,
    submit: InFlight<'_>,
    result: Result<SubmitOutcome, SubmitError>,
    page: &str,
    done_page: &str,
) -> HttpResponse {
    let sid = session_id(req);
    match result {
        Ok(outcome) => {
            state.sessions.remove_draft(sid, kind);
            drop(submit);
            toast(state, req, ToastKind::Success, outcome.message);
            for warning in outcome.warnings {
                toast(state, req, ToastKind::Warning, warning);
            }
            redirect(req, done_page)
        }
        Err(err) => {
            log::warn!("Wizard {:?} submit failed: {}", kind, err);
            let message = err.user_message();
            if let SubmitError::Invalid(errors) = err {
                state.sessions.update_draft(sid, kind, |draft| draft.errors = errors);
            }
            drop(submit);
            toast(state, req, ToastKind::Error, message);
            redirect(req, page)
        }
    }
}

fn input_kind(input: InputKind) -> &'static str {
    match input {
        InputKind::Text => "text",
        InputKind::TextArea => "textarea",
        InputKind::Url => "url",
        InputKind::Email => "email",
        InputKind::Number => "number",
        InputKind::Date => "date",
        InputKind::File => "file",
        InputKind::Icon => "icon",
        InputKind::Checkbox => "checkbox",
    }
}

pub struct WizardPage<'a> {
    pub heading: String,
    pub action: String,
    pub cancel: &'a str,
    /// Base URL of the gallery item routes, for wizards with a gallery step.
    pub gallery_base: Option<String>,
}

pub fn wizard_view(draft: &Draft, schema: &Schema, page: WizardPage<'_>) -> WizardView {
    let controller = &draft.controller;
    let current = controller.current();

    let steps = controller
        .steps()
        .iter()
        .enumerate()
        .map(|(i, step)| StepView {
            number: i + 1,
            title: step.title,
            status: match i.cmp(&controller.index()) {
                std::cmp::Ordering::Less => "done",
                std::cmp::Ordering::Equal => "current",
                std::cmp::Ordering::Greater => "todo",
            },
        })
        .collect();

    let first_error = draft.errors.first_path();
    let fields = schema
        .fields_for(current)
        .map(|field| {
            let state = &draft.state;
            let path = field.path.as_str();
            let kind = input_kind(field.input);
            let value = match field.input {
                InputKind::Checkbox if state.flag(path) => "1".to_string(),
                InputKind::Checkbox => String::new(),
                _ => state.value(path).to_string(),
            };
            let icons = if field.input == InputKind::Icon {
                let chosen = Icon::lookup(&value);
                Icon::ALL
                    .iter()
                    .map(|icon| IconOption {
                        name: icon.as_str(),
                        selected: chosen == Some(*icon),
                    })
                    .collect()
            } else {
                Vec::new()
            };
            FieldView {
                path: field.path.clone(),
                label: field.label.clone(),
                kind,
                preview: if field.input == InputKind::File {
                    value.clone()
                } else {
                    String::new()
                },
                pending: state
                    .upload(path)
                    .map(|u| u.filename.clone())
                    .unwrap_or_default(),
                error: draft.errors.get(path).unwrap_or_default().to_string(),
                required: field.is_required(),
                focus: first_error == Some(path),
                value,
                icons,
            }
        })
        .collect();

    let show_gallery = page.gallery_base.is_some() && current.id == "gallery";
    let gallery = draft
        .gallery
        .items()
        .iter()
        .enumerate()
        .map(|(index, item)| GalleryItemView {
            index,
            src: item.src.clone(),
            alt_text: item.alt_text.clone(),
            hint: item.hint.clone(),
            is_new: item.is_new,
            pending: item
                .pending
                .as_ref()
                .map(|u| u.filename.clone())
                .unwrap_or_default(),
        })
        .collect();

    WizardView {
        heading: page.heading,
        action: page.action,
        cancel: page.cancel.to_string(),
        steps,
        step_title: current.title.to_string(),
        fields,
        is_first: controller.is_first(),
        is_last: controller.is_last(),
        submitting: draft.submitting,
        error_count: draft.errors.len(),
        show_gallery,
        gallery_base: page.gallery_base.unwrap_or_default(),
        gallery,
    }
}

use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};

use sapphire_trails::common::ApiError;
use sapphire_trails::log_err;
use sapphire_trails::models::{Location, TourPackage};
use sapphire_trails::services::TaglineSection;

use crate::web::forms::ContactForm;
use crate::web::helpers::{chrome, not_found, or_empty, render, toast_redirect};
use crate::web::session::ToastKind;
use crate::web::state::AppState;
use crate::web::templates::{
    AboutTemplate, ContactTemplate, ErrorView, HomeTemplate, LocationTemplate, TESTIMONIALS,
    TourDetailTemplate, ToursTemplate,
};

/// Orders every nested list the way pages show it.
pub fn sort_tour(tour: &mut TourPackage) {
    tour.highlights.sort_by_key(|h| h.sort_order);
    tour.inclusions.sort_by_key(|i| i.sort_order);
    tour.itinerary.sort_by_key(|s| s.sort_order);
    tour.experience_gallery.sort_by_key(|g| g.sort_order);
}

pub fn sort_location(location: &mut Location) {
    location.gallery_images.sort_by_key(|g| g.sort_order);
    location.highlights.sort_by_key(|h| h.sort_order);
    location.visitor_info.sort_by_key(|v| v.sort_order);
    location.nearby_attractions.sort_by_key(|n| n.sort_order);
}

fn is_missing(err: &ApiError) -> bool {
    err.status() == Some(404)
}

#[get("/")]
pub async fn home(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let (locations, tour_list, tagline) = futures_util::join!(
        state.api.list_locations(),
        state.api.list_tours(),
        state.taglines.tagline(TaglineSection::HomeHero),
    );
    let cms = state.db.cms_content().await.unwrap_or_else(|e| {
        log_err!(e, serde_json::json!({ "key": "sapphire-cms-data" }));
        Default::default()
    });

    render(HomeTemplate {
        chrome: chrome(&state, &req).await,
        hero: cms.hero,
        discover: cms.discover,
        tagline,
        locations: or_empty(locations, "locations"),
        tours: or_empty(tour_list, "tours"),
        testimonials: TESTIMONIALS,
    })
}

#[get("/about")]
pub async fn about(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    render(AboutTemplate {
        chrome: chrome(&state, &req).await,
    })
}

#[get("/contact")]
pub async fn contact_form(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    render(ContactTemplate {
        chrome: chrome(&state, &req).await,
        form: ContactForm::default(),
        errors: ErrorView::default(),
    })
}

#[post("/contact")]
pub async fn contact_submit(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<ContactForm>,
) -> HttpResponse {
    let form = form.into_inner();
    if let Err(errors) = form.validate() {
        return render(ContactTemplate {
            chrome: chrome(&state, &req).await,
            form,
            errors: errors.into(),
        });
    }

    log::info!("Contact message from {} <{}>", form.name.trim(), form.email.trim());
    toast_redirect(
        &state,
        &req,
        ToastKind::Success,
        format!(
            "Thanks {}, your message has been sent. We will be in touch soon.",
            form.name.trim()
        ),
        "/contact",
    )
}

#[get("/tours")]
pub async fn tours(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let (tours, cta_tagline) = futures_util::join!(
        state.api.list_tours(),
        state.taglines.tagline(TaglineSection::ToursCta),
    );
    let (tours, error) = match tours {
        Ok(tours) => (tours, String::new()),
        Err(e) => {
            log_err!(e, serde_json::json!({ "fetch": "tours" }));
            (Vec::new(), e.user_message())
        }
    };

    render(ToursTemplate {
        chrome: chrome(&state, &req).await,
        tours,
        cta_tagline,
        error,
    })
}

#[get("/tours/{slug}")]
pub async fn tour_detail(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let slug = path.into_inner();
    match state.api.get_tour_by_slug(&slug).await {
        Ok(mut tour) => {
            sort_tour(&mut tour);
            render(TourDetailTemplate {
                chrome: chrome(&state, &req).await,
                tour,
            })
        }
        Err(e) => {
            if !is_missing(&e) {
                log_err!(e, serde_json::json!({ "tour": slug }));
            }
            not_found(&state, &req).await
        }
    }
}

#[get("/locations/{slug}")]
pub async fn location_detail(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let slug = path.into_inner();
    match state.api.get_location(&slug).await {
        Ok(mut location) => {
            sort_location(&mut location);
            render(LocationTemplate {
                chrome: chrome(&state, &req).await,
                location,
            })
        }
        Err(e) => {
            if !is_missing(&e) {
                log_err!(e, serde_json::json!({ "location": slug }));
            }
            not_found(&state, &req).await
        }
    }
}

pub async fn fallback(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    not_found(&state, &req).await
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .service(about)
        .service(contact_form)
        .service(contact_submit)
        .service(tours)
        .service(tour_detail)
        .service(location_detail);
}

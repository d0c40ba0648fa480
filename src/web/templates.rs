use askama::Template;

use sapphire_trails::common::FieldErrors;
use sapphire_trails::models::{
    ApiUser, Booking, CmsContent, DiscoverCopy, FooterCopy, HeroCopy, Location, SessionUser,
    TourPackage,
};
use sapphire_trails::services::{AdminListing, BookingForm, SignupForm};

use crate::web::forms::ContactForm;
use crate::web::session::Toast;

/// Frame shared by every page: toasts, signed-in names, footer copy.
pub struct Chrome {
    pub path: String,
    pub toasts: Vec<Toast>,
    /// Empty when no visitor is signed in.
    pub user_name: String,
    pub admin_name: String,
    pub is_superadmin: bool,
    pub footer: FooterCopy,
}

impl Chrome {
    pub fn signed_in(&self) -> bool {
        !self.user_name.is_empty()
    }

    pub fn nav_class(&self, prefix: &str) -> &'static str {
        let active = if prefix == "/" {
            self.path == "/"
        } else {
            self.path.starts_with(prefix)
        };
        if active { "active" } else { "" }
    }
}

/// Field errors as the templates read them.
#[derive(Default)]
pub struct ErrorView(FieldErrors);

impl ErrorView {
    pub fn of(&self, path: &str) -> &str {
        self.0.get(path).unwrap_or_default()
    }

    pub fn any(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn count(&self) -> usize {
        self.0.len()
    }
}

impl From<FieldErrors> for ErrorView {
    fn from(errors: FieldErrors) -> Self {
        Self(errors)
    }
}

pub struct Testimonial {
    pub quote: &'static str,
    pub author: &'static str,
    pub origin: &'static str,
}

pub const TESTIMONIALS: &[Testimonial] = &[
    Testimonial {
        quote: "Our guide knew every bird call in Sinharaja. The best day of our trip.",
        author: "Hannah M.",
        origin: "Germany",
    },
    Testimonial {
        quote: "Seamless from booking to drop-off. The Ella train ride was unforgettable.",
        author: "Rahul S.",
        origin: "India",
    },
    Testimonial {
        quote: "Leopards at dawn in Yala and a perfect picnic breakfast after.",
        author: "Chloe & Sam",
        origin: "Australia",
    },
];

// Public pages

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: Chrome,
    pub hero: HeroCopy,
    pub discover: DiscoverCopy,
    pub tagline: String,
    pub locations: Vec<Location>,
    pub tours: Vec<TourPackage>,
    pub testimonials: &'static [Testimonial],
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub chrome: Chrome,
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub chrome: Chrome,
    pub form: ContactForm,
    pub errors: ErrorView,
}

#[derive(Template)]
#[template(path = "tours.html")]
pub struct ToursTemplate {
    pub chrome: Chrome,
    pub tours: Vec<TourPackage>,
    pub cta_tagline: String,
    pub error: String,
}

#[derive(Template)]
#[template(path = "tour_detail.html")]
pub struct TourDetailTemplate {
    pub chrome: Chrome,
    pub tour: TourPackage,
}

#[derive(Template)]
#[template(path = "location.html")]
pub struct LocationTemplate {
    pub chrome: Chrome,
    pub location: Location,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub chrome: Chrome,
}

// Booking

pub struct TourOption {
    pub id: i64,
    pub title: String,
    pub price: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "booking.html")]
pub struct BookingTemplate {
    pub chrome: Chrome,
    pub form: BookingForm,
    pub tours: Vec<TourOption>,
    pub errors: ErrorView,
    pub estimate: String,
    pub max_guests: u32,
    pub min_date: String,
}

#[derive(Template)]
#[template(path = "partials/estimate.html")]
pub struct EstimateTemplate {
    pub estimate: String,
}

#[derive(Template)]
#[template(path = "booking_summary.html")]
pub struct BookingSummaryTemplate {
    pub chrome: Chrome,
    pub booking: Booking,
    pub total: String,
}

// Visitor accounts

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub chrome: Chrome,
    pub email: String,
    pub next: String,
    pub error: String,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub chrome: Chrome,
    pub form: SignupForm,
    pub errors: ErrorView,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub chrome: Chrome,
    pub user: SessionUser,
    pub bookings: Vec<Booking>,
    pub error: String,
}

// Admin

#[derive(Template)]
#[template(path = "admin/login.html")]
pub struct AdminLoginTemplate {
    pub chrome: Chrome,
    pub username: String,
    pub error: String,
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub chrome: Chrome,
    pub location_count: usize,
    pub package_count: usize,
    pub booking_count: usize,
    pub pending_count: usize,
    pub recent: Vec<Booking>,
    pub error: String,
}

#[derive(Template)]
#[template(path = "admin/locations.html")]
pub struct AdminLocationsTemplate {
    pub chrome: Chrome,
    pub locations: Vec<Location>,
    pub error: String,
}

#[derive(Template)]
#[template(path = "admin/packages.html")]
pub struct AdminPackagesTemplate {
    pub chrome: Chrome,
    pub tours: Vec<TourPackage>,
    pub error: String,
}

pub struct IconOption {
    pub name: &'static str,
    pub selected: bool,
}

/// One input of a wizard step.
pub struct FieldView {
    pub path: String,
    pub label: String,
    /// `text`, `textarea`, `url`, `email`, `number`, `date`, `file`, `icon`
    /// or `checkbox`.
    pub kind: &'static str,
    pub value: String,
    pub error: String,
    pub required: bool,
    /// First field with an error; the browser focuses it.
    pub focus: bool,
    /// Stored image URL of a file field.
    pub preview: String,
    /// Name of a chosen file that is not uploaded yet.
    pub pending: String,
    pub icons: Vec<IconOption>,
}

pub struct StepView {
    pub number: usize,
    pub title: &'static str,
    /// `done`, `current` or `todo`.
    pub status: &'static str,
}

pub struct GalleryItemView {
    pub index: usize,
    pub src: String,
    pub alt_text: String,
    pub hint: String,
    pub is_new: bool,
    pub pending: String,
}

pub struct WizardView {
    pub heading: String,
    pub action: String,
    pub cancel: String,
    pub steps: Vec<StepView>,
    pub step_title: String,
    pub fields: Vec<FieldView>,
    pub is_first: bool,
    pub is_last: bool,
    pub submitting: bool,
    pub error_count: usize,
    pub show_gallery: bool,
    pub gallery_base: String,
    pub gallery: Vec<GalleryItemView>,
}

#[derive(Template)]
#[template(path = "admin/wizard.html")]
pub struct WizardTemplate {
    pub chrome: Chrome,
    pub wizard: WizardView,
}

#[derive(Template)]
#[template(path = "admin/bookings.html")]
pub struct AdminBookingsTemplate {
    pub chrome: Chrome,
    pub bookings: Vec<Booking>,
    pub filter: String,
}

#[derive(Template)]
#[template(path = "admin/users.html")]
pub struct AdminUsersTemplate {
    pub chrome: Chrome,
    pub users: Vec<ApiUser>,
    pub error: String,
}

#[derive(Template)]
#[template(path = "admin/admins.html")]
pub struct AdminAdminsTemplate {
    pub chrome: Chrome,
    pub admins: Vec<AdminListing>,
}

#[derive(Template)]
#[template(path = "admin/cms.html")]
pub struct AdminCmsTemplate {
    pub chrome: Chrome,
    pub content: CmsContent,
    pub errors: ErrorView,
}

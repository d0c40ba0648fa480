pub mod admin_auth;
pub mod admin_bookings;
pub mod admin_cms;
pub mod admin_locations;
pub mod admin_packages;
pub mod admin_users;
pub mod auth;
pub mod booking;
pub mod profile;
pub mod public;

use actix_web::web;

/// Configure every route. Unmatched paths go to `public::fallback`,
/// registered as the app's default service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    public::configure(cfg);
    booking::configure(cfg);
    auth::configure(cfg);
    profile::configure(cfg);
    admin_auth::configure(cfg);
    admin_locations::configure(cfg);
    admin_packages::configure(cfg);
    admin_bookings::configure(cfg);
    admin_users::configure(cfg);
    admin_cms::configure(cfg);
}

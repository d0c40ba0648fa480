pub use assembly::{IconBlockEntry, SubmitOutcome};
pub use auth::*;
pub use booking::*;
pub use gallery::*;
pub use tagline::*;
pub use wizard::*;

mod assembly;
mod auth;
mod booking;
mod gallery;
mod tagline;

pub mod location_form;
pub mod package_form;
pub mod pricing;
pub mod slug;
pub mod wizard;

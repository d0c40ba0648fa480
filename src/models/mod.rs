pub use booking::*;
pub use cms::*;
pub use icon::*;
pub use location::*;
pub use tour::*;
pub use user::*;

pub mod de;

mod booking;
mod cms;
mod icon;
mod location;
mod tour;
mod user;

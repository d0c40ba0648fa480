pub use admins::*;
pub use db::*;
pub use keys::*;

mod admins;
mod bookings;
mod cms;
mod db;
mod keys;

pub use errors::*;
pub use validate::*;

mod errors;
mod macros;
mod validate;

mod api;
mod user;

pub use api::*;
pub use user::*;
